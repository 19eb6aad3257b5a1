//! Lexer token types

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TOKEN KINDS
// ============================================================================

/// Token kinds for the intent language.
///
/// Every variant is a unit variant; the source spelling travels in
/// [`Token::literal`], so kinds can be compared and matched without cloning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Structure
    Newline,
    Indent,
    Dedent,
    Eof,
    Colon,
    Comma,
    Possessive,
    SectionHeader,
    Comment,

    // Literals
    Ident,
    StringLit,
    Numeric,

    // Block keywords
    App,
    Data,
    Page,
    Component,
    Api,
    Policy,
    When,
    Theme,
    Authentication,
    Database,
    Integrate,
    Environment,
    Build,
    Architecture,
    If,

    // Clause keywords
    Has,
    Belongs,
    Many,
    Through,
    Which,
    Is,
    Optional,
    Unique,
    Encrypted,
    Either,
    Or,
    Defaults,
    To,
    Can,
    Cannot,
    Requires,
    Accepts,
    And,
    A,
    An,
    With,
    The,

    // Field types
    Text,
    Number,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Email,
    Url,
    File,
    Image,
    Json,
}

impl TokenKind {
    /// Look up a word in the keyword table. Matching is case-sensitive:
    /// only the lowercase spelling is a keyword.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "app" => TokenKind::App,
            "data" => TokenKind::Data,
            "page" => TokenKind::Page,
            "component" => TokenKind::Component,
            "api" => TokenKind::Api,
            "policy" => TokenKind::Policy,
            "when" => TokenKind::When,
            "theme" => TokenKind::Theme,
            "authentication" => TokenKind::Authentication,
            "database" => TokenKind::Database,
            "integrate" => TokenKind::Integrate,
            "environment" => TokenKind::Environment,
            "build" => TokenKind::Build,
            "architecture" => TokenKind::Architecture,
            "if" => TokenKind::If,

            "has" => TokenKind::Has,
            "belongs" => TokenKind::Belongs,
            "many" => TokenKind::Many,
            "through" => TokenKind::Through,
            "which" => TokenKind::Which,
            "is" => TokenKind::Is,
            "optional" => TokenKind::Optional,
            "unique" => TokenKind::Unique,
            "encrypted" => TokenKind::Encrypted,
            "either" => TokenKind::Either,
            "or" => TokenKind::Or,
            "defaults" => TokenKind::Defaults,
            "to" => TokenKind::To,
            "can" => TokenKind::Can,
            "cannot" => TokenKind::Cannot,
            "requires" => TokenKind::Requires,
            "accepts" => TokenKind::Accepts,
            "and" => TokenKind::And,
            "a" => TokenKind::A,
            "an" => TokenKind::An,
            "with" => TokenKind::With,
            "the" => TokenKind::The,

            "text" => TokenKind::Text,
            "number" => TokenKind::Number,
            "decimal" => TokenKind::Decimal,
            "boolean" => TokenKind::Boolean,
            "date" => TokenKind::Date,
            "datetime" => TokenKind::DateTime,
            "email" => TokenKind::Email,
            "url" => TokenKind::Url,
            "file" => TokenKind::File,
            "image" => TokenKind::Image,
            "json" => TokenKind::Json,

            _ => return None,
        };
        Some(kind)
    }

    /// Keywords that open a top-level block. These are the parser's
    /// synchronization points.
    pub fn starts_block(self) -> bool {
        matches!(
            self,
            TokenKind::App
                | TokenKind::Data
                | TokenKind::Page
                | TokenKind::Component
                | TokenKind::Api
                | TokenKind::Policy
                | TokenKind::When
                | TokenKind::Theme
                | TokenKind::Authentication
                | TokenKind::Database
                | TokenKind::Integrate
                | TokenKind::Environment
                | TokenKind::Build
                | TokenKind::Architecture
                | TokenKind::If
                | TokenKind::SectionHeader
        )
    }

    /// Field type keywords (`text`, `number`, `email`, ...).
    pub fn is_field_type(self) -> bool {
        matches!(
            self,
            TokenKind::Text
                | TokenKind::Number
                | TokenKind::Decimal
                | TokenKind::Boolean
                | TokenKind::Date
                | TokenKind::DateTime
                | TokenKind::Email
                | TokenKind::Url
                | TokenKind::File
                | TokenKind::Image
                | TokenKind::Json
        )
    }

    /// Tokens that carry a word of source text (identifiers, numbers and
    /// every keyword). Structural markers and strings are excluded.
    pub fn is_word(self) -> bool {
        !matches!(
            self,
            TokenKind::Newline
                | TokenKind::Indent
                | TokenKind::Dedent
                | TokenKind::Eof
                | TokenKind::Colon
                | TokenKind::Comma
                | TokenKind::Possessive
                | TokenKind::SectionHeader
                | TokenKind::Comment
                | TokenKind::StringLit
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Newline => "end of line",
            TokenKind::Indent => "indent",
            TokenKind::Dedent => "dedent",
            TokenKind::Eof => "end of input",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Possessive => "'s",
            TokenKind::SectionHeader => "section header",
            TokenKind::Comment => "comment",
            TokenKind::Ident => "identifier",
            TokenKind::StringLit => "string",
            TokenKind::Numeric => "number literal",
            other => return write!(f, "keyword '{}'", format!("{:?}", other).to_lowercase()),
        };
        f.write_str(name)
    }
}

// ============================================================================
// SPANS AND TOKENS
// ============================================================================

/// Source location span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Default for Span {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

/// A token with its kind, source spelling and location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            literal: literal.into(),
            span: Span { line, column },
        }
    }

    pub fn line(&self) -> usize {
        self.span.line
    }
}

/// Render a run of tokens back into clause text.
///
/// Punctuation and possessives attach to the preceding word; strings are
/// re-quoted, with `"` and `\` escaped, so later stages can still see them
/// as literals.
pub fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token.kind {
            TokenKind::Colon | TokenKind::Comma | TokenKind::Possessive => {
                out.push_str(&token.literal);
            }
            TokenKind::Newline
            | TokenKind::Indent
            | TokenKind::Dedent
            | TokenKind::Eof
            | TokenKind::Comment => {}
            TokenKind::StringLit => {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push('"');
                for c in token.literal.chars() {
                    if matches!(c, '"' | '\\') {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push('"');
            }
            _ => {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(&token.literal);
            }
        }
    }
    out
}
