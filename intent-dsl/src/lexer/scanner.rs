//! Lexer implementation

use super::token::*;
use crate::config::LexerOptions;
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

// ============================================================================
// LEXER ERRORS
// ============================================================================

/// Fatal lexer errors. Any of these aborts the pipeline; no partial token
/// stream is handed to the parser.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("line {line}, column {column}: unterminated string")]
    UnterminatedString { line: usize, column: usize },

    #[error("line {line}: unindent does not match any outer indentation level")]
    InconsistentDedent { line: usize },

    #[error("line {line}, column {column}: invalid character {ch:?}")]
    InvalidCharacter { ch: char, line: usize, column: usize },
}

impl LexError {
    pub fn line(&self) -> usize {
        match self {
            LexError::UnterminatedString { line, .. }
            | LexError::InconsistentDedent { line }
            | LexError::InvalidCharacter { line, .. } => *line,
        }
    }
}

const BOX_DASHES: [char; 3] = ['─', '━', '═'];

// ============================================================================
// LEXER IMPLEMENTATION
// ============================================================================

/// Lexer for the intent language.
///
/// Works line by line: leading whitespace feeds the indentation stack, the
/// rest of the line is scanned into word, string and punctuation tokens,
/// and every content line ends with a `Newline`.
pub struct Lexer<'a> {
    source: &'a str,
    options: LexerOptions,
    indent_stack: Vec<usize>,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source with default options.
    pub fn new(source: &'a str) -> Self {
        Self::with_options(source, LexerOptions::default())
    }

    pub fn with_options(source: &'a str, options: LexerOptions) -> Self {
        Self {
            source,
            options,
            indent_stack: vec![0],
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire source into a vector of tokens ending in `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        self.indent_stack = vec![0];
        self.tokens = Vec::new();

        let mut last_line = 0;
        for (idx, line) in self.source.lines().enumerate() {
            let line_no = idx + 1;
            last_line = line_no;
            self.lex_line(line, line_no)?;
        }

        let eof_line = last_line + 1;
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.tokens.push(Token::new(TokenKind::Dedent, "", eof_line, 1));
        }
        self.tokens.push(Token::new(TokenKind::Eof, "", eof_line, 1));

        tracing::debug!(
            lines = last_line,
            tokens = self.tokens.len(),
            "tokenized source"
        );
        Ok(std::mem::take(&mut self.tokens))
    }

    fn lex_line(&mut self, line: &str, line_no: usize) -> Result<(), LexError> {
        let (width, content_start) = self.measure_indent(line);
        let content = line[content_start..].trim_end();
        if content.is_empty() {
            return Ok(());
        }

        // Column of the first content character (1-based, in chars).
        let column = line[..content_start].chars().count() + 1;

        if let Some(comment) = comment_text(content) {
            if self.options.keep_comments {
                self.tokens
                    .push(Token::new(TokenKind::Comment, comment, line_no, column));
                self.push_newline(line_no, content, column);
            }
            return Ok(());
        }

        self.adjust_indent(width, line_no, column)?;

        if let Some(label) = section_label(content) {
            self.tokens
                .push(Token::new(TokenKind::SectionHeader, label, line_no, column));
            self.push_newline(line_no, content, column);
            return Ok(());
        }

        let mut scanner = LineScanner::new(content, line_no, column);
        scanner.scan(&mut self.tokens)?;
        self.push_newline(line_no, content, column);
        Ok(())
    }

    fn push_newline(&mut self, line_no: usize, content: &str, column: usize) {
        let end = column + content.chars().count();
        self.tokens
            .push(Token::new(TokenKind::Newline, "\n", line_no, end));
    }

    /// Width of the leading whitespace in columns, and the byte offset of
    /// the first non-blank character.
    fn measure_indent(&self, line: &str) -> (usize, usize) {
        let mut width = 0;
        for (i, c) in line.char_indices() {
            match c {
                ' ' => width += 1,
                '\t' => width += self.options.tab_width,
                _ => return (width, i),
            }
        }
        (width, line.len())
    }

    fn adjust_indent(&mut self, width: usize, line_no: usize, column: usize) -> Result<(), LexError> {
        let top = self.indent_stack.last().copied().unwrap_or(0);

        if width > top {
            self.indent_stack.push(width);
            self.tokens.push(Token::new(TokenKind::Indent, "", line_no, column));
            return Ok(());
        }

        while let Some(&level) = self.indent_stack.last() {
            if level <= width {
                break;
            }
            self.indent_stack.pop();
            self.tokens.push(Token::new(TokenKind::Dedent, "", line_no, column));
        }

        if self.indent_stack.last().copied().unwrap_or(0) != width {
            return Err(LexError::InconsistentDedent { line: line_no });
        }
        Ok(())
    }
}

/// `# text` at the start of a line. A bare `#word` is content (colors,
/// anchors), not a comment.
fn comment_text(content: &str) -> Option<&str> {
    let rest = content.strip_prefix('#')?;
    match rest.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() => Some(rest.trim()),
        Some(_) => None,
    }
}

/// A run of at least two box-drawing dashes opens a section header; the
/// label is whatever the dashes frame.
fn section_label(content: &str) -> Option<String> {
    let leading = content
        .chars()
        .take_while(|c| BOX_DASHES.contains(c))
        .count();
    if leading < 2 {
        return None;
    }
    let label = content.trim_matches(|c: char| BOX_DASHES.contains(&c) || c.is_whitespace());
    Some(label.to_string())
}

// ============================================================================
// LINE SCANNER
// ============================================================================

struct LineScanner<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    pos: usize,
}

impl<'a> LineScanner<'a> {
    fn new(text: &'a str, line: usize, column: usize) -> Self {
        Self {
            text,
            chars: text.char_indices().peekable(),
            line,
            column,
            pos: 0,
        }
    }

    fn scan(&mut self, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        while let Some(c) = self.peek_char() {
            let column = self.column;
            match c {
                c if c.is_whitespace() => {
                    self.advance();
                }
                '"' => {
                    let value = self.scan_string()?;
                    tokens.push(Token::new(TokenKind::StringLit, value, self.line, column));
                }
                ',' => {
                    self.advance();
                    tokens.push(Token::new(TokenKind::Comma, ",", self.line, column));
                }
                ':' if self.colon_ends_here() => {
                    self.advance();
                    tokens.push(Token::new(TokenKind::Colon, ":", self.line, column));
                }
                c if c.is_control() => {
                    return Err(LexError::InvalidCharacter {
                        ch: c,
                        line: self.line,
                        column,
                    });
                }
                _ => self.scan_word(tokens)?,
            }
        }
        Ok(())
    }

    /// Scan a word, classify it, and split off a trailing `'s`.
    fn scan_word(&mut self, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        let start = self.pos;
        let column = self.column;
        let mut possessive = false;

        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || c == '"' || c == ',' {
                break;
            }
            if c == ':' && self.colon_ends_here() {
                break;
            }
            if self.pos > start && self.possessive_ends_here() {
                possessive = true;
                break;
            }
            if c.is_control() {
                return Err(LexError::InvalidCharacter {
                    ch: c,
                    line: self.line,
                    column: self.column,
                });
            }
            self.advance();
        }

        // A word always takes at least one character.
        if self.pos == start {
            self.advance();
        }

        let word = &self.text[start..self.pos];
        let kind = classify_word(word);
        tokens.push(Token::new(kind, word, self.line, column));

        if possessive {
            let column = self.column;
            self.advance(); // apostrophe
            self.advance(); // s
            tokens.push(Token::new(TokenKind::Possessive, "'s", self.line, column));
        }
        Ok(())
    }

    /// Scan a double-quoted string literal with escape sequences.
    fn scan_string(&mut self) -> Result<String, LexError> {
        let column = self.column;
        self.advance(); // consume opening quote
        let mut value = String::new();

        loop {
            match self.peek_char() {
                None => {
                    return Err(LexError::UnterminatedString {
                        line: self.line,
                        column,
                    })
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some('n') => {
                            self.advance();
                            value.push('\n');
                        }
                        Some('t') => {
                            self.advance();
                            value.push('\t');
                        }
                        Some('r') => {
                            self.advance();
                            value.push('\r');
                        }
                        Some('\\') => {
                            self.advance();
                            value.push('\\');
                        }
                        Some('"') => {
                            self.advance();
                            value.push('"');
                        }
                        _ => value.push('\\'),
                    }
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }

        Ok(value)
    }

    /// A colon is punctuation only when whitespace or the end of the line
    /// follows it; `https://...` and `/users/:id` keep theirs.
    fn colon_ends_here(&self) -> bool {
        match self.peek_next_char() {
            None => true,
            Some(c) => c.is_whitespace(),
        }
    }

    /// `'s` or `’s` followed by a non-word character.
    fn possessive_ends_here(&self) -> bool {
        let mut rest = self.text[self.pos..].chars();
        let apostrophe = rest.next();
        let s = rest.next();
        let after = rest.next();
        matches!(apostrophe, Some('\'') | Some('’'))
            && s == Some('s')
            && !after.map(|c| c.is_alphanumeric()).unwrap_or(false)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next_char(&self) -> Option<char> {
        let mut iter = self.text[self.pos..].chars();
        iter.next();
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((i, c)) = self.chars.next() {
            self.pos = i + c.len_utf8();
            self.column += 1;
            Some(c)
        } else {
            None
        }
    }
}

fn classify_word(word: &str) -> TokenKind {
    if let Some(kind) = TokenKind::keyword(word) {
        return kind;
    }
    if is_numeric(word) {
        return TokenKind::Numeric;
    }
    TokenKind::Ident
}

fn is_numeric(word: &str) -> bool {
    let mut seen_dot = false;
    let mut seen_digit = false;
    for c in word.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit && !word.ends_with('.')
}

/// Tokenize a source string with default options.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .map(|tokens| tokens.into_iter().map(|t| t.kind).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let tokens = tokenize("data Task:").unwrap_or_default();
        assert_eq!(tokens[0].kind, TokenKind::Data);
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].literal, "Task");
        assert_eq!(tokens[2].kind, TokenKind::Colon);
        assert_eq!(tokens[3].kind, TokenKind::Newline);
        assert_eq!(tokens[4].kind, TokenKind::Eof);
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(kinds("Data"), vec![TokenKind::Ident, TokenKind::Newline, TokenKind::Eof]);
    }

    #[test]
    fn test_indent_and_dedent() {
        let source = "data Task:\n  has a title\n  has a body\npage Home:\n";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Data,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Has,
                TokenKind::A,
                TokenKind::Ident,
                TokenKind::Newline,
                TokenKind::Has,
                TokenKind::A,
                TokenKind::Ident,
                TokenKind::Newline,
                TokenKind::Dedent,
                TokenKind::Page,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_dedents_closed_at_end_of_input() {
        let source = "when a user signs up:\n  send email\n    to the user";
        let k = kinds(source);
        let indents = k.iter().filter(|k| **k == TokenKind::Indent).count();
        let dedents = k.iter().filter(|k| **k == TokenKind::Dedent).count();
        assert_eq!(indents, 2);
        assert_eq!(dedents, 2);
        assert_eq!(k.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn test_inconsistent_dedent_is_fatal() {
        let source = "page Home:\n    show a title\n  show a footer\n";
        assert_eq!(
            tokenize(source),
            Err(LexError::InconsistentDedent { line: 3 })
        );
    }

    #[test]
    fn test_unterminated_string_is_fatal() {
        let result = tokenize("has a status which is either \"todo or \"done");
        assert!(matches!(result, Err(LexError::UnterminatedString { line: 1, .. })));
    }

    #[test]
    fn test_invalid_character_is_fatal() {
        let result = tokenize("show a \u{7}bell");
        assert!(matches!(
            result,
            Err(LexError::InvalidCharacter { ch: '\u{7}', line: 1, .. })
        ));
    }

    #[test]
    fn test_possessive_is_split() {
        let tokens = tokenize("show the user's name").unwrap_or_default();
        let literals: Vec<&str> = tokens.iter().map(|t| t.literal.as_str()).collect();
        assert_eq!(literals, vec!["show", "the", "user", "'s", "name", "\n", ""]);
        assert_eq!(tokens[3].kind, TokenKind::Possessive);
    }

    #[test]
    fn test_curly_possessive_is_split() {
        let tokens = tokenize("show the user\u{2019}s name").unwrap_or_default();
        assert_eq!(tokens[2].literal, "user");
        assert_eq!(tokens[3].kind, TokenKind::Possessive);
        assert_eq!(tokens[4].literal, "name");
    }

    #[test]
    fn test_unicode_whitespace_separates_words() {
        for space in ['\u{a0}', '\u{2003}', '\u{3000}'] {
            let source = format!("page Home:\n  show{}tasks\n", space);
            let tokens = tokenize(&source).unwrap_or_default();
            let idents: Vec<&str> = tokens
                .iter()
                .filter(|t| t.kind == TokenKind::Ident)
                .map(|t| t.literal.as_str())
                .collect();
            assert_eq!(idents, vec!["Home", "show", "tasks"], "separator {:?}", space);
            assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
        }
    }

    #[test]
    fn test_leading_unicode_whitespace_is_skipped() {
        let tokens = tokenize("\u{a0}show tasks\n\u{a0}\n").unwrap_or_default();
        let literals: Vec<&str> = tokens.iter().map(|t| t.literal.as_str()).collect();
        assert_eq!(literals, vec!["show", "tasks", "\n", ""]);
    }

    #[test]
    fn test_box_dashes_inside_a_line_are_word_text() {
        let tokens = tokenize("show a ── divider").unwrap_or_default();
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[2].literal, "──");
        assert_eq!(tokens[3].literal, "divider");
    }

    #[test]
    fn test_apostrophe_inside_word_is_kept() {
        let tokens = tokenize("don't panic").unwrap_or_default();
        assert_eq!(tokens[0].literal, "don't");
    }

    #[test]
    fn test_colon_inside_word_is_kept() {
        let tokens = tokenize("routes /api/users/:id to UserService").unwrap_or_default();
        assert_eq!(tokens[1].literal, "/api/users/:id");
        let tokens = tokenize("url is https://example.com").unwrap_or_default();
        assert_eq!(tokens[2].literal, "https://example.com");
    }

    #[test]
    fn test_strings_and_commas() {
        let tokens = tokenize(r#"either "todo", "doing" or "done""#).unwrap_or_default();
        assert_eq!(tokens[1].kind, TokenKind::StringLit);
        assert_eq!(tokens[1].literal, "todo");
        assert_eq!(tokens[2].kind, TokenKind::Comma);
        assert_eq!(tokens[3].literal, "doing");
        assert_eq!(tokens[4].kind, TokenKind::Or);
    }

    #[test]
    fn test_render_escapes_string_contents() {
        let tokens = tokenize(r#"greeting is "say \"hi\" \\ bye""#).unwrap_or_default();
        assert_eq!(tokens[2].literal, r#"say "hi" \ bye"#);
        assert_eq!(
            render_tokens(&tokens),
            r#"greeting is "say \"hi\" \\ bye""#
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("runs on port 3001 at 2.5 or 5%").unwrap_or_default();
        assert_eq!(tokens[3].kind, TokenKind::Numeric);
        assert_eq!(tokens[5].kind, TokenKind::Numeric);
        assert_eq!(tokens[7].kind, TokenKind::Ident);
    }

    #[test]
    fn test_section_header() {
        let tokens = tokenize("── Data Models ──\ndata User:").unwrap_or_default();
        assert_eq!(tokens[0].kind, TokenKind::SectionHeader);
        assert_eq!(tokens[0].literal, "Data Models");
        assert_eq!(tokens[1].kind, TokenKind::Newline);
        assert_eq!(tokens[2].kind, TokenKind::Data);
    }

    #[test]
    fn test_comments_and_blank_lines_do_not_affect_indentation() {
        let source = "page Home:\n  show a title\n\n# a note\n  show a footer\n";
        let k = kinds(source);
        assert!(!k.contains(&TokenKind::Comment));
        assert_eq!(k.iter().filter(|k| **k == TokenKind::Dedent).count(), 1);
        assert_eq!(k.iter().filter(|k| **k == TokenKind::Indent).count(), 1);
    }

    #[test]
    fn test_hash_color_is_not_a_comment() {
        let tokens = tokenize("#6C5CE7 rules").unwrap_or_default();
        assert_eq!(tokens[0].literal, "#6C5CE7");
    }

    #[test]
    fn test_keep_comments_option() {
        let options = LexerOptions {
            keep_comments: true,
            ..LexerOptions::default()
        };
        let tokens = Lexer::with_options("# hello there\napp Demo", options)
            .tokenize()
            .unwrap_or_default();
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].literal, "hello there");
        assert_eq!(tokens[1].kind, TokenKind::Newline);
        assert_eq!(tokens[2].kind, TokenKind::App);
    }

    #[test]
    fn test_tabs_use_tab_width() {
        let source = "page Home:\n\tshow a title\n    show a footer\n";
        let k = kinds(source);
        assert_eq!(k.iter().filter(|k| **k == TokenKind::Indent).count(), 1);
    }

    #[test]
    fn test_line_numbers() {
        let tokens = tokenize("app Demo\n\ndata User:\n  has a name").unwrap_or_default();
        let has = tokens.iter().find(|t| t.kind == TokenKind::Has);
        assert_eq!(has.map(|t| t.span.line), Some(4));
        assert_eq!(has.map(|t| t.span.column), Some(3));
    }
}
