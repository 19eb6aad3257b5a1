//! Parser implementation
//!
//! Recursive descent with one token of lookahead. Each top-level keyword
//! dispatches to a block parser; block bodies are sequences of one-line
//! clauses. Header errors are recorded and the parser synchronizes to the
//! next top-level keyword, so one broken block never hides the rest of the
//! document.

use super::ast::*;
use crate::lexer::*;

// ============================================================================
// PARSER
// ============================================================================

/// Parser for the intent language.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    errors: Vec<ParseError>,
}

/// Result of one `has` clause.
enum HasClause {
    Field(Field),
    Relationship(Relationship),
}

impl Parser {
    /// Create a new parser from a vector of tokens.
    ///
    /// Comment lines are dropped here, and a trailing `Eof` is guaranteed so
    /// the cursor can never run off the end.
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut filtered: Vec<Token> = Vec::with_capacity(tokens.len());
        let mut after_comment = false;
        for token in tokens {
            match token.kind {
                TokenKind::Comment => after_comment = true,
                TokenKind::Newline if after_comment => after_comment = false,
                _ => {
                    after_comment = false;
                    filtered.push(token);
                }
            }
        }

        if filtered.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let line = filtered.last().map(|t| t.span.line + 1).unwrap_or(1);
            filtered.push(Token::new(TokenKind::Eof, "", line, 1));
        }

        Self {
            tokens: filtered,
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Parse the tokens into a program.
    ///
    /// The program is always populated with every declaration that parsed;
    /// the error list is non-empty exactly when a syntax error was recorded.
    pub fn parse(&mut self) -> (Program, Vec<ParseError>) {
        let mut program = Program::default();

        while !self.is_at_end() {
            let start = self.pos;
            self.parse_top_level(&mut program);
            if self.pos == start {
                self.advance();
            }
        }

        tracing::debug!(
            declarations = program.declaration_count(),
            statements = program.statements.len(),
            sections = program.sections.len(),
            errors = self.errors.len(),
            "parsed program"
        );
        (program, std::mem::take(&mut self.errors))
    }

    fn parse_top_level(&mut self, program: &mut Program) {
        match self.current().kind {
            TokenKind::Newline | TokenKind::Dedent => self.advance(),
            TokenKind::Indent => {
                // Indented lines under a free statement stay top-level.
                let statements = self.parse_indented_lines();
                program.statements.extend(statements);
            }
            TokenKind::SectionHeader => {
                let label = self.current().literal.clone();
                self.advance();
                self.skip_newline();
                if !label.is_empty() {
                    program.sections.push(label);
                }
            }
            TokenKind::App => {
                if let Some(decl) = self.attempt(Self::parse_app) {
                    program.app = Some(decl);
                }
            }
            TokenKind::Data => {
                if let Some(decl) = self.attempt(Self::parse_data) {
                    program.data.push(decl);
                }
            }
            TokenKind::Page => {
                if let Some(decl) = self.attempt(Self::parse_page) {
                    program.pages.push(decl);
                }
            }
            TokenKind::Component => {
                if let Some(decl) = self.attempt(Self::parse_component) {
                    program.components.push(decl);
                }
            }
            TokenKind::Api => {
                if let Some(decl) = self.attempt(Self::parse_api) {
                    program.apis.push(decl);
                }
            }
            TokenKind::Policy => {
                if let Some(decl) = self.attempt(Self::parse_policy) {
                    program.policies.push(decl);
                }
            }
            TokenKind::When => {
                if let Some(decl) = self.attempt(Self::parse_workflow) {
                    program.workflows.push(decl);
                }
            }
            TokenKind::If => {
                if let Some(decl) = self.attempt(Self::parse_error_handler) {
                    program.error_handlers.push(decl);
                }
            }
            TokenKind::Theme => {
                if let Some(decl) = self.attempt(Self::parse_theme) {
                    program.theme = Some(decl);
                }
            }
            TokenKind::Authentication => {
                if let Some(decl) = self.attempt(Self::parse_authentication) {
                    program.authentication = Some(decl);
                }
            }
            TokenKind::Database => {
                if let Some(decl) = self.attempt(Self::parse_database) {
                    program.database = Some(decl);
                }
            }
            TokenKind::Integrate => {
                if let Some(decl) = self.attempt(Self::parse_integration) {
                    program.integrations.push(decl);
                }
            }
            TokenKind::Environment => {
                if let Some(decl) = self.attempt(Self::parse_environment) {
                    program.environments.push(decl);
                }
            }
            TokenKind::Build => {
                if let Some(decl) = self.attempt(Self::parse_build) {
                    program.build = Some(decl);
                }
            }
            TokenKind::Architecture => {
                if let Some(decl) = self.attempt(Self::parse_architecture) {
                    program.architecture = Some(decl);
                }
            }
            _ => {
                let statement = self.parse_statement_line();
                program.statements.push(statement);
            }
        }
    }

    /// Run a block parser; on a header error record it and resynchronize.
    fn attempt<T>(&mut self, parse: fn(&mut Self) -> Result<T, ParseError>) -> Option<T> {
        match parse(self) {
            Ok(decl) => Some(decl),
            Err(err) => {
                self.record(err);
                self.synchronize();
                None
            }
        }
    }

    // ========================================================================
    // Block parsers
    // ========================================================================

    /// `app <Name> [is <platform>]`
    fn parse_app(&mut self) -> Result<AppDeclaration, ParseError> {
        let line = self.current().line();
        self.expect(TokenKind::App)?;
        let name = self.expect_name("app")?;

        let platform = if self.check(TokenKind::Is) {
            self.advance();
            let words = self.collect_header_words();
            if words.is_empty() {
                return Err(self.error("expected platform after 'is'"));
            }
            Some(words)
        } else {
            None
        };

        if self.check(TokenKind::Colon) {
            self.advance();
        }
        if !self.at_line_end() {
            return Err(self.error(&format!(
                "unexpected {} after app name",
                self.describe_current()
            )));
        }
        self.skip_newline();

        Ok(AppDeclaration {
            name,
            platform,
            line,
        })
    }

    /// `data <Name>:` with `has` / `belongs to` clauses.
    fn parse_data(&mut self) -> Result<DataDeclaration, ParseError> {
        let line = self.current().line();
        self.expect(TokenKind::Data)?;
        let name = self.expect_name("data")?;
        self.expect_header_end("data")?;

        let mut decl = DataDeclaration {
            name,
            fields: Vec::new(),
            relationships: Vec::new(),
            statements: Vec::new(),
            line,
        };
        self.parse_body(|p| p.parse_data_clause(&mut decl));
        Ok(decl)
    }

    fn parse_page(&mut self) -> Result<PageDeclaration, ParseError> {
        let line = self.current().line();
        self.expect(TokenKind::Page)?;
        let name = self.expect_name("page")?;
        self.expect_header_end("page")?;
        let statements = self.parse_statement_body();
        Ok(PageDeclaration {
            name,
            statements,
            line,
        })
    }

    /// `component <Name>:` with `accepts` clauses for props.
    fn parse_component(&mut self) -> Result<ComponentDeclaration, ParseError> {
        let line = self.current().line();
        self.expect(TokenKind::Component)?;
        let name = self.expect_name("component")?;
        self.expect_header_end("component")?;

        let mut decl = ComponentDeclaration {
            name,
            props: Vec::new(),
            statements: Vec::new(),
            line,
        };
        self.parse_body(|p| {
            if p.check(TokenKind::Accepts) {
                p.advance();
                let props = p.parse_name_list();
                decl.props.extend(props);
            } else {
                decl.statements.push(p.parse_statement_line());
            }
        });
        Ok(decl)
    }

    /// `api <Name>:` with `requires authentication` and `accepts` clauses.
    fn parse_api(&mut self) -> Result<ApiDeclaration, ParseError> {
        let line = self.current().line();
        self.expect(TokenKind::Api)?;
        let name = self.expect_name("api")?;
        self.expect_header_end("api")?;

        let mut decl = ApiDeclaration {
            name,
            requires_auth: false,
            params: Vec::new(),
            statements: Vec::new(),
            line,
        };
        self.parse_body(|p| match p.current().kind {
            TokenKind::Requires if p.peek_kind(1) == TokenKind::Authentication => {
                decl.requires_auth = true;
                p.skip_line();
            }
            TokenKind::Accepts => {
                p.advance();
                let params = p.parse_name_list();
                decl.params.extend(params);
            }
            _ => decl.statements.push(p.parse_statement_line()),
        });
        Ok(decl)
    }

    /// `policy <Name>:` with `can` / `cannot` rules.
    fn parse_policy(&mut self) -> Result<PolicyDeclaration, ParseError> {
        let line = self.current().line();
        self.expect(TokenKind::Policy)?;
        let name = self.expect_name("policy")?;
        self.expect_header_end("policy")?;

        let mut decl = PolicyDeclaration {
            name,
            rules: Vec::new(),
            statements: Vec::new(),
            line,
        };
        self.parse_body(|p| match p.current().kind {
            TokenKind::Can | TokenKind::Cannot => {
                let allowed = p.check(TokenKind::Can);
                let line = p.current().line();
                p.advance();
                let text = p.rest_of_line();
                if text.is_empty() {
                    let keyword = if allowed { "can" } else { "cannot" };
                    let err = p.error(&format!("expected action after '{}'", keyword));
                    p.record(err);
                } else {
                    decl.rules.push(PolicyRuleDecl {
                        allowed,
                        text,
                        line,
                    });
                }
                p.skip_newline();
            }
            _ => decl.statements.push(p.parse_statement_line()),
        });
        Ok(decl)
    }

    /// `when <trigger>:`
    fn parse_workflow(&mut self) -> Result<WorkflowDeclaration, ParseError> {
        let line = self.current().line();
        self.expect(TokenKind::When)?;
        let trigger = self.collect_header_words();
        if trigger.is_empty() {
            return Err(self.error("expected trigger after 'when'"));
        }
        self.expect_header_end("when")?;
        let statements = self.parse_statement_body();
        Ok(WorkflowDeclaration {
            trigger,
            statements,
            line,
        })
    }

    /// `if <condition>:` as a top-level error handler.
    fn parse_error_handler(&mut self) -> Result<ErrorHandlerDeclaration, ParseError> {
        let line = self.current().line();
        self.expect(TokenKind::If)?;
        let condition = self.collect_header_words();
        if condition.is_empty() {
            return Err(self.error("expected condition after 'if'"));
        }
        self.expect_header_end("if")?;
        let statements = self.parse_statement_body();
        Ok(ErrorHandlerDeclaration {
            condition,
            statements,
            line,
        })
    }

    fn parse_theme(&mut self) -> Result<ThemeDeclaration, ParseError> {
        let line = self.current().line();
        self.expect(TokenKind::Theme)?;
        self.expect_header_end("theme")?;
        let statements = self.parse_statement_body();
        Ok(ThemeDeclaration { statements, line })
    }

    fn parse_authentication(&mut self) -> Result<AuthenticationDeclaration, ParseError> {
        let line = self.current().line();
        self.expect(TokenKind::Authentication)?;
        self.expect_header_end("authentication")?;
        let statements = self.parse_statement_body();
        Ok(AuthenticationDeclaration { statements, line })
    }

    fn parse_database(&mut self) -> Result<DatabaseDeclaration, ParseError> {
        let line = self.current().line();
        self.expect(TokenKind::Database)?;
        self.expect_header_end("database")?;
        let statements = self.parse_statement_body();
        Ok(DatabaseDeclaration { statements, line })
    }

    /// `integrate [with] <Service>:`
    fn parse_integration(&mut self) -> Result<IntegrationDeclaration, ParseError> {
        let line = self.current().line();
        self.expect(TokenKind::Integrate)?;
        if self.check(TokenKind::With) {
            self.advance();
        }
        let service = self.collect_header_words();
        if service.is_empty() {
            return Err(self.error("expected service name after 'integrate with'"));
        }
        self.expect_header_end("integrate")?;
        let statements = self.parse_statement_body();
        Ok(IntegrationDeclaration {
            service,
            statements,
            line,
        })
    }

    /// `environment <name>:`
    fn parse_environment(&mut self) -> Result<EnvironmentDeclaration, ParseError> {
        let line = self.current().line();
        self.expect(TokenKind::Environment)?;
        let name = self.collect_header_words();
        if name.is_empty() {
            return Err(self.error("expected environment name"));
        }
        self.expect_header_end("environment")?;
        let statements = self.parse_statement_body();
        Ok(EnvironmentDeclaration {
            name,
            statements,
            line,
        })
    }

    /// `build [with]:`
    fn parse_build(&mut self) -> Result<BuildDeclaration, ParseError> {
        let line = self.current().line();
        self.expect(TokenKind::Build)?;
        if self.check(TokenKind::With) {
            self.advance();
        }
        self.expect_header_end("build")?;
        let statements = self.parse_statement_body();
        Ok(BuildDeclaration { statements, line })
    }

    /// `architecture: <style>` or `architecture <style>:`, optionally with a
    /// body of service and gateway clauses.
    fn parse_architecture(&mut self) -> Result<ArchitectureDeclaration, ParseError> {
        let line = self.current().line();
        self.expect(TokenKind::Architecture)?;

        let style = if self.check(TokenKind::Colon) && !self.colon_closes_line() {
            self.advance();
            let style = self.collect_header_words();
            if self.check(TokenKind::Colon) {
                self.advance();
            }
            if !self.at_line_end() {
                return Err(self.error(&format!(
                    "unexpected {} in architecture header",
                    self.describe_current()
                )));
            }
            Some(style)
        } else {
            let style = self.collect_header_words();
            self.expect_header_end("architecture")?;
            Some(style)
        };
        let style = style.filter(|s| !s.is_empty());

        let statements = self.parse_statement_body();
        Ok(ArchitectureDeclaration {
            style,
            statements,
            line,
        })
    }

    // ========================================================================
    // Bodies
    // ========================================================================

    /// Parse the rest of a header line and an optional indented body,
    /// handing each content line to `on_line`.
    ///
    /// Nested indentation inside the body (continuation lines) is tracked
    /// with a depth counter: an inner dedent only closes the nested level,
    /// and nested lines are handed to `on_line` like any other line.
    fn parse_body(&mut self, mut on_line: impl FnMut(&mut Self)) {
        self.skip_newline();
        if !self.check(TokenKind::Indent) {
            return;
        }
        self.advance();

        let mut depth = 1usize;
        while depth > 0 && !self.is_at_end() {
            match self.current().kind {
                TokenKind::Indent => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::Dedent => {
                    depth -= 1;
                    self.advance();
                }
                TokenKind::Newline => self.advance(),
                TokenKind::SectionHeader => {
                    self.advance();
                    self.skip_newline();
                }
                _ => {
                    let start = self.pos;
                    on_line(self);
                    if self.pos == start {
                        self.advance();
                    }
                }
            }
        }
    }

    fn parse_statement_body(&mut self) -> Vec<Statement> {
        let mut statements = Vec::new();
        self.parse_body(|p| statements.push(p.parse_statement_line()));
        statements
    }

    /// Lines indented with no block header above them.
    fn parse_indented_lines(&mut self) -> Vec<Statement> {
        self.parse_statement_body()
    }

    /// Capture one line as a generic statement and consume its line break.
    pub(crate) fn parse_statement_line(&mut self) -> Statement {
        let line = self.current().line();
        let start = self.pos;
        while !self.at_line_end() && !self.check_any(&[TokenKind::Indent, TokenKind::Dedent]) {
            self.advance();
        }
        let statement = statement_from_tokens(&self.tokens[start..self.pos], line);
        self.skip_newline();
        statement
    }

    // ========================================================================
    // Data clauses
    // ========================================================================

    fn parse_data_clause(&mut self, decl: &mut DataDeclaration) {
        let result = match self.current().kind {
            TokenKind::Has => self.parse_has_clause(),
            TokenKind::Belongs => self.parse_belongs_clause().map(HasClause::Relationship),
            _ => {
                decl.statements.push(self.parse_statement_line());
                return;
            }
        };

        match result {
            Ok(HasClause::Field(field)) => decl.fields.push(field),
            Ok(HasClause::Relationship(rel)) => decl.relationships.push(rel),
            Err(err) => self.record(err),
        }
        self.skip_line();
    }

    /// `has many <Target> [through <Join>]` or
    /// `has [a|an] [modifiers] <name> [which is [modifiers] <type|either ...>] [defaults to <v>]`
    fn parse_has_clause(&mut self) -> Result<HasClause, ParseError> {
        let line = self.current().line();
        self.expect(TokenKind::Has)?;

        if self.check(TokenKind::Many) {
            self.advance();
            let target = self.expect_name("relationship target")?;
            let through = if self.check(TokenKind::Through) {
                self.advance();
                Some(self.expect_name("join model")?)
            } else {
                None
            };
            return Ok(HasClause::Relationship(Relationship {
                kind: RelationshipKind::HasMany,
                target,
                through,
                line,
            }));
        }

        self.skip_article();
        let mut modifiers = Vec::new();
        self.parse_modifiers(&mut modifiers);

        let mut name_words: Vec<String> = Vec::new();
        loop {
            if self.check(TokenKind::Possessive) {
                // `'s` stays on the word it follows: `user's name`.
                match name_words.last_mut() {
                    Some(last) => last.push_str(&self.current().literal),
                    None => break,
                }
            } else if self.current().kind.is_word()
                && !self.check_any(&[TokenKind::Which, TokenKind::Defaults])
                && !(self.check(TokenKind::And) && self.peek_kind(1) == TokenKind::Defaults)
            {
                name_words.push(self.current().literal.clone());
            } else {
                break;
            }
            self.advance();
        }
        if name_words.is_empty() {
            return Err(self.error("expected field name after 'has'"));
        }

        let mut field = Field {
            name: name_words.join(" "),
            field_type: None,
            modifiers: Vec::new(),
            enum_values: Vec::new(),
            default: None,
            line,
        };

        if self.check(TokenKind::Which) {
            self.advance();
            self.expect(TokenKind::Is)?;
            self.skip_article();
            self.parse_modifiers(&mut modifiers);

            if self.check(TokenKind::Either) {
                self.advance();
                field.enum_values = self.parse_enum_values()?;
                field.field_type = Some("enum".to_string());
            } else {
                let mut type_words = Vec::new();
                while self.current().kind.is_word()
                    && !self.check_any(&[TokenKind::And, TokenKind::Defaults])
                {
                    type_words.push(self.current().literal.to_lowercase());
                    self.advance();
                }
                if !type_words.is_empty() {
                    field.field_type = Some(type_words.join(" "));
                }
            }
        }

        while self.check_any(&[TokenKind::And, TokenKind::Comma]) {
            self.advance();
        }
        if self.check(TokenKind::Defaults) {
            self.advance();
            self.expect(TokenKind::To)?;
            field.default = Some(self.parse_value()?);
        }

        field.modifiers = modifiers;
        Ok(HasClause::Field(field))
    }

    /// `belongs to [a|an|the] <Target>`
    fn parse_belongs_clause(&mut self) -> Result<Relationship, ParseError> {
        let line = self.current().line();
        self.expect(TokenKind::Belongs)?;
        self.expect(TokenKind::To)?;
        self.skip_article();
        let target = self.expect_name("relationship target")?;
        Ok(Relationship {
            kind: RelationshipKind::BelongsTo,
            target,
            through: None,
            line,
        })
    }

    fn parse_modifiers(&mut self, modifiers: &mut Vec<FieldModifier>) {
        loop {
            let modifier = match self.current().kind {
                TokenKind::Optional => FieldModifier::Optional,
                TokenKind::Unique => FieldModifier::Unique,
                TokenKind::Encrypted => FieldModifier::Encrypted,
                _ => break,
            };
            if !modifiers.contains(&modifier) {
                modifiers.push(modifier);
            }
            self.advance();
            // `unique and encrypted text`
            if self.check(TokenKind::And)
                && matches!(
                    self.peek_kind(1),
                    TokenKind::Optional | TokenKind::Unique | TokenKind::Encrypted
                )
            {
                self.advance();
            }
        }
    }

    /// `"a" or "b"`, `"a", "b", or "c"`; bare words are accepted too.
    fn parse_enum_values(&mut self) -> Result<Vec<String>, ParseError> {
        let mut values = Vec::new();
        loop {
            let kind = self.current().kind;
            let is_value = kind == TokenKind::StringLit
                || (kind.is_word()
                    && !matches!(kind, TokenKind::Or | TokenKind::And | TokenKind::Defaults));
            if !is_value {
                break;
            }
            values.push(self.current().literal.clone());
            self.advance();

            match self.current().kind {
                TokenKind::Comma => {
                    self.advance();
                    if self.check(TokenKind::Or) {
                        self.advance();
                    }
                }
                TokenKind::Or => self.advance(),
                _ => break,
            }
        }

        if values.is_empty() {
            return Err(self.error("expected values after 'either'"));
        }
        Ok(values)
    }

    /// A default value: a string literal or the remaining words.
    fn parse_value(&mut self) -> Result<String, ParseError> {
        if self.check(TokenKind::StringLit) {
            let value = self.current().literal.clone();
            self.advance();
            return Ok(value);
        }
        let value = self.rest_of_line();
        if value.is_empty() {
            return Err(self.error("expected value after 'defaults to'"));
        }
        Ok(value)
    }

    /// `a, b, and c` up to the end of the line.
    fn parse_name_list(&mut self) -> Vec<String> {
        let mut names = Vec::new();
        let mut current: Vec<Token> = Vec::new();

        while !self.at_line_end() {
            match self.current().kind {
                TokenKind::Comma | TokenKind::And => {
                    if !current.is_empty() {
                        names.push(render_tokens(&current));
                        current.clear();
                    }
                }
                TokenKind::StringLit => {
                    names.push(self.current().literal.clone());
                }
                _ => current.push(self.current().clone()),
            }
            self.advance();
        }
        if !current.is_empty() {
            names.push(render_tokens(&current));
        }
        self.skip_newline();
        names
    }

    // ========================================================================
    // Error recovery
    // ========================================================================

    fn record(&mut self, error: ParseError) {
        tracing::warn!(
            line = error.line,
            column = error.column,
            message = %error.message,
            "parse error"
        );
        self.errors.push(error);
    }

    /// Discard tokens until a top-level keyword starts a line at
    /// indentation depth zero.
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        let mut at_line_start = false;

        while !self.is_at_end() {
            let kind = self.current().kind;
            match kind {
                TokenKind::Newline => at_line_start = true,
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent => depth = depth.saturating_sub(1),
                _ => {
                    if at_line_start && depth == 0 && kind.starts_block() {
                        return;
                    }
                    at_line_start = false;
                }
            }
            self.advance();
        }
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    pub(crate) fn current(&self) -> &Token {
        let idx = self.pos.min(self.tokens.len().saturating_sub(1));
        &self.tokens[idx]
    }

    pub(crate) fn peek_kind(&self, offset: usize) -> TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len().saturating_sub(1));
        self.tokens[idx].kind
    }

    pub(crate) fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn check_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current().kind)
    }

    fn at_line_end(&self) -> bool {
        self.check_any(&[TokenKind::Newline, TokenKind::Eof])
    }

    /// The current colon is the last token on its line.
    fn colon_closes_line(&self) -> bool {
        self.check(TokenKind::Colon)
            && matches!(self.peek_kind(1), TokenKind::Newline | TokenKind::Eof)
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!(
                "expected {}, found {}",
                kind,
                self.describe_current()
            )))
        }
    }

    /// Block names may be identifiers, numbers, keywords or strings.
    pub(crate) fn expect_name(&mut self, what: &str) -> Result<String, ParseError> {
        let token = self.current();
        if token.kind.is_word() || token.kind == TokenKind::StringLit {
            let name = token.literal.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error(&format!(
                "expected {} name, found {}",
                what,
                self.describe_current()
            )))
        }
    }

    /// Require the header's closing colon as the last token on the line.
    fn expect_header_end(&mut self, what: &str) -> Result<(), ParseError> {
        if self.colon_closes_line() {
            self.advance();
            return Ok(());
        }
        if self.check(TokenKind::Colon) {
            self.advance();
            return Err(self.error(&format!(
                "unexpected {} after ':' in {} header",
                self.describe_current(),
                what
            )));
        }
        Err(self.error(&format!(
            "expected ':' after {} header, found {}",
            what,
            self.describe_current()
        )))
    }

    /// Words up to the header's closing colon (or the end of the line).
    fn collect_header_words(&mut self) -> String {
        let start = self.pos;
        while !self.at_line_end() && !self.colon_closes_line() {
            self.advance();
        }
        render_tokens(&self.tokens[start..self.pos])
    }

    /// Everything up to the end of the line, without consuming the break.
    fn rest_of_line(&mut self) -> String {
        let start = self.pos;
        while !self.at_line_end() {
            self.advance();
        }
        render_tokens(&self.tokens[start..self.pos])
    }

    fn skip_article(&mut self) {
        if self.check_any(&[TokenKind::A, TokenKind::An, TokenKind::The]) {
            self.advance();
        }
    }

    fn skip_newline(&mut self) {
        if self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    /// Drop whatever is left of the current line, including its break.
    fn skip_line(&mut self) {
        while !self.at_line_end() {
            self.advance();
        }
        self.skip_newline();
    }

    fn describe_current(&self) -> String {
        let token = self.current();
        if token.kind.is_word() || token.kind == TokenKind::StringLit {
            format!("'{}'", token.literal)
        } else {
            token.kind.to_string()
        }
    }

    pub(crate) fn error(&self, msg: &str) -> ParseError {
        let span = self.current().span;
        ParseError {
            message: msg.to_string(),
            line: span.line,
            column: span.column,
        }
    }
}

/// Build a statement from the tokens of one line.
fn statement_from_tokens(tokens: &[Token], line: usize) -> Statement {
    let kind = tokens
        .first()
        .map(|t| t.literal.to_lowercase())
        .unwrap_or_default();
    Statement {
        kind,
        text: render_tokens(tokens),
        line,
    }
}

// ============================================================================
// CONVENIENCE FUNCTIONS
// ============================================================================

/// Parse an already-lexed token stream.
pub fn parse_tokens(tokens: Vec<Token>) -> (Program, Vec<ParseError>) {
    Parser::new(tokens).parse()
}

/// Lex and parse source text. Lexer errors are fatal; parse errors are
/// returned next to the partial program.
pub fn parse(source: &str) -> Result<(Program, Vec<ParseError>), LexError> {
    let tokens = Lexer::new(source).tokenize()?;
    Ok(parse_tokens(tokens))
}

// ============================================================================
// TESTS
// ============================================================================
