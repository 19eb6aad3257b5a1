//! Abstract Syntax Tree types

use serde::{Deserialize, Serialize};

// ============================================================================
// AST TYPES
// ============================================================================

/// The root AST node for an intent document.
///
/// Singleton blocks are optional; repeatable blocks keep source order. A
/// second `theme:` (or other singleton) replaces the first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub app: Option<AppDeclaration>,
    pub theme: Option<ThemeDeclaration>,
    pub authentication: Option<AuthenticationDeclaration>,
    pub database: Option<DatabaseDeclaration>,
    pub build: Option<BuildDeclaration>,
    pub architecture: Option<ArchitectureDeclaration>,

    pub data: Vec<DataDeclaration>,
    pub pages: Vec<PageDeclaration>,
    pub components: Vec<ComponentDeclaration>,
    pub apis: Vec<ApiDeclaration>,
    pub policies: Vec<PolicyDeclaration>,
    pub workflows: Vec<WorkflowDeclaration>,
    pub integrations: Vec<IntegrationDeclaration>,
    pub environments: Vec<EnvironmentDeclaration>,
    pub error_handlers: Vec<ErrorHandlerDeclaration>,

    /// Section header labels, in order. Purely organizational.
    pub sections: Vec<String>,
    /// Clauses outside any block.
    pub statements: Vec<Statement>,
}

impl Program {
    /// Number of block declarations in the program (singletons included).
    pub fn declaration_count(&self) -> usize {
        let singletons = [
            self.app.is_some(),
            self.theme.is_some(),
            self.authentication.is_some(),
            self.database.is_some(),
            self.build.is_some(),
            self.architecture.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count();

        singletons
            + self.data.len()
            + self.pages.len()
            + self.components.len()
            + self.apis.len()
            + self.policies.len()
            + self.workflows.len()
            + self.integrations.len()
            + self.environments.len()
            + self.error_handlers.len()
    }
}

/// One clause inside a block body, kept as text for the IR builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// Lowercase leading word, used for dispatch.
    pub kind: String,
    pub text: String,
    pub line: usize,
}

/// `app <Name> is <platform>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDeclaration {
    pub name: String,
    pub platform: Option<String>,
    pub line: usize,
}

/// `data <Name>:` with fields and relationships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataDeclaration {
    pub name: String,
    pub fields: Vec<Field>,
    pub relationships: Vec<Relationship>,
    pub statements: Vec<Statement>,
    pub line: usize,
}

/// A field declared with `has`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Type word as written; `None` when the clause names no type.
    pub field_type: Option<String>,
    pub modifiers: Vec<FieldModifier>,
    pub enum_values: Vec<String>,
    pub default: Option<String>,
    pub line: usize,
}

impl Field {
    pub fn has_modifier(&self, modifier: FieldModifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldModifier {
    Optional,
    Unique,
    Encrypted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: RelationshipKind,
    pub target: String,
    pub through: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    BelongsTo,
    HasMany,
}

/// `page <Name>:`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDeclaration {
    pub name: String,
    pub statements: Vec<Statement>,
    pub line: usize,
}

/// `component <Name>:`; props come from `accepts` clauses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDeclaration {
    pub name: String,
    pub props: Vec<String>,
    pub statements: Vec<Statement>,
    pub line: usize,
}

/// `api <Name>:`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDeclaration {
    pub name: String,
    pub requires_auth: bool,
    pub params: Vec<String>,
    pub statements: Vec<Statement>,
    pub line: usize,
}

/// `policy <Name>:` with `can` / `cannot` rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDeclaration {
    pub name: String,
    pub rules: Vec<PolicyRuleDecl>,
    pub statements: Vec<Statement>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRuleDecl {
    /// `true` for `can`, `false` for `cannot`.
    pub allowed: bool,
    pub text: String,
    pub line: usize,
}

/// `when <trigger>:`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDeclaration {
    pub trigger: String,
    pub statements: Vec<Statement>,
    pub line: usize,
}

/// `if <condition>:` at the top level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorHandlerDeclaration {
    pub condition: String,
    pub statements: Vec<Statement>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeDeclaration {
    pub statements: Vec<Statement>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationDeclaration {
    pub statements: Vec<Statement>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseDeclaration {
    pub statements: Vec<Statement>,
    pub line: usize,
}

/// `integrate with <Service>:`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationDeclaration {
    pub service: String,
    pub statements: Vec<Statement>,
    pub line: usize,
}

/// `environment <name>:`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentDeclaration {
    pub name: String,
    pub statements: Vec<Statement>,
    pub line: usize,
}

/// `build with:`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDeclaration {
    pub statements: Vec<Statement>,
    pub line: usize,
}

/// `architecture: <style>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureDeclaration {
    pub style: Option<String>,
    pub statements: Vec<Statement>,
    pub line: usize,
}

// ============================================================================
// PARSE ERROR
// ============================================================================

/// Parse error with line/column information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

/// Every error recorded during one parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
    pub fn iter(&self) -> std::slice::Iter<'_, ParseError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "no parse errors"),
            [only] => write!(f, "{}", only),
            [first, rest @ ..] => write!(f, "{} (and {} more)", first, rest.len()),
        }
    }
}

impl std::error::Error for ParseErrors {}
