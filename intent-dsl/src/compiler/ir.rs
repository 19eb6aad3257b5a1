//! Intent Representation (IR) types
//!
//! The `Application` record is the only thing handed to code generators.
//! Optional data is `None` or an empty collection; maps are `BTreeMap` so
//! serialized output is stable across runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

/// Errors from reading or writing a serialized IR.
#[derive(Debug, Error)]
pub enum IrFormatError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// ============================================================================
// APPLICATION
// ============================================================================

/// The lowered application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub name: Option<String>,
    pub platform: Option<String>,
    pub config: Option<BuildConfig>,
    pub sections: Vec<String>,

    pub data: Vec<DataModel>,
    pub pages: Vec<Page>,
    pub components: Vec<Component>,
    pub apis: Vec<Endpoint>,
    pub policies: Vec<Policy>,
    pub workflows: Vec<Workflow>,
    pub pipelines: Vec<Pipeline>,

    pub theme: Option<Theme>,
    pub auth: Option<Auth>,
    pub database: Option<DatabaseConfig>,
    pub integrations: Vec<Integration>,
    pub environments: Vec<Environment>,
    pub error_handlers: Vec<ErrorHandler>,
    pub architecture: Option<Architecture>,
    pub monitoring: Vec<MonitoringRule>,

    /// Top-level clauses that are not monitoring rules.
    pub statements: Vec<Action>,
}

impl Application {
    pub fn to_json(&self) -> Result<String, IrFormatError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, IrFormatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(source: &str) -> Result<Self, IrFormatError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn to_yaml(&self) -> Result<String, IrFormatError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(source: &str) -> Result<Self, IrFormatError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn data_model(&self, name: &str) -> Option<&DataModel> {
        self.data.iter().find(|m| m.name == name)
    }

    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.apis.iter().find(|e| e.name == name)
    }
}

/// Target stack from the `build with:` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub frontend: Option<String>,
    pub backend: Option<String>,
    pub database: Option<String>,
    pub deploy: Option<String>,
    pub options: BTreeMap<String, String>,
}

impl BuildConfig {
    /// Whether any configured target mentions `framework`, ignoring case.
    /// Generator selection keys off this.
    pub fn targets_framework(&self, framework: &str) -> bool {
        let needle = framework.to_lowercase();
        if needle.is_empty() {
            return false;
        }
        [&self.frontend, &self.backend, &self.database, &self.deploy]
            .into_iter()
            .flatten()
            .any(|target| target.to_lowercase().contains(&needle))
    }
}

// ============================================================================
// DATA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataModel {
    pub name: String,
    pub fields: Vec<DataField>,
    pub relations: Vec<Relation>,
    /// Clauses in the block that are neither fields nor relations.
    pub notes: Vec<String>,
}

impl DataModel {
    pub fn field(&self, name: &str) -> Option<&DataField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataField {
    pub name: String,
    pub field_type: String,
    pub required: bool,
    pub unique: bool,
    pub encrypted: bool,
    pub enum_values: Vec<String>,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub kind: RelationKind,
    pub target: String,
    pub through: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    BelongsTo,
    HasMany,
    HasManyThrough,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::BelongsTo => "belongs_to",
            RelationKind::HasMany => "has_many",
            RelationKind::HasManyThrough => "has_many_through",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PAGES, COMPONENTS, ENDPOINTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub name: String,
    pub content: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub props: Vec<String>,
    pub content: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub auth: bool,
    pub params: Vec<String>,
    pub validation: Vec<ValidationRule>,
    pub steps: Vec<Action>,
}

/// A structured check extracted from a `check that ...` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub field: String,
    /// `not_empty`, `valid_<kind>`, `min_length`, `max_length`, `unique`,
    /// `future_date`, `matches` or `authorization`.
    pub rule: String,
    pub value: Option<String>,
}

// ============================================================================
// POLICIES, WORKFLOWS, PIPELINES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub name: String,
    pub permissions: Vec<String>,
    pub restrictions: Vec<String>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub trigger: String,
    pub steps: Vec<Action>,
}

/// A workflow triggered by source control events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub trigger: String,
    pub steps: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorHandler {
    pub condition: String,
    pub steps: Vec<Action>,
}

// ============================================================================
// SETTINGS BLOCKS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub colors: BTreeMap<String, String>,
    pub fonts: BTreeMap<String, String>,
    pub design_system: Option<String>,
    pub border_radius: Option<String>,
    pub spacing: Option<String>,
    pub dark_mode: Option<bool>,
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
    pub methods: Vec<AuthMethod>,
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthMethod {
    /// `email_password`, `oauth`, `magic_link`, `sso`, `api_key`,
    /// `two_factor`, or the clause words joined with `_`.
    pub method_type: String,
    pub provider: Option<String>,
    pub config: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub engine: Option<String>,
    pub indexes: Vec<Index>,
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub entity: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integration {
    pub service: String,
    /// Credential name to environment variable.
    pub credentials: BTreeMap<String, String>,
    pub config: BTreeMap<String, String>,
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    pub config: BTreeMap<String, String>,
    pub rules: Vec<String>,
}

// ============================================================================
// ARCHITECTURE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Architecture {
    pub style: Option<String>,
    pub services: Vec<ServiceDef>,
    pub gateway: Option<Gateway>,
    pub broker: Option<String>,
    /// Clauses before any service or gateway that were not recognized.
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDef {
    pub name: String,
    pub handles: Vec<String>,
    pub owns: Vec<String>,
    pub talks_to: Vec<String>,
    pub port: Option<u16>,
    pub own_database: bool,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gateway {
    pub routes: Vec<Route>,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub path: String,
    pub service: String,
}

// ============================================================================
// MONITORING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringRule {
    pub kind: MonitoringKind,
    pub metric: String,
    pub condition: Option<String>,
    pub channel: Option<String>,
    pub service: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringKind {
    Track,
    Alert,
}

// ============================================================================
// ACTIONS
// ============================================================================

/// A clause with its coarse classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub action_type: ActionKind,
    pub text: String,
}

/// Coarse shape of a clause, for generators that only need a rough idea of
/// what a line does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Display,
    Interact,
    Input,
    Navigate,
    Condition,
    Loop,
    Query,
    Create,
    Update,
    Delete,
    Validate,
    Respond,
    Send,
    Assign,
    Alert,
    Log,
    Delay,
    Retry,
    Configure,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Display => "display",
            ActionKind::Interact => "interact",
            ActionKind::Input => "input",
            ActionKind::Navigate => "navigate",
            ActionKind::Condition => "condition",
            ActionKind::Loop => "loop",
            ActionKind::Query => "query",
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
            ActionKind::Validate => "validate",
            ActionKind::Respond => "respond",
            ActionKind::Send => "send",
            ActionKind::Assign => "assign",
            ActionKind::Alert => "alert",
            ActionKind::Log => "log",
            ActionKind::Delay => "delay",
            ActionKind::Retry => "retry",
            ActionKind::Configure => "configure",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// EXTRACTION RESULTS
// ============================================================================

/// Outcome of a best-effort extraction: either the structured value, or the
/// clause text it was attempted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extracted<T> {
    Recognized(T),
    Raw(String),
}

impl<T> Extracted<T> {
    pub fn is_recognized(&self) -> bool {
        matches!(self, Extracted::Recognized(_))
    }

    pub fn recognized(self) -> Option<T> {
        match self {
            Extracted::Recognized(value) => Some(value),
            Extracted::Raw(_) => None,
        }
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            Extracted::Recognized(_) => None,
            Extracted::Raw(text) => Some(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_framework_ignores_case() {
        let config = BuildConfig {
            frontend: Some("React with TypeScript".to_string()),
            backend: Some("Node".to_string()),
            ..Default::default()
        };
        assert!(config.targets_framework("react"));
        assert!(config.targets_framework("NODE"));
        assert!(!config.targets_framework("django"));
        assert!(!config.targets_framework(""));
    }

    #[test]
    fn test_action_kind_serializes_snake_case() -> Result<(), serde_json::Error> {
        let action = Action {
            action_type: ActionKind::Loop,
            text: "for each task".to_string(),
        };
        let json = serde_json::to_string(&action)?;
        assert_eq!(json, r#"{"action_type":"loop","text":"for each task"}"#);
        Ok(())
    }

    #[test]
    fn test_relation_kind_names() {
        assert_eq!(RelationKind::HasManyThrough.to_string(), "has_many_through");
        assert_eq!(RelationKind::BelongsTo.as_str(), "belongs_to");
    }

    #[test]
    fn test_extracted_accessors() {
        let hit: Extracted<u8> = Extracted::Recognized(3);
        let miss: Extracted<u8> = Extracted::Raw("check totals".to_string());
        assert!(hit.is_recognized());
        assert_eq!(miss.raw(), Some("check totals"));
        assert_eq!(hit.recognized(), Some(3));
        assert_eq!(miss.recognized(), None);
    }
}
