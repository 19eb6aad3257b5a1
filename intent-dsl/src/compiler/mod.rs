//! IR Builder - Lower the AST to the Intent Representation
//!
//! Lowering is total: every AST shape produces an `Application`. Clauses the
//! builder cannot structure are carried through as classified `Action`s or
//! raw text, and deciding whether they are usable is left to later stages.
//!
//! # Pipeline
//!
//! ```text
//! Source → Lexer → Parser → Program → IrBuilder → Application → Generators
//! ```

mod actions;
mod architecture;
mod extract;
pub mod ir;
mod settings;

pub use actions::{action_from, actions_from, classify, Verb};
pub use extract::extract_validation;
pub use ir::*;

use crate::config::LoweringOptions;
use crate::parser::ast::*;

/// Trigger phrases that mark a `when` block as a CI/CD pipeline.
const PIPELINE_TRIGGERS: [&str; 5] = [
    "code is pushed",
    "pushed to",
    "pull request",
    "is merged",
    "commit",
];

// ============================================================================
// IR BUILDER
// ============================================================================

/// Lowers a parsed [`Program`] into an [`Application`].
#[derive(Debug, Clone, Default)]
pub struct IrBuilder {
    options: LoweringOptions,
}

impl IrBuilder {
    pub fn new(options: LoweringOptions) -> Self {
        Self { options }
    }

    /// Lower a program with default options.
    pub fn build(program: &Program) -> Application {
        Self::default().lower(program)
    }

    /// Lower a program. Never fails.
    pub fn lower(&self, program: &Program) -> Application {
        let mut app = Application {
            sections: program.sections.clone(),
            ..Default::default()
        };

        if let Some(decl) = &program.app {
            app.name = Some(decl.name.clone());
            app.platform = self.lower_platform(decl);
        }
        app.config = program.build.as_ref().map(|b| self.lower_build(b));

        app.data = program.data.iter().map(|d| self.lower_data(d)).collect();
        app.pages = program.pages.iter().map(Self::lower_page).collect();
        app.components = program.components.iter().map(Self::lower_component).collect();
        app.apis = program.apis.iter().map(|a| self.lower_endpoint(a)).collect();
        app.policies = program.policies.iter().map(Self::lower_policy).collect();

        for workflow in &program.workflows {
            let steps = actions_from(&workflow.statements);
            if is_pipeline_trigger(&workflow.trigger) {
                app.pipelines.push(Pipeline {
                    trigger: workflow.trigger.clone(),
                    steps,
                });
            } else {
                app.workflows.push(Workflow {
                    trigger: workflow.trigger.clone(),
                    steps,
                });
            }
        }

        app.theme = program.theme.as_ref().map(|t| self.lower_theme(t));
        app.auth = program.authentication.as_ref().map(|a| self.lower_auth(a));
        app.database = program.database.as_ref().map(|d| self.lower_database(d));
        app.integrations = program
            .integrations
            .iter()
            .map(|i| self.lower_integration(i))
            .collect();
        app.environments = program
            .environments
            .iter()
            .map(|e| self.lower_environment(e))
            .collect();
        app.error_handlers = program
            .error_handlers
            .iter()
            .map(|h| ErrorHandler {
                condition: h.condition.clone(),
                steps: actions_from(&h.statements),
            })
            .collect();
        app.architecture = program
            .architecture
            .as_ref()
            .map(|a| self.lower_architecture(a));

        for statement in &program.statements {
            match self.lower_monitoring(statement) {
                Some(rule) => app.monitoring.push(rule),
                None => app.statements.push(action_from(statement)),
            }
        }

        tracing::debug!(
            data = app.data.len(),
            pages = app.pages.len(),
            apis = app.apis.len(),
            workflows = app.workflows.len(),
            pipelines = app.pipelines.len(),
            monitoring = app.monitoring.len(),
            "lowered program"
        );
        app
    }

    /// Leading article handling per the lowering options.
    pub(crate) fn article<'a>(&self, text: &'a str) -> &'a str {
        if self.options.strip_articles {
            extract::strip_article(text.trim())
        } else {
            text.trim()
        }
    }

    // ========================================================================
    // Data
    // ========================================================================

    fn lower_data(&self, decl: &DataDeclaration) -> DataModel {
        DataModel {
            name: decl.name.clone(),
            fields: decl.fields.iter().map(Self::lower_field).collect(),
            relations: decl.relationships.iter().map(Self::lower_relation).collect(),
            notes: decl.statements.iter().map(|s| s.text.clone()).collect(),
        }
    }

    fn lower_field(field: &Field) -> DataField {
        let field_type = if !field.enum_values.is_empty() {
            "enum".to_string()
        } else {
            field
                .field_type
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "text".to_string())
        };

        DataField {
            name: field.name.clone(),
            field_type,
            required: !field.has_modifier(FieldModifier::Optional),
            unique: field.has_modifier(FieldModifier::Unique),
            encrypted: field.has_modifier(FieldModifier::Encrypted),
            enum_values: field.enum_values.clone(),
            default: field.default.clone(),
        }
    }

    fn lower_relation(rel: &Relationship) -> Relation {
        let kind = match (rel.kind, &rel.through) {
            (RelationshipKind::BelongsTo, _) => RelationKind::BelongsTo,
            (RelationshipKind::HasMany, Some(_)) => RelationKind::HasManyThrough,
            (RelationshipKind::HasMany, None) => RelationKind::HasMany,
        };
        Relation {
            kind,
            target: rel.target.clone(),
            through: rel.through.clone(),
        }
    }

    // ========================================================================
    // Pages, components, endpoints, policies
    // ========================================================================

    fn lower_page(decl: &PageDeclaration) -> Page {
        Page {
            name: decl.name.clone(),
            content: actions_from(&decl.statements),
        }
    }

    fn lower_component(decl: &ComponentDeclaration) -> Component {
        Component {
            name: decl.name.clone(),
            props: decl.props.clone(),
            content: actions_from(&decl.statements),
        }
    }

    /// A `check` clause that yields a rule is recorded only as validation;
    /// one that does not stays a `validate` step.
    fn lower_endpoint(&self, decl: &ApiDeclaration) -> Endpoint {
        let mut endpoint = Endpoint {
            name: decl.name.clone(),
            auth: decl.requires_auth,
            params: decl.params.clone(),
            validation: Vec::new(),
            steps: Vec::new(),
        };

        for statement in &decl.statements {
            if statement.kind == "check" {
                match extract_validation(&statement.text, self.options.strip_articles) {
                    Extracted::Recognized(rule) => {
                        endpoint.validation.push(rule);
                        continue;
                    }
                    Extracted::Raw(_) => {}
                }
            }
            endpoint.steps.push(action_from(statement));
        }

        endpoint
    }

    fn lower_policy(decl: &PolicyDeclaration) -> Policy {
        let (permissions, restrictions): (Vec<_>, Vec<_>) =
            decl.rules.iter().partition(|rule| rule.allowed);
        Policy {
            name: decl.name.clone(),
            permissions: permissions.into_iter().map(|r| r.text.clone()).collect(),
            restrictions: restrictions.into_iter().map(|r| r.text.clone()).collect(),
            notes: decl.statements.iter().map(|s| s.text.clone()).collect(),
        }
    }
}

fn is_pipeline_trigger(trigger: &str) -> bool {
    let lower = trigger.to_lowercase();
    PIPELINE_TRIGGERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn lower(source: &str) -> Application {
        let (program, errors) = parse(source).expect("source should lex");
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
        IrBuilder::build(&program)
    }

    #[test]
    fn test_lower_app_header() {
        let app = lower("app TaskFlow is a web application\n");
        assert_eq!(app.name.as_deref(), Some("TaskFlow"));
        assert_eq!(app.platform.as_deref(), Some("web application"));
    }

    #[test]
    fn test_field_lowering() {
        let app = lower(
            "data Task:\n  has a title which is text\n  has an optional note\n  has a status which is either \"todo\" or \"done\"\n  has a code which is unique encrypted text\n",
        );
        let task = app.data_model("Task").expect("Task model");

        let title = task.field("title").expect("title");
        assert_eq!(title.field_type, "text");
        assert!(title.required);

        let note = task.field("note").expect("note");
        assert_eq!(note.field_type, "text");
        assert!(!note.required);

        let status = task.field("status").expect("status");
        assert_eq!(status.field_type, "enum");
        assert_eq!(status.enum_values, vec!["todo", "done"]);

        let code = task.field("code").expect("code");
        assert!(code.unique && code.encrypted);
    }

    #[test]
    fn test_relationship_lowering() {
        let app = lower(
            "data Task:\n  belongs to a User\n  has many Comment\n  has many Tag through TaskTag\n",
        );
        let relations = &app.data[0].relations;
        assert_eq!(relations[0].kind, RelationKind::BelongsTo);
        assert_eq!(relations[1].kind, RelationKind::HasMany);
        assert_eq!(relations[1].through, None);
        assert_eq!(relations[2].kind, RelationKind::HasManyThrough);
        assert_eq!(relations[2].target, "Tag");
        assert_eq!(relations[2].through.as_deref(), Some("TaskTag"));
    }

    #[test]
    fn test_endpoint_auth_and_validation() {
        let app = lower(
            "api CreateTask:\n  requires authentication\n  accepts title\n  check that title is not empty\n  check the quota\n  create a Task\n  respond with the task\n",
        );
        let endpoint = app.endpoint("CreateTask").expect("endpoint");
        assert!(endpoint.auth);
        assert_eq!(endpoint.params, vec!["title"]);
        assert_eq!(
            endpoint.validation,
            vec![ValidationRule {
                field: "title".to_string(),
                rule: "not_empty".to_string(),
                value: None,
            }]
        );

        let kinds: Vec<ActionKind> = endpoint.steps.iter().map(|s| s.action_type).collect();
        assert_eq!(
            kinds,
            vec![ActionKind::Validate, ActionKind::Create, ActionKind::Respond]
        );
        assert!(endpoint
            .steps
            .iter()
            .all(|s| !s.text.contains("requires authentication")));
    }

    #[test]
    fn test_endpoint_without_auth() {
        let app = lower("api Health:\n  respond with ok\n");
        assert!(!app.apis[0].auth);
    }

    #[test]
    fn test_policy_lowering() {
        let app = lower("policy Member:\n  can view tasks\n  cannot delete tasks\n");
        let policy = &app.policies[0];
        assert_eq!(policy.permissions, vec!["view tasks"]);
        assert_eq!(policy.restrictions, vec!["delete tasks"]);
    }

    #[test]
    fn test_workflow_and_pipeline_split() {
        let app = lower(
            "when a user signs up:\n  send a welcome email\nwhen code is pushed to main:\n  run the tests\n  deploy to staging\n",
        );
        assert_eq!(app.workflows.len(), 1);
        assert_eq!(app.workflows[0].steps[0].action_type, ActionKind::Send);
        assert_eq!(app.pipelines.len(), 1);
        assert_eq!(app.pipelines[0].trigger, "code is pushed to main");
        assert_eq!(app.pipelines[0].steps.len(), 2);
    }

    #[test]
    fn test_top_level_statements() {
        let app = lower("track page views\nrepository:\n  url is github.com/acme/app\n");
        assert_eq!(app.monitoring.len(), 1);
        assert_eq!(app.monitoring[0].metric, "page views");
        assert_eq!(app.statements.len(), 2);
        assert!(app
            .statements
            .iter()
            .all(|a| a.action_type == ActionKind::Configure));
    }

    #[test]
    fn test_error_handlers() {
        let app = lower("if payment fails:\n  retry 3 times\n  notify the user\n");
        let handler = &app.error_handlers[0];
        assert_eq!(handler.condition, "payment fails");
        assert_eq!(handler.steps[0].action_type, ActionKind::Retry);
        assert_eq!(handler.steps[1].action_type, ActionKind::Send);
    }

    #[test]
    fn test_quoted_values_keep_embedded_quotes() {
        let app = lower(
            "environment production:\n  greeting is \"say \\\"hi\\\"\"\n  path is \"C:\\\\apps\"\n",
        );
        let env = &app.environments[0];
        assert_eq!(env.config.get("greeting").map(String::as_str), Some("say \"hi\""));
        assert_eq!(env.config.get("path").map(String::as_str), Some("C:\\apps"));
    }

    #[test]
    fn test_strip_articles_disabled() {
        let (program, _) = parse("app Shop is an online store\n").expect("lex");
        let app = IrBuilder::new(LoweringOptions {
            strip_articles: false,
        })
        .lower(&program);
        assert_eq!(app.platform.as_deref(), Some("an online store"));
    }

    #[test]
    fn test_empty_program() {
        let app = IrBuilder::build(&Program::default());
        assert_eq!(app, Application::default());
    }
}
