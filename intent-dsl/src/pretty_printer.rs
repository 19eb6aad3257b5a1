//! Human-readable rendering of the lowered IR
//!
//! Used for inspecting what the front end understood from a document. Only
//! populated sections are printed; map entries come out in key order.

use crate::compiler::*;
use std::collections::BTreeMap;
use std::fmt::{self, Write};

/// Render an application as indented text.
pub fn describe(app: &Application) -> String {
    app.to_string()
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.platform) {
            (Some(name), Some(platform)) => writeln!(f, "app {} ({})", name, platform)?,
            (Some(name), None) => writeln!(f, "app {}", name)?,
            (None, _) => writeln!(f, "app <unnamed>")?,
        }

        if !self.sections.is_empty() {
            writeln!(f, "sections: {}", self.sections.join(", "))?;
        }

        if let Some(config) = &self.config {
            writeln!(f, "build:")?;
            write_opt(f, 1, "frontend", &config.frontend)?;
            write_opt(f, 1, "backend", &config.backend)?;
            write_opt(f, 1, "database", &config.database)?;
            write_opt(f, 1, "deploy", &config.deploy)?;
            write_map(f, 1, "options", &config.options)?;
        }

        for model in &self.data {
            writeln!(f, "data {}:", model.name)?;
            for field in &model.fields {
                write_field(f, field)?;
            }
            for relation in &model.relations {
                match &relation.through {
                    Some(through) => writeln!(
                        f,
                        "  {} {} through {}",
                        relation.kind, relation.target, through
                    )?,
                    None => writeln!(f, "  {} {}", relation.kind, relation.target)?,
                }
            }
        }

        for page in &self.pages {
            writeln!(f, "page {}:", page.name)?;
            write_actions(f, 1, &page.content)?;
        }

        for component in &self.components {
            writeln!(f, "component {}:", component.name)?;
            if !component.props.is_empty() {
                writeln!(f, "  props: {}", component.props.join(", "))?;
            }
            write_actions(f, 1, &component.content)?;
        }

        for endpoint in &self.apis {
            let auth = if endpoint.auth { " [auth]" } else { "" };
            writeln!(f, "api {}{}:", endpoint.name, auth)?;
            if !endpoint.params.is_empty() {
                writeln!(f, "  params: {}", endpoint.params.join(", "))?;
            }
            for rule in &endpoint.validation {
                match &rule.value {
                    Some(value) => writeln!(f, "  validate {} {} {}", rule.field, rule.rule, value)?,
                    None => writeln!(f, "  validate {} {}", rule.field, rule.rule)?,
                }
            }
            write_actions(f, 1, &endpoint.steps)?;
        }

        for policy in &self.policies {
            writeln!(f, "policy {}:", policy.name)?;
            for permission in &policy.permissions {
                writeln!(f, "  can {}", permission)?;
            }
            for restriction in &policy.restrictions {
                writeln!(f, "  cannot {}", restriction)?;
            }
        }

        for workflow in &self.workflows {
            writeln!(f, "workflow when {}:", workflow.trigger)?;
            write_actions(f, 1, &workflow.steps)?;
        }

        for pipeline in &self.pipelines {
            writeln!(f, "pipeline when {}:", pipeline.trigger)?;
            write_actions(f, 1, &pipeline.steps)?;
        }

        if let Some(theme) = &self.theme {
            writeln!(f, "theme:")?;
            write_map(f, 1, "colors", &theme.colors)?;
            write_map(f, 1, "fonts", &theme.fonts)?;
            write_opt(f, 1, "design system", &theme.design_system)?;
            write_opt(f, 1, "border radius", &theme.border_radius)?;
            write_opt(f, 1, "spacing", &theme.spacing)?;
            if let Some(dark) = theme.dark_mode {
                writeln!(f, "  dark mode: {}", dark)?;
            }
            write_map(f, 1, "options", &theme.options)?;
        }

        if let Some(auth) = &self.auth {
            writeln!(f, "auth:")?;
            for method in &auth.methods {
                match &method.provider {
                    Some(provider) => writeln!(f, "  method {} ({})", method.method_type, provider)?,
                    None => writeln!(f, "  method {}", method.method_type)?,
                }
                write_map(f, 2, "config", &method.config)?;
            }
            write_list(f, 1, "rules", &auth.rules)?;
        }

        if let Some(db) = &self.database {
            writeln!(f, "database:")?;
            write_opt(f, 1, "engine", &db.engine)?;
            for index in &db.indexes {
                writeln!(f, "  index {} by {}", index.entity, index.fields.join(", "))?;
            }
            write_list(f, 1, "rules", &db.rules)?;
        }

        for integration in &self.integrations {
            writeln!(f, "integration {}:", integration.service)?;
            write_opt(f, 1, "purpose", &integration.purpose)?;
            write_map(f, 1, "credentials", &integration.credentials)?;
            write_map(f, 1, "config", &integration.config)?;
        }

        for env in &self.environments {
            writeln!(f, "environment {}:", env.name)?;
            write_map(f, 1, "config", &env.config)?;
            write_list(f, 1, "rules", &env.rules)?;
        }

        for handler in &self.error_handlers {
            writeln!(f, "on error if {}:", handler.condition)?;
            write_actions(f, 1, &handler.steps)?;
        }

        if let Some(arch) = &self.architecture {
            write_architecture(f, arch)?;
        }

        for rule in &self.monitoring {
            write_monitoring(f, rule)?;
        }

        if !self.statements.is_empty() {
            writeln!(f, "statements:")?;
            write_actions(f, 1, &self.statements)?;
        }

        Ok(())
    }
}

fn write_field(f: &mut fmt::Formatter<'_>, field: &DataField) -> fmt::Result {
    let mut line = format!("  {}: {}", field.name, field.field_type);
    if !field.enum_values.is_empty() {
        write!(line, " [{}]", field.enum_values.join(" | "))?;
    }
    if !field.required {
        line.push_str(" optional");
    }
    if field.unique {
        line.push_str(" unique");
    }
    if field.encrypted {
        line.push_str(" encrypted");
    }
    if let Some(default) = &field.default {
        write!(line, " = {}", default)?;
    }
    writeln!(f, "{}", line)
}

fn write_architecture(f: &mut fmt::Formatter<'_>, arch: &Architecture) -> fmt::Result {
    match &arch.style {
        Some(style) => writeln!(f, "architecture {}:", style)?,
        None => writeln!(f, "architecture:")?,
    }
    write_opt(f, 1, "broker", &arch.broker)?;
    for service in &arch.services {
        writeln!(f, "  service {}:", service.name)?;
        write_list(f, 2, "handles", &service.handles)?;
        write_list(f, 2, "owns", &service.owns)?;
        write_list(f, 2, "talks to", &service.talks_to)?;
        if let Some(port) = service.port {
            writeln!(f, "    port: {}", port)?;
        }
        if service.own_database {
            writeln!(f, "    own database")?;
        }
    }
    if let Some(gateway) = &arch.gateway {
        writeln!(f, "  gateway:")?;
        for route in &gateway.routes {
            writeln!(f, "    {} -> {}", route.path, route.service)?;
        }
        write_list(f, 2, "options", &gateway.options)?;
    }
    Ok(())
}

fn write_monitoring(f: &mut fmt::Formatter<'_>, rule: &MonitoringRule) -> fmt::Result {
    match rule.kind {
        MonitoringKind::Track => {
            write!(f, "track {}", rule.metric)?;
            if let Some(service) = &rule.service {
                write!(f, " for {}", service)?;
            }
        }
        MonitoringKind::Alert => {
            write!(f, "alert")?;
            if let Some(channel) = &rule.channel {
                write!(f, " via {}", channel)?;
            }
            if let Some(condition) = &rule.condition {
                write!(f, " when {}", condition)?;
            }
            if let Some(duration) = &rule.duration {
                write!(f, " for {}", duration)?;
            }
        }
    }
    writeln!(f)
}

fn write_actions(f: &mut fmt::Formatter<'_>, depth: usize, actions: &[Action]) -> fmt::Result {
    for action in actions {
        writeln!(
            f,
            "{}[{}] {}",
            indent(depth),
            action.action_type,
            action.text
        )?;
    }
    Ok(())
}

fn write_opt(
    f: &mut fmt::Formatter<'_>,
    depth: usize,
    label: &str,
    value: &Option<String>,
) -> fmt::Result {
    match value {
        Some(value) => writeln!(f, "{}{}: {}", indent(depth), label, value),
        None => Ok(()),
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, depth: usize, label: &str, items: &[String]) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(f, "{}{}: {}", indent(depth), label, items.join(", "))
}

fn write_map(
    f: &mut fmt::Formatter<'_>,
    depth: usize,
    label: &str,
    map: &BTreeMap<String, String>,
) -> fmt::Result {
    if map.is_empty() {
        return Ok(());
    }
    writeln!(f, "{}{}:", indent(depth), label)?;
    for (key, value) in map {
        writeln!(f, "{}{}: {}", indent(depth + 1), key, value)?;
    }
    Ok(())
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn describe_source(source: &str) -> String {
        let (program, errors) = parse(source).expect("source should lex");
        assert!(errors.is_empty());
        describe(&IrBuilder::build(&program))
    }

    #[test]
    fn test_describe_minimal() {
        let text = describe_source("app TaskFlow is a web application\n");
        assert_eq!(text, "app TaskFlow (web application)\n");
    }

    #[test]
    fn test_describe_data_and_api() {
        let text = describe_source(
            "data Task:\n  has a title which is text\n  has an optional status which is either \"todo\" or \"done\"\n  has many Tag through TaskTag\napi CreateTask:\n  requires authentication\n  check that title is not empty\n  create a Task\n",
        );
        assert!(text.contains("data Task:\n  title: text\n"));
        assert!(text.contains("  status: enum [todo | done] optional\n"));
        assert!(text.contains("  has_many_through Tag through TaskTag\n"));
        assert!(text.contains("api CreateTask [auth]:\n"));
        assert!(text.contains("  validate title not_empty\n"));
        assert!(text.contains("  [create] create a Task\n"));
    }

    #[test]
    fn test_describe_is_deterministic() {
        let source = "theme:\n  primary color is blue\n  accent color is pink\n";
        let first = describe_source(source);
        assert_eq!(first, describe_source(source));
        assert!(first.contains("  colors:\n    accent: pink\n    primary: blue\n"));
    }

    #[test]
    fn test_describe_empty_application() {
        assert_eq!(describe(&Application::default()), "app <unnamed>\n");
    }
}
