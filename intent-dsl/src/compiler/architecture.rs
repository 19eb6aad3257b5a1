//! Architecture lowering
//!
//! The parser hands the architecture body over as one flat list of lines,
//! so `service X:` and `gateway:` act as headers only by position: every
//! following clause attaches to the most recently opened service or gateway.
//! Lowering is a left fold carrying that position as a [`Cursor`].

use super::extract::*;
use super::ir::*;
use super::IrBuilder;
use crate::parser::ast::ArchitectureDeclaration;

/// Where subordinate clauses currently attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cursor {
    None,
    InService(usize),
    InGateway,
}

const BROKER_PREFIXES: [&str; 6] = [
    "message broker is ",
    "broker is ",
    "services communicate via ",
    "services communicate through ",
    "communicate via ",
    "use message broker ",
];

impl IrBuilder {
    pub(crate) fn lower_architecture(&self, decl: &ArchitectureDeclaration) -> Architecture {
        let initial = Architecture {
            style: decl
                .style
                .as_deref()
                .map(|s| self.article(strip_colon(s)).to_string())
                .filter(|s| !s.is_empty()),
            ..Default::default()
        };

        let (architecture, cursor) = decl
            .statements
            .iter()
            .fold((initial, Cursor::None), |(arch, cursor), statement| {
                self.architecture_step(arch, cursor, &statement.text)
            });

        tracing::trace!(
            services = architecture.services.len(),
            gateway = architecture.gateway.is_some(),
            final_cursor = ?cursor,
            "lowered architecture"
        );
        architecture
    }

    /// Apply one clause and return the cursor for the next one.
    pub(crate) fn architecture_step(
        &self,
        mut arch: Architecture,
        cursor: Cursor,
        text: &str,
    ) -> (Architecture, Cursor) {
        let clause = strip_colon(text);
        if clause.is_empty() {
            return (arch, cursor);
        }

        if let Some(rest) = strip_prefix_ci(clause, "service ") {
            let name = rest.split_whitespace().next().unwrap_or_default();
            arch.services.push(ServiceDef {
                name: name.to_string(),
                ..Default::default()
            });
            let idx = arch.services.len() - 1;
            return (arch, Cursor::InService(idx));
        }

        if is_gateway_header(clause) {
            arch.gateway.get_or_insert_with(Gateway::default);
            return (arch, Cursor::InGateway);
        }

        if let Some(broker) = BROKER_PREFIXES
            .iter()
            .find_map(|prefix| strip_prefix_ci(clause, prefix))
        {
            arch.broker = Some(self.article(broker).to_string());
            return (arch, cursor);
        }

        if let Some(style) = strip_prefix_ci(clause, "style is ") {
            arch.style = Some(self.article(style).to_string());
            return (arch, cursor);
        }

        match cursor {
            Cursor::InService(idx) => {
                if let Some(service) = arch.services.get_mut(idx) {
                    apply_service_clause(service, clause);
                }
            }
            Cursor::InGateway => {
                let gateway = arch.gateway.get_or_insert_with(Gateway::default);
                apply_gateway_clause(gateway, clause);
            }
            Cursor::None => arch.notes.push(clause.to_string()),
        }
        (arch, cursor)
    }
}

fn is_gateway_header(clause: &str) -> bool {
    let lower = clause.to_ascii_lowercase();
    matches!(lower.as_str(), "gateway" | "api gateway" | "the gateway")
}

fn apply_service_clause(service: &mut ServiceDef, clause: &str) {
    if let Some(rest) = strip_prefix_ci(clause, "handles ") {
        service.handles.extend(split_list(rest));
    } else if let Some(rest) = strip_prefix_ci(clause, "owns ") {
        service.owns.extend(split_list(rest));
    } else if let Some(rest) = strip_prefix_ci(clause, "talks to ") {
        service.talks_to.extend(split_list(rest));
    } else if let Some(port) = strip_prefix_ci(clause, "runs on port ")
        .and_then(first_word)
        .and_then(|w| w.parse::<u16>().ok())
    {
        service.port = Some(port);
    } else if contains_ci(clause, "own database") {
        service.own_database = true;
    } else {
        service.notes.push(clause.to_string());
    }
}

fn apply_gateway_clause(gateway: &mut Gateway, clause: &str) {
    let route = strip_prefix_ci(clause, "routes ")
        .or_else(|| strip_prefix_ci(clause, "route "))
        .and_then(|rest| split_once_ci(rest, " to "));

    match route {
        Some((path, service)) => gateway.routes.push(Route {
            path: path.to_string(),
            service: service.to_string(),
        }),
        None => gateway.options.push(clause.to_string()),
    }
}
