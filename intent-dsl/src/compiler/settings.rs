//! Lowering for configuration-style blocks
//!
//! `theme`, `authentication`, `database`, `integrate`, `environment` and
//! `build with` bodies, plus top-level monitoring clauses. Each clause is
//! matched against a short ordered list of phrasings; anything unmatched is
//! kept as raw text in the block's `rules` or `options`.

use super::extract::*;
use super::ir::*;
use super::IrBuilder;
use crate::parser::ast::*;
use std::collections::BTreeMap;

const OAUTH_PROVIDERS: [&str; 6] = ["google", "github", "apple", "microsoft", "facebook", "twitter"];

const ENV_MARKERS: [&str; 3] = [
    " from environment variable ",
    " from env var ",
    " from env ",
];

const DISABLED_WORDS: [&str; 6] = ["disabled", "off", "false", "no", "unsupported", "none"];

impl IrBuilder {
    // ========================================================================
    // Theme
    // ========================================================================

    pub(crate) fn lower_theme(&self, decl: &ThemeDeclaration) -> Theme {
        let mut theme = Theme::default();

        for statement in &decl.statements {
            let text = strip_colon(&statement.text);
            if text.is_empty() {
                continue;
            }

            if strip_prefix_ci(text, "supports dark mode").is_some()
                || text.eq_ignore_ascii_case("dark mode")
            {
                theme.dark_mode = Some(true);
                continue;
            }

            let Some((key, value)) =
                split_once_ci(text, " is ").or_else(|| split_once_ci(text, " are "))
            else {
                theme.options.insert(text.to_lowercase(), "true".to_string());
                continue;
            };

            let key = self.article(key).to_lowercase();
            let value = unquote(value).to_string();

            match key.as_str() {
                "font" | "font family" => {
                    theme.fonts.insert("body".to_string(), value);
                }
                "design system" | "style" => theme.design_system = Some(value),
                "border radius" | "corners" | "corner radius" => theme.border_radius = Some(value),
                "spacing" => theme.spacing = Some(value),
                "dark mode" => theme.dark_mode = Some(!is_disabled(&value)),
                "color" | "colour" => {
                    theme.colors.insert("primary".to_string(), value);
                }
                _ => {
                    if let Some(name) = key
                        .strip_suffix(" color")
                        .or_else(|| key.strip_suffix(" colour"))
                    {
                        theme.colors.insert(name.to_string(), value);
                    } else if let Some(role) = key.strip_suffix(" font") {
                        theme.fonts.insert(role.to_string(), value);
                    } else {
                        theme.options.insert(key, value);
                    }
                }
            }
        }

        theme
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    pub(crate) fn lower_auth(&self, decl: &AuthenticationDeclaration) -> Auth {
        const METHOD_PREFIXES: [&str; 7] = [
            "allow login with ",
            "allow sign in with ",
            "login with ",
            "log in with ",
            "sign in with ",
            "methods ",
            "method ",
        ];

        let mut auth = Auth::default();
        for statement in &decl.statements {
            let text = strip_colon(&statement.text);
            let words = METHOD_PREFIXES
                .iter()
                .find_map(|prefix| strip_prefix_ci(text, prefix));

            match words {
                Some(words) => {
                    let words = strip_prefix_ci(words, "is ")
                        .or_else(|| strip_prefix_ci(words, "are "))
                        .unwrap_or(words);
                    auth.methods.extend(auth_methods(words));
                }
                None => auth.rules.push(text.to_string()),
            }
        }
        auth
    }

    // ========================================================================
    // Database
    // ========================================================================

    pub(crate) fn lower_database(&self, decl: &DatabaseDeclaration) -> DatabaseConfig {
        let mut db = DatabaseConfig::default();

        for statement in &decl.statements {
            let text = strip_colon(&statement.text);

            if let Some(engine) = strip_prefix_ci(text, "use ") {
                db.engine = Some(unquote(self.article(engine)).to_string());
                continue;
            }

            if let Some(rest) = strip_prefix_ci(text, "index ") {
                let split = split_once_ci(rest, " by ").or_else(|| split_once_ci(rest, " on "));
                if let Some((entity, fields)) = split {
                    db.indexes.push(Index {
                        entity: self.article(entity).to_string(),
                        fields: split_list(fields),
                    });
                    continue;
                }
            }

            if let Some((key, value)) = split_once_ci(text, " is ") {
                let key = self.article(key).to_lowercase();
                if matches!(key.as_str(), "engine" | "database" | "type") {
                    db.engine = Some(unquote(value).to_string());
                    continue;
                }
            }

            db.rules.push(text.to_string());
        }

        db
    }

    // ========================================================================
    // Integrations and environments
    // ========================================================================

    pub(crate) fn lower_integration(&self, decl: &IntegrationDeclaration) -> Integration {
        const PURPOSE_PREFIXES: [&str; 4] = ["use for ", "use it for ", "used for ", "for "];

        let mut integration = Integration {
            service: strip_colon(&decl.service).to_string(),
            credentials: BTreeMap::new(),
            config: BTreeMap::new(),
            purpose: None,
        };

        for statement in &decl.statements {
            let text = strip_colon(&statement.text);

            if let Some((name, var)) = env_reference(text) {
                let name = slug(self.article(name));
                integration.credentials.insert(name, var.to_string());
                continue;
            }

            if let Some(purpose) = PURPOSE_PREFIXES
                .iter()
                .find_map(|prefix| strip_prefix_ci(text, prefix))
            {
                integration.purpose = Some(purpose.trim().to_string());
                continue;
            }

            match split_once_ci(text, " is ") {
                Some((key, value)) => {
                    let key = self.article(key).to_lowercase();
                    integration.config.insert(key, unquote(value).to_string());
                }
                None => {
                    integration.config.insert(text.to_lowercase(), "true".to_string());
                }
            }
        }

        integration
    }

    pub(crate) fn lower_environment(&self, decl: &EnvironmentDeclaration) -> Environment {
        let mut env = Environment {
            name: strip_colon(&decl.name).to_string(),
            config: BTreeMap::new(),
            rules: Vec::new(),
        };

        for statement in &decl.statements {
            let text = strip_colon(&statement.text);
            match split_once_ci(text, " is ") {
                Some((key, value)) if !key.is_empty() => {
                    let key = self.article(key).to_lowercase();
                    env.config.insert(key, unquote(value).to_string());
                }
                _ => env.rules.push(text.to_string()),
            }
        }

        env
    }

    // ========================================================================
    // Build targets and app header
    // ========================================================================

    pub(crate) fn lower_build(&self, decl: &BuildDeclaration) -> BuildConfig {
        const DEPLOY_PREFIXES: [&str; 5] = [
            "deploy to ",
            "deploy using ",
            "deploy on ",
            "deploy with ",
            "deploy ",
        ];
        const CONNECTORS: [&str; 4] = [" using ", " with ", " is ", ": "];

        let mut config = BuildConfig::default();

        'statements: for statement in &decl.statements {
            let text = strip_colon(&statement.text);

            if let Some(target) = DEPLOY_PREFIXES
                .iter()
                .find_map(|prefix| strip_prefix_ci(text, prefix))
            {
                config.deploy = Some(unquote(self.article(target)).to_string());
                continue;
            }

            for (key, slot) in [
                ("frontend", &mut config.frontend),
                ("backend", &mut config.backend),
                ("database", &mut config.database),
            ] {
                for connector in CONNECTORS {
                    let prefix = format!("{}{}", key, connector.trim_end());
                    if let Some(value) = strip_prefix_ci(text, &prefix) {
                        if value.starts_with(' ') {
                            *slot = Some(unquote(value.trim()).to_string());
                            continue 'statements;
                        }
                    }
                }
            }

            let pair = split_once_ci(text, " using ").or_else(|| split_once_ci(text, " is "));
            match pair {
                Some((key, value)) => {
                    config
                        .options
                        .insert(key.to_lowercase(), unquote(value).to_string());
                }
                None => {
                    config.options.insert(text.to_lowercase(), "true".to_string());
                }
            }
        }

        config
    }

    pub(crate) fn lower_platform(&self, decl: &AppDeclaration) -> Option<String> {
        decl.platform
            .as_deref()
            .map(|p| self.article(strip_colon(p)).to_string())
            .filter(|p| !p.is_empty())
    }

    // ========================================================================
    // Monitoring
    // ========================================================================

    /// Lower a top-level `track` or `alert` clause. Other clauses are not
    /// monitoring rules.
    pub(crate) fn lower_monitoring(&self, statement: &Statement) -> Option<MonitoringRule> {
        let text = strip_colon(&statement.text);
        match statement.kind.as_str() {
            "track" => {
                let rest = strip_prefix_ci(text, "track")?.trim();
                let (metric, service) = match split_once_ci(rest, " for ") {
                    Some((metric, service)) => (metric, Some(service.to_string())),
                    None => (rest, None),
                };
                Some(MonitoringRule {
                    kind: MonitoringKind::Track,
                    metric: self.article(metric).to_string(),
                    condition: None,
                    channel: None,
                    service,
                    duration: None,
                })
            }
            "alert" => {
                let rest = strip_prefix_ci(text, "alert")?.trim();
                Some(self.lower_alert(rest))
            }
            _ => None,
        }
    }

    /// `[on|via|to] <channel> when|if <condition> [for <duration>]`
    fn lower_alert(&self, rest: &str) -> MonitoringRule {
        let rest = ["on ", "via ", "to "]
            .iter()
            .find_map(|prefix| strip_prefix_ci(rest, prefix))
            .unwrap_or(rest)
            .trim();

        let (channel, condition) = if let Some(cond) =
            strip_prefix_ci(rest, "when ").or_else(|| strip_prefix_ci(rest, "if "))
        {
            (None, Some(cond.trim()))
        } else {
            let when = find_ci(rest, " when ").map(|i| (i, " when ".len()));
            let when_if = find_ci(rest, " if ").map(|i| (i, " if ".len()));
            let first = match (when, when_if) {
                (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
                (a, b) => a.or(b),
            };
            match first {
                Some((idx, len)) => (Some(rest[..idx].trim()), Some(rest[idx + len..].trim())),
                None => (Some(rest), None),
            }
        };

        let (condition, duration) = match condition {
            Some(cond) => match find_last_ci(cond, " for ") {
                Some(idx) => (
                    Some(cond[..idx].trim()),
                    Some(cond[idx + " for ".len()..].trim().to_string()),
                ),
                None => (Some(cond), None),
            },
            None => (None, None),
        };

        let metric = condition.map(metric_of).unwrap_or_default();

        MonitoringRule {
            kind: MonitoringKind::Alert,
            metric,
            condition: condition.map(str::to_string),
            channel: channel
                .map(|c| self.article(c).to_string())
                .filter(|c| !c.is_empty()),
            service: None,
            duration,
        }
    }
}

/// Metric named by an alert condition: the text before its comparison.
fn metric_of(condition: &str) -> String {
    const COMPARATORS: [&str; 6] = [
        " is above ",
        " is below ",
        " exceeds ",
        " is over ",
        " drops below ",
        " is under ",
    ];
    COMPARATORS
        .iter()
        .filter_map(|cmp| find_ci(condition, cmp))
        .min()
        .map(|idx| condition[..idx].trim())
        .unwrap_or(condition)
        .to_string()
}

fn find_last_ci(text: &str, needle: &str) -> Option<usize> {
    text.to_ascii_lowercase().rfind(&needle.to_ascii_lowercase())
}

fn is_disabled(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    DISABLED_WORDS.contains(&value.as_str())
}

/// `<name> from environment variable <VAR>` → `(name, VAR)`.
fn env_reference(text: &str) -> Option<(&str, &str)> {
    ENV_MARKERS.iter().find_map(|marker| {
        let idx = find_ci(text, marker)?;
        let var = text[idx + marker.len()..].split_whitespace().next()?;
        Some((text[..idx].trim(), var))
    })
}

/// Methods named by one authentication clause, e.g.
/// `email and password or google with client id from environment variable GOOGLE_ID`.
fn auth_methods(words: &str) -> Vec<AuthMethod> {
    let mut config = BTreeMap::new();
    let mut words = words.trim();

    if let Some((before, var)) = env_reference(words) {
        let (method_words, key) = match find_last_ci(before, " with ") {
            Some(idx) => (&before[..idx], &before[idx + " with ".len()..]),
            None => (before, "credential"),
        };
        config.insert(slug(key), var.to_string());
        words = method_words.trim();
    }

    let mut methods = Vec::new();
    for alternative in split_alternatives(words) {
        let pieces = if has_word(alternative, "email") && has_word(alternative, "password") {
            vec![alternative.to_string()]
        } else {
            split_list(alternative)
        };

        for piece in pieces {
            let method = match classify_auth(&piece) {
                Extracted::Recognized((method_type, provider)) => AuthMethod {
                    method_type: method_type.to_string(),
                    provider,
                    config: config.clone(),
                },
                Extracted::Raw(raw) => AuthMethod {
                    method_type: slug(&raw),
                    provider: None,
                    config: config.clone(),
                },
            };
            if !method.method_type.is_empty() {
                methods.push(method);
            }
        }
    }
    methods
}

/// Split on `,` and ` or `.
fn split_alternatives(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    for piece in text.split(',') {
        let mut rest = piece.trim();
        for prefix in ["or ", "and "] {
            if let Some(tail) = strip_prefix_ci(rest, prefix) {
                rest = tail.trim();
            }
        }
        while let Some((head, tail)) = split_once_ci(rest, " or ") {
            if !head.is_empty() {
                parts.push(head);
            }
            rest = tail;
        }
        if !rest.is_empty() {
            parts.push(rest);
        }
    }
    parts
}

fn has_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|w| w.eq_ignore_ascii_case(word))
}

fn classify_auth(piece: &str) -> Extracted<(&'static str, Option<String>)> {
    let lower = piece.to_ascii_lowercase();

    let kind = if lower.contains("magic link") {
        Some(("magic_link", None))
    } else if has_word(&lower, "email") && has_word(&lower, "password") {
        Some(("email_password", None))
    } else if lower.contains("two factor") || lower.contains("two-factor") || has_word(&lower, "2fa")
    {
        Some(("two_factor", None))
    } else if has_word(&lower, "sso") || has_word(&lower, "saml") {
        Some(("sso", None))
    } else if lower.contains("api key") {
        Some(("api_key", None))
    } else if let Some(provider) = OAUTH_PROVIDERS.iter().find(|p| has_word(&lower, p)) {
        Some(("oauth", Some(provider.to_string())))
    } else if has_word(&lower, "oauth") {
        Some(("oauth", None))
    } else {
        None
    };

    match kind {
        Some(kind) => Extracted::Recognized(kind),
        None => Extracted::Raw(piece.to_string()),
    }
}
