//! Front-end configuration
//!
//! Options are plain serde structs with defaults, so an empty TOML document
//! is a valid configuration:
//!
//! ```toml
//! [lexer]
//! tab_width = 4
//! keep_comments = false
//!
//! [lowering]
//! strip_articles = true
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

// ============================================================================
// CONFIG STRUCTS
// ============================================================================

/// Options for the lexer.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LexerOptions {
    /// Columns a tab counts for in leading whitespace.
    pub tab_width: usize,
    /// Emit `Comment` tokens for comment lines instead of dropping them.
    pub keep_comments: bool,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            tab_width: 4,
            keep_comments: false,
        }
    }
}

/// Options for IR lowering.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoweringOptions {
    /// Drop a leading `a`/`an`/`the` from extracted subjects and values.
    pub strip_articles: bool,
}

impl Default for LoweringOptions {
    fn default() -> Self {
        Self {
            strip_articles: true,
        }
    }
}

/// Complete front-end configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FrontendConfig {
    pub lexer: LexerOptions,
    pub lowering: LoweringOptions,
}

impl FrontendConfig {
    /// Parse and validate a TOML configuration document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: FrontendConfig =
            toml::from_str(source).map_err(|e| ConfigError::Toml(e.to_string()))?;
        config.validate()?;
        tracing::debug!(
            tab_width = config.lexer.tab_width,
            keep_comments = config.lexer.keep_comments,
            strip_articles = config.lowering.strip_articles,
            "loaded front-end config"
        );
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Toml(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=16).contains(&self.lexer.tab_width) {
            return Err(ConfigError::InvalidValue {
                field: "lexer.tab_width".to_string(),
                reason: format!("must be between 1 and 16, got {}", self.lexer.tab_width),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() -> Result<(), ConfigError> {
        let config = FrontendConfig::from_toml_str("")?;
        assert_eq!(config, FrontendConfig::default());
        assert_eq!(config.lexer.tab_width, 4);
        assert!(config.lowering.strip_articles);
        Ok(())
    }

    #[test]
    fn test_partial_document() -> Result<(), ConfigError> {
        let config = FrontendConfig::from_toml_str("[lexer]\ntab_width = 2\n")?;
        assert_eq!(config.lexer.tab_width, 2);
        assert!(!config.lexer.keep_comments);
        Ok(())
    }

    #[test]
    fn test_invalid_tab_width() {
        let err = FrontendConfig::from_toml_str("[lexer]\ntab_width = 0\n");
        assert!(matches!(err, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = FrontendConfig::from_toml_str("[lexer]\nspaces = 2\n");
        assert!(matches!(err, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_toml_round_trip() -> Result<(), ConfigError> {
        let config = FrontendConfig {
            lexer: LexerOptions {
                tab_width: 8,
                keep_comments: true,
            },
            lowering: LoweringOptions {
                strip_articles: false,
            },
        };
        let text = config.to_toml_string()?;
        assert_eq!(FrontendConfig::from_toml_str(&text)?, config);
        Ok(())
    }
}
