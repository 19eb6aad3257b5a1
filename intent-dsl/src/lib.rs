//! Intent DSL - Lexer, Parser and IR Builder for structured-English app descriptions
//!
//! A document describes an application in indented English clauses (data
//! models, pages, APIs, policies, workflows, theme, auth, infrastructure).
//! This crate turns that text into an [`Application`], the typed record that
//! code generators consume.
//!
//! Architecture:
//! ```text
//! Source text
//!     ↓
//! Lexer (off-side rule: INDENT / DEDENT)      fatal errors: LexError
//!     ↓
//! Parser (recursive descent + resync)         recorded errors: Vec<ParseError>
//!     ↓
//! Program (AST)
//!     ↓
//! IrBuilder (total, best-effort extraction)
//!     ↓
//! Application (IR) → JSON / YAML / describe()
//! ```

pub mod compiler;
pub mod config;
pub mod lexer;
pub mod parser;
pub mod pretty_printer;

// Re-export key types for convenience
pub use compiler::*;
pub use config::*;
pub use lexer::*;
pub use parser::*;
pub use pretty_printer::describe;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

// ============================================================================
// PIPELINE
// ============================================================================

/// Errors from the strict pipeline entry points.
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("lexer error: {0}")]
    Lex(#[from] LexError),

    #[error("{0}")]
    Parse(#[from] ParseErrors),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Output of one pass over a document.
///
/// Parse errors do not stop lowering: `application` is built from whatever
/// declarations parsed, and `errors` lists the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compilation {
    pub program: Program,
    pub application: Application,
    pub errors: Vec<ParseError>,
    /// Hex SHA-256 of the source text.
    pub fingerprint: String,
}

impl Compilation {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run the full pipeline with default options.
pub fn compile(source: &str) -> Result<Compilation, LexError> {
    compile_with(source, &FrontendConfig::default())
}

/// Run the full pipeline with explicit options.
pub fn compile_with(source: &str, config: &FrontendConfig) -> Result<Compilation, LexError> {
    let tokens = Lexer::with_options(source, config.lexer.clone()).tokenize()?;
    let (program, errors) = Parser::new(tokens).parse();
    let application = IrBuilder::new(config.lowering.clone()).lower(&program);
    let fingerprint = source_fingerprint(source);

    tracing::debug!(
        fingerprint = %fingerprint,
        declarations = program.declaration_count(),
        errors = errors.len(),
        "compiled document"
    );

    Ok(Compilation {
        program,
        application,
        errors,
        fingerprint,
    })
}

/// Run the full pipeline, failing on any lexer or parse error.
pub fn compile_strict(source: &str) -> Result<Application, FrontendError> {
    let compilation = compile(source)?;
    if !compilation.errors.is_empty() {
        return Err(ParseErrors(compilation.errors).into());
    }
    Ok(compilation.application)
}

/// Parse a document, failing on any lexer or parse error.
pub fn parse_strict(source: &str) -> Result<Program, FrontendError> {
    let (program, errors) = parse(source)?;
    if !errors.is_empty() {
        return Err(ParseErrors(errors).into());
    }
    Ok(program)
}

/// Load options from TOML, then compile.
pub fn compile_with_toml(source: &str, config_toml: &str) -> Result<Compilation, FrontendError> {
    let config = FrontendConfig::from_toml_str(config_toml)?;
    Ok(compile_with(source, &config)?)
}

/// Hex-encoded SHA-256 of the source text.
pub fn source_fingerprint(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hex::encode(hasher.finalize())
}
