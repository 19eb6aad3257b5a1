//! Parser module for the intent language

pub mod ast;
pub mod parser;

pub use ast::*;
pub use parser::*;
