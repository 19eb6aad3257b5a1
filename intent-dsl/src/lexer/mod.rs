//! Lexer module for the intent language

pub mod scanner;
pub mod token;

pub use scanner::*;
pub use token::*;
