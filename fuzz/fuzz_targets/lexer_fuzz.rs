//! Fuzz target for the intent lexer
//!
//! Run with: cargo +nightly fuzz run lexer_fuzz -- -max_total_time=60

#![no_main]

use intent_dsl::{Lexer, TokenKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Errors are fine; panics are not.
        let Ok(tokens) = Lexer::new(input).tokenize() else {
            return;
        };

        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));

        let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
        assert_eq!(indents, dedents, "unbalanced indentation tokens");

        for token in &tokens {
            assert!(token.span.line >= 1);
            assert!(token.span.column >= 1);
        }
    }
});
