//! Fuzz target for the full pipeline: lex, parse with recovery, lower
//!
//! Run with: cargo +nightly fuzz run pipeline_fuzz -- -max_total_time=60

#![no_main]

use intent_dsl::compile;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let Ok(compilation) = compile(input) else {
            return;
        };

        for err in &compilation.errors {
            assert!(err.line >= 1, "error line should be >= 1");
            assert!(err.column >= 1, "error column should be >= 1");
            assert!(!err.message.is_empty());
        }

        // Lowering output must always serialize.
        assert!(compilation.application.to_json().is_ok());
    }
});
