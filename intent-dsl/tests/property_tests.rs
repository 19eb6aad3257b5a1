//! Property-Based Tests for the front end
//!
//! Properties:
//! - Every successful tokenization balances INDENT/DEDENT and ends in EOF
//! - Well-formed documents parse with no errors
//! - Breaking one block header costs exactly that block
//! - Compilation is deterministic and the IR survives JSON/YAML

use intent_dsl::*;
use intent_test_utils::generators::*;
use proptest::prelude::*;

// ============================================================================
// HELPERS
// ============================================================================

fn assert_well_formed_stream(tokens: &[Token]) -> Result<(), TestCaseError> {
    let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
    let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
    prop_assert_eq!(indents, dedents);
    prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    prop_assert_eq!(
        tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(),
        1
    );
    for token in tokens {
        prop_assert!(token.span.line >= 1 && token.span.column >= 1);
    }
    Ok(())
}

/// First line (1-based) of each block once joined with blank separators.
fn block_start_lines(blocks: &[String]) -> Vec<usize> {
    let mut starts = Vec::with_capacity(blocks.len());
    let mut line = 1;
    for block in blocks {
        starts.push(line);
        line += block.lines().count() + 1;
    }
    starts
}

fn join_blocks(blocks: &[String]) -> String {
    blocks.join("\n")
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_consistent_indentation_balances(source in arb_indented_source()) {
        let tokens = tokenize(&source);
        prop_assert!(tokens.is_ok(), "lexer rejected {:?}: {:?}", source, tokens);
        if let Ok(tokens) = tokens {
            assert_well_formed_stream(&tokens)?;
        }
    }

    #[test]
    fn prop_arbitrary_text_never_unbalances(
        source in "[ a-zA-Z0-9:#,'\n\t\"\u{a0}\u{2003}\u{3000}\u{2019}\u{2500}\u{e9}]{0,200}"
    ) {
        // Arbitrary text may be rejected, but never with a malformed stream.
        if let Ok(tokens) = tokenize(&source) {
            assert_well_formed_stream(&tokens)?;
            prop_assert!(tokens.iter().all(|t| !t.kind.is_word() || !t.literal.is_empty()));
        }
    }

    #[test]
    fn prop_printable_lines_always_lex(lines in prop::collection::vec("\\PC{0,60}", 0..8)) {
        // No control characters, no quotes, no indentation: nothing can fail.
        let source: String = lines
            .iter()
            .map(|l| format!("{}\n", l.replace('"', "").trim_start_matches([' ', '\t'])))
            .collect();
        let tokens = tokenize(&source);
        prop_assert!(tokens.is_ok(), "lexer rejected {:?}: {:?}", source, tokens);
        if let Ok(tokens) = tokens {
            assert_well_formed_stream(&tokens)?;
            prop_assert!(tokens.iter().all(|t| !t.kind.is_word() || !t.literal.is_empty()));
        }
    }

    #[test]
    fn prop_well_formed_blocks_parse_cleanly(blocks in arb_blocks()) {
        let source = join_blocks(&blocks);
        let (program, errors) = parse(&source).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(errors.is_empty(), "errors {:?} in:\n{}", errors, source);
        prop_assert_eq!(program.declaration_count(), blocks.len());
    }

    #[test]
    fn prop_one_broken_header_costs_one_block(
        blocks in arb_blocks(),
        pick in any::<prop::sample::Index>(),
    ) {
        let broken_at = pick.index(blocks.len());
        let starts = block_start_lines(&blocks);
        let mut damaged = blocks.clone();
        damaged[broken_at] = break_header(&blocks[broken_at]);

        let source = join_blocks(&damaged);
        let (program, errors) = parse(&source).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(errors.len(), 1, "errors {:?} in:\n{}", errors, source);
        prop_assert_eq!(errors[0].line, starts[broken_at]);
        prop_assert_eq!(program.declaration_count(), blocks.len() - 1);
    }

    #[test]
    fn prop_compilation_is_deterministic(blocks in arb_blocks()) {
        let source = join_blocks(&blocks);
        let first = compile(&source).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let second = compile(&source).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(describe(&first.application), describe(&second.application));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_ir_survives_serialization(blocks in arb_blocks()) {
        let source = join_blocks(&blocks);
        let app = compile(&source)
            .map_err(|e| TestCaseError::fail(e.to_string()))?
            .application;

        let json = app.to_json().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let from_json = Application::from_json(&json).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(&from_json, &app);

        let yaml = app.to_yaml().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let from_yaml = Application::from_yaml(&yaml).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(&from_yaml, &app);
    }

    #[test]
    fn prop_field_clauses_keep_their_type(clause in arb_field_clause()) {
        let source = format!("data Sample:\n  {}\n", clause);
        let app = compile_strict(&source).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let field = &app.data[0].fields[0];
        prop_assert!(clause.ends_with(&field.field_type));
        prop_assert_eq!(field.required, !clause.contains("optional"));
    }

    #[test]
    fn prop_tab_width_round_trips(tab_width in 1usize..=16, keep_comments in any::<bool>()) {
        let config = FrontendConfig {
            lexer: LexerOptions { tab_width, keep_comments },
            ..Default::default()
        };
        let text = config.to_toml_string().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let back = FrontendConfig::from_toml_str(&text).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(back, config);
    }
}

// ============================================================================
// REGRESSION TESTS
// ============================================================================

#[test]
fn test_break_first_and_last_block() {
    let blocks = vec![
        "page Home:\n  show tasks\n".to_string(),
        "api List:\n  fetch all tasks\n".to_string(),
        "policy Admin:\n  can view items\n".to_string(),
    ];

    for broken_at in [0, blocks.len() - 1] {
        let mut damaged = blocks.clone();
        damaged[broken_at] = break_header(&blocks[broken_at]);
        let (program, errors) = parse(&join_blocks(&damaged)).expect("source should lex");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, block_start_lines(&blocks)[broken_at]);
        assert_eq!(program.declaration_count(), 2);
    }
}

#[test]
fn test_tabs_count_as_configured_width() {
    let source = "page Home:\n    show tasks\n\tlist items\n";
    let tokens = tokenize(source).expect("four spaces and a tab share a level");
    let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
    assert_eq!(indents, 1);

    let narrow = Lexer::with_options(
        source,
        LexerOptions {
            tab_width: 2,
            keep_comments: false,
        },
    )
    .tokenize();
    assert!(matches!(narrow, Err(LexError::InconsistentDedent { line: 3 })));
}
