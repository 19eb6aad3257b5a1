/// Intent Tracer - Shows the flow through Lexer → Parser → IR
///
/// Usage: cargo run --bin trace_intent <intent-file> [config.toml]
///
/// Set RUST_LOG to control log output (default: intent_dsl=debug).
use intent_dsl::{
    describe, render_tokens, FrontendConfig, IrBuilder, Lexer, Parser, Token, TokenKind,
};
use std::fs;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("intent_dsl=debug,info"));
    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
    {
        eprintln!("failed to init subscriber: {}", e);
    }

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin trace_intent <intent-file> [config.toml]");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --bin trace_intent app.intent");
        return ExitCode::FAILURE;
    }

    let path = &args[1];
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let config = match args.get(2) {
        Some(config_path) => {
            let loaded = fs::read_to_string(config_path)
                .map_err(|e| e.to_string())
                .and_then(|text| FrontendConfig::from_toml_str(&text).map_err(|e| e.to_string()));
            match loaded {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("❌ Failed to load config {}: {}", config_path, e);
                    return ExitCode::FAILURE;
                }
            }
        }
        None => FrontendConfig::default(),
    };

    println!("╔═══════════════════════════════════════════════════════════════");
    println!("║ INTENT FRONT-END TRACER");
    println!("╚═══════════════════════════════════════════════════════════════\n");

    // Step 1: tokens, one source line per output line
    println!("🔤 TOKENS:");
    println!("─────────────────────────────────────────────────────────────");
    let tokens = match Lexer::with_options(&source, config.lexer.clone()).tokenize() {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("❌ Lexer error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut depth = 0usize;
    let mut line_tokens: Vec<Token> = Vec::new();
    for token in &tokens {
        match token.kind {
            TokenKind::Indent => depth += 1,
            TokenKind::Dedent => depth = depth.saturating_sub(1),
            TokenKind::Newline | TokenKind::Eof => {
                if !line_tokens.is_empty() {
                    let kinds: Vec<String> = line_tokens
                        .iter()
                        .map(|t| format!("{:?}", t.kind))
                        .collect();
                    println!(
                        "{:>4} {}{}",
                        token.span.line,
                        "  ".repeat(depth),
                        render_tokens(&line_tokens)
                    );
                    println!("     {}{}", "  ".repeat(depth), kinds.join(" "));
                    line_tokens.clear();
                }
            }
            _ => line_tokens.push(token.clone()),
        }
    }
    println!("({} tokens)\n", tokens.len());

    // Step 2: parse
    println!("🌳 PARSER OUTPUT:");
    println!("─────────────────────────────────────────────────────────────");
    let (program, errors) = Parser::new(tokens).parse();
    println!("declarations: {}", program.declaration_count());
    println!("top-level statements: {}", program.statements.len());
    if errors.is_empty() {
        println!("✅ no parse errors");
    } else {
        for error in &errors {
            println!("⚠️  {}", error);
        }
    }
    println!();

    // Step 3: lower
    println!("🧩 INTENT IR:");
    println!("─────────────────────────────────────────────────────────────");
    let application = IrBuilder::new(config.lowering.clone()).lower(&program);
    print!("{}", describe(&application));
    println!();

    println!("📦 JSON:");
    println!("─────────────────────────────────────────────────────────────");
    match application.to_json_pretty() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("❌ Failed to serialize IR: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
