use criterion::{black_box, criterion_group, criterion_main, Criterion};
use intent_dsl::{compile, parse, tokenize, IrBuilder};
use intent_test_utils::fixtures;

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("lexer/tokenize_taskflow", |b| {
        b.iter(|| {
            let tokens = tokenize(black_box(fixtures::TASKFLOW)).expect("tokenize fixture");
            black_box(tokens.len());
        });
    });
}

fn bench_parse_lower(c: &mut Criterion) {
    c.bench_function("parser/parse_taskflow", |b| {
        b.iter(|| {
            let (program, errors) = parse(black_box(fixtures::TASKFLOW)).expect("parse fixture");
            black_box((program.declaration_count(), errors.len()));
        });
    });

    let (program, _) = parse(fixtures::TASKFLOW).expect("parse fixture");
    c.bench_function("ir/lower_taskflow", |b| {
        b.iter(|| {
            let app = IrBuilder::build(black_box(&program));
            black_box(app.data.len());
        });
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let source = fixtures::generated_document(40);
    c.bench_function("pipeline/compile_generated_40", |b| {
        b.iter(|| {
            let compilation = compile(black_box(&source)).expect("compile generated document");
            black_box(compilation.application.data.len());
        });
    });
}

criterion_group!(benches, bench_tokenize, bench_parse_lower, bench_full_pipeline);
criterion_main!(benches);
