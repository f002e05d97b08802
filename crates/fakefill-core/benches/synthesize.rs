//! Benchmarks for value synthesis and row generation.
//!
//! Synthesis dominates a fill run once the database is fast, so the per-value
//! cost of each category and declared type is worth tracking.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hint::black_box;

use fakefill_core::classify::rules::detect_category;
use fakefill_core::generate::engine::RowGenerator;
use fakefill_core::generate::providers::{Locale, Synthesizer};
use fakefill_core::schema::types::{FieldSpec, FieldType, TableIdent, TableLayout};

fn bench_detect_category(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesize/detect_category");

    // "name" is the first entry, "preço" the last, "zzz_unknown" misses
    for (label, column) in [("first", "name"), ("last", "preço"), ("miss", "zzz_unknown")] {
        group.bench_with_input(BenchmarkId::new("column", label), column, |b, column| {
            b.iter(|| detect_category(black_box(column)));
        });
    }
    group.finish();
}

fn bench_single_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesize/value");
    let synthesizer = Synthesizer::new(Locale::PtBr);

    let cases = [
        ("name", FieldType::Varchar),
        ("email", FieldType::Varchar),
        ("address", FieldType::Text),
        ("age", FieldType::Int),
        ("notes", FieldType::Text),
        ("code", FieldType::Varchar),
        ("seen_at", FieldType::Datetime),
    ];
    for (column, field_type) in &cases {
        let mut rng = StdRng::seed_from_u64(42);
        group.bench_with_input(BenchmarkId::new("column", column), column, |b, column| {
            b.iter(|| synthesizer.synthesize(column, field_type, &mut rng));
        });
    }
    group.finish();
}

fn bench_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesize/rows");
    let layout = TableLayout::new(
        TableIdent::new("public", "people"),
        vec![
            FieldSpec::new("name", FieldType::Varchar, false),
            FieldSpec::new("email", FieldType::Varchar, false),
            FieldSpec::new("age", FieldType::Int, true),
            FieldSpec::new("cidade", FieldType::Varchar, true),
            FieldSpec::new("notes", FieldType::Text, true),
        ],
        true,
    );
    let rows = RowGenerator::new(layout, Synthesizer::new(Locale::EnUs));

    for count in [100usize, 1_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("people", count), &count, |b, &count| {
            b.iter(|| {
                let mut rng = StdRng::seed_from_u64(42);
                for _ in 0..count {
                    black_box(rows.next_row(&mut rng, 0.1).ok());
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_detect_category, bench_single_value, bench_rows);
criterion_main!(benches);
