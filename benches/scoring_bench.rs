//! Benchmark suite for tutor-analytics
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tutor_analytics::config::ScoringConfig;
use tutor_analytics::graph::seed::{keyword_table, physics_graph};
use tutor_analytics::mastery::compute_score;
use tutor_analytics::resolver::ConceptResolver;
use tutor_analytics::types::Attempt;

fn full_history(config: &ScoringConfig) -> Vec<Attempt> {
    (0..config.history_cap)
        .map(|i| Attempt {
            attempt_id: format!("a-{i}"),
            problem_id: format!("p-{i}"),
            timestamp: i as i64 * 60_000,
            hint_level: (i % 6) as i32,
            time_spent: 30_000 + i as i64 * 10_000,
            success: i % 3 != 0,
        })
        .collect()
}

fn bench_compute_score(c: &mut Criterion) {
    let config = ScoringConfig::default();
    let history = full_history(&config);
    c.bench_function("compute_score/full_history", |b| {
        b.iter(|| compute_score(black_box(&history), &config))
    });
}

fn bench_resolve(c: &mut Criterion) {
    let graph = physics_graph().unwrap();
    let resolver = ConceptResolver::new(&graph, keyword_table());

    c.bench_function("resolve/exact", |b| {
        b.iter(|| resolver.resolve(black_box("Newton's Laws")))
    });
    c.bench_function("resolve/keyword", |b| {
        b.iter(|| resolver.resolve(black_box("impulse during a collision between carts")))
    });
    c.bench_function("resolve/unresolved", |b| {
        b.iter(|| resolver.resolve(black_box("completely unrelated free text")))
    });
}

criterion_group!(benches, bench_compute_score, bench_resolve);
criterion_main!(benches);
