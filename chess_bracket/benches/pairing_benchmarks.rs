use chess_bracket::availability::{DaySet, Period, Weekday};
use chess_bracket::bracket::{Bracket, Phase, create_pairs};
use chess_bracket::competitor::Competitor;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// Helper to build a pool with a spread of schedules
fn pool(n: usize) -> Vec<Competitor> {
    let periods = [Period::Morning, Period::Afternoon, Period::FullDay];

    (0..n)
        .map(|i| Competitor {
            id: i as i64 + 1,
            name: format!("competitor{}", i),
            course: "LOG T1".to_string(),
            phone: String::new(),
            period: periods[i % periods.len()],
            days: DaySet::new([Weekday::ALL[i % 5], Weekday::ALL[(i + 2) % 5]]),
        })
        .collect()
}

/// Benchmark pairing across pool sizes
fn bench_create_pairs(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_pairs");

    for n in [2usize, 7, 12, 16] {
        let competitors = pool(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &competitors, |b, competitors| {
            b.iter(|| create_pairs(black_box(competitors), Some(42)))
        });
    }

    group.finish();
}

/// Benchmark seeding a bracket and resolving its byes
fn bench_seed_and_resolve(c: &mut Criterion) {
    let competitors = pool(13);
    let pairs = create_pairs(&competitors, Some(42));

    c.bench_function("seed_and_resolve_13", |b| {
        b.iter(|| {
            let mut bracket = Bracket::seed(1, Phase::RoundOf16, black_box(&pairs));
            bracket.resolve_byes()
        })
    });
}

criterion_group!(benches, bench_create_pairs, bench_seed_and_resolve);
criterion_main!(benches);
