use chrono::{NaiveDate, TimeDelta};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use loopwatch_core::{AnalysisConfig, SearchLimits, TransitionRecord};
use loopwatch_engine::{TransitionGraph, analyze, enumerate};

/// Complete digraphs: every station hands off to every other one.
const DENSE_SIZES: [usize; 3] = [5, 6, 7];

/// Rings of this many stations plus a chord every tenth station.
const SPARSE_SIZES: [usize; 3] = [100, 1_000, 10_000];

fn record(idx: usize, from: usize, to: usize) -> TransitionRecord {
    let t0 = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let offset = TimeDelta::seconds(i64::try_from(idx % 3_600).unwrap_or(0));
    TransitionRecord::new(
        format!("lot-{}", idx % 17),
        format!("ST{from:05}"),
        format!("ST{to:05}"),
        t0 + offset,
        t0 + offset + TimeDelta::seconds(30),
    )
}

fn dense(n: usize) -> Vec<TransitionRecord> {
    let mut out = Vec::with_capacity(n * n);
    for from in 0..n {
        for to in 0..n {
            if from != to {
                out.push(record(out.len(), from, to));
            }
        }
    }
    out
}

fn sparse(n: usize) -> Vec<TransitionRecord> {
    let mut out = Vec::with_capacity(n + n / 10);
    for from in 0..n {
        out.push(record(out.len(), from, (from + 1) % n));
        if from % 10 == 0 {
            out.push(record(out.len(), (from + 5) % n, from));
        }
    }
    out
}

fn bench_dense_enumeration(c: &mut Criterion) {
    let mut group = c.benchmark_group("enumerate.dense");

    for n in DENSE_SIZES {
        let graph = TransitionGraph::build(&dense(n));
        group.throughput(Throughput::Elements(graph.edge_count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &graph, |b, graph| {
            b.iter(|| {
                let cycles = enumerate(graph, &SearchLimits::default());
                black_box(cycles.map(|set| set.len()).unwrap_or(0))
            });
        });
    }

    group.finish();
}

fn bench_sparse_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze.sparse");
    let config = AnalysisConfig::default();

    for n in SPARSE_SIZES {
        let records = sparse(n);
        group.throughput(Throughput::Elements(records.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &records, |b, records| {
            b.iter(|| {
                let report = analyze(records, &config);
                black_box(report.map(|r| r.result.distinct_cycles).unwrap_or(0))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dense_enumeration, bench_sparse_pipeline);
criterion_main!(benches);
