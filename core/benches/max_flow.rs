//! Maximum flow and minimum cut benchmarks
//!
//! Compares Edmonds-Karp with FIFO push-relabel on layered random networks
//! and times the global minimum cut serially and on the rayon pool.
//!
//! Run: cargo bench -p netflow-core --bench max_flow
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use netflow_core::{FlowConfig, IndexGraph, MaxFlowSolver, MaxFlowVariant, MinimumEdgeCut, Weights};

/// Layered network: source 0, `layers` layers of `width` vertices, sink last.
/// Consecutive layers are joined by random edges.
fn layered_network(layers: usize, width: usize, seed: u64) -> (IndexGraph, Weights) {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = layers * width + 2;
    let sink = n - 1;
    let mut g = IndexGraph::with_vertices(true, n);
    let mut caps = Vec::new();
    let mut add = |g: &mut IndexGraph, u: usize, v: usize, cap: i64| {
        if g.add_edge(u, v).is_ok() {
            caps.push(cap);
        }
    };

    for i in 0..width {
        add(&mut g, 0, 1 + i, rng.gen_range(10..100));
        add(&mut g, 1 + (layers - 1) * width + i, sink, rng.gen_range(10..100));
    }
    for layer in 0..layers - 1 {
        for i in 0..width {
            let u = 1 + layer * width + i;
            for _ in 0..3 {
                let v = 1 + (layer + 1) * width + rng.gen_range(0..width);
                add(&mut g, u, v, rng.gen_range(1..50));
            }
        }
    }
    (g, Weights::Int(caps))
}

fn bench_max_flow(c: &mut Criterion) {
    let mut group = c.benchmark_group("max_flow");
    for &(layers, width) in &[(8, 16), (16, 32), (32, 64)] {
        let (g, caps) = layered_network(layers, width, 7);
        let sink = g.vertex_count() - 1;
        group.throughput(Throughput::Elements(g.edge_count() as u64));

        for variant in [MaxFlowVariant::EdmondsKarp, MaxFlowVariant::PushRelabel] {
            let solver = MaxFlowSolver::with_variant(variant);
            group.bench_with_input(
                BenchmarkId::new(variant.as_str(), g.vertex_count()),
                &g,
                |b, g| {
                    b.iter(|| {
                        let result = solver.compute_maximum_flow(g, caps.clone(), 0, sink);
                        black_box(result.map(|r| r.value))
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_global_cut(c: &mut Criterion) {
    let mut group = c.benchmark_group("global_minimum_cut");
    group.sample_size(10);
    let (g, caps) = layered_network(6, 12, 11);

    for parallel in [false, true] {
        let solver = MinimumEdgeCut::new(FlowConfig {
            parallel_global_cut: parallel,
            ..FlowConfig::default()
        });
        let label = if parallel { "parallel" } else { "serial" };
        group.bench_function(label, |b| {
            b.iter(|| black_box(solver.compute_global_minimum_cut(&g, &caps).map(|cut| cut.source_vertices())))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_max_flow, bench_global_cut);
criterion_main!(benches);
