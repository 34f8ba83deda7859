//! Minimum Mean Cycle
//!
//! Finds a directed cycle minimizing the average arc weight, using Karp's
//! characterization applied independently to every strongly connected
//! component.
//!
//! # Theoretical Foundation
//! Let `D_j(v)` be the minimum weight of a walk of exactly `j` arcs from a
//! fixed root to `v` inside a strongly connected component with `k` vertices.
//! Karp's theorem states that the minimum cycle mean is
//!
//! ```text
//! lambda* = min_v max_{0 <= j < k} (D_k(v) - D_j(v)) / (k - j)
//! ```
//!
//! and that the `k`-arc walk realizing `D_k(v*)` for the minimizing `v*`
//! contains a cycle of mean exactly `lambda*`. The cycle is recovered by
//! scanning the walk for repeated vertices.
//!
//! # Algorithmic Complexity
//! - **Time Complexity**: O(V E)
//! - **Space Complexity**: O(V^2) per component for the walk table
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use log::trace;
use serde::{Deserialize, Serialize};

use super::scc::StronglyConnectedComponents;
use crate::data_structures::graph::Digraph;

const NO_ARC: usize = usize::MAX;

/// A directed cycle with its mean weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanCycle {
    /// Arcs of the cycle in traversal order
    pub arcs: Vec<usize>,
    /// Average arc weight
    pub mean: f64,
}

impl MeanCycle {
    /// Total weight of the cycle
    pub fn weight(&self) -> f64 {
        self.mean * self.arcs.len() as f64
    }
}

/// Karp's minimum mean cycle algorithm
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimumMeanCycle;

impl MinimumMeanCycle {
    /// Minimum mean cycle of `graph` under `weight`, `None` if acyclic
    pub fn compute<G: Digraph>(&self, graph: &G, weight: impl Fn(usize) -> f64) -> Option<MeanCycle> {
        let mut best: Option<MeanCycle> = None;
        let mut consider = |candidate: MeanCycle| {
            if best.as_ref().map_or(true, |b| candidate.mean < b.mean) {
                best = Some(candidate);
            }
        };

        for a in 0..graph.arc_count() {
            if graph.arc_source(a) == graph.arc_target(a) {
                consider(MeanCycle {
                    arcs: vec![a],
                    mean: weight(a),
                });
            }
        }

        let scc = StronglyConnectedComponents::compute(graph);
        let mut local = vec![usize::MAX; graph.vertex_count()];
        for (id, component) in scc.components.iter().enumerate() {
            if component.len() < 2 {
                continue;
            }
            for (i, &v) in component.iter().enumerate() {
                local[v] = i;
            }
            if let Some(cycle) = karp(graph, &weight, component, id, &scc.component_of, &local) {
                trace!("min mean cycle: component {} of {} vertices, mean {}", id, component.len(), cycle.mean);
                consider(cycle);
            }
        }

        best
    }
}

/// Karp's recurrence on one strongly connected component
fn karp<G: Digraph>(
    graph: &G,
    weight: &impl Fn(usize) -> f64,
    component: &[usize],
    id: usize,
    component_of: &[usize],
    local: &[usize],
) -> Option<MeanCycle> {
    let k = component.len();
    let index = |level: usize, v: usize| level * k + v;

    let mut distance = vec![f64::INFINITY; (k + 1) * k];
    let mut parent = vec![NO_ARC; (k + 1) * k];
    distance[index(0, 0)] = 0.0;

    for level in 1..=k {
        for u in 0..k {
            let du = distance[index(level - 1, u)];
            if du == f64::INFINITY {
                continue;
            }
            for a in graph.out_arcs(component[u]) {
                let w = graph.arc_target(a);
                if component_of[w] != id || w == component[u] {
                    continue;
                }
                let candidate = du + weight(a);
                let slot = index(level, local[w]);
                if candidate < distance[slot] {
                    distance[slot] = candidate;
                    parent[slot] = a;
                }
            }
        }
    }

    // lambda* and the vertex realizing it
    let mut best: Option<(f64, usize)> = None;
    for v in 0..k {
        let dk = distance[index(k, v)];
        if dk == f64::INFINITY {
            continue;
        }
        let worst = (0..k)
            .filter(|&j| distance[index(j, v)] < f64::INFINITY)
            .map(|j| (dk - distance[index(j, v)]) / (k - j) as f64)
            .fold(f64::NEG_INFINITY, f64::max);
        if best.map_or(true, |(b, _)| worst < b) {
            best = Some((worst, v));
        }
    }
    let (_, end) = best?;

    // walk of k arcs ending at `end`: vertices[j] reached after j arcs
    let mut walk_arcs = vec![NO_ARC; k + 1];
    let mut vertices = vec![0usize; k + 1];
    vertices[k] = end;
    for level in (1..=k).rev() {
        let a = parent[index(level, vertices[level])];
        if a == NO_ARC {
            return None;
        }
        walk_arcs[level] = a;
        vertices[level - 1] = local[graph.arc_source(a)];
    }

    let mut prefix = vec![0.0; k + 1];
    for level in 1..=k {
        prefix[level] = prefix[level - 1] + weight(walk_arcs[level]);
    }

    // simple closed segments only: no vertex repeats strictly inside
    let mut cycle: Option<(f64, usize, usize)> = None;
    let mut inside = vec![false; k];
    for i in 0..k {
        let mut j = i + 1;
        while j <= k && vertices[j] != vertices[i] && !inside[vertices[j]] {
            inside[vertices[j]] = true;
            j += 1;
        }
        for &v in &vertices[i + 1..j.min(k + 1)] {
            inside[v] = false;
        }
        if j <= k && vertices[j] == vertices[i] {
            let mean = (prefix[j] - prefix[i]) / (j - i) as f64;
            if cycle.map_or(true, |(m, _, _)| mean < m) {
                cycle = Some((mean, i, j));
            }
        }
    }

    cycle.map(|(_, i, j)| {
        let arcs: Vec<usize> = walk_arcs[i + 1..=j].to_vec();
        // recompute from the arcs to avoid prefix round-off
        let mean = arcs.iter().map(|&a| weight(a)).sum::<f64>() / arcs.len() as f64;
        MeanCycle { arcs, mean }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::graph::IndexGraph;
    use approx::assert_abs_diff_eq;

    fn weighted(n: usize, edges: &[(usize, usize, f64)]) -> (IndexGraph, Vec<f64>) {
        let mut g = IndexGraph::with_vertices(true, n);
        let mut w = Vec::new();
        for &(u, v, c) in edges {
            g.add_edge(u, v).unwrap();
            w.push(c);
        }
        (g, w)
    }

    fn assert_is_cycle(g: &IndexGraph, cycle: &MeanCycle) {
        let arcs = &cycle.arcs;
        for (i, &a) in arcs.iter().enumerate() {
            let next = arcs[(i + 1) % arcs.len()];
            assert_eq!(g.edge_target(a), g.edge_source(next));
        }
        let mut tails: Vec<usize> = arcs.iter().map(|&a| g.edge_source(a)).collect();
        tails.sort_unstable();
        tails.dedup();
        assert_eq!(tails.len(), arcs.len(), "cycle is not simple");
    }

    #[test]
    fn test_picks_cheaper_of_two_cycles() {
        // cycle A: 0->1->0 mean 2, cycle B: 1->2->3->1 mean -1
        let (g, w) = weighted(
            4,
            &[(0, 1, 3.0), (1, 0, 1.0), (1, 2, -2.0), (2, 3, 0.0), (3, 1, -1.0)],
        );
        let cycle = MinimumMeanCycle.compute(&g, |a| w[a]).unwrap();
        assert_is_cycle(&g, &cycle);
        assert_abs_diff_eq!(cycle.mean, -1.0, epsilon = 1e-12);
        assert_eq!(cycle.arcs.len(), 3);
        assert_abs_diff_eq!(cycle.weight(), -3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_acyclic_has_no_cycle() {
        let (g, w) = weighted(3, &[(0, 1, -5.0), (1, 2, -5.0), (0, 2, 1.0)]);
        assert!(MinimumMeanCycle.compute(&g, |a| w[a]).is_none());
    }

    #[test]
    fn test_self_loop_competes() {
        let (g, w) = weighted(3, &[(0, 1, 1.0), (1, 0, 1.0), (2, 2, -0.5)]);
        let cycle = MinimumMeanCycle.compute(&g, |a| w[a]).unwrap();
        assert_eq!(cycle.arcs, vec![2]);
        assert_abs_diff_eq!(cycle.mean, -0.5);
    }

    #[test]
    fn test_matches_brute_force_on_small_graphs() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..30 {
            let n = 4;
            let mut edges = Vec::new();
            for u in 0..n {
                for v in 0..n {
                    if u != v && rng.gen_bool(0.5) {
                        edges.push((u, v, rng.gen_range(-5..=5) as f64));
                    }
                }
            }
            let (g, w) = weighted(n, &edges);

            // every simple cycle on 4 vertices has length 2..=4; enumerate closed walks by DFS
            let mut brute = f64::INFINITY;
            fn dfs(g: &IndexGraph, w: &[f64], start: usize, v: usize, used: &mut Vec<bool>, total: f64, len: usize, best: &mut f64) {
                for &e in g.out_edges(v) {
                    let t = g.edge_target(e);
                    if t == start {
                        *best = best.min((total + w[e]) / (len + 1) as f64);
                    } else if !used[t] && t > start {
                        used[t] = true;
                        dfs(g, w, start, t, used, total + w[e], len + 1, best);
                        used[t] = false;
                    }
                }
            }
            for s in 0..n {
                let mut used = vec![false; n];
                used[s] = true;
                dfs(&g, &w, s, s, &mut used, 0.0, 0, &mut brute);
            }

            match MinimumMeanCycle.compute(&g, |a| w[a]) {
                Some(cycle) => {
                    assert_is_cycle(&g, &cycle);
                    assert_abs_diff_eq!(cycle.mean, brute, epsilon = 1e-9);
                }
                None => assert!(brute.is_infinite()),
            }
        }
    }
}
