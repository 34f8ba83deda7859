//! Edmonds-Karp Maximum Flow
//!
//! Shortest augmenting paths found by breadth-first search, run directly on
//! the original graph without materializing a residual graph.
//!
//! # Theoretical Foundation
//! Each edge keeps a single residual counter. For a directed edge the
//! forward residual is `residual[e]` and the backward residual is the flow
//! `cap(e) - residual[e]`. For an undirected edge the counter lives in
//! `[0, 2 cap(e)]`: traversing from its source uses `residual[e]`, traversing
//! from its target uses `2 cap(e) - residual[e]`, and the signed flow is
//! `cap(e) - residual[e]`.
//!
//! # Algorithmic Complexity
//! - **Time Complexity**: O(V E^2)
//! - **Space Complexity**: O(V + E)
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::VecDeque;

use log::trace;

use super::error::FlowError;
use super::max_flow::{flow_value_bound, validate_pair, validate_terminals, ExtendedGraph, MaxFlowAlgorithm};
use super::network::{FlowNetwork, FlowValue, Weights};
use crate::data_structures::graph::IndexGraph;

/// Edmonds-Karp maximum flow
#[derive(Debug, Clone, Copy, Default)]
pub struct EdmondsKarp;

impl MaxFlowAlgorithm for EdmondsKarp {
    fn name(&self) -> &'static str {
        "Edmonds-Karp"
    }

    fn compute_maximum_flow(
        &self,
        network: &mut FlowNetwork<'_>,
        source: usize,
        sink: usize,
    ) -> Result<f64, FlowError> {
        let graph = network.graph();
        validate_pair(graph, source, sink)?;

        if network.capacities().is_integral() {
            let (value, flows) = augment_all::<i64>(graph, network.capacities(), source, sink);
            network.install_flows(i64::into_flows(flows));
            Ok(value as f64)
        } else {
            let (value, flows) = augment_all::<f64>(graph, network.capacities(), source, sink);
            network.install_flows(f64::into_flows(flows));
            Ok(value)
        }
    }

    fn compute_maximum_flow_multi(
        &self,
        network: &mut FlowNetwork<'_>,
        sources: &[usize],
        sinks: &[usize],
    ) -> Result<f64, FlowError> {
        let graph = network.graph();
        validate_terminals(graph, sources, sinks)?;

        if network.capacities().is_integral() {
            let value = solve_extended::<i64>(network, sources, sinks);
            Ok(value as f64)
        } else {
            Ok(solve_extended::<f64>(network, sources, sinks))
        }
    }
}

/// Solve a multi-terminal problem on a graph extended with super-terminals
/// and project the flow back
fn solve_extended<T: FlowValue>(network: &mut FlowNetwork<'_>, sources: &[usize], sinks: &[usize]) -> T {
    let extended = ExtendedGraph::<T>::for_terminals(network.graph(), network.capacities(), sources, sinks);
    let capacities = T::into_weights(extended.capacities.clone());
    let (value, flows) = augment_all::<T>(&extended.graph, &capacities, extended.source, extended.sink);
    network.install_flows(extended.project(&T::into_flows(flows)));
    value
}

/// Run augmenting path search until the sink is unreachable; returns the
/// flow value and the per-edge flow
pub(crate) fn augment_all<T: FlowValue>(
    graph: &IndexGraph,
    capacities: &Weights,
    source: usize,
    sink: usize,
) -> (T, Vec<T>) {
    let n = graph.vertex_count();
    let m = graph.edge_count();
    let directed = graph.is_directed();
    // the running total stays below this bound
    flow_value_bound::<T>(graph, capacities, &[source]);

    let capacity: Vec<T> = (0..m).map(|e| T::weight(capacities, e)).collect();
    // counter upper bound: cap for directed edges, 2 cap for undirected ones
    let upper: Vec<T> = if directed {
        capacity.clone()
    } else {
        capacity.iter().map(|&c| c.doubled()).collect()
    };
    let mut residual = capacity.clone();

    // backtrack[v] = (edge, true if the edge was used from its source side)
    let mut backtrack: Vec<Option<(usize, bool)>> = vec![None; n];
    let mut visited = vec![false; n];
    let mut queue = VecDeque::with_capacity(n);
    let mut total = T::ZERO;
    let mut augmentations = 0usize;

    loop {
        visited.fill(false);
        queue.clear();
        visited[source] = true;
        queue.push_back(source);

        'bfs: while let Some(u) = queue.pop_front() {
            for &e in graph.out_edges(u) {
                let (forward, v) = if graph.edge_source(e) == u {
                    (true, graph.edge_target(e))
                } else {
                    (false, graph.edge_source(e))
                };
                if visited[v] {
                    continue;
                }
                let available = if forward { residual[e] } else { upper[e] - residual[e] };
                if !available.is_positive() {
                    continue;
                }
                visited[v] = true;
                backtrack[v] = Some((e, forward));
                if v == sink {
                    break 'bfs;
                }
                queue.push_back(v);
            }
            if directed {
                for &e in graph.in_edges(u) {
                    let v = graph.edge_source(e);
                    if visited[v] || !(capacity[e] - residual[e]).is_positive() {
                        continue;
                    }
                    visited[v] = true;
                    backtrack[v] = Some((e, false));
                    if v == sink {
                        break 'bfs;
                    }
                    queue.push_back(v);
                }
            }
        }

        if !visited[sink] {
            break;
        }

        // bottleneck along the path
        let mut bottleneck: Option<T> = None;
        let mut v = sink;
        while v != source {
            let Some((e, forward)) = backtrack[v] else { break };
            let available = if forward { residual[e] } else { upper[e] - residual[e] };
            bottleneck = Some(bottleneck.map_or(available, |b| b.min_of(available)));
            v = if forward { graph.edge_source(e) } else { graph.opposite(e, v) };
        }
        let Some(delta) = bottleneck else { break };

        let mut v = sink;
        while v != source {
            let Some((e, forward)) = backtrack[v] else { break };
            if forward {
                residual[e] -= delta;
                v = graph.edge_source(e);
            } else {
                residual[e] += delta;
                v = graph.opposite(e, v);
            }
        }

        total += delta;
        augmentations += 1;
        trace!("edmonds-karp: augmentation {} pushed {:?}", augmentations, delta);
    }

    trace!("edmonds-karp: {} augmenting paths", augmentations);
    let flows = (0..m).map(|e| capacity[e] - residual[e]).collect();
    (total, flows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_shortest_paths_skip_cross_edge() {
        let mut g = IndexGraph::with_vertices(true, 4);
        for (u, v) in [(0, 1), (0, 2), (1, 2), (1, 3), (2, 3)] {
            g.add_edge(u, v).unwrap();
        }
        let mut net = FlowNetwork::new(&g, Weights::Int(vec![1, 1, 1, 1, 1])).unwrap();
        let value = EdmondsKarp.compute_maximum_flow(&mut net, 0, 3).unwrap();
        assert_eq!(value, 2.0);
        assert_eq!(net.flow(2).unwrap(), 0.0);
    }

    #[test]
    fn test_undirected_path_flows_against_orientation() {
        // edges stored as 1-0 and 2-1, flow must travel 0 -> 1 -> 2
        let mut g = IndexGraph::with_vertices(false, 3);
        g.add_edge(1, 0).unwrap();
        g.add_edge(2, 1).unwrap();
        let mut net = FlowNetwork::new(&g, Weights::Real(vec![2.5, 4.0])).unwrap();
        let value = EdmondsKarp.compute_maximum_flow(&mut net, 0, 2).unwrap();

        assert_abs_diff_eq!(value, 2.5, epsilon = 1e-9);
        assert_abs_diff_eq!(net.flow(0).unwrap(), -2.5, epsilon = 1e-9);
        assert_abs_diff_eq!(net.flow(1).unwrap(), -2.5, epsilon = 1e-9);
    }

    #[test]
    fn test_multi_terminal_projection() {
        // two sources feeding two sinks through a shared middle vertex
        let mut g = IndexGraph::with_vertices(true, 5);
        for (u, v) in [(0, 2), (1, 2), (2, 3), (2, 4)] {
            g.add_edge(u, v).unwrap();
        }
        let mut net = FlowNetwork::new(&g, Weights::Int(vec![3, 4, 2, 10])).unwrap();
        let value = EdmondsKarp.compute_maximum_flow_multi(&mut net, &[0, 1], &[3, 4]).unwrap();

        assert_eq!(value, 7.0);
        assert_eq!(net.flow_sum(&[0, 1]).unwrap(), 7.0);
        assert_eq!(net.flow_sum(&[2]).unwrap(), 0.0);
    }

    /// Two disjoint unit-length paths whose capacities sum past `i64::MAX`
    fn twin_paths(capacity: i64) -> (IndexGraph, Weights) {
        let mut g = IndexGraph::with_vertices(true, 4);
        for (u, v) in [(0, 1), (1, 3), (0, 2), (2, 3)] {
            g.add_edge(u, v).unwrap();
        }
        (g, Weights::Int(vec![capacity; 4]))
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn test_unrepresentable_value_panics() {
        let (g, caps) = twin_paths(i64::MAX / 2 + 10);
        let mut net = FlowNetwork::new(&g, caps).unwrap();
        let _ = EdmondsKarp.compute_maximum_flow(&mut net, 0, 3);
    }

    #[test]
    fn test_largest_representable_value() {
        let (g, caps) = twin_paths(i64::MAX / 2);
        let mut net = FlowNetwork::new(&g, caps).unwrap();
        let value = EdmondsKarp.compute_maximum_flow(&mut net, 0, 3).unwrap();
        assert_eq!(value, (i64::MAX / 2 * 2) as f64);
        assert_eq!(net.flow_int(0).unwrap(), Some(i64::MAX / 2));
        assert_eq!(net.flow_int(3).unwrap(), Some(i64::MAX / 2));
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn test_undirected_counter_overflow_panics() {
        let mut g = IndexGraph::with_vertices(false, 2);
        g.add_edge(0, 1).unwrap();
        let mut net = FlowNetwork::new(&g, Weights::Int(vec![i64::MAX / 2 + 1])).unwrap();
        let _ = EdmondsKarp.compute_maximum_flow(&mut net, 0, 1);
    }

    #[test]
    fn test_unreachable_sink() {
        let g = IndexGraph::with_vertices(true, 2);
        let mut net = FlowNetwork::new(&g, Weights::Cardinality).unwrap();
        assert_eq!(EdmondsKarp.compute_maximum_flow(&mut net, 0, 1).unwrap(), 0.0);
    }
}
