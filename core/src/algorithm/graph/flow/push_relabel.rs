//! Push-Relabel Maximum Flow (FIFO)
//!
//! Goldberg-Tarjan push-relabel on an explicit residual graph, processing
//! active vertices in FIFO order, with the gap and global relabel heuristics.
//!
//! # Theoretical Foundation
//! A preflow relaxes conservation to `excess(v) >= 0`. A distance labelling
//! `d` is valid when `d(u) <= d(v) + 1` for every residual arc `u -> v`;
//! excess is only pushed along admissible arcs (`d(u) = d(v) + 1`). Labels
//! below `n` are lower bounds on the distance to the sink; labels from `n`
//! on are `n` plus a lower bound on the distance back to the source, so
//! excess that cannot reach the sink drains back and the final preflow is a
//! flow.
//!
//! ## Heuristics
//! - **Global relabel**: recompute exact labels by reverse BFS from the sink
//!   (then from the source for the rest) every `global_relabel_frequency`
//!   relabel operations.
//! - **Gap**: when no vertex is left at some label `h < n`, every vertex with
//!   a label in `(h, n)` is cut off from the sink and jumps to `n + 1`.
//!
//! # Algorithmic Complexity
//! - **Time Complexity**: O(V^3)
//! - **Space Complexity**: O(V + E)
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::VecDeque;

use log::trace;

use super::error::FlowError;
use super::max_flow::{flow_value_bound, terminal_bounds, validate_pair, validate_terminals, MaxFlowAlgorithm};
use super::network::{FlowNetwork, FlowValue, Weights};
use super::residual::{ResidualGraph, ResidualGraphBuilder};
use crate::data_structures::graph::{Digraph, IndexGraph};

/// FIFO push-relabel maximum flow
#[derive(Debug, Clone, Copy)]
pub struct PushRelabel {
    /// Relabel operations between two global relabels
    global_relabel_frequency: usize,
}

impl Default for PushRelabel {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PushRelabel {
    /// Create a solver with the given global relabel frequency
    pub fn new(global_relabel_frequency: usize) -> Self {
        Self {
            global_relabel_frequency: global_relabel_frequency.max(1),
        }
    }

    fn solve<T: FlowValue>(
        &self,
        network: &mut FlowNetwork<'_>,
        residual: &ResidualGraph,
        source: usize,
        sink: usize,
        synthetic: T,
    ) -> T {
        let graph = network.graph();
        let capacity = residual.arc_capacities(network.capacities(), graph.is_directed(), |_| synthetic);
        let preflow = Preflow::new(residual, capacity, source, sink, self.global_relabel_frequency);
        let (value, arc_flow) = preflow.run();
        network.install_flows(T::into_flows(edge_flows(graph, residual, &arc_flow)));
        value
    }
}

impl MaxFlowAlgorithm for PushRelabel {
    fn name(&self) -> &'static str {
        "Push-Relabel FIFO"
    }

    fn compute_maximum_flow(
        &self,
        network: &mut FlowNetwork<'_>,
        source: usize,
        sink: usize,
    ) -> Result<f64, FlowError> {
        let graph = network.graph();
        validate_pair(graph, source, sink)?;

        let mut builder = ResidualGraphBuilder::new(graph);
        builder.add_all_original_edges();
        let residual = builder.build();

        if network.capacities().is_integral() {
            flow_value_bound::<i64>(graph, network.capacities(), &[source]);
            Ok(self.solve::<i64>(network, &residual, source, sink, 0) as f64)
        } else {
            Ok(self.solve::<f64>(network, &residual, source, sink, 0.0))
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

        let mut builder = ResidualGraphBuilder::new(graph);
        builder.add_all_original_edges();
        let super_source = builder.add_vertex();
        let super_sink = builder.add_vertex();
        for &s in sources {
            builder.add_edge(super_source, s, None);
        }
        for &t in sinks {
            builder.add_edge(t, super_sink, None);
        }
        let residual = builder.build();

        let capacities: &Weights = network.capacities();
        if capacities.is_integral() {
            flow_value_bound::<i64>(graph, capacities, sources);
            let huge = terminal_bounds::<i64>(graph, capacities, sources, sinks).huge;
            Ok(self.solve(network, &residual, super_source, super_sink, huge) as f64)
        } else {
            let huge = terminal_bounds::<f64>(graph, capacities, sources, sinks).huge;
            Ok(self.solve(network, &residual, super_source, super_sink, huge))
        }
    }
}

/// Flow of each original edge, read from its forward arc
fn edge_flows<T: FlowValue>(graph: &IndexGraph, residual: &ResidualGraph, arc_flow: &[T]) -> Vec<T> {
    let mut flows = vec![T::ZERO; graph.edge_count()];
    for (a, &f) in arc_flow.iter().enumerate() {
        if let (Some(e), true) = (residual.edge_ref(a), residual.is_forward(a)) {
            flows[e] = f;
        }
    }
    flows
}

/// Push-relabel working state over one residual graph
struct Preflow<'r, T> {
    residual: &'r ResidualGraph,
    capacity: Vec<T>,
    flow: Vec<T>,
    excess: Vec<T>,
    label: Vec<usize>,
    /// Number of vertices per label, indices `0..=2n`
    label_count: Vec<usize>,
    /// Current-arc pointer per vertex
    current: Vec<usize>,
    queue: VecDeque<usize>,
    active: Vec<bool>,
    source: usize,
    sink: usize,
    n: usize,
    frequency: usize,
    relabels_since_global: usize,
    pushes: usize,
    relabels: usize,
    global_relabels: usize,
    gaps: usize,
}

impl<'r, T: FlowValue> Preflow<'r, T> {
    fn new(residual: &'r ResidualGraph, capacity: Vec<T>, source: usize, sink: usize, frequency: usize) -> Self {
        let n = residual.vertex_count();
        let arcs = residual.arc_count();
        Self {
            residual,
            capacity,
            flow: vec![T::ZERO; arcs],
            excess: vec![T::ZERO; n],
            label: vec![0; n],
            label_count: vec![0; 2 * n + 1],
            current: (0..n).map(|v| residual.arc_range(v).start).collect(),
            queue: VecDeque::new(),
            active: vec![false; n],
            source,
            sink,
            n,
            frequency,
            relabels_since_global: 0,
            pushes: 0,
            relabels: 0,
            global_relabels: 0,
            gaps: 0,
        }
    }

    #[inline]
    fn residual_capacity(&self, arc: usize) -> T {
        self.capacity[arc] - self.flow[arc]
    }

    fn run(mut self) -> (T, Vec<T>) {
        self.label[self.source] = self.n;
        for a in self.residual.arc_range(self.source) {
            let r = self.residual_capacity(a);
            if r.is_positive() {
                self.push(a, r);
            }
        }
        self.global_relabel();

        while let Some(u) = self.queue.pop_front() {
            self.active[u] = false;
            self.discharge(u);
            if self.relabels_since_global >= self.frequency {
                self.global_relabel();
            }
        }

        trace!(
            "push-relabel: {} pushes, {} relabels, {} global relabels, {} gaps",
            self.pushes,
            self.relabels,
            self.global_relabels,
            self.gaps
        );
        (self.excess[self.sink], self.flow)
    }

    fn enqueue(&mut self, v: usize) {
        if !self.active[v] && v != self.source && v != self.sink {
            self.active[v] = true;
            self.queue.push_back(v);
        }
    }

    fn push(&mut self, arc: usize, delta: T) {
        let (u, v) = (self.residual.arc_source(arc), self.residual.arc_target(arc));
        let twin = self.residual.twin(arc);
        self.flow[arc] += delta;
        self.flow[twin] -= delta;
        self.excess[u] -= delta;
        self.excess[v] += delta;
        self.pushes += 1;
        self.enqueue(v);
    }

    fn discharge(&mut self, u: usize) {
        let end = self.residual.arc_range(u).end;
        while self.excess[u].is_positive() {
            if self.current[u] == end {
                self.relabel(u);
                if self.label[u] >= 2 * self.n {
                    break;
                }
                continue;
            }
            let a = self.current[u];
            let v = self.residual.arc_target(a);
            let r = self.residual_capacity(a);
            if r.is_positive() && self.label[u] == self.label[v] + 1 {
                let delta = self.excess[u].min_of(r);
                self.push(a, delta);
            } else {
                self.current[u] += 1;
            }
        }
    }

    fn relabel(&mut self, u: usize) {
        let old = self.label[u];
        let lowest = self
            .residual
            .arc_range(u)
            .filter(|&a| self.residual_capacity(a).is_positive())
            .map(|a| self.label[self.residual.arc_target(a)])
            .min();
        let new = lowest.map_or(2 * self.n, |d| (d + 1).min(2 * self.n));

        self.set_label(u, new);
        self.current[u] = self.residual.arc_range(u).start;
        self.relabels += 1;
        self.relabels_since_global += 1;

        if old < self.n && self.label_count[old] == 0 {
            self.gap(old);
        }
    }

    fn set_label(&mut self, v: usize, label: usize) {
        self.label_count[self.label[v]] -= 1;
        self.label[v] = label;
        self.label_count[label] += 1;
    }

    fn gap(&mut self, height: usize) {
        self.gaps += 1;
        for v in 0..self.n {
            let d = self.label[v];
            if d > height && d < self.n {
                self.set_label(v, self.n + 1);
                self.current[v] = self.residual.arc_range(v).start;
            }
        }
    }

    /// Exact labels: distance to the sink, or `n` + distance to the source
    /// for vertices that cannot reach the sink
    fn global_relabel(&mut self) {
        let unlabeled = 2 * self.n;
        self.label.fill(unlabeled);
        self.label[self.sink] = 0;
        self.label[self.source] = self.n;

        let mut queue = VecDeque::new();
        for root in [self.sink, self.source] {
            queue.push_back(root);
            while let Some(v) = queue.pop_front() {
                for a in self.residual.arc_range(v) {
                    let w = self.residual.arc_target(a);
                    // w -> v must have residual capacity
                    let back = self.residual.twin(a);
                    if self.label[w] == unlabeled && self.residual_capacity(back).is_positive() {
                        self.label[w] = self.label[v] + 1;
                        queue.push_back(w);
                    }
                }
            }
        }

        self.label_count.fill(0);
        for v in 0..self.n {
            self.label_count[self.label[v]] += 1;
            self.current[v] = self.residual.arc_range(v).start;
        }
        self.relabels_since_global = 0;
        self.global_relabels += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::graph::flow::edmonds_karp::EdmondsKarp;
    use approx::assert_abs_diff_eq;

    /// Cormen et al. figure 26.1, maximum flow 23
    fn textbook() -> IndexGraph {
        let mut g = IndexGraph::with_vertices(true, 6);
        for (u, v) in [(0, 1), (0, 2), (1, 3), (2, 1), (2, 4), (3, 2), (3, 5), (4, 3), (4, 5)] {
            g.add_edge(u, v).unwrap();
        }
        g
    }

    fn textbook_capacities() -> Vec<i64> {
        vec![16, 13, 12, 4, 14, 9, 20, 7, 4]
    }

    #[test]
    fn test_textbook_network() {
        let g = textbook();
        let mut net = FlowNetwork::new(&g, Weights::Int(textbook_capacities())).unwrap();
        assert_eq!(PushRelabel::default().compute_maximum_flow(&mut net, 0, 5).unwrap(), 23.0);
        assert_eq!(net.flow_sum(&[5]).unwrap(), -23.0);
        for v in 1..5 {
            assert_eq!(net.flow_sum(&[v]).unwrap(), 0.0, "conservation at {}", v);
        }
    }

    #[test]
    fn test_frequent_global_relabel() {
        let g = textbook();
        let mut net = FlowNetwork::new(&g, Weights::Int(textbook_capacities())).unwrap();
        assert_eq!(PushRelabel::new(1).compute_maximum_flow(&mut net, 0, 5).unwrap(), 23.0);
    }

    #[test]
    fn test_excess_returns_to_source() {
        // the source can push 10 into vertex 1, but only 1 unit reaches the sink
        let mut g = IndexGraph::with_vertices(true, 3);
        g.add_edge(0, 1).unwrap();
        g.add_edge(1, 2).unwrap();
        let mut net = FlowNetwork::new(&g, Weights::Int(vec![10, 1])).unwrap();
        assert_eq!(PushRelabel::default().compute_maximum_flow(&mut net, 0, 2).unwrap(), 1.0);
        assert_eq!(net.flow(0).unwrap(), 1.0);
    }

    #[test]
    fn test_real_capacities_match_edmonds_karp() {
        let g = textbook();
        let caps = Weights::Real(textbook_capacities().iter().map(|&c| c as f64 * 0.37).collect());
        let mut a = FlowNetwork::new(&g, caps.clone()).unwrap();
        let mut b = FlowNetwork::new(&g, caps).unwrap();
        let pr = PushRelabel::default().compute_maximum_flow(&mut a, 0, 5).unwrap();
        let ek = EdmondsKarp.compute_maximum_flow(&mut b, 0, 5).unwrap();
        assert_abs_diff_eq!(pr, ek, epsilon = 1e-6);
        assert_abs_diff_eq!(pr, 23.0 * 0.37, epsilon = 1e-6);
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn test_unrepresentable_value_panics() {
        let mut g = IndexGraph::with_vertices(true, 4);
        for (u, v) in [(0, 1), (1, 3), (0, 2), (2, 3)] {
            g.add_edge(u, v).unwrap();
        }
        let mut net = FlowNetwork::new(&g, Weights::Int(vec![i64::MAX / 2 + 10; 4])).unwrap();
        let _ = PushRelabel::default().compute_maximum_flow(&mut net, 0, 3);
    }

    #[test]
    fn test_large_capacities_stay_exact() {
        let big = i64::MAX / 4;
        let mut g = IndexGraph::with_vertices(false, 3);
        g.add_edge(0, 1).unwrap();
        g.add_edge(1, 2).unwrap();
        let mut net = FlowNetwork::new(&g, Weights::Int(vec![big, big - 1])).unwrap();
        let value = PushRelabel::default().compute_maximum_flow(&mut net, 0, 2).unwrap();
        assert_eq!(value, (big - 1) as f64);
        assert_eq!(net.flow_int(1).unwrap(), Some(big - 1));
    }

    #[test]
    fn test_undirected_multi_terminal() {
        // star around vertex 2; sources 0 and 1, sinks 3 and 4
        let mut g = IndexGraph::with_vertices(false, 5);
        for v in [0, 1, 3, 4] {
            g.add_edge(2, v).unwrap();
        }
        let mut net = FlowNetwork::new(&g, Weights::Int(vec![3, 2, 4, 4])).unwrap();
        let value = PushRelabel::default()
            .compute_maximum_flow_multi(&mut net, &[0, 1], &[3, 4])
            .unwrap();
        assert_eq!(value, 5.0);
        assert_eq!(net.flow_sum(&[0, 1]).unwrap(), 5.0);
        assert_eq!(net.flow_sum(&[2]).unwrap(), 0.0);
        // edge 2-0 carries flow from 0 towards 2
        assert_eq!(net.flow(0).unwrap(), -3.0);
    }
}
