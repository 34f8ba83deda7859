//! Residual Graph Builder
//!
//! Builds the explicit residual graph used by the push-relabel solver, the
//! minimum cut enumeration and the cycle-canceling minimum cost solver.
//!
//! # Theoretical Foundation
//! Every non-self-loop edge `e = (u, v)` becomes a pair of arcs `u -> v` and
//! `v -> u` that are each other's twin. Pushing `d` units along an arc
//! raises its flow by `d` and lowers its twin's flow by `d`, so the residual
//! capacity `cap(a) - flow(a)` of both arcs stays consistent. Self-loops
//! carry no useful residual capacity and are omitted.
//!
//! ## Arena Layout
//! After [`ResidualGraphBuilder::build`] arcs are stored in parallel arrays,
//! sorted by tail vertex, so the out-arcs of `v` are the contiguous range
//! `offsets[v]..offsets[v + 1]`.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::ops::Range;

use super::network::{FlowValue, Weights};
use crate::data_structures::graph::{Digraph, IndexGraph};

/// Incremental builder for a [`ResidualGraph`]
#[derive(Debug, Clone)]
pub struct ResidualGraphBuilder<'g> {
    /// Graph whose edges are mirrored
    graph: &'g IndexGraph,
    /// Vertex count including synthetic vertices
    vertex_count: usize,
    /// Tail of each arc
    source: Vec<usize>,
    /// Head of each arc
    target: Vec<usize>,
    /// Original edge behind each arc, `None` for synthetic arcs
    edge_ref: Vec<Option<usize>>,
    /// Whether the arc points the same way as the edge it was created for
    forward: Vec<bool>,
    /// Twin arc index
    twin: Vec<usize>,
}

impl<'g> ResidualGraphBuilder<'g> {
    /// Start a builder over the vertices of `graph`
    pub fn new(graph: &'g IndexGraph) -> Self {
        let capacity = 2 * graph.edge_count();
        Self {
            graph,
            vertex_count: graph.vertex_count(),
            source: Vec::with_capacity(capacity),
            target: Vec::with_capacity(capacity),
            edge_ref: Vec::with_capacity(capacity),
            forward: Vec::with_capacity(capacity),
            twin: Vec::with_capacity(capacity),
        }
    }

    /// Add a synthetic vertex and return its index
    pub fn add_vertex(&mut self) -> usize {
        self.vertex_count += 1;
        self.vertex_count - 1
    }

    /// Mirror every non-self-loop edge of the graph
    pub fn add_all_original_edges(&mut self) {
        let graph = self.graph;
        for e in 0..graph.edge_count() {
            let (u, v) = (graph.edge_source(e), graph.edge_target(e));
            if u != v {
                self.add_edge(u, v, Some(e));
            }
        }
    }

    /// Add an arc `u -> v` together with its twin `v -> u`; returns the
    /// index of the forward arc
    pub fn add_edge(&mut self, u: usize, v: usize, edge_ref: Option<usize>) -> usize {
        debug_assert!(u < self.vertex_count && v < self.vertex_count);
        let a = self.source.len();
        let b = a + 1;
        for (tail, head, forward, twin) in [(u, v, true, b), (v, u, false, a)] {
            self.source.push(tail);
            self.target.push(head);
            self.edge_ref.push(edge_ref);
            self.forward.push(forward);
            self.twin.push(twin);
        }
        a
    }

    /// Freeze into CSR order
    pub fn build(self) -> ResidualGraph {
        let n = self.vertex_count;
        let arc_count = self.source.len();

        let mut offsets = vec![0usize; n + 1];
        for &u in &self.source {
            offsets[u + 1] += 1;
        }
        for v in 0..n {
            offsets[v + 1] += offsets[v];
        }

        let mut next = offsets.clone();
        let mut position = vec![0usize; arc_count];
        for (a, &u) in self.source.iter().enumerate() {
            position[a] = next[u];
            next[u] += 1;
        }

        let mut source = vec![0; arc_count];
        let mut target = vec![0; arc_count];
        let mut edge_ref = vec![None; arc_count];
        let mut forward = vec![false; arc_count];
        let mut twin = vec![0; arc_count];
        for a in 0..arc_count {
            let p = position[a];
            source[p] = self.source[a];
            target[p] = self.target[a];
            edge_ref[p] = self.edge_ref[a];
            forward[p] = self.forward[a];
            twin[p] = position[self.twin[a]];
        }

        ResidualGraph {
            vertex_count: n,
            source,
            target,
            edge_ref,
            forward,
            twin,
            offsets,
        }
    }
}

/// Residual graph with twin arcs in CSR layout
#[derive(Debug, Clone)]
pub struct ResidualGraph {
    vertex_count: usize,
    source: Vec<usize>,
    target: Vec<usize>,
    edge_ref: Vec<Option<usize>>,
    forward: Vec<bool>,
    twin: Vec<usize>,
    offsets: Vec<usize>,
}

impl ResidualGraph {
    /// Original edge behind an arc, `None` for synthetic arcs
    #[inline]
    pub fn edge_ref(&self, arc: usize) -> Option<usize> {
        self.edge_ref[arc]
    }

    /// Twin of an arc
    #[inline]
    pub fn twin(&self, arc: usize) -> usize {
        self.twin[arc]
    }

    /// Whether the arc points in the direction of the edge it mirrors
    #[inline]
    pub fn is_forward(&self, arc: usize) -> bool {
        self.forward[arc]
    }

    /// Whether the arc mirrors an original edge in its own direction
    #[inline]
    pub fn is_original(&self, arc: usize) -> bool {
        self.forward[arc] && self.edge_ref[arc].is_some()
    }

    /// Out-arcs of a vertex as an index range
    #[inline]
    pub fn arc_range(&self, vertex: usize) -> Range<usize> {
        self.offsets[vertex]..self.offsets[vertex + 1]
    }

    /// Capacity of every arc.
    ///
    /// Arcs of original edges take the edge capacity, except that the
    /// backward arc of a directed edge has capacity zero. Synthetic forward
    /// arcs take `synthetic(arc)`; synthetic backward arcs have zero.
    pub fn arc_capacities<T: FlowValue>(
        &self,
        weights: &Weights,
        directed: bool,
        synthetic: impl Fn(usize) -> T,
    ) -> Vec<T> {
        (0..self.source.len())
            .map(|a| match (self.edge_ref[a], self.forward[a]) {
                (Some(e), true) => T::weight(weights, e),
                (Some(e), false) if !directed => T::weight(weights, e),
                (None, true) => synthetic(a),
                _ => T::ZERO,
            })
            .collect()
    }
}

impl Digraph for ResidualGraph {
    type OutArcs<'a> = Range<usize> where Self: 'a;

    fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    fn arc_count(&self) -> usize {
        self.source.len()
    }

    fn arc_source(&self, arc: usize) -> usize {
        self.source[arc]
    }

    fn arc_target(&self, arc: usize) -> usize {
        self.target[arc]
    }

    fn out_arcs(&self, vertex: usize) -> Self::OutArcs<'_> {
        self.arc_range(vertex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> IndexGraph {
        let mut g = IndexGraph::with_vertices(true, 3);
        g.add_edge(2, 0).unwrap();
        g.add_edge(0, 1).unwrap();
        g.add_edge(1, 1).unwrap();
        g.add_edge(1, 2).unwrap();
        g
    }

    #[test]
    fn test_twins_are_involutive() {
        let g = sample();
        let mut builder = ResidualGraphBuilder::new(&g);
        builder.add_all_original_edges();
        let r = builder.build();

        // self-loop skipped
        assert_eq!(r.arc_count(), 6);
        for a in 0..r.arc_count() {
            let t = r.twin(a);
            assert_ne!(a, t);
            assert_eq!(r.twin(t), a);
            assert_eq!(r.arc_source(t), r.arc_target(a));
            assert_eq!(r.edge_ref(t), r.edge_ref(a));
            assert_ne!(r.is_forward(a), r.is_forward(t));
        }
    }

    #[test]
    fn test_csr_ranges_group_by_tail() {
        let g = sample();
        let mut builder = ResidualGraphBuilder::new(&g);
        builder.add_all_original_edges();
        let r = builder.build();

        let mut seen = 0;
        for v in 0..r.vertex_count() {
            for a in r.out_arcs(v) {
                assert_eq!(r.arc_source(a), v);
                seen += 1;
            }
        }
        assert_eq!(seen, r.arc_count());
    }

    #[test]
    fn test_synthetic_vertices_and_capacities() {
        let g = sample();
        let mut builder = ResidualGraphBuilder::new(&g);
        builder.add_all_original_edges();
        let s = builder.add_vertex();
        builder.add_edge(s, 0, None);
        let r = builder.build();

        assert_eq!(r.vertex_count(), 4);
        let caps = r.arc_capacities::<i64>(&Weights::Int(vec![3, 4, 5, 6]), true, |_| 99);
        for a in 0..r.arc_count() {
            match (r.edge_ref(a), r.is_forward(a)) {
                (None, true) => assert_eq!(caps[a], 99),
                (Some(e), true) => assert_eq!(caps[a], [3, 4, 5, 6][e]),
                _ => assert_eq!(caps[a], 0),
            }
            assert_eq!(r.is_original(a), r.is_forward(a) && r.edge_ref(a).is_some());
        }
    }
}
