//! Dense index graph for flow computations
//!
//! This module implements the graph store every flow algorithm operates on.
//! Vertices and edges are identified by contiguous indices `0..n` and `0..m`,
//! which lets the algorithms keep all per-vertex and per-edge state in flat
//! arrays instead of hash maps.
//!
//! # Theoretical Foundation
//! A graph is a pair of maps `source, target : E -> V`. Directed graphs expose
//! an edge in the out-list of its source and the in-list of its target.
//! Undirected graphs expose every incident edge in both lists of both
//! endpoints, so traversals must resolve the opposite endpoint through
//! [`IndexGraph::edge_endpoint`].
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the graph store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Vertex {vertex} out of range (graph has {vertex_count} vertices)")]
    VertexOutOfRange { vertex: usize, vertex_count: usize },

    #[error("Edge {edge} out of range (graph has {edge_count} edges)")]
    EdgeOutOfRange { edge: usize, edge_count: usize },

    #[error("Vertex {vertex} is not an endpoint of edge {edge}")]
    NotAnEndpoint { edge: usize, vertex: usize },
}

/// Read-only view of a directed multigraph whose arcs are dense indices.
///
/// Implemented by [`IndexGraph`] (for directed graphs) and by the residual
/// graphs built inside the flow module, which lets strongly connected
/// components and minimum mean cycles run on either.
pub trait Digraph {
    /// Iterator over the outgoing arcs of a vertex
    type OutArcs<'a>: Iterator<Item = usize> + 'a
    where
        Self: 'a;

    /// Number of vertices
    fn vertex_count(&self) -> usize;

    /// Number of arcs
    fn arc_count(&self) -> usize;

    /// Tail of an arc
    fn arc_source(&self, arc: usize) -> usize;

    /// Head of an arc
    fn arc_target(&self, arc: usize) -> usize;

    /// Outgoing arcs of a vertex
    fn out_arcs(&self, vertex: usize) -> Self::OutArcs<'_>;
}

/// Graph with contiguous vertex and edge indices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexGraph {
    /// Whether edges are oriented
    directed: bool,
    /// Source endpoint of each edge
    sources: Vec<usize>,
    /// Target endpoint of each edge
    targets: Vec<usize>,
    /// Outgoing edges per vertex (all incident edges when undirected)
    out_edges: Vec<Vec<usize>>,
    /// Incoming edges per vertex (all incident edges when undirected)
    in_edges: Vec<Vec<usize>>,
}

impl IndexGraph {
    /// Create an empty directed graph
    pub fn new_directed() -> Self {
        Self {
            directed: true,
            ..Self::default()
        }
    }

    /// Create an empty undirected graph
    pub fn new_undirected() -> Self {
        Self::default()
    }

    /// Create a graph with `vertex_count` isolated vertices
    pub fn with_vertices(directed: bool, vertex_count: usize) -> Self {
        Self {
            directed,
            sources: Vec::new(),
            targets: Vec::new(),
            out_edges: vec![Vec::new(); vertex_count],
            in_edges: vec![Vec::new(); vertex_count],
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self) -> usize {
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());
        self.out_edges.len() - 1
    }

    /// Add an edge `source -> target` and return its index
    pub fn add_edge(&mut self, source: usize, target: usize) -> Result<usize, GraphError> {
        self.check_vertex(source)?;
        self.check_vertex(target)?;

        let edge = self.sources.len();
        self.sources.push(source);
        self.targets.push(target);

        self.out_edges[source].push(edge);
        self.in_edges[target].push(edge);
        if !self.directed && source != target {
            self.out_edges[target].push(edge);
            self.in_edges[source].push(edge);
        }
        Ok(edge)
    }

    /// Whether edges are oriented
    #[inline]
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Number of vertices
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.out_edges.len()
    }

    /// Number of edges
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.sources.len()
    }

    /// Source endpoint of an edge
    #[inline]
    pub fn edge_source(&self, edge: usize) -> usize {
        self.sources[edge]
    }

    /// Target endpoint of an edge
    #[inline]
    pub fn edge_target(&self, edge: usize) -> usize {
        self.targets[edge]
    }

    /// The endpoint of `edge` opposite to `vertex`
    pub fn edge_endpoint(&self, edge: usize, vertex: usize) -> Result<usize, GraphError> {
        self.check_edge(edge)?;
        let (u, v) = (self.sources[edge], self.targets[edge]);
        if vertex == u {
            Ok(v)
        } else if vertex == v {
            Ok(u)
        } else {
            Err(GraphError::NotAnEndpoint { edge, vertex })
        }
    }

    /// Opposite endpoint without validation, for traversals over incident edges
    #[inline]
    pub(crate) fn opposite(&self, edge: usize, vertex: usize) -> usize {
        if self.sources[edge] == vertex {
            self.targets[edge]
        } else {
            self.sources[edge]
        }
    }

    /// Outgoing edges of a vertex (all incident edges when undirected)
    #[inline]
    pub fn out_edges(&self, vertex: usize) -> &[usize] {
        &self.out_edges[vertex]
    }

    /// Incoming edges of a vertex (all incident edges when undirected)
    #[inline]
    pub fn in_edges(&self, vertex: usize) -> &[usize] {
        &self.in_edges[vertex]
    }

    /// Whether an edge leads from `u` to `v` (in either direction when undirected)
    pub fn has_edge_between(&self, u: usize, v: usize) -> bool {
        self.out_edges[u]
            .iter()
            .any(|&e| {
                (self.sources[e] == u && self.targets[e] == v)
                    || (!self.directed && self.sources[e] == v && self.targets[e] == u)
            })
    }

    /// Validate a vertex index
    pub fn check_vertex(&self, vertex: usize) -> Result<(), GraphError> {
        if vertex < self.vertex_count() {
            Ok(())
        } else {
            Err(GraphError::VertexOutOfRange {
                vertex,
                vertex_count: self.vertex_count(),
            })
        }
    }

    /// Validate an edge index
    pub fn check_edge(&self, edge: usize) -> Result<(), GraphError> {
        if edge < self.edge_count() {
            Ok(())
        } else {
            Err(GraphError::EdgeOutOfRange {
                edge,
                edge_count: self.edge_count(),
            })
        }
    }
}

/// Arcs of a directed `IndexGraph` are its edges.
impl Digraph for IndexGraph {
    type OutArcs<'a> = std::iter::Copied<std::slice::Iter<'a, usize>> where Self: 'a;

    fn vertex_count(&self) -> usize {
        IndexGraph::vertex_count(self)
    }

    fn arc_count(&self) -> usize {
        self.edge_count()
    }

    fn arc_source(&self, arc: usize) -> usize {
        self.sources[arc]
    }

    fn arc_target(&self, arc: usize) -> usize {
        self.targets[arc]
    }

    fn out_arcs(&self, vertex: usize) -> Self::OutArcs<'_> {
        self.out_edges[vertex].iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directed_adjacency() {
        let mut g = IndexGraph::with_vertices(true, 3);
        let e0 = g.add_edge(0, 1).unwrap();
        let e1 = g.add_edge(1, 2).unwrap();

        assert_eq!(g.out_edges(0), &[e0]);
        assert_eq!(g.in_edges(2), &[e1]);
        assert!(g.in_edges(0).is_empty());
        assert!(g.has_edge_between(0, 1));
        assert!(!g.has_edge_between(1, 0));
    }

    #[test]
    fn test_undirected_lists_incident_edges_both_ways() {
        let mut g = IndexGraph::new_undirected();
        let a = g.add_vertex();
        let b = g.add_vertex();
        let e = g.add_edge(a, b).unwrap();

        assert_eq!(g.out_edges(b), &[e]);
        assert_eq!(g.in_edges(a), &[e]);
        assert!(g.has_edge_between(b, a));
        assert_eq!(g.edge_endpoint(e, b).unwrap(), a);
    }

    #[test]
    fn test_self_loop_listed_once() {
        let mut g = IndexGraph::with_vertices(false, 1);
        let e = g.add_edge(0, 0).unwrap();
        assert_eq!(g.out_edges(0), &[e]);
        assert_eq!(g.in_edges(0), &[e]);
    }

    #[test]
    fn test_invalid_indices() {
        let mut g = IndexGraph::with_vertices(true, 2);
        assert_eq!(
            g.add_edge(0, 5),
            Err(GraphError::VertexOutOfRange { vertex: 5, vertex_count: 2 })
        );
        let e = g.add_edge(0, 1).unwrap();
        assert!(matches!(
            g.edge_endpoint(e, 7),
            Err(GraphError::NotAnEndpoint { .. })
        ));
        assert!(g.check_edge(3).is_err());
    }
}
