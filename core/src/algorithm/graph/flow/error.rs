//! Flow algorithm errors
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use thiserror::Error;

use crate::data_structures::graph::GraphError;

/// Errors raised by flow network construction and the flow solvers.
///
/// Every solver validates its input before touching any state, so an error
/// never leaves a partially computed flow behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    #[error("Invalid vertex {vertex} (graph has {vertex_count} vertices)")]
    InvalidVertex { vertex: usize, vertex_count: usize },

    #[error("Invalid edge {edge} (graph has {edge_count} edges)")]
    InvalidEdge { edge: usize, edge_count: usize },

    #[error("Source and sink are the same vertex {0}")]
    SourceSinkSame(usize),

    #[error("Terminal set is empty")]
    EmptyTerminals,

    #[error("Vertex {0} appears more than once in a terminal set")]
    DuplicateTerminal(usize),

    #[error("Vertex {0} is both a source and a sink")]
    OverlappingTerminals(usize),

    #[error("Negative capacity {capacity} on index {index}")]
    NegativeCapacity { index: usize, capacity: f64 },

    #[error("Weight function has {actual} entries but {expected} are required")]
    WeightsLengthMismatch { expected: usize, actual: usize },

    #[error("Illegal flow {flow} on edge {edge} with capacity {capacity}")]
    IllegalFlow { edge: usize, flow: f64, capacity: f64 },

    #[error("Operation requires a directed graph")]
    UndirectedGraph,

    #[error("Graph has {0} vertices, at least 2 are required")]
    TooFewVertices(usize),

    #[error("Supplies sum to {0}, expected 0")]
    UnbalancedSupply(f64),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Supplies cannot be routed: {routed} of {required} units fit the network")]
    InfeasibleSupply { routed: f64, required: f64 },
}
