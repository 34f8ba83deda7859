//! Netflow core - network flow and cut engine
//!
//! Maximum flow (Edmonds-Karp, FIFO push-relabel), minimum edge and vertex
//! cuts (s-t, multi-terminal, global, all minimum cuts) and minimum cost flow
//! by minimum mean cycle canceling, over an index-based graph store.
//!
//! Solvers share a [`FlowConfig`](algorithm::graph::flow::FlowConfig) and the
//! [`Algorithm`](algorithm::traits::Algorithm) parameter interface. Integral
//! capacities are solved in exact `i64` arithmetic; real capacities use the
//! tolerance [`EPS`](algorithm::graph::flow::EPS).
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod algorithm;
pub mod data_structures;

pub use algorithm::graph::flow::{
    Cut, FlowConfig, FlowError, FlowNetwork, Flows, MaxFlowSolver, MaxFlowVariant, MinCostFlowSolver,
    MinimumEdgeCut, MinimumVertexCut, Weights,
};
pub use algorithm::traits::{Algorithm, AlgorithmError};
pub use data_structures::graph::{Digraph, GraphError, IndexGraph};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
