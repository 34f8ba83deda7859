//! Network flow algorithms: maximum flow, minimum edge and vertex cuts,
//! minimum cost flow
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod error;
pub mod network;
pub mod residual;
pub mod max_flow;
pub mod edmonds_karp;
pub mod push_relabel;
pub mod min_cut;
pub mod vertex_cut;
pub mod min_cost;

pub use self::edmonds_karp::EdmondsKarp;
pub use self::error::FlowError;
pub use self::max_flow::{FlowConfig, MaxFlowAlgorithm, MaxFlowResult, MaxFlowSolver, MaxFlowVariant};
pub use self::min_cost::{MinCostFlowResult, MinCostFlowSolver};
pub use self::min_cut::{min_cut_from_flow, Cut, MinimumEdgeCut};
pub use self::network::{FlowNetwork, FlowValue, Flows, Weights, EPS};
pub use self::push_relabel::PushRelabel;
pub use self::residual::{ResidualGraph, ResidualGraphBuilder};
pub use self::vertex_cut::{AuxiliaryGraph, MinimumVertexCut};
