//! Maximum Flow Solver Contract
//!
//! This module defines the interface every maximum flow implementation
//! satisfies, the configuration that selects one, and the reduction of
//! multi-source multi-sink problems to single-terminal ones.
//!
//! # Theoretical Foundation
//! A problem with source set `S` and sink set `T` is equivalent to a single
//! terminal problem on a graph extended by a super-source `s*` with an arc
//! `s* -> s` for every `s` in `S`, and a super-sink `t*` with an arc
//! `t -> t*` for every `t` in `T`. Each synthetic arc only needs enough
//! capacity to never be the bottleneck:
//!
//! - per-terminal: the total capacity adjacent to that terminal
//! - uniform: `max(sum out-capacity of S, sum in-capacity of T) + 1`
//!
//! Sizing these capacities in integer arithmetic is overflow-checked; an
//! overflow is a fatal error.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashMap;
use std::fmt::Debug;

use log::debug;
use serde::{Deserialize, Serialize};

use super::edmonds_karp::EdmondsKarp;
use super::error::FlowError;
use super::network::{check_vertex, FlowNetwork, FlowValue, Flows, Weights};
use super::push_relabel::PushRelabel;
use crate::algorithm::traits::{Algorithm, AlgorithmError};
use crate::data_structures::graph::IndexGraph;

/// Maximum flow algorithm variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFlowVariant {
    /// Edmonds-Karp with BFS shortest augmenting paths, no residual graph
    EdmondsKarp,
    /// Goldberg-Tarjan push-relabel with FIFO vertex selection
    PushRelabel,
}

impl MaxFlowVariant {
    /// Parameter string of the variant
    pub fn as_str(&self) -> &'static str {
        match self {
            MaxFlowVariant::EdmondsKarp => "edmonds_karp",
            MaxFlowVariant::PushRelabel => "push_relabel",
        }
    }
}

impl std::str::FromStr for MaxFlowVariant {
    type Err = AlgorithmError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "edmonds_karp" => Ok(MaxFlowVariant::EdmondsKarp),
            "push_relabel" => Ok(MaxFlowVariant::PushRelabel),
            _ => Err(AlgorithmError::InvalidParameter {
                name: "algorithm".to_string(),
                reason: format!("unknown max flow algorithm '{}'", value),
            }),
        }
    }
}

/// Configuration shared by every flow-based solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Maximum flow implementation
    pub algorithm: MaxFlowVariant,
    /// Relabel operations between two global relabels (push-relabel only)
    pub global_relabel_frequency: usize,
    /// Evaluate the independent s-t problems of a global minimum cut on the
    /// rayon thread pool
    pub parallel_global_cut: bool,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            algorithm: MaxFlowVariant::PushRelabel,
            global_relabel_frequency: 100,
            parallel_global_cut: false,
        }
    }
}

impl FlowConfig {
    /// Apply a string parameter
    pub fn apply(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError> {
        let invalid = |reason: &str| AlgorithmError::InvalidParameter {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        match name {
            "algorithm" => {
                self.algorithm = value.parse()?;
            }
            "global_relabel_frequency" => {
                let frequency = value
                    .parse::<usize>()
                    .map_err(|_| invalid("must be a positive integer"))?;
                if frequency == 0 {
                    return Err(invalid("must be a positive integer"));
                }
                self.global_relabel_frequency = frequency;
            }
            "parallel_global_cut" => {
                self.parallel_global_cut = value
                    .parse::<bool>()
                    .map_err(|_| invalid("must be 'true' or 'false'"))?;
            }
            _ => return Err(invalid("unknown parameter")),
        }
        Ok(())
    }

    /// All parameters as strings
    pub fn parameters(&self) -> HashMap<String, String> {
        HashMap::from([
            ("algorithm".to_string(), self.algorithm.as_str().to_string()),
            (
                "global_relabel_frequency".to_string(),
                self.global_relabel_frequency.to_string(),
            ),
            (
                "parallel_global_cut".to_string(),
                self.parallel_global_cut.to_string(),
            ),
        ])
    }

    /// Instantiate the configured maximum flow implementation
    pub fn max_flow_algorithm(&self) -> Box<dyn MaxFlowAlgorithm> {
        match self.algorithm {
            MaxFlowVariant::EdmondsKarp => Box::new(EdmondsKarp),
            MaxFlowVariant::PushRelabel => Box::new(PushRelabel::new(self.global_relabel_frequency)),
        }
    }
}

/// Contract of a maximum flow implementation.
///
/// Implementations validate their terminals, write the resulting flow into
/// the network and return its value. Integral capacities must be solved
/// exactly.
pub trait MaxFlowAlgorithm: Debug + Send + Sync {
    /// Human readable name
    fn name(&self) -> &'static str;

    /// Compute a maximum flow from `source` to `sink`
    fn compute_maximum_flow(
        &self,
        network: &mut FlowNetwork<'_>,
        source: usize,
        sink: usize,
    ) -> Result<f64, FlowError>;

    /// Compute a maximum flow from a set of sources to a set of sinks
    fn compute_maximum_flow_multi(
        &self,
        network: &mut FlowNetwork<'_>,
        sources: &[usize],
        sinks: &[usize],
    ) -> Result<f64, FlowError>;
}

/// Validate a single source-sink pair
pub(crate) fn validate_pair(graph: &IndexGraph, source: usize, sink: usize) -> Result<(), FlowError> {
    check_vertex(graph, source)?;
    check_vertex(graph, sink)?;
    if source == sink {
        return Err(FlowError::SourceSinkSame(source));
    }
    Ok(())
}

/// Validate terminal sets: non-empty, in range, no duplicates, disjoint
pub(crate) fn validate_terminals(
    graph: &IndexGraph,
    sources: &[usize],
    sinks: &[usize],
) -> Result<(), FlowError> {
    if sources.is_empty() || sinks.is_empty() {
        return Err(FlowError::EmptyTerminals);
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Role {
        None,
        Source,
        Sink,
    }

    let mut role = vec![Role::None; graph.vertex_count()];
    for &s in sources {
        check_vertex(graph, s)?;
        if role[s] == Role::Source {
            return Err(FlowError::DuplicateTerminal(s));
        }
        role[s] = Role::Source;
    }
    for &t in sinks {
        check_vertex(graph, t)?;
        match role[t] {
            Role::Source => return Err(FlowError::OverlappingTerminals(t)),
            Role::Sink => return Err(FlowError::DuplicateTerminal(t)),
            Role::None => role[t] = Role::Sink,
        }
    }
    Ok(())
}

/// Upper bound of a flow leaving `sources`: the total capacity of their
/// outgoing edges.
///
/// Undirected residual counters span twice an edge capacity, so every such
/// doubled capacity must be representable as well. Panics with an
/// "overflows" message otherwise, which keeps the integer workers free of
/// unchecked overflow.
pub(crate) fn flow_value_bound<T: FlowValue>(
    graph: &IndexGraph,
    capacities: &Weights,
    sources: &[usize],
) -> T {
    if !graph.is_directed() {
        for e in 0..graph.edge_count() {
            T::weight(capacities, e).doubled();
        }
    }
    T::checked_total(sources.iter().flat_map(|&s| {
        graph
            .out_edges(s)
            .iter()
            .filter(|&&e| graph.edge_source(e) != graph.edge_target(e))
            .map(|&e| T::weight(capacities, e))
    }))
}

/// Capacity bounds of the synthetic arcs of a super-terminal reduction
#[derive(Debug, Clone)]
pub(crate) struct TerminalBounds<T> {
    /// Total capacity leaving each source
    pub supply: Vec<T>,
    /// Total capacity entering each sink
    pub demand: Vec<T>,
    /// Capacity no cut through original edges can reach
    pub huge: T,
}

/// Size synthetic terminal arcs from the capacities adjacent to each terminal
pub(crate) fn terminal_bounds<T: FlowValue>(
    graph: &IndexGraph,
    capacities: &Weights,
    sources: &[usize],
    sinks: &[usize],
) -> TerminalBounds<T> {
    let adjacent = |edges: &[usize]| {
        T::checked_total(
            edges
                .iter()
                .filter(|&&e| graph.edge_source(e) != graph.edge_target(e))
                .map(|&e| T::weight(capacities, e))
                .collect::<Vec<T>>(),
        )
    };
    let supply: Vec<T> = sources.iter().map(|&s| adjacent(graph.out_edges(s))).collect();
    let demand: Vec<T> = sinks.iter().map(|&t| adjacent(graph.in_edges(t))).collect();

    let total_supply = T::checked_total(supply.iter().copied());
    let total_demand = T::checked_total(demand.iter().copied());
    let huge = (if total_supply > total_demand { total_supply } else { total_demand }).plus_one();

    TerminalBounds { supply, demand, huge }
}

/// A copy of a graph extended with a super-source and a super-sink
#[derive(Debug, Clone)]
pub(crate) struct ExtendedGraph<T> {
    /// Original edges first (same indices), synthetic edges after them
    pub graph: IndexGraph,
    /// Capacity of every edge of `graph`
    pub capacities: Vec<T>,
    /// Super-source vertex
    pub source: usize,
    /// Super-sink vertex
    pub sink: usize,
    /// Number of original edges
    pub original_edges: usize,
}

impl<T: FlowValue> ExtendedGraph<T> {
    /// Extend `graph` with `s* -> v` arcs for `source_arcs` and `v -> t*`
    /// arcs for `sink_arcs`, each with the given capacity
    pub fn new(
        graph: &IndexGraph,
        capacities: &Weights,
        source_arcs: &[(usize, T)],
        sink_arcs: &[(usize, T)],
    ) -> Self {
        let n = graph.vertex_count();
        let m = graph.edge_count();
        let mut extended = IndexGraph::with_vertices(graph.is_directed(), n + 2);
        let mut caps = Vec::with_capacity(m + source_arcs.len() + sink_arcs.len());
        let (source, sink) = (n, n + 1);

        let mut push = |g: &mut IndexGraph, u: usize, v: usize, cap: T| {
            // endpoints were validated against the original graph
            let added = g.add_edge(u, v);
            debug_assert_eq!(added, Ok(caps.len()));
            caps.push(cap);
        };
        for e in 0..m {
            push(&mut extended, graph.edge_source(e), graph.edge_target(e), T::weight(capacities, e));
        }
        for &(v, cap) in source_arcs {
            push(&mut extended, source, v, cap);
        }
        for &(v, cap) in sink_arcs {
            push(&mut extended, v, sink, cap);
        }

        Self {
            graph: extended,
            capacities: caps,
            source,
            sink,
            original_edges: m,
        }
    }

    /// Extend `graph` for a multi-terminal maximum flow
    pub fn for_terminals(
        graph: &IndexGraph,
        capacities: &Weights,
        sources: &[usize],
        sinks: &[usize],
    ) -> Self {
        let bounds = terminal_bounds::<T>(graph, capacities, sources, sinks);
        let source_arcs: Vec<(usize, T)> = sources.iter().copied().zip(bounds.supply).collect();
        let sink_arcs: Vec<(usize, T)> = sinks.iter().copied().zip(bounds.demand).collect();
        Self::new(graph, capacities, &source_arcs, &sink_arcs)
    }

    /// Keep only the entries of the original edges
    pub fn original_flows(&self, mut flows: Vec<T>) -> Vec<T> {
        flows.truncate(self.original_edges);
        flows
    }

    /// Restrict a flow on the extended graph to the original edges
    pub fn project(&self, flows: &Flows) -> Flows {
        match flows {
            Flows::Int(f) => Flows::Int(f[..self.original_edges].to_vec()),
            Flows::Real(f) => Flows::Real(f[..self.original_edges].to_vec()),
        }
    }
}

/// Maximum flow value together with the network holding the flow
#[derive(Debug, Clone)]
pub struct MaxFlowResult<'g> {
    /// Value of the maximum flow
    pub value: f64,
    /// Network carrying the computed flow
    pub network: FlowNetwork<'g>,
}

/// Maximum flow solver selecting its implementation from a [`FlowConfig`]
#[derive(Debug, Clone)]
pub struct MaxFlowSolver {
    /// Solver configuration
    config: FlowConfig,
    /// String view of the configuration
    parameters: HashMap<String, String>,
}

impl Default for MaxFlowSolver {
    fn default() -> Self {
        Self::new(FlowConfig::default())
    }
}

impl MaxFlowSolver {
    /// Create a solver with the given configuration
    pub fn new(config: FlowConfig) -> Self {
        let parameters = config.parameters();
        Self { config, parameters }
    }

    /// Create a solver using a specific implementation
    pub fn with_variant(algorithm: MaxFlowVariant) -> Self {
        Self::new(FlowConfig {
            algorithm,
            ..FlowConfig::default()
        })
    }

    /// Active configuration
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Compute a maximum flow from `source` to `sink`
    pub fn compute_maximum_flow<'g>(
        &self,
        graph: &'g IndexGraph,
        capacities: Weights,
        source: usize,
        sink: usize,
    ) -> Result<MaxFlowResult<'g>, FlowError> {
        let mut network = FlowNetwork::new(graph, capacities)?;
        let algorithm = self.config.max_flow_algorithm();
        let value = algorithm.compute_maximum_flow(&mut network, source, sink)?;
        debug!(
            "{}: max flow {} -> {} = {} (n = {}, m = {})",
            algorithm.name(),
            source,
            sink,
            value,
            graph.vertex_count(),
            graph.edge_count()
        );
        Ok(MaxFlowResult { value, network })
    }

    /// Compute a maximum flow from `sources` to `sinks`
    pub fn compute_maximum_flow_multi<'g>(
        &self,
        graph: &'g IndexGraph,
        capacities: Weights,
        sources: &[usize],
        sinks: &[usize],
    ) -> Result<MaxFlowResult<'g>, FlowError> {
        let mut network = FlowNetwork::new(graph, capacities)?;
        let algorithm = self.config.max_flow_algorithm();
        let value = algorithm.compute_maximum_flow_multi(&mut network, sources, sinks)?;
        debug!(
            "{}: max flow {:?} -> {:?} = {}",
            algorithm.name(),
            sources,
            sinks,
            value
        );
        Ok(MaxFlowResult { value, network })
    }
}

impl Algorithm for MaxFlowSolver {
    fn name(&self) -> &str {
        match self.config.algorithm {
            MaxFlowVariant::EdmondsKarp => "Edmonds-Karp",
            MaxFlowVariant::PushRelabel => "Push-Relabel FIFO",
        }
    }

    fn category(&self) -> &str {
        "max_flow"
    }

    fn description(&self) -> &str {
        "Maximum flow by BFS augmenting paths or FIFO push-relabel with gap and global relabel heuristics."
    }

    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError> {
        self.config.apply(name, value)?;
        self.parameters.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn get_parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(|s| s.as_str())
    }

    fn get_parameters(&self) -> HashMap<String, String> {
        self.parameters.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// s=0, a=1, b=2, t=3 with capacities s->a 10, s->b 5, a->b 15, a->t 5, b->t 10.
    /// Every s-t cut weighs at least 15 ({s} and {s,a,b} both do), so the
    /// maximum flow is 15.
    fn diamond() -> (IndexGraph, Weights) {
        let mut g = IndexGraph::with_vertices(true, 4);
        for (u, v) in [(0, 1), (0, 2), (1, 2), (1, 3), (2, 3)] {
            g.add_edge(u, v).unwrap();
        }
        (g, Weights::Int(vec![10, 5, 15, 5, 10]))
    }

    #[test]
    fn test_diamond_value_for_every_variant() {
        let (g, caps) = diamond();
        for variant in [MaxFlowVariant::EdmondsKarp, MaxFlowVariant::PushRelabel] {
            let solver = MaxFlowSolver::with_variant(variant);
            let result = solver.compute_maximum_flow(&g, caps.clone(), 0, 3).unwrap();
            assert_eq!(result.value, 15.0, "{:?}", variant);
            assert_eq!(result.network.flow_sum(&[0]).unwrap(), 15.0);
            assert!(matches!(result.network.flows(), Flows::Int(_)));
        }
    }

    #[test]
    fn test_terminal_validation() {
        let (g, caps) = diamond();
        let solver = MaxFlowSolver::default();

        assert_eq!(
            solver.compute_maximum_flow(&g, caps.clone(), 2, 2).unwrap_err(),
            FlowError::SourceSinkSame(2)
        );
        assert_eq!(
            solver.compute_maximum_flow(&g, caps.clone(), 0, 9).unwrap_err(),
            FlowError::InvalidVertex { vertex: 9, vertex_count: 4 }
        );
        assert_eq!(
            solver.compute_maximum_flow_multi(&g, caps.clone(), &[], &[3]).unwrap_err(),
            FlowError::EmptyTerminals
        );
        assert_eq!(
            solver.compute_maximum_flow_multi(&g, caps.clone(), &[0, 0], &[3]).unwrap_err(),
            FlowError::DuplicateTerminal(0)
        );
        assert_eq!(
            solver.compute_maximum_flow_multi(&g, caps.clone(), &[0, 1], &[1, 3]).unwrap_err(),
            FlowError::OverlappingTerminals(1)
        );
        assert!(matches!(
            solver.compute_maximum_flow(&g, Weights::Int(vec![1, 1, -1, 1, 1]), 0, 3),
            Err(FlowError::NegativeCapacity { index: 2, .. })
        ));
    }

    #[test]
    fn test_terminal_bounds() {
        let (g, caps) = diamond();
        let bounds = terminal_bounds::<i64>(&g, &caps, &[0, 1], &[3]);
        assert_eq!(bounds.supply, vec![15, 20]);
        assert_eq!(bounds.demand, vec![15]);
        assert_eq!(bounds.huge, 36);
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn test_terminal_bounds_overflow_panics() {
        let mut g = IndexGraph::with_vertices(true, 3);
        g.add_edge(0, 1).unwrap();
        g.add_edge(0, 2).unwrap();
        terminal_bounds::<i64>(&g, &Weights::Int(vec![i64::MAX, i64::MAX]), &[0], &[1, 2]);
    }

    #[test]
    fn test_flow_value_bound() {
        let (g, caps) = diamond();
        assert_eq!(flow_value_bound::<i64>(&g, &caps, &[0]), 15);
        assert_eq!(flow_value_bound::<i64>(&g, &caps, &[0, 1]), 35);

        let mut u = IndexGraph::with_vertices(false, 2);
        u.add_edge(0, 1).unwrap();
        u.add_edge(1, 1).unwrap();
        assert_eq!(flow_value_bound::<i64>(&u, &Weights::Int(vec![4, 9]), &[1]), 4);
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn test_flow_value_bound_overflow_panics() {
        let (g, _) = diamond();
        let big = i64::MAX / 2 + 10;
        flow_value_bound::<i64>(&g, &Weights::Int(vec![big, big, 1, 1, 1]), &[0]);
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn test_undirected_doubling_overflow_panics() {
        let mut g = IndexGraph::with_vertices(false, 3);
        g.add_edge(0, 1).unwrap();
        g.add_edge(1, 2).unwrap();
        flow_value_bound::<i64>(&g, &Weights::Int(vec![1, i64::MAX / 2 + 1]), &[0]);
    }

    #[test]
    fn test_default_reports_every_parameter() {
        let solver = MaxFlowSolver::default();
        assert_eq!(solver.get_parameters(), FlowConfig::default().parameters());
        assert_eq!(solver.get_parameter("algorithm"), Some("push_relabel"));
        assert_eq!(solver.get_parameter("global_relabel_frequency"), Some("100"));
        assert_eq!(solver.get_parameter("parallel_global_cut"), Some("false"));
    }

    #[test]
    fn test_parameters() {
        let mut solver = MaxFlowSolver::default();
        assert_eq!(solver.category(), "max_flow");
        assert_eq!(solver.name(), "Push-Relabel FIFO");

        solver.set_parameter("algorithm", "edmonds_karp").unwrap();
        assert_eq!(solver.name(), "Edmonds-Karp");
        assert_eq!(solver.get_parameter("algorithm"), Some("edmonds_karp"));

        solver.set_parameter("global_relabel_frequency", "50").unwrap();
        assert_eq!(solver.config().global_relabel_frequency, 50);

        assert!(solver.set_parameter("global_relabel_frequency", "0").is_err());
        assert!(solver.set_parameter("algorithm", "dinic").is_err());
        assert!(solver.set_parameter("invalid_param", "value").is_err());
        assert_eq!(solver.get_parameters().len(), 3);
    }

    #[test]
    fn test_config_serde() {
        let config: FlowConfig = serde_json::from_str(r#"{"algorithm": "edmonds_karp"}"#).unwrap();
        assert_eq!(config.algorithm, MaxFlowVariant::EdmondsKarp);
        assert_eq!(config.global_relabel_frequency, 100);
        assert!(!config.parallel_global_cut);
    }
}
