//! Minimum Edge Cut Extractor
//!
//! Derives minimum edge cuts from maximum flows: single pair, terminal sets,
//! global (no terminals), and the enumeration of every minimum s-t cut.
//!
//! # Theoretical Foundation
//! After a maximum flow, the vertices reachable from the sources through
//! non-saturated residual arcs form the source side of a minimum cut, and
//! the total capacity of the edges leaving that side equals the flow value
//! (max-flow min-cut duality).
//!
//! ## Enumerating All Minimum Cuts
//! Picard and Queyranne showed that the source sides of all minimum s-t cuts
//! are exactly the sets `R + C`, where `R` is the set reachable from `s` in
//! the residual graph and `C` is a closed set (closed under residual
//! successors) of the residual graph restricted to the vertices that neither
//! `s` reaches nor can reach `t`. Closed sets are unions of strongly connected
//! components closed in the condensation DAG, enumerated here by
//! include/exclude backtracking in successor-first order.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::{HashMap, VecDeque};

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::FlowError;
use super::max_flow::{FlowConfig, MaxFlowSolver};
use super::network::{FlowNetwork, Weights, EPS};
use super::residual::ResidualGraphBuilder;
use crate::algorithm::graph::scc::StronglyConnectedComponents;
use crate::algorithm::traits::{Algorithm, AlgorithmError};
use crate::data_structures::graph::{Digraph, IndexGraph};

/// A bipartition of the vertices into a source side and a sink side
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cut {
    /// `true` for vertices on the source side
    source_side: Vec<bool>,
}

impl Cut {
    /// Build a cut from a source-side membership vector
    pub fn from_source_side(source_side: Vec<bool>) -> Self {
        Self { source_side }
    }

    /// Whether `vertex` is on the source side
    #[inline]
    pub fn is_source_side(&self, vertex: usize) -> bool {
        self.source_side[vertex]
    }

    /// Vertices on the source side, ascending
    pub fn source_vertices(&self) -> Vec<usize> {
        (0..self.source_side.len()).filter(|&v| self.source_side[v]).collect()
    }

    /// Vertices on the sink side, ascending
    pub fn sink_vertices(&self) -> Vec<usize> {
        (0..self.source_side.len()).filter(|&v| !self.source_side[v]).collect()
    }

    /// Edges crossing the cut: source side to sink side when directed, any
    /// crossing edge when undirected
    pub fn cross_edges(&self, graph: &IndexGraph) -> Vec<usize> {
        (0..graph.edge_count())
            .filter(|&e| {
                let (u, v) = (graph.edge_source(e), graph.edge_target(e));
                match (self.source_side[u], self.source_side[v]) {
                    (true, false) => true,
                    (false, true) => !graph.is_directed(),
                    _ => false,
                }
            })
            .collect()
    }

    /// Total weight of the cross edges
    pub fn weight(&self, graph: &IndexGraph, weights: &Weights) -> f64 {
        self.cross_edges(graph).into_iter().map(|e| weights.get(e)).sum()
    }
}

/// Source side of a minimum cut, read off a completed maximum flow.
///
/// Breadth-first search from `sources` through arcs whose residual capacity
/// is at least [`EPS`]. Running it twice on the same flow gives the same cut.
pub fn min_cut_from_flow(network: &FlowNetwork<'_>, sources: &[usize]) -> Cut {
    let graph = network.graph();
    let capacities = network.capacities();
    let flows = network.flows();

    let mut visited = vec![false; graph.vertex_count()];
    let mut queue = VecDeque::new();
    for &s in sources {
        if !visited[s] {
            visited[s] = true;
            queue.push_back(s);
        }
    }

    while let Some(u) = queue.pop_front() {
        for &e in graph.out_edges(u) {
            let v = graph.opposite(e, u);
            if visited[v] {
                continue;
            }
            // flow re-projected onto the u -> v direction
            let directed_flow = if graph.edge_source(e) == u {
                flows.get(e)
            } else {
                -flows.get(e)
            };
            if (capacities.get(e) - directed_flow).abs() < EPS {
                continue;
            }
            visited[v] = true;
            queue.push_back(v);
        }
        if graph.is_directed() {
            for &e in graph.in_edges(u) {
                let v = graph.edge_source(e);
                if visited[v] || flows.get(e) < EPS {
                    continue;
                }
                visited[v] = true;
                queue.push_back(v);
            }
        }
    }

    Cut::from_source_side(visited)
}

/// Minimum edge cut solver built on a maximum flow implementation
#[derive(Debug, Clone)]
pub struct MinimumEdgeCut {
    /// Solver configuration
    config: FlowConfig,
    /// String view of the configuration
    parameters: HashMap<String, String>,
}

impl Default for MinimumEdgeCut {
    fn default() -> Self {
        Self::new(FlowConfig::default())
    }
}

impl MinimumEdgeCut {
    /// Create a solver with the given configuration
    pub fn new(config: FlowConfig) -> Self {
        let parameters = config.parameters();
        Self { config, parameters }
    }

    /// Active configuration
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    fn max_flow(&self) -> MaxFlowSolver {
        MaxFlowSolver::new(self.config.clone())
    }

    /// Minimum cut separating `source` from `sink`
    pub fn compute_minimum_cut(
        &self,
        graph: &IndexGraph,
        weights: &Weights,
        source: usize,
        sink: usize,
    ) -> Result<Cut, FlowError> {
        let result = self.max_flow().compute_maximum_flow(graph, weights.clone(), source, sink)?;
        Ok(min_cut_from_flow(&result.network, &[source]))
    }

    /// Minimum cut separating every source from every sink
    pub fn compute_minimum_cut_multi(
        &self,
        graph: &IndexGraph,
        weights: &Weights,
        sources: &[usize],
        sinks: &[usize],
    ) -> Result<Cut, FlowError> {
        let result = self
            .max_flow()
            .compute_maximum_flow_multi(graph, weights.clone(), sources, sinks)?;
        Ok(min_cut_from_flow(&result.network, sources))
    }

    /// Minimum cut over all bipartitions.
    ///
    /// Vertex 0 is fixed on the source side and every other vertex is tried
    /// as the sink; directed graphs also try every other vertex as the source
    /// with vertex 0 as the sink. The first cut of minimum weight wins.
    pub fn compute_global_minimum_cut(&self, graph: &IndexGraph, weights: &Weights) -> Result<Cut, FlowError> {
        let n = graph.vertex_count();
        if n < 2 {
            return Err(FlowError::TooFewVertices(n));
        }
        weights.validate_capacities(graph.edge_count())?;

        let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(2 * n);
        for v in 1..n {
            pairs.push((0, v));
            if graph.is_directed() {
                pairs.push((v, 0));
            }
        }

        let solve = |&(s, t): &(usize, usize)| -> Result<(f64, Cut), FlowError> {
            let cut = self.compute_minimum_cut(graph, weights, s, t)?;
            Ok((cut.weight(graph, weights), cut))
        };
        let candidates: Vec<(f64, Cut)> = if self.config.parallel_global_cut {
            pairs.par_iter().map(solve).collect::<Result<_, _>>()?
        } else {
            pairs.iter().map(solve).collect::<Result<_, _>>()?
        };

        let mut best: Option<(f64, Cut)> = None;
        for (weight, cut) in candidates {
            if best.as_ref().map_or(true, |(w, _)| weight < *w) {
                best = Some((weight, cut));
            }
        }
        let (weight, cut) = best.ok_or(FlowError::TooFewVertices(n))?;
        debug!("global minimum cut: weight {} over {} s-t problems", weight, pairs.len());
        Ok(cut)
    }

    /// Every minimum cut separating `source` from `sink`; the first one is
    /// the cut closest to the source
    pub fn all_minimum_cuts(
        &self,
        graph: &IndexGraph,
        weights: &Weights,
        source: usize,
        sink: usize,
    ) -> Result<Vec<Cut>, FlowError> {
        let result = self.max_flow().compute_maximum_flow(graph, weights.clone(), source, sink)?;
        let cuts = enumerate_minimum_cuts(&result.network, source, sink);
        debug!("{} minimum cuts between {} and {}", cuts.len(), source, sink);
        Ok(cuts)
    }
}

/// Picard-Queyranne enumeration over a completed maximum flow
fn enumerate_minimum_cuts(network: &FlowNetwork<'_>, source: usize, sink: usize) -> Vec<Cut> {
    let graph = network.graph();
    let n = graph.vertex_count();
    let mut builder = ResidualGraphBuilder::new(graph);
    builder.add_all_original_edges();
    let residual = builder.build();

    let positive: Vec<bool> = (0..residual.arc_count())
        .map(|a| {
            let Some(e) = residual.edge_ref(a) else { return false };
            let cap = network.capacities().get(e);
            let flow = network.flows().get(e);
            let r = match (residual.is_forward(a), graph.is_directed()) {
                (true, _) => cap - flow,
                (false, true) => flow,
                (false, false) => cap + flow,
            };
            r >= EPS
        })
        .collect();

    // reachable from the source
    let mut reachable = vec![false; n];
    reachable[source] = true;
    let mut queue = VecDeque::from([source]);
    while let Some(u) = queue.pop_front() {
        for a in residual.out_arcs(u) {
            let v = residual.arc_target(a);
            if positive[a] && !reachable[v] {
                reachable[v] = true;
                queue.push_back(v);
            }
        }
    }

    // able to reach the sink: walk twins of positive arcs backwards
    let mut reaches_sink = vec![false; n];
    reaches_sink[sink] = true;
    queue.push_back(sink);
    while let Some(v) = queue.pop_front() {
        for a in residual.out_arcs(v) {
            let back = residual.twin(a);
            let u = residual.arc_target(a);
            if positive[back] && !reaches_sink[u] {
                reaches_sink[u] = true;
                queue.push_back(u);
            }
        }
    }

    let free: Vec<bool> = (0..n).map(|v| !reachable[v] && !reaches_sink[v]).collect();
    let scc = StronglyConnectedComponents::compute_filtered(&residual, |a| {
        positive[a] && free[residual.arc_source(a)] && free[residual.arc_target(a)]
    });

    // free components and their successors, in emission (successor-first) order
    let free_components: Vec<usize> = (0..scc.len()).filter(|&c| free[scc.components[c][0]]).collect();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); scc.len()];
    for a in 0..residual.arc_count() {
        let (u, v) = (residual.arc_source(a), residual.arc_target(a));
        if positive[a] && free[u] && free[v] {
            let (cu, cv) = (scc.component_of[u], scc.component_of[v]);
            if cu != cv && !successors[cu].contains(&cv) {
                successors[cu].push(cv);
            }
        }
    }

    let mut cuts = Vec::new();
    let mut included = vec![false; scc.len()];
    enumerate_closures(&free_components, 0, &successors, &mut included, &mut |included: &[bool]| {
        let mut side = reachable.clone();
        for &c in &free_components {
            if included[c] {
                for &v in &scc.components[c] {
                    side[v] = true;
                }
            }
        }
        cuts.push(Cut::from_source_side(side));
    });
    cuts
}

/// Include/exclude backtracking over components ordered successors first; a
/// component may only be included when all of its successors are
fn enumerate_closures(
    order: &[usize],
    position: usize,
    successors: &[Vec<usize>],
    included: &mut [bool],
    emit: &mut impl FnMut(&[bool]),
) {
    if position == order.len() {
        emit(included);
        return;
    }
    let c = order[position];
    enumerate_closures(order, position + 1, successors, included, emit);
    if successors[c].iter().all(|&d| included[d]) {
        included[c] = true;
        enumerate_closures(order, position + 1, successors, included, emit);
        included[c] = false;
    }
}

impl Algorithm for MinimumEdgeCut {
    fn name(&self) -> &str {
        "Minimum Edge Cut"
    }

    fn category(&self) -> &str {
        "min_cut"
    }

    fn description(&self) -> &str {
        "Minimum edge cuts from maximum flows: s-t, terminal sets, global, and enumeration of all minimum s-t cuts."
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
    use crate::algorithm::graph::flow::max_flow::MaxFlowVariant;

    fn directed(n: usize, edges: &[(usize, usize)]) -> IndexGraph {
        let mut g = IndexGraph::with_vertices(true, n);
        for &(u, v) in edges {
            g.add_edge(u, v).unwrap();
        }
        g
    }

    fn undirected(n: usize, edges: &[(usize, usize)]) -> IndexGraph {
        let mut g = IndexGraph::with_vertices(false, n);
        for &(u, v) in edges {
            g.add_edge(u, v).unwrap();
        }
        g
    }

    #[test]
    fn test_diamond_cut_matches_flow_value() {
        // s=0 a=1 b=2 t=3
        let g = directed(4, &[(0, 1), (0, 2), (1, 3), (2, 3), (1, 2)]);
        let w = Weights::Int(vec![10, 5, 5, 10, 15]);
        for variant in [MaxFlowVariant::EdmondsKarp, MaxFlowVariant::PushRelabel] {
            let config = FlowConfig {
                algorithm: variant,
                ..FlowConfig::default()
            };
            let flow = MaxFlowSolver::new(config.clone())
                .compute_maximum_flow(&g, w.clone(), 0, 3)
                .unwrap();
            let cut = MinimumEdgeCut::new(config).compute_minimum_cut(&g, &w, 0, 3).unwrap();

            assert!(cut.is_source_side(0));
            assert!(!cut.is_source_side(3));
            assert_eq!(cut.weight(&g, &w), flow.value);
        }
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let g = directed(4, &[(0, 1), (0, 2), (1, 3), (2, 3), (1, 2)]);
        let w = Weights::Int(vec![10, 5, 5, 10, 15]);
        let flow = MaxFlowSolver::default().compute_maximum_flow(&g, w, 0, 3).unwrap();
        let first = min_cut_from_flow(&flow.network, &[0]);
        let second = min_cut_from_flow(&flow.network, &[0]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_undirected_cut_counts_both_directions() {
        // path 0 - 1 - 2 with edge 1-2 stored backwards as 2-1
        let g = undirected(3, &[(0, 1), (2, 1)]);
        let w = Weights::Real(vec![4.0, 1.5]);
        let cut = MinimumEdgeCut::default().compute_minimum_cut(&g, &w, 0, 2).unwrap();
        assert_eq!(cut.source_vertices(), vec![0, 1]);
        assert_eq!(cut.sink_vertices(), vec![2]);
        assert_eq!(cut.cross_edges(&g), vec![1]);
    }

    #[test]
    fn test_multi_terminal_cut() {
        let g = directed(5, &[(0, 2), (1, 2), (2, 3), (2, 4)]);
        let w = Weights::Int(vec![3, 4, 2, 10]);
        let cut = MinimumEdgeCut::default()
            .compute_minimum_cut_multi(&g, &w, &[0, 1], &[3, 4])
            .unwrap();
        assert!(cut.is_source_side(0) && cut.is_source_side(1));
        assert!(!cut.is_source_side(3) && !cut.is_source_side(4));
        assert_eq!(cut.weight(&g, &w), 7.0);
    }

    #[test]
    fn test_global_cut_undirected() {
        // two triangles joined by a single light edge
        let g = undirected(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (2, 3)]);
        let w = Weights::Int(vec![5, 5, 5, 5, 5, 5, 1]);
        for parallel in [false, true] {
            let solver = MinimumEdgeCut::new(FlowConfig {
                parallel_global_cut: parallel,
                ..FlowConfig::default()
            });
            let cut = solver.compute_global_minimum_cut(&g, &w).unwrap();
            assert_eq!(cut.weight(&g, &w), 1.0);
            assert_eq!(cut.source_vertices(), vec![0, 1, 2]);
        }
    }

    #[test]
    fn test_global_cut_directed_with_vertex_zero_on_sink_side() {
        // only 1 -> 0 is light; cuts with 0 on the source side cost 5
        let g = directed(2, &[(0, 1), (1, 0)]);
        let w = Weights::Int(vec![5, 1]);
        let cut = MinimumEdgeCut::default().compute_global_minimum_cut(&g, &w).unwrap();
        assert_eq!(cut.weight(&g, &w), 1.0);
        assert!(cut.is_source_side(1));
    }

    #[test]
    fn test_global_cut_needs_two_vertices() {
        let g = directed(1, &[]);
        assert_eq!(
            MinimumEdgeCut::default()
                .compute_global_minimum_cut(&g, &Weights::Cardinality)
                .unwrap_err(),
            FlowError::TooFewVertices(1)
        );
    }

    #[test]
    fn test_all_minimum_cuts_of_unit_path() {
        // 0 -> 1 -> 2 -> 3 with unit capacities: three minimum cuts
        let g = directed(4, &[(0, 1), (1, 2), (2, 3)]);
        let cuts = MinimumEdgeCut::default()
            .all_minimum_cuts(&g, &Weights::Cardinality, 0, 3)
            .unwrap();
        let sides: Vec<Vec<usize>> = cuts.iter().map(|c| c.source_vertices()).collect();
        assert_eq!(sides.len(), 3);
        assert_eq!(sides[0], vec![0]);
        assert!(sides.contains(&vec![0, 1]));
        assert!(sides.contains(&vec![0, 1, 2]));
        for cut in &cuts {
            assert_eq!(cut.weight(&g, &Weights::Cardinality), 1.0);
        }
    }

    #[test]
    fn test_all_minimum_cuts_parallel_branches() {
        // two independent unit paths 0->1->3 and 0->2->3: 2 x 2 minimum cuts
        let g = directed(4, &[(0, 1), (1, 3), (0, 2), (2, 3)]);
        let cuts = MinimumEdgeCut::default()
            .all_minimum_cuts(&g, &Weights::Cardinality, 0, 3)
            .unwrap();
        assert_eq!(cuts.len(), 4);
        for cut in &cuts {
            assert_eq!(cut.weight(&g, &Weights::Cardinality), 2.0);
        }
    }

    #[test]
    fn test_default_parameters() {
        let mut solver = MinimumEdgeCut::default();
        assert_eq!(solver.get_parameters(), FlowConfig::default().parameters());
        assert_eq!(solver.get_parameter("algorithm"), Some("push_relabel"));

        solver.set_parameter("parallel_global_cut", "true").unwrap();
        assert!(solver.config().parallel_global_cut);
        assert_eq!(solver.get_parameters().len(), 3);
    }
}
