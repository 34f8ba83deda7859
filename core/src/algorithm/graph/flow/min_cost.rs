//! Minimum Cost Flow by Cycle Canceling
//!
//! Starts from a maximum flow and repeatedly cancels the minimum mean cycle
//! of the cost-weighted residual graph until no negative cycle remains.
//!
//! # Theoretical Foundation
//! A feasible flow has minimum cost among flows of the same value iff its
//! residual graph contains no negative cost cycle. Pushing the bottleneck
//! residual capacity around a negative cycle keeps the value, keeps the
//! flow feasible and strictly lowers the cost. Choosing the minimum mean
//! cycle every time (Goldberg-Tarjan) bounds the number of iterations
//! polynomially.
//!
//! ## Saturated Arcs
//! Arcs without residual capacity stay in the residual graph but weigh
//! `huge_cost = 1 + sum |cost(e)|`, which no simple cycle of unsaturated arcs
//! can compensate. A cycle through a saturated arc is therefore never
//! negative, and the graph structure never has to be rebuilt.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashMap;

use log::{debug, trace};

use super::error::FlowError;
use super::max_flow::{terminal_bounds, validate_pair, validate_terminals, ExtendedGraph, FlowConfig};
use super::network::{FlowNetwork, FlowValue, Flows, Weights, EPS};
use super::residual::ResidualGraphBuilder;
use crate::algorithm::graph::min_mean_cycle::MinimumMeanCycle;
use crate::algorithm::traits::{Algorithm, AlgorithmError};
use crate::data_structures::graph::{Digraph, IndexGraph};

/// Minimum cost flow together with the network holding the flow
#[derive(Debug, Clone)]
pub struct MinCostFlowResult<'g> {
    /// Value of the flow
    pub value: f64,
    /// Total cost `sum f(e) * cost(e)`
    pub total_cost: f64,
    /// Number of negative cycles canceled
    pub cancelled_cycles: usize,
    /// Network carrying the computed flow
    pub network: FlowNetwork<'g>,
}

/// Minimum cost flow solver
#[derive(Debug, Clone)]
pub struct MinCostFlowSolver {
    /// Solver configuration, selects the initial maximum flow algorithm
    config: FlowConfig,
    /// String view of the configuration
    parameters: HashMap<String, String>,
}

impl Default for MinCostFlowSolver {
    fn default() -> Self {
        Self::new(FlowConfig::default())
    }
}

impl MinCostFlowSolver {
    /// Create a solver with the given configuration
    pub fn new(config: FlowConfig) -> Self {
        let parameters = config.parameters();
        Self { config, parameters }
    }

    /// Active configuration
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Maximum flow from `source` to `sink` of minimum total cost
    pub fn compute_min_cost_max_flow<'g>(
        &self,
        graph: &'g IndexGraph,
        capacities: Weights,
        costs: &Weights,
        source: usize,
        sink: usize,
    ) -> Result<MinCostFlowResult<'g>, FlowError> {
        check_input(graph, costs)?;
        validate_pair(graph, source, sink)?;
        let mut network = FlowNetwork::new(graph, capacities)?;

        let value = self
            .config
            .max_flow_algorithm()
            .compute_maximum_flow(&mut network, source, sink)?;
        let cancelled_cycles = if network.capacities().is_integral() {
            cancel_in_place::<i64>(&mut network, costs)
        } else {
            cancel_in_place::<f64>(&mut network, costs)
        };

        self.finish(network, costs, value, cancelled_cycles)
    }

    /// Maximum flow from `sources` to `sinks` of minimum total cost
    pub fn compute_min_cost_max_flow_multi<'g>(
        &self,
        graph: &'g IndexGraph,
        capacities: Weights,
        costs: &Weights,
        sources: &[usize],
        sinks: &[usize],
    ) -> Result<MinCostFlowResult<'g>, FlowError> {
        check_input(graph, costs)?;
        validate_terminals(graph, sources, sinks)?;
        let mut network = FlowNetwork::new(graph, capacities)?;

        let free = |e: usize| if e < graph.edge_count() { costs.get(e) } else { 0.0 };
        let (value, cancelled_cycles) = if network.capacities().is_integral() {
            let extended = ExtendedGraph::<i64>::for_terminals(graph, network.capacities(), sources, sinks);
            let (value, cancelled, flows) = self.solve_extended(&extended, free)?;
            network.install_flows(i64::into_flows(extended.original_flows(flows)));
            (value, cancelled)
        } else {
            let extended = ExtendedGraph::<f64>::for_terminals(graph, network.capacities(), sources, sinks);
            let (value, cancelled, flows) = self.solve_extended(&extended, free)?;
            network.install_flows(f64::into_flows(extended.original_flows(flows)));
            (value, cancelled)
        };

        self.finish(network, costs, value, cancelled_cycles)
    }

    /// Maximum flow from `source` to `sink` of minimum total cost that
    /// carries at least `lower_bounds(e)` on every edge
    pub fn compute_min_cost_max_flow_bounded<'g>(
        &self,
        graph: &'g IndexGraph,
        capacities: Weights,
        costs: &Weights,
        lower_bounds: &Weights,
        source: usize,
        sink: usize,
    ) -> Result<MinCostFlowResult<'g>, FlowError> {
        validate_pair(graph, source, sink)?;
        self.compute_min_cost_max_flow_multi_bounded(graph, capacities, costs, lower_bounds, &[source], &[sink])
    }

    /// Maximum flow from `sources` to `sinks` of minimum total cost that
    /// carries at least `lower_bounds(e)` on every edge.
    ///
    /// The lower bounds are shifted into vertex supplies. Those supplies are
    /// attached to the super-terminals by arcs of cost `-(1 + sum |cost|)`,
    /// so a minimum cost maximum flow saturates them whenever the bounds
    /// are satisfiable. Fails with [`FlowError::InfeasibleSupply`] otherwise.
    pub fn compute_min_cost_max_flow_multi_bounded<'g>(
        &self,
        graph: &'g IndexGraph,
        capacities: Weights,
        costs: &Weights,
        lower_bounds: &Weights,
        sources: &[usize],
        sinks: &[usize],
    ) -> Result<MinCostFlowResult<'g>, FlowError> {
        check_input(graph, costs)?;
        validate_terminals(graph, sources, sinks)?;
        let mut network = FlowNetwork::new(graph, capacities)?;

        let cancelled_cycles = if network.capacities().is_integral() && lower_bounds.is_integral() {
            let (flows, cancelled) =
                self.solve_bounded::<i64>(graph, network.capacities(), costs, lower_bounds, sources, sinks)?;
            network.install_flows(i64::into_flows(flows));
            cancelled
        } else {
            let (flows, cancelled) =
                self.solve_bounded::<f64>(graph, network.capacities(), costs, lower_bounds, sources, sinks)?;
            network.install_flows(f64::into_flows(flows));
            cancelled
        };

        let value = network.flow_sum(sources)?;
        self.finish(network, costs, value, cancelled_cycles)
    }

    /// Minimum cost flow meeting a supply for every vertex.
    ///
    /// Positive supply is injected at a vertex, negative supply is absorbed.
    /// Supplies must sum to zero and every unit of supply must be routable.
    pub fn compute_min_cost_flow<'g>(
        &self,
        graph: &'g IndexGraph,
        capacities: Weights,
        costs: &Weights,
        supply: &Weights,
    ) -> Result<MinCostFlowResult<'g>, FlowError> {
        let unbounded = Weights::Int(vec![0; graph.edge_count()]);
        self.compute_min_cost_flow_bounded(graph, capacities, costs, &unbounded, supply)
    }

    /// Minimum cost flow meeting a supply for every vertex while carrying at
    /// least `lower_bounds(e)` on every edge
    pub fn compute_min_cost_flow_bounded<'g>(
        &self,
        graph: &'g IndexGraph,
        capacities: Weights,
        costs: &Weights,
        lower_bounds: &Weights,
        supply: &Weights,
    ) -> Result<MinCostFlowResult<'g>, FlowError> {
        check_input(graph, costs)?;
        supply.validate_len(graph.vertex_count())?;
        let mut network = FlowNetwork::new(graph, capacities)?;

        let integral = network.capacities().is_integral() && lower_bounds.is_integral() && supply.is_integral();
        let cancelled_cycles = if integral {
            let (flows, cancelled) =
                self.solve_supply::<i64>(graph, network.capacities(), costs, lower_bounds, supply)?;
            network.install_flows(i64::into_flows(flows));
            cancelled
        } else {
            let (flows, cancelled) =
                self.solve_supply::<f64>(graph, network.capacities(), costs, lower_bounds, supply)?;
            network.install_flows(f64::into_flows(flows));
            cancelled
        };

        let value: f64 = (0..graph.vertex_count())
            .map(|v| supply.get(v))
            .filter(|&b| b > 0.0)
            .sum();
        self.finish(network, costs, value, cancelled_cycles)
    }

    /// Maximum flow and cycle canceling on a super-terminal extension.
    /// Returns the value, the number of cancelled cycles and the flow of
    /// every extended edge.
    fn solve_extended<T: FlowValue>(
        &self,
        extended: &ExtendedGraph<T>,
        cost: impl Fn(usize) -> f64,
    ) -> Result<(f64, usize, Vec<T>), FlowError> {
        let mut inner = FlowNetwork::new(&extended.graph, T::into_weights(extended.capacities.clone()))?;
        let value = self
            .config
            .max_flow_algorithm()
            .compute_maximum_flow(&mut inner, extended.source, extended.sink)?;

        let mut flows = flows_as::<T>(inner.flows(), extended.graph.edge_count());
        let cancelled = cancel_negative_cycles(&extended.graph, &extended.capacities, cost, &mut flows);
        Ok((value, cancelled, flows))
    }

    fn solve_supply<T: FlowValue>(
        &self,
        graph: &IndexGraph,
        capacities: &Weights,
        costs: &Weights,
        lower_bounds: &Weights,
        supply: &Weights,
    ) -> Result<(Vec<T>, usize), FlowError> {
        let reduction = LowerBounds::<T>::reduce(graph, capacities, lower_bounds)?;
        let shifted: Vec<T> = (0..graph.vertex_count())
            .map(|v| T::weight(supply, v) + reduction.shift[v])
            .collect();
        let required = T::checked_total(shifted.iter().copied().filter(|b| b.is_positive())).to_f64();

        let extended = supply_graph::<T>(graph, &reduction.capacities(), &T::into_weights(shifted))?;
        // synthetic terminal arcs are free
        let free = |e: usize| if e < extended.original_edges { costs.get(e) } else { 0.0 };
        let (routed, cancelled, flows) = self.solve_extended(&extended, free)?;
        if routed < required - EPS {
            return Err(FlowError::InfeasibleSupply { routed, required });
        }
        Ok((reduction.restore(extended.original_flows(flows)), cancelled))
    }

    fn solve_bounded<T: FlowValue>(
        &self,
        graph: &IndexGraph,
        capacities: &Weights,
        costs: &Weights,
        lower_bounds: &Weights,
        sources: &[usize],
        sinks: &[usize],
    ) -> Result<(Vec<T>, usize), FlowError> {
        let m = graph.edge_count();
        let reduction = LowerBounds::<T>::reduce(graph, capacities, lower_bounds)?;
        let bounds = terminal_bounds::<T>(graph, capacities, sources, sinks);

        // terminal arcs first, then the arcs forced by the shifted supplies
        let mut source_arcs: Vec<(usize, T)> = sources.iter().copied().zip(bounds.supply).collect();
        let mut sink_arcs: Vec<(usize, T)> = sinks.iter().copied().zip(bounds.demand).collect();
        let mut forced = vec![false; m + sources.len()];
        let mut forced_sinks = vec![false; sinks.len()];
        for (v, &b) in reduction.shift.iter().enumerate() {
            if b.is_positive() {
                source_arcs.push((v, b));
                forced.push(true);
            } else if (-b).is_positive() {
                sink_arcs.push((v, -b));
                forced_sinks.push(true);
            }
        }
        forced.extend(forced_sinks);

        let extended = ExtendedGraph::new(graph, &reduction.capacities(), &source_arcs, &sink_arcs);
        let forced_cost = -(1.0 + costs.abs_sum(m));
        let cost = |e: usize| {
            if e < m {
                costs.get(e)
            } else if forced[e] {
                forced_cost
            } else {
                0.0
            }
        };
        let (_, cancelled, flows) = self.solve_extended(&extended, cost)?;

        let mut routed = T::ZERO;
        let mut required = T::ZERO;
        let mut satisfied = true;
        for e in (m..extended.graph.edge_count()).filter(|&e| forced[e]) {
            let cap = extended.capacities[e];
            satisfied &= !(cap - flows[e]).is_positive();
            if extended.graph.edge_source(e) == extended.source {
                routed += flows[e];
                required += cap;
            }
        }
        if !satisfied {
            return Err(FlowError::InfeasibleSupply {
                routed: routed.to_f64(),
                required: required.to_f64(),
            });
        }
        Ok((reduction.restore(extended.original_flows(flows)), cancelled))
    }

    fn finish<'g>(
        &self,
        network: FlowNetwork<'g>,
        costs: &Weights,
        value: f64,
        cancelled_cycles: usize,
    ) -> Result<MinCostFlowResult<'g>, FlowError> {
        let total_cost = network.cost_sum(costs)?;
        debug!(
            "min cost flow: value {}, cost {}, {} cycles cancelled (n = {}, m = {})",
            value,
            total_cost,
            cancelled_cycles,
            network.graph().vertex_count(),
            network.graph().edge_count()
        );
        Ok(MinCostFlowResult {
            value,
            total_cost,
            cancelled_cycles,
            network,
        })
    }
}

/// Edge lower bounds removed from a network: capacities shrink by the bound
/// and each bound moves supply from the edge's source to its target
struct LowerBounds<T> {
    lower: Vec<T>,
    reduced: Vec<T>,
    /// Supply change per vertex
    shift: Vec<T>,
}

impl<T: FlowValue> LowerBounds<T> {
    fn reduce(graph: &IndexGraph, capacities: &Weights, lower_bounds: &Weights) -> Result<Self, FlowError> {
        let m = graph.edge_count();
        lower_bounds.validate_len(m)?;

        let mut lower = Vec::with_capacity(m);
        let mut reduced = Vec::with_capacity(m);
        for e in 0..m {
            let (l, cap) = (T::weight(lower_bounds, e), T::weight(capacities, e));
            let rest = cap - l;
            if !(lower_bounds.get(e) >= 0.0) || (-rest).is_positive() {
                return Err(FlowError::IllegalFlow {
                    edge: e,
                    flow: lower_bounds.get(e),
                    capacity: capacities.get(e),
                });
            }
            reduced.push(if rest < T::ZERO { T::ZERO } else { rest });
            lower.push(l);
        }

        // every partial sum below stays within the total
        T::checked_total(lower.iter().copied());
        let mut shift = vec![T::ZERO; graph.vertex_count()];
        for (e, &l) in lower.iter().enumerate() {
            shift[graph.edge_source(e)] -= l;
            shift[graph.edge_target(e)] += l;
        }
        Ok(Self { lower, reduced, shift })
    }

    fn capacities(&self) -> Weights {
        T::into_weights(self.reduced.clone())
    }

    /// Add the bounds back onto a flow of the reduced network
    fn restore(&self, mut flows: Vec<T>) -> Vec<T> {
        for (f, &l) in flows.iter_mut().zip(&self.lower) {
            *f += l;
        }
        flows
    }
}

fn check_input(graph: &IndexGraph, costs: &Weights) -> Result<(), FlowError> {
    if !graph.is_directed() {
        return Err(FlowError::UndirectedGraph);
    }
    costs.validate_len(graph.edge_count())
}

/// Super-terminal extension carrying the supplies on its synthetic arcs
fn supply_graph<T: FlowValue>(
    graph: &IndexGraph,
    capacities: &Weights,
    supply: &Weights,
) -> Result<ExtendedGraph<T>, FlowError> {
    let n = graph.vertex_count();
    let values: Vec<T> = (0..n).map(|v| T::weight(supply, v)).collect();

    let balance = T::checked_total(values.iter().copied());
    if balance.is_positive() || (-balance).is_positive() {
        return Err(FlowError::UnbalancedSupply(balance.to_f64()));
    }

    let mut source_arcs = Vec::new();
    let mut sink_arcs = Vec::new();
    for (v, &b) in values.iter().enumerate() {
        if b.is_positive() {
            source_arcs.push((v, b));
        } else if (-b).is_positive() {
            sink_arcs.push((v, -b));
        }
    }
    Ok(ExtendedGraph::new(graph, capacities, &source_arcs, &sink_arcs))
}

/// Per-edge flow in the requested numeric domain
fn flows_as<T: FlowValue>(flows: &Flows, edge_count: usize) -> Vec<T> {
    let weights = match flows {
        Flows::Int(f) => Weights::Int(f.clone()),
        Flows::Real(f) => Weights::Real(f.clone()),
    };
    (0..edge_count).map(|e| T::weight(&weights, e)).collect()
}

fn cancel_in_place<T: FlowValue>(network: &mut FlowNetwork<'_>, costs: &Weights) -> usize {
    let graph = network.graph();
    let m = graph.edge_count();
    let capacities: Vec<T> = (0..m).map(|e| T::weight(network.capacities(), e)).collect();
    let mut flows = flows_as::<T>(network.flows(), m);
    let cancelled = cancel_negative_cycles(graph, &capacities, |e| costs.get(e), &mut flows);
    network.install_flows(T::into_flows(flows));
    cancelled
}

/// Cancel minimum mean cycles until the residual graph has no negative
/// cycle, then saturate negative-cost self-loops. Returns the number of
/// cycles cancelled.
pub(crate) fn cancel_negative_cycles<T: FlowValue>(
    graph: &IndexGraph,
    capacities: &[T],
    cost: impl Fn(usize) -> f64,
    flows: &mut [T],
) -> usize {
    let mut builder = ResidualGraphBuilder::new(graph);
    builder.add_all_original_edges();
    let residual = builder.build();
    let arc_count = residual.arc_count();

    let mut arc_capacity = vec![T::ZERO; arc_count];
    let mut arc_flow = vec![T::ZERO; arc_count];
    let mut arc_cost = vec![0.0; arc_count];
    for a in 0..arc_count {
        if let Some(e) = residual.edge_ref(a) {
            if residual.is_forward(a) {
                arc_capacity[a] = capacities[e];
                arc_flow[a] = flows[e];
                arc_cost[a] = cost(e);
            } else {
                arc_flow[a] = -flows[e];
                arc_cost[a] = -cost(e);
            }
        }
    }

    let huge_cost = 1.0 + (0..graph.edge_count()).map(|e| cost(e).abs()).sum::<f64>();
    let mut saturated: Vec<bool> = (0..arc_count)
        .map(|a| !(arc_capacity[a] - arc_flow[a]).is_positive())
        .collect();

    let mut cancelled = 0usize;
    loop {
        let cycle = MinimumMeanCycle.compute(&residual, |a| if saturated[a] { huge_cost } else { arc_cost[a] });
        let cycle = match cycle {
            Some(cycle) if cycle.mean < -EPS => cycle,
            _ => break,
        };

        let delta = cycle
            .arcs
            .iter()
            .map(|&a| arc_capacity[a] - arc_flow[a])
            .fold(None, |acc: Option<T>, r| Some(acc.map_or(r, |d| d.min_of(r))));
        let delta = match delta {
            Some(delta) => delta,
            None => break,
        };

        for &a in &cycle.arcs {
            let twin = residual.twin(a);
            arc_flow[a] += delta;
            arc_flow[twin] -= delta;
            saturated[a] = !(arc_capacity[a] - arc_flow[a]).is_positive();
            saturated[twin] = !(arc_capacity[twin] - arc_flow[twin]).is_positive();
        }
        cancelled += 1;
        trace!(
            "cancelled cycle of {} arcs, mean {}, pushed {:?}",
            cycle.arcs.len(),
            cycle.mean,
            delta
        );
    }

    for a in 0..arc_count {
        if let Some(e) = residual.edge_ref(a) {
            if residual.is_forward(a) {
                flows[e] = arc_flow[a];
            }
        }
    }
    for e in 0..graph.edge_count() {
        if graph.edge_source(e) == graph.edge_target(e) && cost(e) < 0.0 {
            flows[e] = capacities[e];
        }
    }

    cancelled
}

impl Algorithm for MinCostFlowSolver {
    fn name(&self) -> &str {
        "Minimum Mean Cycle Canceling"
    }

    fn category(&self) -> &str {
        "min_cost_flow"
    }

    fn description(&self) -> &str {
        "Minimum cost maximum flow by canceling minimum mean cycles of the residual graph."
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
