//! Flow Network Abstraction
//!
//! A flow network pairs an [`IndexGraph`] with a capacity function and a flow
//! assignment over its edges. Every solver in the flow module reads its
//! capacities from here and writes its final flow back here.
//!
//! # Theoretical Foundation
//! A flow `f` on a directed network satisfies `0 <= f(e) <= cap(e)`. On an
//! undirected network the sign of `f(e)` encodes the direction of travel
//! (positive means source to target) and `|f(e)| <= cap(e)`. Conservation
//! holds at every vertex except the terminals.
//!
//! ## Numeric Model
//! Integral capacities (`Weights::Cardinality`, `Weights::Int`) are solved
//! exactly on `i64`. Real capacities are solved on `f64`, and every
//! saturation test compares against the single tolerance [`EPS`]. The
//! [`FlowValue`] trait lets each worker be written once for both.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use super::error::FlowError;
use crate::data_structures::graph::IndexGraph;

/// Tolerance for every floating point saturation and optimality test
pub const EPS: f64 = 1e-5;

/// Weight function over a dense index space (edges or vertices)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Weights {
    /// Every entry is 1; no per-entry storage
    Cardinality,
    /// Integral weights
    Int(Vec<i64>),
    /// Real weights
    Real(Vec<f64>),
}

impl Weights {
    /// Weight of entry `index` as a real number
    #[inline]
    pub fn get(&self, index: usize) -> f64 {
        match self {
            Weights::Cardinality => 1.0,
            Weights::Int(w) => w[index] as f64,
            Weights::Real(w) => w[index],
        }
    }

    /// Weight of entry `index` if the function is integral
    #[inline]
    pub fn get_int(&self, index: usize) -> Option<i64> {
        match self {
            Weights::Cardinality => Some(1),
            Weights::Int(w) => Some(w[index]),
            Weights::Real(_) => None,
        }
    }

    /// Whether every entry is an integer
    pub fn is_integral(&self) -> bool {
        !matches!(self, Weights::Real(_))
    }

    /// Whether this is the unit weight function
    pub fn is_cardinality(&self) -> bool {
        matches!(self, Weights::Cardinality)
    }

    /// Largest entry over `0..len`, 0 when empty
    pub fn max(&self, len: usize) -> f64 {
        (0..len).map(|i| self.get(i)).fold(0.0, f64::max)
    }

    /// Sum of `|w(i)|` over `0..len`
    pub fn abs_sum(&self, len: usize) -> f64 {
        (0..len).map(|i| self.get(i).abs()).sum()
    }

    /// Check that the function covers exactly `expected` entries
    pub fn validate_len(&self, expected: usize) -> Result<(), FlowError> {
        let actual = match self {
            Weights::Cardinality => return Ok(()),
            Weights::Int(w) => w.len(),
            Weights::Real(w) => w.len(),
        };
        if actual == expected {
            Ok(())
        } else {
            Err(FlowError::WeightsLengthMismatch { expected, actual })
        }
    }

    /// Check that the function is usable as a capacity: correct length, no
    /// negative (or NaN) entry
    pub fn validate_capacities(&self, expected: usize) -> Result<(), FlowError> {
        self.validate_len(expected)?;
        let negative = match self {
            Weights::Cardinality => None,
            Weights::Int(w) => w.iter().position(|&c| c < 0),
            Weights::Real(w) => w.iter().position(|&c| !(c >= 0.0)),
        };
        match negative {
            Some(index) => Err(FlowError::NegativeCapacity {
                index,
                capacity: self.get(index),
            }),
            None => Ok(()),
        }
    }

    /// Overwrite entry `index`, widening the representation when needed
    fn set(&mut self, index: usize, len: usize, value: f64) {
        if let Weights::Cardinality = self {
            *self = Weights::Int(vec![1; len]);
        }
        if let Weights::Int(w) = self {
            if is_exact_integer(value) {
                w[index] = value as i64;
                return;
            }
            *self = Weights::Real(w.iter().map(|&c| c as f64).collect());
        }
        if let Weights::Real(w) = self {
            w[index] = value;
        }
    }
}

/// Flow assignment storage, integral when the capacities are
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Flows {
    /// Exact integral flows
    Int(Vec<i64>),
    /// Real flows
    Real(Vec<f64>),
}

impl Flows {
    /// Flow on edge `edge` as a real number
    #[inline]
    pub fn get(&self, edge: usize) -> f64 {
        match self {
            Flows::Int(f) => f[edge] as f64,
            Flows::Real(f) => f[edge],
        }
    }

    fn zeroed(integral: bool, len: usize) -> Self {
        if integral {
            Flows::Int(vec![0; len])
        } else {
            Flows::Real(vec![0.0; len])
        }
    }
}

/// Validate an edge index against a graph
pub(crate) fn check_edge(graph: &IndexGraph, edge: usize) -> Result<(), FlowError> {
    if edge < graph.edge_count() {
        Ok(())
    } else {
        Err(FlowError::InvalidEdge {
            edge,
            edge_count: graph.edge_count(),
        })
    }
}

/// Validate a vertex index against a graph
pub(crate) fn check_vertex(graph: &IndexGraph, vertex: usize) -> Result<(), FlowError> {
    if vertex < graph.vertex_count() {
        Ok(())
    } else {
        Err(FlowError::InvalidVertex {
            vertex,
            vertex_count: graph.vertex_count(),
        })
    }
}

fn is_exact_integer(value: f64) -> bool {
    value.fract() == 0.0 && value.abs() < i64::MAX as f64
}

/// Numeric domain of a flow computation.
///
/// Implemented for `i64` (exact arithmetic, used whenever capacities are
/// integral) and `f64` (tolerance [`EPS`]). All workers are generic over it.
pub trait FlowValue:
    Copy
    + Debug
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + Send
    + Sync
    + 'static
{
    /// Additive identity
    const ZERO: Self;

    /// Read entry `index` of a weight function in this domain
    fn weight(weights: &Weights, index: usize) -> Self;

    /// Whether an amount counts as non-zero residual or excess
    fn is_positive(self) -> bool;

    /// Smaller of two amounts
    fn min_of(self, other: Self) -> Self {
        if other < self {
            other
        } else {
            self
        }
    }

    /// Convert to a real number for reporting
    fn to_f64(self) -> f64;

    /// Sum a sequence of capacities, panicking if the total is not
    /// representable
    fn checked_total<I: IntoIterator<Item = Self>>(values: I) -> Self;

    /// `self + 1`, panicking on overflow
    fn plus_one(self) -> Self;

    /// `self + self`, panicking on overflow
    fn doubled(self) -> Self;

    /// Wrap per-edge values into flow storage
    fn into_flows(values: Vec<Self>) -> Flows;

    /// Wrap per-edge values into a weight function
    fn into_weights(values: Vec<Self>) -> Weights;
}

impl FlowValue for i64 {
    const ZERO: Self = 0;

    #[inline]
    fn weight(weights: &Weights, index: usize) -> Self {
        match weights {
            Weights::Cardinality => 1,
            Weights::Int(w) => w[index],
            Weights::Real(w) => w[index] as i64,
        }
    }

    #[inline]
    fn is_positive(self) -> bool {
        self > 0
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn checked_total<I: IntoIterator<Item = Self>>(values: I) -> Self {
        let total: i128 = values.into_iter().map(i128::from).sum();
        match i64::try_from(total) {
            Ok(total) => total,
            Err(_) => panic!("capacity sum {} overflows i64", total),
        }
    }

    fn plus_one(self) -> Self {
        match self.checked_add(1) {
            Some(value) => value,
            None => panic!("capacity {} overflows i64", self),
        }
    }

    fn doubled(self) -> Self {
        match self.checked_add(self) {
            Some(value) => value,
            None => panic!("doubled capacity {} overflows i64", self),
        }
    }

    fn into_flows(values: Vec<Self>) -> Flows {
        Flows::Int(values)
    }

    fn into_weights(values: Vec<Self>) -> Weights {
        Weights::Int(values)
    }
}

impl FlowValue for f64 {
    const ZERO: Self = 0.0;

    #[inline]
    fn weight(weights: &Weights, index: usize) -> Self {
        weights.get(index)
    }

    #[inline]
    fn is_positive(self) -> bool {
        self > EPS
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn checked_total<I: IntoIterator<Item = Self>>(values: I) -> Self {
        let total: f64 = values.into_iter().sum();
        assert!(total.is_finite(), "capacity sum is not finite");
        total
    }

    fn plus_one(self) -> Self {
        self + 1.0
    }

    fn doubled(self) -> Self {
        self + self
    }

    fn into_flows(values: Vec<Self>) -> Flows {
        Flows::Real(values)
    }

    fn into_weights(values: Vec<Self>) -> Weights {
        Weights::Real(values)
    }
}

/// Graph with capacities and a flow assignment on its edges
#[derive(Debug, Clone)]
pub struct FlowNetwork<'g> {
    /// Underlying graph
    graph: &'g IndexGraph,
    /// Edge capacities
    capacities: Weights,
    /// Current flow per edge
    flows: Flows,
}

impl<'g> FlowNetwork<'g> {
    /// Create a network with zero flow, rejecting negative capacities
    pub fn new(graph: &'g IndexGraph, capacities: Weights) -> Result<Self, FlowError> {
        capacities.validate_capacities(graph.edge_count())?;
        let flows = Flows::zeroed(capacities.is_integral(), graph.edge_count());
        Ok(Self {
            graph,
            capacities,
            flows,
        })
    }

    /// Underlying graph
    pub fn graph(&self) -> &'g IndexGraph {
        self.graph
    }

    /// Capacity function
    pub fn capacities(&self) -> &Weights {
        &self.capacities
    }

    /// Flow assignment
    pub fn flows(&self) -> &Flows {
        &self.flows
    }

    /// Capacity of an edge
    pub fn capacity(&self, edge: usize) -> Result<f64, FlowError> {
        check_edge(self.graph, edge)?;
        Ok(self.capacities.get(edge))
    }

    /// Flow on an edge; for undirected graphs the sign is relative to the
    /// edge's source
    pub fn flow(&self, edge: usize) -> Result<f64, FlowError> {
        check_edge(self.graph, edge)?;
        Ok(self.flows.get(edge))
    }

    /// Exact flow on an edge, `None` once the network holds real flows
    pub fn flow_int(&self, edge: usize) -> Result<Option<i64>, FlowError> {
        check_edge(self.graph, edge)?;
        Ok(match &self.flows {
            Flows::Int(f) => Some(f[edge]),
            Flows::Real(_) => None,
        })
    }

    /// Change the capacity of an edge; the edge's current flow must still fit
    pub fn set_capacity(&mut self, edge: usize, capacity: f64) -> Result<(), FlowError> {
        check_edge(self.graph, edge)?;
        if !(capacity >= 0.0) {
            return Err(FlowError::NegativeCapacity { index: edge, capacity });
        }
        let flow = self.flows.get(edge);
        if flow.abs() > capacity + EPS {
            return Err(FlowError::IllegalFlow { edge, flow, capacity });
        }
        self.capacities.set(edge, self.graph.edge_count(), capacity);
        Ok(())
    }

    /// Assign the flow of an edge, rejecting values outside its capacity
    pub fn set_flow(&mut self, edge: usize, flow: f64) -> Result<(), FlowError> {
        check_edge(self.graph, edge)?;
        let capacity = self.capacities.get(edge);
        let lower = if self.graph.is_directed() { -EPS } else { -capacity - EPS };
        if !(flow >= lower && flow <= capacity + EPS) {
            return Err(FlowError::IllegalFlow { edge, flow, capacity });
        }

        if let Flows::Int(f) = &mut self.flows {
            if is_exact_integer(flow) {
                f[edge] = flow as i64;
                return Ok(());
            }
            self.flows = Flows::Real(f.iter().map(|&x| x as f64).collect());
        }
        if let Flows::Real(f) = &mut self.flows {
            f[edge] = flow;
        }
        Ok(())
    }

    /// Replace the whole flow assignment with a solver's output
    pub(crate) fn install_flows(&mut self, flows: Flows) {
        self.flows = flows;
    }

    /// Net flow leaving a set of vertices: outflow minus inflow across the
    /// set's boundary. For a single terminal this is the flow value.
    pub fn flow_sum(&self, vertices: &[usize]) -> Result<f64, FlowError> {
        let mut inside = vec![false; self.graph.vertex_count()];
        for &v in vertices {
            check_vertex(self.graph, v)?;
            inside[v] = true;
        }

        let mut total = 0.0;
        for e in 0..self.graph.edge_count() {
            let (u, v) = (self.graph.edge_source(e), self.graph.edge_target(e));
            match (inside[u], inside[v]) {
                (true, false) => total += self.flows.get(e),
                (false, true) => total -= self.flows.get(e),
                _ => {}
            }
        }
        Ok(total)
    }

    /// Total cost `sum f(e) * cost(e)` over every edge
    pub fn cost_sum(&self, costs: &Weights) -> Result<f64, FlowError> {
        let edges: Vec<usize> = (0..self.graph.edge_count()).collect();
        self.cost_sum_of(&edges, costs)
    }

    /// Total cost `sum f(e) * cost(e)` over the given edges.
    ///
    /// Integral flows with integral costs are accumulated exactly; the
    /// cardinality cost function degenerates to the sum of flows.
    pub fn cost_sum_of(&self, edges: &[usize], costs: &Weights) -> Result<f64, FlowError> {
        costs.validate_len(self.graph.edge_count())?;
        for &e in edges {
            check_edge(self.graph, e)?;
        }

        match (&self.flows, costs) {
            (Flows::Int(f), Weights::Cardinality) => {
                Ok(edges.iter().map(|&e| i128::from(f[e])).sum::<i128>() as f64)
            }
            (Flows::Int(f), Weights::Int(c)) => Ok(edges
                .iter()
                .map(|&e| i128::from(f[e]) * i128::from(c[e]))
                .sum::<i128>() as f64),
            _ => Ok(edges.iter().map(|&e| self.flows.get(e) * costs.get(e)).sum()),
        }
    }
}
