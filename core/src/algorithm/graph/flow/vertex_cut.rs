//! Minimum Vertex Cut via Auxiliary Graph
//!
//! Reduces vertex connectivity to edge connectivity by splitting every vertex
//! into two poles joined by an edge carrying the vertex weight.
//!
//! # Theoretical Foundation
//! Vertex `v` becomes an in-pole `v0 = 2v` and an out-pole `v1 = 2v + 1`
//! joined by the pole edge `v0 -> v1` of weight `w(v)`. An original edge
//! `(u, v)` becomes `u1 -> v0` (plus `v1 -> u0` when undirected) with a weight
//! larger than any vertex cut can cost. A cut that crossed such an edge could
//! be improved by cutting a pole instead, so every minimum `s1`-`t0` edge cut
//! consists of pole edges only and maps one-to-one back to vertices.
//!
//! Connecting edges come first in the auxiliary graph; the pole edge of `v`
//! has index `threshold + v`.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::{HashMap, HashSet};

use log::debug;
use rayon::prelude::*;

use super::error::FlowError;
use super::max_flow::{validate_pair, FlowConfig};
use super::min_cut::{Cut, MinimumEdgeCut};
use super::network::{FlowValue, Weights};
use crate::algorithm::traits::{Algorithm, AlgorithmError};
use crate::data_structures::graph::IndexGraph;

/// Vertex-split graph of an original graph
#[derive(Debug, Clone)]
pub struct AuxiliaryGraph {
    /// Directed split graph
    graph: IndexGraph,
    /// Edge weights of the split graph
    weights: Weights,
    /// Number of connecting (non-pole) edges
    threshold: usize,
}

impl AuxiliaryGraph {
    /// Split every vertex of `graph`, weighting pole edges with `vertex_weights`
    pub fn new(graph: &IndexGraph, vertex_weights: &Weights) -> Self {
        let n = graph.vertex_count();
        let mut aux = IndexGraph::with_vertices(true, 2 * n);

        let mut add = |u: usize, v: usize| {
            // both endpoints are below 2n by construction
            let added = aux.add_edge(u, v);
            debug_assert!(added.is_ok(), "split edge {} -> {} rejected", u, v);
        };
        for e in 0..graph.edge_count() {
            let (u, v) = (graph.edge_source(e), graph.edge_target(e));
            if u == v {
                continue;
            }
            add(Self::out_pole(u), Self::in_pole(v));
            if !graph.is_directed() {
                add(Self::out_pole(v), Self::in_pole(u));
            }
        }
        let threshold = aux.edge_count();
        for v in 0..n {
            // pole edge of v sits at threshold + v
            let added = aux.add_edge(Self::in_pole(v), Self::out_pole(v));
            debug_assert_eq!(added, Ok(threshold + v));
        }

        let weights = match vertex_weights {
            Weights::Cardinality => {
                let mut w = vec![2i64; threshold];
                w.extend(std::iter::repeat(1).take(n));
                Weights::Int(w)
            }
            Weights::Int(vw) => {
                let max = vw.iter().copied().max().unwrap_or(0).max(1);
                let huge = match max.checked_mul(n as i64) {
                    Some(total) => total.plus_one(),
                    None => panic!("vertex weight bound {} * {} overflows i64", max, n),
                };
                let mut w = vec![huge; threshold];
                w.extend_from_slice(vw);
                Weights::Int(w)
            }
            Weights::Real(vw) => {
                let max = vw.iter().copied().fold(1.0, f64::max);
                let mut w = vec![max * n as f64 + 1.0; threshold];
                w.extend_from_slice(vw);
                Weights::Real(w)
            }
        };

        Self {
            graph: aux,
            weights,
            threshold,
        }
    }

    /// In-pole of a vertex
    #[inline]
    pub fn in_pole(v: usize) -> usize {
        2 * v
    }

    /// Out-pole of a vertex
    #[inline]
    pub fn out_pole(v: usize) -> usize {
        2 * v + 1
    }

    /// Split graph
    pub fn graph(&self) -> &IndexGraph {
        &self.graph
    }

    /// Edge weights of the split graph
    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Original vertex behind a pole edge, `None` for connecting edges
    pub fn pole_vertex(&self, edge: usize) -> Option<usize> {
        edge.checked_sub(self.threshold)
    }

    /// Map an edge cut of the split graph to the vertices it cuts, ascending
    pub fn edge_cut_to_vertex_cut(&self, cut: &Cut) -> Vec<usize> {
        let mut vertices: Vec<usize> = cut
            .cross_edges(&self.graph)
            .into_iter()
            .filter_map(|e| {
                let v = self.pole_vertex(e);
                debug_assert!(v.is_some(), "minimum cut crossed connecting edge {}", e);
                v
            })
            .collect();
        vertices.sort_unstable();
        vertices
    }
}

/// Minimum vertex cut solver
#[derive(Debug, Clone)]
pub struct MinimumVertexCut {
    /// Solver configuration
    config: FlowConfig,
    /// String view of the configuration
    parameters: HashMap<String, String>,
}

impl Default for MinimumVertexCut {
    fn default() -> Self {
        Self::new(FlowConfig::default())
    }
}

impl MinimumVertexCut {
    /// Create a solver with the given configuration
    pub fn new(config: FlowConfig) -> Self {
        let parameters = config.parameters();
        Self { config, parameters }
    }

    fn edge_cut(&self) -> MinimumEdgeCut {
        MinimumEdgeCut::new(self.config.clone())
    }

    /// Minimum weight vertex set whose removal leaves no path from `source`
    /// to `sink`; `None` when they are adjacent
    pub fn compute_minimum_cut(
        &self,
        graph: &IndexGraph,
        vertex_weights: &Weights,
        source: usize,
        sink: usize,
    ) -> Result<Option<Vec<usize>>, FlowError> {
        validate_pair(graph, source, sink)?;
        vertex_weights.validate_capacities(graph.vertex_count())?;
        if graph.has_edge_between(source, sink) {
            return Ok(None);
        }

        let aux = AuxiliaryGraph::new(graph, vertex_weights);
        self.cut_with(&aux, source, sink).map(Some)
    }

    fn cut_with(&self, aux: &AuxiliaryGraph, source: usize, sink: usize) -> Result<Vec<usize>, FlowError> {
        let cut = self.edge_cut().compute_minimum_cut(
            aux.graph(),
            aux.weights(),
            AuxiliaryGraph::out_pole(source),
            AuxiliaryGraph::in_pole(sink),
        )?;
        Ok(aux.edge_cut_to_vertex_cut(&cut))
    }

    /// Minimum weight vertex set whose removal disconnects the graph (some
    /// vertex can no longer reach another); `None` when every pair of
    /// vertices is adjacent
    pub fn compute_global_minimum_cut(
        &self,
        graph: &IndexGraph,
        vertex_weights: &Weights,
    ) -> Result<Option<Vec<usize>>, FlowError> {
        let n = graph.vertex_count();
        if n < 2 {
            return Err(FlowError::TooFewVertices(n));
        }
        vertex_weights.validate_capacities(n)?;

        let mut pairs = Vec::new();
        for s in 0..n {
            let sinks = if graph.is_directed() { 0..n } else { s + 1..n };
            for t in sinks {
                if s != t && !graph.has_edge_between(s, t) {
                    pairs.push((s, t));
                }
            }
        }
        if pairs.is_empty() {
            return Ok(None);
        }

        let aux = AuxiliaryGraph::new(graph, vertex_weights);
        let solve = |&(s, t): &(usize, usize)| -> Result<(f64, Vec<usize>), FlowError> {
            let cut = self.cut_with(&aux, s, t)?;
            let weight = cut.iter().map(|&v| vertex_weights.get(v)).sum();
            Ok((weight, cut))
        };
        let candidates: Vec<(f64, Vec<usize>)> = if self.config.parallel_global_cut {
            pairs.par_iter().map(solve).collect::<Result<_, _>>()?
        } else {
            pairs.iter().map(solve).collect::<Result<_, _>>()?
        };

        let mut best: Option<(f64, Vec<usize>)> = None;
        for (weight, cut) in candidates {
            if best.as_ref().map_or(true, |(w, _)| weight < *w) {
                best = Some((weight, cut));
            }
        }
        debug!("global minimum vertex cut over {} pairs: {:?}", pairs.len(), best);
        Ok(best.map(|(_, cut)| cut))
    }

    /// Every minimum vertex cut between `source` and `sink`, each listed
    /// once; `None` when they are adjacent
    pub fn all_minimum_cuts(
        &self,
        graph: &IndexGraph,
        vertex_weights: &Weights,
        source: usize,
        sink: usize,
    ) -> Result<Option<Vec<Vec<usize>>>, FlowError> {
        validate_pair(graph, source, sink)?;
        vertex_weights.validate_capacities(graph.vertex_count())?;
        if graph.has_edge_between(source, sink) {
            return Ok(None);
        }

        let aux = AuxiliaryGraph::new(graph, vertex_weights);
        let edge_cuts = self.edge_cut().all_minimum_cuts(
            aux.graph(),
            aux.weights(),
            AuxiliaryGraph::out_pole(source),
            AuxiliaryGraph::in_pole(sink),
        )?;

        let mut seen = HashSet::new();
        let mut cuts = Vec::new();
        for cut in &edge_cuts {
            let vertices = aux.edge_cut_to_vertex_cut(cut);
            if seen.insert(vertices.clone()) {
                cuts.push(vertices);
            }
        }
        debug!(
            "{} minimum vertex cuts from {} minimum edge cuts",
            cuts.len(),
            edge_cuts.len()
        );
        Ok(Some(cuts))
    }
}

impl Algorithm for MinimumVertexCut {
    fn name(&self) -> &str {
        "Minimum Vertex Cut"
    }

    fn category(&self) -> &str {
        "min_cut"
    }

    fn description(&self) -> &str {
        "Minimum vertex cuts through a vertex-split auxiliary graph and minimum edge cuts."
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
