//! Strongly Connected Components Algorithm Implementation
//!
//! This module implements Tarjan's algorithm for finding strongly connected components
//! of any [`Digraph`], optionally restricted to a subset of its arcs. The flow module
//! uses it to condense residual graphs (minimum cut enumeration) and to split the
//! minimum mean cycle search into independent components.
//!
//! # Theoretical Foundation
//!
//! A strongly connected component (SCC) is a maximal set of vertices such that there
//! is a directed path from each vertex to every other vertex in the component.
//!
//! ## Mathematical Invariants
//!
//! 1. **Low-Link Property**: `low[v] = min(disc[v], low[w])` over tree children `w`
//!    and `disc[w]` over arcs to vertices still on the stack
//! 2. **SCC Root Property**: a vertex `v` is the root of an SCC iff `disc[v] == low[v]`
//! 3. **Emission Order**: components are emitted in reverse topological order of the
//!    condensation, so every arc between components leads to an earlier component
//!
//! # Algorithmic Complexity
//!
//! - **Time Complexity**: O(V + E)
//! - **Space Complexity**: O(V), the recursion is replaced by an explicit stack
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use serde::{Deserialize, Serialize};

use crate::data_structures::graph::Digraph;

const UNVISITED: usize = usize::MAX;

/// Strongly connected component decomposition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StronglyConnectedComponents {
    /// Component index of every vertex
    pub component_of: Vec<usize>,
    /// Vertices of each component, components in reverse topological order
    pub components: Vec<Vec<usize>>,
}

impl StronglyConnectedComponents {
    /// Decompose the whole graph
    pub fn compute<G: Digraph>(graph: &G) -> Self {
        Self::compute_filtered(graph, |_| true)
    }

    /// Decompose the subgraph formed by the arcs accepted by `include_arc`
    pub fn compute_filtered<G: Digraph>(graph: &G, include_arc: impl Fn(usize) -> bool) -> Self {
        let n = graph.vertex_count();
        let mut discovery = vec![UNVISITED; n];
        let mut low_link = vec![0usize; n];
        let mut on_stack = vec![false; n];
        let mut stack: Vec<usize> = Vec::new();
        let mut component_of = vec![UNVISITED; n];
        let mut components: Vec<Vec<usize>> = Vec::new();
        let mut time = 0usize;

        // explicit DFS frames: (vertex, remaining out-arcs)
        let mut frames: Vec<(usize, G::OutArcs<'_>)> = Vec::new();

        for root in 0..n {
            if discovery[root] != UNVISITED {
                continue;
            }
            discovery[root] = time;
            low_link[root] = time;
            time += 1;
            stack.push(root);
            on_stack[root] = true;
            frames.push((root, graph.out_arcs(root)));

            while let Some((v, arcs)) = frames.last_mut() {
                let v = *v;
                let next = arcs.find(|&a| include_arc(a));
                match next {
                    Some(a) => {
                        let w = graph.arc_target(a);
                        if discovery[w] == UNVISITED {
                            discovery[w] = time;
                            low_link[w] = time;
                            time += 1;
                            stack.push(w);
                            on_stack[w] = true;
                            frames.push((w, graph.out_arcs(w)));
                        } else if on_stack[w] {
                            low_link[v] = low_link[v].min(discovery[w]);
                        }
                    }
                    None => {
                        frames.pop();
                        if let Some((parent, _)) = frames.last() {
                            low_link[*parent] = low_link[*parent].min(low_link[v]);
                        }
                        if low_link[v] == discovery[v] {
                            let id = components.len();
                            let mut component = Vec::new();
                            while let Some(w) = stack.pop() {
                                on_stack[w] = false;
                                component_of[w] = id;
                                component.push(w);
                                if w == v {
                                    break;
                                }
                            }
                            components.push(component);
                        }
                    }
                }
            }
        }

        Self {
            component_of,
            components,
        }
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the graph has no vertices
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
