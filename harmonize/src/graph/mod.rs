//! View-pair overlap graph and connected-component pruning.
//!
//! Nodes are view ids, edges are view pairs that kept enough matches. Only the
//! largest connected component can be harmonized against a single reference
//! camera, so everything else is removed from both the graph and the match set.

mod graphviz;
pub(crate) mod union_find;


use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::scene::{PairKey, PairwiseMatches, ViewId};
use union_find::UnionFind;

/// Minimum number of matches (all describers summed) for a pair to become an edge.
pub const MIN_PAIR_MATCHES: usize = 120;

/// Undirected graph of overlapping views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlapGraph {
    nodes: BTreeSet<ViewId>,
    edges: BTreeSet<PairKey>,
}

/// Outcome of pruning a graph to its largest connected component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneSummary {
    /// Node count of every component before pruning, in discovery order.
    pub component_sizes: Vec<usize>,
    pub kept_nodes: usize,
    pub kept_edges: usize,
    pub removed_nodes: usize,
    pub removed_edges: usize,
}

impl OverlapGraph {
    /// Builds a graph whose nodes are exactly the endpoints of `pairs`.
    pub fn from_pairs(pairs: impl IntoIterator<Item = PairKey>) -> Self {
        let edges: BTreeSet<PairKey> = pairs.into_iter().collect();
        let nodes = edges.iter().flat_map(|e| [e.lo(), e.hi()]).collect();
        Self { nodes, edges }
    }

    /// One edge per entry of the match set.
    pub fn from_matches(matches: &PairwiseMatches) -> Self {
        Self::from_pairs(matches.keys())
    }

    /// Nodes in ascending view id order.
    pub fn nodes(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.nodes.iter().copied()
    }

    /// Edges in ascending key order.
    pub fn edges(&self) -> impl Iterator<Item = PairKey> + '_ {
        self.edges.iter().copied()
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn contains_node(&self, view: ViewId) -> bool {
        self.nodes.contains(&view)
    }

    #[inline]
    pub fn contains_edge(&self, a: ViewId, b: ViewId) -> bool {
        self.edges.contains(&PairKey::new(a, b))
    }

    /// Connected components, ordered by their smallest view id.
    ///
    /// Each component lists its view ids in ascending order.
    pub fn connected_components(&self) -> Vec<Vec<ViewId>> {
        let node_ids: Vec<ViewId> = self.nodes.iter().copied().collect();
        let index_of = |view: ViewId| {
            node_ids
                .binary_search(&view)
                .unwrap_or_else(|_| unreachable!("edge endpoint {} is not a node", view))
        };

        let mut uf = UnionFind::new(node_ids.len());
        for edge in &self.edges {
            uf.union(index_of(edge.lo()), index_of(edge.hi()));
        }

        uf.groups()
            .into_iter()
            .map(|group| group.into_iter().map(|idx| node_ids[idx]).collect())
            .collect()
    }

    /// The component with the most nodes; the first one found wins ties.
    pub fn largest_component(&self) -> Option<Vec<ViewId>> {
        largest_of(self.connected_components())
    }

    /// Removes every node and edge outside the largest component, together
    /// with the match entries of the removed edges.
    ///
    /// Fails with [`Error::GraphEmpty`] when the graph has no component.
    pub fn prune_to_largest_component(
        &mut self,
        matches: &mut PairwiseMatches,
    ) -> Result<PruneSummary> {
        let components = self.connected_components();
        let component_sizes: Vec<usize> = components.iter().map(Vec::len).collect();
        tracing::info!(
            count = components.len(),
            sizes = ?component_sizes,
            "Connected components"
        );

        let keep: BTreeSet<ViewId> = largest_of(components)
            .ok_or(Error::GraphEmpty)?
            .into_iter()
            .collect();

        let removed_edges: Vec<PairKey> = self
            .edges
            .iter()
            .copied()
            .filter(|e| !keep.contains(&e.lo()))
            .collect();
        for edge in &removed_edges {
            self.edges.remove(edge);
            matches.remove(*edge);
        }

        let nodes_before = self.nodes.len();
        self.nodes.retain(|n| keep.contains(n));

        let summary = PruneSummary {
            component_sizes,
            kept_nodes: self.nodes.len(),
            kept_edges: self.edges.len(),
            removed_nodes: nodes_before - self.nodes.len(),
            removed_edges: removed_edges.len(),
        };
        tracing::info!(
            nodes = summary.kept_nodes,
            edges = summary.kept_edges,
            removed_nodes = summary.removed_nodes,
            removed_edges = summary.removed_edges,
            "Pruned graph to largest connected component"
        );
        Ok(summary)
    }
}

fn largest_of(components: Vec<Vec<ViewId>>) -> Option<Vec<ViewId>> {
    let mut best: Option<Vec<ViewId>> = None;
    for component in components {
        if best.as_ref().map_or(true, |b| component.len() > b.len()) {
            best = Some(component);
        }
    }
    best
}
