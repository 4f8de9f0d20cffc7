//! Low-level graph data structures and primitives.
//!
//! This module provides the storage underneath [`PedigreeGraph`]: a small
//! directed graph keyed by node key, with insertion-ordered nodes so that
//! every traversal is reproducible.
//!
//! - [`EdgeIndex`]: Index of an edge in insertion order
//! - [`Edge`]: Edge structure storing source, target, and associated data
//! - [`GraphInternal`]: Core graph implementation with nodes and edges
//!
//! This is an internal module; its types are not exposed publicly.
//!
//! [`PedigreeGraph`]: super::PedigreeGraph

use std::{collections::HashMap, fmt::Debug, hash::Hash};

use indexmap::IndexMap;

/// Index for edges in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct EdgeIndex(usize);

/// A directed edge in the graph.
#[derive(Debug, Clone)]
pub(super) struct Edge<K, E> {
    source: K,
    target: K,
    value: E,
}

impl<K: Copy, E: Copy> Edge<K, E> {
    pub(super) fn source(&self) -> K {
        self.source
    }

    pub(super) fn target(&self) -> K {
        self.target
    }

    pub(super) fn value(&self) -> E {
        self.value
    }
}

/// Core graph data structure.
///
/// - Node storage by key, in insertion order
/// - Edge storage with edge data type `E`
/// - Tracking of incoming and outgoing edges for each node
///
/// Type parameters:
/// - `K`: Node key type
/// - `N`: Node data type
/// - `E`: Edge data type (must be Copy and Debug)
#[derive(Debug, Clone)]
pub(super) struct GraphInternal<K, N, E>
where
    K: Copy + Eq + Hash + Debug,
    N: Debug,
    E: Copy + Debug,
{
    nodes: IndexMap<K, N>,
    edges: Vec<Edge<K, E>>,
    income_edges: HashMap<K, Vec<EdgeIndex>>,
    outgoing_edges: HashMap<K, Vec<EdgeIndex>>,
}

impl<K, N, E> GraphInternal<K, N, E>
where
    K: Copy + Eq + Hash + Debug,
    N: Debug,
    E: Copy + Debug,
{
    /// Creates a new empty graph.
    pub(super) fn new() -> Self {
        GraphInternal {
            nodes: IndexMap::new(),
            edges: Vec::new(),
            income_edges: HashMap::new(),
            outgoing_edges: HashMap::new(),
        }
    }

    /// Returns the node data for the given key, if it exists.
    pub(super) fn node(&self, key: K) -> Option<&N> {
        self.nodes.get(&key)
    }

    /// Returns mutable node data for the given key, if it exists.
    pub(super) fn node_mut(&mut self, key: K) -> Option<&mut N> {
        self.nodes.get_mut(&key)
    }

    /// Returns an iterator over all nodes in insertion order.
    pub(super) fn nodes(&self) -> impl Iterator<Item = (K, &N)> {
        self.nodes.iter().map(|(key, node)| (*key, node))
    }

    /// Returns a mutable iterator over all node data in insertion order.
    pub(super) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut N> {
        self.nodes.values_mut()
    }

    /// Returns the total number of nodes in the graph.
    pub(super) fn nodes_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns an iterator over all edges in insertion order.
    pub(super) fn edges(&self) -> impl Iterator<Item = &Edge<K, E>> {
        self.edges.iter()
    }

    /// Returns an iterator over edges ending at `target`.
    pub(super) fn incoming_edges(&self, target: K) -> impl Iterator<Item = &Edge<K, E>> {
        self.income_edges
            .get(&target)
            .into_iter()
            .flatten()
            .map(|idx| &self.edges[idx.0])
    }

    /// Returns an iterator over edges starting at `source`.
    pub(super) fn outgoing_edges(&self, source: K) -> impl Iterator<Item = &Edge<K, E>> {
        self.outgoing_edges
            .get(&source)
            .into_iter()
            .flatten()
            .map(|idx| &self.edges[idx.0])
    }

    /// Adds a node to the graph with the given key and data.
    ///
    /// If a node with the same key already exists, the existing node is kept
    /// and `false` is returned.
    pub(super) fn add_node(&mut self, key: K, node: N) -> bool {
        if self.nodes.contains_key(&key) {
            return false;
        }
        self.nodes.insert(key, node);
        true
    }

    /// Adds a directed edge to the graph between two nodes.
    ///
    /// # Returns
    /// The index of the newly added edge.
    ///
    /// # Panics
    /// Panics in debug mode if either the source or target node does not exist in the graph.
    /// This panic is for internal developer testing and bug detection. In a release build,
    /// this check is optimized away.
    pub(super) fn add_edge(&mut self, source: K, target: K, edge: E) -> EdgeIndex {
        #[cfg(debug_assertions)]
        {
            assert!(
                self.nodes.contains_key(&source),
                "Adding edge: Source node {source:?} does not exist for {edge:?}",
            );
            assert!(
                self.nodes.contains_key(&target),
                "Adding edge: Target node {target:?} does not exist for {edge:?}",
            );
        }

        self.edges.push(Edge {
            source,
            target,
            value: edge,
        });

        let idx = EdgeIndex(self.edges.len() - 1);
        self.outgoing_edges.entry(source).or_default().push(idx);
        self.income_edges.entry(target).or_default().push(idx);
        idx
    }
}
