//! Graph structures for pedigrees.
//!
//! [`PedigreeGraph`] turns the flat record set into individual nodes,
//! synthetic union nodes for mating pairs, and the edges between them.
//!
//! # Edges
//!
//! - `sire → union` and `dam → union`: [`EdgeKind::Partner`], one pair per union
//! - `union → child`: [`EdgeKind::Parent`], once per child of that pair
//! - `parent → child`: [`EdgeKind::Parent`], when only one parent is known
//!
//! Every edge endpoint is a node of the graph: parents that are referenced
//! but were never fetched are replaced by placeholder individuals.

mod graph_base;

use std::{collections::HashSet, fmt};

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Serialize, Serializer};

use pedigree_core::{
    identifier::Id,
    individual::{Gender, Individual},
};

use crate::record::{Diagnostic, DiagnosticKind, RawRecord};

use graph_base::GraphInternal;

/// Key of a union: the sorted pair of its parents' ids.
///
/// Sorting makes the key independent of which parent was seen first, so a
/// pair can never produce two unions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnionKey {
    first: Id,
    second: Id,
}

impl UnionKey {
    /// Creates the key for the pair `{a, b}`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pedigree::structure::UnionKey;
    /// # use pedigree_core::identifier::Id;
    /// let sire = Id::new("union-doc-sire");
    /// let dam = Id::new("union-doc-dam");
    /// assert_eq!(UnionKey::new(sire, dam), UnionKey::new(dam, sire));
    /// ```
    pub fn new(a: Id, b: Id) -> Self {
        debug_assert_ne!(a, b, "a union needs two distinct parents");
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// Both members, in key order.
    pub fn members(self) -> [Id; 2] {
        [self.first, self.second]
    }
}

impl fmt::Display for UnionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.first, self.second)
    }
}

impl Serialize for UnionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Key of any node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
    Individual(Id),
    Union(UnionKey),
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Individual(id) => write!(f, "{id}"),
            Self::Union(key) => write!(f, "union:{key}"),
        }
    }
}

impl Serialize for NodeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A mating pair, synthesized from the parent references of its children.
#[derive(Debug, Clone, PartialEq)]
pub struct Union {
    key: UnionKey,
    sire: Id,
    dam: Id,
    children: Vec<Id>,
}

impl Union {
    fn new(sire: Id, dam: Id) -> Self {
        Self {
            key: UnionKey::new(sire, dam),
            sire,
            dam,
            children: Vec::new(),
        }
    }

    pub fn key(&self) -> UnionKey {
        self.key
    }

    /// The sire as named by the first child that introduced this pair.
    pub fn sire(&self) -> Id {
        self.sire
    }

    /// The dam as named by the first child that introduced this pair.
    pub fn dam(&self) -> Id {
        self.dam
    }

    pub fn children(&self) -> &[Id] {
        &self.children
    }
}

/// Node payload.
#[derive(Debug, Clone)]
enum PedigreeNode {
    Individual(Individual),
    Union(Union),
}

/// Edge kinds as consumed by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EdgeKind {
    /// Descent: union → child, or a lone parent → child.
    #[serde(rename = "parent-link")]
    Parent,
    /// Membership of a parent in a union; layout and rendering only.
    #[serde(rename = "partner-link")]
    Partner,
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    source: NodeKey,
    target: NodeKey,
    kind: EdgeKind,
}

impl GraphEdge {
    pub fn source(&self) -> NodeKey {
        self.source
    }

    pub fn target(&self) -> NodeKey {
        self.target
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }
}

/// The assembled pedigree: individuals, unions and their edges.
#[derive(Debug, Clone)]
pub struct PedigreeGraph {
    graph: GraphInternal<NodeKey, PedigreeNode, EdgeKind>,
    diagnostics: Vec<Diagnostic>,
}

impl PedigreeGraph {
    /// Builds the graph from raw records.
    ///
    /// Records are normalized first; malformed ones are dropped and reported
    /// through [`PedigreeGraph::diagnostics`]. The first record seen for an id
    /// wins over later duplicates. References to a dropped record are removed
    /// rather than replaced by a placeholder.
    pub fn from_records(records: &[RawRecord]) -> Self {
        let mut diagnostics = Vec::new();
        let mut individuals: IndexMap<Id, Individual> = IndexMap::new();
        let mut malformed: HashSet<Id> = HashSet::new();

        for record in records {
            match record.normalize() {
                Ok((individual, issues)) => {
                    if individuals.contains_key(&individual.id()) {
                        debug!(id:% = individual.id(); "Ignoring duplicate record");
                        continue;
                    }
                    diagnostics.extend(issues);
                    individuals.insert(individual.id(), individual);
                }
                Err(diagnostic) => {
                    malformed.extend(diagnostic.id());
                    diagnostics.push(diagnostic);
                }
            }
        }

        malformed.retain(|id| !individuals.contains_key(id));
        if !malformed.is_empty() {
            for individual in individuals.values_mut() {
                let sire = individual.sire_id().filter(|id| malformed.contains(id));
                let dam = individual.dam_id().filter(|id| malformed.contains(id));
                if sire.is_none() && dam.is_none() {
                    continue;
                }
                let id = individual.id();
                let cleaned = individual
                    .clone()
                    .with_sire(individual.sire_id().filter(|_| sire.is_none()))
                    .with_dam(individual.dam_id().filter(|_| dam.is_none()));
                *individual = cleaned;
                diagnostics.push(Diagnostic::new(Some(id), DiagnosticKind::MalformedParent));
            }
        }

        for diagnostic in &diagnostics {
            warn!(kind:? = diagnostic.kind(); "Malformed record: {diagnostic}");
        }

        Self::from_individuals(individuals.into_values().collect(), diagnostics)
    }

    fn from_individuals(individuals: Vec<Individual>, diagnostics: Vec<Diagnostic>) -> Self {
        let known: HashSet<Id> = individuals.iter().map(Individual::id).collect();

        let mut placeholders: IndexMap<Id, Individual> = IndexMap::new();
        for individual in &individuals {
            let parents = [
                (individual.sire_id(), Gender::Male),
                (individual.dam_id(), Gender::Female),
            ];
            for (parent, gender) in parents {
                let Some(parent) = parent else { continue };
                if !known.contains(&parent) {
                    placeholders.entry(parent).or_insert_with(|| {
                        Individual::placeholder(parent, gender, individual.species())
                    });
                }
            }
        }
        if !placeholders.is_empty() {
            debug!(count = placeholders.len(); "Synthesized placeholder parents");
        }

        let relations: Vec<(Id, Option<Id>, Option<Id>)> = individuals
            .iter()
            .map(|individual| (individual.id(), individual.sire_id(), individual.dam_id()))
            .collect();

        let mut graph = GraphInternal::new();
        for individual in individuals.into_iter().chain(placeholders.into_values()) {
            graph.add_node(
                NodeKey::Individual(individual.id()),
                PedigreeNode::Individual(individual),
            );
        }

        let mut unions = 0;
        for (child, sire, dam) in relations {
            let child_key = NodeKey::Individual(child);
            match (sire, dam) {
                (Some(sire), Some(dam)) => {
                    let union = Union::new(sire, dam);
                    let union_key = NodeKey::Union(union.key());
                    if graph.add_node(union_key, PedigreeNode::Union(union)) {
                        graph.add_edge(NodeKey::Individual(sire), union_key, EdgeKind::Partner);
                        graph.add_edge(NodeKey::Individual(dam), union_key, EdgeKind::Partner);
                        unions += 1;
                    }
                    let is_new_child = match graph.node_mut(union_key) {
                        Some(PedigreeNode::Union(union)) if !union.children.contains(&child) => {
                            union.children.push(child);
                            true
                        }
                        _ => false,
                    };
                    if is_new_child {
                        graph.add_edge(union_key, child_key, EdgeKind::Parent);
                    }
                }
                (Some(parent), None) | (None, Some(parent)) => {
                    graph.add_edge(NodeKey::Individual(parent), child_key, EdgeKind::Parent);
                }
                (None, None) => {}
            }
        }

        info!(
            nodes = graph.nodes_count(),
            unions,
            edges = graph.edges().count();
            "Pedigree graph built"
        );

        Self { graph, diagnostics }
    }

    /// Returns true when the graph has no individuals.
    pub fn is_empty(&self) -> bool {
        self.graph.nodes_count() == 0
    }

    /// Total number of nodes, individuals and unions.
    pub fn nodes_count(&self) -> usize {
        self.graph.nodes_count()
    }

    /// All individuals (including placeholders) in insertion order.
    pub fn individuals(&self) -> impl Iterator<Item = &Individual> {
        self.graph.nodes().filter_map(|(_, node)| match node {
            PedigreeNode::Individual(individual) => Some(individual),
            PedigreeNode::Union(_) => None,
        })
    }

    /// All unions in the order their pairs were first seen.
    pub fn unions(&self) -> impl Iterator<Item = &Union> {
        self.graph.nodes().filter_map(|(_, node)| match node {
            PedigreeNode::Union(union) => Some(union),
            PedigreeNode::Individual(_) => None,
        })
    }

    pub fn individual(&self, id: Id) -> Option<&Individual> {
        match self.graph.node(NodeKey::Individual(id)) {
            Some(PedigreeNode::Individual(individual)) => Some(individual),
            _ => None,
        }
    }

    pub(crate) fn individuals_mut(&mut self) -> impl Iterator<Item = &mut Individual> {
        self.graph.nodes_mut().filter_map(|node| match node {
            PedigreeNode::Individual(individual) => Some(individual),
            PedigreeNode::Union(_) => None,
        })
    }

    pub fn union(&self, key: UnionKey) -> Option<&Union> {
        match self.graph.node(NodeKey::Union(key)) {
            Some(PedigreeNode::Union(union)) => Some(union),
            _ => None,
        }
    }

    /// The union a child descends from, if both its parents are known.
    pub fn union_of(&self, child: Id) -> Option<&Union> {
        self.graph
            .incoming_edges(NodeKey::Individual(child))
            .find_map(|edge| match edge.source() {
                NodeKey::Union(key) => self.union(key),
                NodeKey::Individual(_) => None,
            })
    }

    /// Targets of the outgoing edges of `key`, in insertion order.
    pub fn successors(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> {
        self.graph.outgoing_edges(key).map(|edge| edge.target())
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = GraphEdge> {
        self.graph.edges().map(|edge| GraphEdge {
            source: edge.source(),
            target: edge.target(),
            kind: edge.value(),
        })
    }

    /// Malformed-record findings gathered while building.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
