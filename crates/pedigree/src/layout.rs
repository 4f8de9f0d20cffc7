//! Hierarchical pedigree layout.
//!
//! The [`Engine`] runs four stages over a [`PedigreeGraph`]:
//!
//! 1. ranking: one generation per individual, parents strictly above children
//! 2. ordering: left to right order within each generation
//! 3. placement: pixel coordinates from rank and order
//! 4. alignment: partners on one row, spaced apart, one junction per union
//!
//! The result is a [`Scene`] ready for a renderer.

mod align;
mod order;
mod rank;

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, info};
use serde::{Serialize, Serializer, ser::SerializeStruct};

use pedigree_core::{
    geometry::{Bounds, Point},
    identifier::Id,
    individual::{Gender, Individual},
};

use crate::{
    config::LayoutConfig,
    error::PedigreeError,
    record::Diagnostic,
    structure::{GraphEdge, NodeKey, PedigreeGraph, UnionKey},
};

use align::UnionLink;

/// Kind of a laid out node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Individual,
    Union,
}

/// What the renderer shows for an individual.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDisplay {
    label: String,
    species: String,
    gender: Gender,
    image: Option<String>,
    owned: bool,
}

impl NodeDisplay {
    fn new(individual: &Individual) -> Self {
        Self {
            label: individual.display_name(),
            species: individual.species().to_string(),
            gender: individual.gender(),
            image: individual.image().map(str::to_string),
            owned: individual.is_owned(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }
}

/// One node of the scene, individual or union.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutNode {
    key: NodeKey,
    kind: NodeKind,
    rank: usize,
    /// Position within the generation; unions have none.
    order: Option<usize>,
    #[serde(flatten)]
    position: Point,
    /// Present for individuals only.
    display: Option<NodeDisplay>,
}

impl LayoutNode {
    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn order(&self) -> Option<usize> {
        self.order
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn display(&self) -> Option<&NodeDisplay> {
        self.display.as_ref()
    }
}

/// Rank, order and final position of one individual.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    rank: usize,
    order: usize,
    position: Point,
}

/// A fully positioned pedigree.
#[derive(Debug, Clone)]
pub struct PedigreeLayout {
    placements: IndexMap<Id, Placement>,
    displays: HashMap<Id, NodeDisplay>,
    links: Vec<UnionLink>,
    junctions: IndexMap<UnionKey, Point>,
    edges: Vec<GraphEdge>,
    diagnostics: Vec<Diagnostic>,
    ranking_edges: Vec<(Id, Id)>,
    partner_spacing: f32,
}

impl PedigreeLayout {
    /// All nodes: individuals in graph order, then unions by key.
    pub fn nodes(&self) -> Vec<LayoutNode> {
        let individuals = self.placements.iter().map(|(&id, placement)| LayoutNode {
            key: NodeKey::Individual(id),
            kind: NodeKind::Individual,
            rank: placement.rank,
            order: Some(placement.order),
            position: placement.position,
            display: self.displays.get(&id).cloned(),
        });
        let unions = self.links.iter().filter_map(|link| {
            Some(LayoutNode {
                key: NodeKey::Union(link.key),
                kind: NodeKind::Union,
                rank: self.placements.get(&link.sire)?.rank,
                order: None,
                position: *self.junctions.get(&link.key)?,
                display: None,
            })
        });
        individuals.chain(unions).collect()
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn position(&self, id: Id) -> Option<Point> {
        self.placements.get(&id).map(|placement| placement.position)
    }

    pub fn rank(&self, id: Id) -> Option<usize> {
        self.placements.get(&id).map(|placement| placement.rank)
    }

    pub fn order(&self, id: Id) -> Option<usize> {
        self.placements.get(&id).map(|placement| placement.order)
    }

    /// The point where a union's partner line meets its child line.
    pub fn junction(&self, key: UnionKey) -> Option<Point> {
        self.junctions.get(&key).copied()
    }

    /// Bounds of every individual and junction.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::enclosing(
            self.placements
                .values()
                .map(|placement| placement.position)
                .chain(self.junctions.values().copied()),
        )
    }

    /// Graph and ranking findings, in the order they were found.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The `(parent, child)` edges generations were ranked by: every parent
    /// reference that does not close a cycle.
    pub fn ranking_edges(&self) -> &[(Id, Id)] {
        &self.ranking_edges
    }

    pub fn partner_spacing(&self) -> f32 {
        self.partner_spacing
    }

    /// Runs partner alignment again over this layout's own coordinates.
    pub fn realign(&self) -> Self {
        let mut positions: HashMap<Id, Point> = self
            .placements
            .iter()
            .map(|(&id, placement)| (id, placement.position))
            .collect();
        let junctions = align::align(&mut positions, &self.links, self.partner_spacing);

        let mut layout = self.clone();
        for (id, placement) in &mut layout.placements {
            if let Some(&position) = positions.get(id) {
                placement.position = position;
            }
        }
        layout.junctions = junctions;
        layout
    }
}

impl Serialize for PedigreeLayout {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PedigreeLayout", 4)?;
        state.serialize_field("nodes", &self.nodes())?;
        state.serialize_field("edges", &self.edges)?;
        state.serialize_field("bounds", &self.bounds())?;
        state.serialize_field("diagnostics", &self.diagnostics)?;
        state.end()
    }
}

/// Output of a layout run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Scene {
    /// Nothing to show; not an error.
    Empty,
    Ready(PedigreeLayout),
}

impl Scene {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn layout(&self) -> Option<&PedigreeLayout> {
        match self {
            Self::Empty => None,
            Self::Ready(layout) => Some(layout),
        }
    }
}

/// The pedigree layout engine.
#[derive(Debug, Clone)]
pub struct Engine {
    /// Horizontal distance between neighbours in a generation
    node_spacing: f32,

    /// Vertical distance between generations
    generation_spacing: f32,

    /// Minimum horizontal distance between partners after alignment
    partner_spacing: f32,

    /// Upper bound on ordering sweeps
    max_sweeps: usize,
}

impl Engine {
    /// Create a new engine with default spacing.
    pub fn new() -> Self {
        Self::from_config(&LayoutConfig::default())
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            node_spacing: config.node_spacing(),
            generation_spacing: config.generation_spacing(),
            partner_spacing: config.partner_spacing(),
            max_sweeps: config.max_sweeps(),
        }
    }

    /// Set the horizontal spacing between neighbours
    pub fn set_node_spacing(&mut self, spacing: f32) -> &mut Self {
        self.node_spacing = spacing;
        self
    }

    /// Set the vertical spacing between generations
    pub fn set_generation_spacing(&mut self, spacing: f32) -> &mut Self {
        self.generation_spacing = spacing;
        self
    }

    /// Set the minimum spacing between partners
    pub fn set_partner_spacing(&mut self, spacing: f32) -> &mut Self {
        self.partner_spacing = spacing;
        self
    }

    /// Set the ordering sweep cap
    pub fn set_max_sweeps(&mut self, sweeps: usize) -> &mut Self {
        self.max_sweeps = sweeps;
        self
    }

    /// Lays out `graph`.
    ///
    /// A graph without individuals yields [`Scene::Empty`].
    ///
    /// # Errors
    ///
    /// Returns [`PedigreeError::Layout`] if a stage leaves an individual
    /// without a position.
    pub fn calculate(&self, graph: &PedigreeGraph) -> Result<Scene, PedigreeError> {
        if graph.individuals().next().is_none() {
            info!("Nothing to lay out");
            return Ok(Scene::Empty);
        }

        let ranking = rank::assign_ranks(graph)?;
        let layers = order::order_layers(graph, &ranking, self.max_sweeps);
        let mut positions = self.place(&layers);

        let mut unions: Vec<_> = graph.unions().collect();
        unions.sort_by_key(|union| union.key());
        let links: Vec<UnionLink> = unions
            .into_iter()
            .map(|union| UnionLink {
                key: union.key(),
                sire: union.sire(),
                dam: union.dam(),
                children: union.children().to_vec(),
            })
            .collect();
        let junctions = align::align(&mut positions, &links, self.partner_spacing);

        let orders: HashMap<Id, usize> = layers
            .iter()
            .flat_map(|layer| layer.iter().enumerate().map(|(order, &id)| (id, order)))
            .collect();

        let mut placements = IndexMap::new();
        let mut displays = HashMap::new();
        for individual in graph.individuals() {
            let id = individual.id();
            let (Some(rank), Some(&order), Some(&position)) =
                (ranking.rank(id), orders.get(&id), positions.get(&id))
            else {
                return Err(PedigreeError::Layout(format!("{id} was not placed")));
            };
            placements.insert(
                id,
                Placement {
                    rank,
                    order,
                    position,
                },
            );
            displays.insert(id, NodeDisplay::new(individual));
        }

        let (ranking_edges, ranking_diagnostics) = ranking.into_parts();
        let mut diagnostics = graph.diagnostics().to_vec();
        diagnostics.extend(ranking_diagnostics);

        let layout = PedigreeLayout {
            placements,
            displays,
            links,
            junctions,
            edges: graph.edges().collect(),
            diagnostics,
            ranking_edges,
            partner_spacing: self.partner_spacing,
        };
        info!(
            individuals = layout.placements.len(),
            unions = layout.links.len(),
            generations = layers.len();
            "Layout calculated"
        );
        Ok(Scene::Ready(layout))
    }

    /// Pixel coordinates from rank and order, each generation centred on the widest.
    fn place(&self, layers: &[Vec<Id>]) -> HashMap<Id, Point> {
        let widest = layers.iter().map(Vec::len).max().unwrap_or_default();
        let mut positions = HashMap::new();
        for (rank, layer) in layers.iter().enumerate() {
            let offset = (widest - layer.len()) as f32 / 2.0;
            let y = rank as f32 * self.generation_spacing;
            for (order, &id) in layer.iter().enumerate() {
                let x = (order as f32 + offset) * self.node_spacing;
                positions.insert(id, Point::new(x, y));
            }
        }
        debug!(generations = layers.len(), widest; "Placed individuals");
        positions
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
