//! Pedigree - relationship expansion, graph building and hierarchical layout
//! for animal family trees.
//!
//! Starting from an owner's individuals, relatives are discovered through a
//! [`source::RelationSource`], merged into a graph with one union node per
//! mating pair, and laid out generation by generation with partners aligned
//! side by side.

pub mod config;
pub mod error;
pub mod expand;
pub mod layout;
pub mod query;
pub mod rebuild;
pub mod record;
pub mod source;
pub mod structure;

pub use pedigree_core::{geometry, identifier, individual};

pub use error::{FetchError, PedigreeError};

use log::{debug, info, trace};

use config::AppConfig;
use expand::{Expander, Expansion};
use identifier::Id;
use layout::{Engine, Scene};
use query::{Detail, Filter};
use record::{Diagnostic, RawRecord};
use source::{RelationSource, SourceContext};
use structure::PedigreeGraph;

/// The result of one rebuild: the graph and its laid out scene.
#[derive(Debug, Clone)]
pub struct Pedigree {
    graph: PedigreeGraph,
    scene: Scene,
}

impl Pedigree {
    pub fn graph(&self) -> &PedigreeGraph {
        &self.graph
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Every malformed-record finding of this rebuild.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self.scene.layout() {
            Some(layout) => layout.diagnostics(),
            None => self.graph.diagnostics(),
        }
    }

    /// Selects `id`; see [`PedigreeGraph::select`].
    pub fn select(&mut self, id: Id) -> bool {
        self.graph.select(id)
    }

    pub fn detail(&self, id: Id) -> Option<Detail<'_>> {
        self.graph.detail(id)
    }
}

/// Builder for loading and laying out pedigrees.
///
/// # Examples
///
/// ```
/// use pedigree::{PedigreeBuilder, config::AppConfig, query::Filter, record::RawRecord};
///
/// let records = vec![
///     RawRecord::new("doc-sire", "Sire", "dog"),
///     RawRecord::new("doc-dam", "Dam", "dog"),
///     RawRecord::new("doc-pup", "Pup", "dog")
///         .with_sire("doc-sire")
///         .with_dam("doc-dam"),
/// ];
///
/// let builder = PedigreeBuilder::new(AppConfig::default());
/// let pedigree = builder
///     .build(&records, &Filter::new())
///     .expect("Failed to lay out");
///
/// assert_eq!(pedigree.graph().unions().count(), 1);
/// assert!(!pedigree.scene().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct PedigreeBuilder {
    config: AppConfig,
}

impl PedigreeBuilder {
    /// Create a new pedigree builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Fetches the owner's individuals and expands them into all reachable
    /// relatives.
    ///
    /// # Errors
    ///
    /// Returns [`PedigreeError::Fetch`] if the owner's individuals cannot be
    /// listed. Failures during later expansion rounds are not errors; they
    /// end expansion with a partial set.
    pub fn collect<S: RelationSource + ?Sized>(&self, source: &S) -> Result<Expansion, PedigreeError> {
        let context = SourceContext::from(self.config.source());
        info!("Loading owned individuals");
        let owned = source.list_owned(&context)?;
        debug!(owned = owned.len(); "Owned individuals loaded");

        let expansion = Expander::new(source, context, self.config.expansion()).expand(owned);
        info!(
            records = expansion.records().len(),
            rounds = expansion.rounds(),
            termination:% = expansion.termination();
            "Relatives collected"
        );
        Ok(expansion)
    }

    /// Builds the graph over the records passing `filter` and lays it out.
    ///
    /// # Errors
    ///
    /// Returns [`PedigreeError::Layout`] if the layout engine fails.
    pub fn build(&self, records: &[RawRecord], filter: &Filter) -> Result<Pedigree, PedigreeError> {
        let records = filter.apply(records);
        trace!(filter:?; "Building pedigree");

        info!(records = records.len(); "Building pedigree graph");
        let graph = PedigreeGraph::from_records(&records);

        info!("Calculating layout");
        let scene = Engine::from_config(self.config.layout()).calculate(&graph)?;
        debug!(empty = scene.is_empty(); "Layout finished");

        Ok(Pedigree { graph, scene })
    }

    /// Collects from `source` and builds in one go.
    ///
    /// # Errors
    ///
    /// See [`PedigreeBuilder::collect`] and [`PedigreeBuilder::build`].
    pub fn load<S: RelationSource + ?Sized>(
        &self,
        source: &S,
        filter: &Filter,
    ) -> Result<Pedigree, PedigreeError> {
        let expansion = self.collect(source)?;
        self.build(expansion.records(), filter)
    }
}
