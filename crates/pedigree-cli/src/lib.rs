//! CLI logic for the pedigree layout tool.
//!
//! Reads a JSON record store, expands the owner's individuals into their
//! relatives, lays the pedigree out and writes the scene as JSON.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::{info, warn};
use serde::Serialize;

use pedigree::{
    PedigreeBuilder, PedigreeError,
    expand::Expansion,
    identifier::Id,
    layout::Scene,
    query::{Detail, Filter},
    record::Diagnostic,
    source::MemoryStore,
};

/// Summary of the expansion that fed the scene.
#[derive(Debug, Serialize)]
struct ExpansionSummary {
    records: usize,
    rounds: usize,
    termination: String,
}

impl From<&Expansion> for ExpansionSummary {
    fn from(expansion: &Expansion) -> Self {
        Self {
            records: expansion.records().len(),
            rounds: expansion.rounds(),
            termination: expansion.termination().to_string(),
        }
    }
}

/// Everything written to the output file.
#[derive(Debug, Serialize)]
struct Report<'a> {
    scene: &'a Scene,
    expansion: ExpansionSummary,
    selected: Option<Detail<'a>>,
    diagnostics: &'a [Diagnostic],
}

/// Run the pedigree CLI application
///
/// This function loads the record store, builds and lays out the pedigree,
/// and writes the resulting scene to the output file.
///
/// # Errors
///
/// Returns `PedigreeError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed record store files
/// - A failing owned-records listing
/// - Layout errors
pub fn run(args: &Args) -> Result<(), PedigreeError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing record store"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let store = MemoryStore::from_path(&args.input)?;
    info!(records = store.len(); "Record store loaded");

    let mut filter = Filter::new();
    if let Some(text) = &args.filter {
        filter = filter.with_text(text);
    }
    if let Some(species) = &args.species {
        filter = filter.with_species(species);
    }

    let builder = PedigreeBuilder::new(app_config);
    let expansion = builder.collect(&store)?;
    let mut pedigree = builder.build(expansion.records(), &filter)?;

    let selected = args.select.as_deref().and_then(|raw| {
        // An id that was never interned cannot be part of the graph.
        let id = Id::lookup(raw.trim()).filter(|&id| pedigree.select(id));
        if id.is_none() {
            warn!(id = raw; "Selected individual is not in the pedigree");
        }
        id
    });

    let report = Report {
        scene: pedigree.scene(),
        expansion: ExpansionSummary::from(&expansion),
        selected: selected.and_then(|id| pedigree.detail(id)),
        diagnostics: pedigree.diagnostics(),
    };
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(&args.output, json)?;

    info!(output_file = args.output; "Scene exported successfully");

    Ok(())
}
