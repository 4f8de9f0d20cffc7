//! Selection, point lookups and record filtering.
//!
//! Lookups are answered by scanning the node set on demand; nothing here adds
//! edges to the graph. Filtering works on the collected records instead of
//! the graph, because a filter change triggers a full rebuild.

use std::collections::HashSet;

use log::debug;
use serde::Serialize;

use pedigree_core::{identifier::Id, individual::Individual};

use crate::{record::RawRecord, structure::PedigreeGraph};

/// Text and species restriction applied before a rebuild.
///
/// # Examples
///
/// ```
/// # use pedigree::{query::Filter, record::RawRecord};
/// let records = vec![
///     RawRecord::new("doc-1", "Bella", "Dog"),
///     RawRecord::new("doc-2", "Tom", "cat"),
/// ];
/// let filter = Filter::new().with_text("bell").with_species("dog");
/// assert_eq!(filter.apply(&records).len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    text: Option<String>,
    species: Option<String>,
}

impl Filter {
    /// A filter that lets every record through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive substring over id, name, prefix and suffix.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = non_blank(text.into());
        self
    }

    /// Case-insensitive species equality.
    pub fn with_species(mut self, species: impl Into<String>) -> Self {
        self.species = non_blank(species.into());
        self
    }

    pub fn is_active(&self) -> bool {
        self.text.is_some() || self.species.is_some()
    }

    pub fn matches(&self, record: &RawRecord) -> bool {
        let text_ok = self.text.as_deref().is_none_or(|needle| {
            [&record.id, &record.name, &record.prefix, &record.suffix]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(needle))
        });
        let species_ok = self.species.as_deref().is_none_or(|wanted| {
            record
                .species
                .as_deref()
                .is_some_and(|species| species.trim().to_lowercase() == wanted)
        });
        text_ok && species_ok
    }

    /// Keeps the matching records.
    ///
    /// The subset is closed: parent references to anything outside it are
    /// cleared, so no placeholders are synthesized for filtered-out relatives.
    /// An inactive filter returns the records unchanged.
    pub fn apply(&self, records: &[RawRecord]) -> Vec<RawRecord> {
        if !self.is_active() {
            return records.to_vec();
        }

        let mut kept: Vec<RawRecord> = records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect();
        let ids: HashSet<Id> = kept.iter().filter_map(RawRecord::key).collect();
        for record in &mut kept {
            if record.sire_key().is_some_and(|sire| !ids.contains(&sire)) {
                record.sire_id = None;
            }
            if record.dam_key().is_some_and(|dam| !ids.contains(&dam)) {
                record.dam_id = None;
            }
        }
        debug!(before = records.len(), after = kept.len(); "Filter applied");
        kept
    }
}

fn non_blank(value: String) -> Option<String> {
    let value = value.trim().to_lowercase();
    (!value.is_empty()).then_some(value)
}

/// A child together with the other parent, if known.
#[derive(Debug, Clone, Serialize)]
pub struct ChildWithPartner<'a> {
    child: &'a Individual,
    partner: Option<&'a Individual>,
}

impl<'a> ChildWithPartner<'a> {
    pub fn child(&self) -> &'a Individual {
        self.child
    }

    pub fn partner(&self) -> Option<&'a Individual> {
        self.partner
    }
}

/// Inspection projection of one individual.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detail<'a> {
    individual: &'a Individual,
    sire: Option<&'a Individual>,
    dam: Option<&'a Individual>,
    paternal_grandsire: Option<&'a Individual>,
    maternal_granddam: Option<&'a Individual>,
    children: Vec<ChildWithPartner<'a>>,
}

impl<'a> Detail<'a> {
    pub fn individual(&self) -> &'a Individual {
        self.individual
    }

    pub fn sire(&self) -> Option<&'a Individual> {
        self.sire
    }

    pub fn dam(&self) -> Option<&'a Individual> {
        self.dam
    }

    pub fn paternal_grandsire(&self) -> Option<&'a Individual> {
        self.paternal_grandsire
    }

    pub fn maternal_granddam(&self) -> Option<&'a Individual> {
        self.maternal_granddam
    }

    pub fn children(&self) -> &[ChildWithPartner<'a>] {
        &self.children
    }
}

impl PedigreeGraph {
    pub fn sire(&self, id: Id) -> Option<&Individual> {
        self.individual(id)?.sire_id().and_then(|sire| self.individual(sire))
    }

    pub fn dam(&self, id: Id) -> Option<&Individual> {
        self.individual(id)?.dam_id().and_then(|dam| self.individual(dam))
    }

    /// The sire of the sire.
    pub fn paternal_grandsire(&self, id: Id) -> Option<&Individual> {
        self.sire(self.sire(id)?.id())
    }

    /// The dam of the dam.
    pub fn maternal_granddam(&self, id: Id) -> Option<&Individual> {
        self.dam(self.dam(id)?.id())
    }

    /// Every child of `id`, in graph order, with the child's other parent.
    pub fn children_with_partner(&self, id: Id) -> Vec<ChildWithPartner<'_>> {
        self.individuals()
            .filter_map(|child| {
                let partner = if child.sire_id() == Some(id) {
                    child.dam_id()
                } else if child.dam_id() == Some(id) {
                    child.sire_id()
                } else {
                    return None;
                };
                Some(ChildWithPartner {
                    child,
                    partner: partner.and_then(|partner| self.individual(partner)),
                })
            })
            .collect()
    }

    /// Marks `id` as the selected individual and clears any previous selection.
    ///
    /// Returns `false`, leaving the selection untouched, if `id` is unknown.
    pub fn select(&mut self, id: Id) -> bool {
        if self.individual(id).is_none() {
            return false;
        }
        for individual in self.individuals_mut() {
            let selected = individual.id() == id;
            individual.set_selected(selected);
        }
        debug!(id:% = id; "Individual selected");
        true
    }

    pub fn selected(&self) -> Option<&Individual> {
        self.individuals().find(|individual| individual.is_selected())
    }

    /// The inspection projection of `id`.
    pub fn detail(&self, id: Id) -> Option<Detail<'_>> {
        Some(Detail {
            individual: self.individual(id)?,
            sire: self.sire(id),
            dam: self.dam(id),
            paternal_grandsire: self.paternal_grandsire(id),
            maternal_granddam: self.maternal_granddam(id),
            children: self.children_with_partner(id),
        })
    }
}
