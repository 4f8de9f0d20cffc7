//! The record store collaborators consumed by the expander.
//!
//! The core never talks to a network itself. It calls a [`RelationSource`]
//! with an explicit [`SourceContext`] (API base, auth token, round deadline)
//! so nothing is read from process-wide state. [`MemoryStore`] is a
//! self-contained implementation over an in-memory record list, used by the
//! command-line front end and by tests.

use std::{collections::HashSet, fs, path::Path, time::Duration};

use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;

use pedigree_core::identifier::Id;

use crate::{
    config::SourceConfig,
    error::{FetchError, PedigreeError},
    record::RawRecord,
};

/// Explicit per-call context handed to every collaborator call.
#[derive(Debug, Clone)]
pub struct SourceContext {
    api_base: Option<String>,
    auth_token: Option<String>,
    round_timeout: Duration,
}

impl SourceContext {
    pub fn new(api_base: Option<String>, auth_token: Option<String>, round_timeout: Duration) -> Self {
        Self {
            api_base,
            auth_token,
            round_timeout,
        }
    }

    pub fn api_base(&self) -> Option<&str> {
        self.api_base.as_deref()
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Deadline for one round trip; every [`RelationSource`] must enforce it.
    pub fn round_timeout(&self) -> Duration {
        self.round_timeout
    }
}

impl From<&SourceConfig> for SourceContext {
    fn from(config: &SourceConfig) -> Self {
        Self::new(
            config.api_base().map(str::to_string),
            config.auth_token().map(str::to_string),
            config.round_timeout(),
        )
    }
}

/// External record store.
pub trait RelationSource {
    /// Returns the records of the authenticated owner's own individuals.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the round trip fails.
    fn list_owned(&self, context: &SourceContext) -> Result<Vec<RawRecord>, FetchError>;

    /// Returns records related to any id in `ids`: parents, children, and
    /// siblings sharing a parent. Records already known to the caller may be
    /// returned again.
    ///
    /// Implementations must enforce [`SourceContext::round_timeout`] and give
    /// up with [`FetchError::Timeout`] once it passes. The caller only checks
    /// the elapsed time after this returns, so it cannot cut off a call that
    /// never does.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the round trip fails or times out.
    fn expand(&self, context: &SourceContext, ids: &[Id]) -> Result<Vec<RawRecord>, FetchError>;
}

/// On-disk layout of a record store file.
#[derive(Debug, Default, Deserialize)]
struct StoreFile {
    #[serde(default)]
    owned: Vec<RawRecord>,
    #[serde(default)]
    records: Vec<RawRecord>,
}

/// A record store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    owned: Vec<RawRecord>,
    records: IndexMap<Id, RawRecord>,
}

impl MemoryStore {
    /// Creates a store from the owner's records and all other known records.
    ///
    /// Owned records are searchable by [`RelationSource::expand`] too. When
    /// an id appears more than once, the first record wins.
    pub fn new(owned: Vec<RawRecord>, records: Vec<RawRecord>) -> Self {
        let mut index = IndexMap::new();
        for record in owned.iter().chain(records.iter()) {
            if let Some(id) = record.key() {
                index.entry(id).or_insert_with(|| record.clone());
            }
        }
        Self {
            owned,
            records: index,
        }
    }

    /// Parses a store from JSON of the form `{"owned": [...], "records": [...]}`.
    ///
    /// # Errors
    ///
    /// Returns [`PedigreeError::Json`] if the document is not a valid store.
    pub fn from_json(json: &str) -> Result<Self, PedigreeError> {
        let file: StoreFile = serde_json::from_str(json)?;
        Ok(Self::new(file.owned, file.records))
    }

    /// Reads and parses a store file.
    ///
    /// # Errors
    ///
    /// Returns [`PedigreeError::Io`] or [`PedigreeError::Json`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PedigreeError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Number of distinct ids in the store.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RelationSource for MemoryStore {
    fn list_owned(&self, _context: &SourceContext) -> Result<Vec<RawRecord>, FetchError> {
        Ok(self.owned.clone())
    }

    fn expand(&self, _context: &SourceContext, ids: &[Id]) -> Result<Vec<RawRecord>, FetchError> {
        let batch: HashSet<Id> = ids.iter().copied().collect();

        // Parents of the batch are wanted directly; they also define siblings.
        let mut parents = HashSet::new();
        for id in ids {
            if let Some(record) = self.records.get(id) {
                parents.extend(record.sire_key());
                parents.extend(record.dam_key());
            }
        }

        let related: Vec<RawRecord> = self
            .records
            .iter()
            .filter(|(id, record)| {
                parents.contains(id)
                    || record
                        .sire_key()
                        .is_some_and(|sire| batch.contains(&sire) || parents.contains(&sire))
                    || record
                        .dam_key()
                        .is_some_and(|dam| batch.contains(&dam) || parents.contains(&dam))
            })
            .map(|(_, record)| record.clone())
            .collect();

        debug!(batch = ids.len(), related = related.len(); "Memory store expanded batch");
        Ok(related)
    }
}
