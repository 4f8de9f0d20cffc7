//! Relationship expansion.
//!
//! Starting from the owner's records, the [`Expander`] asks the record store
//! for relatives of every id it has not expanded yet, one round at a time,
//! until a round discovers nobody new or the round cap is reached. The set
//! only ever grows. A failed or overdue round ends expansion with whatever
//! was gathered so far, because a partial family tree is still displayable.

use std::{collections::HashSet, fmt, time::Instant};

use indexmap::IndexMap;
use log::{debug, info, warn};

use pedigree_core::identifier::Id;

use crate::{
    config::ExpansionConfig,
    error::FetchError,
    record::RawRecord,
    source::{RelationSource, SourceContext},
};

/// Why expansion stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// A round found no new individuals and nothing is left to expand.
    Converged,
    /// The configured round cap was reached.
    RoundCap,
    /// A round failed; the records gathered before it are kept.
    Interrupted(FetchError),
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => f.write_str("converged"),
            Self::RoundCap => f.write_str("round cap reached"),
            Self::Interrupted(err) => write!(f, "interrupted: {err}"),
        }
    }
}

/// The monotonically grown record set and how it was obtained.
#[derive(Debug, Clone)]
pub struct Expansion {
    records: Vec<RawRecord>,
    rounds: usize,
    termination: Termination,
}

impl Expansion {
    /// All gathered records: owned records first, then discoveries in the
    /// order they were found.
    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<RawRecord> {
        self.records
    }

    /// Number of expand round trips performed.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn termination(&self) -> &Termination {
        &self.termination
    }
}

/// Drives expansion rounds against a [`RelationSource`].
pub struct Expander<'a, S: RelationSource + ?Sized> {
    source: &'a S,
    context: SourceContext,
    max_rounds: usize,
    max_batch: usize,
}

impl<'a, S: RelationSource + ?Sized> Expander<'a, S> {
    /// Create a new expander over `source`.
    pub fn new(source: &'a S, context: SourceContext, config: &ExpansionConfig) -> Self {
        Self {
            source,
            context,
            max_rounds: config.max_rounds(),
            max_batch: config.max_batch().max(1),
        }
    }

    /// Expands `owned` into the set of all reachable relatives.
    ///
    /// Records without a usable id are carried through untouched so the graph
    /// builder can report them; they are never expanded.
    pub fn expand(&self, owned: Vec<RawRecord>) -> Expansion {
        let mut known: IndexMap<Id, RawRecord> = IndexMap::new();
        let mut anonymous = Vec::new();
        for record in owned {
            let record = record.with_owned(true);
            match record.key() {
                Some(id) => {
                    known.entry(id).or_insert(record);
                }
                None => anonymous.push(record),
            }
        }

        let mut expanded: HashSet<Id> = HashSet::new();
        let mut rounds = 0;
        let termination = loop {
            let batch: Vec<Id> = known
                .keys()
                .filter(|id| !expanded.contains(*id))
                .take(self.max_batch)
                .copied()
                .collect();
            if batch.is_empty() {
                break Termination::Converged;
            }
            if rounds == self.max_rounds {
                break Termination::RoundCap;
            }
            rounds += 1;

            let started = Instant::now();
            let result = self.source.expand(&self.context, &batch);
            let elapsed = started.elapsed();
            expanded.extend(batch.iter().copied());

            let records = match result {
                Ok(_) if elapsed > self.context.round_timeout() => {
                    break Termination::Interrupted(FetchError::Timeout { elapsed });
                }
                Ok(records) => records,
                Err(err) => break Termination::Interrupted(err),
            };

            let mut added = 0;
            for record in records {
                let Some(id) = record.key() else {
                    anonymous.push(record.with_owned(false));
                    continue;
                };
                if !known.contains_key(&id) {
                    known.insert(id, record.with_owned(false));
                    added += 1;
                }
            }
            debug!(round = rounds, batch = batch.len(), added; "Expansion round finished");

            let pending = known.keys().any(|id| !expanded.contains(id));
            if added == 0 && !pending {
                break Termination::Converged;
            }
        };

        match &termination {
            Termination::Interrupted(err) => {
                warn!(rounds, known = known.len(), error:% = err; "Expansion interrupted, keeping partial set");
            }
            Termination::RoundCap => {
                warn!(rounds, known = known.len(); "Expansion stopped at round cap");
            }
            Termination::Converged => {
                info!(rounds, known = known.len(); "Expansion converged");
            }
        }

        let mut records: Vec<RawRecord> = known.into_values().collect();
        records.extend(anonymous);
        Expansion {
            records,
            rounds,
            termination,
        }
    }
}
