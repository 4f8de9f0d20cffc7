//! Rebuild coordination.
//!
//! Every load or filter change starts a rebuild with a fresh [`Generation`]
//! ticket. A finished rebuild may only publish while its ticket is still the
//! latest one issued, so a slow, stale rebuild can never overwrite the result
//! of a newer one.

use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use pedigree_core::identifier::Id;

use crate::Pedigree;

/// Ticket identifying one rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Issues monotonically increasing generations.
#[derive(Debug, Default)]
pub struct RebuildGate {
    latest: AtomicU64,
}

impl RebuildGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the ticket for a new rebuild, superseding all earlier ones.
    pub fn begin(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// The most recently issued ticket, if any.
    pub fn latest(&self) -> Option<Generation> {
        match self.latest.load(Ordering::Acquire) {
            0 => None,
            value => Some(Generation(value)),
        }
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.latest() == Some(generation)
    }
}

/// Holds the published pedigree of a viewing session.
#[derive(Debug, Default)]
pub struct Session {
    gate: RebuildGate,
    current: Option<Pedigree>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a rebuild; see [`RebuildGate::begin`].
    pub fn begin(&self) -> Generation {
        self.gate.begin()
    }

    /// Publishes a finished rebuild if `generation` is still the latest.
    ///
    /// Returns `false` and discards `pedigree` otherwise.
    pub fn publish(&mut self, generation: Generation, pedigree: Pedigree) -> bool {
        if !self.gate.is_current(generation) {
            debug!(
                generation = generation.value(),
                latest = self.gate.latest().map_or(0, Generation::value);
                "Discarding stale rebuild"
            );
            return false;
        }
        debug!(generation = generation.value(); "Rebuild published");
        self.current = Some(pedigree);
        true
    }

    pub fn current(&self) -> Option<&Pedigree> {
        self.current.as_ref()
    }

    /// Selects `id` in the published pedigree.
    ///
    /// Returns `false` if nothing is published or `id` is unknown.
    pub fn select(&mut self, id: Id) -> bool {
        self.current
            .as_mut()
            .is_some_and(|pedigree| pedigree.select(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PedigreeBuilder, config::AppConfig, query::Filter, record::RawRecord};

    fn build(records: &[RawRecord]) -> Pedigree {
        PedigreeBuilder::new(AppConfig::default())
            .build(records, &Filter::new())
            .expect("layout")
    }

    #[test]
    fn test_generations_increase() {
        let gate = RebuildGate::new();
        assert_eq!(gate.latest(), None);

        let first = gate.begin();
        let second = gate.begin();

        assert!(second > first);
        assert!(!gate.is_current(first));
        assert!(gate.is_current(second));
    }

    #[test]
    fn test_stale_rebuild_is_discarded() {
        let mut session = Session::new();
        let stale = session.begin();
        let fresh = session.begin();

        assert!(session.publish(fresh, build(&[RawRecord::new("rb-new", "New", "dog")])));
        assert!(!session.publish(stale, build(&[RawRecord::new("rb-old", "Old", "dog")])));

        let current = session.current().expect("published");
        assert!(current.graph().individual(Id::new("rb-new")).is_some());
        assert!(current.graph().individual(Id::new("rb-old")).is_none());
    }

    #[test]
    fn test_select_needs_published_pedigree() {
        let mut session = Session::new();
        assert!(!session.select(Id::new("rb-sel")));

        let generation = session.begin();
        session.publish(generation, build(&[RawRecord::new("rb-sel", "Sel", "cat")]));

        assert!(session.select(Id::new("rb-sel")));
        let selected = session.current().and_then(|pedigree| pedigree.graph().selected());
        assert_eq!(selected.map(|individual| individual.id()), Some(Id::new("rb-sel")));
    }
}
