// Replacement statistics
//
// This module provides the StatsManager which wraps the accumulated
// replacement counters with thread-safe access using Arc<RwLock<T>> and
// emits events so the UI/persistence layer can observe replacements without
// polling.

use crate::models::StatsRecord;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Accumulated replacement counters for one activation lifetime.
///
/// Monotonically increasing; reset only by explicit external action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplacementStats {
    pub name_replacements: u64,
    pub pronoun_replacements: u64,
}

impl ReplacementStats {
    pub fn total(&self) -> u64 {
        self.name_replacements + self.pronoun_replacements
    }
}

/// Events emitted when the counters change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatsEvent {
    /// One processed batch performed replacements. Never emitted with both
    /// counts zero, and at most once per batch.
    BatchApplied { names: u64, pronouns: u64 },

    /// The counters were reset to zero.
    Reset,
}

/// Thread-safe stats accumulator with event emission.
///
/// The engine side calls [`record_batch`](Self::record_batch) once per
/// processed unit of work; consumers subscribe for incremental updates or
/// take a [`snapshot`](Self::snapshot) for persistence.
pub struct StatsManager {
    stats: Arc<RwLock<ReplacementStats>>,

    /// Broadcast channel for stats events; multiple subscribers allowed.
    stats_tx: broadcast::Sender<StatsEvent>,
}

impl StatsManager {
    pub fn new() -> Self {
        let (stats_tx, _) = broadcast::channel(100);
        Self {
            stats: Arc::new(RwLock::new(ReplacementStats::default())),
            stats_tx,
        }
    }

    /// Seed the counters from a persisted record.
    pub fn from_record(record: StatsRecord) -> Self {
        let manager = Self::new();
        {
            let mut stats = manager.stats.write().unwrap();
            stats.name_replacements = record.name_replacements;
            stats.pronoun_replacements = record.pronoun_replacements;
        }
        manager
    }

    /// Current counters, cloned out.
    pub fn snapshot(&self) -> ReplacementStats {
        *self.stats.read().unwrap()
    }

    /// Counters as a persistable record.
    pub fn to_record(&self) -> StatsRecord {
        let stats = self.snapshot();
        StatsRecord {
            name_replacements: stats.name_replacements,
            pronoun_replacements: stats.pronoun_replacements,
        }
    }

    /// Subscribe to stats events.
    pub fn subscribe(&self) -> broadcast::Receiver<StatsEvent> {
        self.stats_tx.subscribe()
    }

    /// Add one batch's counts. Returns whether an event was emitted; a batch
    /// with both counts zero adds nothing and emits nothing.
    pub fn record_batch(&self, names: u64, pronouns: u64) -> bool {
        if names == 0 && pronouns == 0 {
            return false;
        }

        {
            let mut stats = self.stats.write().unwrap();
            stats.name_replacements += names;
            stats.pronoun_replacements += pronouns;
        }

        // Ignore send errors - it's OK if no one is listening
        let _ = self.stats_tx.send(StatsEvent::BatchApplied { names, pronouns });
        true
    }

    /// Zero the counters (explicit external action, e.g. the user clearing
    /// their settings).
    pub fn reset(&self) {
        {
            let mut stats = self.stats.write().unwrap();
            *stats = ReplacementStats::default();
        }
        let _ = self.stats_tx.send(StatsEvent::Reset);
    }
}

impl Default for StatsManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StatsManager cloneable for sharing across tasks
impl Clone for StatsManager {
    fn clone(&self) -> Self {
        Self {
            stats: Arc::clone(&self.stats),
            stats_tx: self.stats_tx.clone(),
        }
    }
}
