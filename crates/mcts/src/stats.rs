//! Shared action statistics.
//!
//! Every worker reads the tables while selecting moves and writes them while
//! backpropagating. Entries live behind `Arc` in a sharded concurrent map, and
//! each entry accumulates with lock-free atomics, so updates never serialize
//! whole playouts. Concurrent updates to the same entry are additive; visit
//! count and score are updated separately and may be observed slightly out of
//! step, which only blurs the statistics.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

/// `f64` stored in an `AtomicU64` by bit-casting.
#[derive(Debug)]
struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Lock-free add using compare-and-swap.
    fn fetch_add(&self, value: f64) -> f64 {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let new = (f64::from_bits(current) + value).to_bits();
            match self.bits.compare_exchange_weak(
                current,
                new,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(previous) => return f64::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }
}

/// Visit count and accumulated score for one key.
///
/// Invariant: the visit count never decreases below zero; the average is
/// only defined once it is positive.
#[derive(Debug)]
pub struct ActionStatistics {
    visit_count: AtomicF64,
    accumulated_score: AtomicF64,
}

impl ActionStatistics {
    /// Create a zeroed entry.
    pub fn new() -> Self {
        Self {
            visit_count: AtomicF64::new(0.0),
            accumulated_score: AtomicF64::new(0.0),
        }
    }

    /// Number of recorded visits.
    pub fn visit_count(&self) -> f64 {
        self.visit_count.load()
    }

    /// Sum of the scores of all recorded visits.
    pub fn accumulated_score(&self) -> f64 {
        self.accumulated_score.load()
    }

    /// Mean score, or `None` if the entry was never visited.
    pub fn mean(&self) -> Option<f64> {
        let visits = self.visit_count();
        (visits > 0.0).then(|| self.accumulated_score() / visits)
    }

    /// Record one visit with the given score.
    pub fn record(&self, score: f64) {
        self.accumulated_score.fetch_add(score);
        self.visit_count.fetch_add(1.0);
    }
}

impl Default for ActionStatistics {
    fn default() -> Self {
        Self::new()
    }
}

/// Concurrent map from keys to lazily created [`ActionStatistics`].
#[derive(Debug)]
pub struct StatsTable<K: Eq + Hash> {
    entries: DashMap<K, Arc<ActionStatistics>>,
}

impl<K: Eq + Hash + Clone> StatsTable<K> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Look up `key`, inserting a zeroed entry if it is missing.
    pub fn get_or_create(&self, key: &K) -> Arc<ActionStatistics> {
        if let Some(entry) = self.entries.get(key) {
            return Arc::clone(entry.value());
        }
        Arc::clone(self.entries.entry(key.clone()).or_default().value())
    }

    /// Look up `key` without inserting.
    pub fn get(&self, key: &K) -> Option<Arc<ActionStatistics>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<K: Eq + Hash + Clone> Default for StatsTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fresh_entry_has_no_mean() {
        let stats = ActionStatistics::new();
        assert_eq!(stats.visit_count(), 0.0);
        assert_eq!(stats.mean(), None);
    }

    #[test]
    fn test_record_accumulates() {
        let stats = ActionStatistics::new();
        stats.record(1.0);
        stats.record(-0.5);

        assert_eq!(stats.visit_count(), 2.0);
        assert!((stats.accumulated_score() - 0.5).abs() < 1e-12);
        assert!((stats.mean().unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_get_or_create_returns_the_same_entry() {
        let table: StatsTable<u32> = StatsTable::new();
        assert!(table.get(&7).is_none());

        table.get_or_create(&7).record(2.0);
        let entry = table.get_or_create(&7);
        assert_eq!(entry.visit_count(), 1.0);
        assert_eq!(table.len(), 1);

        table.clear();
        assert!(table.is_empty());
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let table: StatsTable<u32> = StatsTable::new();

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for i in 0..1000 {
                        table.get_or_create(&(i % 10)).record(1.0);
                    }
                });
            }
        });

        assert_eq!(table.len(), 10);
        for key in 0..10 {
            let entry = table.get(&key).unwrap();
            assert_eq!(entry.visit_count(), 800.0);
            assert_eq!(entry.accumulated_score(), 800.0);
        }
    }
}
