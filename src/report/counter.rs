//! Concurrent label counters used by every aggregation dimension.
use parking_lot::Mutex;

use std::collections::{BTreeMap, HashMap};

/// Counter of occurrences keyed by an arbitrary label.
///
/// Each counter carries its own lock, so producers incrementing different
/// dimensions of the same node never contend with each other.
#[derive(Debug, Default)]
pub struct CategoryCounter {
    counts: Mutex<HashMap<String, u64>>,
}

impl CategoryCounter {
    /// Constructs a new, empty `CategoryCounter`.
    pub fn new() -> CategoryCounter {
        CategoryCounter::default()
    }

    /// Constructs a `CategoryCounter` with every label present at zero.
    pub fn seeded(labels: &[&str]) -> CategoryCounter {
        let counts = labels.iter().map(|label| (label.to_string(), 0)).collect();
        CategoryCounter {
            counts: Mutex::new(counts),
        }
    }

    /// Adds one to the count of the provided label.
    pub fn increment(&self, label: &str) {
        let mut counts = self.counts.lock();

        // avoid allocating a key on the hot path
        match counts.get_mut(label) {
            Some(count) => *count += 1,
            None => {
                counts.insert(label.to_string(), 1);
            }
        }
    }

    /// Retrieves the count of a label, zero when never seen.
    pub fn get(&self, label: &str) -> u64 {
        self.counts.lock().get(label).copied().unwrap_or(0)
    }

    /// Returns the sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.lock().values().sum()
    }

    /// Takes a point-in-time copy of all counts, sorted by label.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counts
            .lock()
            .iter()
            .map(|(label, count)| (label.clone(), *count))
            .collect()
    }

    /// Returns the counts of the provided labels, in the provided order.
    pub fn ordered(&self, labels: &[&str]) -> Vec<u64> {
        let counts = self.counts.lock();
        labels
            .iter()
            .map(|label| counts.get(*label).copied().unwrap_or(0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::CategoryCounter;
    use std::sync::Arc;
    use std::thread;

    fn concurrent_increments(total: u64) {
        let threads = 8;
        let counter = Arc::new(CategoryCounter::new());
        let handles: Vec<_> = (0..threads)
            .map(|idx| {
                let counter = Arc::clone(&counter);
                let share = total / threads + u64::from(idx < total % threads);
                thread::spawn(move || {
                    for _ in 0..share {
                        counter.increment("shared");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.get("shared"), total);
        assert_eq!(counter.total(), total);
    }

    #[test]
    fn incrementing_concurrently_loses_nothing() {
        concurrent_increments(1);
        concurrent_increments(1_000);
        concurrent_increments(100_000);
    }

    #[test]
    fn reading_absent_labels() {
        let counter = CategoryCounter::new();

        assert_eq!(counter.get("missing"), 0);
        assert_eq!(counter.total(), 0);
        assert!(counter.snapshot().is_empty());
    }

    #[test]
    fn seeding_labels_at_zero() {
        let counter = CategoryCounter::seeded(&["b", "a"]);
        counter.increment("a");
        counter.increment("c");

        let snapshot = counter.snapshot();
        let labels: Vec<_> = snapshot.keys().cloned().collect();

        assert_eq!(labels, vec!["a", "b", "c"]);
        assert_eq!(snapshot["a"], 1);
        assert_eq!(snapshot["b"], 0);
        assert_eq!(counter.ordered(&["b", "a", "z"]), vec![0, 1, 0]);
    }
}
