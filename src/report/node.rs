//! Aggregation nodes tracking every dimension of a set of observations.
use parking_lot::Mutex;

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::counter::CategoryCounter;
use super::observation::Observation;
use super::range::{self, AgeRanges, AGE_LABELS, SIZE_LABELS};

/// Counters for every dimension of a single group of observations.
///
/// A `Tally` has no notion of grouping; it is both the flat part of an
/// `AggregateNode` and the type of the node's children.
#[derive(Debug)]
pub struct Tally {
    items: AtomicU64,
    bytes: AtomicU64,
    sizes: CategoryCounter,
    ages: CategoryCounter,
    storage_classes: CategoryCounter,
    extensions: CategoryCounter,
    months: CategoryCounter,
}

impl Tally {
    /// Constructs a new `Tally`, with the ranged counters seeded at zero.
    pub fn new() -> Tally {
        Tally {
            items: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            sizes: CategoryCounter::seeded(&SIZE_LABELS),
            ages: CategoryCounter::seeded(&AGE_LABELS),
            storage_classes: CategoryCounter::new(),
            extensions: CategoryCounter::new(),
            months: CategoryCounter::new(),
        }
    }

    /// Records an observation against every dimension of this `Tally`.
    pub fn record(&self, observation: &Observation, ages: &AgeRanges) {
        let size = observation.size();

        self.sizes.increment(range::classify_size(size));
        self.bytes.fetch_add(size, Ordering::Relaxed);
        self.items.fetch_add(1, Ordering::Relaxed);

        self.ages.increment(ages.classify(observation.timestamp()));
        self.storage_classes.increment(observation.storage_class());
        self.extensions.increment(observation.extension());
        self.months.increment(&observation.month());
    }

    /// Retrieves the number of recorded observations.
    pub fn items(&self) -> u64 {
        self.items.load(Ordering::Relaxed)
    }

    /// Retrieves the total size of recorded observations, in bytes.
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Counts per size range.
    pub fn sizes(&self) -> &CategoryCounter {
        &self.sizes
    }

    /// Counts per age range.
    pub fn ages(&self) -> &CategoryCounter {
        &self.ages
    }

    /// Counts per storage class.
    pub fn storage_classes(&self) -> &CategoryCounter {
        &self.storage_classes
    }

    /// Counts per file extension.
    pub fn extensions(&self) -> &CategoryCounter {
        &self.extensions
    }

    /// Counts per calendar month.
    pub fn months(&self) -> &CategoryCounter {
        &self.months
    }
}

impl Default for Tally {
    fn default() -> Tally {
        Tally::new()
    }
}

/// Top level aggregation for an entity, with a single level of groups.
#[derive(Debug, Default)]
pub struct AggregateNode {
    tally: Tally,
    groups: Mutex<HashMap<String, Arc<Tally>>>,
}

impl AggregateNode {
    /// Constructs a new, empty `AggregateNode`.
    pub fn new() -> AggregateNode {
        AggregateNode::default()
    }

    /// Records an observation on this node and on its group, if any.
    pub fn record(&self, observation: &Observation, ages: &AgeRanges) {
        self.tally.record(observation, ages);

        if let Some(group) = observation.group() {
            self.group(group).record(observation, ages);
        }
    }

    /// Retrieves the tally of the node itself.
    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    /// Takes a copy of the group mapping, sorted by group key.
    pub fn groups(&self) -> BTreeMap<String, Arc<Tally>> {
        self.groups
            .lock()
            .iter()
            .map(|(key, tally)| (key.clone(), Arc::clone(tally)))
            .collect()
    }

    /// Retrieves the tally of a group, creating it if necessary.
    fn group(&self, key: &str) -> Arc<Tally> {
        let mut groups = self.groups.lock();
        if let Some(tally) = groups.get(key) {
            return Arc::clone(tally);
        }
        let tally = Arc::new(Tally::new());
        groups.insert(key.to_string(), Arc::clone(&tally));
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::thread;

    fn observation(size: u64, days: i64, ext: &str, group: &str) -> Observation {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        Observation::new(size, now - Duration::days(days))
            .with_storage_class(Some("STANDARD"))
            .with_extension(Some(ext))
            .with_group(Some(group))
    }

    fn ranges() -> AgeRanges {
        AgeRanges::at(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap())
    }

    #[test]
    fn creating_seeded_tally() {
        let tally = Tally::new();

        assert_eq!(tally.items(), 0);
        assert_eq!(tally.bytes(), 0);
        assert_eq!(tally.sizes().snapshot().len(), SIZE_LABELS.len());
        assert_eq!(tally.ages().snapshot().len(), AGE_LABELS.len());
        assert!(tally.storage_classes().snapshot().is_empty());
        assert!(tally.extensions().snapshot().is_empty());
        assert!(tally.months().snapshot().is_empty());
    }

    #[test]
    fn recording_without_group() {
        let node = AggregateNode::new();
        let observation = Observation::new(5, Utc::now());

        node.record(&observation, &ranges());

        assert_eq!(node.tally().items(), 1);
        assert!(node.groups().is_empty());
    }

    #[test]
    fn recording_keeps_sum_invariants() {
        let ages = Arc::new(ranges());
        let node = Arc::new(AggregateNode::new());

        let handles: Vec<_> = (0..8u64)
            .map(|worker| {
                let node = Arc::clone(&node);
                let ages = Arc::clone(&ages);
                thread::spawn(move || {
                    for idx in 0..2_000u64 {
                        let size = (idx * 7919 + worker) * 1024;
                        let group = if idx % 3 == 0 { "a" } else { "b" };
                        let ext = if idx % 2 == 0 { ".txt" } else { ".bin" };
                        let obs = observation(size, (idx % 2_500) as i64, ext, group);
                        node.record(&obs, &ages);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let tally = node.tally();
        assert_eq!(tally.items(), 16_000);
        assert_eq!(tally.sizes().total(), tally.items());
        assert_eq!(tally.ages().total(), tally.items());
        assert_eq!(tally.extensions().total(), tally.items());
        assert_eq!(tally.months().total(), tally.items());

        let groups = node.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups.values().map(|group| group.items()).sum::<u64>(),
            tally.items()
        );

        for group in groups.values() {
            assert_eq!(group.sizes().total(), group.items());
            assert_eq!(group.ages().total(), group.items());
            assert!(group.bytes() <= tally.bytes());

            for (label, count) in group.extensions().snapshot() {
                assert!(count <= tally.extensions().get(&label));
            }
            for (label, count) in group.sizes().snapshot() {
                assert!(count <= tally.sizes().get(&label));
            }
        }
    }
}
