//! Registry of aggregation nodes, keyed by entity (bucket) name.
use parking_lot::RwLock;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::node::AggregateNode;
use super::observation::Observation;
use super::range::AgeRanges;

/// Concurrent mapping of entity names to their `AggregateNode`.
///
/// A `Registry` is built once per run and shared between all producers;
/// the age boundaries used to classify observations are fixed when the
/// registry is constructed.
#[derive(Debug)]
pub struct Registry {
    ages: AgeRanges,
    nodes: RwLock<HashMap<String, Arc<AggregateNode>>>,
}

impl Registry {
    /// Constructs a new `Registry` classifying ages against the current time.
    pub fn new() -> Registry {
        Registry::with_ages(AgeRanges::now())
    }

    /// Constructs a new `Registry` using the provided age boundaries.
    pub fn with_ages(ages: AgeRanges) -> Registry {
        Registry {
            ages,
            nodes: RwLock::new(HashMap::new()),
        }
    }

    /// Retrieves the node of an entity, creating it on first access.
    pub fn get_or_create(&self, entity: &str) -> Arc<AggregateNode> {
        if let Some(node) = self.nodes.read().get(entity) {
            return Arc::clone(node);
        }

        // another producer may have won the race since the read
        let mut nodes = self.nodes.write();
        let node = nodes
            .entry(entity.to_string())
            .or_insert_with(|| Arc::new(AggregateNode::new()));

        Arc::clone(node)
    }

    /// Records an observation against an entity.
    pub fn record(&self, entity: &str, observation: &Observation) {
        self.get_or_create(entity).record(observation, &self.ages);
    }

    /// Takes a copy of the entity mapping, sorted by entity name.
    pub fn all(&self) -> BTreeMap<String, Arc<AggregateNode>> {
        self.nodes
            .read()
            .iter()
            .map(|(entity, node)| (entity.clone(), Arc::clone(node)))
            .collect()
    }
}

impl Default for Registry {
    fn default() -> Registry {
        Registry::new()
    }
}
