use swf_common::prelude::*;

use crate::config::DeciderProperties;
use crate::model::History;
use crate::utils::IdGenerator;

/// State shared by everything that schedules work while one decision task is being answered.
#[derive(Debug)]
pub struct DecisionRound<'a> {
    history: &'a History,
    properties: &'a DeciderProperties,
    id_generator: IdGenerator,
    /// Canonical partition ids scheduled during this round, per step number.
    scheduled_partitions: HashMap<usize, HashSet<String>>,
}

impl<'a> DecisionRound<'a> {
    pub fn new(
        history: &'a History,
        properties: &'a DeciderProperties,
        seed: impl Into<String>,
    ) -> Self {
        Self {
            history,
            properties,
            id_generator: IdGenerator::new(properties.id_strategy(), seed),
            scheduled_partitions: HashMap::new(),
        }
    }

    pub fn history(&self) -> &'a History {
        self.history
    }

    pub fn properties(&self) -> &'a DeciderProperties {
        self.properties
    }

    pub fn next_id(&mut self, prefix: &str) -> InlineStr {
        self.id_generator.generate(prefix)
    }

    pub fn mark_partition_scheduled(&mut self, step_number: usize, partition: &Object) {
        self.scheduled_partitions
            .entry(step_number)
            .or_default()
            .insert(partition.canonical());
    }

    pub fn is_partition_scheduled(&self, step_number: usize, partition: &Object) -> bool {
        self.scheduled_partitions
            .get(&step_number)
            .map(|x| x.contains(&partition.canonical()))
            .unwrap_or(false)
    }

    pub fn scheduled_partition_count(&self, step_number: usize) -> usize {
        self.scheduled_partitions
            .get(&step_number)
            .map(|x| x.len())
            .unwrap_or(0)
    }

    /// How many more partitions of `step_number` may still be scheduled in this round.
    pub fn partition_budget(&self, step_number: usize) -> usize {
        self.properties
            .max_partitions_per_decision()
            .saturating_sub(self.scheduled_partition_count(step_number))
    }
}
