use swf_common::prelude::*;

use super::{DecisionRound, StepDefinition, StepSpec};
use crate::model::{Context, Control, Decision, EventCategory, EventState, History};
use crate::runtime::execution::StepExecution;

/// Where the partitions of a fan-out step stand.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartitionProgress {
    /// Partitions never scheduled, in declaration order.
    pub remaining: Vec<Object>,
    /// Partitions scheduled or started and not resolved yet, including the ones scheduled in the
    /// current round and the ones whose last attempt failed and awaits its retry decision.
    pub in_flight: usize,
    pub completed: usize,
}

impl PartitionProgress {
    pub fn is_finished(&self) -> bool {
        self.remaining.is_empty() && self.in_flight == 0
    }
}

/// Fans a step out over the values of a context list. Each value (a partition) is injected into
/// the step's context under `key` and into its control, then tracked individually.
#[derive(Debug)]
pub struct GroupStep {
    key: InlineStr,
    step: Box<dyn StepDefinition>,
}

impl GroupStep {
    pub fn new(key: impl Into<InlineStr>, step: impl StepDefinition + 'static) -> Self {
        Self {
            key: key.into(),
            step: Box::new(step),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn inner(&self) -> &dyn StepDefinition {
        self.step.as_ref()
    }

    /// Distinct partition ids held by the context, in declaration order.
    pub fn partitions(&self, context: &Context) -> SwfResult<Vec<Object>> {
        let values = match context.get(&self.key) {
            Some(Object::List(values)) => values,
            Some(Object::Null) => return Ok(vec![]),
            Some(other) => {
                return fmt_err!(
                    IllegalArgument,
                    "partition key '{}' must hold a list, got {:?}",
                    self.key,
                    other
                );
            }
            None => {
                return fmt_err!(
                    MissingContextVariable,
                    "variable '{}' is missing in context",
                    self.key
                );
            }
        };

        let mut seen = HashSet::with_capacity(values.len());
        Ok(values
            .iter()
            .filter(|x| seen.insert(x.canonical()))
            .cloned()
            .collect())
    }

    /// Prior executions of this step found in the history, oldest first. Events whose control
    /// cannot be recovered did not come from this engine and are left out.
    pub fn executions<'h>(
        &self,
        history: &'h History,
    ) -> impl Iterator<Item = (StepExecution<'h>, Control)> + 'h {
        let number = self.number();
        history
            .iter()
            .filter(|x| {
                matches!(
                    x.category(),
                    EventCategory::ActivityTask | EventCategory::ChildWorkflowExecution
                )
            })
            .filter_map(move |event| {
                let execution = StepExecution::new(event, history).ok()?;
                match execution.control() {
                    Ok(control) if control.step_number == Some(number) => {
                        Some((execution, control))
                    }
                    Ok(_) => None,
                    Err(e) => {
                        trace!("{} skipped: {}", event, e.display_text());
                        None
                    }
                }
            })
    }

    pub fn progress(&self, round: &DecisionRound, context: &Context) -> SwfResult<PartitionProgress> {
        let mut completed = HashSet::new();
        let mut latest: HashMap<String, (i64, EventState)> = HashMap::new();
        for (execution, control) in self.executions(round.history()) {
            let partition = match &control.partition {
                Some(partition) => partition.canonical(),
                None => continue,
            };
            let unit = execution.unit_id()?;
            let state = execution.state();
            if state == EventState::Completed {
                completed.insert(partition.clone());
            }
            match latest.get(&partition) {
                Some((newest, _)) if *newest > unit => {}
                _ => {
                    latest.insert(partition, (unit, state));
                }
            }
        }

        let mut progress = PartitionProgress::default();
        for partition in self.partitions(context)? {
            let canonical = partition.canonical();
            if completed.contains(&canonical) {
                progress.completed += 1;
                continue;
            }
            let pending = matches!(
                latest.get(&canonical),
                Some((
                    _,
                    EventState::Scheduled
                        | EventState::Started
                        | EventState::StartInitiated
                        | EventState::Failed
                        | EventState::TimedOut
                ))
            );
            if pending || round.is_partition_scheduled(self.number(), &partition) {
                progress.in_flight += 1;
            } else {
                progress.remaining.push(partition);
            }
        }
        Ok(progress)
    }

    pub fn remaining_partitions(
        &self,
        round: &DecisionRound,
        context: &Context,
    ) -> SwfResult<Vec<Object>> {
        Ok(self.progress(round, context)?.remaining)
    }

    pub fn schedule_partition(
        &self,
        round: &mut DecisionRound,
        partition: &Object,
        context: &Context,
        control: Option<Control>,
    ) -> SwfResult<Vec<Decision>> {
        let mut context = context.clone();
        context.insert(self.key.clone(), partition.clone());
        let mut control = control.unwrap_or_default();
        control.key = Some(self.key.clone());
        control.partition = Some(partition.clone());

        round.mark_partition_scheduled(self.number(), partition);
        self.step.schedule(round, &context, Some(control))
    }
}

impl StepDefinition for GroupStep {
    fn spec(&self) -> &StepSpec {
        self.step.spec()
    }

    fn spec_mut(&mut self) -> &mut StepSpec {
        self.step.spec_mut()
    }

    /// Schedules the remaining partitions, as many as the round still allows. Nothing is returned
    /// once every partition was scheduled.
    fn schedule(
        &self,
        round: &mut DecisionRound,
        context: &Context,
        control: Option<Control>,
    ) -> SwfResult<Vec<Decision>> {
        let remaining = self.remaining_partitions(round, context)?;
        let budget = round.partition_budget(self.number());
        if remaining.len() > budget {
            debug!(
                "{}: {} partitions left, {} deferred to a later decision",
                self.name(),
                remaining.len(),
                remaining.len() - budget
            );
        }

        let mut control = control.unwrap_or_default();
        control.key = Some(self.key.clone());
        let mut decisions = Vec::with_capacity(remaining.len().min(budget));
        for partition in remaining.iter().take(budget) {
            decisions.extend(self.schedule_partition(
                round,
                partition,
                context,
                Some(control.clone()),
            )?);
        }
        Ok(decisions)
    }

    fn as_group(&self) -> Option<&GroupStep> {
        Some(self)
    }
}
