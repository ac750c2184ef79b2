use swf_common::prelude::*;

use crate::model::{Context, Decision, Event};
use crate::runtime::step::{DecisionRound, StepDefinition};

/// Reaction to a named external signal: merge its input into the context, then schedule
/// `target`.
#[derive(Debug)]
pub struct SignalDefinition {
    name: InlineStr,
    target: Box<dyn StepDefinition>,
    /// Signal input keys merged into the context. Empty merges every key.
    input: Vec<InlineStr>,
}

impl SignalDefinition {
    pub fn new(name: impl Into<InlineStr>, target: impl StepDefinition + 'static) -> Self {
        Self {
            name: name.into(),
            target: Box::new(target),
            input: vec![],
        }
    }

    pub fn with_input<I, S>(mut self, input: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<InlineStr>,
    {
        self.input = input.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &dyn StepDefinition {
        self.target.as_ref()
    }

    pub(crate) fn target_mut(&mut self) -> &mut dyn StepDefinition {
        self.target.as_mut()
    }

    pub fn input(&self) -> &[InlineStr] {
        &self.input
    }
}

/// A `WorkflowExecutionSignaled` event matched with its definition.
#[derive(Clone, Copy, Debug)]
pub struct SignalExecution<'a> {
    definition: &'a SignalDefinition,
    event: &'a Event,
}

impl<'a> SignalExecution<'a> {
    pub fn new(definition: &'a SignalDefinition, event: &'a Event) -> Self {
        Self { definition, event }
    }

    pub fn definition(&self) -> &'a SignalDefinition {
        self.definition
    }

    pub fn event(&self) -> &'a Event {
        self.event
    }

    /// Decoded signal payload. Blank or `null` input is empty.
    pub fn input(&self) -> SwfResult<HashMap<InlineStr, Object>> {
        let text = match self.event.attributes().input() {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Ok(HashMap::new()),
        };
        let values = match serde_json::from_str::<serde_json::Value>(text)? {
            serde_json::Value::Object(map) => Object::convert_jsonmap_to_hashmap(&map),
            serde_json::Value::Null => HashMap::new(),
            other => {
                return fmt_err!(
                    IllegalArgument,
                    "input of signal '{}' must be a JSON object, got {}",
                    self.definition.name,
                    other
                );
            }
        };
        if self.definition.input.is_empty() {
            return Ok(values);
        }
        Ok(values
            .into_iter()
            .filter(|(k, _)| self.definition.input.contains(k))
            .collect())
    }

    /// Merges the payload into `context` and schedules the target step.
    pub fn trigger(&self, round: &mut DecisionRound, context: &mut Context) -> SwfResult<Vec<Decision>> {
        context.merge_unreserved(self.input()?);
        self.definition.target.schedule(round, context, None)
    }
}
