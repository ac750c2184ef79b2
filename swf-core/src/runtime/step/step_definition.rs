use swf_common::prelude::*;

use super::{DecisionRound, GroupStep};
use crate::model::{Context, Control, Decision};

/// Settings every kind of step carries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepSpec {
    pub name: InlineStr,
    /// Context keys forwarded to the step. An entry containing `=` is a literal instead: the text
    /// after the first `=`, trimmed, stored under the text before it.
    pub input: Vec<InlineStr>,
    /// Result keys merged back into the context. Empty merges everything.
    pub output: Vec<InlineStr>,
    pub retry: u32,
    pub number: usize,
    /// Placeholders like `{region}` are filled from the context when scheduling. Empty inherits
    /// the workflow task list.
    pub task_list: InlineStr,
}

impl StepSpec {
    pub fn new(name: impl Into<InlineStr>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
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

    pub fn with_output<I, S>(mut self, output: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<InlineStr>,
    {
        self.output = output.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_task_list(mut self, task_list: impl Into<InlineStr>) -> Self {
        self.task_list = task_list.into();
        self
    }

    pub fn prepare_input(&self, context: &Context) -> SwfResult<HashMap<InlineStr, Object>> {
        let mut input = HashMap::with_capacity(self.input.len());
        for entry in &self.input {
            match entry.split_once('=') {
                Some((key, literal)) => {
                    input.insert(key.trim().into(), Object::from(literal.trim()));
                }
                None => match context.get(entry) {
                    Some(value) => {
                        input.insert(entry.clone(), value.clone());
                    }
                    None => {
                        return fmt_err!(
                            MissingContextVariable,
                            "variable '{}' is missing in context",
                            entry
                        );
                    }
                },
            }
        }
        Ok(input)
    }

    /// Control for a new scheduling: the caller's one when retrying, stamped with this step's
    /// number and, if it has none yet, the full retry budget.
    pub fn control(&self, control: Option<Control>) -> Control {
        let mut control = control.unwrap_or_default();
        control.step_number = Some(self.number);
        if control.retry.is_none() {
            control.retry = Some(self.retry);
        }
        control
    }
}

/// A unit of work a workflow schedules. Implementations turn the current context into the
/// decisions that start the work.
pub trait StepDefinition: Send + Sync + std::fmt::Debug {
    fn spec(&self) -> &StepSpec;

    fn spec_mut(&mut self) -> &mut StepSpec;

    fn schedule(
        &self,
        round: &mut DecisionRound,
        context: &Context,
        control: Option<Control>,
    ) -> SwfResult<Vec<Decision>>;

    fn name(&self) -> &str {
        &self.spec().name
    }

    fn number(&self) -> usize {
        self.spec().number
    }

    fn set_number(&mut self, number: usize) {
        self.spec_mut().number = number;
    }

    fn retry(&self) -> u32 {
        self.spec().retry
    }

    fn input(&self) -> &[InlineStr] {
        &self.spec().input
    }

    fn output(&self) -> &[InlineStr] {
        &self.spec().output
    }

    fn task_list(&self) -> &str {
        &self.spec().task_list
    }

    fn set_task_list(&mut self, task_list: InlineStr) {
        self.spec_mut().task_list = task_list;
    }

    fn prepare_input(&self, context: &Context) -> SwfResult<HashMap<InlineStr, Object>> {
        self.spec().prepare_input(context)
    }

    fn as_group(&self) -> Option<&GroupStep> {
        None
    }
}
