use swf_common::prelude::*;

use super::{Hook, SignalDefinition, Workflow};
use crate::config::DeciderProperties;
use crate::model::Context;
use crate::runtime::step::StepDefinition;

/// Assembles a [`Workflow`]. Steps are numbered in the order they are added, signal targets after
/// the last step, and steps without a task list inherit the workflow one.
pub struct WorkflowBuilder {
    name: InlineStr,
    version: InlineStr,
    task_list: InlineStr,
    output: Vec<InlineStr>,
    steps: Vec<Box<dyn StepDefinition>>,
    signals: Vec<SignalDefinition>,
    setup: Option<Hook>,
    teardown: Option<Hook>,
    properties: DeciderProperties,
}

impl WorkflowBuilder {
    pub fn new(name: impl Into<InlineStr>, version: impl Into<InlineStr>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            task_list: InlineStr::new(),
            output: vec![],
            steps: vec![],
            signals: vec![],
            setup: None,
            teardown: None,
            properties: DeciderProperties::default(),
        }
    }

    pub fn task_list(mut self, task_list: impl Into<InlineStr>) -> Self {
        self.task_list = task_list.into();
        self
    }

    /// Context keys reported as the workflow result. Without any, every non-engine key is.
    pub fn output<I, S>(mut self, output: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<InlineStr>,
    {
        self.output = output.into_iter().map(Into::into).collect();
        self
    }

    pub fn step(mut self, step: impl StepDefinition + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn signal(mut self, signal: SignalDefinition) -> Self {
        self.signals.push(signal);
        self
    }

    pub fn setup<F>(mut self, setup: F) -> Self
    where F: Fn(Context) -> anyhow::Result<Context> + Send + Sync + 'static {
        self.setup = Some(Arc::new(setup));
        self
    }

    pub fn teardown<F>(mut self, teardown: F) -> Self
    where F: Fn(Context) -> anyhow::Result<Context> + Send + Sync + 'static {
        self.teardown = Some(Arc::new(teardown));
        self
    }

    pub fn properties(mut self, properties: DeciderProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn build(self) -> SwfResult<Workflow> {
        if self.name.trim().is_empty() {
            return str_err!(IllegalArgument, "workflow name must not be empty");
        }
        let mut names = HashSet::new();
        for signal in &self.signals {
            if !names.insert(signal.name()) {
                return fmt_err!(
                    IllegalArgument,
                    "signal '{}' is declared twice in workflow {}",
                    signal.name(),
                    self.name
                );
            }
        }

        let mut steps = self.steps;
        for (number, step) in steps.iter_mut().enumerate() {
            step.set_number(number);
            if step.task_list().is_empty() {
                step.set_task_list(self.task_list.clone());
            }
        }
        let mut signals = self.signals;
        for (offset, signal) in signals.iter_mut().enumerate() {
            let target = signal.target_mut();
            target.set_number(steps.len() + offset);
            if target.task_list().is_empty() {
                target.set_task_list(self.task_list.clone());
            }
        }

        let log_prefix = format!(
            "[workflow={}, version={}, task_list={}]",
            self.name, self.version, self.task_list
        );
        debug!(
            "{} built with {} step(s) and {} signal(s)",
            log_prefix,
            steps.len(),
            signals.len()
        );

        Ok(Workflow {
            name: self.name,
            version: self.version,
            task_list: self.task_list,
            output: self.output,
            steps,
            signals,
            setup: self.setup,
            teardown: self.teardown,
            properties: self.properties,
            log_prefix,
        })
    }
}
