use swf_common::prelude::*;
use swf_common::TextUtils;

use super::{DecisionRound, StepDefinition, StepSpec};
use crate::model::{Context, Control, Decision, StartChildWorkflowExecutionAttributes, TypeRef};

/// Runs another workflow type as a step.
#[derive(Clone, Debug)]
pub struct ChildWorkflowStep {
    spec: StepSpec,
    workflow_type: TypeRef,
    child_policy: Option<InlineStr>,
    execution_start_to_close_timeout: Option<InlineStr>,
    task_start_to_close_timeout: Option<InlineStr>,
}

impl ChildWorkflowStep {
    /// The workflow type is named after the step.
    pub fn new(spec: StepSpec, version: impl Into<InlineStr>) -> Self {
        let workflow_type = TypeRef::new(spec.name.clone(), version);
        Self {
            spec,
            workflow_type,
            child_policy: None,
            execution_start_to_close_timeout: None,
            task_start_to_close_timeout: None,
        }
    }

    pub fn workflow_type(&self) -> &TypeRef {
        &self.workflow_type
    }

    pub fn with_child_policy(mut self, child_policy: impl Into<InlineStr>) -> Self {
        self.child_policy = Some(child_policy.into());
        self
    }

    pub fn with_execution_start_to_close_timeout(mut self, timeout: impl Into<InlineStr>) -> Self {
        self.execution_start_to_close_timeout = Some(timeout.into());
        self
    }

    pub fn with_task_start_to_close_timeout(mut self, timeout: impl Into<InlineStr>) -> Self {
        self.task_start_to_close_timeout = Some(timeout.into());
        self
    }
}

impl StepDefinition for ChildWorkflowStep {
    fn spec(&self) -> &StepSpec {
        &self.spec
    }

    fn spec_mut(&mut self) -> &mut StepSpec {
        &mut self.spec
    }

    fn schedule(
        &self,
        round: &mut DecisionRound,
        context: &Context,
        control: Option<Control>,
    ) -> SwfResult<Vec<Decision>> {
        let control = self.spec.control(control);
        let input = self.prepare_input(context)?;
        let task_list = TextUtils::format_template(self.task_list(), context.values())?;
        let workflow_id = match context.workflow_id() {
            Some(id) => id,
            None => round.next_id(self.name()),
        };
        let tag_list = context.tag_list()?;
        debug!(
            "starting child workflow {} ({}) on {}, control {}",
            workflow_id,
            self.workflow_type,
            task_list,
            control.encode()
        );

        Ok(vec![Decision::StartChildWorkflowExecution(
            StartChildWorkflowExecutionAttributes {
                workflow_id,
                workflow_type: self.workflow_type.clone(),
                control,
                task_list: task_list.into(),
                input,
                tag_list,
                child_policy: self.child_policy.clone(),
                execution_start_to_close_timeout: self.execution_start_to_close_timeout.clone(),
                task_start_to_close_timeout: self.task_start_to_close_timeout.clone(),
            },
        )])
    }
}
