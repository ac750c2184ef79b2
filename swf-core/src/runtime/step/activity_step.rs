use swf_common::prelude::*;
use swf_common::TextUtils;

use super::{DecisionRound, StepDefinition, StepSpec};
use crate::model::{Context, Control, Decision, ScheduleActivityTaskAttributes, TypeRef};

#[derive(Clone, Debug)]
pub struct ActivityStep {
    spec: StepSpec,
    activity_type: TypeRef,
    heartbeat_timeout: Option<InlineStr>,
    schedule_to_close_timeout: Option<InlineStr>,
    schedule_to_start_timeout: Option<InlineStr>,
    start_to_close_timeout: Option<InlineStr>,
}

impl ActivityStep {
    /// The activity type is named after the step.
    pub fn new(spec: StepSpec, version: impl Into<InlineStr>) -> Self {
        let activity_type = TypeRef::new(spec.name.clone(), version);
        Self {
            spec,
            activity_type,
            heartbeat_timeout: None,
            schedule_to_close_timeout: None,
            schedule_to_start_timeout: None,
            start_to_close_timeout: None,
        }
    }

    pub fn activity_type(&self) -> &TypeRef {
        &self.activity_type
    }

    pub fn with_heartbeat_timeout(mut self, timeout: impl Into<InlineStr>) -> Self {
        self.heartbeat_timeout = Some(timeout.into());
        self
    }

    pub fn with_schedule_to_close_timeout(mut self, timeout: impl Into<InlineStr>) -> Self {
        self.schedule_to_close_timeout = Some(timeout.into());
        self
    }

    pub fn with_schedule_to_start_timeout(mut self, timeout: impl Into<InlineStr>) -> Self {
        self.schedule_to_start_timeout = Some(timeout.into());
        self
    }

    pub fn with_start_to_close_timeout(mut self, timeout: impl Into<InlineStr>) -> Self {
        self.start_to_close_timeout = Some(timeout.into());
        self
    }
}

impl StepDefinition for ActivityStep {
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
        let activity_id = round.next_id(self.name());
        debug!(
            "scheduling activity {} ({}) on {}, control {}",
            activity_id,
            self.activity_type,
            task_list,
            control.encode()
        );

        Ok(vec![Decision::ScheduleActivityTask(
            ScheduleActivityTaskAttributes {
                activity_id,
                activity_type: self.activity_type.clone(),
                control,
                task_list: task_list.into(),
                input,
                heartbeat_timeout: self.heartbeat_timeout.clone(),
                schedule_to_close_timeout: self.schedule_to_close_timeout.clone(),
                schedule_to_start_timeout: self.schedule_to_start_timeout.clone(),
                start_to_close_timeout: self.start_to_close_timeout.clone(),
            },
        )])
    }
}
