use swf_common::prelude::*;

use crate::model::{Control, Event, EventCategory, EventState, History};

/// An activity or child workflow event seen through the step that scheduled it. The step is
/// recovered from the control stored on the scheduling event.
#[derive(Clone, Copy, Debug)]
pub struct StepExecution<'a> {
    event: &'a Event,
    history: &'a History,
}

impl<'a> StepExecution<'a> {
    pub fn new(event: &'a Event, history: &'a History) -> SwfResult<Self> {
        match event.category() {
            EventCategory::ActivityTask | EventCategory::ChildWorkflowExecution => {
                Ok(Self { event, history })
            }
            other => fmt_err!(
                IllegalArgument,
                "{} is not a step execution event ({})",
                event,
                other
            ),
        }
    }

    pub fn event(&self) -> &'a Event {
        self.event
    }

    pub fn state(&self) -> EventState {
        self.event.state()
    }

    pub fn kind(&self) -> &'static str {
        match self.event.category() {
            EventCategory::ChildWorkflowExecution => "child workflow",
            _ => "activity",
        }
    }

    fn scheduling_state(&self) -> EventState {
        match self.event.category() {
            EventCategory::ChildWorkflowExecution => EventState::StartInitiated,
            _ => EventState::Scheduled,
        }
    }

    /// The event that scheduled this unit of work, which carries its control.
    pub fn scheduled_event(&self) -> SwfResult<&'a Event> {
        if self.event.state() == self.scheduling_state() {
            return Ok(self.event);
        }
        let id = match self.event.attributes().scheduling_event_id() {
            Some(id) => id,
            None => {
                return fmt_err!(
                    InvalidControl,
                    "{} does not reference a scheduling event",
                    self.event
                );
            }
        };
        match self.history.get_by_id(id) {
            Some(scheduled) if scheduled.is(self.event.category(), self.scheduling_state()) => {
                Ok(scheduled)
            }
            Some(other) => fmt_err!(
                InconsistentState,
                "{} references {} as its scheduling event",
                self.event,
                other
            ),
            None => fmt_err!(
                NotFound,
                "scheduling event {} of {} is not in the history",
                id,
                self.event
            ),
        }
    }

    /// Id of the scheduling event, shared by every event of the same unit of work.
    pub fn unit_id(&self) -> SwfResult<i64> {
        Ok(self.scheduled_event()?.id())
    }

    pub fn control(&self) -> SwfResult<Control> {
        let scheduled = self.scheduled_event()?;
        match scheduled.attributes().control() {
            Some(text) if !text.is_empty() => Control::decode(text),
            _ => fmt_err!(InvalidControl, "{} carries no control", scheduled),
        }
    }

    pub fn number(&self) -> SwfResult<usize> {
        self.control()?.step_number()
    }

    pub fn retry_remaining(&self) -> SwfResult<u32> {
        Ok(self.control()?.retry.unwrap_or(0))
    }

    pub fn partition_id(&self) -> SwfResult<Option<Object>> {
        Ok(self.control()?.partition)
    }

    /// Activity or workflow type name the unit was scheduled as.
    pub fn scheduled_as(&self) -> InlineStr {
        let scheduled = self.scheduled_event().unwrap_or(self.event);
        let type_ref = match scheduled.category() {
            EventCategory::ChildWorkflowExecution => scheduled
                .attributes()
                .as_child_workflow_execution()
                .and_then(|x| x.workflow_type.as_ref()),
            _ => scheduled
                .attributes()
                .as_activity_task()
                .and_then(|x| x.activity_type.as_ref()),
        };
        type_ref
            .map(|x| x.name.clone())
            .unwrap_or_else(|| scheduled.name().into())
    }

    pub fn result(&self) -> Option<&'a str> {
        self.event.attributes().result()
    }

    pub fn reason(&self) -> Option<&'a str> {
        self.event.attributes().reason()
    }

    pub fn details(&self) -> Option<&'a str> {
        self.event.attributes().details()
    }

    pub fn timeout_type(&self) -> Option<&'a str> {
        self.event.attributes().timeout_type()
    }

    /// Timeout value that expired, read from the scheduling event of an activity.
    pub fn configured_timeout(&self) -> Option<&'a str> {
        let timeout_type = self.timeout_type()?;
        self.scheduled_event()
            .ok()?
            .attributes()
            .as_activity_task()?
            .configured_timeout(timeout_type)
    }
}
