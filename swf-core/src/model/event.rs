use chrono::{DateTime, TimeZone, Utc};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use swf_common::prelude::*;

use super::EventAttributes;

/// Family of a history event. The variant name is the token searched for in the raw event type
/// name (`ActivityTaskCompleted` belongs to `ActivityTask`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, Display)]
pub enum EventCategory {
    WorkflowExecution,
    DecisionTask,
    ActivityTask,
    ChildWorkflowExecution,
    ExternalWorkflowExecution,
    Timer,
    Marker,
}

impl EventCategory {
    /// Every state an event of this category may be classified into.
    pub fn states(&self) -> &'static [EventState] {
        use EventState::*;
        match self {
            EventCategory::WorkflowExecution => &[
                Started,
                Completed,
                Failed,
                TimedOut,
                Canceled,
                Terminated,
                ContinuedAsNew,
                CancelRequested,
                Signaled,
                CompleteFailed,
                FailFailed,
                CancelFailed,
                ContinueAsNewFailed,
            ],
            EventCategory::DecisionTask => &[Scheduled, Started, Completed, TimedOut],
            EventCategory::ActivityTask => &[
                Scheduled,
                ScheduleFailed,
                Started,
                Completed,
                Failed,
                TimedOut,
                Canceled,
                CancelRequested,
                RequestCancelFailed,
            ],
            EventCategory::ChildWorkflowExecution => &[
                StartInitiated,
                StartFailed,
                Started,
                Completed,
                Failed,
                TimedOut,
                Canceled,
                Terminated,
            ],
            EventCategory::ExternalWorkflowExecution => &[
                SignalInitiated,
                Signaled,
                SignalFailed,
                RequestCancelInitiated,
                CancelRequested,
                RequestCancelFailed,
            ],
            EventCategory::Timer => &[Started, StartFailed, Fired, Canceled, CancelFailed],
            EventCategory::Marker => &[Recorded, RecordFailed],
        }
    }

    pub fn has_state(&self, state: EventState) -> bool {
        self.states().contains(&state)
    }

    /// Categories the workflow interpreter consumes. Decision tasks, timers and markers are
    /// bookkeeping only.
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            EventCategory::ActivityTask
                | EventCategory::ChildWorkflowExecution
                | EventCategory::ExternalWorkflowExecution
                | EventCategory::WorkflowExecution
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EventState {
    Scheduled,
    ScheduleFailed,
    Started,
    Completed,
    Failed,
    TimedOut,
    Canceled,
    CancelRequested,
    RequestCancelFailed,
    StartInitiated,
    StartFailed,
    Terminated,
    SignalInitiated,
    Signaled,
    SignalFailed,
    RequestCancelInitiated,
    ContinuedAsNew,
    CompleteFailed,
    FailFailed,
    CancelFailed,
    ContinueAsNewFailed,
    Fired,
    Recorded,
    RecordFailed,
}

/// One classified history entry. Immutable once built; `Event::new` refuses a state the category
/// does not declare.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    id: i64,
    name: InlineStr,
    category: EventCategory,
    state: EventState,
    timestamp: f64,
    attributes: EventAttributes,
}

impl Event {
    pub fn new(
        id: i64,
        name: impl Into<InlineStr>,
        category: EventCategory,
        state: EventState,
        timestamp: f64,
        attributes: EventAttributes,
    ) -> SwfResult<Self> {
        let name = name.into();
        if !category.has_state(state) {
            return fmt_err!(
                InvalidEventState,
                "event {} ({}): state '{}' is not declared by category {}",
                id,
                name,
                state,
                category
            );
        }
        if attributes.category() != category {
            return fmt_err!(
                IllegalArgument,
                "event {} ({}): {} attributes given to a {} event",
                id,
                name,
                attributes.category(),
                category
            );
        }

        Ok(Self {
            id,
            name,
            category,
            state,
            timestamp,
            attributes,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// Raw type name as received, e.g. `ScheduleActivityTaskFailed`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> EventCategory {
        self.category
    }

    pub fn state(&self) -> EventState {
        self.state
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        let secs = self.timestamp.floor();
        let nanos = ((self.timestamp - secs) * 1_000_000_000.0).round() as u32;
        Utc.timestamp_opt(secs as i64, nanos.min(999_999_999)).single()
    }

    pub fn attributes(&self) -> &EventAttributes {
        &self.attributes
    }

    pub fn is(&self, category: EventCategory, state: EventState) -> bool {
        self.category == category && self.state == state
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Event {} {} : {}>", self.id, self.category, self.state)
    }
}
