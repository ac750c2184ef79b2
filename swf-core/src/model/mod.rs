mod attributes;
mod context;
mod control;
mod decision;
mod event;
mod history;

pub use attributes::{
    ActivityTaskAttributes, ChildWorkflowExecutionAttributes, DecisionTaskAttributes,
    EventAttributes, ExternalWorkflowExecutionAttributes, MarkerAttributes, TimerAttributes,
    TypeRef, WorkflowExecutionAttributes,
};
pub use context::{Context, WorkflowStatus};
pub use control::Control;
pub use decision::{
    CompleteWorkflowExecutionAttributes, Decision, DecisionType,
    FailWorkflowExecutionAttributes, ScheduleActivityTaskAttributes,
    StartChildWorkflowExecutionAttributes,
};
pub use event::{Event, EventCategory, EventState};
pub use history::History;
