mod config;
mod model;
mod runtime;
mod utils;

pub use config::{DeciderProperties, IdStrategy};
pub use model::{
    ActivityTaskAttributes, ChildWorkflowExecutionAttributes, CompleteWorkflowExecutionAttributes,
    Context, Control, Decision, DecisionTaskAttributes, DecisionType, Event, EventAttributes,
    EventCategory, EventState, ExternalWorkflowExecutionAttributes,
    FailWorkflowExecutionAttributes, History, MarkerAttributes, ScheduleActivityTaskAttributes,
    StartChildWorkflowExecutionAttributes, TimerAttributes, TypeRef, WorkflowExecutionAttributes,
    WorkflowStatus,
};
pub use runtime::{
    ActivityStep, ChildWorkflowStep, CompiledEvent, DeciderOutcome, DecisionRound, EventFactory,
    GroupStep, Hook, PartitionProgress, SignalDefinition, SignalExecution, StateMachine,
    StepDefinition, StepExecution, StepSpec, Workflow, WorkflowBuilder,
};
pub use utils::IdGenerator;
