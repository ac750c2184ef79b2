mod event;
mod execution;
mod step;

pub use event::{CompiledEvent, EventFactory, StateMachine};
pub use execution::{
    DeciderOutcome, Hook, SignalDefinition, SignalExecution, StepExecution, Workflow,
    WorkflowBuilder,
};
pub use step::{
    ActivityStep, ChildWorkflowStep, DecisionRound, GroupStep, PartitionProgress,
    StepDefinition, StepSpec,
};
