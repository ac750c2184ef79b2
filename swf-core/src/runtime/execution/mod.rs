mod signal_execution;
mod step_execution;
mod workflow;
mod workflow_builder;

pub use signal_execution::{SignalDefinition, SignalExecution};
pub use step_execution::StepExecution;
pub use workflow::{DeciderOutcome, Hook, Workflow};
pub use workflow_builder::WorkflowBuilder;
