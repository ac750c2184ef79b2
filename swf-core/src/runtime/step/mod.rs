mod activity_step;
mod child_workflow_step;
mod decision_round;
mod group_step;
mod step_definition;

pub use activity_step::ActivityStep;
pub use child_workflow_step::ChildWorkflowStep;
pub use decision_round::DecisionRound;
pub use group_step::{GroupStep, PartitionProgress};
pub use step_definition::{StepDefinition, StepSpec};
