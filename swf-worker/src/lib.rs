mod decider;
mod decision_task;
mod heartbeat;

pub use decider::{Decider, DecisionResponse};
pub use decision_task::{DecisionTask, DecisionTaskPage};
pub use heartbeat::{Heart, HeartbeatGuard};
