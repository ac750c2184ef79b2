use serde_json::{json, Value};
use swf_common::prelude::*;
use swf_core::{Decision, Workflow};

use crate::DecisionTask;

/// Answer to a decision task, in the shape of `RespondDecisionTaskCompleted`.
#[derive(Clone, Debug, PartialEq)]
pub struct DecisionResponse {
    pub task_token: InlineStr,
    pub decisions: Vec<Decision>,
    pub execution_context: String,
}

impl DecisionResponse {
    pub fn to_json(&self) -> Value {
        json!({
            "taskToken": self.task_token.as_str(),
            "decisions": self.decisions.iter().map(Decision::to_json).collect::<Vec<_>>(),
            "executionContext": self.execution_context,
        })
    }
}

/// Runs polled decision tasks through one workflow.
#[derive(Clone, Debug)]
pub struct Decider {
    workflow: Arc<Workflow>,
}

impl Decider {
    pub fn new(workflow: Workflow) -> Self {
        Self {
            workflow: Arc::new(workflow),
        }
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// `None` when the history holds events this decider cannot handle. The task is then left
    /// unanswered so that it times out and is handed out again.
    pub fn handle(&self, task: &DecisionTask) -> SwfResult<Option<DecisionResponse>> {
        if let Some(workflow_type) = task.workflow_type() {
            if workflow_type.name.as_str() != self.workflow.name()
                || workflow_type.version.as_str() != self.workflow.version()
            {
                return fmt_err!(
                    IllegalArgument,
                    "task {} is for workflow {}, decider runs {}:{}",
                    task.task_token(),
                    workflow_type,
                    self.workflow.name(),
                    self.workflow.version()
                );
            }
        }

        match self.workflow.decide(task.history()) {
            Ok(outcome) => Ok(Some(DecisionResponse {
                task_token: task.task_token().into(),
                execution_context: outcome.context.encode(),
                decisions: outcome.decisions,
            })),
            Err(e) if e.is(ErrorCode::un_implement_code()) => {
                warn!(
                    "leaving task {} unanswered: {}",
                    task.task_token(),
                    e.display_text()
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
