use serde_json::{json, Map, Value};
use strum_macros::{AsRefStr, Display, EnumString};
use swf_common::prelude::*;

use super::{Control, TypeRef};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString, AsRefStr, Display)]
pub enum DecisionType {
    ScheduleActivityTask,
    StartChildWorkflowExecution,
    CompleteWorkflowExecution,
    FailWorkflowExecution,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleActivityTaskAttributes {
    pub activity_id: InlineStr,
    pub activity_type: TypeRef,
    pub control: Control,
    pub task_list: InlineStr,
    pub input: HashMap<InlineStr, Object>,
    pub heartbeat_timeout: Option<InlineStr>,
    pub schedule_to_close_timeout: Option<InlineStr>,
    pub schedule_to_start_timeout: Option<InlineStr>,
    pub start_to_close_timeout: Option<InlineStr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StartChildWorkflowExecutionAttributes {
    pub workflow_id: InlineStr,
    pub workflow_type: TypeRef,
    pub control: Control,
    pub task_list: InlineStr,
    pub input: HashMap<InlineStr, Object>,
    pub tag_list: Vec<InlineStr>,
    pub child_policy: Option<InlineStr>,
    pub execution_start_to_close_timeout: Option<InlineStr>,
    pub task_start_to_close_timeout: Option<InlineStr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompleteWorkflowExecutionAttributes {
    pub result: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FailWorkflowExecutionAttributes {
    pub reason: String,
    pub details: String,
}

/// One instruction returned to the orchestration service for the current decision task.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    ScheduleActivityTask(ScheduleActivityTaskAttributes),
    StartChildWorkflowExecution(StartChildWorkflowExecutionAttributes),
    CompleteWorkflowExecution(CompleteWorkflowExecutionAttributes),
    FailWorkflowExecution(FailWorkflowExecutionAttributes),
}

impl Decision {
    pub fn complete(result: impl Into<String>) -> Self {
        Self::CompleteWorkflowExecution(CompleteWorkflowExecutionAttributes {
            result: result.into(),
        })
    }

    pub fn fail(reason: impl Into<String>, details: impl Into<String>) -> Self {
        Self::FailWorkflowExecution(FailWorkflowExecutionAttributes {
            reason: reason.into(),
            details: details.into(),
        })
    }

    pub fn decision_type(&self) -> DecisionType {
        match self {
            Self::ScheduleActivityTask(_) => DecisionType::ScheduleActivityTask,
            Self::StartChildWorkflowExecution(_) => DecisionType::StartChildWorkflowExecution,
            Self::CompleteWorkflowExecution(_) => DecisionType::CompleteWorkflowExecution,
            Self::FailWorkflowExecution(_) => DecisionType::FailWorkflowExecution,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FailWorkflowExecution(_))
    }

    pub fn control(&self) -> Option<&Control> {
        match self {
            Self::ScheduleActivityTask(x) => Some(&x.control),
            Self::StartChildWorkflowExecution(x) => Some(&x.control),
            _ => None,
        }
    }

    /// Wire form accepted by `RespondDecisionTaskCompleted`. Inputs and controls travel as JSON
    /// text.
    pub fn to_json(&self) -> Value {
        let decision_type = self.decision_type();
        let (key, attributes) = match self {
            Self::ScheduleActivityTask(x) => {
                let mut attrs = Map::new();
                attrs.insert("activityId".into(), x.activity_id.as_str().into());
                attrs.insert("activityType".into(), x.activity_type.to_json());
                attrs.insert("control".into(), x.control.encode().into());
                attrs.insert("taskList".into(), json!({ "name": x.task_list.as_str() }));
                attrs.insert(
                    "input".into(),
                    Object::convert_hashmap_to_json(&x.input).to_string().into(),
                );
                put_opt(&mut attrs, "heartbeatTimeout", &x.heartbeat_timeout);
                put_opt(&mut attrs, "scheduleToCloseTimeout", &x.schedule_to_close_timeout);
                put_opt(&mut attrs, "scheduleToStartTimeout", &x.schedule_to_start_timeout);
                put_opt(&mut attrs, "startToCloseTimeout", &x.start_to_close_timeout);
                ("scheduleActivityTaskDecisionAttributes", attrs)
            }
            Self::StartChildWorkflowExecution(x) => {
                let mut attrs = Map::new();
                attrs.insert("workflowId".into(), x.workflow_id.as_str().into());
                attrs.insert("workflowType".into(), x.workflow_type.to_json());
                attrs.insert("control".into(), x.control.encode().into());
                attrs.insert("taskList".into(), json!({ "name": x.task_list.as_str() }));
                attrs.insert(
                    "input".into(),
                    Object::convert_hashmap_to_json(&x.input).to_string().into(),
                );
                if !x.tag_list.is_empty() {
                    let tags = x.tag_list.iter().map(|t| Value::from(t.as_str())).collect();
                    attrs.insert("tagList".into(), Value::Array(tags));
                }
                put_opt(&mut attrs, "childPolicy", &x.child_policy);
                put_opt(
                    &mut attrs,
                    "executionStartToCloseTimeout",
                    &x.execution_start_to_close_timeout,
                );
                put_opt(
                    &mut attrs,
                    "taskStartToCloseTimeout",
                    &x.task_start_to_close_timeout,
                );
                ("startChildWorkflowExecutionDecisionAttributes", attrs)
            }
            Self::CompleteWorkflowExecution(x) => {
                let mut attrs = Map::new();
                attrs.insert("result".into(), x.result.as_str().into());
                ("completeWorkflowExecutionDecisionAttributes", attrs)
            }
            Self::FailWorkflowExecution(x) => {
                let mut attrs = Map::new();
                attrs.insert("reason".into(), x.reason.as_str().into());
                attrs.insert("details".into(), x.details.as_str().into());
                ("failWorkflowExecutionDecisionAttributes", attrs)
            }
        };

        let mut decision = Map::new();
        decision.insert("decisionType".into(), decision_type.to_string().into());
        decision.insert(key.into(), Value::Object(attributes));
        Value::Object(decision)
    }
}

fn put_opt(attrs: &mut Map<String, Value>, key: &str, value: &Option<InlineStr>) {
    if let Some(v) = value {
        attrs.insert(key.to_string(), v.as_str().into());
    }
}
