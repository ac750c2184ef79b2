#![allow(dead_code)]

use serde_json::{json, Value};
use swf_core::{DeciderOutcome, Decision, History};

pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}

/// Writes service-shaped history records the way the orchestration service would, one event id
/// after the other.
pub struct HistoryBuilder {
    records: Vec<Value>,
    timestamp: f64,
}

impl HistoryBuilder {
    pub fn started(input: Value) -> Self {
        Self::started_with(json!({
            "input": input.to_string(),
            "workflowType": {"name": "order", "version": "1.0"},
            "taskList": {"name": "orders"},
        }))
    }

    pub fn started_with(attributes: Value) -> Self {
        let mut builder = Self {
            records: vec![],
            timestamp: 1_700_000_000.0,
        };
        builder.push("WorkflowExecutionStarted", attributes);
        builder.decision_task();
        builder
    }

    pub fn push(&mut self, event_type: &str, attributes: Value) -> i64 {
        let id = self.records.len() as i64 + 1;
        self.timestamp += 1.5;
        let mut key = event_type[..1].to_lowercase();
        key.push_str(&event_type[1..]);
        key.push_str("EventAttributes");
        self.records.push(json!({
            "eventId": id,
            "eventType": event_type,
            "eventTimestamp": self.timestamp,
            key: attributes,
        }));
        id
    }

    /// Opens a new decision task: scheduled, then started.
    pub fn decision_task(&mut self) -> i64 {
        let scheduled = self.push(
            "DecisionTaskScheduled",
            json!({"taskList": {"name": "orders"}, "startToCloseTimeout": "60"}),
        );
        self.push("DecisionTaskStarted", json!({"scheduledEventId": scheduled}))
    }

    /// Records the answer to the open decision task and the events the service derives from its
    /// decisions. Returns the scheduling event id of each scheduled unit of work.
    pub fn respond(&mut self, outcome: &DeciderOutcome) -> Vec<i64> {
        let started = self.records.len() as i64;
        let completed = self.push(
            "DecisionTaskCompleted",
            json!({
                "scheduledEventId": started - 1,
                "startedEventId": started,
                "executionContext": outcome.context.encode(),
            }),
        );

        let mut scheduled = vec![];
        for decision in &outcome.decisions {
            match decision {
                Decision::ScheduleActivityTask(x) => {
                    let id = self.push(
                        "ActivityTaskScheduled",
                        json!({
                            "activityId": x.activity_id.as_str(),
                            "activityType": x.activity_type.to_json(),
                            "control": x.control.encode(),
                            "input": swf_common::prelude::Object::convert_hashmap_to_json(&x.input).to_string(),
                            "taskList": {"name": x.task_list.as_str()},
                            "decisionTaskCompletedEventId": completed,
                        }),
                    );
                    scheduled.push(id);
                }
                Decision::StartChildWorkflowExecution(x) => {
                    let id = self.push(
                        "StartChildWorkflowExecutionInitiated",
                        json!({
                            "workflowId": x.workflow_id.as_str(),
                            "workflowType": x.workflow_type.to_json(),
                            "control": x.control.encode(),
                            "taskList": {"name": x.task_list.as_str()},
                            "decisionTaskCompletedEventId": completed,
                        }),
                    );
                    scheduled.push(id);
                }
                _ => {}
            }
        }
        scheduled
    }

    pub fn activity_started(&mut self, scheduled: i64) -> i64 {
        self.push(
            "ActivityTaskStarted",
            json!({"scheduledEventId": scheduled, "identity": "worker-1"}),
        )
    }

    pub fn activity_completed(&mut self, scheduled: i64, result: &str) -> i64 {
        let started = self.activity_started(scheduled);
        self.push(
            "ActivityTaskCompleted",
            json!({"scheduledEventId": scheduled, "startedEventId": started, "result": result}),
        )
    }

    pub fn activity_failed(&mut self, scheduled: i64, reason: &str) -> i64 {
        let started = self.activity_started(scheduled);
        self.push(
            "ActivityTaskFailed",
            json!({
                "scheduledEventId": scheduled,
                "startedEventId": started,
                "reason": reason,
                "details": "stack",
            }),
        )
    }

    pub fn activity_timed_out(&mut self, scheduled: i64, timeout_type: &str) -> i64 {
        let started = self.activity_started(scheduled);
        self.push(
            "ActivityTaskTimedOut",
            json!({
                "scheduledEventId": scheduled,
                "startedEventId": started,
                "timeoutType": timeout_type,
            }),
        )
    }

    pub fn child_completed(&mut self, initiated: i64, result: &str) -> i64 {
        let execution = json!({"workflowId": "child", "runId": "run-1"});
        let started = self.push(
            "ChildWorkflowExecutionStarted",
            json!({"initiatedEventId": initiated, "workflowExecution": execution}),
        );
        self.push(
            "ChildWorkflowExecutionCompleted",
            json!({
                "initiatedEventId": initiated,
                "startedEventId": started,
                "workflowExecution": execution,
                "result": result,
            }),
        )
    }

    pub fn signal(&mut self, name: &str, input: Value) -> i64 {
        self.push(
            "WorkflowExecutionSignaled",
            json!({"signalName": name, "input": input.to_string()}),
        )
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn build(&self) -> History {
        History::from_records(&self.records).expect("history must classify")
    }
}
