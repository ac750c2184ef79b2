mod common;

use assert_matches::assert_matches;
use common::{init_logger, HistoryBuilder};
use serde_json::json;
use swf_common::prelude::*;
use swf_core::{
    ActivityStep, ChildWorkflowStep, Context, DeciderProperties, Decision, GroupStep,
    SignalDefinition, StepSpec, Workflow, WorkflowStatus,
};

fn activity(name: &str) -> StepSpec {
    StepSpec::new(name)
}

fn scheduled_partitions(decisions: &[Decision]) -> Vec<Object> {
    decisions
        .iter()
        .filter_map(|x| x.control())
        .filter_map(|x| x.partition.clone())
        .collect()
}

fn fail_reason(decision: &Decision) -> &str {
    match decision {
        Decision::FailWorkflowExecution(x) => &x.reason,
        other => panic!("expected a failure, got {:?}", other),
    }
}

fn complete_result(decision: &Decision) -> serde_json::Value {
    match decision {
        Decision::CompleteWorkflowExecution(x) => {
            serde_json::from_str(&x.result).expect("result is json")
        }
        other => panic!("expected a completion, got {:?}", other),
    }
}

#[test]
fn single_activity_end_to_end() {
    init_logger();
    let workflow = Workflow::builder("order", "1.0")
        .task_list("orders")
        .step(ActivityStep::new(activity("double").with_input(["x"]), "1.0"))
        .build()
        .expect("build workflow");

    let mut builder = HistoryBuilder::started(json!({"x": 1}));
    let outcome = workflow.decide(&builder.build()).expect("first round");
    assert_eq!(outcome.decisions.len(), 1);
    assert_matches!(&outcome.decisions[0], Decision::ScheduleActivityTask(x) => {
        assert_eq!(x.input, HashMap::from([(InlineStr::from("x"), Object::Int(1))]));
        assert_eq!(x.activity_type.name, "double");
        assert_eq!(x.task_list, "orders");
        assert!(x.activity_id.starts_with("double-"));
        assert_eq!(x.control.step_number, Some(0));
        assert_eq!(x.control.retry, Some(0));
    });
    assert_eq!(outcome.context.current_step().unwrap(), 0);
    assert_eq!(outcome.context.ongoing_steps().unwrap(), vec![0]);
    assert_eq!(outcome.context.status().unwrap(), WorkflowStatus::Running);

    let scheduled = builder.respond(&outcome);
    builder.activity_completed(scheduled[0], r#"{"y": 2}"#);
    builder.decision_task();

    let outcome = workflow.decide(&builder.build()).expect("second round");
    assert_eq!(outcome.decisions.len(), 1);
    let result = complete_result(&outcome.decisions[0]);
    assert_eq!(result, json!({"x": 1, "y": 2}));
    assert_eq!(outcome.context.current_step().unwrap(), 1);
    assert_eq!(outcome.context.status().unwrap(), WorkflowStatus::Completed);
}

#[test]
fn fan_out_respects_the_round_cap() {
    init_logger();
    let properties = DeciderProperties::default()
        .with_max_partitions_per_decision(2)
        .unwrap();
    let workflow = Workflow::builder("sync", "1.0")
        .task_list("sync")
        .properties(properties)
        .step(GroupStep::new(
            "accounts",
            ActivityStep::new(activity("sync_account").with_input(["accounts"]), "1.0"),
        ))
        .step(ActivityStep::new(activity("report"), "1.0"))
        .build()
        .expect("build workflow");

    let mut builder = HistoryBuilder::started(json!({"accounts": ["A", "B", "C"]}));
    let outcome = workflow.decide(&builder.build()).expect("first round");
    assert_eq!(
        scheduled_partitions(&outcome.decisions),
        vec![Object::from("A"), Object::from("B")]
    );
    assert_matches!(&outcome.decisions[0], Decision::ScheduleActivityTask(x) => {
        assert_eq!(x.input.get("accounts"), Some(&Object::from("A")));
        assert_eq!(x.control.key.as_deref(), Some("accounts"));
    });

    let scheduled = builder.respond(&outcome);
    builder.activity_completed(scheduled[0], "{}");
    builder.activity_completed(scheduled[1], "{}");
    builder.decision_task();
    let outcome = workflow.decide(&builder.build()).expect("second round");
    assert_eq!(scheduled_partitions(&outcome.decisions), vec![Object::from("C")]);
    assert_eq!(outcome.context.current_step().unwrap(), 0);

    let scheduled = builder.respond(&outcome);
    builder.activity_completed(scheduled[0], "{}");
    builder.decision_task();
    let outcome = workflow.decide(&builder.build()).expect("third round");
    assert_eq!(outcome.decisions.len(), 1);
    assert_matches!(&outcome.decisions[0], Decision::ScheduleActivityTask(x) => {
        assert_eq!(x.activity_type.name, "report");
        assert_eq!(x.control.step_number, Some(1));
    });
    assert_eq!(outcome.context.current_step().unwrap(), 1);
}

#[test]
fn partition_waits_for_its_siblings() {
    init_logger();
    let workflow = Workflow::builder("sync", "1.0")
        .step(GroupStep::new(
            "accounts",
            ActivityStep::new(activity("sync_account"), "1.0"),
        ))
        .build()
        .expect("build workflow");

    let mut builder = HistoryBuilder::started(json!({"accounts": ["A", "B"]}));
    let outcome = workflow.decide(&builder.build()).expect("first round");
    assert_eq!(outcome.decisions.len(), 2);

    let scheduled = builder.respond(&outcome);
    builder.activity_completed(scheduled[1], "{}");
    builder.decision_task();
    let outcome = workflow.decide(&builder.build()).expect("second round");
    assert!(outcome.decisions.is_empty());

    builder.respond(&outcome);
    builder.activity_completed(scheduled[0], "{}");
    builder.decision_task();
    let outcome = workflow.decide(&builder.build()).expect("third round");
    assert_matches!(&outcome.decisions[..], [Decision::CompleteWorkflowExecution(_)]);
}

#[test]
fn empty_fan_out_moves_on() {
    init_logger();
    let workflow = Workflow::builder("sync", "1.0")
        .step(GroupStep::new(
            "accounts",
            ActivityStep::new(activity("sync_account"), "1.0"),
        ))
        .step(ActivityStep::new(activity("report"), "1.0"))
        .build()
        .expect("build workflow");

    let builder = HistoryBuilder::started(json!({"accounts": []}));
    let outcome = workflow.decide(&builder.build()).expect("first round");
    assert_matches!(&outcome.decisions[..], [Decision::ScheduleActivityTask(x)] => {
        assert_eq!(x.activity_type.name, "report");
    });
    assert_eq!(outcome.context.current_step().unwrap(), 1);
}

#[test]
fn retry_budget_is_spent_then_the_workflow_fails() {
    init_logger();
    let workflow = Workflow::builder("order", "1.0")
        .step(ActivityStep::new(activity("charge").with_retry(2), "1.0"))
        .build()
        .expect("build workflow");

    let mut builder = HistoryBuilder::started(json!({}));
    let mut outcome = workflow.decide(&builder.build()).expect("first round");
    for expected_retry in [1, 0] {
        let scheduled = builder.respond(&outcome);
        builder.activity_failed(scheduled[0], "card declined");
        builder.decision_task();
        outcome = workflow.decide(&builder.build()).expect("retry round");
        assert_matches!(&outcome.decisions[..], [Decision::ScheduleActivityTask(x)] => {
            assert_eq!(x.control.retry, Some(expected_retry));
        });
    }

    let scheduled = builder.respond(&outcome);
    builder.activity_failed(scheduled[0], "card declined");
    builder.decision_task();
    let outcome = workflow.decide(&builder.build()).expect("last round");
    assert_eq!(outcome.decisions.len(), 1);
    assert_eq!(
        fail_reason(&outcome.decisions[0]),
        "error in activity 'charge': card declined"
    );
    assert_eq!(outcome.context.status().unwrap(), WorkflowStatus::Failed);
    assert_eq!(outcome.context.get(Context::DETAILS_KEY), Some(&Object::from("stack")));
}

#[test]
fn timeout_without_retry_fails() {
    init_logger();
    let workflow = Workflow::builder("order", "1.0")
        .step(ActivityStep::new(activity("charge"), "1.0").with_start_to_close_timeout("30"))
        .build()
        .expect("build workflow");

    let mut builder = HistoryBuilder::started(json!({}));
    let outcome = workflow.decide(&builder.build()).expect("first round");
    let scheduled = builder.respond(&outcome);
    builder.activity_timed_out(scheduled[0], "START_TO_CLOSE");
    builder.decision_task();

    let outcome = workflow.decide(&builder.build()).expect("second round");
    assert_matches!(&outcome.decisions[..], [Decision::FailWorkflowExecution(x)] => {
        assert_eq!(x.reason, "activity 'charge' timed out");
        assert_eq!(x.details, "start_to_close");
    });
}

#[test]
fn missing_context_key_fails_the_workflow() {
    init_logger();
    let workflow = Workflow::builder("order", "1.0")
        .step(ActivityStep::new(activity("charge").with_input(["amount"]), "1.0"))
        .build()
        .expect("build workflow");

    let builder = HistoryBuilder::started(json!({"currency": "EUR"}));
    let outcome = workflow.decide(&builder.build()).expect("never raises");
    assert_eq!(outcome.decisions.len(), 1);
    assert!(fail_reason(&outcome.decisions[0]).contains("variable 'amount' is missing in context"));
    assert_eq!(outcome.context.status().unwrap(), WorkflowStatus::Failed);
}

#[test]
fn missing_key_on_a_later_step() {
    init_logger();
    let workflow = Workflow::builder("order", "1.0")
        .step(ActivityStep::new(activity("quote"), "1.0"))
        .step(ActivityStep::new(activity("charge").with_input(["amount"]), "1.0"))
        .build()
        .expect("build workflow");

    let mut builder = HistoryBuilder::started(json!({}));
    let outcome = workflow.decide(&builder.build()).expect("first round");
    let scheduled = builder.respond(&outcome);
    builder.activity_completed(scheduled[0], r#"{"price": 3}"#);
    builder.decision_task();

    let outcome = workflow.decide(&builder.build()).expect("second round");
    assert_eq!(
        fail_reason(&outcome.decisions[0]),
        "variable 'amount' is missing in context"
    );
    assert_eq!(outcome.context.get("price"), Some(&Object::Int(3)));
}

#[test]
fn invalid_input_fails_the_workflow() {
    init_logger();
    let workflow = Workflow::builder("order", "1.0")
        .step(ActivityStep::new(activity("charge"), "1.0"))
        .build()
        .expect("build workflow");

    let builder = HistoryBuilder::started(json!([1, 2]));
    let outcome = workflow.decide(&builder.build()).expect("decide");
    assert!(fail_reason(&outcome.decisions[0]).contains("must be a mapping"));
}

#[test]
fn deciding_twice_gives_the_same_answer() {
    init_logger();
    let workflow = Workflow::builder("sync", "1.0")
        .step(GroupStep::new(
            "accounts",
            ActivityStep::new(activity("sync_account"), "1.0"),
        ))
        .build()
        .expect("build workflow");

    let history = HistoryBuilder::started(json!({"accounts": ["A", "B", "C"]})).build();
    let first = workflow.decide(&history).expect("decide");
    let second = workflow.decide(&history).expect("decide again");
    assert_eq!(first, second);
}

#[test]
fn setup_failure_is_reported() {
    init_logger();
    let workflow = Workflow::builder("order", "1.0")
        .step(ActivityStep::new(activity("charge"), "1.0"))
        .setup(|_| Err(anyhow::anyhow!("database is down")))
        .build()
        .expect("build workflow");

    let builder = HistoryBuilder::started(json!({}));
    let outcome = workflow.decide(&builder.build()).expect("decide");
    assert_matches!(&outcome.decisions[..], [Decision::FailWorkflowExecution(x)] => {
        assert_eq!(x.reason, "database is down");
        assert!(x.details.contains("database is down"));
        assert!(x.details.starts_with("Code: 1301"));
    });
    assert_eq!(outcome.context.status().unwrap(), WorkflowStatus::Failed);
}

#[test]
fn hooks_shape_the_context() {
    init_logger();
    let workflow = Workflow::builder("order", "1.0")
        .output(["total"])
        .step(ActivityStep::new(activity("charge").with_input(["amount"]), "1.0"))
        .setup(|mut context| {
            context.insert("amount", 10);
            Ok(context)
        })
        .teardown(|_| Err(anyhow::anyhow!("cleanup failed")))
        .build()
        .expect("build workflow");

    let mut builder = HistoryBuilder::started(json!({}));
    let outcome = workflow.decide(&builder.build()).expect("first round");
    assert_eq!(outcome.context.get("amount"), Some(&Object::Int(10)));

    let scheduled = builder.respond(&outcome);
    builder.activity_completed(scheduled[0], r#"{"total": 12, "fee": 2}"#);
    builder.decision_task();
    let outcome = workflow.decide(&builder.build()).expect("second round");
    assert_eq!(complete_result(&outcome.decisions[0]), json!({"total": 12}));
    assert_eq!(
        outcome.context.get(Context::ERROR_KEY),
        Some(&Object::from("cleanup failed"))
    );
}

#[test]
fn step_output_restricts_merged_keys() {
    init_logger();
    let workflow = Workflow::builder("order", "1.0")
        .step(ActivityStep::new(activity("quote").with_output(["price"]), "1.0"))
        .step(ActivityStep::new(activity("ship"), "1.0"))
        .build()
        .expect("build workflow");

    let mut builder = HistoryBuilder::started(json!({}));
    let outcome = workflow.decide(&builder.build()).expect("first round");
    let scheduled = builder.respond(&outcome);
    builder.activity_completed(scheduled[0], r#"{"price": 3, "debug": true}"#);
    builder.decision_task();

    let outcome = workflow.decide(&builder.build()).expect("second round");
    assert_eq!(outcome.context.get("price"), Some(&Object::Int(3)));
    assert!(!outcome.context.contains_key("debug"));
}

#[test]
fn non_object_result_is_kept_aside() {
    init_logger();
    let workflow = Workflow::builder("order", "1.0")
        .step(ActivityStep::new(activity("quote"), "1.0"))
        .step(ActivityStep::new(activity("ship"), "1.0"))
        .build()
        .expect("build workflow");

    let mut builder = HistoryBuilder::started(json!({}));
    let outcome = workflow.decide(&builder.build()).expect("first round");
    let scheduled = builder.respond(&outcome);
    builder.activity_completed(scheduled[0], "plain text");
    builder.decision_task();

    let outcome = workflow.decide(&builder.build()).expect("second round");
    assert_eq!(
        outcome.context.get("_unknown_result@0"),
        Some(&Object::from("plain text"))
    );
}

#[test]
fn signal_schedules_its_target() {
    init_logger();
    let workflow = Workflow::builder("order", "1.0")
        .task_list("orders")
        .step(ActivityStep::new(activity("ship"), "1.0"))
        .signal(
            SignalDefinition::new(
                "refund",
                ActivityStep::new(activity("refund").with_input(["amount"]), "1.0"),
            )
            .with_input(["amount"]),
        )
        .build()
        .expect("build workflow");

    let mut builder = HistoryBuilder::started(json!({}));
    let outcome = workflow.decide(&builder.build()).expect("first round");
    builder.respond(&outcome);
    builder.signal("refund", json!({"amount": 5, "ignored": true}));
    builder.decision_task();

    let outcome = workflow.decide(&builder.build()).expect("signal round");
    assert_matches!(&outcome.decisions[..], [Decision::ScheduleActivityTask(x)] => {
        assert_eq!(x.activity_type.name, "refund");
        assert_eq!(x.task_list, "orders");
        assert_eq!(x.control.step_number, Some(1));
        assert_eq!(x.input.get("amount"), Some(&Object::Int(5)));
    });
    assert!(!outcome.context.contains_key("ignored"));
    assert_eq!(outcome.context.ongoing_steps().unwrap(), vec![0]);
    assert_eq!(outcome.context.current_step().unwrap(), 0);

    let scheduled = builder.respond(&outcome);
    builder.activity_completed(scheduled[0], r#"{"refunded": true}"#);
    builder.decision_task();
    let outcome = workflow.decide(&builder.build()).expect("refund round");
    assert!(outcome.decisions.is_empty());
    assert_eq!(outcome.context.get("refunded"), Some(&Object::Boolean(true)));
    assert_eq!(outcome.context.current_step().unwrap(), 0);
    assert_eq!(outcome.context.status().unwrap(), WorkflowStatus::Running);
}

#[test]
fn failed_signal_target_does_not_fail_the_workflow() {
    init_logger();
    let workflow = Workflow::builder("order", "1.0")
        .step(ActivityStep::new(activity("ship"), "1.0"))
        .signal(SignalDefinition::new(
            "refund",
            ActivityStep::new(activity("refund"), "1.0"),
        ))
        .build()
        .expect("build workflow");

    let mut builder = HistoryBuilder::started(json!({}));
    let outcome = workflow.decide(&builder.build()).expect("first round");
    let ship = builder.respond(&outcome);
    builder.signal("refund", json!({}));
    builder.decision_task();

    let outcome = workflow.decide(&builder.build()).expect("signal round");
    let refund = builder.respond(&outcome);
    builder.activity_failed(refund[0], "boom");
    builder.decision_task();
    let outcome = workflow.decide(&builder.build()).expect("failure round");
    assert!(outcome.decisions.is_empty());
    assert_eq!(outcome.context.status().unwrap(), WorkflowStatus::Running);

    builder.respond(&outcome);
    builder.activity_completed(ship[0], "{}");
    builder.decision_task();
    let outcome = workflow.decide(&builder.build()).expect("last round");
    assert_matches!(&outcome.decisions[..], [Decision::CompleteWorkflowExecution(_)]);
}

#[test]
fn reserved_result_keys_are_not_merged() {
    init_logger();
    let workflow = Workflow::builder("order", "1.0")
        .step(ActivityStep::new(activity("quote"), "1.0"))
        .step(ActivityStep::new(activity("ship"), "1.0"))
        .build()
        .expect("build workflow");

    let mut builder = HistoryBuilder::started(json!({}));
    let outcome = workflow.decide(&builder.build()).expect("first round");
    let scheduled = builder.respond(&outcome);
    builder.activity_completed(
        scheduled[0],
        r#"{"__hidden": 1, "__current_step__": 7, "ok": 2}"#,
    );
    builder.decision_task();

    let outcome = workflow.decide(&builder.build()).expect("second round");
    assert_eq!(outcome.context.get("__hidden"), None);
    assert_eq!(outcome.context.get("ok"), Some(&Object::Int(2)));
    assert_eq!(outcome.context.current_step().unwrap(), 1);
}

#[test]
fn unsupported_signal_fails_the_workflow() {
    init_logger();
    let workflow = Workflow::builder("order", "1.0")
        .step(ActivityStep::new(activity("ship"), "1.0"))
        .build()
        .expect("build workflow");

    let mut builder = HistoryBuilder::started(json!({}));
    let outcome = workflow.decide(&builder.build()).expect("first round");
    builder.respond(&outcome);
    builder.signal("pause", json!({}));
    builder.decision_task();

    let outcome = workflow.decide(&builder.build()).expect("signal round");
    assert!(fail_reason(&outcome.decisions[0]).contains("signal 'pause' is not supported"));
}

#[test]
fn child_workflow_step() {
    init_logger();
    let workflow = Workflow::builder("order", "1.0")
        .task_list("orders")
        .step(
            ChildWorkflowStep::new(activity("fulfil").with_input(["sku"]), "2.0")
                .with_execution_start_to_close_timeout("3600"),
        )
        .build()
        .expect("build workflow");

    let mut builder = HistoryBuilder::started_with(json!({
        "input": json!({"sku": "X1", "__workflow_id__": "fulfil-order-42"}).to_string(),
        "tagList": ["vip"],
    }));
    let outcome = workflow.decide(&builder.build()).expect("first round");
    assert_matches!(&outcome.decisions[..], [Decision::StartChildWorkflowExecution(x)] => {
        assert_eq!(x.workflow_id, "fulfil-order-42");
        assert_eq!(x.workflow_type.version, "2.0");
        assert_eq!(x.tag_list, vec![InlineStr::from("vip")]);
        assert_eq!(x.execution_start_to_close_timeout.as_deref(), Some("3600"));
    });

    let initiated = builder.respond(&outcome);
    builder.child_completed(initiated[0], r#"{"tracking": "T-9"}"#);
    builder.decision_task();
    let outcome = workflow.decide(&builder.build()).expect("second round");
    let result = complete_result(&outcome.decisions[0]);
    assert_eq!(result["tracking"], "T-9");
}

#[test]
fn strict_replay_rejects_an_inconsistent_history() {
    init_logger();
    let workflow = Workflow::builder("order", "1.0")
        .properties(DeciderProperties::default().with_strict_replay(true))
        .step(ActivityStep::new(activity("ship"), "1.0"))
        .build()
        .expect("build workflow");

    let mut builder = HistoryBuilder::started(json!({}));
    let outcome = workflow.decide(&builder.build()).expect("first round");
    let scheduled = builder.respond(&outcome);
    builder.push(
        "ActivityTaskCompleted",
        json!({"scheduledEventId": scheduled[0], "result": "{}"}),
    );
    builder.decision_task();

    let err = workflow.decide(&builder.build()).expect_err("inconsistent");
    assert_eq!(err.code(), ErrorCode::transition_error_code());
}

#[test]
fn builder_rejects_duplicate_signals() {
    let err = Workflow::builder("order", "1.0")
        .signal(SignalDefinition::new("a", ActivityStep::new(activity("x"), "1")))
        .signal(SignalDefinition::new("a", ActivityStep::new(activity("y"), "1")))
        .build()
        .expect_err("duplicate");
    assert_eq!(err.code(), ErrorCode::illegal_argument_code());
}
