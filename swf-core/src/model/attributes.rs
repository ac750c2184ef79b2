use serde_json::{Map, Value};
use swf_common::prelude::*;

use super::EventCategory;

type JsonMap = Map<String, Value>;

/// Name/version pair identifying an activity type or a workflow type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: InlineStr,
    pub version: InlineStr,
}

impl TypeRef {
    pub fn new(name: impl Into<InlineStr>, version: impl Into<InlineStr>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "name": self.name.as_str(),
            "version": self.version.as_str(),
        })
    }
}

impl TryFrom<&Value> for TypeRef {
    type Error = ErrorCode;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let obj = value.as_object().ok_or_else(|| {
            ErrorCode::IllegalArgument(format!("type reference must be an object: {}", value))
        })?;
        Ok(Self {
            name: opt_str(obj, "name")?.unwrap_or_default(),
            version: opt_str(obj, "version")?.unwrap_or_default(),
        })
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkflowExecutionAttributes {
    pub input: Option<InlineStr>,
    pub workflow_type: Option<TypeRef>,
    pub task_list: Option<InlineStr>,
    pub tag_list: Option<Vec<InlineStr>>,
    pub execution_start_to_close_timeout: Option<InlineStr>,
    pub task_start_to_close_timeout: Option<InlineStr>,
    pub child_policy: Option<InlineStr>,
    pub signal_name: Option<InlineStr>,
    pub result: Option<InlineStr>,
    pub reason: Option<InlineStr>,
    pub details: Option<InlineStr>,
    pub cause: Option<InlineStr>,
    pub timeout_type: Option<InlineStr>,
    pub decision_task_completed_event_id: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecisionTaskAttributes {
    pub task_list: Option<InlineStr>,
    pub start_to_close_timeout: Option<InlineStr>,
    pub execution_context: Option<InlineStr>,
    pub identity: Option<InlineStr>,
    pub timeout_type: Option<InlineStr>,
    pub scheduled_event_id: Option<i64>,
    pub started_event_id: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActivityTaskAttributes {
    pub activity_id: Option<InlineStr>,
    pub activity_type: Option<TypeRef>,
    pub control: Option<InlineStr>,
    pub input: Option<InlineStr>,
    pub result: Option<InlineStr>,
    pub reason: Option<InlineStr>,
    pub details: Option<InlineStr>,
    pub cause: Option<InlineStr>,
    pub identity: Option<InlineStr>,
    pub task_list: Option<InlineStr>,
    pub timeout_type: Option<InlineStr>,
    pub heartbeat_timeout: Option<InlineStr>,
    pub schedule_to_close_timeout: Option<InlineStr>,
    pub schedule_to_start_timeout: Option<InlineStr>,
    pub start_to_close_timeout: Option<InlineStr>,
    pub scheduled_event_id: Option<i64>,
    pub started_event_id: Option<i64>,
    pub decision_task_completed_event_id: Option<i64>,
}

impl ActivityTaskAttributes {
    /// Timeout configured on a scheduling event for the given SWF timeout type
    /// (`START_TO_CLOSE`, `HEARTBEAT`, ...).
    pub fn configured_timeout(&self, timeout_type: &str) -> Option<&str> {
        let timeout = match timeout_type {
            "HEARTBEAT" => &self.heartbeat_timeout,
            "SCHEDULE_TO_CLOSE" => &self.schedule_to_close_timeout,
            "SCHEDULE_TO_START" => &self.schedule_to_start_timeout,
            "START_TO_CLOSE" => &self.start_to_close_timeout,
            _ => return None,
        };
        timeout.as_deref()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChildWorkflowExecutionAttributes {
    pub workflow_id: Option<InlineStr>,
    pub run_id: Option<InlineStr>,
    pub workflow_type: Option<TypeRef>,
    pub control: Option<InlineStr>,
    pub input: Option<InlineStr>,
    pub result: Option<InlineStr>,
    pub reason: Option<InlineStr>,
    pub details: Option<InlineStr>,
    pub cause: Option<InlineStr>,
    pub task_list: Option<InlineStr>,
    pub tag_list: Option<Vec<InlineStr>>,
    pub child_policy: Option<InlineStr>,
    pub timeout_type: Option<InlineStr>,
    pub execution_start_to_close_timeout: Option<InlineStr>,
    pub task_start_to_close_timeout: Option<InlineStr>,
    pub initiated_event_id: Option<i64>,
    pub started_event_id: Option<i64>,
    pub decision_task_completed_event_id: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExternalWorkflowExecutionAttributes {
    pub workflow_id: Option<InlineStr>,
    pub run_id: Option<InlineStr>,
    pub signal_name: Option<InlineStr>,
    pub input: Option<InlineStr>,
    pub control: Option<InlineStr>,
    pub cause: Option<InlineStr>,
    pub initiated_event_id: Option<i64>,
    pub decision_task_completed_event_id: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimerAttributes {
    pub timer_id: Option<InlineStr>,
    pub control: Option<InlineStr>,
    pub start_to_fire_timeout: Option<InlineStr>,
    pub cause: Option<InlineStr>,
    pub started_event_id: Option<i64>,
    pub decision_task_completed_event_id: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarkerAttributes {
    pub marker_name: Option<InlineStr>,
    pub details: Option<InlineStr>,
    pub cause: Option<InlineStr>,
    pub decision_task_completed_event_id: Option<i64>,
}

/// Attributes of an event, typed by its category. Unknown keys of the raw record are dropped.
#[derive(Clone, Debug, PartialEq)]
pub enum EventAttributes {
    WorkflowExecution(WorkflowExecutionAttributes),
    DecisionTask(DecisionTaskAttributes),
    ActivityTask(ActivityTaskAttributes),
    ChildWorkflowExecution(ChildWorkflowExecutionAttributes),
    ExternalWorkflowExecution(ExternalWorkflowExecutionAttributes),
    Timer(TimerAttributes),
    Marker(MarkerAttributes),
}

impl EventAttributes {
    pub fn empty(category: EventCategory) -> Self {
        match category {
            EventCategory::WorkflowExecution => Self::WorkflowExecution(Default::default()),
            EventCategory::DecisionTask => Self::DecisionTask(Default::default()),
            EventCategory::ActivityTask => Self::ActivityTask(Default::default()),
            EventCategory::ChildWorkflowExecution => {
                Self::ChildWorkflowExecution(Default::default())
            }
            EventCategory::ExternalWorkflowExecution => {
                Self::ExternalWorkflowExecution(Default::default())
            }
            EventCategory::Timer => Self::Timer(Default::default()),
            EventCategory::Marker => Self::Marker(Default::default()),
        }
    }

    pub fn parse(category: EventCategory, raw: &JsonMap) -> SwfResult<Self> {
        let attributes = match category {
            EventCategory::WorkflowExecution => {
                Self::WorkflowExecution(WorkflowExecutionAttributes {
                    input: opt_str(raw, "input")?,
                    workflow_type: opt_type_ref(raw, "workflowType")?,
                    task_list: opt_task_list(raw)?,
                    tag_list: opt_str_list(raw, "tagList")?,
                    execution_start_to_close_timeout: opt_str(
                        raw,
                        "executionStartToCloseTimeout",
                    )?,
                    task_start_to_close_timeout: opt_str(raw, "taskStartToCloseTimeout")?,
                    child_policy: opt_str(raw, "childPolicy")?,
                    signal_name: opt_str(raw, "signalName")?,
                    result: opt_str(raw, "result")?,
                    reason: opt_str(raw, "reason")?,
                    details: opt_str(raw, "details")?,
                    cause: opt_str(raw, "cause")?,
                    timeout_type: opt_str(raw, "timeoutType")?,
                    decision_task_completed_event_id: opt_i64(
                        raw,
                        "decisionTaskCompletedEventId",
                    )?,
                })
            }
            EventCategory::DecisionTask => Self::DecisionTask(DecisionTaskAttributes {
                task_list: opt_task_list(raw)?,
                start_to_close_timeout: opt_str(raw, "startToCloseTimeout")?,
                execution_context: opt_str(raw, "executionContext")?,
                identity: opt_str(raw, "identity")?,
                timeout_type: opt_str(raw, "timeoutType")?,
                scheduled_event_id: opt_i64(raw, "scheduledEventId")?,
                started_event_id: opt_i64(raw, "startedEventId")?,
            }),
            EventCategory::ActivityTask => Self::ActivityTask(ActivityTaskAttributes {
                activity_id: opt_str(raw, "activityId")?,
                activity_type: opt_type_ref(raw, "activityType")?,
                control: opt_str(raw, "control")?,
                input: opt_str(raw, "input")?,
                result: opt_str(raw, "result")?,
                reason: opt_str(raw, "reason")?,
                details: opt_str(raw, "details")?,
                cause: opt_str(raw, "cause")?,
                identity: opt_str(raw, "identity")?,
                task_list: opt_task_list(raw)?,
                timeout_type: opt_str(raw, "timeoutType")?,
                heartbeat_timeout: opt_str(raw, "heartbeatTimeout")?,
                schedule_to_close_timeout: opt_str(raw, "scheduleToCloseTimeout")?,
                schedule_to_start_timeout: opt_str(raw, "scheduleToStartTimeout")?,
                start_to_close_timeout: opt_str(raw, "startToCloseTimeout")?,
                scheduled_event_id: opt_i64(raw, "scheduledEventId")?,
                started_event_id: opt_i64(raw, "startedEventId")?,
                decision_task_completed_event_id: opt_i64(raw, "decisionTaskCompletedEventId")?,
            }),
            EventCategory::ChildWorkflowExecution => {
                let (workflow_id, run_id) = opt_execution(raw)?;
                Self::ChildWorkflowExecution(ChildWorkflowExecutionAttributes {
                    workflow_id,
                    run_id,
                    workflow_type: opt_type_ref(raw, "workflowType")?,
                    control: opt_str(raw, "control")?,
                    input: opt_str(raw, "input")?,
                    result: opt_str(raw, "result")?,
                    reason: opt_str(raw, "reason")?,
                    details: opt_str(raw, "details")?,
                    cause: opt_str(raw, "cause")?,
                    task_list: opt_task_list(raw)?,
                    tag_list: opt_str_list(raw, "tagList")?,
                    child_policy: opt_str(raw, "childPolicy")?,
                    timeout_type: opt_str(raw, "timeoutType")?,
                    execution_start_to_close_timeout: opt_str(
                        raw,
                        "executionStartToCloseTimeout",
                    )?,
                    task_start_to_close_timeout: opt_str(raw, "taskStartToCloseTimeout")?,
                    initiated_event_id: opt_i64(raw, "initiatedEventId")?,
                    started_event_id: opt_i64(raw, "startedEventId")?,
                    decision_task_completed_event_id: opt_i64(
                        raw,
                        "decisionTaskCompletedEventId",
                    )?,
                })
            }
            EventCategory::ExternalWorkflowExecution => {
                let (workflow_id, run_id) = opt_execution(raw)?;
                Self::ExternalWorkflowExecution(ExternalWorkflowExecutionAttributes {
                    workflow_id,
                    run_id,
                    signal_name: opt_str(raw, "signalName")?,
                    input: opt_str(raw, "input")?,
                    control: opt_str(raw, "control")?,
                    cause: opt_str(raw, "cause")?,
                    initiated_event_id: opt_i64(raw, "initiatedEventId")?,
                    decision_task_completed_event_id: opt_i64(
                        raw,
                        "decisionTaskCompletedEventId",
                    )?,
                })
            }
            EventCategory::Timer => Self::Timer(TimerAttributes {
                timer_id: opt_str(raw, "timerId")?,
                control: opt_str(raw, "control")?,
                start_to_fire_timeout: opt_str(raw, "startToFireTimeout")?,
                cause: opt_str(raw, "cause")?,
                started_event_id: opt_i64(raw, "startedEventId")?,
                decision_task_completed_event_id: opt_i64(raw, "decisionTaskCompletedEventId")?,
            }),
            EventCategory::Marker => Self::Marker(MarkerAttributes {
                marker_name: opt_str(raw, "markerName")?,
                details: opt_str(raw, "details")?,
                cause: opt_str(raw, "cause")?,
                decision_task_completed_event_id: opt_i64(raw, "decisionTaskCompletedEventId")?,
            }),
        };
        Ok(attributes)
    }

    pub fn category(&self) -> EventCategory {
        match self {
            Self::WorkflowExecution(_) => EventCategory::WorkflowExecution,
            Self::DecisionTask(_) => EventCategory::DecisionTask,
            Self::ActivityTask(_) => EventCategory::ActivityTask,
            Self::ChildWorkflowExecution(_) => EventCategory::ChildWorkflowExecution,
            Self::ExternalWorkflowExecution(_) => EventCategory::ExternalWorkflowExecution,
            Self::Timer(_) => EventCategory::Timer,
            Self::Marker(_) => EventCategory::Marker,
        }
    }
}

/// Cross-category accessors; `None` when the category has no such attribute.
impl EventAttributes {
    pub fn input(&self) -> Option<&str> {
        match self {
            Self::WorkflowExecution(x) => x.input.as_deref(),
            Self::ActivityTask(x) => x.input.as_deref(),
            Self::ChildWorkflowExecution(x) => x.input.as_deref(),
            Self::ExternalWorkflowExecution(x) => x.input.as_deref(),
            _ => None,
        }
    }

    pub fn control(&self) -> Option<&str> {
        match self {
            Self::ActivityTask(x) => x.control.as_deref(),
            Self::ChildWorkflowExecution(x) => x.control.as_deref(),
            Self::ExternalWorkflowExecution(x) => x.control.as_deref(),
            Self::Timer(x) => x.control.as_deref(),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&str> {
        match self {
            Self::WorkflowExecution(x) => x.result.as_deref(),
            Self::ActivityTask(x) => x.result.as_deref(),
            Self::ChildWorkflowExecution(x) => x.result.as_deref(),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::WorkflowExecution(x) => x.reason.as_deref(),
            Self::ActivityTask(x) => x.reason.as_deref(),
            Self::ChildWorkflowExecution(x) => x.reason.as_deref(),
            _ => None,
        }
    }

    pub fn details(&self) -> Option<&str> {
        match self {
            Self::WorkflowExecution(x) => x.details.as_deref(),
            Self::ActivityTask(x) => x.details.as_deref(),
            Self::ChildWorkflowExecution(x) => x.details.as_deref(),
            Self::Marker(x) => x.details.as_deref(),
            _ => None,
        }
    }

    pub fn timeout_type(&self) -> Option<&str> {
        match self {
            Self::WorkflowExecution(x) => x.timeout_type.as_deref(),
            Self::DecisionTask(x) => x.timeout_type.as_deref(),
            Self::ActivityTask(x) => x.timeout_type.as_deref(),
            Self::ChildWorkflowExecution(x) => x.timeout_type.as_deref(),
            _ => None,
        }
    }

    pub fn execution_context(&self) -> Option<&str> {
        match self {
            Self::DecisionTask(x) => x.execution_context.as_deref(),
            _ => None,
        }
    }

    pub fn signal_name(&self) -> Option<&str> {
        match self {
            Self::WorkflowExecution(x) => x.signal_name.as_deref(),
            Self::ExternalWorkflowExecution(x) => x.signal_name.as_deref(),
            _ => None,
        }
    }

    pub fn tag_list(&self) -> Option<&[InlineStr]> {
        match self {
            Self::WorkflowExecution(x) => x.tag_list.as_deref(),
            Self::ChildWorkflowExecution(x) => x.tag_list.as_deref(),
            _ => None,
        }
    }

    /// Id of the event that scheduled (or initiated) the unit of work this event belongs to.
    pub fn scheduling_event_id(&self) -> Option<i64> {
        match self {
            Self::DecisionTask(x) => x.scheduled_event_id,
            Self::ActivityTask(x) => x.scheduled_event_id,
            Self::ChildWorkflowExecution(x) => x.initiated_event_id,
            Self::ExternalWorkflowExecution(x) => x.initiated_event_id,
            Self::Timer(x) => x.started_event_id,
            _ => None,
        }
    }

    pub fn as_activity_task(&self) -> Option<&ActivityTaskAttributes> {
        match self {
            Self::ActivityTask(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_child_workflow_execution(&self) -> Option<&ChildWorkflowExecutionAttributes> {
        match self {
            Self::ChildWorkflowExecution(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_workflow_execution(&self) -> Option<&WorkflowExecutionAttributes> {
        match self {
            Self::WorkflowExecution(x) => Some(x),
            _ => None,
        }
    }
}

fn opt_str(raw: &JsonMap, key: &str) -> SwfResult<Option<InlineStr>> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.into())),
        Some(Value::Number(n)) => Ok(Some(n.to_string().into())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string().into())),
        Some(other) => fmt_err!(
            IllegalArgument,
            "attribute '{}' must be a string, got {}",
            key,
            other
        ),
    }
}

fn opt_i64(raw: &JsonMap, key: &str) -> SwfResult<Option<i64>> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) => Ok(Some(v)),
            None => fmt_err!(IllegalArgument, "attribute '{}' must be an integer", key),
        },
        Some(Value::String(s)) => Ok(Some(s.trim().parse::<i64>()?)),
        Some(other) => fmt_err!(
            IllegalArgument,
            "attribute '{}' must be an integer, got {}",
            key,
            other
        ),
    }
}

fn opt_type_ref(raw: &JsonMap, key: &str) -> SwfResult<Option<TypeRef>> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(TypeRef::try_from(value)?)),
    }
}

fn opt_task_list(raw: &JsonMap) -> SwfResult<Option<InlineStr>> {
    match raw.get("taskList") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(obj)) => opt_str(obj, "name"),
        Some(Value::String(s)) => Ok(Some(s.into())),
        Some(other) => fmt_err!(IllegalArgument, "invalid taskList {}", other),
    }
}

fn opt_str_list(raw: &JsonMap, key: &str) -> SwfResult<Option<Vec<InlineStr>>> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => {
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                match item.as_str() {
                    Some(s) => list.push(s.into()),
                    None => {
                        return fmt_err!(IllegalArgument, "'{}' must hold strings only", key);
                    }
                }
            }
            Ok(Some(list))
        }
        Some(other) => fmt_err!(
            IllegalArgument,
            "attribute '{}' must be a list, got {}",
            key,
            other
        ),
    }
}

/// `workflowId`/`runId`, either inline or nested under `workflowExecution`.
fn opt_execution(raw: &JsonMap) -> SwfResult<(Option<InlineStr>, Option<InlineStr>)> {
    let (mut workflow_id, mut run_id) = (opt_str(raw, "workflowId")?, opt_str(raw, "runId")?);
    if let Some(Value::Object(execution)) = raw.get("workflowExecution") {
        if workflow_id.is_none() {
            workflow_id = opt_str(execution, "workflowId")?;
        }
        if run_id.is_none() {
            run_id = opt_str(execution, "runId")?;
        }
    }
    Ok((workflow_id, run_id))
}
