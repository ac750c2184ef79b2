use std::str::FromStr;

use strum_macros::{AsRefStr, Display, EnumString};
use swf_common::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    NotStarted,
    Running,
    Completed,
    Failed,
}

/// Key/value state of one workflow execution. It travels between decision rounds as the JSON
/// execution context of the completed decision task. Keys starting with `__` belong to the
/// engine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Context {
    values: HashMap<InlineStr, Object>,
}

impl Context {
    pub const STATUS_KEY: &'static str = "__status__";
    pub const CURRENT_STEP_KEY: &'static str = "__current_step__";
    pub const ONGOING_STEPS_KEY: &'static str = "__ongoing_steps__";
    pub const REASON_KEY: &'static str = "__reason__";
    pub const DETAILS_KEY: &'static str = "__details__";
    pub const ERROR_KEY: &'static str = "__error__";
    pub const WORKFLOW_TAG_LIST_KEY: &'static str = "__workflow_tag_list__";
    pub const WORKFLOW_ID_KEY: &'static str = "__workflow_id__";

    const RESERVED_PREFIX: &'static str = "__";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_reserved(key: &str) -> bool {
        key.starts_with(Self::RESERVED_PREFIX)
    }

    /// Rebuilds a context from a serialized execution context. Missing or blank input yields an
    /// empty context.
    pub fn decode(execution_context: Option<&str>) -> SwfResult<Self> {
        let text = match execution_context {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Ok(Self::default()),
        };
        match serde_json::from_str::<serde_json::Value>(text)? {
            serde_json::Value::Object(map) => Ok(Self {
                values: Object::convert_jsonmap_to_hashmap(&map),
            }),
            serde_json::Value::Null => Ok(Self::default()),
            other => fmt_err!(
                IllegalArgument,
                "execution context must be a JSON object, got {}",
                other
            ),
        }
    }

    pub fn encode(&self) -> String {
        self.to_json().to_string()
    }

    pub fn to_json(&self) -> serde_json::Value {
        Object::convert_hashmap_to_json(&self.values)
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<InlineStr>, value: impl Into<Object>) -> Option<Object> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Object> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InlineStr, &Object)> {
        self.values.iter()
    }

    pub fn values(&self) -> &HashMap<InlineStr, Object> {
        &self.values
    }

    pub fn into_inner(self) -> HashMap<InlineStr, Object> {
        self.values
    }

    /// Copies every entry of `values` except engine keys.
    pub fn merge_unreserved(&mut self, values: HashMap<InlineStr, Object>) {
        for (key, value) in values {
            if Self::is_reserved(&key) {
                warn!("ignoring reserved key '{}' in incoming values", key);
                continue;
            }
            self.values.insert(key, value);
        }
    }

    /// Entries without engine bookkeeping.
    pub fn unreserved(&self) -> HashMap<InlineStr, Object> {
        self.values
            .iter()
            .filter(|(k, _)| !Self::is_reserved(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// engine bookkeeping
impl Context {
    /// Marks a fresh execution as running on step 0 with nothing ongoing yet.
    pub fn init(&mut self) {
        self.set_status(WorkflowStatus::Running);
        self.set_current_step(0);
        self.set_ongoing_steps(&[]);
    }

    pub fn status(&self) -> SwfResult<WorkflowStatus> {
        match self.values.get(Self::STATUS_KEY) {
            None => Ok(WorkflowStatus::NotStarted),
            Some(Object::String(s)) => WorkflowStatus::from_str(s).map_err(|_| {
                ErrorCode::IllegalArgument(format!("unknown workflow status '{}'", s))
            }),
            Some(other) => fmt_err!(IllegalArgument, "unknown workflow status {:?}", other),
        }
    }

    pub fn set_status(&mut self, status: WorkflowStatus) {
        let status: &str = status.as_ref();
        self.insert(Self::STATUS_KEY, status);
    }

    pub fn current_step(&self) -> SwfResult<usize> {
        match self.values.get(Self::CURRENT_STEP_KEY) {
            Some(value) => to_step_number(value),
            None => fmt_err!(
                NotFound,
                "'{}' is missing, the workflow was not initialized",
                Self::CURRENT_STEP_KEY
            ),
        }
    }

    pub fn set_current_step(&mut self, number: usize) {
        self.insert(Self::CURRENT_STEP_KEY, number);
    }

    pub fn ongoing_steps(&self) -> SwfResult<Vec<usize>> {
        match self.values.get(Self::ONGOING_STEPS_KEY) {
            None => Ok(vec![]),
            Some(value) => value.as_list()?.iter().map(to_step_number).collect(),
        }
    }

    pub fn set_ongoing_steps(&mut self, numbers: &[usize]) {
        let list = numbers.iter().map(|x| Object::from(*x)).collect::<Vec<_>>();
        self.insert(Self::ONGOING_STEPS_KEY, list);
    }

    pub fn push_ongoing_step(&mut self, number: usize) -> SwfResult<()> {
        let mut ongoing = self.ongoing_steps()?;
        if !ongoing.contains(&number) {
            ongoing.push(number);
        }
        self.set_ongoing_steps(&ongoing);
        Ok(())
    }

    pub fn remove_ongoing_step(&mut self, number: usize) -> SwfResult<()> {
        let mut ongoing = self.ongoing_steps()?;
        ongoing.retain(|x| *x != number);
        self.set_ongoing_steps(&ongoing);
        Ok(())
    }

    pub fn tag_list(&self) -> SwfResult<Vec<InlineStr>> {
        match self.values.get(Self::WORKFLOW_TAG_LIST_KEY) {
            None | Some(Object::Null) => Ok(vec![]),
            Some(value) => value
                .as_list()?
                .iter()
                .map(|x| x.as_string().cloned())
                .collect(),
        }
    }

    /// Explicit id for child workflow executions, if the workflow input carried one.
    pub fn workflow_id(&self) -> Option<InlineStr> {
        match self.values.get(Self::WORKFLOW_ID_KEY) {
            None | Some(Object::Null) => None,
            Some(value) => Some(value.to_string()),
        }
    }
}

impl From<HashMap<InlineStr, Object>> for Context {
    fn from(values: HashMap<InlineStr, Object>) -> Self {
        Self { values }
    }
}

fn to_step_number(value: &Object) -> SwfResult<usize> {
    let number = value.as_long()?;
    usize::try_from(number)
        .map_err(|_| ErrorCode::IllegalArgument(format!("invalid step number {}", number)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_keys() {
        assert!(Context::is_reserved("__status__"));
        assert!(Context::is_reserved("__anything__"));
        assert!(!Context::is_reserved("amount"));
        assert!(Context::is_reserved("__half"));
        assert!(!Context::is_reserved("_unknown_result@0"));
    }

    #[test]
    fn decode_blank_is_empty() {
        assert!(Context::decode(None).unwrap().is_empty());
        assert!(Context::decode(Some("  ")).unwrap().is_empty());
        assert!(Context::decode(Some("[1]")).is_err());
    }

    #[test]
    fn bookkeeping_round_trips_through_json() {
        let mut context = Context::new();
        context.insert("amount", 10);
        context.init();
        context.push_ongoing_step(0).unwrap();
        context.set_current_step(0);

        let decoded = Context::decode(Some(&context.encode())).unwrap();
        assert_eq!(decoded.status().unwrap(), WorkflowStatus::Running);
        assert_eq!(decoded.current_step().unwrap(), 0);
        assert_eq!(decoded.ongoing_steps().unwrap(), vec![0]);
        assert_eq!(decoded.get("amount"), Some(&Object::Int(10)));
        assert_eq!(decoded.get(Context::STATUS_KEY), Some(&Object::from("RUNNING")));
    }

    #[test]
    fn merge_skips_reserved_keys() {
        let mut context = Context::new();
        context.set_current_step(3);
        context.merge_unreserved(HashMap::from([
            (InlineStr::from("x"), Object::from(1)),
            (InlineStr::from("__current_step__"), Object::from(9)),
        ]));
        assert_eq!(context.current_step().unwrap(), 3);
        assert_eq!(context.get("x"), Some(&Object::Int(1)));
        assert_eq!(context.unreserved().len(), 1);
    }
}
