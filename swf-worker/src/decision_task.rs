use serde_json::Value;
use swf_common::prelude::*;
use swf_core::{History, TypeRef};

/// One page of a `PollForDecisionTask` answer.
#[derive(Clone, Debug, PartialEq)]
pub struct DecisionTaskPage {
    pub task_token: InlineStr,
    pub workflow_type: Option<TypeRef>,
    pub events: Vec<Value>,
    pub next_page_token: Option<InlineStr>,
}

impl DecisionTaskPage {
    pub fn parse(page: &Value) -> SwfResult<Self> {
        let page = match page.as_object() {
            Some(page) => page,
            None => return str_err!(IllegalArgument, "decision task page must be an object"),
        };

        let task_token = match page.get("taskToken").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => InlineStr::from(token),
            _ => return str_err!(IllegalArgument, "decision task page has no taskToken"),
        };
        let workflow_type = match page.get("workflowType") {
            Some(value) => Some(TypeRef::try_from(value)?),
            None => None,
        };
        let events = match page.get("events") {
            Some(Value::Array(events)) => events.clone(),
            Some(Value::Null) | None => vec![],
            Some(other) => {
                return fmt_err!(IllegalArgument, "events must be a list, got {}", other);
            }
        };
        let next_page_token = page
            .get("nextPageToken")
            .and_then(Value::as_str)
            .filter(|x| !x.is_empty())
            .map(InlineStr::from);

        Ok(Self {
            task_token,
            workflow_type,
            events,
            next_page_token,
        })
    }

    pub fn has_next_page(&self) -> bool {
        self.next_page_token.is_some()
    }
}

/// A decision task with its full history, merged from every page the poll returned.
#[derive(Clone, Debug)]
pub struct DecisionTask {
    task_token: InlineStr,
    workflow_type: Option<TypeRef>,
    history: History,
}

impl DecisionTask {
    pub fn from_pages(pages: impl IntoIterator<Item = DecisionTaskPage>) -> SwfResult<Self> {
        let mut pages = pages.into_iter();
        let first = match pages.next() {
            Some(first) => first,
            None => return str_err!(IllegalArgument, "a decision task needs at least one page"),
        };

        let mut more = first.has_next_page();
        let mut events = first.events;
        for page in pages {
            if page.task_token != first.task_token {
                warn!(
                    "page of task {} merged into task {}",
                    page.task_token, first.task_token
                );
            }
            if !more {
                warn!("task {} has a page after its last one", first.task_token);
            }
            more = page.has_next_page();
            events.extend(page.events);
        }
        if more {
            warn!("task {} is missing its last history page", first.task_token);
        }

        let history = History::from_records(&events)?;
        debug!(
            "decision task {} has {} event(s)",
            first.task_token,
            history.len()
        );
        Ok(Self {
            task_token: first.task_token,
            workflow_type: first.workflow_type,
            history,
        })
    }

    pub fn task_token(&self) -> &str {
        &self.task_token
    }

    pub fn workflow_type(&self) -> Option<&TypeRef> {
        self.workflow_type.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn page(token: &str, first_id: i64, next: Option<&str>) -> DecisionTaskPage {
        let events = (first_id..first_id + 2)
            .map(|id| {
                json!({
                    "eventId": id,
                    "eventType": "MarkerRecorded",
                    "eventTimestamp": 1_700_000_000 + id,
                    "markerRecordedEventAttributes": {"markerName": "m"},
                })
            })
            .collect::<Vec<_>>();
        let mut page = json!({"taskToken": token, "events": events});
        if let Some(next) = next {
            page["nextPageToken"] = json!(next);
        }
        DecisionTaskPage::parse(&page).unwrap()
    }

    #[test]
    fn pages_are_merged_in_order() {
        let task = DecisionTask::from_pages([
            page("t-1", 1, Some("p2")),
            page("t-1", 3, Some("p3")),
            page("t-1", 5, None),
        ])
        .unwrap();
        assert_eq!(task.task_token(), "t-1");
        let ids = task.history().iter().map(|x| x.id()).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn a_page_needs_a_token() {
        let err = DecisionTaskPage::parse(&json!({"events": []})).unwrap_err();
        assert!(err.is(ErrorCode::illegal_argument_code()));

        let err = DecisionTask::from_pages(vec![]).unwrap_err();
        assert!(err.is(ErrorCode::illegal_argument_code()));
    }
}
