use std::str::FromStr;

use strum::IntoEnumIterator;
use swf_common::prelude::*;
use swf_common::TextUtils;

use crate::model::{Event, EventAttributes, EventCategory, EventState};

/// Turns raw history records into classified events.
pub struct EventFactory;

impl EventFactory {
    pub const ATTRIBUTES_SUFFIX: &'static str = "EventAttributes";

    pub fn create(raw: &serde_json::Value) -> SwfResult<Event> {
        let record = raw.as_object().ok_or_else(|| {
            ErrorCode::IllegalArgument(format!("history record must be an object: {}", raw))
        })?;

        let type_name = match record.get("eventType") {
            Some(serde_json::Value::String(s)) => s.as_str(),
            _ => return str_err!(IllegalArgument, "history record has no eventType"),
        };
        let id = match record.get("eventId").and_then(|x| x.as_i64()) {
            Some(id) => id,
            None => {
                return fmt_err!(IllegalArgument, "{} record has no integer eventId", type_name);
            }
        };
        let timestamp = match record.get("eventTimestamp") {
            Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or_default(),
            Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
                ErrorCode::IllegalArgument(format!("invalid eventTimestamp '{}'", s))
            })?,
            _ => 0.0,
        };

        let (category, state) = Self::classify(type_name)?;
        let attributes = match record.get(&Self::attributes_key(type_name)) {
            Some(serde_json::Value::Object(map)) => EventAttributes::parse(category, map)?,
            Some(serde_json::Value::Null) | None => EventAttributes::empty(category),
            Some(other) => {
                return fmt_err!(
                    IllegalArgument,
                    "attributes of {} must be an object, got {}",
                    type_name,
                    other
                );
            }
        };

        trace!("event {} {} classified as {}/{}", id, type_name, category, state);
        Event::new(id, type_name, category, state, timestamp, attributes)
    }

    /// Splits a type name around the longest category token it contains. What surrounds the
    /// token, joined, is the state: `ScheduleActivityTaskFailed` -> (`ActivityTask`,
    /// `schedule_failed`).
    pub fn classify(type_name: &str) -> SwfResult<(EventCategory, EventState)> {
        let (category, position) = match EventCategory::iter()
            .filter_map(|c| {
                let token: &str = c.as_ref();
                type_name.find(token).map(|pos| (c, pos, token.len()))
            })
            .max_by_key(|(_, _, len)| *len)
            .map(|(c, pos, _)| (c, pos))
        {
            Some(found) => found,
            None => return fmt_err!(UnknownEventType, "unknown event type: {}", type_name),
        };

        let token: &str = category.as_ref();
        let raw_state = format!(
            "{}{}",
            &type_name[..position],
            &type_name[position + token.len()..]
        );
        let state_token = TextUtils::camel_to_underscore(&raw_state);
        let state = EventState::from_str(&state_token).map_err(|_| {
            ErrorCode::InvalidEventState(format!(
                "{}: no state '{}' in category {}",
                type_name, state_token, category
            ))
        })?;
        if !category.has_state(state) {
            return fmt_err!(
                InvalidEventState,
                "{}: state '{}' is not declared by category {}",
                type_name,
                state,
                category
            );
        }
        Ok((category, state))
    }

    /// `ActivityTaskCompleted` -> `activityTaskCompletedEventAttributes`.
    pub fn attributes_key(type_name: &str) -> String {
        format!(
            "{}{}",
            TextUtils::decapitalize(type_name),
            Self::ATTRIBUTES_SUFFIX
        )
    }
}
