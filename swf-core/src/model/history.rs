use std::ops::Index;

use swf_common::prelude::*;

use super::{Event, EventCategory, EventState};
use crate::runtime::{CompiledEvent, EventFactory};

/// Ordered list of events of one workflow execution, oldest first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct History {
    events: Vec<Event>,
}

impl History {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Builds a history from raw service records, classifying each one.
    pub fn from_records(records: &[serde_json::Value]) -> SwfResult<Self> {
        let events = records
            .iter()
            .map(EventFactory::create)
            .collect::<SwfResult<Vec<_>>>()?;
        Ok(Self { events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    pub fn first(&self) -> Option<&Event> {
        self.events.first()
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// A new history holding the events in `range`.
    pub fn slice<R>(&self, range: R) -> Self
    where R: std::slice::SliceIndex<[Event], Output = [Event]> {
        Self {
            events: self.events[range].to_vec(),
        }
    }

    /// The `n` most recent events, oldest first.
    pub fn latest(&self, n: usize) -> &[Event] {
        &self.events[self.events.len().saturating_sub(n)..]
    }

    /// Event ids are 1-based and dense in service histories, so the direct slot is tried before
    /// scanning.
    pub fn get_by_id(&self, id: i64) -> Option<&Event> {
        if id >= 1 {
            if let Some(event) = self.events.get((id - 1) as usize) {
                if event.id() == id {
                    return Some(event);
                }
            }
        }
        self.events
            .binary_search_by_key(&id, |x| x.id())
            .ok()
            .map(|pos| &self.events[pos])
    }

    pub fn filter(&self, category: EventCategory) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter().filter(move |x| x.category() == category)
    }

    /// Most recent completed decision task, `None` when no decision was ever made.
    pub fn last_decision(&self) -> Option<&Event> {
        self.events
            .iter()
            .rev()
            .find(|x| x.is(EventCategory::DecisionTask, EventState::Completed))
    }

    /// Events the current decision round has to react to: everything after the previous
    /// `DecisionTask/started` (excluding the trailing one that opened this round), restricted to
    /// the categories the interpreter handles. Oldest first.
    pub fn events_since_last_decision(&self) -> impl Iterator<Item = &Event> + '_ {
        let mut end = self.events.len();
        if matches!(self.events.last(), Some(x) if x.is(EventCategory::DecisionTask, EventState::Started))
        {
            end -= 1;
        }
        let start = self.events[..end]
            .iter()
            .rposition(|x| x.is(EventCategory::DecisionTask, EventState::Started))
            .map(|pos| pos + 1)
            .unwrap_or(0);

        self.events[start..end]
            .iter()
            .filter(|x| x.category().is_supported())
    }

    pub fn last_supported_event(&self) -> Option<&Event> {
        self.events
            .iter()
            .rev()
            .find(|x| x.category().is_supported())
    }

    /// Replays every unit of work through its lifecycle state machine.
    pub fn validate(&self) -> SwfResult<()> {
        CompiledEvent::validate_history(self)
    }
}

impl Index<usize> for History {
    type Output = Event;

    fn index(&self, index: usize) -> &Self::Output {
        &self.events[index]
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl From<Vec<Event>> for History {
    fn from(events: Vec<Event>) -> Self {
        Self { events }
    }
}
