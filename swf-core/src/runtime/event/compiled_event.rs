use swf_common::prelude::*;

use crate::model::{Event, EventCategory, EventState, History};

/// Lifecycle of one unit of work (an activity, a child workflow, a decision task...).
#[derive(Debug)]
pub struct StateMachine {
    category: EventCategory,
    initial_state: EventState,
    transitions: &'static [(EventState, &'static [EventState])],
}

use EventState::*;

static WORKFLOW_EXECUTION: StateMachine = StateMachine {
    category: EventCategory::WorkflowExecution,
    initial_state: Started,
    transitions: &[(Started, &[Completed, Failed])],
};

static DECISION_TASK: StateMachine = StateMachine {
    category: EventCategory::DecisionTask,
    initial_state: Scheduled,
    transitions: &[
        (Scheduled, &[Started]),
        (Started, &[Completed, TimedOut]),
    ],
};

static ACTIVITY_TASK: StateMachine = StateMachine {
    category: EventCategory::ActivityTask,
    initial_state: Scheduled,
    transitions: &[
        (Scheduled, &[ScheduleFailed, Canceled, TimedOut, Started]),
        (Started, &[Canceled, Failed, TimedOut, Completed]),
    ],
};

static CHILD_WORKFLOW_EXECUTION: StateMachine = StateMachine {
    category: EventCategory::ChildWorkflowExecution,
    initial_state: StartInitiated,
    transitions: &[
        (StartInitiated, &[StartFailed, Started]),
        (Started, &[Canceled, Failed, TimedOut, Terminated]),
    ],
};

static EXTERNAL_WORKFLOW_EXECUTION: StateMachine = StateMachine {
    category: EventCategory::ExternalWorkflowExecution,
    initial_state: SignalInitiated,
    transitions: &[],
};

static TIMER: StateMachine = StateMachine {
    category: EventCategory::Timer,
    initial_state: Started,
    transitions: &[(Started, &[Fired, Canceled])],
};

static MARKER: StateMachine = StateMachine {
    category: EventCategory::Marker,
    initial_state: Recorded,
    transitions: &[],
};

impl StateMachine {
    pub fn of(category: EventCategory) -> &'static StateMachine {
        match category {
            EventCategory::WorkflowExecution => &WORKFLOW_EXECUTION,
            EventCategory::DecisionTask => &DECISION_TASK,
            EventCategory::ActivityTask => &ACTIVITY_TASK,
            EventCategory::ChildWorkflowExecution => &CHILD_WORKFLOW_EXECUTION,
            EventCategory::ExternalWorkflowExecution => &EXTERNAL_WORKFLOW_EXECUTION,
            EventCategory::Timer => &TIMER,
            EventCategory::Marker => &MARKER,
        }
    }

    pub fn category(&self) -> EventCategory {
        self.category
    }

    pub fn initial_state(&self) -> EventState {
        self.initial_state
    }

    pub fn next_states(&self, state: EventState) -> &'static [EventState] {
        self.transitions
            .iter()
            .find(|(from, _)| *from == state)
            .map(|(_, to)| *to)
            .unwrap_or(&[])
    }

    pub fn can_transit(&self, from: EventState, to: EventState) -> bool {
        self.next_states(from).contains(&to)
    }
}

/// An event folded through the lifecycle of its unit of work. Built from the unit's first event
/// and advanced with each later one.
#[derive(Clone, Debug)]
pub struct CompiledEvent {
    event: Event,
    machine: &'static StateMachine,
}

impl CompiledEvent {
    pub fn new(event: Event) -> SwfResult<Self> {
        let machine = StateMachine::of(event.category());
        if event.state() != machine.initial_state() {
            return fmt_err!(
                InconsistentState,
                "{} cannot start a {} lifecycle, expected state '{}'",
                event,
                machine.category(),
                machine.initial_state()
            );
        }
        Ok(Self { event, machine })
    }

    /// Folds a whole sequence; the first event must be the initial one.
    pub fn compile<I>(events: I) -> SwfResult<Self>
    where I: IntoIterator<Item = Event> {
        let mut events = events.into_iter();
        let mut compiled = match events.next() {
            Some(first) => Self::new(first)?,
            None => return str_err!(IllegalArgument, "cannot compile an empty event sequence"),
        };
        for event in events {
            compiled.transit(event)?;
        }
        Ok(compiled)
    }

    pub fn transit(&mut self, event: Event) -> SwfResult<()> {
        if event.category() != self.machine.category() {
            return fmt_err!(
                TransitionError,
                "{} does not belong to a {} lifecycle",
                event,
                self.machine.category()
            );
        }
        if !self.machine.can_transit(self.state(), event.state()) {
            return fmt_err!(
                TransitionError,
                "{}: transition {} -> {} is not allowed",
                self.machine.category(),
                self.state(),
                event.state()
            );
        }
        self.event = event;
        Ok(())
    }

    pub fn state(&self) -> EventState {
        self.event.state()
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn next_states(&self) -> &'static [EventState] {
        self.machine.next_states(self.state())
    }

    pub fn is_terminal(&self) -> bool {
        self.next_states().is_empty()
    }

    /// Groups events into units of work and replays each unit. Events outside any tracked
    /// lifecycle (signals, cancel requests, failed decisions on the service side) are skipped.
    pub fn validate_history(history: &History) -> SwfResult<()> {
        let mut units: HashMap<(EventCategory, i64), CompiledEvent> = HashMap::new();
        for event in history {
            let unit = match unit_of(event) {
                Some(unit) => unit,
                None => continue,
            };
            match units.get_mut(&unit) {
                Some(compiled) => compiled.transit(event.clone())?,
                None => {
                    units.insert(unit, CompiledEvent::new(event.clone())?);
                }
            }
        }
        debug!("history of {} events replayed over {} units", history.len(), units.len());
        Ok(())
    }
}

/// Identifies the unit of work an event belongs to, by the id of the event that opened it.
fn unit_of(event: &Event) -> Option<(EventCategory, i64)> {
    let category = event.category();
    let machine = StateMachine::of(category);
    match category {
        EventCategory::WorkflowExecution => match event.state() {
            Started | Completed | Failed => Some((category, 0)),
            _ => None,
        },
        EventCategory::DecisionTask
        | EventCategory::ActivityTask
        | EventCategory::ChildWorkflowExecution
        | EventCategory::Timer => {
            if event.state() == machine.initial_state() {
                return Some((category, event.id()));
            }
            let tracked = machine
                .transitions
                .iter()
                .any(|(_, to)| to.contains(&event.state()));
            if !tracked {
                return None;
            }
            event
                .attributes()
                .scheduling_event_id()
                .map(|id| (category, id))
        }
        EventCategory::ExternalWorkflowExecution | EventCategory::Marker => None,
    }
}
