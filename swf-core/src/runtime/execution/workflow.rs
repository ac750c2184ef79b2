use swf_common::prelude::*;
use swf_common::TextUtils;

use super::{SignalDefinition, SignalExecution, StepExecution, WorkflowBuilder};
use crate::config::DeciderProperties;
use crate::model::{
    Context, Decision, Event, EventCategory, EventState, History, WorkflowStatus,
};
use crate::runtime::step::{DecisionRound, StepDefinition};

/// User code run around an execution. It receives a copy of the context and returns the context
/// to continue with.
pub type Hook = Arc<dyn Fn(Context) -> anyhow::Result<Context> + Send + Sync>;

/// Result of one decision round: what to send back, and the context to store with it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeciderOutcome {
    pub decisions: Vec<Decision>,
    pub context: Context,
}

impl DeciderOutcome {
    pub fn new(decisions: Vec<Decision>, context: Context) -> Self {
        Self { decisions, context }
    }
}

enum Dispatch<'a> {
    Step(StepExecution<'a>),
    Signal(SignalExecution<'a>),
    Ignored,
}

/// A workflow type: an ordered list of steps plus the signals it reacts to. `decide` is a pure
/// function of the history; everything it needs between rounds lives in the returned context.
pub struct Workflow {
    pub(super) name: InlineStr,
    pub(super) version: InlineStr,
    pub(super) task_list: InlineStr,
    pub(super) output: Vec<InlineStr>,
    pub(super) steps: Vec<Box<dyn StepDefinition>>,
    pub(super) signals: Vec<SignalDefinition>,
    pub(super) setup: Option<Hook>,
    pub(super) teardown: Option<Hook>,
    pub(super) properties: DeciderProperties,
    pub(super) log_prefix: String,
}

impl Workflow {
    pub fn builder(name: impl Into<InlineStr>, version: impl Into<InlineStr>) -> WorkflowBuilder {
        WorkflowBuilder::new(name, version)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn task_list(&self) -> &str {
        &self.task_list
    }

    pub fn output(&self) -> &[InlineStr] {
        &self.output
    }

    pub fn steps(&self) -> &[Box<dyn StepDefinition>] {
        &self.steps
    }

    pub fn signals(&self) -> &[SignalDefinition] {
        &self.signals
    }

    pub fn signal(&self, name: &str) -> Option<&SignalDefinition> {
        self.signals.iter().find(|x| x.name() == name)
    }

    pub fn properties(&self) -> &DeciderProperties {
        &self.properties
    }

    /// Declared step or signal target with the given number.
    pub fn step(&self, number: usize) -> SwfResult<&dyn StepDefinition> {
        if let Some(step) = self.steps.get(number) {
            return Ok(step.as_ref());
        }
        match self
            .signals
            .iter()
            .map(|x| x.target())
            .find(|x| x.number() == number)
        {
            Some(target) => Ok(target),
            None => fmt_err!(NotFound, "workflow {} has no step #{}", self.name, number),
        }
    }

    /// Answers one decision task. Any error other than an unsupported event becomes a
    /// `FailWorkflowExecution` decision.
    pub fn decide(&self, history: &History) -> SwfResult<DeciderOutcome> {
        if self.properties.is_strict_replay() {
            history.validate()?;
        }

        let mut round = DecisionRound::new(history, &self.properties, self.round_seed(history));
        let mut context = Context::new();
        let decisions = match self.decide_(&mut round, &mut context) {
            Ok(decisions) => decisions,
            Err(e) if e.is(ErrorCode::un_implement_code()) => {
                error!("{} {}", self.log_prefix, e.display_text());
                return Err(e);
            }
            Err(e) => {
                error!("{} cannot decide: {}", self.log_prefix, e.message());
                self.fail(e.display_text(), format!("{:?}", e), &mut context)
            }
        };

        debug!(
            "{} {} decision(s): {:?}",
            self.log_prefix,
            decisions.len(),
            decisions.iter().map(|x| x.decision_type()).collect::<Vec<_>>()
        );
        Ok(DeciderOutcome::new(decisions, context))
    }

    fn decide_(&self, round: &mut DecisionRound, context: &mut Context) -> SwfResult<Vec<Decision>> {
        let history = round.history();
        let mut decisions = Vec::new();
        match history.last_decision() {
            None => {
                decisions = self.handle_initialization(round, context)?;
                if let Some(failure) = decisions.iter().find(|x| x.is_failure()) {
                    return Ok(vec![failure.clone()]);
                }
            }
            Some(last) => {
                *context = Context::decode(last.attributes().execution_context())?;
            }
        }

        for event in history.events_since_last_decision() {
            let mut these = self.handle_event(event, round, context)?;
            if let Some(pos) = these.iter().position(|x| x.is_failure()) {
                return Ok(vec![these.swap_remove(pos)]);
            }
            decisions.append(&mut these);
        }
        Ok(decisions)
    }

    fn handle_initialization(
        &self,
        round: &mut DecisionRound,
        context: &mut Context,
    ) -> SwfResult<Vec<Decision>> {
        let started = match round.history().first() {
            Some(event) if event.is(EventCategory::WorkflowExecution, EventState::Started) => event,
            Some(event) => {
                return fmt_err!(
                    IllegalArgument,
                    "history starts with {} instead of WorkflowExecutionStarted",
                    event
                );
            }
            None => return str_err!(IllegalArgument, "history is empty"),
        };

        *context = Self::parse_input(started.attributes().input())?;
        if let Some(setup) = &self.setup {
            *context = setup(context.clone()).map_err(|err| {
                error!("{} setup failed: {}", self.log_prefix, err);
                ErrorCode::from(err)
            })?;
        }
        if let Some(tags) = started.attributes().tag_list() {
            let tags = tags.iter().map(Object::from).collect::<Vec<_>>();
            context.insert(Context::WORKFLOW_TAG_LIST_KEY, tags);
        }
        context.init();

        info!("{} starting with {} step(s)", self.log_prefix, self.steps.len());
        self.enter_step(0, round, context)
    }

    fn parse_input(input: Option<&str>) -> SwfResult<Context> {
        let text = match input {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Ok(Context::new()),
        };
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Object(map)) => {
                Ok(Context::from(Object::convert_jsonmap_to_hashmap(&map)))
            }
            Ok(serde_json::Value::Null) => Ok(Context::new()),
            Ok(other) => fmt_err!(
                InvalidWorkflowInput,
                "workflow input must be a mapping, got {}",
                other
            ),
            Err(e) => fmt_err!(InvalidWorkflowInput, "workflow input is not JSON: {}", e),
        }
    }

    fn dispatch<'a>(&'a self, event: &'a Event, history: &'a History) -> SwfResult<Dispatch<'a>> {
        match event.category() {
            EventCategory::ActivityTask | EventCategory::ChildWorkflowExecution => {
                Ok(Dispatch::Step(StepExecution::new(event, history)?))
            }
            EventCategory::WorkflowExecution if event.state() == EventState::Signaled => {
                let name = event.attributes().signal_name().unwrap_or_default();
                match self.signal(name) {
                    Some(definition) => Ok(Dispatch::Signal(SignalExecution::new(definition, event))),
                    None => fmt_err!(
                        UnsupportedSignal,
                        "signal '{}' is not supported by workflow {}",
                        name,
                        self.name
                    ),
                }
            }
            EventCategory::WorkflowExecution => Ok(Dispatch::Ignored),
            _ => fmt_err!(UnImplement, "event {} is not supported", event),
        }
    }

    fn handle_event(
        &self,
        event: &Event,
        round: &mut DecisionRound,
        context: &mut Context,
    ) -> SwfResult<Vec<Decision>> {
        trace!("{} handling {}", self.log_prefix, event);
        match self.dispatch(event, round.history())? {
            Dispatch::Step(execution) => match execution.state() {
                EventState::Completed => self.handle_step_completed(execution, round, context),
                EventState::Failed => {
                    let reason = format!(
                        "error in {} '{}': {}",
                        execution.kind(),
                        execution.scheduled_as(),
                        execution.reason().unwrap_or_default()
                    );
                    let details = execution.details().unwrap_or_default().to_string();
                    self.handle_step_failure(execution, reason, details, round, context)
                }
                EventState::TimedOut => {
                    let timeout_type = execution.timeout_type().unwrap_or("UNKNOWN");
                    error!(
                        "{} {} '{}' timed out: {} after {}",
                        self.log_prefix,
                        execution.kind(),
                        execution.scheduled_as(),
                        timeout_type,
                        execution.configured_timeout().unwrap_or("?")
                    );
                    let reason = format!(
                        "{} '{}' timed out",
                        execution.kind(),
                        execution.scheduled_as()
                    );
                    let details = timeout_type.to_ascii_lowercase();
                    self.handle_step_failure(execution, reason, details, round, context)
                }
                _ => Ok(vec![]),
            },
            Dispatch::Signal(signal) => {
                let target = signal.definition().target();
                info!(
                    "{} signal '{}' received, scheduling {}#{}",
                    self.log_prefix,
                    signal.definition().name(),
                    target.name(),
                    target.number()
                );
                signal.trigger(round, context)
            }
            Dispatch::Ignored => Ok(vec![]),
        }
    }

    fn handle_step_completed(
        &self,
        execution: StepExecution,
        round: &mut DecisionRound,
        context: &mut Context,
    ) -> SwfResult<Vec<Decision>> {
        let number = execution.number()?;
        let current = context.current_step()?;
        self.merge_result(&execution, number, current, context);

        if !context.ongoing_steps()?.contains(&number) {
            debug!(
                "{} {} '{}'#{} completed, step is not ongoing",
                self.log_prefix,
                execution.kind(),
                execution.scheduled_as(),
                number
            );
            return Ok(vec![]);
        }

        if let Some(partition) = execution.partition_id()? {
            if let Some(group) = self.step(number)?.as_group() {
                let progress = group.progress(round, context)?;
                debug!(
                    "{} partition {} of step {}#{} completed: {} done, {} in flight, {} left",
                    self.log_prefix,
                    partition.canonical(),
                    group.name(),
                    number,
                    progress.completed,
                    progress.in_flight,
                    progress.remaining.len()
                );
                if !progress.remaining.is_empty() {
                    return group.schedule(round, context, None);
                }
                if progress.in_flight > 0 {
                    return Ok(vec![]);
                }
            }
        }

        context.remove_ongoing_step(number)?;
        if number != current {
            return Ok(vec![]);
        }
        info!("{} step {}#{} completed", self.log_prefix, self.step(number)?.name(), number);
        self.schedule_next_step(current, round, context)
    }

    /// Result objects are merged into the context, restricted to the step's output keys when it
    /// declares some. Anything else is kept verbatim under `_unknown_result@{current step}`.
    fn merge_result(
        &self,
        execution: &StepExecution,
        number: usize,
        current: usize,
        context: &mut Context,
    ) {
        let result = match execution.result() {
            Some(result) if !result.trim().is_empty() => result,
            _ => return,
        };
        match serde_json::from_str::<serde_json::Value>(result) {
            Ok(serde_json::Value::Object(map)) => {
                let mut values = Object::convert_jsonmap_to_hashmap(&map);
                if let Ok(step) = self.step(number) {
                    if !step.output().is_empty() {
                        values.retain(|k, _| step.output().contains(k));
                    }
                }
                context.merge_unreserved(values);
            }
            _ => {
                context.insert(format!("_unknown_result@{}", current), result);
            }
        }
    }

    fn handle_step_failure(
        &self,
        execution: StepExecution,
        reason: String,
        details: String,
        round: &mut DecisionRound,
        context: &mut Context,
    ) -> SwfResult<Vec<Decision>> {
        let number = execution.number()?;
        if number != context.current_step()? {
            warn!("{} ignoring failure of step #{}: {}", self.log_prefix, number, reason);
            return Ok(vec![]);
        }

        let mut control = execution.control()?;
        let retry = control.retry.unwrap_or(0);
        if retry == 0 {
            error!("{} {}, no retry left", self.log_prefix, reason);
            return Ok(self.fail(reason, details, context));
        }

        control.retry = Some(retry - 1);
        warn!(
            "{} {}, retrying ({} retry left)",
            self.log_prefix,
            reason,
            retry - 1
        );
        let step = self.step(number)?;
        match (step.as_group(), control.partition.clone()) {
            (Some(group), Some(partition)) => {
                group.schedule_partition(round, &partition, context, Some(control))
            }
            _ => step.schedule(round, context, Some(control)),
        }
    }

    /// Schedules step `number`, moving past fan-out steps with no partition to run. Past the last
    /// step, the workflow completes.
    fn enter_step(
        &self,
        number: usize,
        round: &mut DecisionRound,
        context: &mut Context,
    ) -> SwfResult<Vec<Decision>> {
        let mut number = number;
        loop {
            context.set_current_step(number);
            let step = match self.steps.get(number) {
                Some(step) => step,
                None => return self.terminate(context),
            };

            let decisions = step.schedule(round, context, None)?;
            if decisions.is_empty() {
                if let Some(group) = step.as_group() {
                    if group.progress(round, context)?.is_finished() {
                        info!(
                            "{} step {}#{} has no partition to run",
                            self.log_prefix,
                            step.name(),
                            number
                        );
                        number += 1;
                        continue;
                    }
                }
            }

            debug!("{} step {}#{} scheduled", self.log_prefix, step.name(), number);
            context.push_ongoing_step(number)?;
            return Ok(decisions);
        }
    }

    fn schedule_next_step(
        &self,
        current: usize,
        round: &mut DecisionRound,
        context: &mut Context,
    ) -> SwfResult<Vec<Decision>> {
        match self.enter_step(current + 1, round, context) {
            Err(e) if e.is(ErrorCode::missing_context_variable_code()) => {
                error!("{} {}", self.log_prefix, e.display_text());
                Ok(self.fail(e.display_text(), "", context))
            }
            other => other,
        }
    }

    fn terminate(&self, context: &mut Context) -> SwfResult<Vec<Decision>> {
        let result = if self.output.is_empty() {
            context.unreserved()
        } else {
            let mut result = HashMap::with_capacity(self.output.len());
            for key in &self.output {
                match context.get(key) {
                    Some(value) => {
                        result.insert(key.clone(), value.clone());
                    }
                    None => {
                        return fmt_err!(
                            MissingContextVariable,
                            "variable '{}' is missing in context",
                            key
                        );
                    }
                }
            }
            result
        };
        let result = Object::convert_hashmap_to_json(&result).to_string();

        context.set_status(WorkflowStatus::Completed);
        if let Some(teardown) = &self.teardown {
            match teardown(context.clone()) {
                Ok(finished) => *context = finished,
                Err(err) => {
                    error!("{} teardown failed: {}", self.log_prefix, err);
                    context.insert(Context::ERROR_KEY, err.to_string());
                }
            }
        }

        info!("{} completed", self.log_prefix);
        Ok(vec![Decision::complete(result)])
    }

    /// Fail decision with the reason cut to the configured length. Teardown runs best-effort.
    fn fail(
        &self,
        reason: impl Into<String>,
        details: impl Into<String>,
        context: &mut Context,
    ) -> Vec<Decision> {
        let (reason, details) = (reason.into(), details.into());
        context.set_status(WorkflowStatus::Failed);
        context.insert(Context::REASON_KEY, reason.as_str());
        context.insert(Context::DETAILS_KEY, details.as_str());

        if let Some(teardown) = &self.teardown {
            if let Err(err) = teardown(context.clone()) {
                error!("{} teardown failed: {}", self.log_prefix, err);
                context.insert(Context::ERROR_KEY, err.to_string());
            }
        }

        warn!("{} failed: {}", self.log_prefix, reason);
        let reason = TextUtils::truncate(&reason, self.properties.reason_max_length());
        vec![Decision::fail(reason, details)]
    }

    /// Seed of the ids generated in a round. It changes with every decision task of an execution
    /// and differs between executions started at different times or with different input.
    fn round_seed(&self, history: &History) -> String {
        let (started_at, input) = history
            .first()
            .map(|x| (x.timestamp(), x.attributes().input().unwrap_or_default()))
            .unwrap_or((0.0, ""));
        let (last_id, last_at) = history
            .last()
            .map(|x| (x.id(), x.timestamp()))
            .unwrap_or((0, 0.0));
        format!(
            "{}/{}/{}/{}/{}/{}",
            self.name, self.version, started_at, input, last_id, last_at
        )
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("task_list", &self.task_list)
            .field("output", &self.output)
            .field("steps", &self.steps)
            .field("signals", &self.signals)
            .field("setup", &self.setup.is_some())
            .field("teardown", &self.teardown.is_some())
            .field("properties", &self.properties)
            .finish()
    }
}
