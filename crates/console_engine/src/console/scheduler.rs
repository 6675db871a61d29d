use std::sync::Arc;

use chrono::{DateTime, Local, TimeDelta};
use thiserror::Error;
use tracing::debug;

use super::clock::TimeMode;
use super::command::CommandDescriptor;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("{field} must be greater than or equal to 0 (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("command \"{id}\" takes {expected} argument(s) but {actual} were bound")]
    ArgumentCount {
        id: String,
        expected: usize,
        actual: usize,
    },
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, ScheduleError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ScheduleError::Negative { field, value })
    }
}

/// Interval trigger polled once per frame.
///
/// The first poll captures the time baseline. The action is due whenever the
/// elapsed time reaches the next call time, which starts at `start_delay` and
/// advances by `interval` on every firing, so at most one firing happens per
/// poll. Once `disable_after` is non-zero and has elapsed the trigger disables
/// itself, possibly in the same poll it fired in.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedAction {
    interval: f64,
    start_delay: f64,
    disable_after: f64,
    baseline: Option<f64>,
    next_call: f64,
    started: bool,
    disabled: bool,
}

impl TimedAction {
    pub fn new(interval: f64, start_delay: f64, disable_after: f64) -> Result<Self, ScheduleError> {
        Ok(Self {
            interval: non_negative("interval", interval)?,
            start_delay: non_negative("start delay", start_delay)?,
            disable_after: non_negative("duration", disable_after)?,
            baseline: None,
            next_call: start_delay,
            started: false,
            disabled: false,
        })
    }

    /// Returns true when the action is due in this poll.
    pub fn poll(&mut self, now: f64) -> bool {
        if self.disabled {
            return false;
        }

        let baseline = *self.baseline.get_or_insert(now);
        let elapsed = now - baseline;

        let fired = elapsed >= self.next_call;
        if fired {
            self.started = true;
            self.next_call += self.interval;
        }

        if self.disable_after > 0.0 && elapsed >= self.disable_after {
            self.disable();
        }
        fired
    }

    pub fn enable(&mut self) {
        self.disabled = false;
    }

    pub fn disable(&mut self) {
        if self.disabled {
            return;
        }
        self.disabled = true;
        self.started = false;
        self.baseline = None;
        self.next_call = self.start_delay;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn disable_after(&self) -> f64 {
        self.disable_after
    }
}

#[derive(Debug, Clone)]
pub struct TimedCommand {
    target: Arc<CommandDescriptor>,
    bound_arguments: Vec<String>,
    created_at: DateTime<Local>,
    action: TimedAction,
}

impl TimedCommand {
    pub fn new(
        target: Arc<CommandDescriptor>,
        interval: f64,
        total_duration: f64,
        bound_arguments: Vec<String>,
        start_delay: f64,
    ) -> Result<Self, ScheduleError> {
        if bound_arguments.len() != target.arity() {
            return Err(ScheduleError::ArgumentCount {
                id: target.id().to_string(),
                expected: target.arity(),
                actual: bound_arguments.len(),
            });
        }

        Ok(Self {
            action: TimedAction::new(interval, start_delay, total_duration)?,
            target,
            bound_arguments,
            created_at: Local::now(),
        })
    }

    pub fn id(&self) -> &str {
        self.target.id()
    }

    pub fn target(&self) -> &Arc<CommandDescriptor> {
        &self.target
    }

    pub fn bound_arguments(&self) -> &[String] {
        &self.bound_arguments
    }

    pub fn interval(&self) -> f64 {
        self.action.interval()
    }

    pub fn total_duration(&self) -> f64 {
        self.action.disable_after()
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// Wall time the command disables itself, `None` when it runs until stopped.
    pub fn ends_at(&self) -> Option<DateTime<Local>> {
        let total = self.total_duration();
        if total <= 0.0 {
            return None;
        }
        let delta = TimeDelta::try_milliseconds((total * 1000.0).round() as i64)?;
        self.created_at.checked_add_signed(delta)
    }

    pub fn action(&self) -> &TimedAction {
        &self.action
    }
}

/// A due invocation handed back to the engine by [`TimedCommandScheduler::step`].
#[derive(Debug, Clone)]
pub struct TimedFiring {
    pub target: Arc<CommandDescriptor>,
    pub arguments: Vec<String>,
}

#[derive(Debug, Default)]
pub struct TimedCommandScheduler {
    armed: Vec<TimedCommand>,
    /// Ids stopped since the last `step`, whose pending firings are void.
    stopped: Vec<String>,
    time_mode: TimeMode,
}

impl TimedCommandScheduler {
    pub fn new(time_mode: TimeMode) -> Self {
        Self {
            armed: Vec::new(),
            stopped: Vec::new(),
            time_mode,
        }
    }

    pub fn time_mode(&self) -> TimeMode {
        self.time_mode
    }

    /// At most one armed command per target id. Returns false for a duplicate.
    pub fn arm(&mut self, command: TimedCommand) -> bool {
        if self.is_armed(command.id()) {
            return false;
        }
        debug!(command = command.id(), interval = command.interval(), "timed_command_armed");
        self.armed.push(command);
        true
    }

    pub fn is_armed(&self, id: &str) -> bool {
        self.armed.iter().any(|command| command.id() == id)
    }

    pub fn stop(&mut self, id: &str) -> bool {
        let before = self.armed.len();
        self.armed.retain(|command| command.id() != id);
        let removed = self.armed.len() != before;
        if removed {
            self.stopped.push(id.to_string());
        }
        removed
    }

    pub fn stop_all(&mut self) -> usize {
        let stopped = self.armed.len();
        self.stopped
            .extend(self.armed.drain(..).map(|command| command.id().to_string()));
        stopped
    }

    /// True when `id` was stopped after the last `step` returned its firings.
    pub fn was_stopped_since_step(&self, id: &str) -> bool {
        self.stopped.iter().any(|stopped| stopped == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedCommand> {
        self.armed.iter()
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    /// Polls every armed command at `now`, drops the ones that disabled
    /// themselves, and returns the invocations that are due.
    pub fn step(&mut self, now: f64) -> Vec<TimedFiring> {
        self.stopped.clear();
        let mut firings = Vec::new();
        for command in &mut self.armed {
            if command.action.poll(now) {
                firings.push(TimedFiring {
                    target: command.target.clone(),
                    arguments: command.bound_arguments.clone(),
                });
            }
        }

        self.armed.retain(|command| {
            let keep = !command.action.is_disabled();
            if !keep {
                debug!(command = command.id(), "timed_command_expired");
            }
            keep
        });
        firings
    }
}
