use std::time::Duration;

use rand::rngs::SmallRng;
use tracing::{debug, info, warn};

use crate::config::ConsoleConfig;

use super::alias::AliasTable;
use super::builtins::register_builtins;
use super::clock::{Clock, FrameClock, TimeMode};
use super::command::{CommandDescriptor, DispatchError};
use super::history::InputHistory;
use super::input::ConsoleInput;
use super::output::{OutputKind, OutputLog};
use super::registry::{CommandRegistry, RegistryError};
use super::scheduler::TimedCommandScheduler;
use super::suggest::{seeded_rng, SuggestionEngine};
use super::tokenizer::{tokenize, TokenizerRules};

/// Everything a command body may touch besides the registry.
#[derive(Debug)]
pub struct ConsoleState {
    output: OutputLog,
    aliases: AliasTable,
    history: InputHistory,
    scheduler: TimedCommandScheduler,
    clock: Box<dyn Clock>,
    rules: TokenizerRules,
    all_keyword: String,
    quit_requested: bool,
    rng: SmallRng,
}

impl ConsoleState {
    fn from_config(config: &ConsoleConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            output: OutputLog::new(config.max_output_lines, config.show_timestamps),
            aliases: AliasTable::new(),
            history: InputHistory::new(config.history_mode, config.max_history_lines),
            scheduler: TimedCommandScheduler::new(config.timed_command_time_mode),
            clock,
            rules: config.tokenizer_rules(),
            all_keyword: config.all_keyword.clone(),
            quit_requested: false,
            rng: seeded_rng(config.suggestion_seed),
        }
    }
}

/// Handle given to a running command body.
///
/// The registry is shared read-only so a body can look up other commands
/// while its own descriptor is borrowed from the same registry.
pub struct CommandContext<'a> {
    registry: &'a CommandRegistry,
    state: &'a mut ConsoleState,
}

impl<'a> CommandContext<'a> {
    pub fn registry(&self) -> &'a CommandRegistry {
        self.registry
    }

    pub fn print(&mut self, text: impl Into<String>, kind: OutputKind) {
        self.state.output.print(text, kind);
    }

    pub fn clear_output(&mut self) {
        self.state.output.clear();
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.state.aliases
    }

    pub fn aliases_mut(&mut self) -> &mut AliasTable {
        &mut self.state.aliases
    }

    pub fn scheduler(&self) -> &TimedCommandScheduler {
        &self.state.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut TimedCommandScheduler {
        &mut self.state.scheduler
    }

    pub fn clock(&self) -> &dyn Clock {
        self.state.clock.as_ref()
    }

    pub fn clock_mut(&mut self) -> &mut dyn Clock {
        self.state.clock.as_mut()
    }

    pub fn history(&self) -> &InputHistory {
        &self.state.history
    }

    pub fn tokenizer_rules(&self) -> &TokenizerRules {
        &self.state.rules
    }

    /// Keyword that makes `stop_timed` and `remove_alias` act on everything.
    pub fn is_all_keyword(&self, value: &str) -> bool {
        value.eq_ignore_ascii_case(&self.state.all_keyword)
    }

    pub fn request_quit(&mut self) {
        self.state.quit_requested = true;
    }

    /// Random source for commands that pick among alternatives.
    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.state.rng
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank line or a line that tokenized to nothing.
    Ignored,
    Dispatched,
    /// The error was already printed to the output log.
    Failed(DispatchError),
}

#[derive(Debug)]
pub struct ConsoleEngine {
    registry: CommandRegistry,
    state: ConsoleState,
    suggestions: SuggestionEngine,
}

impl Default for ConsoleEngine {
    fn default() -> Self {
        Self::new(&ConsoleConfig::default())
    }
}

impl ConsoleEngine {
    /// Engine with an empty registry driven by a [`FrameClock`].
    pub fn new(config: &ConsoleConfig) -> Self {
        Self::with_clock(config, Box::new(FrameClock::new()))
    }

    pub fn with_clock(config: &ConsoleConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            registry: CommandRegistry::new(),
            state: ConsoleState::from_config(config, clock),
            suggestions: SuggestionEngine::new(config.suggestion_seed),
        }
    }

    /// Engine preloaded with the built-in console commands.
    pub fn with_builtins(config: &ConsoleConfig) -> Result<Self, RegistryError> {
        let mut engine = Self::new(config);
        register_builtins(&mut engine.registry)?;
        Ok(engine)
    }

    pub fn register(&mut self, descriptor: CommandDescriptor) -> Result<(), RegistryError> {
        let id = descriptor.id().to_string();
        self.registry.register(descriptor)?;
        debug!(command = %id, "command_registered");
        Ok(())
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn output(&self) -> &OutputLog {
        &self.state.output
    }

    pub fn output_mut(&mut self) -> &mut OutputLog {
        &mut self.state.output
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.state.aliases
    }

    pub fn history(&self) -> &InputHistory {
        &self.state.history
    }

    pub fn scheduler(&self) -> &TimedCommandScheduler {
        &self.state.scheduler
    }

    pub fn clock(&self) -> &dyn Clock {
        self.state.clock.as_ref()
    }

    pub fn tokenizer_rules(&self) -> &TokenizerRules {
        &self.state.rules
    }

    pub fn suggestions(&self) -> &SuggestionEngine {
        &self.suggestions
    }

    pub fn quit_requested(&self) -> bool {
        self.state.quit_requested
    }

    pub fn print(&mut self, text: impl Into<String>, kind: OutputKind) {
        self.state.output.print(text, kind);
    }

    /// Runs `f` with the same context command bodies receive.
    pub fn with_context<R>(&mut self, f: impl FnOnce(&mut CommandContext<'_>) -> R) -> R {
        let mut ctx = CommandContext {
            registry: &self.registry,
            state: &mut self.state,
        };
        f(&mut ctx)
    }

    /// Looks up `tokens[0]` and invokes it with the remaining tokens.
    pub fn dispatch(&mut self, tokens: &[String]) -> Result<(), DispatchError> {
        let Some((id, args)) = tokens.split_first() else {
            return Err(DispatchError::EmptyInput);
        };
        let Some(descriptor) = self.registry.find_by_id(id) else {
            return Err(DispatchError::UnknownCommand(tokens.join(" ")));
        };

        let mut ctx = CommandContext {
            registry: &self.registry,
            state: &mut self.state,
        };
        descriptor.invoke(&mut ctx, args)
    }

    /// One submitted line: history, echo, alias expansion, tokenize, dispatch.
    pub fn submit_line(&mut self, raw_line: &str) -> SubmitOutcome {
        let line = raw_line.trim();
        if line.is_empty() {
            return SubmitOutcome::Ignored;
        }

        self.state.history.record(line);
        self.suggestions.reset_history_cursor(&self.state.history);
        self.state
            .output
            .print(format!(">> {line}"), OutputKind::Information);

        let expanded = self.state.aliases.expand(line).into_owned();
        let tokens = tokenize(&expanded, &self.state.rules);
        if tokens.is_empty() {
            return SubmitOutcome::Ignored;
        }

        match self.dispatch(&tokens) {
            Ok(()) => {
                debug!(command = %tokens[0], args = tokens.len() - 1, "command_dispatched");
                SubmitOutcome::Dispatched
            }
            Err(error) => {
                match &error {
                    DispatchError::UnknownCommand(input) => {
                        info!(input = %input, "command_unknown");
                    }
                    DispatchError::WrongArity {
                        id,
                        expected,
                        actual,
                    } => {
                        info!(command = %id, expected, actual, "command_wrong_arity");
                    }
                    other => {
                        info!(command = %tokens[0], error = %other, "command_failed");
                    }
                }
                self.state
                    .output
                    .print(error.to_string(), OutputKind::Error);
                SubmitOutcome::Failed(error)
            }
        }
    }

    /// Submits every line the input queued since the last call.
    pub fn process_pending_lines(&mut self, input: &mut ConsoleInput) -> usize {
        let mut lines = Vec::new();
        input.drain_pending_lines_into(&mut lines);

        for raw_line in &lines {
            self.submit_line(raw_line);
        }
        lines.len()
    }

    /// Advances the clock by one host frame and runs the timed commands that
    /// are due. A firing whose command was stopped by an earlier firing of
    /// the same frame is dropped. Returns the number of firings that ran.
    pub fn tick(&mut self, real_dt: Duration) -> usize {
        self.state.clock.advance(real_dt);
        let now = self.state.clock.seconds(self.state.scheduler.time_mode());
        let firings = self.state.scheduler.step(now);

        let mut invoked = 0;
        for firing in &firings {
            if self.state.scheduler.was_stopped_since_step(firing.target.id()) {
                debug!(command = firing.target.id(), "timed_firing_skipped");
                continue;
            }
            invoked += 1;
            let mut ctx = CommandContext {
                registry: &self.registry,
                state: &mut self.state,
            };
            match firing.target.invoke(&mut ctx, &firing.arguments) {
                Ok(()) => {
                    debug!(command = firing.target.id(), "timed_command_fired");
                    self.state.output.print(
                        format!("Timed command {} was just invoked", firing.target.id()),
                        OutputKind::Highlight,
                    );
                }
                Err(error) => {
                    warn!(command = firing.target.id(), error = %error, "timed_command_failed");
                    self.state
                        .output
                        .print(error.to_string(), OutputKind::Error);
                }
            }
        }
        invoked
    }

    /// Refreshes the completion candidates for `input`.
    pub fn suggestions_for(&mut self, input: &str) -> &[String] {
        self.suggestions
            .suggestions_for(input, &self.registry, &self.state.aliases)
    }

    pub fn select_next_suggestion(&mut self) {
        self.suggestions.select_next();
    }

    pub fn select_previous_suggestion(&mut self) {
        self.suggestions.select_previous();
    }

    pub fn current_suggestion(&self, input: &str) -> Option<&str> {
        self.suggestions.current(input)
    }

    pub fn history_previous(&mut self) -> Option<String> {
        self.suggestions.history_previous(&self.state.history)
    }

    pub fn history_next(&mut self) -> Option<String> {
        self.suggestions.history_next(&self.state.history)
    }

    pub fn history_suggestion(&self) -> Option<&str> {
        self.suggestions.history_suggestion(&self.state.history)
    }

    pub fn reset_history_cursor(&mut self) {
        self.suggestions.reset_history_cursor(&self.state.history);
    }

    pub fn reset_suggestion_selection(&mut self) {
        self.suggestions.reset_selection();
    }

    /// Reading of the clock used for UI debouncing.
    pub fn unscaled_seconds(&self) -> f64 {
        self.state.clock.seconds(TimeMode::Unscaled)
    }
}
