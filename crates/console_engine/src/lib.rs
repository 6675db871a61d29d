//! Engine-independent core of an in-game developer console.
//!
//! A [`ConsoleEngine`] owns the command registry, alias table, input history,
//! timed-command scheduler and output log. Hosts feed it submitted lines and
//! call [`ConsoleEngine::tick`] once per frame.

pub mod config;
pub mod console;

pub use config::{ConfigError, ConsoleConfig, CONFIG_ENV_VAR, DEFAULT_ALL_KEYWORD};
pub use console::{
    complete_suggestion, convert, register_builtins, tokenize, AliasError, AliasTable, Clock,
    CommandContext, CommandDescriptor, CommandError, CommandRegistry, CommandResult,
    ConsoleEngine, ConsoleInput, ConsoleKey, DebounceTimer, DispatchError, FrameClock,
    HistoryMode, InputHistory, OutputKind, OutputLine, OutputLog, OutputSink, RegistryError,
    ScheduleError, SubmitOutcome, SuggestionEngine, TimeMode, TimedCommand,
    TimedCommandScheduler, TokenizerRules, WrapperKind, WrapperPair,
};
