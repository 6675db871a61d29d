mod alias;
mod builtins;
mod clock;
mod command;
pub mod convert;
mod engine;
mod history;
mod input;
mod output;
mod registry;
mod scheduler;
mod suggest;
mod tokenizer;

pub use alias::{AliasEntry, AliasError, AliasTable};
pub use builtins::register_builtins;
pub use clock::{Clock, DebounceTimer, FrameClock, TimeMode};
pub use command::{CommandAction, CommandDescriptor, CommandError, CommandResult, DispatchError};
pub use engine::{CommandContext, ConsoleEngine, ConsoleState, SubmitOutcome};
pub use history::{clamp_cursor, closest_at, HistoryMode, InputHistory, DEFAULT_MAX_HISTORY_LINES};
pub use input::{
    ConsoleInput, ConsoleKey, DEFAULT_DEBOUNCE_SECS, DEFAULT_MAX_INPUT_LINE_CHARS,
    MAX_PENDING_LINES,
};
pub use output::{OutputKind, OutputLine, OutputLog, OutputSink, DEFAULT_MAX_OUTPUT_LINES};
pub use registry::{CommandRegistry, RegistryError};
pub use scheduler::{ScheduleError, TimedAction, TimedCommand, TimedCommandScheduler, TimedFiring};
pub use suggest::{complete_suggestion, SuggestionEngine};
pub use tokenizer::{
    first_word, strip_quotes, strip_wrappers, tokenize, TokenizerRules, WrapperKind, WrapperPair,
    DEFAULT_QUOTE_CHARS, DEFAULT_WRAPPER_PAIRS,
};
