use std::collections::VecDeque;

use crate::config::ConsoleConfig;

use super::clock::DebounceTimer;
use super::engine::ConsoleEngine;
use super::output::push_bounded;
use super::suggest::complete_suggestion;

pub const MAX_PENDING_LINES: usize = 64;
pub const DEFAULT_MAX_INPUT_LINE_CHARS: usize = 256;
pub const DEFAULT_DEBOUNCE_SECS: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleKey {
    Tab,
    ArrowUp,
    ArrowDown,
    Enter,
    Backspace,
    Escape,
}

/// Text field state for the console prompt.
///
/// Submitted lines are queued and handed to the engine by
/// [`ConsoleEngine::process_pending_lines`]. Up/Down either walk the history
/// (empty line) or cycle completion candidates, and Tab applies the one shown.
#[derive(Debug)]
pub struct ConsoleInput {
    is_open: bool,
    current_line: String,
    pending_lines: VecDeque<String>,
    max_line_chars: usize,
    showing_history: bool,
    scroll_debounce: DebounceTimer,
    complete_debounce: DebounceTimer,
}

impl Default for ConsoleInput {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_INPUT_LINE_CHARS,
            DEFAULT_DEBOUNCE_SECS,
            DEFAULT_DEBOUNCE_SECS,
        )
    }
}

impl ConsoleInput {
    pub fn new(max_line_chars: usize, scroll_debounce_secs: f64, complete_debounce_secs: f64) -> Self {
        Self {
            is_open: false,
            current_line: String::new(),
            pending_lines: VecDeque::new(),
            max_line_chars,
            showing_history: false,
            scroll_debounce: DebounceTimer::new(scroll_debounce_secs),
            complete_debounce: DebounceTimer::new(complete_debounce_secs),
        }
    }

    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self::new(
            config.max_input_line_chars,
            config.suggestion_scroll_debounce_secs,
            config.suggestion_complete_debounce_secs,
        )
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn toggle_open(&mut self) {
        self.is_open = !self.is_open;
        self.clear_input_line_state();
    }

    pub fn current_line(&self) -> &str {
        &self.current_line
    }

    pub fn is_showing_history(&self) -> bool {
        self.showing_history
    }

    pub fn drain_pending_lines_into(&mut self, out: &mut Vec<String>) {
        out.extend(self.pending_lines.drain(..));
    }

    /// Appends typed text, dropping control characters and anything past
    /// the line cap. Refreshes the suggestions for the new line.
    pub fn append_printable_text(&mut self, text: &str, engine: &mut ConsoleEngine) {
        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            if self.current_line.chars().count() >= self.max_line_chars {
                break;
            }
            self.current_line.push(ch);
        }
        self.on_line_changed(engine);
    }

    pub fn handle_key(&mut self, key: ConsoleKey, engine: &mut ConsoleEngine) {
        if !self.is_open {
            return;
        }

        match key {
            ConsoleKey::Backspace => {
                self.current_line.pop();
                self.on_line_changed(engine);
            }
            ConsoleKey::Enter => self.submit_current_line(engine),
            ConsoleKey::Escape => {
                self.is_open = false;
                self.clear_input_line_state();
            }
            ConsoleKey::Tab => self.complete(engine),
            ConsoleKey::ArrowUp => self.scroll(engine, true),
            ConsoleKey::ArrowDown => self.scroll(engine, false),
        }
    }

    /// Text shown after the caret: the untyped tail of the selected
    /// suggestion, or the whole history entry while the line is empty.
    pub fn ghost_text<'a>(&self, engine: &'a ConsoleEngine) -> Option<&'a str> {
        if self.current_line.is_empty() {
            return if self.showing_history {
                engine.history_suggestion()
            } else {
                None
            };
        }
        engine.suggestions().ghost_text(&self.current_line)
    }

    fn on_line_changed(&mut self, engine: &mut ConsoleEngine) {
        if !self.current_line.is_empty() {
            self.showing_history = false;
            engine.reset_history_cursor();
        }
        engine.suggestions_for(&self.current_line);
    }

    fn scroll(&mut self, engine: &mut ConsoleEngine, backwards: bool) {
        let now = engine.unscaled_seconds();
        if !self.scroll_debounce.is_ready(now) {
            return;
        }

        if self.current_line.is_empty() {
            if engine.history().is_empty() {
                return;
            }
            if backwards {
                engine.history_previous();
            } else {
                engine.history_next();
            }
            self.showing_history = true;
        } else {
            if engine.suggestions().candidates().is_empty() {
                return;
            }
            if backwards {
                engine.select_previous_suggestion();
            } else {
                engine.select_next_suggestion();
            }
        }
        self.scroll_debounce.arm(now);
    }

    fn complete(&mut self, engine: &mut ConsoleEngine) {
        if self.current_line.is_empty() {
            if let Some(entry) = engine.history_suggestion().map(str::to_string) {
                self.current_line = entry;
                self.showing_history = false;
                engine.reset_history_cursor();
                engine.suggestions_for(&self.current_line);
            }
            return;
        }

        let Some(suggestion) = engine
            .current_suggestion(&self.current_line)
            .map(str::to_string)
        else {
            return;
        };

        let now = engine.unscaled_seconds();
        let completed = if self.complete_debounce.is_ready(now) {
            complete_suggestion(&self.current_line, &suggestion)
        } else {
            // Too soon after the last Tab: only the first word.
            complete_suggestion("", &suggestion)
        };
        if completed != suggestion {
            self.complete_debounce.arm(now);
        }
        self.current_line = completed;
        engine.suggestions_for(&self.current_line);
        engine.reset_suggestion_selection();
    }

    fn clear_input_line_state(&mut self) {
        self.current_line.clear();
        self.showing_history = false;
        self.scroll_debounce.reset();
        self.complete_debounce.reset();
    }

    fn submit_current_line(&mut self, engine: &mut ConsoleEngine) {
        let raw_line = std::mem::take(&mut self.current_line);
        push_bounded(&mut self.pending_lines, raw_line, MAX_PENDING_LINES);
        self.clear_input_line_state();
        engine.suggestions_for("");
    }
}
