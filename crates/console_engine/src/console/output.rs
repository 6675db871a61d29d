use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Local};

pub const DEFAULT_MAX_OUTPUT_LINES: usize = 256;
const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    #[default]
    Information,
    Explanation,
    Highlight,
    Warning,
    Error,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub text: String,
    pub kind: OutputKind,
    pub timestamp: Option<DateTime<Local>>,
}

impl fmt::Display for OutputLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timestamp {
            Some(timestamp) => write!(f, "[{}] {}", timestamp.format(TIMESTAMP_FORMAT), self.text),
            None => f.write_str(&self.text),
        }
    }
}

/// Host-side tee for everything the console prints.
pub trait OutputSink: Send {
    fn on_line(&mut self, line: &OutputLine);

    fn on_clear(&mut self) {}
}

pub struct OutputLog {
    lines: VecDeque<OutputLine>,
    capacity: usize,
    show_timestamps: bool,
    sinks: Vec<Box<dyn OutputSink>>,
}

impl fmt::Debug for OutputLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputLog")
            .field("lines", &self.lines.len())
            .field("capacity", &self.capacity)
            .field("show_timestamps", &self.show_timestamps)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl Default for OutputLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OUTPUT_LINES, false)
    }
}

impl OutputLog {
    pub fn new(capacity: usize, show_timestamps: bool) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: capacity.max(1),
            show_timestamps,
            sinks: Vec::new(),
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn OutputSink>) {
        self.sinks.push(sink);
    }

    pub fn print(&mut self, text: impl Into<String>, kind: OutputKind) {
        let line = OutputLine {
            text: text.into(),
            kind,
            timestamp: self.show_timestamps.then(Local::now),
        };
        for sink in &mut self.sinks {
            sink.on_line(&line);
        }
        push_bounded(&mut self.lines, line, self.capacity);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        for sink in &mut self.sinks {
            sink.on_clear();
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &OutputLine> {
        self.lines.iter()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.text.as_str())
    }

    pub fn last(&self) -> Option<&OutputLine> {
        self.lines.back()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

pub(crate) fn push_bounded<T>(queue: &mut VecDeque<T>, value: T, max_len: usize) {
    if queue.len() >= max_len {
        queue.pop_front();
    }
    queue.push_back(value);
}
