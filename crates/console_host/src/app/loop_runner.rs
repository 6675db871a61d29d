use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use console_engine::{ConsoleEngine, OutputKind};
use tracing::{debug, error, info, warn};

use super::bootstrap::HostWiring;
use super::host_commands::{HostCommand, HostCommandQueue};
use super::HostError;

const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);
const SUGGESTION_QUERY_SUFFIX: char = '?';

pub(crate) fn run(app: HostWiring) -> ExitCode {
    let lines = match spawn_stdin_reader() {
        Ok(lines) => lines,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    let mut host = HostLoop::new(app);
    let mut stdin_open = true;
    let mut last_frame_instant = Instant::now();

    loop {
        let frame_start = Instant::now();
        if stdin_open && !host.drain_lines(&lines) {
            stdin_open = false;
            info!("stdin_closed");
        }

        let dt = frame_start.saturating_duration_since(last_frame_instant);
        last_frame_instant = frame_start;
        host.frame(dt);

        if host.should_exit(stdin_open) {
            break;
        }

        let elapsed = Instant::now().saturating_duration_since(frame_start);
        let cap_sleep = compute_cap_sleep(elapsed, target_frame_duration(host.target_fps));
        if cap_sleep > Duration::ZERO {
            thread::sleep(cap_sleep);
        }
    }

    info!(frames = host.frames, "shutdown");
    ExitCode::SUCCESS
}

fn spawn_stdin_reader() -> Result<Receiver<String>, HostError> {
    let (sender, receiver) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if sender.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "stdin_read_failed");
                        break;
                    }
                }
            }
        })
        .map_err(HostError::SpawnReader)?;
    Ok(receiver)
}

/// Per-frame host state around the console engine.
struct HostLoop {
    engine: ConsoleEngine,
    host_commands: HostCommandQueue,
    max_line_chars: usize,
    target_fps: u32,
    paused: bool,
    frames: u64,
}

impl HostLoop {
    fn new(app: HostWiring) -> Self {
        Self {
            engine: app.engine,
            host_commands: app.host_commands,
            max_line_chars: app.max_line_chars,
            target_fps: app.target_fps,
            paused: false,
            frames: 0,
        }
    }

    /// Feeds every line received so far. Returns false once the reader hung up.
    fn drain_lines(&mut self, lines: &Receiver<String>) -> bool {
        loop {
            match lines.try_recv() {
                Ok(line) => self.feed_line(&line),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    /// Submits the line exactly as read. A line ending in `?` lists
    /// completions for the text before it instead, and a line over the
    /// length cap is refused whole.
    fn feed_line(&mut self, line: &str) {
        if let Some(prefix) = line.strip_suffix(SUGGESTION_QUERY_SUFFIX) {
            self.print_suggestions(prefix);
            return;
        }

        let length = line.chars().count();
        if length > self.max_line_chars {
            warn!(length, limit = self.max_line_chars, "input_line_rejected");
            self.engine.print(
                format!(
                    "Input line is {length} characters long (the limit is {})",
                    self.max_line_chars
                ),
                OutputKind::Error,
            );
            return;
        }
        self.engine.submit_line(line);
    }

    fn print_suggestions(&mut self, prefix: &str) {
        let candidates = self.engine.suggestions_for(prefix).to_vec();
        if candidates.is_empty() {
            self.engine
                .print(format!("No suggestions for \"{prefix}\""), OutputKind::Warning);
            return;
        }
        for candidate in candidates {
            self.engine.print(candidate, OutputKind::Information);
        }
    }

    /// Applies queued host commands, then ticks the engine unless paused.
    /// Returns the number of timed-command firings.
    fn frame(&mut self, dt: Duration) -> usize {
        self.apply_host_commands();
        self.frames = self.frames.saturating_add(1);
        if self.paused {
            return 0;
        }
        self.engine.tick(dt.min(MAX_FRAME_DELTA))
    }

    /// Stops on `quit`. Once stdin is gone nothing can stop an endless timed
    /// command, so the loop only stays up while bounded ones finish.
    fn should_exit(&self, stdin_open: bool) -> bool {
        if self.engine.quit_requested() {
            info!("quit_requested");
            return true;
        }
        if stdin_open {
            return false;
        }

        let scheduler = self.engine.scheduler();
        let endless = scheduler
            .iter()
            .filter(|command| command.total_duration() <= 0.0)
            .count();
        if endless > 0 {
            warn!(
                endless,
                armed = scheduler.len(),
                "stdin closed with endless timed commands armed; exiting"
            );
            return true;
        }
        scheduler.is_empty()
    }

    fn apply_host_commands(&mut self) {
        for command in self.host_commands.drain() {
            match command {
                HostCommand::SetTargetFps(fps) => {
                    self.target_fps = fps;
                    debug!(target_fps = fps, "target_fps_changed");
                }
                HostCommand::SetPaused(paused) => {
                    self.paused = paused;
                    debug!(paused, "pause_changed");
                }
            }
        }
    }
}

fn target_frame_duration(target_fps: u32) -> Option<Duration> {
    (target_fps > 0).then(|| Duration::from_secs_f64(1.0 / target_fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}
