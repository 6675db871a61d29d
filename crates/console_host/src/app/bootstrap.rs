use std::env;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use console_engine::{ConsoleConfig, ConsoleEngine, OutputLine, OutputSink};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::host_commands::{register_host_commands, HostCommandQueue, MAX_TARGET_FPS};
use super::HostError;

pub(crate) const TARGET_FPS_ENV_VAR: &str = "DEVCONSOLE_TARGET_FPS";
pub(crate) const DEFAULT_TARGET_FPS: u32 = 60;

pub(crate) struct HostWiring {
    pub(crate) engine: ConsoleEngine,
    pub(crate) host_commands: HostCommandQueue,
    /// Longest stdin line submitted; longer ones are refused.
    pub(crate) max_line_chars: usize,
    pub(crate) target_fps: u32,
}

pub(crate) fn build_app() -> Result<HostWiring, HostError> {
    init_tracing();
    info!("=== Dev Console Startup ===");

    let config = ConsoleConfig::load_from_env()?;
    let target_fps = resolve_target_fps(env::var(TARGET_FPS_ENV_VAR));
    let mut wiring = wire(&config, target_fps)?;
    wiring.engine.output_mut().add_sink(Box::new(StdoutSink));

    info!(
        commands = wiring.engine.registry().len(),
        target_fps,
        "console_ready"
    );
    Ok(wiring)
}

/// Engine with built-ins and host commands.
pub(crate) fn wire(config: &ConsoleConfig, target_fps: u32) -> Result<HostWiring, HostError> {
    let mut engine = ConsoleEngine::with_builtins(config)?;
    let host_commands = HostCommandQueue::default();
    register_host_commands(&mut engine, &host_commands)?;

    Ok(HostWiring {
        engine,
        host_commands,
        max_line_chars: config.max_input_line_chars,
        target_fps,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn resolve_target_fps(value: Result<String, env::VarError>) -> u32 {
    match value {
        Ok(raw) => match raw.trim().parse::<u32>() {
            Ok(fps) if fps <= MAX_TARGET_FPS => fps,
            _ => {
                warn!(
                    env_var = TARGET_FPS_ENV_VAR,
                    value = raw.as_str(),
                    "invalid target fps env var value; falling back to default"
                );
                DEFAULT_TARGET_FPS
            }
        },
        Err(env::VarError::NotPresent) => DEFAULT_TARGET_FPS,
        Err(err) => {
            warn!(
                env_var = TARGET_FPS_ENV_VAR,
                error = %err,
                "unable to read target fps env var; falling back to default"
            );
            DEFAULT_TARGET_FPS
        }
    }
}

static STDOUT_WRITE_FAILURE_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_stdout_write_failure_once(error: &io::Error) {
    if STDOUT_WRITE_FAILURE_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(error = %error, "stdout write failed; console output is no longer echoed");
    }
}

/// Echoes every printed line to stdout.
struct StdoutSink;

impl OutputSink for StdoutSink {
    fn on_line(&mut self, line: &OutputLine) {
        let mut stdout = io::stdout().lock();
        if let Err(err) = write_line(&mut stdout, line) {
            warn_stdout_write_failure_once(&err);
        }
    }
}

fn write_line(writer: &mut impl Write, line: &OutputLine) -> io::Result<()> {
    writeln!(writer, "{line}")
}
