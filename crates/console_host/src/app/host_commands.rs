use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use console_engine::{
    convert, CommandDescriptor, CommandError, ConsoleEngine, OutputKind, RegistryError,
};
use tracing::warn;

pub(crate) const MAX_TARGET_FPS: u32 = 1000;

static HOST_QUEUE_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_host_queue_lock_poison_once(operation: &'static str) {
    if HOST_QUEUE_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "host command queue lock poisoned; recovered inner value");
    }
}

/// Requests console commands hand to the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HostCommand {
    /// `0` disables the frame cap.
    SetTargetFps(u32),
    SetPaused(bool),
}

#[derive(Clone, Debug, Default)]
pub(crate) struct HostCommandQueue {
    pending: Arc<Mutex<VecDeque<HostCommand>>>,
}

impl HostCommandQueue {
    fn push(&self, command: HostCommand) {
        match self.pending.lock() {
            Ok(mut guard) => guard.push_back(command),
            Err(poisoned) => {
                warn_host_queue_lock_poison_once("push");
                poisoned.into_inner().push_back(command);
            }
        }
    }

    pub(crate) fn drain(&self) -> Vec<HostCommand> {
        match self.pending.lock() {
            Ok(mut guard) => guard.drain(..).collect(),
            Err(poisoned) => {
                warn_host_queue_lock_poison_once("drain");
                poisoned.into_inner().drain(..).collect()
            }
        }
    }
}

pub(crate) fn register_host_commands(
    engine: &mut ConsoleEngine,
    queue: &HostCommandQueue,
) -> Result<(), RegistryError> {
    let fps_queue = queue.clone();
    engine.register(
        CommandDescriptor::unary(
            "set_target_fps",
            "Set the host frame rate cap (0 removes the cap)",
            "set_target_fps <int: fps>",
            move |ctx, raw| {
                let fps = convert::to_int("fps", raw)?;
                let fps = u32::try_from(fps)
                    .ok()
                    .filter(|fps| *fps <= MAX_TARGET_FPS)
                    .ok_or_else(|| CommandError::IncorrectUsage("set_target_fps".to_string()))?;
                fps_queue.push(HostCommand::SetTargetFps(fps));
                ctx.print(
                    format!("Target frame rate is now {fps}"),
                    OutputKind::Explanation,
                );
                Ok(())
            },
        )
        .with_examples(["set_target_fps 30"]),
    )?;

    let pause_queue = queue.clone();
    engine.register(
        CommandDescriptor::unary(
            "pause",
            "Pause or resume the timed commands",
            "pause <bool: paused>",
            move |ctx, raw| {
                let paused = convert::to_bool("paused", raw)?;
                pause_queue.push(HostCommand::SetPaused(paused));
                let text = if paused {
                    "Timed commands paused"
                } else {
                    "Timed commands resumed"
                };
                ctx.print(text, OutputKind::Explanation);
                Ok(())
            },
        )
        .with_examples(["pause true"]),
    )?;
    Ok(())
}
