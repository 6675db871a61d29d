use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Which timeline a reading is taken from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    /// Frame time multiplied by the time scale.
    #[default]
    Scaled,
    /// Frame time ignoring the time scale.
    Unscaled,
    /// Monotonic wall time since the clock was created.
    Realtime,
    /// Number of frames advanced, as a float.
    Frames,
}

pub trait Clock: Send + fmt::Debug {
    fn seconds(&self, mode: TimeMode) -> f64;

    /// Called once per host frame with the real frame delta.
    fn advance(&mut self, real_dt: Duration);

    fn time_scale(&self) -> f64;

    /// Rejects negative and non-finite scales.
    fn set_time_scale(&mut self, scale: f64) -> bool;
}

#[derive(Debug, Clone)]
pub struct FrameClock {
    started: Instant,
    scaled: f64,
    unscaled: f64,
    frames: u64,
    time_scale: f64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            scaled: 0.0,
            unscaled: 0.0,
            frames: 0,
            time_scale: 1.0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Clock for FrameClock {
    fn seconds(&self, mode: TimeMode) -> f64 {
        match mode {
            TimeMode::Scaled => self.scaled,
            TimeMode::Unscaled => self.unscaled,
            TimeMode::Realtime => self.started.elapsed().as_secs_f64(),
            TimeMode::Frames => self.frames as f64,
        }
    }

    fn advance(&mut self, real_dt: Duration) {
        let dt = real_dt.as_secs_f64();
        self.unscaled += dt;
        self.scaled += dt * self.time_scale;
        self.frames = self.frames.saturating_add(1);
    }

    fn time_scale(&self) -> f64 {
        self.time_scale
    }

    fn set_time_scale(&mut self, scale: f64) -> bool {
        if !scale.is_finite() || scale < 0.0 {
            return false;
        }
        self.time_scale = scale;
        true
    }
}

/// Polled delay: once armed it reports not-ready until `duration` has passed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebounceTimer {
    armed_at: Option<f64>,
    duration: f64,
}

impl DebounceTimer {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            armed_at: None,
            duration: duration_secs.max(0.0),
        }
    }

    pub fn arm(&mut self, now: f64) {
        self.armed_at = Some(now);
    }

    pub fn is_ready(&self, now: f64) -> bool {
        match self.armed_at {
            Some(armed_at) => now - armed_at >= self.duration,
            None => true,
        }
    }

    pub fn reset(&mut self) {
        self.armed_at = None;
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates_scaled_and_unscaled_time() {
        let mut clock = FrameClock::new();
        clock.advance(Duration::from_millis(500));
        assert!(clock.set_time_scale(2.0));
        clock.advance(Duration::from_millis(500));

        assert!((clock.seconds(TimeMode::Unscaled) - 1.0).abs() < 1e-9);
        assert!((clock.seconds(TimeMode::Scaled) - 1.5).abs() < 1e-9);
        assert_eq!(clock.seconds(TimeMode::Frames), 2.0);
    }

    #[test]
    fn invalid_time_scale_is_rejected() {
        let mut clock = FrameClock::new();
        assert!(!clock.set_time_scale(-1.0));
        assert!(!clock.set_time_scale(f64::NAN));
        assert!(clock.set_time_scale(0.0));
        assert_eq!(clock.time_scale(), 0.0);
    }

    #[test]
    fn debounce_blocks_until_duration_elapsed() {
        let mut timer = DebounceTimer::new(0.2);
        assert!(timer.is_ready(0.0));

        timer.arm(1.0);
        assert!(!timer.is_ready(1.1));
        assert!(timer.is_ready(1.25));

        timer.arm(2.0);
        timer.reset();
        assert!(timer.is_ready(2.0));
    }
}
