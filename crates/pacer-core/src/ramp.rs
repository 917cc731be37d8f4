//! Time-based linear rate ramp.
//!
//! A ramp moves the effective rate from the rate captured at playback start towards a
//! target over a fixed duration, then holds the target. Ramps only accelerate: the target
//! is raised to the start rate whenever it is configured below it. Every caller goes
//! through [`ramp_target`] so the effective rate and the estimates share one policy.

use crate::rate::{clamp_wpm, clamp_wpm_f64};

pub const RAMP_SAMPLE_MS: u64 = 250;
pub const DEFAULT_RAMP_TARGET_WPM: u16 = 600;
pub const DEFAULT_RAMP_DURATION_SECS: f64 = 60.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RampConfig {
    pub enabled: bool,
    pub target_wpm: u16,
    pub duration_secs: f64,
}

impl RampConfig {
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            target_wpm: DEFAULT_RAMP_TARGET_WPM,
            duration_secs: DEFAULT_RAMP_DURATION_SECS,
        }
    }

    pub const fn new(target_wpm: u16, duration_secs: f64) -> Self {
        Self {
            enabled: true,
            target_wpm,
            duration_secs,
        }
    }

    /// Enabled with a positive duration. Anything else degenerates to constant rate.
    pub fn is_active(&self) -> bool {
        self.enabled && self.duration_secs > 0.0
    }
}

impl Default for RampConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Ramp origin captured when playback starts.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RampState {
    pub start_wpm: u16,
    pub started_at_ms: Option<u64>,
}

impl RampState {
    pub const fn idle() -> Self {
        Self {
            start_wpm: 0,
            started_at_ms: None,
        }
    }

    pub fn capture(start_wpm: u16, now_ms: u64) -> Self {
        Self {
            start_wpm: clamp_wpm(start_wpm as i64),
            started_at_ms: Some(now_ms),
        }
    }

    pub fn clear(&mut self) {
        self.started_at_ms = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at_ms.is_some()
    }

    pub fn elapsed_secs(&self, now_ms: u64) -> Option<f64> {
        self.started_at_ms
            .map(|started| now_ms.saturating_sub(started) as f64 / 1_000.0)
    }
}

/// Ramp end point for a ramp starting at `start_wpm`. Never below the start.
pub fn ramp_target(start_wpm: u16, target_wpm: u16) -> u16 {
    clamp_wpm(start_wpm as i64).max(clamp_wpm(target_wpm as i64))
}

/// Fraction of the ramp covered after `elapsed_secs`, in `[0, 1]`.
pub fn ramp_progress(elapsed_secs: f64, duration_secs: f64) -> f64 {
    if duration_secs <= 0.0 {
        return 1.0;
    }
    (elapsed_secs / duration_secs).clamp(0.0, 1.0)
}

/// Unrounded rate at `progress` along a ramp from `start_wpm` to `end_wpm`.
pub fn interpolate_wpm(start_wpm: f64, end_wpm: f64, progress: f64) -> f64 {
    let start = clamp_wpm_f64(start_wpm);
    let end = clamp_wpm_f64(end_wpm);
    start + (end - start) * progress.clamp(0.0, 1.0)
}

/// Rate that governs word advance at `now_ms`.
///
/// Equals the clamped base rate unless playing with an active ramp and a captured origin.
pub fn effective_wpm(
    base_wpm: u16,
    config: &RampConfig,
    state: &RampState,
    playing: bool,
    now_ms: u64,
) -> u16 {
    let base = clamp_wpm(base_wpm as i64);
    if !playing || !config.is_active() {
        return base;
    }
    let Some(elapsed) = state.elapsed_secs(now_ms) else {
        return base;
    };

    let start = clamp_wpm(state.start_wpm as i64);
    let target = ramp_target(start, config.target_wpm);
    let progress = ramp_progress(elapsed, config.duration_secs);
    let wpm = interpolate_wpm(start as f64, target as f64, progress).round();

    clamp_wpm(wpm as i64)
}
