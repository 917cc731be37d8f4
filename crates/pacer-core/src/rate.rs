//! Words-per-minute domain and the shared live-rate cell.

use core::sync::atomic::{AtomicU16, Ordering};

pub const MIN_WPM: u16 = 1;
pub const MAX_WPM: u16 = 1500;
pub const DEFAULT_WPM: u16 = 300;

const MS_PER_MINUTE: u64 = 60_000;

/// Pulls any integer rate into `[MIN_WPM, MAX_WPM]`.
pub fn clamp_wpm(wpm: i64) -> u16 {
    wpm.clamp(MIN_WPM as i64, MAX_WPM as i64) as u16
}

/// Float variant used by the estimator. NaN collapses to the lower bound.
pub fn clamp_wpm_f64(wpm: f64) -> f64 {
    if wpm.is_nan() {
        return MIN_WPM as f64;
    }
    wpm.clamp(MIN_WPM as f64, MAX_WPM as f64)
}

/// Whether `elapsed_ms` covers at least one inter-word gap at `wpm`.
///
/// Equivalent to `elapsed_ms >= 60000 / wpm`, kept in integers so the boundary is exact.
pub fn word_due(elapsed_ms: u64, wpm: u16) -> bool {
    let wpm = clamp_wpm(wpm as i64) as u64;
    elapsed_ms.saturating_mul(wpm) >= MS_PER_MINUTE
}

/// Live effective rate shared between the ramp sampler and the word clock.
///
/// Readers always see the latest write; nothing captures the rate by value.
#[derive(Debug)]
pub struct RateCell {
    wpm: AtomicU16,
}

impl RateCell {
    pub const fn new(wpm: u16) -> Self {
        let wpm = if wpm < MIN_WPM {
            MIN_WPM
        } else if wpm > MAX_WPM {
            MAX_WPM
        } else {
            wpm
        };
        Self {
            wpm: AtomicU16::new(wpm),
        }
    }

    pub fn get(&self) -> u16 {
        self.wpm.load(Ordering::Relaxed)
    }

    pub fn set(&self, wpm: u16) {
        self.wpm.store(clamp_wpm(wpm as i64), Ordering::Relaxed);
    }
}

impl Default for RateCell {
    fn default() -> Self {
        Self::new(DEFAULT_WPM)
    }
}
