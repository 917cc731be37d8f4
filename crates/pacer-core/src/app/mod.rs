//! Reading session: text, word clock and ramp sampler driven from one poll loop.

use log::debug;

use crate::{
    clock::{PacingClock, TickResult},
    estimate::{EstimateQuery, estimate_seconds_remaining},
    ramp::{RAMP_SAMPLE_MS, RampConfig, RampState, effective_wpm},
    rate::{DEFAULT_WPM, RateCell, clamp_wpm},
    settings::Preferences,
    text::TextBuffer,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReaderConfig {
    pub wpm: u16,
    pub ramp: RampConfig,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            wpm: DEFAULT_WPM,
            ramp: RampConfig::disabled(),
        }
    }
}

impl From<&Preferences> for ReaderConfig {
    fn from(prefs: &Preferences) -> Self {
        Self {
            wpm: prefs.wpm,
            ramp: prefs.ramp,
        }
    }
}

/// Everything a surface needs to draw the reader at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReaderView<'a> {
    pub word: &'a str,
    pub index: usize,
    pub total: usize,
    pub wpm: u16,
    pub playing: bool,
    pub seconds_remaining: f64,
}

pub struct ReaderSession<'r> {
    text: TextBuffer,
    clock: PacingClock<'r>,
    config: ReaderConfig,
    next_ramp_sample_ms: Option<u64>,
    words_since_drain: u32,
}

include!("view.rs");
include!("runtime.rs");
