//! Real-time word clock.
//!
//! The clock advances a cursor whenever one inter-word gap has elapsed since the previous
//! advance. The gap is derived from the shared [`RateCell`] on every tick, so a rate change
//! only stretches or shrinks the gaps that follow it.

use log::debug;

use crate::{
    ramp::RampState,
    rate::{RateCell, clamp_wpm, word_due},
};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PlaybackState {
    #[default]
    Paused,
    Playing,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TickResult {
    Idle,
    Advanced,
    /// The last word was passed; cursor is back at 0 and playback paused.
    Finished,
}

pub struct PacingClock<'r> {
    rate: &'r RateCell,
    state: PlaybackState,
    cursor: usize,
    word_count: usize,
    ramp: RampState,
    last_advance_ms: Option<u64>,
}

impl<'r> PacingClock<'r> {
    pub fn new(rate: &'r RateCell, word_count: usize) -> Self {
        Self {
            rate,
            state: PlaybackState::Paused,
            cursor: 0,
            word_count,
            ramp: RampState::idle(),
            last_advance_ms: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn ramp_state(&self) -> RampState {
        self.ramp
    }

    pub fn rate(&self) -> &'r RateCell {
        self.rate
    }

    /// Swaps in a new text length. Rewinds and pauses.
    pub fn set_word_count(&mut self, word_count: usize) {
        self.stop();
        self.word_count = word_count;
        self.cursor = 0;
    }

    /// Jumps to `index`, clamped to the last word. Playback and timing are untouched.
    pub fn seek(&mut self, index: usize) {
        self.cursor = index.min(self.word_count.saturating_sub(1));
    }

    /// Paused -> Playing. Returns `false` when already playing or there is nothing to read.
    pub fn start(&mut self, base_wpm: u16, now_ms: u64) -> bool {
        if self.is_playing() || self.word_count == 0 {
            return false;
        }

        self.state = PlaybackState::Playing;
        self.ramp = RampState::capture(base_wpm, now_ms);
        self.last_advance_ms = Some(now_ms);
        debug!(
            "clock: start at word {}/{} from {} wpm",
            self.cursor, self.word_count, self.ramp.start_wpm
        );
        true
    }

    /// Playing -> Paused. Returns `false` when already paused.
    pub fn stop(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }

        self.state = PlaybackState::Paused;
        self.ramp.clear();
        self.last_advance_ms = None;
        debug!("clock: stop at word {}/{}", self.cursor, self.word_count);
        true
    }

    pub fn tick(&mut self, now_ms: u64) -> TickResult {
        if !self.is_playing() {
            return TickResult::Idle;
        }

        let anchor = *self.last_advance_ms.get_or_insert(now_ms);
        let wpm = clamp_wpm(self.rate.get() as i64);
        if !word_due(now_ms.saturating_sub(anchor), wpm) {
            return TickResult::Idle;
        }

        if self.cursor + 1 >= self.word_count {
            self.cursor = 0;
            self.stop();
            return TickResult::Finished;
        }

        self.cursor += 1;
        self.last_advance_ms = Some(now_ms);
        TickResult::Advanced
    }
}
