//! Remaining-time estimation under constant and ramped pacing.

use crate::{
    ramp::{RampConfig, RampState, interpolate_wpm, ramp_progress, ramp_target},
    rate::clamp_wpm_f64,
};

/// Everything the estimator needs at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EstimateQuery {
    pub words_remaining: usize,
    pub base_wpm: u16,
    pub current_wpm: u16,
    pub ramp: RampConfig,
    pub playing: bool,
    pub ramp_state: RampState,
    pub now_ms: u64,
}

/// Seconds to read `words` at a constant `wpm`.
pub fn constant_seconds(words: f64, wpm: f64) -> f64 {
    if words <= 0.0 {
        return 0.0;
    }
    words / (clamp_wpm_f64(wpm) / 60.0)
}

/// Words consumed by a ramp from `start_wpm` to `end_wpm` that runs to completion.
pub fn ramp_word_count(start_wpm: f64, end_wpm: f64, duration_secs: f64) -> f64 {
    let start = clamp_wpm_f64(start_wpm);
    let end = clamp_wpm_f64(end_wpm);
    ((start + end) / 2.0) * (duration_secs.max(0.0) / 60.0)
}

/// Ramp time after which `words` have been read, for a text that ends mid-ramp.
///
/// Cumulative words at ramp time `t` are `(start * t + a * t^2) / 60` with
/// `a = (end - start) / (2 * duration)`; this returns the non-negative root of that
/// quadratic set equal to `words`.
pub fn ramp_crossing_secs(words: f64, start_wpm: f64, end_wpm: f64, duration_secs: f64) -> f64 {
    if words <= 0.0 {
        return 0.0;
    }
    let start = clamp_wpm_f64(start_wpm);
    let end = clamp_wpm_f64(end_wpm);
    if duration_secs <= 0.0 {
        return constant_seconds(words, end);
    }

    let a = (end - start) / (2.0 * duration_secs);
    let b = start;
    let c = -words * 60.0;
    if a == 0.0 {
        return (-c / b).max(0.0);
    }

    let discriminant = (b * b - 4.0 * a * c).max(0.0);
    ((-b + discriminant.sqrt()) / (2.0 * a)).max(0.0)
}

/// Seconds to read `remaining_words` when the rate climbs linearly from `start_wpm` to
/// `end_wpm` over `duration_secs` and then holds `end_wpm`.
pub fn ramp_seconds(remaining_words: f64, start_wpm: f64, end_wpm: f64, duration_secs: f64) -> f64 {
    if remaining_words <= 0.0 {
        return 0.0;
    }
    let start = clamp_wpm_f64(start_wpm);
    let end = clamp_wpm_f64(end_wpm);
    if duration_secs <= 0.0 || start == end {
        return constant_seconds(remaining_words, end);
    }

    let ramp_words = ramp_word_count(start, end, duration_secs);
    if remaining_words >= ramp_words {
        duration_secs + constant_seconds(remaining_words - ramp_words, end)
    } else {
        ramp_crossing_secs(remaining_words, start, end, duration_secs)
    }
}

/// Estimated seconds until the text is exhausted under the current pacing.
pub fn estimate_seconds_remaining(query: &EstimateQuery) -> f64 {
    if query.words_remaining == 0 {
        return 0.0;
    }
    let words = query.words_remaining as f64;

    // A zero-length ramp is still a ramp here: it finishes instantly at its target.
    if !query.ramp.enabled {
        let wpm = if query.playing {
            query.current_wpm
        } else {
            query.base_wpm
        };
        return constant_seconds(words, wpm as f64);
    }

    if !query.playing {
        // Preview of a fresh ramp from the base rate.
        let start = clamp_wpm_f64(query.base_wpm as f64);
        let end = ramp_target(query.base_wpm, query.ramp.target_wpm) as f64;
        return ramp_seconds(words, start, end, query.ramp.duration_secs);
    }

    let Some(elapsed) = query.ramp_state.elapsed_secs(query.now_ms) else {
        return constant_seconds(words, query.current_wpm as f64);
    };

    let duration = query.ramp.duration_secs;
    let start = query.ramp_state.start_wpm;
    let end = ramp_target(start, query.ramp.target_wpm) as f64;
    if elapsed >= duration {
        return constant_seconds(words, end);
    }

    let current = interpolate_wpm(start as f64, end, ramp_progress(elapsed, duration));
    ramp_seconds(words, current, end, duration - elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        let tolerance = expected.abs().max(1.0) * 1e-6;
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    fn query(words_remaining: usize, base_wpm: u16) -> EstimateQuery {
        EstimateQuery {
            words_remaining,
            base_wpm,
            current_wpm: base_wpm,
            ramp: RampConfig::disabled(),
            playing: false,
            ramp_state: RampState::idle(),
            now_ms: 0,
        }
    }

    #[test]
    fn empty_text_needs_no_time() {
        assert_eq!(estimate_seconds_remaining(&query(0, 300)), 0.0);
        assert_eq!(ramp_seconds(0.0, 300.0, 600.0, 30.0), 0.0);
        assert_eq!(ramp_seconds(-4.0, 300.0, 600.0, 30.0), 0.0);
    }

    #[test]
    fn constant_rate_is_plain_division() {
        assert_eq!(estimate_seconds_remaining(&query(120, 300)), 24.0);
    }

    #[test]
    fn constant_rate_prefers_live_rate_while_playing() {
        let mut q = query(120, 300);
        q.current_wpm = 600;
        assert_eq!(estimate_seconds_remaining(&q), 24.0);
        q.playing = true;
        assert_eq!(estimate_seconds_remaining(&q), 12.0);
    }

    #[test]
    fn zero_rate_never_divides_by_zero() {
        let seconds = estimate_seconds_remaining(&query(2, 0));
        assert_eq!(seconds, 120.0);
        assert!(ramp_seconds(10.0, 0.0, 0.0, 10.0).is_finite());
    }

    #[test]
    fn text_outlasting_ramp_adds_constant_tail() {
        assert_eq!(ramp_word_count(300.0, 600.0, 30.0), 225.0);
        assert_close(ramp_seconds(1_000.0, 300.0, 600.0, 30.0), 107.5);
    }

    #[test]
    fn text_ending_mid_ramp_solves_quadratic() {
        let expected = (-60.0 + 111_600f64.sqrt()) / 9.0;
        assert_close(ramp_seconds(100.0, 60.0, 600.0, 60.0), expected);
        assert_close(ramp_crossing_secs(100.0, 60.0, 600.0, 60.0), expected);
        assert!((expected - 30.4518).abs() < 1e-3);
    }

    #[test]
    fn degenerate_ramps_fall_back_to_constant_rate() {
        assert_close(ramp_seconds(100.0, 300.0, 300.0, 60.0), 20.0);
        assert_close(ramp_seconds(100.0, 200.0, 300.0, 0.0), 20.0);
        assert_close(ramp_crossing_secs(100.0, 300.0, 300.0, 60.0), 20.0);
    }

    #[test]
    fn crossing_time_reads_exactly_the_remaining_words() {
        for &(start, end, duration) in &[
            (60.0, 600.0, 60.0),
            (250.0, 900.0, 45.0),
            (1.0, 1500.0, 120.0),
            (700.0, 710.0, 10.0),
            (600.0, 200.0, 30.0),
        ] {
            let ramp_words = ramp_word_count(start, end, duration);
            for step in 1..20 {
                let words = ramp_words * step as f64 / 20.0;
                let t = ramp_crossing_secs(words, start, end, duration);
                assert!(t >= 0.0 && t <= duration * (1.0 + 1e-9));
                let a = (end - start) / (2.0 * duration);
                let read = (start * t + a * t * t) / 60.0;
                assert_close(read, words);
            }
        }
    }

    #[test]
    fn ramp_estimate_is_continuous_at_ramp_end() {
        let ramp_words = ramp_word_count(300.0, 600.0, 30.0);
        let inside = ramp_crossing_secs(ramp_words, 300.0, 600.0, 30.0);
        assert_close(inside, 30.0);
        assert_close(ramp_seconds(ramp_words, 300.0, 600.0, 30.0), 30.0);
    }

    #[test]
    fn preview_ramps_from_base_rate() {
        let mut q = query(1_000, 300);
        q.ramp = RampConfig::new(600, 30.0);
        assert_close(estimate_seconds_remaining(&q), 107.5);
    }

    #[test]
    fn preview_with_target_below_base_holds_base() {
        let mut q = query(120, 300);
        q.ramp = RampConfig::new(100, 30.0);
        assert_close(estimate_seconds_remaining(&q), 24.0);
    }

    #[test]
    fn playing_after_ramp_end_uses_target_rate() {
        let mut q = query(600, 300);
        q.ramp = RampConfig::new(600, 30.0);
        q.playing = true;
        q.ramp_state = RampState::capture(300, 0);
        q.now_ms = 45_000;
        assert_close(estimate_seconds_remaining(&q), 60.0);
    }

    #[test]
    fn playing_mid_ramp_projects_from_interpolated_rate() {
        let mut q = query(1_000, 300);
        q.ramp = RampConfig::new(600, 30.0);
        q.playing = true;
        q.ramp_state = RampState::capture(300, 0);
        q.now_ms = 15_000;
        // 450 -> 600 over the last 15 s covers 131.25 words.
        let expected = 15.0 + (1_000.0 - 131.25) / 10.0;
        assert_close(estimate_seconds_remaining(&q), expected);
    }

    #[test]
    fn playing_at_ramp_start_matches_preview() {
        let mut q = query(800, 240);
        q.ramp = RampConfig::new(720, 40.0);
        let preview = estimate_seconds_remaining(&q);
        q.playing = true;
        q.ramp_state = RampState::capture(240, 5_000);
        q.now_ms = 5_000;
        assert_close(estimate_seconds_remaining(&q), preview);
    }

    #[test]
    fn estimates_are_idempotent() {
        let mut q = query(512, 280);
        q.ramp = RampConfig::new(650, 50.0);
        q.playing = true;
        q.ramp_state = RampState::capture(280, 1_000);
        q.now_ms = 22_222;
        assert_eq!(estimate_seconds_remaining(&q), estimate_seconds_remaining(&q));
    }

    #[test]
    fn zero_length_ramp_runs_at_target() {
        let mut q = query(120, 300);
        q.ramp = RampConfig::new(600, 0.0);
        assert_close(estimate_seconds_remaining(&q), 12.0);

        q.ramp = RampConfig::new(600, -5.0);
        assert_close(estimate_seconds_remaining(&q), 12.0);

        q.playing = true;
        q.ramp_state = RampState::capture(300, 1_000);
        q.now_ms = 1_000;
        assert_close(estimate_seconds_remaining(&q), 12.0);

        // Below the start rate it holds the start rate instead.
        q.ramp = RampConfig::new(100, 0.0);
        assert_close(estimate_seconds_remaining(&q), 24.0);
    }

    #[test]
    fn playing_with_target_below_start_holds_start_rate() {
        let mut q = query(120, 300);
        q.ramp = RampConfig::new(100, 30.0);
        q.playing = true;
        q.ramp_state = RampState::capture(300, 0);

        for now_ms in [0, 10_000, 29_999, 30_000, 90_000] {
            q.now_ms = now_ms;
            assert_close(estimate_seconds_remaining(&q), 24.0);
        }
    }

    /// Evaluates `q` with each of the three estimator paths.
    fn each_mode(q: EstimateQuery, ramp: RampConfig) -> [f64; 3] {
        let constant = estimate_seconds_remaining(&q);

        let mut preview = q;
        preview.ramp = ramp;
        let preview = estimate_seconds_remaining(&preview);

        let mut playing = q;
        playing.ramp = ramp;
        playing.playing = true;
        playing.ramp_state = RampState::capture(q.base_wpm, 0);
        playing.now_ms = 10_000;
        let playing = estimate_seconds_remaining(&playing);

        [constant, preview, playing]
    }

    #[test]
    fn estimate_is_monotonic_in_rate_and_words() {
        let ramp = RampConfig::new(900, 45.0);
        for words in [1usize, 40, 200, 1_000] {
            let mut previous = [f64::INFINITY; 3];
            for base in (50u16..=1_500).step_by(50) {
                let seconds = each_mode(query(words, base), ramp);
                for (now, before) in seconds.iter().zip(previous) {
                    assert!(*now <= before + 1e-9);
                }
                previous = seconds;
            }
        }

        for base in [60u16, 300, 1_200] {
            let mut previous = [0.0; 3];
            for words in (0usize..2_000).step_by(37) {
                let seconds = each_mode(query(words, base), ramp);
                for (now, before) in seconds.iter().zip(previous) {
                    assert!(*now + 1e-9 >= before);
                }
                previous = seconds;
            }
        }
    }
}
