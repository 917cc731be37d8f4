impl<'r> ReaderSession<'r> {
    pub fn config(&self) -> ReaderConfig {
        self.config
    }

    pub fn text(&self) -> &TextBuffer {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.clock.cursor()
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    pub fn ramp_state(&self) -> RampState {
        self.clock.ramp_state()
    }

    /// Whether the periodic ramp sampler is currently armed.
    pub fn ramp_sampling(&self) -> bool {
        self.next_ramp_sample_ms.is_some()
    }

    /// Rate currently governing word advance.
    pub fn effective_wpm(&self) -> u16 {
        self.clock.rate().get()
    }

    pub fn current_word(&self) -> &str {
        self.text.word(self.clock.cursor()).unwrap_or("")
    }

    pub fn estimate_query(&self, now_ms: u64) -> EstimateQuery {
        EstimateQuery {
            words_remaining: self.text.words_remaining(self.clock.cursor()),
            base_wpm: self.config.wpm,
            current_wpm: self.effective_wpm(),
            ramp: self.config.ramp,
            playing: self.clock.is_playing(),
            ramp_state: self.clock.ramp_state(),
            now_ms,
        }
    }

    pub fn seconds_remaining(&self, now_ms: u64) -> f64 {
        estimate_seconds_remaining(&self.estimate_query(now_ms))
    }

    pub fn view(&self, now_ms: u64) -> ReaderView<'_> {
        ReaderView {
            word: self.current_word(),
            index: self.clock.cursor(),
            total: self.text.len(),
            wpm: self.effective_wpm(),
            playing: self.clock.is_playing(),
            seconds_remaining: self.seconds_remaining(now_ms),
        }
    }

    pub fn preferences(&self, base: &Preferences) -> Preferences {
        Preferences {
            wpm: self.config.wpm,
            ramp: self.config.ramp,
            ..base.clone()
        }
    }
}
