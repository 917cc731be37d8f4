impl<'r> ReaderSession<'r> {
    pub fn new(rate: &'r RateCell, mut config: ReaderConfig) -> Self {
        config.wpm = clamp_wpm(config.wpm as i64);
        rate.set(config.wpm);

        Self {
            text: TextBuffer::default(),
            clock: PacingClock::new(rate, 0),
            config,
            next_ramp_sample_ms: None,
            words_since_drain: 0,
        }
    }

    /// Replaces the text. Rewinds to the first word and pauses.
    pub fn load_text(&mut self, raw: impl Into<String>) {
        self.text = TextBuffer::new(raw);
        self.clock.set_word_count(self.text.len());
        self.cancel_activities();
        debug!("session: loaded {} words", self.text.len());
    }

    pub fn start(&mut self, now_ms: u64) -> bool {
        if !self.clock.start(self.config.wpm, now_ms) {
            return false;
        }

        self.clock.rate().set(self.config.wpm);
        if self.config.ramp.is_active() {
            self.sample_ramp(now_ms);
        }
        true
    }

    /// Halts both activities before returning.
    pub fn stop(&mut self) -> bool {
        if !self.clock.stop() {
            return false;
        }

        self.cancel_activities();
        true
    }

    pub fn toggle(&mut self, now_ms: u64) -> bool {
        if self.clock.is_playing() {
            self.stop()
        } else {
            self.start(now_ms)
        }
    }

    pub fn seek(&mut self, index: usize) {
        self.clock.seek(index);
    }

    /// Changes the base rate. Without an active ramp the new rate governs the very next gap.
    pub fn set_base_wpm(&mut self, wpm: u16) -> bool {
        let wpm = clamp_wpm(wpm as i64);
        if wpm == self.config.wpm {
            return false;
        }

        self.config.wpm = wpm;
        if self.next_ramp_sample_ms.is_none() {
            self.clock.rate().set(wpm);
        }
        true
    }

    /// Applies new ramp parameters. While playing, sampling resumes from the live ramp origin.
    pub fn set_ramp(&mut self, ramp: RampConfig, now_ms: u64) {
        self.config.ramp = ramp;
        if !self.clock.is_playing() {
            return;
        }

        if ramp.is_active() {
            self.sample_ramp(now_ms);
        } else {
            self.next_ramp_sample_ms = None;
            self.clock.rate().set(self.config.wpm);
        }
    }

    /// Runs whatever is due at `now_ms`: the ramp sampler first, then the word clock.
    pub fn poll(&mut self, now_ms: u64) -> TickResult {
        if !self.clock.is_playing() {
            return TickResult::Idle;
        }

        if let Some(due_ms) = self.next_ramp_sample_ms
            && now_ms >= due_ms
        {
            self.sample_ramp(now_ms);
        }

        let result = self.clock.tick(now_ms);
        match result {
            TickResult::Advanced => {
                self.words_since_drain = self.words_since_drain.saturating_add(1);
            }
            TickResult::Finished => {
                self.words_since_drain = self.words_since_drain.saturating_add(1);
                self.cancel_activities();
                debug!("session: reached end of text");
            }
            TickResult::Idle => {}
        }
        result
    }

    pub fn drain_word_updates(&mut self) -> u32 {
        let count = self.words_since_drain;
        self.words_since_drain = 0;
        count
    }

    fn sample_ramp(&mut self, now_ms: u64) {
        let wpm = effective_wpm(
            self.config.wpm,
            &self.config.ramp,
            &self.clock.ramp_state(),
            self.clock.is_playing(),
            now_ms,
        );
        self.clock.rate().set(wpm);
        self.next_ramp_sample_ms = Some(now_ms.saturating_add(RAMP_SAMPLE_MS));
    }

    fn cancel_activities(&mut self) {
        self.next_ramp_sample_ms = None;
        self.clock.rate().set(self.config.wpm);
    }
}
