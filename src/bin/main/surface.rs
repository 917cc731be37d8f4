use std::io::{self, Write};

use pacer_core::{
    app::ReaderView,
    text_policy::{progress_label, remaining_label},
};

/// Single-line terminal surface. Each frame overwrites the previous word.
pub(super) struct TerminalSurface {
    stdout: io::Stdout,
}

impl TerminalSurface {
    pub(super) fn new() -> Self {
        Self {
            stdout: io::stdout(),
        }
    }

    pub(super) fn show(&mut self, view: &ReaderView<'_>) {
        let progress = progress_label(view.index, view.total);
        let remaining = remaining_label(view.seconds_remaining);
        let mut out = self.stdout.lock();
        let _ = write!(
            out,
            "\r\x1b[2K{progress:>11}  {:>4} wpm  {remaining:>8}  {}",
            view.wpm, view.word
        );
        let _ = out.flush();
    }

    pub(super) fn finish(&mut self) {
        let mut out = self.stdout.lock();
        let _ = writeln!(out);
        let _ = out.flush();
    }
}
