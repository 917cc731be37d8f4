//! Compact label policies for reading surfaces.

use core::fmt::Write;

use heapless::String as HeaplessString;

pub const REMAINING_LABEL_BYTES: usize = 16;

/// Formats an estimate as `"Ns"`, `"Mm Ss"` or `"Hh Mm"`.
pub fn remaining_label(seconds: f64) -> HeaplessString<REMAINING_LABEL_BYTES> {
    let total = if seconds.is_finite() {
        seconds.max(0.0).round() as u64
    } else {
        0
    };

    let mut out = HeaplessString::new();
    let _ = if total < 60 {
        write!(out, "{total}s")
    } else if total < 3_600 {
        write!(out, "{}m {}s", total / 60, total % 60)
    } else {
        write!(out, "{}h {}m", total / 3_600, (total % 3_600) / 60)
    };
    out
}

/// `"index/total"` progress label with a 1-based index.
pub fn progress_label(index: usize, total: usize) -> HeaplessString<REMAINING_LABEL_BYTES> {
    let mut out = HeaplessString::new();
    let shown = if total == 0 { 0 } else { index + 1 };
    let _ = write!(out, "{shown}/{total}");
    out
}
