//! Whitespace tokenized text held for one reading session.

use core::ops::Range;

/// Words of one raw text, stored as byte spans into the owned source.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TextBuffer {
    raw: String,
    spans: Vec<Range<usize>>,
}

impl TextBuffer {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut spans = Vec::new();
        let mut cursor = 0usize;

        while let Some(span) = next_word_at(&raw, cursor) {
            cursor = span.end;
            spans.push(span);
        }

        Self { raw, spans }
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn word(&self, index: usize) -> Option<&str> {
        self.spans.get(index).map(|span| &self.raw[span.clone()])
    }

    pub fn words(&self) -> impl Iterator<Item = &str> + '_ {
        self.spans.iter().map(|span| &self.raw[span.clone()])
    }

    /// Words still to be shown when the cursor sits on `index`, the current one included.
    pub fn words_remaining(&self, index: usize) -> usize {
        self.len().saturating_sub(index)
    }
}

/// Byte span of the first word at or after `cursor`.
fn next_word_at(text: &str, cursor: usize) -> Option<Range<usize>> {
    let rest = text.get(cursor..)?;
    let start = cursor + rest.find(|ch: char| !ch.is_whitespace())?;
    let end = text[start..]
        .find(char::is_whitespace)
        .map_or(text.len(), |offset| start + offset);

    Some(start..end)
}
