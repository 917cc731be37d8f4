//! Persisted user preferences and the key-value port they travel through.

use std::collections::BTreeMap;

use heapless::String as HeaplessString;
use log::warn;

use crate::{
    ramp::RampConfig,
    rate::{DEFAULT_WPM, clamp_wpm},
};

pub const HIGHLIGHT_COLOR_BYTES: usize = 16;
pub const DEFAULT_TEXT_SIZE: u16 = 48;
pub const MIN_TEXT_SIZE: u16 = 12;
pub const MAX_TEXT_SIZE: u16 = 160;
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "#ef4444";
pub const MAX_RAMP_DURATION_SECS: f64 = 3_600.0;

pub const SETTINGS_SAVE_DEBOUNCE_MS: u64 = 1_500;

pub const KEY_WPM: &str = "wpm";
pub const KEY_TEXT_SIZE: &str = "text_size";
pub const KEY_HIGHLIGHT_COLOR: &str = "highlight_color";
pub const KEY_RAMP_ENABLED: &str = "ramp_enabled";
pub const KEY_RAMP_TARGET_WPM: &str = "ramp_target_wpm";
pub const KEY_RAMP_DURATION_SECS: &str = "ramp_duration_secs";

/// Abstract key-value persistence backend.
pub trait PreferenceStore {
    type Error;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;
}

/// In-memory store. Nothing survives the process.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PreferenceStore for MemoryStore {
    type Error = core::convert::Infallible;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// User-tunable settings that should survive restarts.
#[derive(Clone, Debug, PartialEq)]
pub struct Preferences {
    pub wpm: u16,
    pub text_size: u16,
    pub highlight_color: HeaplessString<HIGHLIGHT_COLOR_BYTES>,
    pub ramp: RampConfig,
}

impl Default for Preferences {
    fn default() -> Self {
        let mut highlight_color = HeaplessString::new();
        let _ = highlight_color.push_str(DEFAULT_HIGHLIGHT_COLOR);

        Self {
            wpm: DEFAULT_WPM,
            text_size: DEFAULT_TEXT_SIZE,
            highlight_color,
            ramp: RampConfig::disabled(),
        }
    }
}

impl Preferences {
    /// Restores preferences, substituting defaults for missing or unreadable values.
    pub fn load<S: PreferenceStore>(store: &S) -> Result<Self, S::Error> {
        let defaults = Self::default();

        let wpm = read_parsed::<_, i64>(store, KEY_WPM)?
            .map_or(defaults.wpm, clamp_wpm);
        let text_size = read_parsed::<_, i64>(store, KEY_TEXT_SIZE)?.map_or(
            defaults.text_size,
            |size| size.clamp(MIN_TEXT_SIZE as i64, MAX_TEXT_SIZE as i64) as u16,
        );
        let highlight_color = match store.get(KEY_HIGHLIGHT_COLOR)? {
            Some(raw) => parse_color(&raw).unwrap_or_else(|| {
                warn!("settings: ignoring highlight color {raw:?}");
                defaults.highlight_color.clone()
            }),
            None => defaults.highlight_color.clone(),
        };
        let enabled =
            read_parsed::<_, bool>(store, KEY_RAMP_ENABLED)?.unwrap_or(defaults.ramp.enabled);
        let target_wpm = read_parsed::<_, i64>(store, KEY_RAMP_TARGET_WPM)?
            .map_or(defaults.ramp.target_wpm, clamp_wpm);
        let duration_secs = read_parsed::<_, f64>(store, KEY_RAMP_DURATION_SECS)?
            .filter(|secs| secs.is_finite())
            .map_or(defaults.ramp.duration_secs, |secs| {
                secs.clamp(0.0, MAX_RAMP_DURATION_SECS)
            });

        Ok(Self {
            wpm,
            text_size,
            highlight_color,
            ramp: RampConfig {
                enabled,
                target_wpm,
                duration_secs,
            },
        })
    }

    pub fn save<S: PreferenceStore>(&self, store: &mut S) -> Result<(), S::Error> {
        store.set(KEY_WPM, &self.wpm.to_string())?;
        store.set(KEY_TEXT_SIZE, &self.text_size.to_string())?;
        store.set(KEY_HIGHLIGHT_COLOR, &self.highlight_color)?;
        store.set(KEY_RAMP_ENABLED, &self.ramp.enabled.to_string())?;
        store.set(KEY_RAMP_TARGET_WPM, &self.ramp.target_wpm.to_string())?;
        store.set(KEY_RAMP_DURATION_SECS, &self.ramp.duration_secs.to_string())?;
        Ok(())
    }
}

fn read_parsed<S, T>(store: &S, key: &str) -> Result<Option<T>, S::Error>
where
    S: PreferenceStore,
    T: core::str::FromStr,
{
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    match raw.trim().parse::<T>() {
        Ok(value) => Ok(Some(value)),
        Err(_) => {
            warn!("settings: ignoring unreadable {key}={raw:?}");
            Ok(None)
        }
    }
}

/// Accepts `#rgb` and `#rrggbb` hex colors.
fn parse_color(raw: &str) -> Option<HeaplessString<HIGHLIGHT_COLOR_BYTES>> {
    let raw = raw.trim();
    let digits = raw.strip_prefix('#')?;
    if !matches!(digits.len(), 3 | 6) || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }

    let mut color = HeaplessString::new();
    color.push_str(raw).ok()?;
    Some(color)
}

/// Debounced write-back of preferences.
///
/// Changes are flushed once they have been stable for [`SETTINGS_SAVE_DEBOUNCE_MS`].
pub struct PreferenceSync {
    last_saved: Preferences,
    pending: Option<(Preferences, u64)>,
}

impl PreferenceSync {
    pub fn new(initial: Preferences) -> Self {
        Self {
            last_saved: initial,
            pending: None,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn track_current(&mut self, current: &Preferences, now_ms: u64) {
        if *current == self.last_saved {
            self.pending = None;
            return;
        }

        match self.pending.as_mut() {
            Some((pending, changed_at_ms)) => {
                if pending != current {
                    *pending = current.clone();
                    *changed_at_ms = now_ms;
                }
            }
            None => {
                self.pending = Some((current.clone(), now_ms));
            }
        }
    }

    /// Returns `true` when a write reached the store.
    pub fn flush_if_due<S: PreferenceStore>(&mut self, store: &mut S, now_ms: u64) -> bool {
        let Some((candidate, changed_at_ms)) = self.pending.take() else {
            return false;
        };

        if now_ms.saturating_sub(changed_at_ms) < SETTINGS_SAVE_DEBOUNCE_MS {
            self.pending = Some((candidate, changed_at_ms));
            return false;
        }

        self.flush_candidate(store, candidate, now_ms)
    }

    /// Writes any pending change immediately, e.g. on shutdown.
    pub fn flush_now<S: PreferenceStore>(&mut self, store: &mut S, now_ms: u64) -> bool {
        match self.pending.take() {
            Some((candidate, _)) => self.flush_candidate(store, candidate, now_ms),
            None => false,
        }
    }

    fn flush_candidate<S: PreferenceStore>(
        &mut self,
        store: &mut S,
        candidate: Preferences,
        now_ms: u64,
    ) -> bool {
        if candidate.save(store).is_ok() {
            self.last_saved = candidate;
            true
        } else {
            warn!("settings: save failed, retrying later");
            self.pending = Some((candidate, now_ms));
            false
        }
    }
}
