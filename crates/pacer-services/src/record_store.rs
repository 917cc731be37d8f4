//! Preference map persisted as one checksummed record on byte-addressable storage.
//!
//! Layout at `base_offset`:
//!
//! | bytes | field                                  |
//! |-------|----------------------------------------|
//! | 0..4  | magic `"PCR1"` (LE)                    |
//! | 4     | version                                |
//! | 5..8  | reserved, zero                         |
//! | 8..12 | payload length (LE)                    |
//! | 12..  | payload, `key=value\n` lines           |
//! | +4    | FNV-1a of header and payload (LE)      |

use std::collections::BTreeMap;

use embedded_storage::{ReadStorage, Storage};
use log::{debug, warn};
use pacer_core::settings::PreferenceStore;

const RECORD_MAGIC: u32 = 0x3152_4350; // "PCR1"
const RECORD_VERSION: u8 = 1;
const HEADER_LEN: usize = 12;
const CHECKSUM_LEN: usize = 4;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RecordStoreError<E> {
    Storage(E),
    Corrupted,
    TooLarge,
    InvalidEntry,
}

#[derive(Debug)]
pub struct RecordStore<S> {
    storage: S,
    base_offset: u32,
    entries: BTreeMap<String, String>,
}

impl<S> RecordStore<S>
where
    S: Storage,
{
    /// Reads the record at `base_offset`. Erased or foreign bytes open as an empty store.
    pub fn open(mut storage: S, base_offset: u32) -> Result<Self, RecordStoreError<S::Error>> {
        let entries = read_record(&mut storage, base_offset)?.unwrap_or_default();
        debug!("record-store: opened with {} entries", entries.len());

        Ok(Self {
            storage,
            base_offset,
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_inner(self) -> S {
        self.storage
    }

    fn write_record(&mut self) -> Result<(), RecordStoreError<S::Error>> {
        let mut payload = String::new();
        for (key, value) in &self.entries {
            payload.push_str(key);
            payload.push('=');
            payload.push_str(value);
            payload.push('\n');
        }

        let total = HEADER_LEN + payload.len() + CHECKSUM_LEN;
        let available = self
            .storage
            .capacity()
            .saturating_sub(self.base_offset as usize);
        if total > available {
            return Err(RecordStoreError::TooLarge);
        }

        let mut buf = Vec::with_capacity(total);
        buf.extend_from_slice(&RECORD_MAGIC.to_le_bytes());
        buf.push(RECORD_VERSION);
        buf.extend_from_slice(&[0u8; 3]);
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(payload.as_bytes());
        let checksum = checksum32(&buf);
        buf.extend_from_slice(&checksum.to_le_bytes());

        self.storage
            .write(self.base_offset, &buf)
            .map_err(RecordStoreError::Storage)
    }
}

impl<S> PreferenceStore for RecordStore<S>
where
    S: Storage,
{
    type Error = RecordStoreError<S::Error>;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        if key.is_empty() || key.contains(['=', '\n']) || value.contains('\n') {
            return Err(RecordStoreError::InvalidEntry);
        }
        if self.entries.get(key).is_some_and(|current| current == value) {
            return Ok(());
        }

        let previous = self.entries.insert(key.to_owned(), value.to_owned());
        if let Err(err) = self.write_record() {
            match previous {
                Some(previous) => self.entries.insert(key.to_owned(), previous),
                None => self.entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }
}

fn read_record<S: Storage>(
    storage: &mut S,
    base_offset: u32,
) -> Result<Option<BTreeMap<String, String>>, RecordStoreError<S::Error>> {
    let available = storage.capacity().saturating_sub(base_offset as usize);
    if available < HEADER_LEN + CHECKSUM_LEN {
        return Err(RecordStoreError::TooLarge);
    }

    let mut header = [0u8; HEADER_LEN];
    storage
        .read(base_offset, &mut header)
        .map_err(RecordStoreError::Storage)?;

    if header.iter().all(|b| *b == 0xFF) {
        return Ok(None);
    }

    let magic = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    if magic != RECORD_MAGIC {
        warn!("record-store: unknown magic {magic:#010x}, starting empty");
        return Ok(None);
    }
    if header[4] != RECORD_VERSION {
        warn!("record-store: unsupported version {}, starting empty", header[4]);
        return Ok(None);
    }

    let payload_len = u32::from_le_bytes([header[8], header[9], header[10], header[11]]) as usize;
    if HEADER_LEN + payload_len + CHECKSUM_LEN > available {
        return Err(RecordStoreError::Corrupted);
    }

    let mut body = vec![0u8; payload_len + CHECKSUM_LEN];
    storage
        .read(base_offset + HEADER_LEN as u32, &mut body)
        .map_err(RecordStoreError::Storage)?;

    let (payload, checksum_bytes) = body.split_at(payload_len);
    let expected = u32::from_le_bytes([
        checksum_bytes[0],
        checksum_bytes[1],
        checksum_bytes[2],
        checksum_bytes[3],
    ]);
    let mut checksum = checksum32_update(FNV_OFFSET, &header);
    checksum = checksum32_update(checksum, payload);
    if checksum != expected {
        return Err(RecordStoreError::Corrupted);
    }

    let text = core::str::from_utf8(payload).map_err(|_| RecordStoreError::Corrupted)?;
    let mut entries = BTreeMap::new();
    for line in text.split_terminator('\n') {
        let (key, value) = line.split_once('=').ok_or(RecordStoreError::Corrupted)?;
        entries.insert(key.to_owned(), value.to_owned());
    }

    Ok(Some(entries))
}

const FNV_OFFSET: u32 = 0x811C9DC5;

fn checksum32(bytes: &[u8]) -> u32 {
    checksum32_update(FNV_OFFSET, bytes)
}

fn checksum32_update(mut hash: u32, bytes: &[u8]) -> u32 {
    for b in bytes {
        hash ^= *b as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

#[cfg(test)]
mod tests {
    use pacer_core::{ramp::RampConfig, settings::Preferences};

    use super::*;

    #[derive(Debug)]
    struct RamStorage {
        bytes: Vec<u8>,
    }

    impl RamStorage {
        fn erased(len: usize) -> Self {
            Self {
                bytes: vec![0xFF; len],
            }
        }
    }

    #[derive(Debug, Clone, Copy, Eq, PartialEq)]
    struct OutOfBounds;

    impl ReadStorage for RamStorage {
        type Error = OutOfBounds;

        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
            let start = offset as usize;
            let src = self
                .bytes
                .get(start..start + bytes.len())
                .ok_or(OutOfBounds)?;
            bytes.copy_from_slice(src);
            Ok(())
        }

        fn capacity(&self) -> usize {
            self.bytes.len()
        }
    }

    impl Storage for RamStorage {
        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
            let start = offset as usize;
            let dst = self
                .bytes
                .get_mut(start..start + bytes.len())
                .ok_or(OutOfBounds)?;
            dst.copy_from_slice(bytes);
            Ok(())
        }
    }

    #[test]
    fn erased_storage_opens_empty() {
        let store = RecordStore::open(RamStorage::erased(256), 0).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.get("wpm").unwrap(), None);
    }

    #[test]
    fn values_survive_reopen() {
        let mut store = RecordStore::open(RamStorage::erased(256), 32).unwrap();
        store.set("wpm", "420").unwrap();
        store.set("ramp_enabled", "true").unwrap();
        store.set("wpm", "450").unwrap();

        let reopened = RecordStore::open(store.into_inner(), 32).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get("wpm").unwrap().as_deref(), Some("450"));
        assert_eq!(reopened.get("ramp_enabled").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn carriage_returns_are_kept_verbatim() {
        let mut store = RecordStore::open(RamStorage::erased(256), 0).unwrap();
        store.set("k", "v\r").unwrap();
        store.set("crlf\r", "\r\rx").unwrap();

        let reopened = RecordStore::open(store.into_inner(), 0).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v\r"));
        assert_eq!(reopened.get("crlf\r").unwrap().as_deref(), Some("\r\rx"));
    }

    #[test]
    fn preferences_persist_through_record() {
        let mut prefs = Preferences::default();
        prefs.wpm = 640;
        prefs.ramp = RampConfig::new(1_000, 90.0);

        let mut store = RecordStore::open(RamStorage::erased(512), 0).unwrap();
        prefs.save(&mut store).unwrap();

        let reopened = RecordStore::open(store.into_inner(), 0).unwrap();
        assert_eq!(Preferences::load(&reopened).unwrap(), prefs);
    }

    #[test]
    fn flipped_payload_byte_is_reported_as_corruption() {
        let mut store = RecordStore::open(RamStorage::erased(256), 0).unwrap();
        store.set("wpm", "300").unwrap();

        let mut storage = store.into_inner();
        storage.bytes[HEADER_LEN] ^= 0x01;
        assert_eq!(
            RecordStore::open(storage, 0).unwrap_err(),
            RecordStoreError::Corrupted
        );
    }

    #[test]
    fn foreign_bytes_open_empty() {
        let mut storage = RamStorage::erased(128);
        storage.bytes[..4].copy_from_slice(b"JUNK");
        let store = RecordStore::open(storage, 0).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn oversized_record_is_rejected_and_rolled_back() {
        let mut store = RecordStore::open(RamStorage::erased(40), 0).unwrap();
        store.set("a", "1").unwrap();
        let long = "x".repeat(64);
        assert_eq!(store.set("b", &long), Err(RecordStoreError::TooLarge));
        assert_eq!(store.get("b").unwrap(), None);
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn malformed_entries_are_refused() {
        let mut store = RecordStore::open(RamStorage::erased(128), 0).unwrap();
        assert_eq!(store.set("", "1"), Err(RecordStoreError::InvalidEntry));
        assert_eq!(store.set("a=b", "1"), Err(RecordStoreError::InvalidEntry));
        assert_eq!(store.set("a", "1\n2"), Err(RecordStoreError::InvalidEntry));
        assert!(store.is_empty());
    }

    #[test]
    fn storage_smaller_than_a_header_is_too_large() {
        assert_eq!(
            RecordStore::open(RamStorage::erased(8), 0).unwrap_err(),
            RecordStoreError::TooLarge
        );
    }
}
