//! Storage-backed implementations of the core persistence ports.

pub mod record_store;

pub use record_store::{RecordStore, RecordStoreError};
