//! Storage Engine Module
//!
//! This module provides the cache store behind sessiond: a key/value map
//! with per-entry expiry, backed by an ordered index of expiry buckets.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       CacheStore                            │
//! │  ┌───────────────────────┐   ┌───────────────────────────┐  │
//! │  │ storage (HashMap)     │   │ expiry_index (BTreeMap)   │  │
//! │  │ key -> entry          │<->│ second -> {keys}          │  │
//! │  └───────────────────────┘   └───────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │ cleanup(now)
//!              ┌─────────────┴─────────────┐
//!              │   insert / maintenance    │
//!              └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **First Writer Wins**: inserts never overwrite a live key
//! - **Bucketed Expiry**: a sweep costs only what actually expires
//! - **Hard Cap**: the earliest-expiring bucket is evicted under overload
//!
//! ## Example
//!
//! ```
//! use sessiond::storage::CacheStore;
//! use bytes::Bytes;
//!
//! let mut store = CacheStore::new();
//! store.insert_at(Bytes::from("session"), Bytes::from("blob"), 300, 1_000);
//!
//! assert_eq!(store.find(b"session"), Some(Bytes::from("blob")));
//!
//! // Entries are valid through their expiry second
//! store.cleanup(1_300);
//! assert!(store.find(b"session").is_some());
//! store.cleanup(1_301);
//! assert!(store.find(b"session").is_none());
//! ```

pub mod engine;

#[cfg(test)]
mod property_tests;

// Re-export commonly used types
pub use engine::{current_timestamp, CacheEntry, CacheStore, CleanupReport, MAX_ENTRIES};
