//! Command Handler Module
//!
//! This module implements the request processing layer for sessiond.
//! It receives decoded packets, executes them against the cache store,
//! and returns the reply to send, if any.
//!
//! ## Architecture
//!
//! ```text
//! Client Datagram
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  Packet Parser  │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Route        │
//! │  - Count        │
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   CacheStore    │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Requests
//!
//! - `NEW` - store a session with a timeout (first writer wins)
//! - `GET` - fetch a session; answered with `OK` or `ERR`
//! - `REMOVE` - drop a session

pub mod handler;

// Re-export the main command handler
pub use handler::{CommandHandler, Outcome};
