//! # sessiond - A UDP Session Cache Daemon
//!
//! sessiond keeps small opaque blobs (typically TLS session state) keyed by
//! a 32-byte identifier, so that a pool of servers can resume each other's
//! sessions. Clients talk to it with a fixed-layout binary protocol over
//! UDP, one request per datagram.
//!
//! ## Features
//!
//! - **First Writer Wins**: `NEW` never overwrites a cached key
//! - **Bucketed Expiry**: entries are indexed by expiry second, so a sweep
//!   costs only what actually expires
//! - **Hard Cap**: the cache never holds more than its configured number of
//!   entries; the earliest-expiring ones go first
//! - **Lock-Free by Construction**: one task owns the cache; periodic
//!   maintenance arrives as an ordinary (empty) datagram
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                              sessiond                               │
//! │                                                                     │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐              │
//! │  │ UDP Socket  │───>│  Datagram   │───>│  Command    │              │
//! │  │ (Arc)       │    │  Handler    │    │  Handler    │              │
//! │  └──────▲──────┘    └─────────────┘    └──────┬──────┘              │
//! │         │                                     │                     │
//! │         │ empty datagram                      ▼                     │
//! │  ┌──────┴──────────────┐     ┌─────────────────────────────────┐    │
//! │  │ MaintenanceTrigger  │     │           CacheStore            │    │
//! │  │ (Background Task)   │     │  HashMap + BTreeMap<expiry>     │    │
//! │  └─────────────────────┘     └─────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use sessiond::commands::CommandHandler;
//! use sessiond::connection::DatagramHandler;
//! use sessiond::maintenance::{MaintenanceTrigger, TriggerConfig};
//! use sessiond::storage::CacheStore;
//! use std::sync::Arc;
//! use tokio::net::UdpSocket;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> std::io::Result<()> {
//!     let socket = Arc::new(UdpSocket::bind("0.0.0.0:54321").await?);
//!
//!     let handler = DatagramHandler::new(
//!         Arc::clone(&socket),
//!         CommandHandler::new(CacheStore::new()),
//!     )?;
//!
//!     // Wake the request loop up every 5 minutes for a sweep
//!     let _trigger = MaintenanceTrigger::start(
//!         Arc::clone(&socket),
//!         handler.sentinel_target(),
//!         TriggerConfig::default(),
//!     );
//!
//!     handler.run().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`protocol`]: packet layout, encoder and validating decoder
//! - [`storage`]: the expiring, size-capped cache store
//! - [`commands`]: routes `NEW`/`GET`/`REMOVE` to the store and counts them
//! - [`connection`]: the request loop over the UDP socket
//! - [`maintenance`]: sentinel trigger and periodic statistics
//! - [`config`]: command line parsing for the daemon
//!
//! ## Design Highlights
//!
//! ### Single Owner
//!
//! The cache is touched only by the request loop. Nothing is shared but the
//! socket, and the maintenance task only ever sends on it.
//!
//! ### Expiry
//!
//! Expired entries are not hidden on read; they remain visible until the
//! next maintenance sweep or the next insert removes them; every insert
//! sweeps first.

pub mod commands;
pub mod config;
pub mod connection;
pub mod maintenance;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{CommandHandler, Outcome};
pub use config::{CliAction, Config, ConfigError};
pub use connection::{DatagramHandler, Dispatch, DispatchError};
pub use maintenance::{MaintenanceTrigger, StatsReport, TriggerConfig};
pub use protocol::{parse_packet, Packet, PacketError, PacketKind, ParseError};
pub use storage::{CacheStore, CleanupReport};

/// The default UDP port sessiond listens on
pub const DEFAULT_PORT: u16 = 54321;

/// The default host sessiond binds to
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Version of sessiond
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
