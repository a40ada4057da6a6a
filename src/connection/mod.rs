//! Request Loop Module
//!
//! This module runs the single request loop of sessiond. There are no
//! connections and no per-client tasks: one socket, one loop, one owner of
//! the cache.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     UDP socket                              │
//! │                    (main.rs)                                │
//! └──────────────┬───────────────────────────────▲──────────────┘
//!                │ recv_from()                   │ empty datagram
//!                ▼                               │
//! ┌──────────────────────────────┐   ┌───────────┴───────────┐
//! │       DatagramHandler        │   │  MaintenanceTrigger   │
//! │                              │   │  (every 300 seconds)  │
//! │  Parse ──> Execute ──> Reply │   └───────────────────────┘
//! └──────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use sessiond::connection::DatagramHandler;
//! use sessiond::commands::CommandHandler;
//! use std::sync::Arc;
//! use tokio::net::UdpSocket;
//!
//! let socket = Arc::new(UdpSocket::bind("0.0.0.0:54321").await?);
//! let handler = DatagramHandler::new(socket, CommandHandler::default())?;
//!
//! // Never returns
//! handler.run().await;
//! ```

pub mod handler;

// Re-export commonly used types
pub use handler::{DatagramHandler, Dispatch, DispatchError};
