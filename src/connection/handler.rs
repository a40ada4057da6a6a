//! Datagram Handler
//!
//! This module runs sessiond's request loop. One task owns the socket's
//! receive side, the command handler and therefore the whole cache; every
//! datagram, including the maintenance sentinel, is handled to completion
//! before the next one is read.
//!
//! ## Request Lifecycle
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ recv_from() (only await)     │
//! └──────────────┬───────────────┘
//!                │
//!                ▼
//!    empty, from our own port? ──yes──> maintenance: sweep + stats line
//!                │ no
//!                ▼
//!    parse_packet() ──error──> log "malformed packet", drop
//!                │ ok
//!                ▼
//!    CommandHandler::execute()
//!                │
//!                ▼
//!    GET? ──yes──> send_to(peer) (failures are logged, not retried)
//!                │
//!                ▼
//!           [Loop back]
//! ```
//!
//! ## Buffer Management
//!
//! UDP preserves message boundaries, so a single fixed buffer of the
//! largest packet size is reused for every receive. Anything a peer sends
//! beyond that size is truncated by the kernel.

use crate::commands::{CommandHandler, Outcome};
use crate::maintenance::{is_sentinel, sentinel_target, StatsReport};
use crate::protocol::{parse_packet, ParseError, MAX_PACKET_LEN};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, error, info, trace};

/// Pause after a failed receive so a persistent error cannot spin the loop.
const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// What the loop did with one datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// The datagram was a maintenance sentinel
    Maintenance(StatsReport),
    /// The datagram was a request; GET replies have already been sent
    Executed(Outcome),
}

/// Errors that can occur while handling a single datagram.
///
/// None of these are fatal: the loop logs them and moves on.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The socket failed to deliver a datagram
    #[error("receive failed: {0}")]
    Receive(#[source] std::io::Error),

    /// The datagram was too short, too long, or had the wrong version
    #[error("malformed packet from {peer}: {source}")]
    Malformed {
        peer: SocketAddr,
        #[source]
        source: ParseError,
    },

    /// A GET reply could not be sent
    #[error("failed to send reply to {peer}: {source}")]
    Send {
        peer: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Owns the request loop for one bound socket.
pub struct DatagramHandler {
    /// The bound socket (shared with the maintenance trigger, which only sends)
    socket: Arc<UdpSocket>,

    /// The address the socket is bound to
    local_addr: SocketAddr,

    /// Receive buffer, sized for the largest packet
    buffer: Box<[u8; MAX_PACKET_LEN]>,

    /// Request routing and the cache itself
    commands: CommandHandler,
}

impl DatagramHandler {
    /// Creates a handler for an already bound socket.
    ///
    /// # Errors
    ///
    /// Fails only if the socket's local address cannot be read.
    pub fn new(socket: Arc<UdpSocket>, commands: CommandHandler) -> std::io::Result<Self> {
        let local_addr = socket.local_addr()?;
        Ok(Self {
            socket,
            local_addr,
            buffer: Box::new([0u8; MAX_PACKET_LEN]),
            commands,
        })
    }

    /// Returns the address the socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the address maintenance sentinels must be sent to.
    pub fn sentinel_target(&self) -> SocketAddr {
        sentinel_target(self.local_addr)
    }

    /// Returns the command handler (and through it, the store and stats).
    pub fn commands(&self) -> &CommandHandler {
        &self.commands
    }

    /// Runs the request loop forever.
    ///
    /// Every error is handled here: a bad datagram or a failed send is
    /// logged and the loop continues; a failed receive is logged and
    /// followed by a short pause.
    pub async fn run(mut self) {
        info!(addr = %self.local_addr, "Request loop started");

        loop {
            match self.process_next().await {
                Ok(Dispatch::Maintenance(report)) => {
                    info!("{}", report);
                    if report.cleanup.removed() > 0 {
                        debug!(
                            expired = report.cleanup.expired,
                            evicted = report.cleanup.evicted,
                            "Maintenance sweep"
                        );
                    }
                }
                Ok(Dispatch::Executed(outcome)) => {
                    trace!(?outcome, "Request handled");
                }
                Err(e @ DispatchError::Receive(_)) => {
                    error!(error = %e, "recvfrom");
                    tokio::time::sleep(RECEIVE_ERROR_BACKOFF).await;
                }
                Err(DispatchError::Malformed { peer, source }) => {
                    error!(client = %peer.ip(), error = %source, "Malformed packet received");
                }
                Err(DispatchError::Send { peer, source }) => {
                    error!(client = %peer.ip(), error = %source, "Sendto failed to send packet");
                }
            }
        }
    }

    /// Receives and handles exactly one datagram.
    pub async fn process_next(&mut self) -> Result<Dispatch, DispatchError> {
        let (len, peer) = self
            .socket
            .recv_from(&mut self.buffer[..])
            .await
            .map_err(DispatchError::Receive)?;

        trace!(client = %peer, bytes = len, "Received datagram");

        if is_sentinel(len, peer, self.local_addr) {
            return Ok(Dispatch::Maintenance(self.commands.maintenance()));
        }

        let packet = parse_packet(&self.buffer[..len])
            .map_err(|source| DispatchError::Malformed { peer, source })?;

        let outcome = self.commands.execute(packet);

        if let Outcome::Reply(reply) = &outcome {
            let bytes = reply.serialize();
            self.socket
                .send_to(&bytes, peer)
                .await
                .map_err(|source| DispatchError::Send { peer, source })?;
            trace!(client = %peer, bytes = bytes.len(), "Sent reply");
        }

        Ok(Dispatch::Executed(outcome))
    }
}
