//! Maintenance Trigger
//!
//! sessiond does its housekeeping (expiry sweep, size enforcement, stats
//! line) inside the request loop, so the store never needs a lock. This
//! module supplies the wake-ups: a background task that periodically sends
//! a zero-length datagram from the server's own socket to the server's own
//! address. The request loop recognizes that sentinel and runs maintenance
//! as if it were just another request.
//!
//! ```text
//!   ┌────────────────────┐  empty datagram  ┌──────────────────────────┐
//!   │ MaintenanceTrigger │ ───────────────> │ UDP socket receive queue │
//!   │ (tokio task)       │                  └────────────┬─────────────┘
//!   └────────────────────┘                               │
//!                                                        ▼
//!                                     DatagramHandler (cleanup + stats)
//! ```
//!
//! The trigger never touches the cache. On Unix, `SIGUSR1` sends one extra
//! sentinel immediately.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

/// How often maintenance runs by default (5 minutes).
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(300);

/// Configuration for the maintenance trigger.
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    /// Time between sentinels
    pub interval: Duration,

    /// Also send a sentinel on `SIGUSR1` (Unix only)
    pub on_user_signal: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_REPORT_INTERVAL,
            on_user_signal: true,
        }
    }
}

/// Returns the address sentinels should be sent to for a socket bound at
/// `local`.
///
/// A wildcard bind is reached through the loopback address of the same
/// family; a concrete bind is reached at that address.
pub fn sentinel_target(local: SocketAddr) -> SocketAddr {
    let ip = match local.ip() {
        IpAddr::V4(v4) if v4.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(v6) if v6.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, local.port())
}

/// Returns true if a datagram of `len` bytes from `peer` is a maintenance
/// sentinel for a socket bound at `local`.
///
/// The datagram must be empty and come from the server's own port, either
/// over loopback or from the server's own bound address.
pub fn is_sentinel(len: usize, peer: SocketAddr, local: SocketAddr) -> bool {
    if len != 0 || peer.port() != local.port() {
        return false;
    }
    let ip = peer.ip().to_canonical();
    ip.is_loopback() || ip == local.ip().to_canonical()
}

/// A handle to the running maintenance trigger.
///
/// When this handle is dropped, the trigger task will be stopped.
#[derive(Debug)]
pub struct MaintenanceTrigger {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
}

impl MaintenanceTrigger {
    /// Starts the trigger as a background task.
    ///
    /// # Arguments
    ///
    /// * `socket` - The server's bound socket; sentinels are sent from it so
    ///   they carry the server's own port
    /// * `target` - Where to send them, usually [`sentinel_target`] of the
    ///   socket's local address
    /// * `config` - Interval and signal settings
    ///
    /// # Example
    ///
    /// ```ignore
    /// let socket = Arc::new(UdpSocket::bind("0.0.0.0:54321").await?);
    /// let target = sentinel_target(socket.local_addr()?);
    /// let trigger = MaintenanceTrigger::start(Arc::clone(&socket), target, TriggerConfig::default());
    ///
    /// // Dropping the handle stops the wake-ups
    /// drop(trigger);
    /// ```
    pub fn start(socket: Arc<UdpSocket>, target: SocketAddr, config: TriggerConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            interval_secs = config.interval.as_secs_f64(),
            target = %target,
            "Maintenance trigger started"
        );

        tokio::spawn(trigger_loop(socket, target, config, shutdown_rx));

        Self { shutdown_tx }
    }

    /// Stops the trigger.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if self.shutdown_tx.send(true).is_ok() {
            debug!("Maintenance trigger stopped");
        }
    }
}

impl Drop for MaintenanceTrigger {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main trigger loop.
async fn trigger_loop(
    socket: Arc<UdpSocket>,
    target: SocketAddr,
    config: TriggerConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let Some(start) = Instant::now().checked_add(config.interval) else {
        error!(
            interval_secs = config.interval.as_secs_f64(),
            "Maintenance interval out of range, trigger not running"
        );
        return;
    };
    let mut ticker = time::interval_at(start, config.interval);
    // After a stall, resume the cadence instead of firing a burst
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut user_signal = UserSignal::new(config.on_user_signal);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = user_signal.recv() => {
                debug!("SIGUSR1 received, requesting maintenance");
            }
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Maintenance trigger received shutdown signal");
                    return;
                }
                continue;
            }
        }

        send_sentinel(&socket, target).await;
    }
}

/// Sends one empty datagram to `target`.
async fn send_sentinel(socket: &UdpSocket, target: SocketAddr) {
    match socket.send_to(&[], target).await {
        Ok(_) => trace!(target = %target, "Sent maintenance sentinel"),
        Err(e) => error!(target = %target, error = %e, "Failed to send maintenance sentinel"),
    }
}

#[cfg(unix)]
struct UserSignal(Option<tokio::signal::unix::Signal>);

#[cfg(unix)]
impl UserSignal {
    fn new(enabled: bool) -> Self {
        use tokio::signal::unix::{signal, SignalKind};

        if !enabled {
            return Self(None);
        }
        match signal(SignalKind::user_defined1()) {
            Ok(sig) => Self(Some(sig)),
            Err(e) => {
                warn!(error = %e, "Failed to install SIGUSR1 handler");
                Self(None)
            }
        }
    }

    /// Resolves on the next `SIGUSR1`; never resolves when disabled.
    async fn recv(&mut self) {
        if let Some(sig) = self.0.as_mut() {
            if sig.recv().await.is_some() {
                return;
            }
            self.0 = None;
        }
        std::future::pending::<()>().await
    }
}

#[cfg(not(unix))]
struct UserSignal;

#[cfg(not(unix))]
impl UserSignal {
    fn new(_enabled: bool) -> Self {
        Self
    }

    async fn recv(&mut self) {
        std::future::pending::<()>().await
    }
}
