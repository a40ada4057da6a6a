//! Command Handler
//!
//! Routes decoded packets to the cache store and keeps the request
//! counters. This layer knows nothing about sockets: it takes a [`Packet`]
//! and says what happened, including the reply to send, if any.
//!
//! ## Routing
//!
//! | Type     | Store call            | Reply                          |
//! |----------|-----------------------|--------------------------------|
//! | `NEW`    | `insert(key, value)`  | none                           |
//! | `GET`    | `find(key)`           | `OK` + value, or `ERR` (empty) |
//! | `REMOVE` | `remove(key)`         | none                           |
//! | other    | none                  | none, not counted              |

use crate::maintenance::{StatsAggregator, StatsReport};
use crate::protocol::{Packet, PacketKind};
use crate::storage::{current_timestamp, CacheStore};
use bytes::Bytes;
use tracing::trace;

/// The result of executing one packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A NEW request; `created` is false when the key was already cached or
    /// the new entry was evicted at once to honor the size cap
    Stored { created: bool },
    /// A GET request and the reply to send back
    Reply(Packet),
    /// A REMOVE request; `removed` is false when the key was absent
    Removed { removed: bool },
    /// A type the server does not serve; dropped without counting
    Ignored(PacketKind),
}

/// Executes cache requests against an owned store.
///
/// The handler owns the store and the counters outright. It is driven by a
/// single request loop, so none of its state is shared or locked.
#[derive(Debug)]
pub struct CommandHandler {
    /// The cache store
    store: CacheStore,
    /// Request counters for the periodic report
    stats: StatsAggregator,
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new(CacheStore::new())
    }
}

impl CommandHandler {
    /// Creates a command handler around the given store.
    pub fn new(store: CacheStore) -> Self {
        Self {
            store,
            stats: StatsAggregator::new(current_timestamp()),
        }
    }

    /// Creates a command handler whose statistics clock starts at `now`.
    pub fn with_start_time(store: CacheStore, now: u64) -> Self {
        Self {
            store,
            stats: StatsAggregator::new(now),
        }
    }

    /// Executes a packet using the current time.
    pub fn execute(&mut self, packet: Packet) -> Outcome {
        self.execute_at(packet, current_timestamp())
    }

    /// Executes a packet as of `now` (unix seconds).
    pub fn execute_at(&mut self, packet: Packet, now: u64) -> Outcome {
        match packet.kind {
            PacketKind::New => self.handle_new(packet, now),
            PacketKind::Get => self.handle_get(packet),
            PacketKind::Remove => self.handle_remove(packet),
            other => {
                trace!(kind = %other, "Ignoring non-request packet");
                Outcome::Ignored(other)
            }
        }
    }

    /// NEW: store the value unless the key is already cached.
    fn handle_new(&mut self, packet: Packet, now: u64) -> Outcome {
        self.stats.record_transaction();
        let key = Bytes::copy_from_slice(packet.key_bytes());
        let created = self
            .store
            .insert_at(key, packet.value, u64::from(packet.timeout), now);
        trace!(created, timeout = packet.timeout, "NEW");
        Outcome::Stored { created }
    }

    /// GET: answer with `OK` and the value, or `ERR` and nothing.
    fn handle_get(&mut self, packet: Packet) -> Outcome {
        self.stats.record_transaction();
        let reply = match self.store.find(packet.key_bytes()) {
            Some(value) => {
                self.stats.record_hit();
                packet.reply(PacketKind::Ok, value)
            }
            None => {
                self.stats.record_miss();
                packet.reply(PacketKind::Err, Bytes::new())
            }
        };
        trace!(hit = reply.kind == PacketKind::Ok, "GET");
        Outcome::Reply(reply)
    }

    /// REMOVE: drop the key if present.
    fn handle_remove(&mut self, packet: Packet) -> Outcome {
        self.stats.record_transaction();
        let removed = self.store.remove(packet.key_bytes());
        trace!(removed, "REMOVE");
        Outcome::Removed { removed }
    }

    /// Runs maintenance using the current time.
    pub fn maintenance(&mut self) -> StatsReport {
        self.maintenance_at(current_timestamp())
    }

    /// Sweeps the store and produces the periodic stats report.
    pub fn maintenance_at(&mut self, now: u64) -> StatsReport {
        self.stats.report(&mut self.store, now)
    }

    /// Returns a reference to the cache store.
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Returns a reference to the request counters.
    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }
}
