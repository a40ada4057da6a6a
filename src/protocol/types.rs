//! Session Cache Packet Types
//!
//! This module defines the single fixed-layout packet that travels in both
//! directions between clients and sessiond.
//!
//! ## Packet Layout
//!
//! ```text
//!  0         1         2                   4                            36
//!  ┌─────────┬─────────┬───────────────────┬────────────────────────────┬──────────────┐
//!  │ version │  type   │ timeout (u16, BE) │ key (32 bytes, fixed)      │ value 0..512 │
//!  └─────────┴─────────┴───────────────────┴────────────────────────────┴──────────────┘
//! ```
//!
//! The key is always 32 bytes and every byte is significant, including any
//! trailing padding. The value has no length prefix: it is whatever follows
//! the header in the datagram.

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use thiserror::Error;

/// The only protocol version sessiond speaks.
pub const PROTOCOL_VERSION: u8 = 1;

/// Length of the fixed key field.
pub const KEY_LEN: usize = 32;

/// Largest value carried by a packet.
pub const MAX_VALUE_LEN: usize = 512;

/// Size of a packet with an empty value.
pub const HEADER_LEN: usize = 4 + KEY_LEN;

/// Size of the largest possible packet.
pub const MAX_PACKET_LEN: usize = HEADER_LEN + MAX_VALUE_LEN;

/// Raw values of the `type` byte
pub mod opcode {
    pub const NEW: u8 = 0x00;
    pub const GET: u8 = 0x01;
    pub const REMOVE: u8 = 0x02;
    pub const ERR: u8 = 0x80;
    pub const OK: u8 = 0x81;
}

/// The `type` field of a packet.
///
/// Requests use `New`, `Get` and `Remove`; replies reuse the same field
/// with `Err` or `Ok`. Anything else is preserved as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// Store a session (no reply)
    New,
    /// Fetch a session (always answered when well-formed)
    Get,
    /// Drop a session (no reply)
    Remove,
    /// Reply to a GET that missed
    Err,
    /// Reply to a GET that hit
    Ok,
    /// Any other type byte
    Unknown(u8),
}

impl PacketKind {
    /// Decodes a type byte.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            opcode::NEW => PacketKind::New,
            opcode::GET => PacketKind::Get,
            opcode::REMOVE => PacketKind::Remove,
            opcode::ERR => PacketKind::Err,
            opcode::OK => PacketKind::Ok,
            other => PacketKind::Unknown(other),
        }
    }

    /// Encodes this kind as a type byte.
    pub fn as_byte(self) -> u8 {
        match self {
            PacketKind::New => opcode::NEW,
            PacketKind::Get => opcode::GET,
            PacketKind::Remove => opcode::REMOVE,
            PacketKind::Err => opcode::ERR,
            PacketKind::Ok => opcode::OK,
            PacketKind::Unknown(byte) => byte,
        }
    }

    /// Returns true for the three request kinds the server acts on.
    pub fn is_request(self) -> bool {
        matches!(self, PacketKind::New | PacketKind::Get | PacketKind::Remove)
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketKind::New => write!(f, "NEW"),
            PacketKind::Get => write!(f, "GET"),
            PacketKind::Remove => write!(f, "REMOVE"),
            PacketKind::Err => write!(f, "ERR"),
            PacketKind::Ok => write!(f, "OK"),
            PacketKind::Unknown(byte) => write!(f, "UNKNOWN({:#04x})", byte),
        }
    }
}

/// Errors from building a request that would not fit the packet layout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// The key does not fit the fixed key field
    #[error("key too long: {len} bytes (max: {max})")]
    KeyTooLong { len: usize, max: usize },

    /// The value exceeds the value field
    #[error("value too large: {size} bytes (max: {max})")]
    ValueTooLarge { size: usize, max: usize },
}

/// A decoded cache packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Protocol version; decoded packets always carry [`PROTOCOL_VERSION`]
    pub version: u8,
    /// Request or reply type
    pub kind: PacketKind,
    /// Requested lifetime in seconds (meaningful for NEW only)
    pub timeout: u16,
    /// The fixed-width session key
    pub key: [u8; KEY_LEN],
    /// The session blob, at most [`MAX_VALUE_LEN`] bytes
    pub value: Bytes,
}

impl Packet {
    /// Builds a request packet.
    ///
    /// Keys shorter than [`KEY_LEN`] are padded with zero bytes.
    ///
    /// # Example
    /// ```
    /// use sessiond::protocol::{Packet, PacketKind};
    /// use bytes::Bytes;
    ///
    /// let packet = Packet::request(PacketKind::New, b"testkey", Bytes::from("testvalue"), 500).unwrap();
    /// assert_eq!(packet.serialize().len(), 36 + 9);
    /// ```
    pub fn request(
        kind: PacketKind,
        key: &[u8],
        value: impl Into<Bytes>,
        timeout: u16,
    ) -> Result<Self, PacketError> {
        if key.len() > KEY_LEN {
            return Err(PacketError::KeyTooLong {
                len: key.len(),
                max: KEY_LEN,
            });
        }

        let value = value.into();
        if value.len() > MAX_VALUE_LEN {
            return Err(PacketError::ValueTooLarge {
                size: value.len(),
                max: MAX_VALUE_LEN,
            });
        }

        let mut padded = [0u8; KEY_LEN];
        padded[..key.len()].copy_from_slice(key);

        Ok(Self {
            version: PROTOCOL_VERSION,
            kind,
            timeout,
            key: padded,
            value,
        })
    }

    /// Builds the reply to this request.
    ///
    /// Version, timeout and key are echoed back; only the type and the
    /// value change.
    pub fn reply(&self, kind: PacketKind, value: Bytes) -> Self {
        debug_assert!(value.len() <= MAX_VALUE_LEN);
        Self {
            version: self.version,
            kind,
            timeout: self.timeout,
            key: self.key,
            value,
        }
    }

    /// Returns the key as a byte slice.
    pub fn key_bytes(&self) -> &[u8] {
        &self.key
    }

    /// Returns the size of this packet on the wire.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.value.len()
    }

    /// Serializes this packet.
    ///
    /// Only the bytes actually used are produced: a reply with an empty
    /// value is exactly [`HEADER_LEN`] bytes long.
    pub fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.serialize_into(&mut buf);
        buf.freeze()
    }

    /// Serializes this packet into an existing buffer.
    pub fn serialize_into(&self, buf: &mut BytesMut) {
        buf.put_u8(self.version);
        buf.put_u8(self.kind.as_byte());
        buf.put_u16(self.timeout);
        buf.put_slice(&self.key);
        buf.put_slice(&self.value);
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key_end = self
            .key
            .iter()
            .rposition(|&b| b != 0)
            .map(|i| i + 1)
            .unwrap_or(0);
        write!(
            f,
            "{} key={:?} timeout={} value_len={}",
            self.kind,
            String::from_utf8_lossy(&self.key[..key_end]),
            self.timeout,
            self.value.len()
        )
    }
}
