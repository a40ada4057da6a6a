//! Cache Packet Parser
//!
//! Decodes one datagram into a [`Packet`]. Each datagram carries exactly one
//! packet, so there is no framing and no partial-read state: a datagram is
//! either a complete, well-formed packet or it is malformed.
//!
//! ## Validation
//!
//! 1. The datagram must hold at least the 36-byte header.
//! 2. The version byte must be `1`.
//! 3. The value (everything after the header) must fit in 512 bytes.
//!
//! The type byte is not validated here. Unknown types decode as
//! [`PacketKind::Unknown`] and are left for the dispatcher to drop.

use crate::protocol::types::{
    Packet, PacketKind, HEADER_LEN, KEY_LEN, MAX_PACKET_LEN, MAX_VALUE_LEN, PROTOCOL_VERSION,
};
use bytes::{Buf, Bytes};
use thiserror::Error;

/// Errors that make a datagram malformed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The datagram is shorter than the fixed header
    #[error("packet too short: {len} bytes (min: {min})")]
    TooShort { len: usize, min: usize },

    /// The version byte is not one we speak
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// The datagram is longer than the largest packet
    #[error("packet too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Decodes a datagram into a packet.
///
/// The timeout is read in network byte order. The value is exactly the
/// bytes received beyond the header; nothing is padded.
///
/// # Example
///
/// ```
/// use sessiond::protocol::{parse_packet, PacketKind};
///
/// let mut datagram = vec![1u8, 0x01, 0x00, 0x00];
/// datagram.extend_from_slice(&[b'k'; 32]);
///
/// let packet = parse_packet(&datagram).unwrap();
/// assert_eq!(packet.kind, PacketKind::Get);
/// assert!(packet.value.is_empty());
/// ```
pub fn parse_packet(datagram: &[u8]) -> ParseResult<Packet> {
    if datagram.len() < HEADER_LEN {
        return Err(ParseError::TooShort {
            len: datagram.len(),
            min: HEADER_LEN,
        });
    }

    if datagram.len() > MAX_PACKET_LEN {
        return Err(ParseError::TooLarge {
            size: datagram.len(),
            max: MAX_PACKET_LEN,
        });
    }

    let mut buf = datagram;

    let version = buf.get_u8();
    if version != PROTOCOL_VERSION {
        return Err(ParseError::UnsupportedVersion(version));
    }

    let kind = PacketKind::from_byte(buf.get_u8());
    let timeout = buf.get_u16();

    let mut key = [0u8; KEY_LEN];
    buf.copy_to_slice(&mut key);

    debug_assert!(buf.len() <= MAX_VALUE_LEN);
    let value = Bytes::copy_from_slice(buf);

    Ok(Packet {
        version,
        kind,
        timeout,
        key,
        value,
    })
}
