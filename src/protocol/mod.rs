//! Session Cache Protocol
//!
//! This module implements the fixed-layout binary protocol sessiond speaks
//! over UDP.
//!
//! ## Overview
//!
//! Every datagram carries exactly one packet: a 36-byte header (version,
//! type, timeout, 32-byte key) followed by up to 512 bytes of value. Replies
//! reuse the same layout with the type set to `OK` or `ERR`.
//!
//! ## Modules
//!
//! - `types`: Defines `Packet`, `PacketKind` and serialization
//! - `parser`: Validating decoder for incoming datagrams
//!
//! ## Example
//!
//! ```
//! use sessiond::protocol::{parse_packet, Packet, PacketKind};
//! use bytes::Bytes;
//!
//! // Building a request
//! let request = Packet::request(PacketKind::Get, b"session-id", Bytes::new(), 0).unwrap();
//! let datagram = request.serialize();
//!
//! // Decoding it on the other side
//! let decoded = parse_packet(&datagram).unwrap();
//! assert_eq!(decoded.kind, PacketKind::Get);
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{parse_packet, ParseError, ParseResult};
pub use types::{
    opcode, Packet, PacketError, PacketKind, HEADER_LEN, KEY_LEN, MAX_PACKET_LEN, MAX_VALUE_LEN,
    PROTOCOL_VERSION,
};
