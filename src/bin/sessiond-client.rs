//! sessiond-client - send one request to a sessiond server
//!
//! ```text
//! sessiond-client <HOST> <PORT> <new|get|remove> [KEY] [VALUE] [TIMEOUT]
//! ```
//!
//! Useful for poking a running daemon by hand. Only `get` waits for an
//! answer.

use anyhow::{anyhow, bail, Context};
use bytes::Bytes;
use sessiond::protocol::{parse_packet, Packet, PacketKind, MAX_PACKET_LEN};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time;

const DEFAULT_KEY: &str = "testkey";
const DEFAULT_VALUE: &str = "testvalue";
const DEFAULT_TIMEOUT: u16 = 500;

/// How long `get` waits for the reply
const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

fn usage() -> String {
    "usage: sessiond-client <HOST> <PORT> <new|get|remove> [KEY] [VALUE] [TIMEOUT]".to_string()
}

/// One parsed client invocation.
struct Request {
    host: String,
    port: u16,
    packet: Packet,
}

fn parse_args(args: &[String]) -> anyhow::Result<Request> {
    if args.len() < 3 {
        bail!(usage());
    }

    let host = args[0].clone();
    let port: u16 = args[1]
        .parse()
        .with_context(|| format!("invalid port: {}", args[1]))?;

    let kind = match args[2].to_ascii_lowercase().as_str() {
        "new" => PacketKind::New,
        "get" => PacketKind::Get,
        "remove" => PacketKind::Remove,
        other => bail!("unknown request type: {}\n{}", other, usage()),
    };

    let key = args.get(3).map(String::as_str).unwrap_or(DEFAULT_KEY);
    let value = match kind {
        PacketKind::New => args.get(4).map(String::as_str).unwrap_or(DEFAULT_VALUE),
        _ => "",
    };
    let timeout = match args.get(5) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid timeout: {}", raw))?,
        None => DEFAULT_TIMEOUT,
    };

    let packet = Packet::request(kind, key.as_bytes(), Bytes::copy_from_slice(value.as_bytes()), timeout)?;

    Ok(Request { host, port, packet })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let request = parse_args(&args)?;

    let server = lookup_host((request.host.as_str(), request.port))
        .await
        .with_context(|| format!("failed to resolve {}", request.host))?
        .next()
        .ok_or_else(|| anyhow!("no address found for {}", request.host))?;

    let bind: SocketAddr = if server.is_ipv6() {
        "[::]:0".parse()?
    } else {
        "0.0.0.0:0".parse()?
    };
    let socket = UdpSocket::bind(bind).await.context("failed to bind client socket")?;

    let datagram = request.packet.serialize();
    socket
        .send_to(&datagram, server)
        .await
        .with_context(|| format!("failed to send to {}", server))?;
    println!("sent {} ({} bytes) to {}", request.packet, datagram.len(), server);

    if request.packet.kind != PacketKind::Get {
        return Ok(());
    }

    let mut buf = [0u8; MAX_PACKET_LEN];
    let (len, _) = time::timeout(REPLY_TIMEOUT, socket.recv_from(&mut buf))
        .await
        .map_err(|_| anyhow!("no reply within {:?}", REPLY_TIMEOUT))?
        .context("failed to receive reply")?;

    let reply = parse_packet(&buf[..len]).context("malformed reply")?;
    println!("type:  {}", reply.kind);
    println!("key:   {}", String::from_utf8_lossy(reply.key_bytes()).trim_end_matches('\0'));
    println!("value: {}", String::from_utf8_lossy(&reply.value));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let request = parse_args(&args(&["localhost", "54321", "new"])).unwrap();
        assert_eq!(request.port, 54321);
        assert_eq!(request.packet.kind, PacketKind::New);
        assert_eq!(&request.packet.key[..7], b"testkey");
        assert_eq!(request.packet.value, Bytes::from("testvalue"));
        assert_eq!(request.packet.timeout, 500);
    }

    #[test]
    fn test_get_carries_no_value() {
        let request = parse_args(&args(&["localhost", "54321", "get", "abc", "ignored"])).unwrap();
        assert_eq!(request.packet.kind, PacketKind::Get);
        assert!(request.packet.value.is_empty());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(parse_args(&args(&["localhost", "54321"])).is_err());
        assert!(parse_args(&args(&["localhost", "port", "get"])).is_err());
        assert!(parse_args(&args(&["localhost", "54321", "flush"])).is_err());
        let long_key = "k".repeat(33);
        assert!(parse_args(&args(&["localhost", "54321", "get", &long_key])).is_err());
    }
}
