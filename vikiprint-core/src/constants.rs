//! Protocol constants

/// Start of a framed packet
pub const STX: u8 = 0x02;

/// End of the framed part of a packet (followed by the checksum digits)
pub const ETX: u8 = 0x03;

/// Link check, sent raw outside any frame
pub const ENQ: u8 = 0x05;

/// Bare acknowledgement answering [`ENQ`]
pub const ACK: u8 = 0x06;

/// Paper feed, sent raw outside any frame
pub const LF: u8 = 0x0A;

/// Field separator inside payloads
pub const FS: u8 = 0x1C;

/// Fixed access password carried by every request
pub const PASSWORD: &[u8; 4] = b"PIRI";

/// Packet number; constant because the exchange is synchronous
pub const PACKET_ID: u8 = 0x21;

/// Default time to wait for a reply (milliseconds)
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 5000;

/// Quiet period that ends a burst of incoming bytes (milliseconds)
pub const DEFAULT_BURST_IDLE_MS: u64 = 20;
