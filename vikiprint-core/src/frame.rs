//! Pirit protocol frame structure and encoding/decoding

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    checksum,
    command::Command,
    constants::{ETX, PACKET_ID, PASSWORD, STX},
    error::{Error, PacketFault, Result},
    text,
};

/// One protocol frame
///
/// # Frame Structure
///
/// Requests (host to register) carry the password, replies (register to
/// host) carry an error code instead:
///
/// ```text
/// request:
/// ┌─────┬──────────┬────┬─────────┬─────────┬─────┬─────────┐
/// │ STX │ PASSWORD │ ID │ COMMAND │ PAYLOAD │ ETX │   CRC   │
/// │  1  │    4     │ 1  │ 2 (hex) │    N    │  1  │ 2 (hex) │
/// └─────┴──────────┴────┴─────────┴─────────┴─────┴─────────┘
/// reply:
/// ┌─────┬────┬─────────┬─────────┬─────────┬─────┬─────────┐
/// │ STX │ ID │ COMMAND │  ERROR  │ PAYLOAD │ ETX │   CRC   │
/// │  1  │ 1  │ 2 (hex) │ 2 (hex) │    N    │  1  │ 2 (hex) │
/// └─────┴────┴─────────┴─────────┴─────────┴─────┴─────────┘
/// ```
///
/// The checksum covers everything between STX and the checksum itself,
/// ETX included.
///
/// # Examples
///
/// ```
/// use vikiprint_core::{Command, Frame};
///
/// let frame = Frame::request(Command::StatusFlags, Vec::new());
/// let encoded = frame.encode();
/// assert_eq!(&encoded[..], b"\x02PIRI!00\x0320");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw command code; may be outside [`Command`] for replies
    pub command: u8,

    /// Error code reported by the register (0 on success, always 0 in requests)
    pub error_code: u8,

    /// FS-separated CP866 fields
    pub payload: Bytes,
}

impl Frame {
    /// Smallest valid reply: STX, ID, command, error, ETX, CRC
    pub const MIN_REPLY_SIZE: usize = 9;

    /// Smallest valid request: STX, password, ID, command, ETX, CRC
    pub const MIN_REQUEST_SIZE: usize = 11;

    /// Create a request frame
    pub fn request(command: Command, payload: impl Into<Bytes>) -> Self {
        Self {
            command: command.into(),
            error_code: 0,
            payload: payload.into(),
        }
    }

    /// Create a reply frame, as the register would send it
    pub fn reply(command: u8, error_code: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            command,
            error_code,
            payload: payload.into(),
        }
    }

    /// Look up the command code
    pub fn command(&self) -> Result<Command> {
        Command::try_from(self.command)
    }

    /// Check if the register reported an error
    pub fn is_error(&self) -> bool {
        self.error_code != 0
    }

    /// Payload decoded from CP866
    pub fn text(&self) -> String {
        text::decode(&self.payload)
    }

    /// Encode as a request (host to register)
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(Self::MIN_REQUEST_SIZE + self.payload.len());

        buf.put_u8(STX);
        buf.put_slice(PASSWORD);
        buf.put_u8(PACKET_ID);
        buf.put_slice(&hex_digits(self.command));
        buf.put_slice(&self.payload);
        buf.put_u8(ETX);

        let crc = checksum::calculate(&buf[1..]);
        buf.put_slice(&checksum::to_digits(crc));

        buf
    }

    /// Encode as a reply (register to host)
    pub fn encode_reply(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(Self::MIN_REPLY_SIZE + self.payload.len());

        buf.put_u8(STX);
        buf.put_u8(PACKET_ID);
        buf.put_slice(&hex_digits(self.command));
        buf.put_slice(&hex_digits(self.error_code));
        buf.put_slice(&self.payload);
        buf.put_u8(ETX);

        let crc = checksum::calculate(&buf[1..]);
        buf.put_slice(&checksum::to_digits(crc));

        buf
    }

    /// Decode a reply received from the register
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Buffer is shorter than [`Frame::MIN_REPLY_SIZE`]
    /// - Start marker, packet id or end marker is misplaced
    /// - Checksum verification fails
    /// - Command or error code is not hex
    ///
    /// # Examples
    ///
    /// ```
    /// use vikiprint_core::Frame;
    ///
    /// let original = Frame::reply(0x42, 0, &b"1.5\x1c"[..]);
    /// let decoded = Frame::decode(&original.encode_reply()).unwrap();
    ///
    /// assert_eq!(original, decoded);
    /// ```
    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_envelope(buf, Self::MIN_REPLY_SIZE, 1)?;

        let end = buf.len() - 3;
        let command = parse_hex(&buf[2..4])?;
        let error_code = parse_hex(&buf[4..6])?;

        Ok(Self {
            command,
            error_code,
            payload: Bytes::copy_from_slice(&buf[6..end]),
        })
    }

    /// Decode a request, as the register would receive it
    pub fn decode_request(buf: &[u8]) -> Result<Self> {
        check_envelope(buf, Self::MIN_REQUEST_SIZE, 5)?;

        if &buf[1..5] != PASSWORD {
            return Err(Error::InvalidPacket(PacketFault::BadPassword));
        }

        let end = buf.len() - 3;
        let command = parse_hex(&buf[6..8])?;

        Ok(Self {
            command,
            error_code: 0,
            payload: Bytes::copy_from_slice(&buf[8..end]),
        })
    }

    /// Size on the wire when encoded as a request
    pub fn request_size(&self) -> usize {
        Self::MIN_REQUEST_SIZE + self.payload.len()
    }
}

/// Markers, packet id and checksum shared by both directions
fn check_envelope(buf: &[u8], min_size: usize, id_pos: usize) -> Result<()> {
    if buf.len() < min_size {
        return Err(Error::InvalidPacket(PacketFault::TooShort {
            expected: min_size,
            actual: buf.len(),
        }));
    }

    let end = buf.len() - 3;

    if buf[0] != STX {
        return Err(Error::InvalidPacket(PacketFault::MissingStart));
    }
    if buf[id_pos] != PACKET_ID {
        return Err(Error::InvalidPacket(PacketFault::BadPacketId(buf[id_pos])));
    }
    if buf[end] != ETX {
        return Err(Error::InvalidPacket(PacketFault::MissingEnd));
    }

    let covered = &buf[1..=end];
    let received = &buf[end + 1..];
    if !checksum::verify(covered, received) {
        return Err(Error::ChecksumMismatch {
            expected: checksum::calculate(covered),
            received: String::from_utf8_lossy(received).into_owned(),
        });
    }

    Ok(())
}

fn hex_digits(value: u8) -> [u8; 2] {
    checksum::to_digits(value)
}

fn parse_hex(digits: &[u8]) -> Result<u8> {
    match hex::decode(digits) {
        Ok(bytes) if bytes.len() == 1 => Ok(bytes[0]),
        _ => Err(Error::InvalidPacket(PacketFault::BadHexDigits)),
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("command", &format!("0x{:02X}", self.command))
            .field("error_code", &format!("0x{:02X}", self.error_code))
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.command() {
            Ok(command) => write!(f, "Frame[{}]", command)?,
            Err(_) => write!(f, "Frame[0x{:02X}]", self.command)?,
        }
        write!(f, "(error={}, len={})", self.error_code, self.payload.len())
    }
}
