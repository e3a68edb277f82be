//! Error types for vikiprint-core

use std::fmt;

use crate::command::Command;

/// Result type alias for vikiprint-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// What was wrong with the envelope of a rejected packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketFault {
    /// Fewer bytes than the smallest valid packet
    TooShort { expected: usize, actual: usize },

    /// First byte is not STX
    MissingStart,

    /// Packet id byte is wrong
    BadPacketId(u8),

    /// Request password does not match
    BadPassword,

    /// Third-from-last byte is not ETX
    MissingEnd,

    /// Command or error code is not two hex digits
    BadHexDigits,
}

impl fmt::Display for PacketFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { expected, actual } => {
                write!(f, "expected at least {expected} bytes, got {actual}")
            }
            Self::MissingStart => write!(f, "missing start marker"),
            Self::BadPacketId(id) => write!(f, "unexpected packet id 0x{id:02X}"),
            Self::BadPassword => write!(f, "wrong password"),
            Self::MissingEnd => write!(f, "missing end marker"),
            Self::BadHexDigits => write!(f, "non-hex command or error code"),
        }
    }
}

/// Core protocol errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Packet envelope is malformed
    #[error("Invalid packet: {0}")]
    InvalidPacket(PacketFault),

    /// Checksum verification failed
    #[error("Invalid checksum: expected {expected:02X}, received {received:?}")]
    ChecksumMismatch {
        expected: u8,
        received: String,
    },

    /// Unknown command code
    #[error("Unknown command code: 0x{0:02X}")]
    UnknownCommand(u8),

    /// A recognized reply whose fields do not parse
    #[error("Malformed {command} response payload: {reason}")]
    MalformedPayload {
        command: Command,
        reason: String,
    },
}

impl Error {
    /// Check if the error came from the packet envelope or checksum
    ///
    /// These are reported as invalid data and never reach a caller.
    pub fn is_framing(&self) -> bool {
        matches!(self, Self::InvalidPacket(_) | Self::ChecksumMismatch { .. })
    }

    pub(crate) fn malformed(command: Command, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            command,
            reason: reason.into(),
        }
    }
}
