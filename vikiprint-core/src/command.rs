//! Pirit protocol command definitions

use std::fmt;

use crate::error::{Error, Result};

/// Protocol command codes
///
/// Each code travels on the wire as two uppercase hex digits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    // Status requests
    StatusFlags = 0x00,
    ErrorInfo = 0x06,

    // Shift management
    StartWork = 0x10,
    XReport = 0x20,
    CloseShift = 0x21,
    OpenShift = 0x23,

    // Documents
    OpenDocument = 0x30,
    CloseDocument = 0x31,
    AnnulateDocument = 0x32,
    PrintText = 0x40,
    AddItem = 0x42,
    Subtotal = 0x44,
    Discount = 0x45,
    Payment = 0x47,

    // Printing
    PrintArchivedDocument = 0x73,
    PrintServiceData = 0x94,
}

impl Command {
    /// Get command name
    pub fn name(self) -> &'static str {
        match self {
            Self::StatusFlags => "STATUS_FLAGS",
            Self::ErrorInfo => "ERROR_INFO",
            Self::StartWork => "START_WORK",
            Self::XReport => "X_REPORT",
            Self::CloseShift => "CLOSE_SHIFT",
            Self::OpenShift => "OPEN_SHIFT",
            Self::OpenDocument => "OPEN_DOCUMENT",
            Self::CloseDocument => "CLOSE_DOCUMENT",
            Self::AnnulateDocument => "ANNULATE_DOCUMENT",
            Self::PrintText => "PRINT_TEXT",
            Self::AddItem => "ADD_ITEM",
            Self::Subtotal => "SUBTOTAL",
            Self::Discount => "DISCOUNT",
            Self::Payment => "PAYMENT",
            Self::PrintArchivedDocument => "PRINT_ARCHIVED_DOCUMENT",
            Self::PrintServiceData => "PRINT_SERVICE_DATA",
        }
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> u8 {
        cmd as u8
    }
}

impl TryFrom<u8> for Command {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(Self::StatusFlags),
            0x06 => Ok(Self::ErrorInfo),
            0x10 => Ok(Self::StartWork),
            0x20 => Ok(Self::XReport),
            0x21 => Ok(Self::CloseShift),
            0x23 => Ok(Self::OpenShift),
            0x30 => Ok(Self::OpenDocument),
            0x31 => Ok(Self::CloseDocument),
            0x32 => Ok(Self::AnnulateDocument),
            0x40 => Ok(Self::PrintText),
            0x42 => Ok(Self::AddItem),
            0x44 => Ok(Self::Subtotal),
            0x45 => Ok(Self::Discount),
            0x47 => Ok(Self::Payment),
            0x73 => Ok(Self::PrintArchivedDocument),
            0x94 => Ok(Self::PrintServiceData),
            _ => Err(Error::UnknownCommand(value)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}
