//! Register status words (command 0x00)

use std::fmt;

use bitflags::bitflags;

use crate::document::DocumentType;
use crate::error::{Error, Result};

bitflags! {
    /// Fatal status bits
    ///
    /// Bits not named here are reserved by the firmware; they are kept as-is.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FatalFlags: u32 {
        /// NVR checksum is wrong
        const NVR_CHECKSUM = 1 << 0;
        /// Configuration checksum is wrong
        const CONFIG_CHECKSUM = 1 << 1;
        /// Fiscal storage (FN) does not answer
        const FN_UNREACHABLE = 1 << 2;
        /// Register is not authorized
        const NOT_AUTHORIZED = 1 << 5;
        /// Fatal fiscal storage error
        const FN_FATAL = 1 << 6;
        /// SD card missing or broken
        const SD_CARD = 1 << 8;
    }
}

bitflags! {
    /// Current status bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusFlags: u32 {
        /// "Start work" (0x10) has not been sent since power-up
        const START_WORK_PENDING = 1 << 0;
        const NON_FISCAL = 1 << 1;
        const SHIFT_OPEN = 1 << 2;
        const SHIFT_OVER_24H = 1 << 3;
        const FN_ARCHIVE_CLOSED = 1 << 4;
        const FN_NOT_REGISTERED = 1 << 5;
        /// Previous shift close did not finish and must be repeated
        const SHIFT_CLOSE_INCOMPLETE = 1 << 8;
        const JOURNAL_ERROR = 1 << 9;
    }
}

/// Stage of the currently open document (high nibble of the document status)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DocumentState {
    Closed = 0,
    /// Set by "open document"; items may be added to sale and return receipts
    Opened = 1,
    /// After the first subtotal
    Subtotal = 2,
    /// After the second subtotal or once payment has started
    Payment = 3,
    /// Settlement complete, the document must be closed
    SettlementDone = 4,
    /// Closed in the fiscal storage but not fully printed; close again
    ClosedNotPrinted = 8,
}

impl TryFrom<u8> for DocumentState {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Closed),
            1 => Ok(Self::Opened),
            2 => Ok(Self::Subtotal),
            3 => Ok(Self::Payment),
            4 => Ok(Self::SettlementDone),
            8 => Ok(Self::ClosedNotPrinted),
            _ => Err(Error::Parse(format!("unknown document state: {value}"))),
        }
    }
}

/// Decoded document status byte
///
/// The low nibble is the document type (0 when no document is open), the
/// high nibble is the [`DocumentState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentStatus {
    pub kind: Option<DocumentType>,
    pub state: DocumentState,
}

impl DocumentStatus {
    /// Split the raw status value into its two nibbles
    ///
    /// # Examples
    ///
    /// ```
    /// use vikiprint_types::{DocumentState, DocumentStatus, DocumentType};
    ///
    /// let status = DocumentStatus::from_raw(0x12).unwrap();
    /// assert_eq!(status.kind, Some(DocumentType::Income));
    /// assert_eq!(status.state, DocumentState::Opened);
    /// ```
    pub fn from_raw(raw: u32) -> Result<Self> {
        if raw > 0xFF {
            return Err(Error::Validation(format!(
                "document status out of range: {raw}"
            )));
        }

        let kind = match (raw & 0x0F) as u8 {
            0 => None,
            code => Some(DocumentType::try_from(code)?),
        };
        let state = DocumentState::try_from((raw >> 4) as u8)?;

        Ok(Self { kind, state })
    }

    pub fn is_open(&self) -> bool {
        self.state != DocumentState::Closed
    }
}

/// Reply to the status flags request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusReport {
    pub fatal: FatalFlags,
    pub flags: StatusFlags,
    pub document: DocumentStatus,
}

impl StatusReport {
    pub fn has_fatal_errors(&self) -> bool {
        !self.fatal.is_empty()
    }

    pub fn is_shift_open(&self) -> bool {
        self.flags.contains(StatusFlags::SHIFT_OPEN)
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Status[fatal: 0x{:X}, flags: 0x{:X}, document: {:?}/{:?}]",
            self.fatal.bits(),
            self.flags.bits(),
            self.document.kind,
            self.document.state
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_document_status_closed_sale() {
        let status = DocumentStatus::from_raw(2).unwrap();
        assert_eq!(status.kind, Some(DocumentType::Income));
        assert_eq!(status.state, DocumentState::Closed);
        assert!(!status.is_open());
    }

    #[test]
    fn test_document_status_no_document() {
        let status = DocumentStatus::from_raw(0).unwrap();
        assert_eq!(status.kind, None);
        assert_eq!(status.state, DocumentState::Closed);
    }

    #[test]
    fn test_document_status_not_printed() {
        let status = DocumentStatus::from_raw(0x83).unwrap();
        assert_eq!(status.kind, Some(DocumentType::ReturnOfIncome));
        assert_eq!(status.state, DocumentState::ClosedNotPrinted);
    }

    #[test]
    fn test_document_status_rejects_unknown_nibbles() {
        assert!(DocumentStatus::from_raw(0x09).is_err());
        assert!(DocumentStatus::from_raw(0x52).is_err());
        assert!(DocumentStatus::from_raw(0x100).is_err());
    }

    #[test]
    fn test_flags_keep_reserved_bits() {
        let fatal = FatalFlags::from_bits_retain(0b1000_0101);
        assert!(fatal.contains(FatalFlags::NVR_CHECKSUM));
        assert!(fatal.contains(FatalFlags::FN_UNREACHABLE));
        assert_eq!(fatal.bits(), 0b1000_0101);
    }

    #[test]
    fn test_shift_open() {
        let report = StatusReport {
            fatal: FatalFlags::empty(),
            flags: StatusFlags::SHIFT_OPEN | StatusFlags::SHIFT_OVER_24H,
            document: DocumentStatus::from_raw(0).unwrap(),
        };
        assert!(report.is_shift_open());
        assert!(!report.has_fatal_errors());
    }
}
