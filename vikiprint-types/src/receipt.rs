//! Decoded contents of command replies

use std::fmt;

use chrono::NaiveDateTime;

use crate::amount::Amount;

/// Reply to "close document" (0x31)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedDocument {
    /// Running document number
    pub document_number: u32,

    /// Operational counter, as printed
    pub operational_counter: String,

    /// Combined FD / FP line, as printed
    pub fd_fp: String,

    /// Fiscal document number (FD)
    pub fiscal_document_number: u32,

    /// Fiscal sign (FP)
    pub fiscal_sign: u64,

    pub shift_number: u32,

    /// Document number within the shift
    pub shift_document_number: u32,

    /// Date and time printed on the document
    pub issued_at: NaiveDateTime,
}

impl fmt::Display for ClosedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Document[#{}, FD: {}, FP: {}, shift: {}/{}, at: {}]",
            self.document_number,
            self.fiscal_document_number,
            self.fiscal_sign,
            self.shift_number,
            self.shift_document_number,
            self.issued_at
        )
    }
}

/// Reply to "add item" (0x42)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddItemResult {
    /// Tax amount of the position; `None` when the register sent no fields
    pub tax: Option<Amount>,
}

/// Reply to the extended error info request (0x06)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorInfo {
    /// Request 1: extended error code with its text
    Extended { code: u32, text: String },

    /// Request 2: fiscal storage lock bitmask
    FnLocks { mask: u32 },

    /// Any other request number, fields left as sent
    Other { request: u32, fields: Vec<String> },
}

impl ErrorInfo {
    pub fn request_number(&self) -> u32 {
        match self {
            Self::Extended { .. } => 1,
            Self::FnLocks { .. } => 2,
            Self::Other { request, .. } => *request,
        }
    }
}
