//! Typed values exchanged with Pirit / Viki Print fiscal registers.
//!
//! Everything in here is plain data: amounts, status words, document kinds
//! and the decoded contents of device replies. Wire handling lives in
//! `vikiprint-core`.

pub mod amount;
pub mod document;
pub mod error;
pub mod receipt;
pub mod status;

pub use amount::Amount;
pub use document::{DocumentType, ItemKind, PaymentKind, SaleItem, SettlementMethod};
pub use error::{Error, Result};
pub use receipt::{AddItemResult, ClosedDocument, ErrorInfo};
pub use status::{DocumentState, DocumentStatus, FatalFlags, StatusFlags, StatusReport};
