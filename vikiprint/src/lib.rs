//! # vikiprint
//!
//! Async driver for Pirit / Viki Print fiscal registers over a serial line.
//!
//! ## Features
//!
//! - Framed request/reply protocol with XOR checksum
//! - One request in flight; concurrent callers are queued
//! - Unsolicited replies and line noise reported as events
//! - Typed commands for shifts, documents, items and payments
//!
//! ## Quick Start
//!
//! ```no_run
//! use vikiprint::{Amount, Device, DocumentType, PaymentKind, SaleItem};
//!
//! #[tokio::main]
//! async fn main() -> vikiprint::Result<()> {
//!     let mut device = Device::new("/dev/ttyACM0", 57600).with_cashier("Ivanova");
//!     device.open().await?;
//!
//!     let price: Amount = "10.5".parse()?;
//!     let quantity: Amount = "1".parse()?;
//!
//!     device.open_document(DocumentType::Income).await?;
//!     device.add_item(&SaleItem::new("Tea", "A1", quantity, price)).await?;
//!     device.add_payment(PaymentKind::Cash, price).await?;
//!
//!     let receipt = device.close_document().await?;
//!     println!("{}", receipt);
//!
//!     device.close().await?;
//!     Ok(())
//! }
//! ```

mod commands;
pub mod config;
mod correlator;
pub mod device;
pub mod error;
pub mod event;
mod reader;

// Re-exports
pub use config::DeviceConfig;
pub use correlator::Expected;
pub use device::Device;
pub use error::{Error, Result};
pub use event::{DataFault, Event};

// Re-export protocol and value types
pub use vikiprint_core::{Command, Frame, Response};
pub use vikiprint_transport::{MemoryTransport, SerialTransport, Transport};
pub use vikiprint_types::{
    AddItemResult, Amount, ClosedDocument, DocumentState, DocumentStatus, DocumentType, ErrorInfo,
    FatalFlags, ItemKind, PaymentKind, SaleItem, SettlementMethod, StatusFlags, StatusReport,
};
