//! # vikiprint-core
//!
//! Core protocol implementation for Pirit / Viki Print fiscal registers.
//!
//! This crate provides the low-level protocol primitives:
//! - Frame structure and encoding/decoding
//! - XOR checksum rendered as hex digits
//! - Command definitions
//! - Response decoding into typed values
//! - Request payload building (FS-separated CP866 fields)

pub mod checksum;
pub mod command;
pub mod constants;
pub mod error;
pub mod fields;
pub mod frame;
pub mod payload;
pub mod response;
pub mod text;

pub use command::Command;
pub use error::{Error, PacketFault, Result};
pub use frame::Frame;
pub use payload::PayloadBuilder;
pub use response::Response;

/// Maximum frame size accepted from the wire
pub const MAX_FRAME_SIZE: usize = 4096;
