//! Transport layer for Pirit registers
//!
//! Provides the serial byte channel and an in-memory stand-in for tests.

pub mod error;
pub mod memory;
pub mod serial;

pub use error::{Error, Result};
pub use memory::MemoryTransport;
pub use serial::SerialTransport;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Duplex byte stream handed out by an open transport
pub trait ByteStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> ByteStream for T {}

/// Boxed open channel; dropping it releases the port
pub type BoxedStream = Box<dyn ByteStream>;

/// Transport trait for different byte channels
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the channel
    async fn open(&mut self) -> Result<BoxedStream>;

    /// Human-readable port name for logs
    fn port_name(&self) -> String;
}
