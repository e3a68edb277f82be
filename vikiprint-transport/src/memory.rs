//! In-memory transport
//!
//! Wraps one end of a [`tokio::io::duplex`] pipe. The other end plays the
//! register, which makes it handy for tests and simulators.

use std::io;

use async_trait::async_trait;
use tokio::io::DuplexStream;
use tracing::debug;

use crate::{error::*, BoxedStream, Transport};

/// Transport over an in-memory pipe; can be opened once
pub struct MemoryTransport {
    name: String,
    stream: Option<DuplexStream>,
    available: bool,
}

impl MemoryTransport {
    /// Create a connected pair: the transport and the register-side end
    ///
    /// # Examples
    ///
    /// ```
    /// use vikiprint_transport::MemoryTransport;
    ///
    /// let (transport, _register) = MemoryTransport::pair(1024);
    /// ```
    pub fn pair(capacity: usize) -> (Self, DuplexStream) {
        let (host, register) = tokio::io::duplex(capacity);
        (
            Self {
                name: "memory".into(),
                stream: Some(host),
                available: true,
            },
            register,
        )
    }

    /// Create a transport whose open always fails
    pub fn unavailable() -> Self {
        Self {
            name: "memory (unavailable)".into(),
            stream: None,
            available: false,
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn open(&mut self) -> Result<BoxedStream> {
        if !self.available {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", self.name),
            )));
        }
        let stream = self.stream.take().ok_or(Error::AlreadyOpen)?;
        debug!("Opened {}", self.name);
        Ok(Box::new(stream))
    }

    fn port_name(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_memory_transport_roundtrip() {
        let (mut transport, mut register) = MemoryTransport::pair(64);
        let mut stream = transport.open().await.unwrap();

        stream.write_all(b"\x05").await.unwrap();
        let mut buf = [0u8; 1];
        register.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [0x05]);

        register.write_all(b"\x06").await.unwrap();
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [0x06]);
    }

    #[tokio::test]
    async fn test_memory_transport_opens_once() {
        let (mut transport, _register) = MemoryTransport::pair(64);
        assert!(transport.open().await.is_ok());
        assert!(matches!(transport.open().await, Err(Error::AlreadyOpen)));
    }

    #[tokio::test]
    async fn test_memory_transport_unavailable() {
        let mut transport = MemoryTransport::unavailable();
        assert!(matches!(transport.open().await, Err(Error::Io(_))));
    }
}
