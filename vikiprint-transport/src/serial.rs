//! Serial transport
//!
//! Registers are attached to an RS-232 or USB-CDC port at 8N1 without flow
//! control.

use std::time::Duration;

use async_trait::async_trait;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, StopBits};
use tracing::{debug, warn};

use crate::{error::*, BoxedStream, Transport};

/// Default serial speed of the register
pub const DEFAULT_BAUD_RATE: u32 = 57600;

/// Serial transport for Pirit registers
pub struct SerialTransport {
    path: String,
    baud_rate: u32,
    open_timeout: Duration,
}

impl SerialTransport {
    /// Create new serial transport (8N1, no flow control)
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            open_timeout: Duration::from_secs(1),
        }
    }

    /// Set the driver-level timeout used while opening the port
    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    /// Set baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn open(&mut self) -> Result<BoxedStream> {
        debug!("Opening {} at {} baud...", self.path, self.baud_rate);

        let stream = tokio_serial::new(&self.path, self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.open_timeout)
            .open_native_async()
            .map_err(|source| {
                warn!("Failed to open {}: {}", self.path, source);
                Error::Open {
                    port: self.path.clone(),
                    source,
                }
            })?;

        debug!("Opened {}", self.path);

        Ok(Box::new(stream))
    }

    fn port_name(&self) -> String {
        format!("{}@{}", self.path, self.baud_rate)
    }
}
