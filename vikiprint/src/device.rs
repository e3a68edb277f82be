//! High-level device interface

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncWriteExt, WriteHalf};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use vikiprint_core::{
    constants::{ENQ, LF},
    Command, Frame, Response,
};
use vikiprint_transport::{BoxedStream, SerialTransport, Transport};

use crate::{
    config::DeviceConfig,
    correlator::{Arrival, Correlator, Expected},
    error::{Error, Result},
    event::{Event, EventSink},
    reader::{self, ReaderContext},
};

/// Running reader task of an open device
struct Link {
    task: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Pirit fiscal register
///
/// Owns the port, a background reader task and the single pending-request
/// slot. Requests take `&self`, so one device can be shared between tasks;
/// concurrent callers are queued and served one at a time.
///
/// # Examples
///
/// ```no_run
/// use vikiprint::Device;
///
/// #[tokio::main]
/// async fn main() -> vikiprint::Result<()> {
///     let mut device = Device::new("/dev/ttyACM0", 57600);
///
///     device.open().await?;
///     device.check_link().await?;
///
///     let status = device.status_flags().await?;
///     println!("Status: {}", status);
///
///     device.close().await?;
///     Ok(())
/// }
/// ```
pub struct Device {
    transport: Box<dyn Transport>,
    config: DeviceConfig,
    correlator: Arc<Correlator>,
    events: EventSink,
    gate: Mutex<()>,
    line: Arc<Mutex<()>>,
    writer: Mutex<Option<WriteHalf<BoxedStream>>>,
    link: Option<Link>,
}

impl Device {
    /// Create a device on a serial port
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self::with_transport(SerialTransport::new(path, baud_rate))
    }

    /// Create a device over any transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        let config = DeviceConfig::default();
        Self {
            transport: Box::new(transport),
            events: EventSink::new(config.event_capacity),
            config,
            correlator: Arc::new(Correlator::new()),
            gate: Mutex::new(()),
            line: Arc::new(Mutex::new(())),
            writer: Mutex::new(None),
            link: None,
        }
    }

    /// Replace the configuration
    ///
    /// Existing event subscriptions are dropped, so subscribe afterwards.
    pub fn with_config(mut self, config: DeviceConfig) -> Self {
        self.events = EventSink::new(config.event_capacity);
        self.config = config;
        self
    }

    /// Set response timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.response_timeout = timeout;
        self
    }

    /// Set the cashier name used by shift and document commands
    pub fn with_cashier(mut self, cashier: impl Into<String>) -> Self {
        self.config.cashier = cashier.into();
        self
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Receive events the reader could not attach to a request
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Check if the port is open
    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    /// Open the port and start the reader
    ///
    /// # Errors
    ///
    /// Returns the transport error when the port cannot be opened. The
    /// failure is also published as [`Event::TransportError`] and the
    /// device stays closed.
    pub async fn open(&mut self) -> Result<()> {
        if self.is_open() {
            debug!("{} already open", self.transport.port_name());
            return Ok(());
        }

        info!("Opening {}...", self.transport.port_name());

        let stream = match self.transport.open().await {
            Ok(stream) => stream,
            Err(e) => {
                self.events.transport_error(e.to_string());
                return Err(e.into());
            }
        };

        let (read_half, write_half) = tokio::io::split(stream);
        *self.writer.get_mut() = Some(write_half);

        let cancel = CancellationToken::new();
        let task = reader::spawn(
            read_half,
            ReaderContext {
                correlator: self.correlator.clone(),
                events: self.events.clone(),
                line: self.line.clone(),
                idle_gap: self.config.burst_idle_gap,
                cancel: cancel.clone(),
            },
        );
        self.link = Some(Link { task, cancel });

        info!("Opened {}", self.transport.port_name());
        Ok(())
    }

    /// Stop the reader, fail any pending request and release the port
    pub async fn close(&mut self) -> Result<()> {
        let Some(link) = self.link.take() else {
            return Ok(());
        };

        info!("Closing {}...", self.transport.port_name());

        link.cancel.cancel();
        if let Err(e) = link.task.await {
            warn!("Reader task ended abnormally: {}", e);
        }

        self.correlator.cancel();

        if let Some(mut writer) = self.writer.get_mut().take() {
            if let Err(e) = writer.shutdown().await {
                debug!("Shutdown of {} failed: {}", self.transport.port_name(), e);
            }
        }

        info!("Closed");
        Ok(())
    }

    /// Send a command and wait for the reply with the same command code
    ///
    /// A device-reported error comes back as [`Response::Error`]; only
    /// protocol and transport problems are returned as `Err`.
    ///
    /// # Errors
    ///
    /// - [`Error::NoResponse`] when no matching reply arrives in time
    /// - [`Error::Core`] when the reply payload is malformed
    /// - [`Error::Transport`] when writing to an open port fails
    pub async fn send_and_await(
        &self,
        command: Command,
        payload: impl Into<Bytes>,
    ) -> Result<Response> {
        self.request(command, payload, true)
            .await?
            .ok_or_else(|| Error::InvalidResponse(format!("no reply recorded for {command}")))
    }

    /// Send a command without waiting for a reply
    pub async fn send(&self, command: Command, payload: impl Into<Bytes>) -> Result<()> {
        self.request(command, payload, false).await.map(|_| ())
    }

    /// Send a command, optionally waiting for its reply
    pub async fn request(
        &self,
        command: Command,
        payload: impl Into<Bytes>,
        expect_response: bool,
    ) -> Result<Option<Response>> {
        let frame = Frame::request(command, payload);
        debug!("Sending {}", frame);

        let expected = expect_response.then_some(Expected::Reply(command));
        match self.exchange(&frame.encode(), expected).await? {
            Some(Arrival::Frame(frame)) => Ok(Some(Response::decode(&frame)?)),
            Some(other) => Err(Error::InvalidResponse(format!(
                "expected reply to {command}, got {other:?}"
            ))),
            None => Ok(None),
        }
    }

    /// Send ENQ and wait for ACK
    pub async fn check_link(&self) -> Result<()> {
        debug!("Checking link...");
        self.exchange(&[ENQ], Some(Expected::Ack)).await?;
        debug!("Link OK");
        Ok(())
    }

    /// Feed one line of paper
    pub async fn feed_paper(&self) -> Result<()> {
        self.exchange(&[LF], None).await.map(|_| ())
    }

    // Helper methods

    async fn exchange(&self, bytes: &[u8], expected: Option<Expected>) -> Result<Option<Arrival>> {
        let _gate = self.gate.lock().await;

        let Some(expected) = expected else {
            let _line = self.line.lock().await;
            self.write(bytes).await?;
            return Ok(None);
        };

        let rx = {
            // No burst may be half-drained while the slot is armed
            let _line = self.line.lock().await;
            let rx = self.correlator.arm(expected, self.config.response_timeout);

            match self.write(bytes).await {
                Ok(()) => {}
                Err(Error::NotOpen) => {
                    self.events.transport_error(format!(
                        "{} is not open, {} cannot be sent",
                        self.transport.port_name(),
                        expected
                    ));
                }
                Err(e) => {
                    self.correlator.cancel();
                    return Err(e);
                }
            }

            rx
        };

        self.correlator.wait(expected, rx).await.map(Some)
    }

    async fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        let stream = writer.as_mut().ok_or(Error::NotOpen)?;

        trace!("TX: {:02X?}", bytes);

        let written = async {
            stream.write_all(bytes).await?;
            stream.flush().await
        }
        .await;

        if let Err(e) = written {
            self.events.transport_error(format!("write failed: {e}"));
            return Err(vikiprint_transport::Error::Io(e).into());
        }

        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if let Some(link) = self.link.take() {
            warn!("{} dropped while open; stopping reader", self.transport.port_name());
            link.cancel.cancel();
            self.correlator.cancel();
        }
    }
}
