//! Events reported outside of any request
//!
//! The reader task publishes everything that does not resolve a pending
//! request: unsolicited replies, garbage on the line and transport failures.

use bytes::Bytes;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use vikiprint_core::Response;

/// Something the reader saw that no caller asked for
#[derive(Debug, Clone)]
pub enum Event {
    /// Bytes that could not be turned into a response
    InvalidData { raw: Bytes, error: DataFault },

    /// A well-formed reply nobody was waiting for
    Unsolicited(Response),

    /// The port failed to open, read or write
    TransportError(String),
}

/// Why a burst was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataFault {
    #[error("{0}")]
    Frame(#[from] vikiprint_core::Error),

    #[error("stray byte 0x{0:02X}")]
    StrayByte(u8),

    /// Burst longer than a frame can be; `raw` keeps only its first
    /// `MAX_FRAME_SIZE` bytes, the count is the whole burst
    #[error("burst of {0} bytes exceeds frame limit")]
    Oversize(usize),
}

/// Publishing side of the event channel
#[derive(Debug, Clone)]
pub(crate) struct EventSink {
    tx: broadcast::Sender<Event>,
}

impl EventSink {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub(crate) fn invalid_data(&self, raw: impl Into<Bytes>, error: impl Into<DataFault>) {
        let raw = raw.into();
        let error = error.into();
        warn!("Invalid data ({} bytes): {}", raw.len(), error);
        self.publish(Event::InvalidData { raw, error });
    }

    pub(crate) fn unsolicited(&self, response: Response) {
        debug!("Unsolicited: {}", response);
        self.publish(Event::Unsolicited(response));
    }

    pub(crate) fn transport_error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("Transport error: {}", message);
        self.publish(Event::TransportError(message));
    }

    fn publish(&self, event: Event) {
        // No subscribers is fine
        let _ = self.tx.send(event);
    }
}
