//! Reader task
//!
//! Collects incoming bytes into bursts separated by a quiet period, turns
//! each burst into an arrival and offers it to the correlator. Whatever the
//! correlator hands back is published as an event.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, ReadHalf};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use vikiprint_core::{constants::ACK, Frame, Response, MAX_FRAME_SIZE};
use vikiprint_transport::BoxedStream;

use crate::{
    correlator::{Arrival, Correlator},
    event::{DataFault, EventSink},
};

/// Shared state the reader needs
pub(crate) struct ReaderContext {
    pub(crate) correlator: Arc<Correlator>,
    pub(crate) events: EventSink,
    pub(crate) line: Arc<Mutex<()>>,
    pub(crate) idle_gap: Duration,
    pub(crate) cancel: CancellationToken,
}

/// What was cut from a burst that outgrew the frame limit
#[derive(Default)]
struct Overflow {
    head: Option<Bytes>,
    dropped: usize,
}

impl Overflow {
    /// Move everything buffered past the limit out of `buf`, keeping the
    /// first `MAX_FRAME_SIZE` bytes of the burst for the report
    fn absorb(&mut self, buf: &mut BytesMut) {
        if buf.len() <= MAX_FRAME_SIZE && self.head.is_none() {
            return;
        }
        self.dropped += buf.len();
        if self.head.is_none() {
            self.head = Some(buf.split_to(MAX_FRAME_SIZE).freeze());
        }
        buf.clear();
    }
}

/// Outcome of draining one burst
enum Burst {
    Complete,
    Closed(String),
    Cancelled,
}

pub(crate) fn spawn(reader: ReadHalf<BoxedStream>, ctx: ReaderContext) -> JoinHandle<()> {
    tokio::spawn(ctx.run(reader))
}

impl ReaderContext {
    async fn run(self, mut reader: ReadHalf<BoxedStream>) {
        let mut buf = BytesMut::with_capacity(MAX_FRAME_SIZE);

        loop {
            buf.clear();

            // First byte of a burst: no deadline, only shutdown
            let first = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                read = reader.read_buf(&mut buf) => read,
            };

            match first {
                Ok(0) => {
                    self.events.transport_error("port closed");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    self.events.transport_error(format!("read failed: {e}"));
                    break;
                }
            }

            let line = self.line.lock().await;
            let mut overflow = Overflow::default();
            let outcome = self.drain(&mut reader, &mut buf, &mut overflow).await;

            match outcome {
                Burst::Cancelled => break,
                Burst::Complete | Burst::Closed(_) => {
                    overflow.absorb(&mut buf);
                    match overflow.head {
                        Some(head) => {
                            self.events.invalid_data(head, DataFault::Oversize(overflow.dropped));
                            self.correlator.offer(Arrival::Invalid);
                        }
                        None => self.dispatch(buf.split().freeze()),
                    }
                }
            }
            drop(line);

            if let Burst::Closed(reason) = outcome {
                self.events.transport_error(reason);
                break;
            }
        }

        debug!("Reader stopped");
    }

    /// Keep reading until the line stays quiet for the idle gap
    async fn drain(
        &self,
        reader: &mut ReadHalf<BoxedStream>,
        buf: &mut BytesMut,
        overflow: &mut Overflow,
    ) -> Burst {
        loop {
            if buf.len() > MAX_FRAME_SIZE {
                overflow.absorb(buf);
            }

            let read = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Burst::Cancelled,
                read = time::timeout(self.idle_gap, reader.read_buf(&mut *buf)) => read,
            };

            match read {
                Err(_) => return Burst::Complete,
                Ok(Ok(0)) => return Burst::Closed("port closed".into()),
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Burst::Closed(format!("read failed: {e}")),
            }
        }
    }

    fn dispatch(&self, raw: Bytes) {
        trace!("RX: {:02X?}", &raw[..]);

        let arrival = match raw.as_ref() {
            [ACK] => Arrival::Ack,
            &[byte] => {
                self.events.invalid_data(raw.clone(), DataFault::StrayByte(byte));
                Arrival::Invalid
            }
            _ => match Frame::decode(&raw) {
                Ok(frame) => {
                    debug!("Received {}", frame);
                    Arrival::Frame(frame)
                }
                Err(e) => {
                    self.events.invalid_data(raw.clone(), e);
                    Arrival::Invalid
                }
            },
        };

        match self.correlator.offer(arrival) {
            Some(Arrival::Frame(frame)) => match Response::decode(&frame) {
                Ok(response) => self.events.unsolicited(response),
                Err(e) => self.events.invalid_data(raw, e),
            },
            Some(Arrival::Ack) => debug!("Dropping unexpected ACK"),
            Some(Arrival::Invalid) | None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncWriteExt, DuplexStream};
    use tokio::sync::broadcast;
    use tokio::time::Instant;
    use vikiprint_core::Command;
    use vikiprint_transport::{MemoryTransport, Transport};

    use crate::{correlator::Expected, event::Event};

    const TIMEOUT: Duration = Duration::from_secs(5);

    struct Harness {
        correlator: Arc<Correlator>,
        events: broadcast::Receiver<Event>,
        register: DuplexStream,
        task: JoinHandle<()>,
        cancel: CancellationToken,
    }

    async fn start() -> Harness {
        let (mut transport, register) = MemoryTransport::pair(2 * MAX_FRAME_SIZE);
        let stream = transport.open().await.unwrap();
        let (read_half, _write_half) = tokio::io::split(stream);

        let correlator = Arc::new(Correlator::new());
        let sink = EventSink::new(16);
        let events = sink.subscribe();
        let cancel = CancellationToken::new();

        let task = spawn(
            read_half,
            ReaderContext {
                correlator: correlator.clone(),
                events: sink,
                line: Arc::new(Mutex::new(())),
                idle_gap: Duration::from_millis(20),
                cancel: cancel.clone(),
            },
        );

        Harness {
            correlator,
            events,
            register,
            task,
            cancel,
        }
    }

    /// A well-formed open-document reply of exactly `len` bytes
    fn long_reply(len: usize) -> Vec<u8> {
        let payload = vec![b'x'; len - Frame::MIN_REPLY_SIZE];
        Frame::reply(0x30, 0, payload).encode_reply().to_vec()
    }

    async fn expect_oversize(events: &mut broadcast::Receiver<Event>, total: usize) {
        match events.recv().await.unwrap() {
            Event::InvalidData { raw, error } => {
                assert_eq!(error, DataFault::Oversize(total));
                assert_eq!(raw.len(), MAX_FRAME_SIZE);
                assert_eq!(raw[0], vikiprint_core::constants::STX);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversize_burst_rearms_instead_of_resolving() {
        let mut h = start().await;
        let armed_at = Instant::now();
        let _rx = h.correlator.arm(Expected::Reply(Command::OpenDocument), TIMEOUT);

        time::sleep(Duration::from_secs(2)).await;
        h.register.write_all(&long_reply(4100)).await.unwrap();

        expect_oversize(&mut h.events, 4100).await;
        assert!(h.correlator.is_pending());
        assert!(h.correlator.deadline().unwrap() >= armed_at + Duration::from_secs(7));

        h.cancel.cancel();
        h.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversize_burst_split_across_reads() {
        let mut h = start().await;
        let _rx = h.correlator.arm(Expected::Reply(Command::OpenDocument), TIMEOUT);

        let bytes = long_reply(4100);
        let (head, tail) = bytes.split_at(4090);
        h.register.write_all(head).await.unwrap();
        time::sleep(Duration::from_millis(5)).await;
        h.register.write_all(tail).await.unwrap();

        expect_oversize(&mut h.events, 4100).await;
        assert!(h.correlator.is_pending());

        h.cancel.cancel();
        h.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_at_limit_is_delivered() {
        let mut h = start().await;

        h.register.write_all(&long_reply(MAX_FRAME_SIZE)).await.unwrap();

        match h.events.recv().await.unwrap() {
            Event::Unsolicited(response) => assert_eq!(response.command_code(), 0x30),
            other => panic!("unexpected {other:?}"),
        }

        h.cancel.cancel();
        h.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_of_stream_stops_reader() {
        let Harness {
            mut events,
            register,
            task,
            ..
        } = start().await;

        drop(register);

        match events.recv().await.unwrap() {
            Event::TransportError(message) => assert_eq!(message, "port closed"),
            other => panic!("unexpected {other:?}"),
        }
        time::timeout(Duration::from_secs(1), task)
            .await
            .expect("reader still running")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_of_stream_mid_burst_dispatches_first() {
        let Harness {
            mut events,
            mut register,
            task,
            ..
        } = start().await;

        register.write_all(b"A").await.unwrap();
        drop(register);

        assert!(matches!(
            events.recv().await.unwrap(),
            Event::InvalidData {
                error: DataFault::StrayByte(b'A'),
                ..
            }
        ));
        assert!(matches!(events.recv().await.unwrap(), Event::TransportError(_)));
        task.await.unwrap();
    }
}
