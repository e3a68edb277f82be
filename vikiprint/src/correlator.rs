//! Request/reply correlation
//!
//! At most one request is in flight. The caller arms a single pending slot
//! before writing, then waits on a oneshot receiver with a deadline. The
//! reader offers every arrival; a matching one is handed over through the
//! oneshot, anything else pushes the deadline out and goes back to the
//! reader as unsolicited. The slot lock decides the race between a match and
//! an expiring deadline: whoever takes the entry first wins.

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

use vikiprint_core::{Command, Frame};

use crate::error::{Error, Result};

/// What a pending request is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// A reply frame carrying this command code
    Reply(Command),

    /// A bare ACK byte answering ENQ
    Ack,
}

impl Expected {
    fn matches(&self, arrival: &Arrival) -> bool {
        match (self, arrival) {
            (Self::Reply(command), Arrival::Frame(frame)) => frame.command == u8::from(*command),
            (Self::Ack, Arrival::Ack) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reply(command) => write!(f, "{command}"),
            Self::Ack => write!(f, "ACK"),
        }
    }
}

/// One burst as seen by the correlator
#[derive(Debug)]
pub(crate) enum Arrival {
    Frame(Frame),
    Ack,
    /// Undecodable bytes; never matches but still counts as line activity
    Invalid,
}

struct PendingRequest {
    expected: Expected,
    timeout: Duration,
    deadline: Instant,
    reply: oneshot::Sender<Arrival>,
}

enum Deadline {
    Expired(PendingRequest),
    Rearmed,
    Resolved,
}

#[derive(Default)]
pub(crate) struct Correlator {
    slot: Mutex<Option<PendingRequest>>,
}

impl Correlator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Arm the slot; must happen before the request is written
    pub(crate) fn arm(&self, expected: Expected, timeout: Duration) -> oneshot::Receiver<Arrival> {
        let (tx, rx) = oneshot::channel();
        let pending = PendingRequest {
            expected,
            timeout,
            deadline: Instant::now() + timeout,
            reply: tx,
        };

        if let Some(stale) = self.slot.lock().replace(pending) {
            warn!("Replacing stale pending request for {}", stale.expected);
        }
        trace!("Armed for {} ({:?})", expected, timeout);

        rx
    }

    /// Offer an arrival to the pending request
    ///
    /// Returns the arrival back when it did not resolve anything. A
    /// non-matching arrival re-arms the deadline.
    pub(crate) fn offer(&self, arrival: Arrival) -> Option<Arrival> {
        let mut slot = self.slot.lock();

        let Some(mut pending) = slot.take() else {
            return Some(arrival);
        };

        if pending.reply.is_closed() {
            debug!("Dropping abandoned request for {}", pending.expected);
            return Some(arrival);
        }

        if pending.expected.matches(&arrival) {
            drop(slot);
            debug!("Resolved {}", pending.expected);
            return pending.reply.send(arrival).err();
        }

        pending.deadline = Instant::now() + pending.timeout;
        trace!("Re-armed {} until {:?}", pending.expected, pending.deadline);
        *slot = Some(pending);

        Some(arrival)
    }

    /// Wait for the armed request to resolve or expire
    pub(crate) async fn wait(
        &self,
        expected: Expected,
        mut rx: oneshot::Receiver<Arrival>,
    ) -> Result<Arrival> {
        loop {
            let Some(deadline) = self.deadline() else {
                break;
            };

            tokio::select! {
                biased;
                arrival = &mut rx => {
                    return arrival.map_err(|_| Error::Closed(expected));
                }
                _ = time::sleep_until(deadline) => match self.check_deadline() {
                    Deadline::Expired(pending) => {
                        warn!("No response to {} within {:?}", pending.expected, pending.timeout);
                        return Err(Error::NoResponse {
                            expected: pending.expected,
                            timeout: pending.timeout,
                        });
                    }
                    Deadline::Rearmed => continue,
                    Deadline::Resolved => break,
                },
            }
        }

        rx.await.map_err(|_| Error::Closed(expected))
    }

    /// Fail whatever is pending; its waiter sees [`Error::Closed`]
    pub(crate) fn cancel(&self) {
        if let Some(pending) = self.slot.lock().take() {
            debug!("Cancelled pending request for {}", pending.expected);
        }
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.slot.lock().as_ref().map(|pending| pending.deadline)
    }

    fn check_deadline(&self) -> Deadline {
        let mut slot = self.slot.lock();

        let expired = match slot.as_ref() {
            None => return Deadline::Resolved,
            Some(pending) => pending.deadline <= Instant::now(),
        };
        if !expired {
            return Deadline::Rearmed;
        }

        match slot.take() {
            Some(pending) => Deadline::Expired(pending),
            None => Deadline::Resolved,
        }
    }
}
