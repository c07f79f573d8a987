//! Event-driven acquisition
//!
//! At most one request is outstanding. Each poll either sends a new
//! request or looks for the answer to the pending one without blocking.
//! A request left unanswered for `receive_timeout_ms / poll_interval_ms`
//! polls is abandoned and counted as an error.

use appa_hal::{Uart, UartTx};
use appa_protocol::{Request, Response};
use embedded_hal::delay::DelayNs;

use super::Meter;
use crate::error::{Error, Result};
use crate::measurement::{transform, PhysicalSample};
use crate::model::Channel;
use crate::storage::{MemoryWindow, StorageKind};
use crate::traits::SampleSink;

/// Outcome of one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollStatus {
    /// Request outstanding, nothing received yet
    Waiting,
    /// Samples were emitted
    Sampled,
    /// Pending request abandoned; the error was counted
    Dropped,
    /// Storage playback reached the last entry
    Finished,
}

/// What is in flight
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct PollState {
    pending: Option<Request>,
    pending_polls: u32,
    window: Option<MemoryWindow>,
    playback: Option<StorageKind>,
    cursor: u32,
}

impl PollState {
    fn clear_pending(&mut self) {
        self.pending = None;
        self.pending_polls = 0;
        self.window = None;
    }
}

impl<U, D> Meter<U, D>
where
    U: Uart,
    D: DelayNs,
{
    /// Returns true while a request waits for its answer
    pub fn request_pending(&self) -> bool {
        self.poll.pending.is_some()
    }

    /// Polls spent waiting on the pending request
    pub fn pending_polls(&self) -> u32 {
        self.poll.pending_polls
    }

    /// Next stored entry storage playback will emit
    pub fn cursor(&self) -> u32 {
        self.poll.cursor
    }

    /// Abandon any pending request and playback position
    pub fn stop(&mut self) -> Result<(), <U as UartTx>::Error> {
        self.poll = PollState::default();
        self.link.reset()
    }

    /// Send `request` unless one is already pending, then check for an answer
    fn poll_exchange(&mut self, request: Request) -> Result<Option<Response>, <U as UartTx>::Error> {
        let request = match self.poll.pending {
            Some(pending) => pending,
            None => {
                self.link.send_request(&request)?;
                self.poll.pending = Some(request);
                self.poll.pending_polls = 0;
                request
            }
        };

        match self.link.poll_response(&request) {
            Ok(Some(response)) => {
                self.poll.pending = None;
                self.poll.pending_polls = 0;
                self.health.record_success();
                Ok(Some(response))
            }
            Ok(None) => {
                self.poll.pending_polls += 1;
                let budget = self
                    .link
                    .config()
                    .poll_cycles(self.link.config().receive_timeout_ms);
                if self.poll.pending_polls >= budget {
                    warn!("No answer to {:?} after {} polls", request.command(), budget);
                    self.poll.clear_pending();
                    self.count_error()?;
                    return Err(Error::Timeout);
                }
                Ok(None)
            }
            Err(e) if e.is_retryable() => {
                warn!("Dropping answer to {:?}", request.command());
                self.poll.clear_pending();
                self.count_error()?;
                Err(e)
            }
            Err(e) => {
                self.poll.clear_pending();
                Err(e)
            }
        }
    }

    /// One live display poll
    ///
    /// Emits one sample group per display answer. Interrupts any storage
    /// playback in progress.
    pub fn poll_live(
        &mut self,
        sink: &mut impl SampleSink,
    ) -> Result<PollStatus, <U as UartTx>::Error> {
        if self.poll.pending.is_some_and(|pending| pending != Request::ReadDisplay) {
            self.poll.clear_pending();
        }
        self.poll.playback = None;

        match self.poll_exchange(Request::ReadDisplay) {
            Ok(Some(Response::Display(display))) => {
                self.last_context = (&display).into();
                self.emit_display(&display, sink);
                Ok(PollStatus::Sampled)
            }
            Ok(Some(_)) => Err(Error::Codec(appa_protocol::CodecError::DataMismatch)),
            Ok(None) => Ok(PollStatus::Waiting),
            Err(e) if e.is_retryable() => Ok(PollStatus::Dropped),
            Err(e) => Err(e),
        }
    }

    /// One storage playback poll
    ///
    /// Walks entries `0..sample_amount` of `kind`. Each entry becomes a
    /// group holding its reading on the primary channel and its one-based
    /// index on the secondary channel. Switching `kind` restarts at entry 0.
    pub fn poll_storage(
        &mut self,
        kind: StorageKind,
        sink: &mut impl SampleSink,
    ) -> Result<PollStatus, <U as UartTx>::Error> {
        if self.poll.playback != Some(kind) {
            self.poll.clear_pending();
            self.poll.playback = Some(kind);
            self.poll.cursor = 0;
        }

        let info = self.storage_or_read(kind)?;
        let amount = (info.sample_amount as u32).min(info.capacity());
        if self.poll.cursor >= amount {
            return Ok(PollStatus::Finished);
        }

        let window = match self.poll.window {
            Some(window) => window,
            None => {
                let remaining = (amount - self.poll.cursor).min(u16::MAX as u32) as u16;
                let window = info.plan_read(self.poll.cursor, remaining)?;
                self.poll.window = Some(window);
                window
            }
        };

        let block = match self.poll_exchange(Request::ReadMemory(window.request)) {
            Ok(Some(Response::Memory(block))) => block,
            Ok(Some(_)) => return Err(Error::Codec(appa_protocol::CodecError::DataMismatch)),
            Ok(None) => return Ok(PollStatus::Waiting),
            Err(e) if e.is_retryable() => return Ok(PollStatus::Dropped),
            Err(e) => return Err(e),
        };
        self.poll.window = None;

        let entries = info.decode_entries(&block);
        if entries.is_empty() {
            warn!("Empty {} block at entry {}", kind.name(), self.poll.cursor);
            self.count_error()?;
            return Ok(PollStatus::Dropped);
        }

        for entry in entries.iter().take(window.count as usize) {
            let transformed = transform(entry, self.last_context, Channel::Primary);
            if let Some(message) = transformed.message() {
                message.report();
            }
            sink.begin_group();
            sink.emit(Channel::Primary, &transformed.sample());
            sink.emit(Channel::Secondary, &PhysicalSample::sample_id(self.poll.cursor));
            sink.end_group();
            self.poll.cursor += 1;
        }

        if self.poll.cursor >= amount {
            info!("{} playback finished, {} entries", kind.name(), amount);
            Ok(PollStatus::Finished)
        } else {
            Ok(PollStatus::Sampled)
        }
    }
}
