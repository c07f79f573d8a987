//! Meter session
//!
//! A [`Meter`] ties the link, the measurement transform and storage paging
//! together. Identification and storage reads are blocking exchanges; live
//! polling and storage playback are driven by the caller's loop, one
//! [`Meter::poll_live`] or [`Meter::poll_storage`] call per tick.

mod poll;

pub use poll::PollStatus;

use appa_hal::{Uart, UartTx};
use appa_protocol::{
    CodecError, DisplayReading, DisplayResponse, InformationResponse, ModelId, Request, Response,
};
use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::config::LinkConfig;
use crate::error::{Error, Result};
use crate::health::LinkHealth;
use crate::link::Link;
use crate::measurement::{transform, ReadingContext};
use crate::model::{supports_channel, Channel};
use crate::storage::{
    StorageInfo, StorageKind, MAX_ENTRIES_PER_READ, STORAGE_INFO_REQUEST,
};
use crate::traits::SampleSink;

use self::poll::PollState;

/// One connected meter
pub struct Meter<U, D> {
    link: Link<U, D>,
    info: Option<InformationResponse>,
    storage: [Option<StorageInfo>; 2],
    health: LinkHealth,
    poll: PollState,
    last_context: ReadingContext,
}

impl<U, D> Meter<U, D>
where
    U: Uart,
    D: DelayNs,
{
    pub fn new(uart: U, delay: D, config: LinkConfig) -> Self {
        Self {
            health: LinkHealth::new(config.max_error_count),
            link: Link::new(uart, delay, config),
            info: None,
            storage: [None; 2],
            poll: PollState::default(),
            last_context: ReadingContext::default(),
        }
    }

    /// Identification from the last [`Meter::identify`]
    pub fn info(&self) -> Option<&InformationResponse> {
        self.info.as_ref()
    }

    pub fn model(&self) -> Option<ModelId> {
        self.info.as_ref().map(|info| info.model_id)
    }

    /// Storage layout from the last [`Meter::read_storage_info`]
    pub fn storage_info(&self, kind: StorageKind) -> Option<&StorageInfo> {
        self.storage[kind.index()].as_ref()
    }

    pub fn error_count(&self) -> u8 {
        self.health.error_count()
    }

    /// Mode of the most recent live display answer
    pub fn last_context(&self) -> ReadingContext {
        self.last_context
    }

    pub fn link(&self) -> &Link<U, D> {
        &self.link
    }

    /// Give back the stream and delay
    pub fn release(self) -> (U, D) {
        self.link.release()
    }

    /// Returns true if this meter's `channel` display is reported
    pub fn supports(&self, channel: Channel) -> bool {
        match self.model() {
            Some(model) => supports_channel(model, channel),
            None => channel == Channel::Primary,
        }
    }

    /// Run `op`, retrying soft failures while the error budget allows
    fn retry<T>(
        &mut self,
        mut op: impl FnMut(&mut Link<U, D>) -> Result<T, <U as UartTx>::Error>,
    ) -> Result<T, <U as UartTx>::Error> {
        loop {
            match op(&mut self.link) {
                Ok(value) => {
                    self.health.record_success();
                    return Ok(value);
                }
                Err(e) if e.is_retryable() => {
                    self.count_error()?;
                    debug!(
                        "Retrying, {} of {} errors",
                        self.health.error_count(),
                        self.health.max_errors()
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn count_error(&mut self) -> Result<(), <U as UartTx>::Error> {
        if self.health.record_error() {
            error!("Meter unresponsive after {} errors", self.health.error_count());
            return Err(Error::Unresponsive);
        }
        Ok(())
    }

    fn exchange(&mut self, request: Request) -> Result<Response, <U as UartTx>::Error> {
        self.retry(|link| link.request(&request))
    }

    /// Read and keep the model identification
    pub fn identify(&mut self) -> Result<&InformationResponse, <U as UartTx>::Error> {
        let Response::Information(info) = self.exchange(Request::ReadInformation)? else {
            return Err(Error::Codec(CodecError::DataMismatch));
        };
        info!(
            "Vendor: {}, model: {} ({:?}), serial: {}, firmware: {}",
            info.vendor(),
            info.model(),
            info.model_id,
            info.serial_number.as_str(),
            info.firmware_version_string().as_str()
        );
        Ok(self.info.insert(info))
    }

    /// Blocking read of the live display
    pub fn read_display(&mut self) -> Result<DisplayResponse, <U as UartTx>::Error> {
        let Response::Display(display) = self.exchange(Request::ReadDisplay)? else {
            return Err(Error::Codec(CodecError::DataMismatch));
        };
        self.last_context = ReadingContext::from(&display);
        Ok(display)
    }

    /// Read the MEM and LOG fill levels
    pub fn read_storage_info(&mut self) -> Result<[StorageInfo; 2], <U as UartTx>::Error> {
        let model = self.model().ok_or(Error::NotIdentified)?;
        let Response::Memory(block) = self.exchange(Request::ReadMemory(STORAGE_INFO_REQUEST))?
        else {
            return Err(Error::Codec(CodecError::DataMismatch));
        };
        let infos = StorageInfo::decode(model, &block)?;
        for info in &infos {
            debug!(
                "{} storage: {} entries, rate {} s",
                info.kind.name(),
                info.sample_amount,
                info.sample_rate
            );
            self.storage[info.kind.index()] = Some(*info);
        }
        Ok(infos)
    }

    fn storage_or_read(&mut self, kind: StorageKind) -> Result<StorageInfo, <U as UartTx>::Error> {
        match self.storage[kind.index()] {
            Some(info) => Ok(info),
            None => Ok(self.read_storage_info()?[kind.index()]),
        }
    }

    /// Blocking read of stored entries starting at `start`
    ///
    /// Returns at most one payload worth of entries, never crossing a slot
    /// boundary; call again from `start + returned` for more.
    pub fn read_entries(
        &mut self,
        kind: StorageKind,
        start: u32,
        count: u16,
    ) -> Result<Vec<DisplayReading, MAX_ENTRIES_PER_READ>, <U as UartTx>::Error> {
        let info = self.storage_or_read(kind)?;
        let window = info.plan_read(start, count)?;
        let Response::Memory(block) = self.exchange(Request::ReadMemory(window.request))? else {
            return Err(Error::Codec(CodecError::DataMismatch));
        };
        let mut entries = info.decode_entries(&block);
        entries.truncate(window.count as usize);
        Ok(entries)
    }

    /// Transform both displays of a live answer and hand them to `sink`
    fn emit_display(&self, display: &DisplayResponse, sink: &mut impl SampleSink) {
        let context = ReadingContext::from(display);
        sink.begin_group();
        for channel in Channel::ALL {
            if !self.supports(channel) {
                continue;
            }
            let reading = match channel {
                Channel::Primary => &display.primary,
                Channel::Secondary => &display.secondary,
            };
            let transformed = transform(reading, context, channel);
            if let Some(message) = transformed.message() {
                message.report();
            }
            sink.emit(channel, &transformed.sample());
        }
        sink.end_group();
    }
}
