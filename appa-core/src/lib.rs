//! Host-side session logic for APPA multimeters
//!
//! This crate contains everything above the wire format that does not
//! depend on a specific serial port implementation:
//!
//! - Frame transport over a byte stream ([`Link`])
//! - Raw display record to physical sample transform
//! - Per-model display capabilities
//! - MEM/LOG storage paging
//! - Meter session: identification, live polling, storage playback
//! - Link configuration and health tracking

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod health;
pub mod link;
pub mod measurement;
pub mod meter;
pub mod model;
pub mod storage;
pub mod traits;

#[cfg(test)]
mod mock;

pub use config::{ConfigError, LinkConfig};
pub use error::{Error, Result};
pub use health::LinkHealth;
pub use link::Link;
pub use measurement::{
    transform, Message, MqFlags, PhysicalSample, Quantity, ReadingContext, SiUnit, Transformed,
};
pub use meter::{Meter, PollStatus};
pub use model::{supports_channel, Channel};
pub use storage::{MemoryWindow, StorageError, StorageInfo, StorageKind, STORAGE_INFO_REQUEST};
pub use traits::sink::LatestSample;
pub use traits::SampleSink;
