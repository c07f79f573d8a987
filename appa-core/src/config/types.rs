//! Configuration type definitions
//!
//! Link timing and line settings. The defaults match what the meters
//! expect; every value can be overridden from TOML or a stored postcard
//! blob.

use appa_hal::UartConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default delay between receive polls
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 50;

/// Default time to wait for an answer
pub const DEFAULT_RECEIVE_TIMEOUT_MS: u32 = 500;

/// Default timeout for a single blocking read
pub const DEFAULT_READ_TIMEOUT_MS: u32 = 50;

/// Default timeout for a blocking write; a 10 Hz meter delays at most 100 ms
pub const DEFAULT_WRITE_TIMEOUT_MS: u32 = 100;

/// Default number of consecutive errors tolerated before giving up
pub const DEFAULT_MAX_ERROR_COUNT: u8 = 10;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Input could not be parsed
    Parse,
    /// Output buffer too small or serializer failure
    Serialize,
    /// Values parsed but are inconsistent
    Invalid(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::Parse => write!(f, "malformed configuration"),
            ConfigError::Serialize => write!(f, "configuration could not be serialized"),
            ConfigError::Invalid(why) => write!(f, "invalid configuration: {why}"),
        }
    }
}

/// Link timing and line settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConfig {
    /// Serial line settings
    pub uart: UartConfig,
    /// Delay between receive polls (ms)
    pub poll_interval_ms: u32,
    /// Time to wait for an answer before giving up (ms)
    pub receive_timeout_ms: u32,
    /// Timeout for a single blocking read (ms)
    pub read_timeout_ms: u32,
    /// Timeout for a blocking write (ms)
    pub write_timeout_ms: u32,
    /// Errors tolerated before acquisition is aborted
    pub max_error_count: u8,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            uart: UartConfig::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            receive_timeout_ms: DEFAULT_RECEIVE_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
            max_error_count: DEFAULT_MAX_ERROR_COUNT,
        }
    }
}

impl LinkConfig {
    /// Check values that would make the link loop forever or never wait
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be positive"));
        }
        if self.receive_timeout_ms < self.poll_interval_ms {
            return Err(ConfigError::Invalid(
                "receive_timeout_ms must not be shorter than poll_interval_ms",
            ));
        }
        if self.uart.baudrate == 0 {
            return Err(ConfigError::Invalid("baudrate must be positive"));
        }
        Ok(())
    }

    /// Number of receive polls that fit in `timeout_ms`, at least one
    pub fn poll_cycles(&self, timeout_ms: u32) -> u32 {
        (timeout_ms / self.poll_interval_ms.max(1)).max(1)
    }
}
