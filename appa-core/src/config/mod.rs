//! Configuration
//!
//! [`LinkConfig`] can be read from TOML (`toml` feature) or stored as
//! postcard binary data (`serde` feature).

pub mod types;

pub use types::*;

#[cfg(feature = "toml")]
impl LinkConfig {
    /// Parse from TOML; missing keys keep their defaults
    ///
    /// ```toml
    /// poll_interval_ms = 50
    /// receive_timeout_ms = 500
    /// max_error_count = 10
    ///
    /// [uart]
    /// baudrate = 9600
    /// parity = "none"
    /// ```
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: LinkConfig = toml::from_str(text).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "serde")]
impl LinkConfig {
    /// Serialize to postcard, returning the used part of `buffer`
    pub fn to_postcard<'a>(&self, buffer: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        postcard::to_slice(self, buffer).map_err(|_| ConfigError::Serialize)
    }

    /// Deserialize from postcard
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: LinkConfig = postcard::from_bytes(bytes).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }
}
