//! Serial byte-stream abstractions
//!
//! The meter is reached through an optical RS232/USB cable or a BLE bridge
//! that tunnels the same byte stream. Implementations provide blocking
//! writes, blocking reads with a timeout and nonblocking reads.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Transmit half of a byte stream
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write data, waiting at most `timeout_ms`
    ///
    /// Returns the number of bytes actually written, which may be less than
    /// `data.len()` if the timeout expired.
    fn write_blocking(&mut self, data: &[u8], timeout_ms: u32) -> Result<usize, Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Receive half of a byte stream
pub trait UartRx {
    /// Error type for receive operations
    type Error;

    /// Read whatever arrives within `timeout_ms`
    ///
    /// Returns the number of bytes read, 0 if the timeout expired first.
    fn read_blocking(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error>;

    /// Read only what is already buffered, never waiting
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Discard anything waiting in the receive buffer
    fn drain(&mut self) -> Result<usize, Self::Error> {
        let mut scratch = [0u8; 16];
        let mut total = 0;
        loop {
            let n = self.read_nonblocking(&mut scratch)?;
            if n == 0 {
                return Ok(total);
            }
            total += n;
        }
    }
}

/// Combined serial interface
///
/// For links that provide both directions with a single error type.
pub trait Uart: UartTx + UartRx<Error = <Self as UartTx>::Error> {}

// Blanket implementation
impl<T> Uart for T where T: UartTx + UartRx<Error = <T as UartTx>::Error> {}

/// Serial line settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    /// 9600 8N1, what every APPA optical cable uses
    fn default() -> Self {
        Self {
            baudrate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StopBits {
    One,
    Two,
}
