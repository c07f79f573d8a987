//! Frame checksum
//!
//! The checksum is the low 8 bits of the sum of every byte that precedes it
//! in the frame (start markers, command, length and payload).

/// Compute the checksum of a byte range
pub fn checksum(bytes: &[u8]) -> u8 {
    let mut sum = Checksum::new();
    sum.update_slice(bytes);
    sum.value()
}

/// Running checksum, fed one byte at a time by the receive accumulator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Checksum(u8);

impl Checksum {
    /// Start a new sum at zero
    pub const fn new() -> Self {
        Self(0)
    }

    /// Add one byte
    pub fn update(&mut self, byte: u8) {
        self.0 = self.0.wrapping_add(byte);
    }

    /// Add every byte of a slice, in order
    pub fn update_slice(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.update(byte);
        }
    }

    /// Current checksum value
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Clear back to zero
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}
