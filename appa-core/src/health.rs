//! Link health tracking
//!
//! Consecutive failures push the counter up, successful exchanges pull it
//! back down. Once it passes the ceiling the meter is considered gone.

/// Error counter with a configurable ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkHealth {
    errors: u8,
    max_errors: u8,
}

impl LinkHealth {
    pub fn new(max_errors: u8) -> Self {
        Self {
            errors: 0,
            max_errors,
        }
    }

    /// Count a failure
    ///
    /// Returns true once the ceiling has been exceeded.
    pub fn record_error(&mut self) -> bool {
        self.errors = self.errors.saturating_add(1);
        self.is_exceeded()
    }

    /// Count a success
    pub fn record_success(&mut self) {
        self.errors = self.errors.saturating_sub(1);
    }

    pub fn is_exceeded(&self) -> bool {
        self.errors > self.max_errors
    }

    pub fn error_count(&self) -> u8 {
        self.errors
    }

    pub fn max_errors(&self) -> u8 {
        self.max_errors
    }

    pub fn reset(&mut self) {
        self.errors = 0;
    }
}
