//! Error type for link and meter operations

use appa_protocol::{CodecError, FrameError};

use crate::storage::StorageError;

/// Errors surfaced to the caller
///
/// `E` is the byte-stream error type. Protocol violations and checksum
/// mismatches never show up here; the link recovers from them itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Byte stream failure
    Io(E),
    /// Blocking write gave up before all bytes were sent
    ShortWrite { written: usize, expected: usize },
    /// Unrecoverable framing failure
    Frame(FrameError),
    /// Response did not decode as an answer to the request
    Codec(CodecError),
    /// Meter answered with a FAILURE acknowledge
    DeviceFailure(u8),
    /// No response within the poll budget
    Timeout,
    /// Storage paging failure
    Storage(StorageError),
    /// Error counter exceeded its ceiling
    Unresponsive,
    /// Operation needs the model id from a prior identification
    NotIdentified,
}

impl<E> Error<E> {
    /// Soft failures may be retried while the error budget allows
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Timeout | Error::Codec(CodecError::DataMismatch) | Error::DeviceFailure(_)
        )
    }
}

impl<E> From<CodecError> for Error<E> {
    fn from(err: CodecError) -> Self {
        Error::Codec(err)
    }
}

impl<E> From<StorageError> for Error<E> {
    fn from(err: StorageError) -> Self {
        Error::Storage(err)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {err:?}"),
            Error::ShortWrite { written, expected } => {
                write!(f, "short write: {written} of {expected} bytes")
            }
            Error::Frame(err) => write!(f, "{err}"),
            Error::Codec(err) => write!(f, "{err}"),
            Error::DeviceFailure(code) => write!(f, "meter reported failure 0x{code:02x}"),
            Error::Timeout => write!(f, "no response from meter"),
            Error::Storage(err) => write!(f, "{err}"),
            Error::Unresponsive => write!(f, "meter unresponsive, too many errors"),
            Error::NotIdentified => write!(f, "meter not identified"),
        }
    }
}

pub type Result<T, E> = core::result::Result<T, Error<E>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(Error::<()>::Timeout.is_retryable());
        assert!(Error::<()>::Codec(CodecError::DataMismatch).is_retryable());
        assert!(!Error::<()>::Io(()).is_retryable());
        assert!(!Error::<()>::Storage(StorageError::OutOfRange).is_retryable());
        assert!(!Error::<()>::Codec(CodecError::Unsupported(0x10)).is_retryable());
    }

    #[test]
    fn test_display() {
        let err: Error<()> = Error::ShortWrite {
            written: 2,
            expected: 5,
        };
        assert_eq!(std::format!("{err}"), "short write: 2 of 5 bytes");
        assert_eq!(
            std::format!("{}", Error::<()>::DeviceFailure(0x0a)),
            "meter reported failure 0x0a"
        );
    }
}
