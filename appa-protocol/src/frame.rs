//! Frame encoding and the receive accumulator.
//!
//! Frame format:
//! - START (2 bytes): 0x55 0x55 synchronization marker
//! - COMMAND (1 byte): command identifier
//! - LENGTH (1 byte): payload length (0-64)
//! - PAYLOAD (0-64 bytes): command-specific data
//! - CHECKSUM (1 byte): low 8 bits of the sum of all preceding bytes

use heapless::Vec;

use crate::checksum::{checksum, Checksum};
use crate::command::{Command, Direction};

/// Frame synchronization byte, sent twice
pub const START_BYTE: u8 = 0x55;

/// START + START + COMMAND + LENGTH
pub const HEADER_SIZE: usize = 4;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 64;

/// Maximum complete frame size (HEADER + MAX_PAYLOAD + CHECKSUM)
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE + 1;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Buffer too small for encoding
    BufferTooSmall,
    /// Command byte is not valid in the expected direction
    UnknownCommand(u8),
    /// Declared length does not fit the command's size rule
    BadLength { command: u8, length: u8 },
    /// Trailing checksum does not match the received bytes
    ChecksumMismatch { expected: u8, actual: u8 },
    /// More bytes buffered than any frame can hold
    Overflow,
}

impl FrameError {
    /// Errors the accumulator recovers from on its own by resetting
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FrameError::UnknownCommand(_)
                | FrameError::BadLength { .. }
                | FrameError::ChecksumMismatch { .. }
        )
    }
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FrameError::PayloadTooLarge => write!(f, "payload exceeds {MAX_PAYLOAD_SIZE} bytes"),
            FrameError::BufferTooSmall => write!(f, "encode buffer too small"),
            FrameError::UnknownCommand(cmd) => write!(f, "unexpected command 0x{cmd:02x}"),
            FrameError::BadLength { command, length } => {
                write!(f, "bad length {length} for command 0x{command:02x}")
            }
            FrameError::ChecksumMismatch { expected, actual } => {
                write!(f, "checksum mismatch: expected 0x{expected:02x}, got 0x{actual:02x}")
            }
            FrameError::Overflow => write!(f, "receive buffer overflow"),
        }
    }
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Command identifier
    pub command: Command,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given command and payload
    pub fn new(command: Command, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge);
        }

        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self {
            command,
            payload: payload_vec,
        })
    }

    /// Create a frame with no payload
    pub fn empty(command: Command) -> Self {
        Self {
            command,
            payload: Vec::new(),
        }
    }

    /// Declared payload length
    pub fn length(&self) -> u8 {
        self.payload.len() as u8
    }

    /// Number of bytes this frame occupies on the wire
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len() + 1
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.encoded_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[0] = START_BYTE;
        buffer[1] = START_BYTE;
        buffer[2] = self.command.to_byte();
        buffer[3] = self.length();
        buffer[HEADER_SIZE..HEADER_SIZE + self.payload.len()].copy_from_slice(&self.payload);
        buffer[frame_len - 1] = checksum(&buffer[..frame_len - 1]);

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }
}

/// Receive accumulator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseState {
    /// Waiting for the first START byte
    Empty,
    /// Got one START, waiting for the second
    HaveStart1,
    /// Got both START bytes, waiting for COMMAND
    HaveStart2,
    /// Got COMMAND, waiting for LENGTH
    HaveCommand,
    /// Header complete, no payload yet
    HaveLength,
    /// Reading payload bytes
    Accumulating,
}

/// Receive accumulator: turns a byte stream into validated frames
///
/// Bytes are fed one at a time. Stray bytes before a start marker are
/// dropped silently. A header that fails validation resets the accumulator
/// and is reported as a recoverable [`FrameError`]. After a frame completes,
/// with or without a valid checksum, the accumulator is empty again.
#[derive(Debug, Clone)]
pub struct FrameParser {
    direction: Direction,
    state: ParseState,
    buffer: Vec<u8, MAX_FRAME_SIZE>,
    checksum: Checksum,
    expected_length: u8,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new(Direction::Response)
    }
}

impl FrameParser {
    /// Create a parser that accepts frames travelling in `direction`
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            state: ParseState::Empty,
            buffer: Vec::new(),
            checksum: Checksum::new(),
            expected_length: 0,
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::Empty;
        self.buffer.clear();
        self.checksum.reset();
        self.expected_length = 0;
    }

    /// Current state
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Number of bytes buffered for the frame in flight
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if no partial frame is buffered
    pub fn is_empty(&self) -> bool {
        self.state == ParseState::Empty && self.buffer.is_empty()
    }

    /// Direction this parser validates against
    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn accept(&mut self, byte: u8) -> Result<(), FrameError> {
        if self.buffer.push(byte).is_err() {
            self.reset();
            return Err(FrameError::Overflow);
        }
        self.checksum.update(byte);
        Ok(())
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` when the frame in
    /// flight was discarded.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        if self.buffer.len() > MAX_FRAME_SIZE - 1 {
            self.reset();
            return Err(FrameError::Overflow);
        }

        match self.state {
            ParseState::Empty => {
                // Silently ignore non-START bytes while waiting
                if byte == START_BYTE {
                    self.accept(byte)?;
                    self.state = ParseState::HaveStart1;
                }
                Ok(None)
            }
            ParseState::HaveStart1 => {
                if byte == START_BYTE {
                    self.accept(byte)?;
                    self.state = ParseState::HaveStart2;
                } else {
                    self.reset();
                }
                Ok(None)
            }
            ParseState::HaveStart2 => {
                let known = Command::from_byte(byte).is_some_and(|c| c.is_valid_for(self.direction));
                if known {
                    self.accept(byte)?;
                    self.state = ParseState::HaveCommand;
                    Ok(None)
                } else if byte == START_BYTE {
                    // A run of start markers: the last two are the real ones
                    Ok(None)
                } else {
                    self.reset();
                    Err(FrameError::UnknownCommand(byte))
                }
            }
            ParseState::HaveCommand => {
                let command = self.buffer[2];
                let fits = (byte as usize) <= MAX_PAYLOAD_SIZE
                    && Command::from_byte(command)
                        .and_then(|c| c.size(self.direction))
                        .is_some_and(|rule| rule.accepts(byte));
                if !fits {
                    self.reset();
                    if byte == START_BYTE {
                        self.accept(byte)?;
                        self.state = ParseState::HaveStart1;
                    }
                    return Err(FrameError::BadLength {
                        command,
                        length: byte,
                    });
                }
                self.accept(byte)?;
                self.expected_length = byte;
                self.state = ParseState::HaveLength;
                Ok(None)
            }
            ParseState::HaveLength | ParseState::Accumulating => {
                if self.buffer.len() < HEADER_SIZE + self.expected_length as usize {
                    self.accept(byte)?;
                    self.state = ParseState::Accumulating;
                    return Ok(None);
                }
                self.complete(byte)
            }
        }
    }

    fn complete(&mut self, received: u8) -> Result<Option<Frame>, FrameError> {
        let expected = self.checksum.value();
        let command = Command::from_byte(self.buffer[2]);
        let payload = Vec::from_slice(&self.buffer[HEADER_SIZE..]);
        self.reset();

        if received != expected {
            return Err(FrameError::ChecksumMismatch {
                expected,
                actual: received,
            });
        }

        match (command, payload) {
            (Some(command), Ok(payload)) => Ok(Some(Frame { command, payload })),
            _ => Err(FrameError::Overflow),
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Frame>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}
