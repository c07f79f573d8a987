//! Scripted meter for link and session tests

use std::collections::VecDeque;
use std::vec::Vec;

use appa_hal::{UartRx, UartTx};
use appa_protocol::Response;
use embedded_hal::delay::DelayNs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

/// Byte stream that answers each write with the next scripted reply
#[derive(Debug, Default)]
pub struct MockUart {
    rx: VecDeque<u8>,
    replies: VecDeque<Vec<u8>>,
    /// Every byte written, in order
    pub written: Vec<u8>,
    /// Number of write calls
    pub writes: usize,
    /// Bytes handed out per read call, 0 for unlimited
    pub chunk: usize,
    /// Accept only this many bytes per write
    pub write_limit: Option<usize>,
    /// Fail the next read
    pub fail_read: bool,
}

impl MockUart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue raw bytes as the reply to the next write
    pub fn reply_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.replies.push_back(bytes.to_vec());
        self
    }

    /// Queue a response frame as the reply to the next write
    pub fn reply(&mut self, response: &Response) -> &mut Self {
        let frame = response.to_frame().unwrap();
        self.reply_raw(&frame.encode_to_vec().unwrap())
    }

    /// Queue silence as the reply to the next write
    pub fn no_reply(&mut self) -> &mut Self {
        self.reply_raw(&[])
    }

    /// Make bytes readable right away, without a write
    pub fn push_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }


    fn read(&mut self, buf: &mut [u8]) -> Result<usize, MockError> {
        if self.fail_read {
            self.fail_read = false;
            return Err(MockError);
        }
        let limit = if self.chunk == 0 { buf.len() } else { self.chunk.min(buf.len()) };
        let mut n = 0;
        while n < limit {
            match self.rx.pop_front() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl UartTx for MockUart {
    type Error = MockError;

    fn write_blocking(&mut self, data: &[u8], _timeout_ms: u32) -> Result<usize, MockError> {
        self.writes += 1;
        let n = self.write_limit.map_or(data.len(), |limit| limit.min(data.len()));
        self.written.extend_from_slice(&data[..n]);
        if let Some(reply) = self.replies.pop_front() {
            self.rx.extend(reply);
        }
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), MockError> {
        Ok(())
    }
}

impl UartRx for MockUart {
    type Error = MockError;

    fn read_blocking(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize, MockError> {
        self.read(buf)
    }

    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize, MockError> {
        self.read(buf)
    }
}

/// Delay that returns immediately and counts calls
#[derive(Debug, Default)]
pub struct NoopDelay {
    pub calls: usize,
}

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {
        self.calls += 1;
    }
}
