//! Frame transport over a byte stream
//!
//! The link owns the receive accumulator and a small chunk buffer. Bytes
//! left over after a complete frame stay in the buffer and are fed first on
//! the next receive, so back-to-back answers are never lost.

use appa_hal::{Uart, UartTx};
use appa_protocol::{Direction, Frame, FrameParser, Request, Response, MAX_FRAME_SIZE};
use embedded_hal::delay::DelayNs;

use crate::config::LinkConfig;
use crate::error::{Error, Result};

/// Receive chunk size, room for a few frames
const RX_BUF_SIZE: usize = 3 * MAX_FRAME_SIZE;

/// Request/response transport to one meter
pub struct Link<U, D> {
    uart: U,
    delay: D,
    config: LinkConfig,
    parser: FrameParser,
    rx_buf: [u8; RX_BUF_SIZE],
    rx_pos: usize,
    rx_len: usize,
}

impl<U, D> Link<U, D>
where
    U: Uart,
    D: DelayNs,
{
    pub fn new(uart: U, delay: D, config: LinkConfig) -> Self {
        Self {
            uart,
            delay,
            config,
            parser: FrameParser::new(Direction::Response),
            rx_buf: [0; RX_BUF_SIZE],
            rx_pos: 0,
            rx_len: 0,
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Bytes received but not yet fed to the accumulator
    pub fn buffered(&self) -> usize {
        self.rx_len - self.rx_pos
    }

    pub fn parser(&self) -> &FrameParser {
        &self.parser
    }

    /// Give back the stream and delay
    pub fn release(self) -> (U, D) {
        (self.uart, self.delay)
    }

    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }

    /// Write one frame
    pub fn send(&mut self, frame: &Frame) -> Result<(), <U as UartTx>::Error> {
        let bytes = frame.encode_to_vec().map_err(Error::Frame)?;
        trace!("TX {:?} ({} bytes)", frame.command, bytes.len());
        let written = self
            .uart
            .write_blocking(&bytes, self.config.write_timeout_ms)
            .map_err(Error::Io)?;
        if written < bytes.len() {
            return Err(Error::ShortWrite {
                written,
                expected: bytes.len(),
            });
        }
        Ok(())
    }

    /// Look for one complete frame
    ///
    /// Leftover bytes are consumed first; then at most one read is made,
    /// blocking up to the read timeout if `blocking` is set. Malformed
    /// frames are logged and skipped.
    pub fn receive(&mut self, blocking: bool) -> Result<Option<Frame>, <U as UartTx>::Error> {
        if let Some(frame) = self.feed_buffered()? {
            return Ok(Some(frame));
        }

        let n = if blocking {
            self.uart
                .read_blocking(&mut self.rx_buf, self.config.read_timeout_ms)
        } else {
            self.uart.read_nonblocking(&mut self.rx_buf)
        }
        .map_err(Error::Io)?;
        self.rx_pos = 0;
        self.rx_len = n.min(RX_BUF_SIZE);

        self.feed_buffered()
    }

    fn feed_buffered(&mut self) -> Result<Option<Frame>, <U as UartTx>::Error> {
        while self.rx_pos < self.rx_len {
            let byte = self.rx_buf[self.rx_pos];
            self.rx_pos += 1;
            match self.parser.feed(byte) {
                Ok(Some(frame)) => {
                    trace!("RX {:?} ({} bytes)", frame.command, frame.payload.len());
                    return Ok(Some(frame));
                }
                Ok(None) => {}
                Err(e) if e.is_recoverable() => {
                    warn!("Frame dropped: {:?}", e);
                }
                Err(e) => return Err(Error::Frame(e)),
            }
        }
        Ok(None)
    }

    /// Send `frame` and wait up to `timeout_ms` for any answer
    pub fn send_receive(
        &mut self,
        frame: &Frame,
        timeout_ms: u32,
    ) -> Result<Frame, <U as UartTx>::Error> {
        self.send(frame)?;
        let cycles = self.config.poll_cycles(timeout_ms);
        for cycle in 0..cycles {
            if let Some(answer) = self.receive(false)? {
                return Ok(answer);
            }
            if cycle + 1 < cycles {
                self.delay.delay_ms(self.config.poll_interval_ms);
            }
        }
        debug!("No answer to {:?} within {} ms", frame.command, timeout_ms);
        Err(Error::Timeout)
    }

    /// Typed request/response exchange
    ///
    /// A FAILURE acknowledge comes back as [`Error::DeviceFailure`].
    pub fn request(&mut self, request: &Request) -> Result<Response, <U as UartTx>::Error> {
        let frame = request.to_frame()?;
        let answer = self.send_receive(&frame, self.config.receive_timeout_ms)?;
        check_failure(Response::decode_for(request, &answer)?)
    }

    /// Send a request without waiting for the answer
    pub fn send_request(&mut self, request: &Request) -> Result<(), <U as UartTx>::Error> {
        let frame = request.to_frame()?;
        self.send(&frame)
    }

    /// Nonblocking check for the answer to an earlier [`Link::send_request`]
    pub fn poll_response(
        &mut self,
        request: &Request,
    ) -> Result<Option<Response>, <U as UartTx>::Error> {
        match self.receive(false)? {
            Some(answer) => check_failure(Response::decode_for(request, &answer)?).map(Some),
            None => Ok(None),
        }
    }

    /// Drop partial frames and anything waiting in the stream
    pub fn reset(&mut self) -> Result<(), <U as UartTx>::Error> {
        self.parser.reset();
        self.rx_pos = 0;
        self.rx_len = 0;
        self.uart.drain().map_err(Error::Io)?;
        Ok(())
    }
}

fn check_failure<E>(response: Response) -> Result<Response, E> {
    match response {
        Response::Failure(code) => Err(Error::DeviceFailure(code)),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockError, MockUart, NoopDelay};
    use appa_protocol::{
        Command, CodecError, DataContent, DisplayReading, DisplayResponse, Dot, FunctionCode,
        ReadMemoryRequest, Unit,
    };

    fn link(uart: MockUart) -> Link<MockUart, NoopDelay> {
        Link::new(uart, NoopDelay::default(), LinkConfig::default())
    }

    fn display() -> DisplayResponse {
        let reading = DisplayReading {
            reading: 12345,
            dot: Dot::Two,
            unit: Unit::Volt,
            data_content: DataContent::MeasuringData,
            overload: false,
        };
        DisplayResponse {
            function_code: FunctionCode::DcV,
            auto_test: false,
            range_code: 1,
            auto_range: true,
            primary: reading,
            secondary: reading,
        }
    }

    fn encoded(response: &Response) -> std::vec::Vec<u8> {
        response.to_frame().unwrap().encode_to_vec().unwrap().to_vec()
    }

    #[test]
    fn test_request_writes_frame_and_decodes_answer() {
        let mut uart = MockUart::new();
        uart.reply(&Response::Display(display()));
        let mut link = link(uart);

        let response = link.request(&Request::ReadDisplay).unwrap();
        assert_eq!(response, Response::Display(display()));

        let (uart, _) = link.release();
        assert_eq!(uart.written, [0x55, 0x55, 0x01, 0x00, 0xab]);
    }

    #[test]
    fn test_fragmented_answer() {
        let mut uart = MockUart::new();
        uart.chunk = 3;
        uart.reply(&Response::Display(display()));
        let mut link = link(uart);
        assert!(matches!(
            link.request(&Request::ReadDisplay),
            Ok(Response::Display(_))
        ));
    }

    #[test]
    fn test_leftover_bytes_are_kept() {
        let mut bytes = encoded(&Response::Success);
        bytes.extend(encoded(&Response::Display(display())));
        let mut uart = MockUart::new();
        uart.push_rx(&bytes);
        let mut link = link(uart);

        let first = link.receive(false).unwrap().unwrap();
        assert_eq!(first.command, Command::Success);
        assert!(link.buffered() > 0);
        let second = link.receive(false).unwrap().unwrap();
        assert_eq!(second.command, Command::ReadDisplay);
        assert_eq!(link.receive(false).unwrap(), None);
    }

    #[test]
    fn test_corrupt_frame_skipped() {
        let mut bad = encoded(&Response::Success);
        let last = bad.len() - 1;
        bad[last] ^= 0xff;
        bad.extend(encoded(&Response::Display(display())));
        let mut uart = MockUart::new();
        uart.reply_raw(&bad);
        let mut link = link(uart);
        assert_eq!(
            link.request(&Request::ReadDisplay).unwrap(),
            Response::Display(display())
        );
    }

    #[test]
    fn test_timeout_without_answer() {
        let mut uart = MockUart::new();
        uart.no_reply();
        let mut link = link(uart);
        assert_eq!(link.request(&Request::ReadDisplay), Err(Error::Timeout));
        let (_, delay) = link.release();
        assert!(delay.calls > 0);
    }

    #[test]
    fn test_failure_acknowledge() {
        let mut uart = MockUart::new();
        uart.reply(&Response::Failure(0x02));
        let mut link = link(uart);
        assert_eq!(
            link.request(&Request::ReadInformation),
            Err(Error::DeviceFailure(0x02))
        );
    }

    #[test]
    fn test_wrong_answer_is_mismatch() {
        let mut uart = MockUart::new();
        uart.reply(&Response::Success);
        let mut link = link(uart);
        assert_eq!(
            link.request(&Request::ReadDisplay),
            Err(Error::Codec(CodecError::DataMismatch))
        );
    }

    #[test]
    fn test_memory_block_longer_than_requested() {
        let block = heapless::Vec::from_slice(&[0u8; 10]).unwrap();
        let mut uart = MockUart::new();
        uart.reply(&Response::Memory(block));
        let mut link = link(uart);
        let request = Request::ReadMemory(ReadMemoryRequest {
            device: 0,
            address: 0x0a,
            length: 6,
        });
        assert_eq!(
            link.request(&request),
            Err(Error::Codec(CodecError::DataMismatch))
        );
    }

    #[test]
    fn test_short_write() {
        let mut uart = MockUart::new();
        uart.write_limit = Some(2);
        let mut link = link(uart);
        assert_eq!(
            link.send_request(&Request::ReadDisplay),
            Err(Error::ShortWrite {
                written: 2,
                expected: 5,
            })
        );
    }

    #[test]
    fn test_io_error_propagates() {
        let mut uart = MockUart::new();
        uart.fail_read = true;
        let mut link = link(uart);
        assert_eq!(link.receive(true), Err(Error::Io(MockError)));
    }

    #[test]
    fn test_reset_discards_partial_and_pending() {
        let bytes = encoded(&Response::Display(display()));
        let mut uart = MockUart::new();
        uart.chunk = 6;
        uart.push_rx(&bytes);
        let mut link = link(uart);
        assert_eq!(link.receive(false).unwrap(), None);
        assert!(!link.parser().is_empty());

        link.reset().unwrap();
        assert!(link.parser().is_empty());
        assert_eq!(link.buffered(), 0);
        assert_eq!(link.receive(false).unwrap(), None);
    }

    #[test]
    fn test_poll_response_nonblocking() {
        let mut uart = MockUart::new();
        uart.no_reply();
        let mut link = link(uart);
        link.send_request(&Request::ReadDisplay).unwrap();
        assert_eq!(link.poll_response(&Request::ReadDisplay).unwrap(), None);

        link.uart_mut().push_rx(&encoded(&Response::Display(display())));
        assert_eq!(
            link.poll_response(&Request::ReadDisplay).unwrap(),
            Some(Response::Display(display()))
        );
    }
}
