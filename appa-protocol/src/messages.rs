//! Typed requests and responses
//!
//! Requests travel host to meter, responses meter to host. Both directions
//! can be encoded and decoded so a simulated meter can speak the protocol
//! too.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::command::{Command, SizeRule};
use crate::display::DisplayResponse;
use crate::frame::{Frame, FrameError, MAX_PAYLOAD_SIZE};
use crate::model::ModelId;

/// Vendor assumed when the model name has no vendor prefix
pub const DEFAULT_VENDOR: &str = "APPA";

/// Length of the space padded model name field
pub const MODEL_NAME_LEN: usize = 32;

/// Length of the space padded serial number field
pub const SERIAL_NUMBER_LEN: usize = 16;

/// Errors from encoding or decoding typed messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Command has no size for this direction or no typed layout
    Unsupported(u8),
    /// Payload size or answer command does not match what was expected
    DataMismatch,
    /// Frame could not be built
    Frame(FrameError),
}

impl From<FrameError> for CodecError {
    fn from(err: FrameError) -> Self {
        CodecError::Frame(err)
    }
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CodecError::Unsupported(cmd) => write!(f, "unsupported command 0x{cmd:02x}"),
            CodecError::DataMismatch => write!(f, "payload does not match command"),
            CodecError::Frame(err) => write!(f, "frame error: {err}"),
        }
    }
}

fn check_size(command: Command, rule: Option<SizeRule>, len: usize) -> Result<(), CodecError> {
    let rule = rule.ok_or(CodecError::Unsupported(command.to_byte()))?;
    if len > MAX_PAYLOAD_SIZE || !rule.accepts(len as u8) {
        return Err(CodecError::DataMismatch);
    }
    Ok(())
}

/// Read-memory request payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadMemoryRequest {
    /// Memory device (EEPROM bank)
    pub device: u8,
    /// Start address inside the device
    pub address: u16,
    /// Number of bytes, at most 64
    pub length: u8,
}

impl ReadMemoryRequest {
    pub const SIZE: usize = 4;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let addr = self.address.to_le_bytes();
        [self.device, addr[0], addr[1], self.length]
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        match bytes {
            &[device, lo, hi, length] => Ok(Self {
                device,
                address: u16::from_le_bytes([lo, hi]),
                length,
            }),
            _ => Err(CodecError::DataMismatch),
        }
    }
}

/// Host to meter messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    ReadInformation,
    ReadDisplay,
    ReadProtocolVersion,
    ReadBatteryLife,
    ReadMemory(ReadMemoryRequest),
}

impl Request {
    pub fn command(&self) -> Command {
        match self {
            Request::ReadInformation => Command::ReadInformation,
            Request::ReadDisplay => Command::ReadDisplay,
            Request::ReadProtocolVersion => Command::ReadProtocolVersion,
            Request::ReadBatteryLife => Command::ReadBatteryLife,
            Request::ReadMemory(_) => Command::ReadMemory,
        }
    }

    /// Encode this request into a frame
    pub fn to_frame(&self) -> Result<Frame, CodecError> {
        let command = self.command();
        match self {
            Request::ReadMemory(req) => {
                if req.length as usize > MAX_PAYLOAD_SIZE {
                    return Err(CodecError::DataMismatch);
                }
                let payload = req.encode();
                check_size(command, command.request_size(), payload.len())?;
                Ok(Frame::new(command, &payload)?)
            }
            _ => {
                check_size(command, command.request_size(), 0)?;
                Ok(Frame::empty(command))
            }
        }
    }

    /// Parse a request from a frame (meter side)
    pub fn from_frame(frame: &Frame) -> Result<Self, CodecError> {
        let command = frame.command;
        check_size(command, command.request_size(), frame.payload.len())?;
        match command {
            Command::ReadInformation => Ok(Request::ReadInformation),
            Command::ReadDisplay => Ok(Request::ReadDisplay),
            Command::ReadProtocolVersion => Ok(Request::ReadProtocolVersion),
            Command::ReadBatteryLife => Ok(Request::ReadBatteryLife),
            Command::ReadMemory => Ok(Request::ReadMemory(ReadMemoryRequest::decode(
                &frame.payload,
            )?)),
            other => Err(CodecError::Unsupported(other.to_byte())),
        }
    }
}

/// Identification answer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InformationResponse {
    /// Vendor and model, e.g. "APPA 506B"
    pub model_name: String<MODEL_NAME_LEN>,
    pub serial_number: String<SERIAL_NUMBER_LEN>,
    pub model_id: ModelId,
    /// Firmware version times 100
    pub firmware_version: u16,
}

fn decode_text<const N: usize>(bytes: &[u8]) -> Result<String<N>, CodecError> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let text = core::str::from_utf8(&bytes[..end]).map_err(|_| CodecError::DataMismatch)?;
    let text = text.trim_matches(|c: char| c == ' ' || c == '\0');
    let mut out = String::new();
    out.push_str(text).map_err(|_| CodecError::DataMismatch)?;
    Ok(out)
}

fn encode_text(text: &str, out: &mut [u8]) {
    out.fill(b' ');
    let len = text.len().min(out.len());
    out[..len].copy_from_slice(&text.as_bytes()[..len]);
}

impl InformationResponse {
    pub const SIZE: usize = MODEL_NAME_LEN + SERIAL_NUMBER_LEN + 4;

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != Self::SIZE {
            return Err(CodecError::DataMismatch);
        }
        let (name, rest) = bytes.split_at(MODEL_NAME_LEN);
        let (serial, ids) = rest.split_at(SERIAL_NUMBER_LEN);
        Ok(Self {
            model_name: decode_text(name)?,
            serial_number: decode_text(serial)?,
            model_id: ModelId::from_raw(u16::from_le_bytes([ids[0], ids[1]])),
            firmware_version: u16::from_le_bytes([ids[2], ids[3]]),
        })
    }

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        encode_text(&self.model_name, &mut out[..MODEL_NAME_LEN]);
        encode_text(
            &self.serial_number,
            &mut out[MODEL_NAME_LEN..MODEL_NAME_LEN + SERIAL_NUMBER_LEN],
        );
        let ids = MODEL_NAME_LEN + SERIAL_NUMBER_LEN;
        out[ids..ids + 2].copy_from_slice(&self.model_id.to_raw().to_le_bytes());
        out[ids + 2..ids + 4].copy_from_slice(&self.firmware_version.to_le_bytes());
        out
    }

    /// Split the model name on its last space into vendor and model
    pub fn vendor_and_model(&self) -> (&str, &str) {
        match self.model_name.rsplit_once(' ') {
            Some((vendor, model)) => (vendor.trim_end(), model),
            None => (DEFAULT_VENDOR, self.model_name.as_str()),
        }
    }

    pub fn vendor(&self) -> &str {
        self.vendor_and_model().0
    }

    pub fn model(&self) -> &str {
        self.vendor_and_model().1
    }

    /// Firmware version as "major.minor", e.g. 201 is "2.01"
    pub fn firmware_version_string(&self) -> String<8> {
        let mut out = String::new();
        // "655.35" is the longest possible value and always fits
        let _ = write!(
            out,
            "{}.{:02}",
            self.firmware_version / 100,
            self.firmware_version % 100
        );
        out
    }
}

/// Meter to host messages
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    Information(InformationResponse),
    Display(DisplayResponse),
    /// Raw protocol version block; the layout is not documented
    ProtocolVersion([u8; 4]),
    /// Raw battery block; the layout is not documented
    BatteryLife([u8; 4]),
    /// Memory block, as long as the frame declares
    Memory(Vec<u8, MAX_PAYLOAD_SIZE>),
    Success,
    /// Negative acknowledge with the meter's status byte
    Failure(u8),
}

impl Response {
    pub fn command(&self) -> Command {
        match self {
            Response::Information(_) => Command::ReadInformation,
            Response::Display(_) => Command::ReadDisplay,
            Response::ProtocolVersion(_) => Command::ReadProtocolVersion,
            Response::BatteryLife(_) => Command::ReadBatteryLife,
            Response::Memory(_) => Command::ReadMemory,
            Response::Success => Command::Success,
            Response::Failure(_) => Command::Failure,
        }
    }

    /// Parse a response from a frame
    pub fn from_frame(frame: &Frame) -> Result<Self, CodecError> {
        let command = frame.command;
        let payload = frame.payload.as_slice();
        check_size(command, command.response_size(), payload.len())?;
        match command {
            Command::ReadInformation => Ok(Response::Information(InformationResponse::decode(
                payload,
            )?)),
            Command::ReadDisplay => DisplayResponse::decode(payload)
                .map(Response::Display)
                .ok_or(CodecError::DataMismatch),
            Command::ReadProtocolVersion => Ok(Response::ProtocolVersion(fixed4(payload)?)),
            Command::ReadBatteryLife => Ok(Response::BatteryLife(fixed4(payload)?)),
            Command::ReadMemory => Ok(Response::Memory(frame.payload.clone())),
            Command::Success => Ok(Response::Success),
            Command::Failure => Ok(Response::Failure(payload[0])),
            other => Err(CodecError::Unsupported(other.to_byte())),
        }
    }

    /// Parse the answer to `request`
    ///
    /// A [`Response::Failure`] answers any request. Any other command that
    /// differs from the request's is a [`CodecError::DataMismatch`].
    pub fn decode_for(request: &Request, frame: &Frame) -> Result<Self, CodecError> {
        if frame.command != Command::Failure && frame.command != request.command() {
            return Err(CodecError::DataMismatch);
        }
        let response = Self::from_frame(frame)?;
        if let (Request::ReadMemory(req), Response::Memory(block)) = (request, &response) {
            if block.len() > req.length as usize {
                return Err(CodecError::DataMismatch);
            }
        }
        Ok(response)
    }

    /// Encode this response into a frame (meter side)
    pub fn to_frame(&self) -> Result<Frame, CodecError> {
        let command = self.command();
        let frame = match self {
            Response::Information(info) => Frame::new(command, &info.encode())?,
            Response::Display(display) => Frame::new(command, &display.encode())?,
            Response::ProtocolVersion(raw) | Response::BatteryLife(raw) => {
                Frame::new(command, raw)?
            }
            Response::Memory(block) => Frame::new(command, block)?,
            Response::Success => Frame::empty(command),
            Response::Failure(code) => Frame::new(command, &[*code])?,
        };
        check_size(command, command.response_size(), frame.payload.len())?;
        Ok(frame)
    }
}

fn fixed4(payload: &[u8]) -> Result<[u8; 4], CodecError> {
    payload.try_into().map_err(|_| CodecError::DataMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DataContent, DisplayReading, Dot, FunctionCode, Unit};
    use proptest::prelude::*;

    fn info(name: &str, firmware_version: u16) -> InformationResponse {
        InformationResponse {
            model_name: String::try_from(name).unwrap(),
            serial_number: String::try_from("12345678").unwrap(),
            model_id: ModelId::Appa150B,
            firmware_version,
        }
    }

    #[test]
    fn test_read_display_request_frame() {
        let frame = Request::ReadDisplay.to_frame().unwrap();
        assert_eq!(
            frame.encode_to_vec().unwrap().as_slice(),
            &[0x55, 0x55, 0x01, 0x00, 0xab]
        );
    }

    #[test]
    fn test_read_memory_request_layout() {
        let req = Request::ReadMemory(ReadMemoryRequest {
            device: 1,
            address: 0x1234,
            length: 60,
        });
        let frame = req.to_frame().unwrap();
        assert_eq!(frame.payload.as_slice(), &[0x01, 0x34, 0x12, 60]);
        assert_eq!(Request::from_frame(&frame).unwrap(), req);
    }

    #[test]
    fn test_read_memory_request_too_long() {
        let req = Request::ReadMemory(ReadMemoryRequest {
            device: 0,
            address: 0,
            length: 65,
        });
        assert_eq!(req.to_frame(), Err(CodecError::DataMismatch));
    }

    #[test]
    fn test_information_vendor_split() {
        let info = info("APPA 150B", 201);
        assert_eq!(info.vendor(), "APPA");
        assert_eq!(info.model(), "150B");
        assert_eq!(info.firmware_version_string().as_str(), "2.01");
    }

    #[test]
    fn test_information_without_vendor() {
        let info = info("BENNING", 1000);
        assert_eq!(info.vendor(), DEFAULT_VENDOR);
        assert_eq!(info.model(), "BENNING");
        assert_eq!(info.firmware_version_string().as_str(), "10.00");
    }

    #[test]
    fn test_information_multi_word_vendor() {
        let info = info("BENNING MM 12", 5);
        assert_eq!(info.vendor_and_model(), ("BENNING MM", "12"));
        assert_eq!(info.firmware_version_string().as_str(), "0.05");
    }

    #[test]
    fn test_information_decode_trims_padding() {
        let mut payload = [b' '; InformationResponse::SIZE];
        payload[..9].copy_from_slice(b"APPA 506B");
        payload[32..36].copy_from_slice(b"0042");
        payload[36] = 0;
        payload[37] = 0;
        payload[48..50].copy_from_slice(&0x0006u16.to_le_bytes());
        payload[50..52].copy_from_slice(&201u16.to_le_bytes());

        let frame = Frame::new(Command::ReadInformation, &payload).unwrap();
        let Response::Information(info) = Response::from_frame(&frame).unwrap() else {
            panic!("expected information response");
        };
        assert_eq!(info.model_name.as_str(), "APPA 506B");
        assert_eq!(info.serial_number.as_str(), "0042");
        assert_eq!(info.model_id, ModelId::Appa506B);
        assert_eq!(info.firmware_version, 201);
    }

    #[test]
    fn test_response_size_mismatch() {
        let frame = Frame::new(Command::ReadDisplay, &[0u8; 11]).unwrap();
        assert_eq!(Response::from_frame(&frame), Err(CodecError::DataMismatch));
    }

    #[test]
    fn test_response_without_layout_is_unsupported() {
        let frame = Frame::new(Command::CalReading, &[0u8; 23]).unwrap();
        assert_eq!(Response::from_frame(&frame), Err(CodecError::Unsupported(0x10)));
        let frame = Frame::empty(Command::CalEnter);
        assert_eq!(Response::from_frame(&frame), Err(CodecError::Unsupported(0x80)));
    }

    #[test]
    fn test_decode_for_checks_command() {
        let frame = Response::Success.to_frame().unwrap();
        assert_eq!(
            Response::decode_for(&Request::ReadDisplay, &frame),
            Err(CodecError::DataMismatch)
        );
        let frame = Response::Failure(3).to_frame().unwrap();
        assert_eq!(
            Response::decode_for(&Request::ReadDisplay, &frame),
            Ok(Response::Failure(3))
        );
    }

    #[test]
    fn test_decode_for_memory_length() {
        let request = Request::ReadMemory(ReadMemoryRequest {
            device: 0,
            address: 0x0a,
            length: 6,
        });
        let frame = Frame::new(Command::ReadMemory, &[0u8; 10]).unwrap();
        assert_eq!(
            Response::decode_for(&request, &frame),
            Err(CodecError::DataMismatch)
        );
        let frame = Frame::new(Command::ReadMemory, &[0u8; 6]).unwrap();
        assert!(matches!(
            Response::decode_for(&request, &frame),
            Ok(Response::Memory(block)) if block.len() == 6
        ));
    }

    fn reading() -> impl Strategy<Value = DisplayReading> {
        (-0x80_0000i32..0x80_0000, 0u8..8, 0u8..32, 0u8..128, any::<bool>()).prop_map(
            |(reading, dot, unit, content, overload)| DisplayReading {
                reading,
                dot: Dot::from_raw(dot),
                unit: Unit::from_raw(unit),
                data_content: DataContent::from_raw(content),
                overload,
            },
        )
    }

    fn request() -> impl Strategy<Value = Request> {
        prop_oneof![
            Just(Request::ReadInformation),
            Just(Request::ReadDisplay),
            Just(Request::ReadProtocolVersion),
            Just(Request::ReadBatteryLife),
            (any::<u8>(), any::<u16>(), 0u8..=64).prop_map(|(device, address, length)| {
                Request::ReadMemory(ReadMemoryRequest {
                    device,
                    address,
                    length,
                })
            }),
        ]
    }

    fn response() -> impl Strategy<Value = Response> {
        prop_oneof![
            ("[A-Z]{1,8}( [0-9A-Z]{1,8})?", "[0-9]{0,16}", any::<u16>(), any::<u16>()).prop_map(
                |(name, serial, id, fw)| Response::Information(InformationResponse {
                    model_name: String::try_from(name.as_str()).unwrap(),
                    serial_number: String::try_from(serial.as_str()).unwrap(),
                    model_id: ModelId::from_raw(id),
                    firmware_version: fw,
                })
            ),
            (0u8..128, any::<bool>(), 0u8..128, any::<bool>(), reading(), reading()).prop_map(
                |(fc, auto_test, range_code, auto_range, primary, secondary)| {
                    Response::Display(DisplayResponse {
                        function_code: FunctionCode::from_raw(fc),
                        auto_test,
                        range_code,
                        auto_range,
                        primary,
                        secondary,
                    })
                }
            ),
            any::<[u8; 4]>().prop_map(Response::ProtocolVersion),
            any::<[u8; 4]>().prop_map(Response::BatteryLife),
            prop::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_SIZE)
                .prop_map(|v| Response::Memory(Vec::from_slice(&v).unwrap())),
            Just(Response::Success),
            any::<u8>().prop_map(Response::Failure),
        ]
    }

    proptest! {
        #[test]
        fn test_request_roundtrip(req in request()) {
            let frame = req.to_frame().unwrap();
            prop_assert_eq!(Request::from_frame(&frame).unwrap(), req);
        }

        #[test]
        fn test_response_roundtrip(resp in response()) {
            let frame = resp.to_frame().unwrap();
            prop_assert_eq!(Response::from_frame(&frame).unwrap(), resp);
        }
    }
}
