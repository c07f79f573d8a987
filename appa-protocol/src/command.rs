//! Command identifiers and the per-command payload size table
//!
//! Every command has an expected request and/or response payload size.
//! The receive accumulator and the codec consult this table to reject
//! malformed frames as early as possible.

use crate::frame::MAX_PAYLOAD_SIZE;

/// Protocol command byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    ReadInformation,
    ReadDisplay,
    ReadProtocolVersion,
    ReadBatteryLife,
    WriteUartConfiguration,
    CalReading,
    ReadMemory,
    ReadHarmonicsData,
    /// Negative acknowledge, carries one status byte
    Failure,
    /// Positive acknowledge, no payload
    Success,
    CalEnter,
    CalWriteFunctionCode,
    CalWriteRangeCode,
    CalWriteMemory,
    CalExit,
    OtaEnter,
    OtaSendInformation,
    OtaSendFirmwarePackage,
    OtaStartUpgradeProcedure,
}

// Wire format values
const CMD_READ_INFORMATION: u8 = 0x00;
const CMD_READ_DISPLAY: u8 = 0x01;
const CMD_READ_PROTOCOL_VERSION: u8 = 0x03;
const CMD_READ_BATTERY_LIFE: u8 = 0x04;
const CMD_WRITE_UART_CONFIGURATION: u8 = 0x05;
const CMD_CAL_READING: u8 = 0x10;
const CMD_READ_MEMORY: u8 = 0x1a;
const CMD_READ_HARMONICS_DATA: u8 = 0x1b;
const CMD_FAILURE: u8 = 0x70;
const CMD_SUCCESS: u8 = 0x7f;
const CMD_CAL_ENTER: u8 = 0x80;
const CMD_CAL_WRITE_FUNCTION_CODE: u8 = 0x85;
const CMD_CAL_WRITE_RANGE_CODE: u8 = 0x87;
const CMD_CAL_WRITE_MEMORY: u8 = 0x8a;
const CMD_CAL_EXIT: u8 = 0x8f;
const CMD_OTA_ENTER: u8 = 0xa0;
const CMD_OTA_SEND_INFORMATION: u8 = 0xa1;
const CMD_OTA_SEND_FIRMWARE_PACKAGE: u8 = 0xa2;
const CMD_OTA_START_UPGRADE_PROCEDURE: u8 = 0xa3;

/// Expected payload length for one direction of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SizeRule {
    /// Payload must be exactly this long
    Exact(u8),
    /// Payload may be anything from 0 up to this length
    UpTo(u8),
}

impl SizeRule {
    /// Check a declared payload length against this rule
    pub fn accepts(self, length: u8) -> bool {
        match self {
            SizeRule::Exact(n) => length == n,
            SizeRule::UpTo(max) => length <= max,
        }
    }

    /// Largest length this rule accepts
    pub fn max_len(self) -> u8 {
        match self {
            SizeRule::Exact(n) | SizeRule::UpTo(n) => n,
        }
    }
}

/// Which side of an exchange a frame travels on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Host to meter
    Request,
    /// Meter to host
    #[default]
    Response,
}

const MAX: u8 = MAX_PAYLOAD_SIZE as u8;

impl Command {
    /// Every command, in wire order
    pub const ALL: [Command; 19] = [
        Command::ReadInformation,
        Command::ReadDisplay,
        Command::ReadProtocolVersion,
        Command::ReadBatteryLife,
        Command::WriteUartConfiguration,
        Command::CalReading,
        Command::ReadMemory,
        Command::ReadHarmonicsData,
        Command::Failure,
        Command::Success,
        Command::CalEnter,
        Command::CalWriteFunctionCode,
        Command::CalWriteRangeCode,
        Command::CalWriteMemory,
        Command::CalExit,
        Command::OtaEnter,
        Command::OtaSendInformation,
        Command::OtaSendFirmwarePackage,
        Command::OtaStartUpgradeProcedure,
    ];

    /// Parse a command from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            CMD_READ_INFORMATION => Some(Command::ReadInformation),
            CMD_READ_DISPLAY => Some(Command::ReadDisplay),
            CMD_READ_PROTOCOL_VERSION => Some(Command::ReadProtocolVersion),
            CMD_READ_BATTERY_LIFE => Some(Command::ReadBatteryLife),
            CMD_WRITE_UART_CONFIGURATION => Some(Command::WriteUartConfiguration),
            CMD_CAL_READING => Some(Command::CalReading),
            CMD_READ_MEMORY => Some(Command::ReadMemory),
            CMD_READ_HARMONICS_DATA => Some(Command::ReadHarmonicsData),
            CMD_FAILURE => Some(Command::Failure),
            CMD_SUCCESS => Some(Command::Success),
            CMD_CAL_ENTER => Some(Command::CalEnter),
            CMD_CAL_WRITE_FUNCTION_CODE => Some(Command::CalWriteFunctionCode),
            CMD_CAL_WRITE_RANGE_CODE => Some(Command::CalWriteRangeCode),
            CMD_CAL_WRITE_MEMORY => Some(Command::CalWriteMemory),
            CMD_CAL_EXIT => Some(Command::CalExit),
            CMD_OTA_ENTER => Some(Command::OtaEnter),
            CMD_OTA_SEND_INFORMATION => Some(Command::OtaSendInformation),
            CMD_OTA_SEND_FIRMWARE_PACKAGE => Some(Command::OtaSendFirmwarePackage),
            CMD_OTA_START_UPGRADE_PROCEDURE => Some(Command::OtaStartUpgradeProcedure),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            Command::ReadInformation => CMD_READ_INFORMATION,
            Command::ReadDisplay => CMD_READ_DISPLAY,
            Command::ReadProtocolVersion => CMD_READ_PROTOCOL_VERSION,
            Command::ReadBatteryLife => CMD_READ_BATTERY_LIFE,
            Command::WriteUartConfiguration => CMD_WRITE_UART_CONFIGURATION,
            Command::CalReading => CMD_CAL_READING,
            Command::ReadMemory => CMD_READ_MEMORY,
            Command::ReadHarmonicsData => CMD_READ_HARMONICS_DATA,
            Command::Failure => CMD_FAILURE,
            Command::Success => CMD_SUCCESS,
            Command::CalEnter => CMD_CAL_ENTER,
            Command::CalWriteFunctionCode => CMD_CAL_WRITE_FUNCTION_CODE,
            Command::CalWriteRangeCode => CMD_CAL_WRITE_RANGE_CODE,
            Command::CalWriteMemory => CMD_CAL_WRITE_MEMORY,
            Command::CalExit => CMD_CAL_EXIT,
            Command::OtaEnter => CMD_OTA_ENTER,
            Command::OtaSendInformation => CMD_OTA_SEND_INFORMATION,
            Command::OtaSendFirmwarePackage => CMD_OTA_SEND_FIRMWARE_PACKAGE,
            Command::OtaStartUpgradeProcedure => CMD_OTA_START_UPGRADE_PROCEDURE,
        }
    }

    /// Payload size of a host-to-meter frame, `None` for answer-only commands
    pub fn request_size(self) -> Option<SizeRule> {
        use SizeRule::*;
        match self {
            Command::ReadInformation
            | Command::ReadDisplay
            | Command::ReadProtocolVersion
            | Command::ReadBatteryLife
            | Command::CalReading
            | Command::ReadHarmonicsData
            | Command::CalEnter
            | Command::CalExit
            | Command::OtaEnter => Some(Exact(0)),
            Command::WriteUartConfiguration
            | Command::CalWriteFunctionCode
            | Command::CalWriteRangeCode
            | Command::OtaStartUpgradeProcedure => Some(Exact(1)),
            Command::ReadMemory => Some(Exact(4)),
            Command::OtaSendInformation => Some(Exact(13)),
            Command::CalWriteMemory | Command::OtaSendFirmwarePackage => Some(UpTo(MAX)),
            Command::Failure | Command::Success => None,
        }
    }

    /// Payload size of a meter-to-host frame
    ///
    /// Calibration and OTA commands are answered with [`Command::Success`] or
    /// [`Command::Failure`], so they have no response size of their own.
    pub fn response_size(self) -> Option<SizeRule> {
        use SizeRule::*;
        match self {
            Command::ReadInformation => Some(Exact(52)),
            Command::ReadDisplay => Some(Exact(12)),
            Command::ReadProtocolVersion | Command::ReadBatteryLife => Some(Exact(4)),
            Command::CalReading => Some(Exact(23)),
            Command::ReadMemory => Some(UpTo(MAX)),
            Command::ReadHarmonicsData => Some(Exact(50)),
            Command::Failure => Some(Exact(1)),
            Command::Success => Some(Exact(0)),
            Command::WriteUartConfiguration
            | Command::CalEnter
            | Command::CalWriteFunctionCode
            | Command::CalWriteRangeCode
            | Command::CalWriteMemory
            | Command::CalExit
            | Command::OtaEnter
            | Command::OtaSendInformation
            | Command::OtaSendFirmwarePackage
            | Command::OtaStartUpgradeProcedure => None,
        }
    }

    /// Size rule for the given direction
    pub fn size(self, direction: Direction) -> Option<SizeRule> {
        match direction {
            Direction::Request => self.request_size(),
            Direction::Response => self.response_size(),
        }
    }

    /// Returns true if a frame carrying this command may travel in `direction`
    pub fn is_valid_for(self, direction: Direction) -> bool {
        self.size(direction).is_some()
    }
}
