//! Display records
//!
//! A display record describes what one of the meter's displays shows: a
//! 24-bit reading plus the decimal point position, unit, data content and
//! overload marker. The live display answer carries two of them behind a
//! two-byte header; stored MEM/LOG entries use the bare 5-byte record.

wire_enum! {
    /// Decimal point position
    pub enum Dot: u8 {
        /// 99999
        None = 0x00,
        /// 9999.9
        One = 0x01,
        /// 999.99
        Two = 0x02,
        /// 99.999
        Three = 0x03,
        /// 9.9999
        Four = 0x04,
    }
}

impl Dot {
    /// Number of decimals shown; unknown positions count as none
    pub fn decimals(self) -> u8 {
        match self {
            Dot::None | Dot::Unknown(_) => 0,
            Dot::One => 1,
            Dot::Two => 2,
            Dot::Three => 3,
            Dot::Four => 4,
        }
    }
}

wire_enum! {
    /// Unit shown next to the reading
    pub enum Unit: u8 {
        None = 0x00,
        Volt = 0x01,
        MilliVolt = 0x02,
        Ampere = 0x03,
        MilliAmpere = 0x04,
        Decibel = 0x05,
        DecibelMilliwatt = 0x06,
        MilliFarad = 0x07,
        MicroFarad = 0x08,
        NanoFarad = 0x09,
        GigaOhm = 0x0a,
        MegaOhm = 0x0b,
        KiloOhm = 0x0c,
        Ohm = 0x0d,
        /// Relative percentage
        Percent = 0x0e,
        MegaHertz = 0x0f,
        KiloHertz = 0x10,
        Hertz = 0x11,
        DegreeCelsius = 0x12,
        DegreeFahrenheit = 0x13,
        Second = 0x14,
        MilliSecond = 0x15,
        MicroSecond = 0x16,
        NanoSecond = 0x17,
        MicroAmpere = 0x18,
        Minute = 0x19,
        KiloWatt = 0x1a,
        PowerFactor = 0x1b,
    }
}

wire_enum! {
    /// Sub-mode of the value on a display
    pub enum DataContent: u8 {
        MeasuringData = 0x00,
        Frequency = 0x01,
        Cycle = 0x02,
        Duty = 0x03,
        MemoryStamp = 0x04,
        MemorySave = 0x05,
        MemoryLoad = 0x06,
        LogSave = 0x07,
        LogLoad = 0x08,
        LogRate = 0x09,
        RelativeDelta = 0x0a,
        RelativePercent = 0x0b,
        RelativeReference = 0x0c,
        Maximum = 0x0d,
        Minimum = 0x0e,
        Average = 0x0f,
        PeakHoldMax = 0x10,
        PeakHoldMin = 0x11,
        Dbm = 0x12,
        Db = 0x13,
        AutoHold = 0x14,
        Setup = 0x15,
        LogStamp = 0x16,
        LogMax = 0x17,
        LogMin = 0x18,
        LogTp = 0x19,
        Hold = 0x1a,
        CurrentOutput = 0x1b,
        CurrentOutput0To20mAPercent = 0x1c,
        CurrentOutput4To20mAPercent = 0x1d,
    }
}

wire_enum! {
    /// Rotary switch position / measurement mode
    pub enum FunctionCode: u8 {
        None = 0x00,
        AcV = 0x01,
        DcV = 0x02,
        AcMv = 0x03,
        DcMv = 0x04,
        Ohm = 0x05,
        Continuity = 0x06,
        Diode = 0x07,
        Capacitance = 0x08,
        AcA = 0x09,
        DcA = 0x0a,
        AcMa = 0x0b,
        DcMa = 0x0c,
        DegreeCelsius = 0x0d,
        DegreeFahrenheit = 0x0e,
        Frequency = 0x0f,
        Duty = 0x10,
        HzV = 0x11,
        HzMv = 0x12,
        HzA = 0x13,
        HzMa = 0x14,
        AcDcV = 0x15,
        AcDcMv = 0x16,
        AcDcA = 0x17,
        AcDcMa = 0x18,
        LpfV = 0x19,
        LpfMv = 0x1a,
        LpfA = 0x1b,
        LpfMa = 0x1c,
        AcUa = 0x1d,
        DcUa = 0x1e,
        DcAOut = 0x1f,
        DcAOutSlowLinear = 0x20,
        DcAOutFastLinear = 0x21,
        DcAOutSlowStep = 0x22,
        DcAOutFastStep = 0x23,
        LoopPower = 0x24,
        Hart250Ohm = 0x25,
        VoltSense = 0x26,
        PeakHoldV = 0x27,
        PeakHoldMv = 0x28,
        PeakHoldA = 0x29,
        PeakHoldMa = 0x2a,
        LozAcV = 0x2b,
        LozDcV = 0x2c,
        LozAcDcV = 0x2d,
        LozLpfV = 0x2e,
        LozHzV = 0x2f,
        LozPeakHoldV = 0x30,
        Battery = 0x31,
        AcW = 0x32,
        DcW = 0x33,
        PowerFactor = 0x34,
        FlexAcA = 0x35,
        FlexLpfA = 0x36,
        FlexPeakHoldA = 0x37,
        FlexHzA = 0x38,
        VHarmonics = 0x39,
        Inrush = 0x3a,
        AHarmonics = 0x3b,
        FlexInrush = 0x3c,
        FlexAHarmonics = 0x3d,
        PeakHoldUa = 0x3e,
        AcUaHfr = 0x3f,
        AcVHfr = 0x40,
        AcMvHfr = 0x41,
        AcAHfr = 0x42,
        AcMaHfr = 0x43,
        AcUaHfr2 = 0x44,
        DcVPv = 0x45,
        AcVPv = 0x46,
        AcVPvHfr = 0x47,
        AcDcVPv = 0x48,
    }
}

/// Raw readings at or above this value are word codes, not numbers
pub const WORD_CODE_THRESHOLD: i32 = 0x70_0000;

wire_enum! {
    /// Non-numeric display states
    pub enum WordCode: u32 {
        Space = 0x70_0000,
        Full = 0x70_0001,
        Beep = 0x70_0002,
        AutoPowerOff = 0x70_0003,
        Backlight = 0x70_0004,
        Hazard = 0x70_0005,
        On = 0x70_0006,
        Off = 0x70_0007,
        Reset = 0x70_0008,
        Start = 0x70_0009,
        View = 0x70_000a,
        Pause = 0x70_000b,
        Fuse = 0x70_000c,
        Probe = 0x70_000d,
        Definition = 0x70_000e,
        Clear = 0x70_000f,
        Er = 0x70_0010,
        Er1 = 0x70_0011,
        Er2 = 0x70_0012,
        Er3 = 0x70_0013,
        /// "-----"
        Dash = 0x70_0014,
        /// "-"
        Dash1 = 0x70_0015,
        Test = 0x70_0016,
        /// "--"
        Dash2 = 0x70_0017,
        Battery = 0x70_0018,
        DisplayLight = 0x70_0019,
        Noise = 0x70_001a,
        Filter = 0x70_001b,
        Pass = 0x70_001c,
        Null = 0x70_001d,
        Range0To20 = 0x70_001e,
        Range4To20 = 0x70_001f,
        Rate = 0x70_0020,
        Save = 0x70_0021,
        Load = 0x70_0022,
        Yes = 0x70_0023,
        Send = 0x70_0024,
        AutoHold = 0x70_0025,
        Auto = 0x70_0026,
        Continuity = 0x70_0027,
        Calibration = 0x70_0028,
        Version = 0x70_0029,
        Overload = 0x70_002a,
        BatteryFull = 0x70_002b,
        BatteryHalf = 0x70_002c,
        Lo = 0x70_002d,
        Hi = 0x70_002e,
        Digits = 0x70_002f,
        Ready = 0x70_0030,
        Disconnect = 0x70_0031,
        OutF = 0x70_0032,
        OverloadA = 0x70_0033,
        OverloadV = 0x70_0034,
        OverloadVa = 0x70_0035,
        Bad = 0x70_0036,
        Temperature = 0x70_0037,
    }
}

/// How loudly a word code should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Severity {
    /// Blank or dashed display, nothing to report
    Silent,
    /// Informational message
    Warning,
    /// Meter reports a fault
    Error,
}

impl WordCode {
    /// Resolve a raw reading, `None` if it is a number
    pub fn from_reading(reading: i32) -> Option<Self> {
        if reading >= WORD_CODE_THRESHOLD {
            Some(Self::from_raw(reading as u32))
        } else {
            None
        }
    }

    /// Text as the meter shows it
    pub fn name(self) -> &'static str {
        match self {
            WordCode::Space => "",
            WordCode::Full => "Full",
            WordCode::Beep => "Beep",
            WordCode::AutoPowerOff => "Auto Power-Off",
            WordCode::Backlight => "Backlight",
            WordCode::Hazard => "Hazard",
            WordCode::On => "On",
            WordCode::Off => "Off",
            WordCode::Reset => "Reset",
            WordCode::Start => "Start",
            WordCode::View => "View",
            WordCode::Pause => "Pause",
            WordCode::Fuse => "Fuse",
            WordCode::Probe => "Probe",
            WordCode::Definition => "Definition",
            WordCode::Clear => "Clr",
            WordCode::Er => "Er",
            WordCode::Er1 => "Er1",
            WordCode::Er2 => "Er2",
            WordCode::Er3 => "Er3",
            WordCode::Dash => "-----",
            WordCode::Dash1 => "-",
            WordCode::Test => "Test",
            WordCode::Dash2 => "--",
            WordCode::Battery => "Battery",
            WordCode::DisplayLight => "diSLt",
            WordCode::Noise => "Noise",
            WordCode::Filter => "Filter",
            WordCode::Pass => "PASS",
            WordCode::Null => "null",
            WordCode::Range0To20 => "0 - 20",
            WordCode::Range4To20 => "4 - 20",
            WordCode::Rate => "Rate",
            WordCode::Save => "Save",
            WordCode::Load => "Load",
            WordCode::Yes => "Yes",
            WordCode::Send => "Send",
            WordCode::AutoHold => "Auto Hold",
            WordCode::Auto => "Auto",
            WordCode::Continuity => "Continuity",
            WordCode::Calibration => "CAL",
            WordCode::Version => "Version",
            WordCode::Overload => "OL",
            WordCode::BatteryFull => "FULL",
            WordCode::BatteryHalf => "HALF",
            WordCode::Lo => "Lo",
            WordCode::Hi => "Hi",
            WordCode::Digits => "Digits",
            WordCode::Ready => "Ready",
            WordCode::Disconnect => "dISC",
            WordCode::OutF => "outF",
            WordCode::OverloadA => "OLA",
            WordCode::OverloadV => "OLV",
            WordCode::OverloadVa => "OLVA",
            WordCode::Bad => "BAD",
            WordCode::Temperature => "TEMP",
            WordCode::Unknown(_) => "N/A",
        }
    }

    /// Dashes are displayed while a value is settling; they count as numeric
    pub fn is_dash(self) -> bool {
        matches!(self, WordCode::Dash | WordCode::Dash1 | WordCode::Dash2)
    }

    pub fn severity(self) -> Severity {
        match self {
            WordCode::Battery
            | WordCode::Hazard
            | WordCode::Fuse
            | WordCode::Probe
            | WordCode::Er
            | WordCode::Er1
            | WordCode::Er2
            | WordCode::Er3 => Severity::Error,
            WordCode::Space | WordCode::Dash | WordCode::Dash1 | WordCode::Dash2 => Severity::Silent,
            _ => Severity::Warning,
        }
    }
}

/// One display's content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayReading {
    /// Raw reading, sign-extended from 24 bits
    pub reading: i32,
    pub dot: Dot,
    pub unit: Unit,
    pub data_content: DataContent,
    pub overload: bool,
}

impl DisplayReading {
    /// Encoded size in bytes
    pub const SIZE: usize = 5;

    /// Decode a record from the first five bytes of `bytes`
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let b: &[u8; Self::SIZE] = bytes.get(..Self::SIZE)?.try_into().ok()?;
        Some(Self {
            reading: decode_i24([b[0], b[1], b[2]]),
            dot: Dot::from_raw(b[3] & 0x07),
            unit: Unit::from_raw(b[3] >> 3),
            data_content: DataContent::from_raw(b[4] & 0x7f),
            overload: b[4] & 0x80 != 0,
        })
    }

    /// Encode to the 5-byte wire layout
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let r = encode_i24(self.reading);
        [
            r[0],
            r[1],
            r[2],
            (self.unit.to_raw() << 3) | (self.dot.to_raw() & 0x07),
            (self.data_content.to_raw() & 0x7f) | if self.overload { 0x80 } else { 0 },
        ]
    }

    /// Word code shown instead of a number, if any
    pub fn word_code(&self) -> Option<WordCode> {
        WordCode::from_reading(self.reading)
    }
}

/// Live display answer: mode header plus primary and secondary display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayResponse {
    pub function_code: FunctionCode,
    pub auto_test: bool,
    pub range_code: u8,
    pub auto_range: bool,
    pub primary: DisplayReading,
    pub secondary: DisplayReading,
}

impl DisplayResponse {
    /// Encoded size in bytes
    pub const SIZE: usize = 2 + 2 * DisplayReading::SIZE;

    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::SIZE {
            return None;
        }
        Some(Self {
            function_code: FunctionCode::from_raw(bytes[0] & 0x7f),
            auto_test: bytes[0] & 0x80 != 0,
            range_code: bytes[1] & 0x7f,
            auto_range: bytes[1] & 0x80 != 0,
            primary: DisplayReading::decode(&bytes[2..7])?,
            secondary: DisplayReading::decode(&bytes[7..12])?,
        })
    }

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0] = (self.function_code.to_raw() & 0x7f) | if self.auto_test { 0x80 } else { 0 };
        out[1] = (self.range_code & 0x7f) | if self.auto_range { 0x80 } else { 0 };
        out[2..7].copy_from_slice(&self.primary.encode());
        out[7..12].copy_from_slice(&self.secondary.encode());
        out
    }
}

/// Sign-extend a little-endian 24-bit value
pub fn decode_i24(bytes: [u8; 3]) -> i32 {
    let raw = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]);
    ((raw << 8) as i32) >> 8
}

/// Truncate to a little-endian 24-bit value
pub fn encode_i24(value: i32) -> [u8; 3] {
    let b = value.to_le_bytes();
    [b[0], b[1], b[2]]
}
