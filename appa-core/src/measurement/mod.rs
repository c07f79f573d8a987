//! Physical samples derived from display records
//!
//! The meter reports integers with a decimal point position and a unit
//! prefix. [`transform`] turns that into an SI value with the precision the
//! meter displayed, plus flags describing how it was measured.

mod transform;

pub use transform::transform;

use appa_protocol::{DisplayResponse, FunctionCode, Severity, Unit, WordCode};

use crate::model::Channel;

/// Measured quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Quantity {
    Voltage,
    Current,
    Resistance,
    Capacitance,
    Frequency,
    Temperature,
    Time,
    Power,
    PowerFactor,
    /// Relative difference in percent
    Difference,
    Continuity,
    /// Plain count, used when nothing better is known
    Count,
}

/// SI unit of a sample value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SiUnit {
    Unitless,
    Volt,
    Ampere,
    Ohm,
    Farad,
    Hertz,
    Celsius,
    Fahrenheit,
    Second,
    Watt,
    DecibelVolt,
    DecibelMw,
    Percentage,
}

/// Measurement modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MqFlags(u16);

impl MqFlags {
    pub const NONE: MqFlags = MqFlags(0);
    pub const AC: MqFlags = MqFlags(1 << 0);
    pub const DC: MqFlags = MqFlags(1 << 1);
    pub const RMS: MqFlags = MqFlags(1 << 2);
    pub const DIODE: MqFlags = MqFlags(1 << 3);
    pub const HOLD: MqFlags = MqFlags(1 << 4);
    pub const MAX: MqFlags = MqFlags(1 << 5);
    pub const MIN: MqFlags = MqFlags(1 << 6);
    pub const AVG: MqFlags = MqFlags(1 << 7);
    pub const RELATIVE: MqFlags = MqFlags(1 << 8);
    pub const REFERENCE: MqFlags = MqFlags(1 << 9);
    pub const AUTORANGE: MqFlags = MqFlags(1 << 10);

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn from_bits(bits: u16) -> Self {
        MqFlags(bits)
    }

    /// Returns true if every flag in `other` is set
    pub const fn contains(self, other: MqFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl core::ops::BitOr for MqFlags {
    type Output = MqFlags;

    fn bitor(self, rhs: MqFlags) -> MqFlags {
        MqFlags(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for MqFlags {
    fn bitor_assign(&mut self, rhs: MqFlags) {
        self.0 |= rhs.0;
    }
}

/// One value ready for the sink
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhysicalSample {
    /// Value in `unit`, `INFINITY` when the display shows no number
    pub value: f64,
    /// Decimal places relative to the SI unit; negative for large prefixes
    pub digits: i8,
    pub unit: SiUnit,
    pub quantity: Quantity,
    pub flags: MqFlags,
}

impl PhysicalSample {
    /// Placeholder for displays without a numeric value
    pub const fn no_value() -> Self {
        Self {
            value: f64::INFINITY,
            digits: 0,
            unit: SiUnit::Unitless,
            quantity: Quantity::Count,
            flags: MqFlags::NONE,
        }
    }

    /// One-based index of a stored entry
    pub fn sample_id(index: u32) -> Self {
        Self {
            value: index as f64 + 1.0,
            ..Self::no_value()
        }
    }

    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }
}

/// A display showing a word instead of a number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message {
    pub channel: Channel,
    pub word: WordCode,
    /// Unit next to the word; only meaningful for "Definition"
    pub unit: Unit,
}

impl Message {
    /// Temperature scale shown next to the word, if any
    pub fn suffix(&self) -> &'static str {
        match (self.word, self.unit) {
            (WordCode::Definition, Unit::DegreeCelsius) => " °C",
            (WordCode::Definition, Unit::DegreeFahrenheit) => " °F",
            _ => "",
        }
    }

    /// Log the message at the level its word code calls for
    pub fn report(&self) {
        let channel = self.channel.name();
        let text = self.word.name();
        let suffix = self.suffix();
        match self.word.severity() {
            Severity::Silent => {}
            Severity::Warning => warn!("MESSAGE [{}]: {}{}", channel, text, suffix),
            Severity::Error => error!("ERROR [{}]: {}", channel, text),
        }
    }

    /// The sample emitted in place of the message
    pub fn to_sample(&self) -> PhysicalSample {
        PhysicalSample::no_value()
    }
}

/// Outcome of transforming one display record
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transformed {
    Sample(PhysicalSample),
    Message(Message),
}

impl Transformed {
    /// Sample to emit for this display
    pub fn sample(&self) -> PhysicalSample {
        match self {
            Transformed::Sample(sample) => *sample,
            Transformed::Message(message) => message.to_sample(),
        }
    }

    pub fn message(&self) -> Option<&Message> {
        match self {
            Transformed::Message(message) => Some(message),
            Transformed::Sample(_) => None,
        }
    }
}

/// Mode information shared by both displays of one answer
///
/// Stored entries carry no mode header; playback reuses the context of
/// the last live display answer or falls back to the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadingContext {
    pub function_code: FunctionCode,
    pub auto_range: bool,
}

impl Default for ReadingContext {
    fn default() -> Self {
        Self {
            function_code: FunctionCode::None,
            auto_range: false,
        }
    }
}

impl From<&DisplayResponse> for ReadingContext {
    fn from(response: &DisplayResponse) -> Self {
        Self {
            function_code: response.function_code,
            auto_range: response.auto_range,
        }
    }
}
