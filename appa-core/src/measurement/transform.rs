use appa_protocol::{DataContent, DisplayReading, FunctionCode, Unit};

use super::{Message, MqFlags, PhysicalSample, Quantity, ReadingContext, SiUnit, Transformed};
use crate::model::Channel;

/// Powers of ten up to the largest combined exponent (dot 4 with nano)
const POW10: [f64; 14] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13,
];

/// How a display unit maps onto SI
struct UnitScale {
    unit: SiUnit,
    quantity: Option<Quantity>,
    /// Decimal exponent of the prefix
    exponent: i8,
    /// Extra non-decimal factor (minutes)
    factor: f64,
}

const fn scale(unit: SiUnit, quantity: Quantity, exponent: i8) -> UnitScale {
    UnitScale {
        unit,
        quantity: Some(quantity),
        exponent,
        factor: 1.0,
    }
}

fn unit_scale(unit: Unit) -> UnitScale {
    use Quantity::*;
    match unit {
        Unit::Volt => scale(SiUnit::Volt, Voltage, 0),
        Unit::MilliVolt => scale(SiUnit::Volt, Voltage, -3),
        Unit::Ampere => scale(SiUnit::Ampere, Current, 0),
        Unit::MilliAmpere => scale(SiUnit::Ampere, Current, -3),
        Unit::MicroAmpere => scale(SiUnit::Ampere, Current, -6),
        Unit::Decibel => scale(SiUnit::DecibelVolt, Power, 0),
        Unit::DecibelMilliwatt => scale(SiUnit::DecibelMw, Power, 0),
        Unit::MilliFarad => scale(SiUnit::Farad, Capacitance, -3),
        Unit::MicroFarad => scale(SiUnit::Farad, Capacitance, -6),
        Unit::NanoFarad => scale(SiUnit::Farad, Capacitance, -9),
        Unit::GigaOhm => scale(SiUnit::Ohm, Resistance, 9),
        Unit::MegaOhm => scale(SiUnit::Ohm, Resistance, 6),
        Unit::KiloOhm => scale(SiUnit::Ohm, Resistance, 3),
        Unit::Ohm => scale(SiUnit::Ohm, Resistance, 0),
        Unit::Percent => scale(SiUnit::Percentage, Difference, 0),
        Unit::MegaHertz => scale(SiUnit::Hertz, Frequency, 6),
        Unit::KiloHertz => scale(SiUnit::Hertz, Frequency, 3),
        Unit::Hertz => scale(SiUnit::Hertz, Frequency, 0),
        Unit::DegreeCelsius => scale(SiUnit::Celsius, Temperature, 0),
        Unit::DegreeFahrenheit => scale(SiUnit::Fahrenheit, Temperature, 0),
        Unit::Second => scale(SiUnit::Second, Time, 0),
        Unit::MilliSecond => scale(SiUnit::Second, Time, -3),
        Unit::MicroSecond => scale(SiUnit::Second, Time, -6),
        Unit::NanoSecond => scale(SiUnit::Second, Time, -9),
        Unit::Minute => UnitScale {
            factor: 60.0,
            ..scale(SiUnit::Second, Time, 0)
        },
        Unit::KiloWatt => scale(SiUnit::Watt, Power, 3),
        Unit::PowerFactor => scale(SiUnit::Unitless, PowerFactor, 0),
        Unit::None | Unit::Unknown(_) => UnitScale {
            unit: SiUnit::Unitless,
            quantity: None,
            exponent: 0,
            factor: 1.0,
        },
    }
}

/// Electrical coupling implied by the rotary switch position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coupling {
    Ac,
    Dc,
    AcDc,
    Continuity,
    Diode,
    Other,
}

fn coupling(function: FunctionCode) -> Coupling {
    use FunctionCode::*;
    match function {
        PeakHoldUa | AcUa | AcMv | AcMa | LpfMv | LpfMa | AcV | AcA | LpfV | LpfA | LozAcV
        | AcW | LozLpfV | VHarmonics | Inrush | AHarmonics | FlexInrush | FlexAHarmonics
        | AcUaHfr | AcAHfr | AcMaHfr | AcUaHfr2 | AcVHfr | AcMvHfr | AcVPv | AcVPvHfr => {
            Coupling::Ac
        }
        DcUa | DcMv | DcMa | DcV | DcA | DcAOut | DcAOutSlowLinear | DcAOutFastLinear
        | DcAOutSlowStep | DcAOutFastStep | LoopPower | LozDcV | DcW | FlexAcA | FlexLpfA
        | FlexPeakHoldA | DcVPv => Coupling::Dc,
        AcDcMv | AcDcMa | AcDcV | AcDcA | VoltSense | LozAcDcV | AcDcVPv => Coupling::AcDc,
        Continuity => Coupling::Continuity,
        Diode => Coupling::Diode,
        _ => Coupling::Other,
    }
}

fn content_flags(content: DataContent, channel: Channel) -> MqFlags {
    let secondary = channel == Channel::Secondary;
    let hold = if secondary { MqFlags::HOLD } else { MqFlags::NONE };
    match content {
        DataContent::Maximum => MqFlags::MAX,
        DataContent::Minimum => MqFlags::MIN,
        DataContent::Average => MqFlags::AVG,
        DataContent::PeakHoldMax => MqFlags::MAX | hold,
        DataContent::PeakHoldMin => MqFlags::MIN | hold,
        DataContent::AutoHold | DataContent::Hold => hold,
        DataContent::RelativeDelta | DataContent::RelativePercent => {
            if secondary {
                MqFlags::REFERENCE
            } else {
                MqFlags::RELATIVE
            }
        }
        _ => MqFlags::NONE,
    }
}

/// Multiply `reading` by 10^`exponent` without going through `powi`
fn apply_exponent(reading: i32, exponent: i8) -> f64 {
    let magnitude = POW10[(exponent.unsigned_abs() as usize).min(POW10.len() - 1)];
    if exponent < 0 {
        reading as f64 / magnitude
    } else {
        reading as f64 * magnitude
    }
}

/// Turn one display record into a sample or a word-code message
///
/// `context` supplies the mode header of the answer the record came from;
/// `channel` selects which display it was.
pub fn transform(reading: &DisplayReading, context: ReadingContext, channel: Channel) -> Transformed {
    let word = reading.word_code();
    let is_dash = word.is_some_and(|w| w.is_dash());
    if let Some(word) = word.filter(|w| !w.is_dash()) {
        return Transformed::Message(Message {
            channel,
            word,
            unit: reading.unit,
        });
    }

    let decimals = reading.dot.decimals() as i8;
    let scale = unit_scale(reading.unit);

    let mut flags = content_flags(reading.data_content, channel);
    if context.auto_range {
        flags |= MqFlags::AUTORANGE;
    }

    let mut quantity = scale.quantity;
    let electrical = matches!(scale.unit, SiUnit::Ampere | SiUnit::Volt | SiUnit::Watt);
    match coupling(context.function_code) {
        Coupling::Ac if electrical => flags |= MqFlags::AC | MqFlags::RMS,
        Coupling::Dc if electrical => flags |= MqFlags::DC,
        Coupling::AcDc if electrical => flags |= MqFlags::AC | MqFlags::DC | MqFlags::RMS,
        Coupling::Continuity => quantity = Some(Quantity::Continuity),
        Coupling::Diode => flags |= MqFlags::DIODE | MqFlags::DC,
        _ => {}
    }

    let Some(quantity) = quantity else {
        return Transformed::Sample(PhysicalSample::no_value());
    };

    let value = if reading.overload || is_dash {
        f64::INFINITY
    } else {
        apply_exponent(reading.reading, scale.exponent - decimals) * scale.factor
    };

    Transformed::Sample(PhysicalSample {
        value,
        digits: decimals - scale.exponent,
        unit: scale.unit,
        quantity,
        flags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use appa_protocol::{Dot, WordCode};

    fn reading(value: i32, dot: Dot, unit: Unit) -> DisplayReading {
        DisplayReading {
            reading: value,
            dot,
            unit,
            data_content: DataContent::MeasuringData,
            overload: false,
        }
    }

    fn sample(t: Transformed) -> PhysicalSample {
        match t {
            Transformed::Sample(s) => s,
            Transformed::Message(m) => panic!("unexpected message {m:?}"),
        }
    }

    fn dc_volts() -> ReadingContext {
        ReadingContext {
            function_code: FunctionCode::DcV,
            auto_range: false,
        }
    }

    #[test]
    fn test_volts_two_decimals() {
        let s = sample(transform(
            &reading(12345, Dot::Two, Unit::Volt),
            dc_volts(),
            Channel::Primary,
        ));
        assert_eq!(s.value, 123.45);
        assert_eq!(s.digits, 2);
        assert_eq!(s.unit, SiUnit::Volt);
        assert_eq!(s.quantity, Quantity::Voltage);
        assert_eq!(s.flags, MqFlags::DC);
    }

    #[test]
    fn test_millivolts_digits() {
        let s = sample(transform(
            &reading(-4567, Dot::One, Unit::MilliVolt),
            ReadingContext {
                function_code: FunctionCode::AcMv,
                auto_range: true,
            },
            Channel::Primary,
        ));
        assert_eq!(s.value, -0.4567);
        assert_eq!(s.digits, 4);
        assert_eq!(s.flags, MqFlags::AC | MqFlags::RMS | MqFlags::AUTORANGE);
    }

    #[test]
    fn test_kilo_ohm_negative_digits() {
        let s = sample(transform(
            &reading(1234, Dot::Three, Unit::KiloOhm),
            ReadingContext {
                function_code: FunctionCode::Ohm,
                auto_range: false,
            },
            Channel::Primary,
        ));
        assert_eq!(s.value, 1234.0);
        assert_eq!(s.digits, 0);
        assert_eq!(s.quantity, Quantity::Resistance);
        assert!(s.flags.is_empty());

        let s = sample(transform(
            &reading(15, Dot::None, Unit::MegaOhm),
            ReadingContext::default(),
            Channel::Primary,
        ));
        assert_eq!(s.value, 15e6);
        assert_eq!(s.digits, -6);
    }

    #[test]
    fn test_minutes_scale_to_seconds() {
        let s = sample(transform(
            &reading(25, Dot::One, Unit::Minute),
            ReadingContext::default(),
            Channel::Secondary,
        ));
        assert_eq!(s.value, 150.0);
        assert_eq!(s.unit, SiUnit::Second);
        assert_eq!(s.digits, 1);
    }

    #[test]
    fn test_overload_is_infinite() {
        let mut r = reading(99999, Dot::None, Unit::Volt);
        r.overload = true;
        let s = sample(transform(&r, dc_volts(), Channel::Primary));
        assert_eq!(s.value, f64::INFINITY);
        assert_eq!(s.quantity, Quantity::Voltage);
    }

    #[test]
    fn test_dash_is_infinite_sample() {
        let r = reading(WordCode::Dash2.to_raw() as i32, Dot::None, Unit::Hertz);
        let s = sample(transform(&r, ReadingContext::default(), Channel::Secondary));
        assert_eq!(s.value, f64::INFINITY);
        assert_eq!(s.quantity, Quantity::Frequency);
    }

    #[test]
    fn test_word_code_is_message() {
        let r = reading(WordCode::Probe.to_raw() as i32, Dot::None, Unit::None);
        let t = transform(&r, ReadingContext::default(), Channel::Primary);
        let message = t.message().copied().unwrap();
        assert_eq!(message.word, WordCode::Probe);
        assert_eq!(message.channel, Channel::Primary);
        assert_eq!(t.sample(), PhysicalSample::no_value());
    }

    #[test]
    fn test_unknown_word_code_is_message() {
        let r = reading(0x70_00ff, Dot::None, Unit::None);
        let t = transform(&r, ReadingContext::default(), Channel::Primary);
        assert_eq!(t.message().map(|m| m.word.name()), Some("N/A"));
    }

    #[test]
    fn test_coupling_needs_electrical_unit() {
        let ac = ReadingContext {
            function_code: FunctionCode::AcV,
            auto_range: false,
        };
        let s = sample(transform(&reading(500, Dot::One, Unit::Hertz), ac, Channel::Secondary));
        assert!(s.flags.is_empty());

        let s = sample(transform(
            &reading(500, Dot::One, Unit::Hertz),
            dc_volts(),
            Channel::Secondary,
        ));
        assert!(s.flags.is_empty());

        let acdc = ReadingContext {
            function_code: FunctionCode::AcDcA,
            auto_range: false,
        };
        let s = sample(transform(&reading(500, Dot::Three, Unit::Ampere), acdc, Channel::Primary));
        assert_eq!(s.flags, MqFlags::AC | MqFlags::DC | MqFlags::RMS);
    }

    #[test]
    fn test_continuity_and_diode() {
        let s = sample(transform(
            &reading(120, Dot::One, Unit::Ohm),
            ReadingContext {
                function_code: FunctionCode::Continuity,
                auto_range: false,
            },
            Channel::Primary,
        ));
        assert_eq!(s.quantity, Quantity::Continuity);
        assert_eq!(s.unit, SiUnit::Ohm);

        let s = sample(transform(
            &reading(512, Dot::Three, Unit::Volt),
            ReadingContext {
                function_code: FunctionCode::Diode,
                auto_range: false,
            },
            Channel::Primary,
        ));
        assert_eq!(s.flags, MqFlags::DIODE | MqFlags::DC);
    }

    #[test]
    fn test_data_content_per_channel() {
        let mut r = reading(100, Dot::None, Unit::Volt);
        let ctx = ReadingContext::default();

        r.data_content = DataContent::PeakHoldMax;
        assert_eq!(sample(transform(&r, ctx, Channel::Primary)).flags, MqFlags::MAX);
        assert_eq!(
            sample(transform(&r, ctx, Channel::Secondary)).flags,
            MqFlags::MAX | MqFlags::HOLD
        );

        r.data_content = DataContent::Hold;
        assert!(sample(transform(&r, ctx, Channel::Primary)).flags.is_empty());
        assert_eq!(sample(transform(&r, ctx, Channel::Secondary)).flags, MqFlags::HOLD);

        r.data_content = DataContent::RelativePercent;
        assert_eq!(sample(transform(&r, ctx, Channel::Primary)).flags, MqFlags::RELATIVE);
        assert_eq!(
            sample(transform(&r, ctx, Channel::Secondary)).flags,
            MqFlags::REFERENCE
        );

        r.data_content = DataContent::Average;
        assert_eq!(sample(transform(&r, ctx, Channel::Primary)).flags, MqFlags::AVG);

        r.data_content = DataContent::LogRate;
        assert!(sample(transform(&r, ctx, Channel::Primary)).flags.is_empty());
    }

    #[test]
    fn test_no_unit_degrades_to_count() {
        let mut r = reading(42, Dot::Two, Unit::None);
        r.data_content = DataContent::Maximum;
        let s = sample(transform(
            &r,
            ReadingContext {
                function_code: FunctionCode::DcV,
                auto_range: true,
            },
            Channel::Primary,
        ));
        assert_eq!(s, PhysicalSample::no_value());
    }

    #[test]
    fn test_continuity_without_unit_still_reports() {
        let s = sample(transform(
            &reading(0, Dot::None, Unit::None),
            ReadingContext {
                function_code: FunctionCode::Continuity,
                auto_range: false,
            },
            Channel::Primary,
        ));
        assert_eq!(s.quantity, Quantity::Continuity);
        assert_eq!(s.unit, SiUnit::Unitless);
        assert_eq!(s.value, 0.0);
    }
}
