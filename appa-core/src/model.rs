//! Per-model display capabilities

use appa_protocol::ModelId;

/// Meter display a sample belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Main display
    Primary,
    /// Sub display
    Secondary,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Primary, Channel::Secondary];

    pub fn index(self) -> usize {
        match self {
            Channel::Primary => 0,
            Channel::Secondary => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Primary => "Main",
            Channel::Secondary => "Sub",
        }
    }
}

/// Returns true if `model` has a display for `channel`
///
/// Every model has a primary display. Only the 200 and 500 series carry a
/// sub display worth reporting.
pub fn supports_channel(model: ModelId, channel: Channel) -> bool {
    match channel {
        Channel::Primary => true,
        Channel::Secondary => matches!(
            model,
            ModelId::Appa208
                | ModelId::Appa208B
                | ModelId::Appa501
                | ModelId::Appa502
                | ModelId::Appa503
                | ModelId::Appa505
                | ModelId::Appa506
                | ModelId::Appa506B
                | ModelId::Appa506BAlt
        ),
    }
}
