//! Sample sink trait

use crate::measurement::PhysicalSample;
use crate::model::Channel;

/// Receiver for decoded samples
///
/// Samples arrive in groups, one group per display answer or stored entry.
/// A group holds one sample per supported channel.
pub trait SampleSink {
    /// Start of a group
    fn begin_group(&mut self) {}

    /// One sample for `channel`
    fn emit(&mut self, channel: Channel, sample: &PhysicalSample);

    /// End of a group
    fn end_group(&mut self) {}
}

impl<S: SampleSink + ?Sized> SampleSink for &mut S {
    fn begin_group(&mut self) {
        (**self).begin_group()
    }

    fn emit(&mut self, channel: Channel, sample: &PhysicalSample) {
        (**self).emit(channel, sample)
    }

    fn end_group(&mut self) {
        (**self).end_group()
    }
}

/// Sink that keeps the most recent sample per channel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatestSample {
    samples: [Option<PhysicalSample>; 2],
    groups: u32,
}

impl LatestSample {
    pub fn get(&self, channel: Channel) -> Option<&PhysicalSample> {
        self.samples[channel.index()].as_ref()
    }

    /// Number of completed groups
    pub fn groups(&self) -> u32 {
        self.groups
    }
}

impl SampleSink for LatestSample {
    fn emit(&mut self, channel: Channel, sample: &PhysicalSample) {
        self.samples[channel.index()] = Some(*sample);
    }

    fn end_group(&mut self) {
        self.groups = self.groups.wrapping_add(1);
    }
}
