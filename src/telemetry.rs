//! Telemetry reply packet

use crate::hardware::{AnalogChannel, AnalogInput};

/// Wire size of a [`Telemetry`] packet.
pub const TELEMETRY_LEN: usize = 4;

/// Two analog samples, reported after link activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Telemetry {
    pub sample0: u16,
    pub sample1: u16,
}

impl Telemetry {
    /// Take a fresh pair of samples, `first` then `second`.
    pub fn sample<A: AnalogInput>(
        adc: &mut A,
        first: AnalogChannel,
        second: AnalogChannel,
    ) -> Result<Self, A::Error> {
        let sample0 = adc.read_analog(first)?;
        let sample1 = adc.read_analog(second)?;
        Ok(Self { sample0, sample1 })
    }

    /// Encode as two little-endian `u16`s.
    pub fn to_bytes(&self) -> [u8; TELEMETRY_LEN] {
        let [a0, a1] = self.sample0.to_le_bytes();
        let [b0, b1] = self.sample1.to_le_bytes();
        [a0, a1, b0, b1]
    }
}
