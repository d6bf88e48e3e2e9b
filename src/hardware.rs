//! Peripheral seams
//!
//! The transport never touches registers. A board package implements these
//! traits over its DAC, PWM and ADC drivers, and hands an indicator pin to
//! the [`Link`](crate::Link) as an `embedded_hal` [`OutputPin`](embedded_hal::digital::OutputPin).

/// One of the two actuator (DAC) outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ActuatorChannel {
    Zero = 0,
    One = 1,
}

impl ActuatorChannel {
    /// All channels, in the order an actuator command fills them.
    pub const ALL: [ActuatorChannel; 2] = [ActuatorChannel::Zero, ActuatorChannel::One];
}

/// One of the three servo outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ServoChannel {
    Zero = 0,
    One = 1,
    Two = 2,
}

impl ServoChannel {
    /// All channels, in the order a servo command fills them.
    pub const ALL: [ServoChannel; 3] = [ServoChannel::Zero, ServoChannel::One, ServoChannel::Two];
}

/// An analog input, identified by its converter channel number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnalogChannel(pub u8);

/// Outputs driven by decoded commands.
///
/// Writes are fire-and-forget. Once a command is decoded its outputs are
/// applied, and nothing rolls them back.
pub trait Actuators {
    /// Set an actuator (DAC) output to `value`.
    fn set_actuator_output(&mut self, channel: ActuatorChannel, value: u16);
    /// Move a servo to `position`.
    fn set_servo_position(&mut self, channel: ServoChannel, position: u16);
}

/// Single-shot analog sampling.
pub trait AnalogInput {
    /// Conversion failure, typically a timeout.
    type Error;
    /// Sample `channel` and return the right-aligned reading.
    ///
    /// Implementations should bound any busy-wait; the main loop stalls
    /// for as long as this call does.
    fn read_analog(&mut self, channel: AnalogChannel) -> Result<u16, Self::Error>;
}
