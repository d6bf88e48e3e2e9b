//! Bulk OUT dispatch
//!
//! [`dispatch`] runs once per received packet, inside the USB poll. It
//! classifies the packet, applies its outputs, and answers probes. It
//! never blocks.

use crate::activity::ActivityMarker;
use crate::command::{Command, PROBE_REPLY};
use crate::hardware::{ActuatorChannel, Actuators, ServoChannel};
use usb_device::{class_prelude::UsbBus, endpoint::EndpointIn, UsbError};

/// A packet-oriented transmit path, usually the bulk IN endpoint.
pub trait PacketSink {
    /// Queue one packet. Returns the number of bytes accepted.
    fn write_packet(&mut self, packet: &[u8]) -> usb_device::Result<usize>;
}

impl<B: UsbBus> PacketSink for EndpointIn<'_, B> {
    fn write_packet(&mut self, packet: &[u8]) -> usb_device::Result<usize> {
        self.write(packet)
    }
}

/// Apply one bulk OUT packet received at `now`.
///
/// Returns the decoded command. Actuator and servo commands drive their
/// outputs and record activity in `marker`. Probes write
/// [`PROBE_REPLY`] to `tx`. Anything else is dropped.
pub fn dispatch<A, T>(
    packet: &[u8],
    now: u32,
    actuators: &mut A,
    marker: &mut ActivityMarker,
    tx: &mut T,
) -> Command
where
    A: Actuators,
    T: PacketSink,
{
    let command = Command::decode(packet);
    match command {
        Command::Actuator(cmd) => {
            for (channel, value) in ActuatorChannel::ALL.into_iter().zip(cmd.values()) {
                actuators.set_actuator_output(channel, value);
            }
            marker.record(now);
        }
        Command::Servo(cmd) => {
            for (channel, position) in ServoChannel::ALL.into_iter().zip(cmd.positions()) {
                actuators.set_servo_position(channel, position);
            }
            marker.record(now);
        }
        Command::Probe => match tx.write_packet(PROBE_REPLY) {
            Ok(_) => {}
            Err(UsbError::WouldBlock) => {
                warn!("Probe reply dropped, IN busy");
            }
            Err(_err) => {
                warn!("Probe reply failed: {}", _err);
            }
        },
        Command::Unrecognized => {
            debug!("Dropped {} byte packet", packet.len());
        }
    }
    command
}
