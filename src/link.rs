//! Link context
//!
//! A [`Link`] owns everything the transport mutates: the peripherals, the
//! indicator, the activity marker and the Sleep / Wake machine. The USB
//! class feeds it packets from inside the poll; the main loop calls
//! [`service()`](Link::service) after every poll.

use crate::activity::{ActivityMachine, ActivityMarker, LinkState, Transition};
use crate::command::Command;
use crate::config;
use crate::dispatch::{self, PacketSink};
use crate::error::Error;
use crate::hardware::{AnalogChannel, AnalogInput, Actuators};
use crate::telemetry::Telemetry;
use embedded_hal::digital::{OutputPin, PinState};

/// Transport state, and the hardware it drives.
pub struct Link<H, L> {
    hardware: H,
    indicator: L,
    marker: ActivityMarker,
    machine: ActivityMachine,
    samples: [AnalogChannel; 2],
}

impl<H, L> Link<H, L>
where
    H: Actuators + AnalogInput,
    L: OutputPin,
{
    /// Create a sleeping link.
    ///
    /// The link falls back to sleep after `idle_window_ms` without commands.
    /// See [`config::IDLE_WINDOW_MS`]. The indicator is driven low.
    pub fn new(hardware: H, mut indicator: L, idle_window_ms: u32) -> Self {
        indicator.set_low().ok();
        Self {
            hardware,
            indicator,
            marker: ActivityMarker::new(),
            machine: ActivityMachine::new(idle_window_ms),
            samples: [config::SAMPLE0_CHANNEL, config::SAMPLE1_CHANNEL],
        }
    }

    /// Sample `first` and `second` for telemetry, instead of the configured channels.
    pub fn with_sample_channels(mut self, first: AnalogChannel, second: AnalogChannel) -> Self {
        self.samples = [first, second];
        self
    }

    /// Handle one bulk OUT packet received at `now`.
    pub fn handle_packet<T: PacketSink>(&mut self, packet: &[u8], now: u32, tx: &mut T) -> Command {
        dispatch::dispatch(packet, now, &mut self.hardware, &mut self.marker, tx)
    }

    /// Run the activity machine, and report telemetry for pending activity.
    ///
    /// Call once per main loop iteration, after polling the USB device. All
    /// activity since the previous call yields at most one telemetry packet.
    ///
    /// If the samples can't be taken or sent, that telemetry packet is
    /// dropped and the error returned; the link state is still updated.
    pub fn service<T: PacketSink>(&mut self, now: u32, tx: &mut T) -> Result<(), Error<H::Error>> {
        let mut result = Ok(());
        if self.marker.is_pending() {
            if let Some(transition) = self.machine.wake() {
                self.drive_indicator(transition);
            }
            result = self.report(tx);
            self.marker.take();
        }
        if let Some(transition) = self.machine.expire(now, self.marker.last_activity_ms()) {
            self.drive_indicator(transition);
        }
        result
    }

    fn report<T: PacketSink>(&mut self, tx: &mut T) -> Result<(), Error<H::Error>> {
        let [first, second] = self.samples;
        let telemetry =
            Telemetry::sample(&mut self.hardware, first, second).map_err(Error::Analog)?;
        tx.write_packet(&telemetry.to_bytes()).map_err(|err| {
            warn!("Telemetry dropped: {}", err);
            err
        })?;
        Ok(())
    }

    fn drive_indicator(&mut self, transition: Transition) {
        debug!("Link {}", transition);
        let state = match transition {
            Transition::Woke => PinState::High,
            Transition::Slept => PinState::Low,
        };
        self.indicator.set_state(state).ok();
    }

    /// Returns the current link state.
    pub fn state(&self) -> LinkState {
        self.machine.state()
    }

    /// Returns the activity marker.
    pub fn marker(&self) -> &ActivityMarker {
        &self.marker
    }

    /// Access the peripherals.
    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    /// Mutable access to the peripherals.
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    /// Access the indicator.
    pub fn indicator(&self) -> &L {
        &self.indicator
    }

    /// Mutable access to the indicator.
    ///
    /// The link drives the indicator again on its next transition.
    pub fn indicator_mut(&mut self) -> &mut L {
        &mut self.indicator
    }

    /// Release the peripherals and indicator.
    pub fn release(self) -> (H, L) {
        (self.hardware, self.indicator)
    }
}
