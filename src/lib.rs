//! A USB CDC-ACM transport for analog I/O boards
//!
//! `usbd-analog-io` provides a [`usb-device`] class that enumerates as a
//! CDC-ACM serial port, but treats its bulk endpoints as a packet channel.
//! Each bulk OUT packet is one command, selected by its length:
//!
//! | Packet                 | Effect                                   |
//! | ---------------------- | ---------------------------------------- |
//! | 4 bytes                | Set both actuator (DAC) outputs          |
//! | 6 bytes                | Set all three servo positions            |
//! | first byte is `b'T'`   | Reply `"hello\n"` on bulk IN             |
//! | anything else          | Dropped                                  |
//!
//! Values are little-endian `u16`s. Actuator and servo commands wake the
//! link: the indicator turns on, and the next [`service()`](AnalogIoClass::service)
//! call replies with one 4-byte [`Telemetry`] packet. After an idle window
//! without commands, the link sleeps and the indicator turns off.
//!
//! To interface the library, implement [`Actuators`] and [`AnalogInput`] over
//! your board's peripherals, and provide an `embedded-hal` output pin for the
//! indicator. Advance a [`Clock`] from a 1 kHz interrupt.
//!
//! ```no_run
//! # use usb_device::class_prelude::UsbBusAllocator;
//! # fn demo<B: usb_device::bus::UsbBus, H, L>(bus: &UsbBusAllocator<B>, hardware: H, led: L)
//! # where H: usbd_analog_io::Actuators + usbd_analog_io::AnalogInput, L: embedded_hal::digital::OutputPin
//! # {
//! use usbd_analog_io::{config, AnalogIoClass, Clock};
//!
//! static CLOCK: Clock = Clock::new();
//!
//! let mut class = AnalogIoClass::new(bus, &CLOCK, hardware, led, config::IDLE_WINDOW_MS).unwrap();
//! // Build the UsbDevice, then in the main loop:
//! // if device.poll(&mut [&mut class]) { /* ... */ }
//! let _ = class.service();
//! # }
//! ```
//!
//! [`usb-device`]: https://crates.io/crates/usb-device

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod log;

mod activity;
mod class;
mod clock;
mod command;
mod control;
mod descriptor;
mod dispatch;
mod error;
mod hardware;
mod link;
mod telemetry;

pub mod config;

pub use activity::{ActivityMachine, ActivityMarker, LinkState, Transition};
pub use class::AnalogIoClass;
pub use clock::{elapsed, Clock};
pub use command::{
    ActuatorCommand, Command, ServoCommand, ACTUATOR_COMMAND_LEN, PROBE_MARKER, PROBE_REPLY,
    SERVO_COMMAND_LEN,
};
pub use control::{ControlLines, LineCoding, Response};
pub use dispatch::{dispatch, PacketSink};
pub use error::Error;
pub use hardware::{ActuatorChannel, Actuators, AnalogChannel, AnalogInput, ServoChannel};
pub use link::Link;
pub use telemetry::{Telemetry, TELEMETRY_LEN};
pub use usbd_serial::{ParityType, StopBits};

/// CDC descriptor constants and functional descriptor bodies.
pub mod cdc {
    pub use crate::control::{
        respond, LINE_CODING_LEN, REQ_GET_LINE_CODING, REQ_SET_CONTROL_LINE_STATE,
        REQ_SET_LINE_CODING,
    };
    pub use crate::descriptor::*;
}
