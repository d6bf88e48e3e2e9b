//! Compile-time configuration
//!
//! USB identity, the endpoint table, and timing parameters live here so
//! that a board package can tune them in one place.

use crate::hardware::AnalogChannel;

// USB device identity

/// USB vendor ID.
pub const USB_VID: u16 = 0x0483;
/// USB product ID.
pub const USB_PID: u16 = 0x5740;
/// Device release number (`bcdDevice`).
pub const USB_DEVICE_RELEASE: u16 = 0x0200;
/// Bus power draw, in milliamps.
pub const USB_MAX_POWER_MA: usize = 100;
/// Control endpoint max packet size.
pub const USB_CONTROL_PACKET_SIZE: u8 = 64;

/// Manufacturer string descriptor.
pub const USB_MANUFACTURER: &str = "Black Sphere Technologies";
/// Product string descriptor.
pub const USB_PRODUCT: &str = "CDC-ACM Demo";
/// Serial number string descriptor.
pub const USB_SERIAL_NUMBER: &str = "DEMO";

// Endpoint table

/// Notification endpoint. Declared, never written.
pub const NOTIFY_EP_ADDR: u8 = 0x83;
pub const NOTIFY_EP_PACKET_SIZE: u16 = 16;
/// Polling interval of the notification endpoint, in frames.
pub const NOTIFY_EP_INTERVAL: u8 = 255;

/// Bulk OUT, host to device commands.
pub const DATA_OUT_EP_ADDR: u8 = 0x01;
/// Bulk IN, device to host replies.
pub const DATA_IN_EP_ADDR: u8 = 0x82;
/// Max packet size of both bulk endpoints.
pub const DATA_PACKET_SIZE: u16 = 64;

// Link activity

/// Idle window before an active link falls back to sleep (ms).
pub const IDLE_WINDOW_MS: u32 = 500;
/// Shorter idle window, for the servo-only deployment (ms).
pub const IDLE_WINDOW_FAST_MS: u32 = 200;

/// First telemetry sample source.
pub const SAMPLE0_CHANNEL: AnalogChannel = AnalogChannel(4);
/// Second telemetry sample source.
pub const SAMPLE1_CHANNEL: AnalogChannel = AnalogChannel(5);
