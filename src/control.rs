//! CDC class control requests
//!
//! Only two requests are answered. Host serial drivers issue
//! `SET_CONTROL_LINE_STATE` whether or not the device advertises it, and
//! expect it to succeed. `SET_LINE_CODING` succeeds as long as the host
//! sends a complete line coding structure. Everything else stalls.
//!
//! The recorded line coding and control lines have no effect on the
//! transport; they're exposed for diagnostics.

use bitflags::bitflags;
use usbd_serial::{ParityType, StopBits};

/// `SET_LINE_CODING` request code.
pub const REQ_SET_LINE_CODING: u8 = 0x20;
/// `GET_LINE_CODING` request code.
pub const REQ_GET_LINE_CODING: u8 = 0x21;
/// `SET_CONTROL_LINE_STATE` request code.
pub const REQ_SET_CONTROL_LINE_STATE: u8 = 0x22;

/// Size of the CDC line coding structure.
pub const LINE_CODING_LEN: usize = 7;

/// Outcome of a class request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// Acknowledge the request.
    Handled,
    /// Stall the request.
    NotSupported,
}

/// Decide the response to a class, interface-directed, host-to-device request.
///
/// `data_len` is the length of the data stage that accompanied the request.
pub fn respond(request: u8, data_len: usize) -> Response {
    match request {
        REQ_SET_CONTROL_LINE_STATE => Response::Handled,
        REQ_SET_LINE_CODING if data_len >= LINE_CODING_LEN => Response::Handled,
        _ => Response::NotSupported,
    }
}

bitflags! {
    /// Modem control lines from `SET_CONTROL_LINE_STATE`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ControlLines: u16 {
        /// Data terminal ready.
        const DTR = 1 << 0;
        /// Request to send (carrier activation).
        const RTS = 1 << 1;
    }
}

impl ControlLines {
    /// Interpret a `SET_CONTROL_LINE_STATE` `wValue`. Reserved bits are dropped.
    pub fn from_request_value(value: u16) -> Self {
        Self::from_bits_truncate(value)
    }
}

/// Line coding, as last set by the host.
///
/// A bulk-only link ignores all of these; the host is free to pick any baud rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCoding {
    pub data_rate: u32,
    pub stop_bits: StopBits,
    pub parity: ParityType,
    pub data_bits: u8,
}

impl LineCoding {
    /// Parse the data stage of `SET_LINE_CODING`.
    ///
    /// Returns `None` if `data` is shorter than [`LINE_CODING_LEN`]. Extra
    /// bytes are ignored.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let data = data.get(..LINE_CODING_LEN)?;
        Some(Self {
            data_rate: u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            stop_bits: data[4].into(),
            parity: data[5].into(),
            data_bits: data[6],
        })
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LineCoding {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "{=u32} baud, {=u8} data bits, parity {=u8}, stop bits {=u8}",
            self.data_rate,
            self.data_bits,
            self.parity as u8,
            self.stop_bits as u8,
        )
    }
}

impl Default for LineCoding {
    fn default() -> Self {
        Self {
            data_rate: 8_000,
            stop_bits: StopBits::One,
            parity: ParityType::None,
            data_bits: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_line_state_always_handled() {
        assert_eq!(respond(REQ_SET_CONTROL_LINE_STATE, 0), Response::Handled);
        assert_eq!(respond(REQ_SET_CONTROL_LINE_STATE, 64), Response::Handled);
    }

    #[test]
    fn line_coding_needs_full_structure() {
        for len in 0..LINE_CODING_LEN {
            assert_eq!(respond(REQ_SET_LINE_CODING, len), Response::NotSupported);
        }
        assert_eq!(respond(REQ_SET_LINE_CODING, 7), Response::Handled);
        assert_eq!(respond(REQ_SET_LINE_CODING, 8), Response::Handled);
    }

    #[test]
    fn other_requests_not_supported() {
        assert_eq!(respond(REQ_GET_LINE_CODING, 7), Response::NotSupported);
        assert_eq!(respond(0x23, 0), Response::NotSupported); // SEND_BREAK
        assert_eq!(respond(0x00, 0), Response::NotSupported);
    }

    #[test]
    fn control_lines_from_value() {
        assert_eq!(ControlLines::from_request_value(0), ControlLines::empty());
        assert_eq!(ControlLines::from_request_value(1), ControlLines::DTR);
        assert_eq!(
            ControlLines::from_request_value(0xFFFF),
            ControlLines::DTR | ControlLines::RTS
        );
    }

    #[test]
    fn parse_line_coding() {
        // 115200 8N1
        let coding = LineCoding::parse(&[0x00, 0xC2, 0x01, 0x00, 0, 0, 8]).unwrap();
        assert_eq!(coding.data_rate, 115_200);
        assert_eq!(coding.stop_bits, StopBits::One);
        assert_eq!(coding.parity, ParityType::None);
        assert_eq!(coding.data_bits, 8);

        let coding = LineCoding::parse(&[0x80, 0x25, 0, 0, 2, 2, 7, 0xAA]).unwrap();
        assert_eq!(coding.data_rate, 9_600);
        assert_eq!(coding.stop_bits, StopBits::Two);
        assert_eq!(coding.parity, ParityType::Event);
        assert_eq!(coding.data_bits, 7);
    }

    #[test]
    fn parse_maps_wire_codes() {
        for code in 0..=2u8 {
            let coding = LineCoding::parse(&[0, 0, 0, 0, code, 0, 8]).unwrap();
            assert_eq!(coding.stop_bits, StopBits::from(code));
            assert_eq!(coding.stop_bits as u8, code);
        }
        for code in 0..=4u8 {
            let coding = LineCoding::parse(&[0, 0, 0, 0, 0, code, 8]).unwrap();
            assert_eq!(coding.parity, ParityType::from(code));
            assert_eq!(coding.parity as u8, code);
        }
        // Out of range codes fall back to 1 stop bit, no parity.
        let coding = LineCoding::parse(&[0, 0, 0, 0, 9, 9, 8]).unwrap();
        assert_eq!(coding.stop_bits, StopBits::One);
        assert_eq!(coding.parity, ParityType::None);
    }

    #[test]
    fn parse_short_line_coding() {
        assert!(LineCoding::parse(&[0x00, 0xC2, 0x01, 0x00, 0, 0]).is_none());
        assert!(LineCoding::parse(&[]).is_none());
    }
}
