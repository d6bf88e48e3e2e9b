//! CDC-ACM descriptor contract
//!
//! Host serial drivers parse the functional descriptors strictly, so the
//! sub-type tags, field order and lengths follow the CDC 1.1 specification
//! exactly. [`functional_descriptors`] returns each descriptor body without
//! its `bLength` / `bDescriptorType` prefix; `usb-device`'s
//! `DescriptorWriter::write` adds those two bytes.

pub use usbd_serial::USB_CLASS_CDC;

/// CDC data interface class.
pub const USB_CLASS_CDC_DATA: u8 = 0x0A;
/// Abstract control model sub-class.
pub const CDC_SUBCLASS_ACM: u8 = 0x02;
/// AT command protocol (V.250).
pub const CDC_PROTOCOL_AT: u8 = 0x01;

/// Class-specific interface descriptor type.
pub const CS_INTERFACE: u8 = 0x24;

pub const CDC_TYPE_HEADER: u8 = 0x00;
pub const CDC_TYPE_CALL_MANAGEMENT: u8 = 0x01;
pub const CDC_TYPE_ACM: u8 = 0x02;
pub const CDC_TYPE_UNION: u8 = 0x06;

/// CDC specification release, 1.10.
pub const CDC_RELEASE: u16 = 0x0110;

/// One class-specific functional descriptor body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Functional {
    body: [u8; 3],
    len: usize,
}

impl Functional {
    const fn new(body: [u8; 3], len: usize) -> Self {
        Self { body, len }
    }

    /// The bytes following `bDescriptorType`, starting with `bDescriptorSubtype`.
    pub fn body(&self) -> &[u8] {
        &self.body[..self.len]
    }

    /// The descriptor sub-type tag.
    pub fn subtype(&self) -> u8 {
        self.body[0]
    }

    /// The `bLength` the descriptor occupies on the wire.
    pub fn total_len(&self) -> usize {
        self.len + 2
    }
}

/// The functional descriptors of the control interface, in wire order:
/// header, call management, ACM, union.
///
/// The device advertises no call management and no ACM capabilities.
pub fn functional_descriptors(comm_if: u8, data_if: u8) -> [Functional; 4] {
    let [release_lo, release_hi] = CDC_RELEASE.to_le_bytes();
    [
        Functional::new([CDC_TYPE_HEADER, release_lo, release_hi], 3),
        Functional::new([CDC_TYPE_CALL_MANAGEMENT, 0x00, data_if], 3),
        Functional::new([CDC_TYPE_ACM, 0x00, 0x00], 2),
        Functional::new([CDC_TYPE_UNION, comm_if, data_if], 3),
    ]
}
