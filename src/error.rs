//! Transport errors

use usb_device::UsbError;

/// Errors surfaced while servicing the link.
///
/// `E` is the [`AnalogInput`](crate::AnalogInput) error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The bulk IN endpoint refused the packet.
    Transmit(UsbError),
    /// An analog sample couldn't be taken.
    Analog(E),
}

impl<E> From<UsbError> for Error<E> {
    fn from(err: UsbError) -> Self {
        Error::Transmit(err)
    }
}
