//! CDC-ACM class
//!
//! [`AnalogIoClass`] owns the interfaces and endpoints, and routes bulk OUT
//! packets into its [`Link`]. Pass it to `UsbDevice::poll`, and call
//! [`service()`](AnalogIoClass::service) after every poll.

use crate::activity::LinkState;
use crate::clock::Clock;
use crate::config;
use crate::control::{self, ControlLines, LineCoding, Response};
use crate::descriptor::{self, CS_INTERFACE};
use crate::error::Error;
use crate::hardware::{Actuators, AnalogInput};
use crate::link::Link;
use embedded_hal::digital::OutputPin;
use usb_device::class_prelude::*;
use usb_device::control::{Recipient, Request, RequestType};

/// A CDC-ACM function whose bulk endpoints carry analog I/O commands.
pub struct AnalogIoClass<'a, B: UsbBus, H, L> {
    comm_if: InterfaceNumber,
    data_if: InterfaceNumber,
    notify_ep: EndpointIn<'a, B>,
    read_ep: EndpointOut<'a, B>,
    write_ep: EndpointIn<'a, B>,
    clock: &'a Clock,
    link: Link<H, L>,
    line_coding: LineCoding,
    control_lines: ControlLines,
}

impl<'a, B, H, L> AnalogIoClass<'a, B, H, L>
where
    B: UsbBus,
    H: Actuators + AnalogInput,
    L: OutputPin,
{
    /// Allocate the class on `alloc`, at the endpoint addresses in [`config`].
    ///
    /// `clock` timestamps every received command. The link sleeps again
    /// after `idle_window_ms` without commands.
    pub fn new(
        alloc: &'a UsbBusAllocator<B>,
        clock: &'a Clock,
        hardware: H,
        indicator: L,
        idle_window_ms: u32,
    ) -> usb_device::Result<Self> {
        let comm_if = alloc.interface();
        let notify_ep = alloc.alloc(
            Some(EndpointAddress::from(config::NOTIFY_EP_ADDR)),
            EndpointType::Interrupt,
            config::NOTIFY_EP_PACKET_SIZE,
            config::NOTIFY_EP_INTERVAL,
        )?;
        let data_if = alloc.interface();
        let read_ep = alloc.alloc(
            Some(EndpointAddress::from(config::DATA_OUT_EP_ADDR)),
            EndpointType::Bulk,
            config::DATA_PACKET_SIZE,
            0,
        )?;
        let write_ep = alloc.alloc(
            Some(EndpointAddress::from(config::DATA_IN_EP_ADDR)),
            EndpointType::Bulk,
            config::DATA_PACKET_SIZE,
            0,
        )?;
        Ok(Self {
            comm_if,
            data_if,
            notify_ep,
            read_ep,
            write_ep,
            clock,
            link: Link::new(hardware, indicator, idle_window_ms),
            line_coding: LineCoding::default(),
            control_lines: ControlLines::empty(),
        })
    }

    /// Run the link state machine, and send pending telemetry.
    ///
    /// See [`Link::service`].
    pub fn service(&mut self) -> Result<(), Error<H::Error>> {
        self.link.service(self.clock.now(), &mut self.write_ep)
    }

    /// Current link state.
    pub fn state(&self) -> LinkState {
        self.link.state()
    }

    /// Line coding, as last set by the host.
    pub fn line_coding(&self) -> LineCoding {
        self.line_coding
    }

    /// Control lines, as last set by the host.
    pub fn control_lines(&self) -> ControlLines {
        self.control_lines
    }

    /// The link, with its hardware and indicator.
    pub fn link(&self) -> &Link<H, L> {
        &self.link
    }

    /// Mutable access to the link, e.g. to drive the indicator at startup.
    pub fn link_mut(&mut self) -> &mut Link<H, L> {
        &mut self.link
    }

    fn is_comm_request(&self, req: &Request) -> bool {
        req.request_type == RequestType::Class
            && req.recipient == Recipient::Interface
            && req.index == u16::from(u8::from(self.comm_if))
    }
}

impl<B, H, L> UsbClass<B> for AnalogIoClass<'_, B, H, L>
where
    B: UsbBus,
    H: Actuators + AnalogInput,
    L: OutputPin,
{
    fn get_configuration_descriptors(&self, writer: &mut DescriptorWriter) -> usb_device::Result<()> {
        writer.interface(
            self.comm_if,
            descriptor::USB_CLASS_CDC,
            descriptor::CDC_SUBCLASS_ACM,
            descriptor::CDC_PROTOCOL_AT,
        )?;
        for functional in descriptor::functional_descriptors(self.comm_if.into(), self.data_if.into()) {
            writer.write(CS_INTERFACE, functional.body())?;
        }
        writer.endpoint(&self.notify_ep)?;

        writer.interface(self.data_if, descriptor::USB_CLASS_CDC_DATA, 0x00, 0x00)?;
        writer.endpoint(&self.read_ep)?;
        writer.endpoint(&self.write_ep)?;
        Ok(())
    }

    fn reset(&mut self) {
        self.line_coding = LineCoding::default();
        self.control_lines = ControlLines::empty();
    }

    fn control_in(&mut self, xfer: ControlIn<B>) {
        if !self.is_comm_request(xfer.request()) {
            return;
        }
        debug!("Rejected IN request {}", xfer.request().request);
        xfer.reject().ok();
    }

    fn control_out(&mut self, xfer: ControlOut<B>) {
        let req = *xfer.request();
        if !self.is_comm_request(&req) {
            return;
        }

        match control::respond(req.request, xfer.data().len()) {
            Response::Handled => {
                match req.request {
                    control::REQ_SET_CONTROL_LINE_STATE => {
                        self.control_lines = ControlLines::from_request_value(req.value);
                        debug!("Control lines {=u16:#x}", self.control_lines.bits());
                    }
                    control::REQ_SET_LINE_CODING => {
                        if let Some(coding) = LineCoding::parse(xfer.data()) {
                            self.line_coding = coding;
                            debug!("Line coding {}", coding);
                        }
                    }
                    _ => {}
                }
                xfer.accept().ok();
            }
            Response::NotSupported => {
                debug!("Rejected OUT request {}", req.request);
                xfer.reject().ok();
            }
        }
    }

    fn endpoint_out(&mut self, addr: EndpointAddress) {
        if addr != self.read_ep.address() {
            return;
        }

        let mut buffer = [0u8; config::DATA_PACKET_SIZE as usize];
        match self.read_ep.read(&mut buffer) {
            Ok(len) => {
                let now = self.clock.now();
                self.link.handle_packet(&buffer[..len], now, &mut self.write_ep);
            }
            Err(UsbError::WouldBlock) => {}
            Err(_err) => {
                warn!("Bulk OUT read failed: {}", _err);
            }
        }
    }
}
