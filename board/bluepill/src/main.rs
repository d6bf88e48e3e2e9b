//! Analog I/O over USB CDC-ACM, on a Blue Pill (STM32F103C8).
//!
//! After reset, the firmware enumerates, then waits five seconds while it
//! services the bus before it accepts commands. See the `usbd-analog-io`
//! documentation for the packet formats.
//!
//! The on-board LED on PC13 is active low, so it reads inverted against the
//! link's indicator. It lights at reset, goes dark once the settle delay
//! ends, stays dark while the link is awake, and lights again when the link
//! sleeps.

#![no_std]
#![no_main]

use defmt_rtt as _;
use panic_probe as _;

use cortex_m_rt::{entry, exception};
use embedded_hal::digital::OutputPin;
use support::pac;
use usb_device::prelude::*;
use usbd_analog_io::{cdc, config, AnalogIoClass, Clock};

/// Settle time after enumeration, serviced by the USB poll.
const STARTUP_SETTLE_MS: u32 = 5_000;

static CLOCK: Clock = Clock::new();

#[exception]
fn SysTick() {
    CLOCK.tick();
}

#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();
    let mut cp = cortex_m::Peripherals::take().unwrap();

    support::initialize_clocks(&dp.RCC, &dp.FLASH);
    support::configure_systick(&mut cp.SYST);

    let indicator = support::Indicator::new(dp.GPIOC);
    support::force_usb_reenumeration(&dp.GPIOA);

    let bus = stm32_usbd::UsbBus::new(support::UsbPeripheral::new(dp.USB));

    let board = support::Board {
        adc: support::Adc::new(dp.ADC1, &dp.GPIOA),
        servos: support::Servos::new(dp.TIM2, &dp.GPIOA),
        dac: support::Mcp4922::new(dp.SPI1, &dp.GPIOB, &dp.AFIO),
    };

    let mut class =
        AnalogIoClass::new(&bus, &CLOCK, board, indicator, config::IDLE_WINDOW_FAST_MS).unwrap();
    let mut device = UsbDeviceBuilder::new(&bus, UsbVidPid(config::USB_VID, config::USB_PID))
        .strings(&[StringDescriptors::default()
            .manufacturer(config::USB_MANUFACTURER)
            .product(config::USB_PRODUCT)
            .serial_number(config::USB_SERIAL_NUMBER)])
        .unwrap()
        .device_class(cdc::USB_CLASS_CDC)
        .device_release(config::USB_DEVICE_RELEASE)
        .max_packet_size_0(config::USB_CONTROL_PACKET_SIZE)
        .unwrap()
        .max_power(config::USB_MAX_POWER_MA)
        .unwrap()
        .build();

    defmt::info!("Settling for {=u32} ms", STARTUP_SETTLE_MS);
    CLOCK.sleep_ms(STARTUP_SETTLE_MS, || {
        device.poll(&mut [&mut class]);
    });
    class.link_mut().indicator_mut().set_high().ok();
    defmt::info!("Ready");

    loop {
        device.poll(&mut [&mut class]);
        if let Err(err) = class.service() {
            defmt::warn!("{}", err);
        }
    }
}
