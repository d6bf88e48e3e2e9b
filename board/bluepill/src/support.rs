//! Support library (qualified as `support`) for the Blue Pill firmware.
//!
//! Pin map:
//!
//! | Function           | Pin              |
//! | ------------------ | ---------------- |
//! | Indicator          | PC13             |
//! | Servo 0, 1, 2      | PA0, PA1, PA2 (TIM2 CH1..CH3) |
//! | Analog samples     | PA4, PA5 (ADC1 IN4, IN5) |
//! | MCP4922 SCK, MOSI  | PB3, PB5 (SPI1, remapped) |
//! | MCP4922 CS         | PB8              |
//! | USB D-, D+         | PA11, PA12       |

#![no_std]

pub use stm32f1::stm32f103 as pac;

use embedded_hal::digital::{ErrorType, OutputPin};
use usbd_analog_io::{ActuatorChannel, Actuators, AnalogChannel, AnalogInput, ServoChannel};

/// Core clock, from the 8 MHz crystal.
pub const SYSCLK_HZ: u32 = 72_000_000;

/// Servo PWM period, in microseconds (50 Hz).
pub const SERVO_PERIOD_US: u16 = 20_000;

/// End-of-conversion polls before a sample is abandoned.
pub const ADC_TIMEOUT_SPINS: u32 = 10_000;

/// Time for the host to notice the forced disconnect.
const USB_DISCONNECT_CYCLES: u32 = SYSCLK_HZ / 100;

// Port configuration nibbles (CNF:MODE)
const PIN_ANALOG: u32 = 0b0000;
const PIN_FLOATING: u32 = 0b0100;
const PIN_OUTPUT_2MHZ: u32 = 0b0010;
const PIN_OUTPUT_50MHZ: u32 = 0b0011;
const PIN_ALTERNATE_50MHZ: u32 = 0b1011;

/// Configure `pin` of `port`.
fn configure_pin(port: &pac::gpioa::RegisterBlock, pin: u32, nibble: u32) {
    let shift = (pin % 8) * 4;
    let mask = !(0xF << shift);
    if pin < 8 {
        port.crl
            .modify(|r, w| unsafe { w.bits((r.bits() & mask) | (nibble << shift)) });
    } else {
        port.crh
            .modify(|r, w| unsafe { w.bits((r.bits() & mask) | (nibble << shift)) });
    }
}

fn set_pin(port: &pac::gpioa::RegisterBlock, pin: u32, high: bool) {
    let bit = if high { 1 << pin } else { 1 << (pin + 16) };
    port.bsrr.write(|w| unsafe { w.bits(bit) });
}

/// Run the core at 72 MHz from HSE, with a 48 MHz USB clock.
///
/// APB1 runs at 36 MHz, so its timers see 72 MHz. The ADC runs at 12 MHz.
pub fn initialize_clocks(rcc: &pac::RCC, flash: &pac::FLASH) {
    rcc.cr.modify(|_, w| w.hseon().set_bit());
    while rcc.cr.read().hserdy().bit_is_clear() {}

    // Two wait states above 48 MHz
    flash
        .acr
        .modify(|_, w| w.latency().ws2().prftbe().set_bit());

    rcc.cfgr.modify(|_, w| {
        w.hpre()
            .div1()
            .ppre1()
            .div2()
            .ppre2()
            .div1()
            .adcpre()
            .div6()
            .pllsrc()
            .hse_div_prediv()
            .pllxtpre()
            .div1()
            .pllmul()
            .mul9()
            .usbpre()
            .div1_5()
    });

    rcc.cr.modify(|_, w| w.pllon().set_bit());
    while rcc.cr.read().pllrdy().bit_is_clear() {}

    rcc.cfgr.modify(|_, w| w.sw().pll());
    while !rcc.cfgr.read().sws().is_pll() {}

    rcc.apb2enr.modify(|_, w| {
        w.iopaen()
            .set_bit()
            .iopben()
            .set_bit()
            .iopcen()
            .set_bit()
            .afioen()
            .set_bit()
            .spi1en()
            .set_bit()
            .adc1en()
            .set_bit()
    });
    rcc.apb1enr.modify(|_, w| w.tim2en().set_bit());
}

/// Tick at 1 kHz, from HCLK / 8.
pub fn configure_systick(syst: &mut cortex_m::peripheral::SYST) {
    use cortex_m::peripheral::syst::SystClkSource;
    syst.set_clock_source(SystClkSource::External);
    syst.set_reload(SYSCLK_HZ / 8 / 1_000 - 1);
    syst.clear_current();
    syst.enable_interrupt();
    syst.enable_counter();
}

/// Hold D+ low for a moment, so that the host re-enumerates after a reset.
///
/// The Blue Pill has a fixed pull-up on D+.
pub fn force_usb_reenumeration(gpioa: &pac::GPIOA) {
    configure_pin(gpioa, 12, PIN_OUTPUT_2MHZ);
    set_pin(gpioa, 12, false);
    cortex_m::asm::delay(USB_DISCONNECT_CYCLES);
    configure_pin(gpioa, 12, PIN_FLOATING);
}

/// The USB FS peripheral, for `stm32-usbd`.
pub struct UsbPeripheral {
    _usb: pac::USB,
}

impl UsbPeripheral {
    pub fn new(usb: pac::USB) -> Self {
        Self { _usb: usb }
    }
}

// Safety: the peripheral is only accessed through the bus, which
// serializes access with a critical section.
unsafe impl Sync for UsbPeripheral {}

unsafe impl stm32_usbd::UsbPeripheral for UsbPeripheral {
    const REGISTERS: *const () = pac::USB::ptr() as *const ();
    const DP_PULL_UP_FEATURE: bool = false;
    const EP_MEMORY: *const () = 0x4000_6000 as _;
    const EP_MEMORY_SIZE: usize = 512;
    const EP_MEMORY_ACCESS_2X16: bool = false;

    fn enable() {
        // Safety: single, atomic read-modify-writes of USB bits
        let rcc = unsafe { &*pac::RCC::ptr() };
        cortex_m::interrupt::free(|_| {
            rcc.apb1enr.modify(|_, w| w.usben().set_bit());
            rcc.apb1rstr.modify(|_, w| w.usbrst().set_bit());
            rcc.apb1rstr.modify(|_, w| w.usbrst().clear_bit());
        });
    }

    fn startup_delay() {
        // tSTARTUP = 1us
        cortex_m::asm::delay(SYSCLK_HZ / 1_000_000);
    }
}

pub type UsbBus = stm32_usbd::UsbBus<UsbPeripheral>;

/// The on-board LED, on PC13.
///
/// Levels are electrical. The Blue Pill LED lights when the pin is low.
pub struct Indicator {
    gpioc: pac::GPIOC,
}

impl Indicator {
    pub fn new(gpioc: pac::GPIOC) -> Self {
        configure_pin(&gpioc, 13, PIN_OUTPUT_2MHZ);
        set_pin(&gpioc, 13, false);
        Self { gpioc }
    }
}

impl ErrorType for Indicator {
    type Error = core::convert::Infallible;
}

impl OutputPin for Indicator {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        set_pin(&self.gpioc, 13, false);
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Self::Error> {
        set_pin(&self.gpioc, 13, true);
        Ok(())
    }
}

/// MCP4922 dual 12-bit DAC on SPI1.
pub struct Mcp4922 {
    spi: pac::SPI1,
}

// Shutdown off, 1x gain, unbuffered reference
const MCP4922_ACTIVE: u16 = 0x3000;
const MCP4922_CS_PIN: u32 = 8;

impl Mcp4922 {
    /// Takes PB3, PB5 and PB8, remapping SPI1 away from the analog inputs.
    pub fn new(spi: pac::SPI1, gpiob: &pac::GPIOB, afio: &pac::AFIO) -> Self {
        // PB3 is JTDO. Keep SWD.
        afio.mapr
            .modify(|_, w| unsafe { w.swj_cfg().bits(0b010).spi1_remap().set_bit() });
        configure_pin(gpiob, 3, PIN_ALTERNATE_50MHZ);
        configure_pin(gpiob, 5, PIN_ALTERNATE_50MHZ);
        configure_pin(gpiob, 4, PIN_FLOATING);
        configure_pin(gpiob, MCP4922_CS_PIN, PIN_OUTPUT_50MHZ);
        set_pin(gpiob, MCP4922_CS_PIN, true);

        // Master, PCLK / 4, mode 0, 16-bit frames, MSB first, software NSS held high
        spi.cr1.write(|w| {
            w.mstr()
                .set_bit()
                .br()
                .div4()
                .cpol()
                .clear_bit()
                .cpha()
                .clear_bit()
                .dff()
                .set_bit()
                .lsbfirst()
                .clear_bit()
                .ssm()
                .set_bit()
                .ssi()
                .set_bit()
        });
        spi.cr1.modify(|_, w| w.spe().set_bit());
        Self { spi }
    }

    /// Command word for `channel`, from the low 12 bits of `value`.
    pub fn word(channel: ActuatorChannel, value: u16) -> u16 {
        (u16::from(channel as u8) << 15) | MCP4922_ACTIVE | (value & 0x0FFF)
    }

    pub fn write(&mut self, channel: ActuatorChannel, value: u16) {
        // Safety: PB8 is only driven here
        let gpiob = unsafe { &*pac::GPIOB::ptr() };
        set_pin(gpiob, MCP4922_CS_PIN, false);
        while self.spi.sr.read().txe().bit_is_clear() {}
        self.spi
            .dr
            .write(|w| w.dr().bits(Self::word(channel, value)));
        while self.spi.sr.read().txe().bit_is_clear() {}
        while self.spi.sr.read().bsy().bit_is_set() {}
        set_pin(gpiob, MCP4922_CS_PIN, true);
    }
}

/// Three servo outputs on TIM2, with 1 us resolution.
pub struct Servos {
    tim: pac::TIM2,
}

impl Servos {
    /// Takes PA0, PA1 and PA2. Outputs start low until the first position.
    pub fn new(tim: pac::TIM2, gpioa: &pac::GPIOA) -> Self {
        for pin in 0..3 {
            configure_pin(gpioa, pin, PIN_ALTERNATE_50MHZ);
        }
        // 72 MHz / 72 = 1 MHz
        tim.psc.write(|w| w.psc().bits((SYSCLK_HZ / 1_000_000 - 1) as u16));
        tim.arr.write(|w| w.arr().bits(SERVO_PERIOD_US - 1));
        tim.ccmr1_output()
            .write(|w| w.oc1m().pwm_mode1().oc1pe().set_bit().oc2m().pwm_mode1().oc2pe().set_bit());
        tim.ccmr2_output()
            .write(|w| w.oc3m().pwm_mode1().oc3pe().set_bit());
        tim.ccer
            .write(|w| w.cc1e().set_bit().cc2e().set_bit().cc3e().set_bit());
        tim.egr.write(|w| w.ug().set_bit());
        tim.cr1.modify(|_, w| w.arpe().set_bit().cen().set_bit());
        Self { tim }
    }

    /// Set the pulse width of `channel`, in microseconds.
    ///
    /// Widths beyond the period hold the output high.
    pub fn set_pulse_us(&mut self, channel: ServoChannel, width: u16) {
        let width = u32::from(width.min(SERVO_PERIOD_US));
        match channel {
            ServoChannel::Zero => self.tim.ccr1.write(|w| unsafe { w.bits(width) }),
            ServoChannel::One => self.tim.ccr2.write(|w| unsafe { w.bits(width) }),
            ServoChannel::Two => self.tim.ccr3.write(|w| unsafe { w.bits(width) }),
        }
    }
}

/// ADC1 did not finish a conversion in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct AdcTimeout {
    pub channel: u8,
}

/// ADC1, single conversions, right aligned.
pub struct Adc {
    adc: pac::ADC1,
}

// 28.5 cycle sample time
const ADC_SAMPLE_TIME: u32 = 0b011;
const ADC_CR2_ADON: u32 = 1 << 0;
const ADC_CR2_CAL: u32 = 1 << 2;
const ADC_CR2_RSTCAL: u32 = 1 << 3;
const ADC_CR2_EXTSEL_SWSTART: u32 = 0b111 << 17;
const ADC_CR2_EXTTRIG: u32 = 1 << 20;
const ADC_CR2_SWSTART: u32 = 1 << 22;
const ADC_SR_EOC: u32 = 1 << 1;

impl Adc {
    /// Takes PA4 and PA5 as analog inputs, then powers up and calibrates ADC1.
    pub fn new(adc: pac::ADC1, gpioa: &pac::GPIOA) -> Self {
        configure_pin(gpioa, 4, PIN_ANALOG);
        configure_pin(gpioa, 5, PIN_ANALOG);

        adc.cr2.write(|w| unsafe { w.bits(0) });
        adc.cr1.write(|w| unsafe { w.bits(0) });
        adc.smpr2.modify(|r, w| unsafe {
            w.bits(r.bits() | (ADC_SAMPLE_TIME << (4 * 3)) | (ADC_SAMPLE_TIME << (5 * 3)))
        });
        adc.cr2.write(|w| unsafe {
            w.bits(ADC_CR2_ADON | ADC_CR2_EXTTRIG | ADC_CR2_EXTSEL_SWSTART)
        });
        // tSTAB
        cortex_m::asm::delay(SYSCLK_HZ / 1_000_000 * 2);

        adc.cr2.modify(|r, w| unsafe { w.bits(r.bits() | ADC_CR2_RSTCAL) });
        while adc.cr2.read().bits() & ADC_CR2_RSTCAL != 0 {}
        adc.cr2.modify(|r, w| unsafe { w.bits(r.bits() | ADC_CR2_CAL) });
        while adc.cr2.read().bits() & ADC_CR2_CAL != 0 {}
        Self { adc }
    }
}

impl AnalogInput for Adc {
    type Error = AdcTimeout;

    fn read_analog(&mut self, channel: AnalogChannel) -> Result<u16, AdcTimeout> {
        let AnalogChannel(number) = channel;
        self.adc.sqr1.write(|w| unsafe { w.bits(0) });
        self.adc
            .sqr3
            .write(|w| unsafe { w.bits(u32::from(number & 0x1F)) });
        self.adc
            .cr2
            .modify(|r, w| unsafe { w.bits(r.bits() | ADC_CR2_SWSTART) });

        for _ in 0..ADC_TIMEOUT_SPINS {
            if self.adc.sr.read().bits() & ADC_SR_EOC != 0 {
                // Reading DR clears EOC
                return Ok(self.adc.dr.read().bits() as u16 & 0x0FFF);
            }
        }
        Err(AdcTimeout { channel: number })
    }
}

/// Everything a command or a telemetry sample touches.
pub struct Board {
    pub dac: Mcp4922,
    pub servos: Servos,
    pub adc: Adc,
}

impl Actuators for Board {
    fn set_actuator_output(&mut self, channel: ActuatorChannel, value: u16) {
        self.dac.write(channel, value);
    }

    fn set_servo_position(&mut self, channel: ServoChannel, position: u16) {
        self.servos.set_pulse_us(channel, position);
    }
}

impl AnalogInput for Board {
    type Error = AdcTimeout;

    fn read_analog(&mut self, channel: AnalogChannel) -> Result<u16, AdcTimeout> {
        self.adc.read_analog(channel)
    }
}
