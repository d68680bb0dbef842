//! ADS1115 16-bit ADC, single-shot single-ended conversions.
//!
//! The four inputs carry the light, gas, rain and soil probes. Each
//! conversion writes the config register (start + mux), waits for the
//! OS bit to report completion, then reads the conversion register.
//!
//! Config word used:
//! ```text
//!  15  14..12  11..9   8     7..5   4..0
//!  OS  MUX     PGA     MODE  DR     COMP (disabled)
//!  1   1xx     001     1     100    00011
//! ```
//! PGA 001 is ±4.096 V full scale; DR 100 is 128 samples/s.

use embedded_hal::delay::DelayNs;

use crate::app::ports::I2cBus;
use crate::error::TransportError;

pub const DEFAULT_ADDRESS: u8 = 0x48;
pub const REG_CONVERSION: u8 = 0x00;
pub const REG_CONFIG: u8 = 0x01;

/// Full-scale range in volts for PGA setting 001.
pub const FULL_SCALE_VOLTS: f64 = 4.096;

const OS_START: u16 = 0x8000;
const PGA_4V096: u16 = 0b001 << 9;
const MODE_SINGLE: u16 = 1 << 8;
const DR_128SPS: u16 = 0b100 << 5;
const COMP_DISABLE: u16 = 0b11;

/// One conversion at 128 SPS takes ~7.8 ms.
const CONVERSION_WAIT_US: u32 = 8_000;
const MAX_READY_POLLS: usize = 5;

/// Single-ended input selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcInput(u8);

impl AdcInput {
    /// `None` for inputs above 3.
    pub fn new(index: u8) -> Option<Self> {
        (index <= 3).then_some(Self(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

/// Config register value that starts a conversion on `input`.
pub fn config_word(input: AdcInput) -> u16 {
    let mux = (0b100 | u16::from(input.0)) << 12;
    OS_START | mux | PGA_4V096 | MODE_SINGLE | DR_128SPS | COMP_DISABLE
}

/// Decoded input of a config word, as a chip model would see it.
pub fn input_from_config(word: u16) -> Option<AdcInput> {
    let mux = (word >> 12) & 0b111;
    (mux & 0b100 != 0).then(|| AdcInput((mux & 0b011) as u8))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdcSample {
    pub raw: i16,
    pub volts: f64,
}

impl AdcSample {
    pub fn from_raw(raw: i16) -> Self {
        Self {
            raw,
            volts: f64::from(raw) * FULL_SCALE_VOLTS / 32768.0,
        }
    }
}

/// Run one single-shot conversion. The caller must hold the bus.
pub fn read_single_ended(
    bus: &mut dyn I2cBus,
    delay: &mut impl DelayNs,
    address: u8,
    input: AdcInput,
) -> Result<AdcSample, TransportError> {
    bus.write_block(address, REG_CONFIG, &config_word(input).to_be_bytes())?;

    let mut status = [0u8; 2];
    let mut ready = false;
    for _ in 0..MAX_READY_POLLS {
        delay.delay_us(CONVERSION_WAIT_US);
        bus.read_block(address, REG_CONFIG, &mut status)?;
        if u16::from_be_bytes(status) & OS_START != 0 {
            ready = true;
            break;
        }
    }
    if !ready {
        return Err(TransportError::Timeout);
    }

    let mut raw = [0u8; 2];
    bus.read_block(address, REG_CONVERSION, &mut raw)?;
    Ok(AdcSample::from_raw(i16::from_be_bytes(raw)))
}
