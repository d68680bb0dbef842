//! Simulated field station.
//!
//! Register-level models of the BMP180 and ADS1115 on a virtual I2C bus,
//! a Modbus responder standing in for the NPK probe, and software DHT22 and
//! DS18B20 sources. Values drift slowly along a sine with a little
//! pseudo-random jitter, so classifications change over a session the way
//! they do outdoors.
//!
//! Used by `--simulate` and by integration tests that want a full stack
//! without hardware.

use std::f64::consts::TAU;
use std::path::PathBuf;
use std::time::Duration;

use log::debug;

use crate::app::ports::{
    HumidityTemperatureSensor, I2cBus, OneWireBus, OneWireDevice, SerialPort,
};
use crate::app::service::Hardware;
use crate::codec::Calibration;
use crate::codec::bmp180::{
    CMD_READ_PRESSURE, CMD_READ_TEMPERATURE, REG_CALIBRATION, REG_CONTROL, REG_RESULT,
};
use crate::codec::modbus::{FN_READ_HOLDING, QUERY_LEN, build_read_response, crc_matches};
use crate::config::{AgentConfig, HardwareConfig};
use crate::error::TransportError;
use crate::sensors::ads1115::{REG_CONFIG, REG_CONVERSION, input_from_config};
use crate::sensors::npk::Nutrient;

// ───────────────────────────────────────────────────────────────
// Signal generator
// ───────────────────────────────────────────────────────────────

/// Slow sine plus xorshift jitter.
#[derive(Debug, Clone)]
pub struct Wave {
    base: f64,
    amplitude: f64,
    period: u32,
    jitter: f64,
    tick: u32,
    rng: u64,
}

impl Wave {
    pub fn new(base: f64, amplitude: f64, period: u32, jitter: f64, seed: u64) -> Self {
        Self {
            base,
            amplitude,
            period: period.max(1),
            jitter,
            tick: 0,
            rng: seed | 1,
        }
    }

    fn next_noise(&mut self) -> f64 {
        self.rng ^= self.rng << 13;
        self.rng ^= self.rng >> 7;
        self.rng ^= self.rng << 17;
        (self.rng >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
    }

    pub fn sample(&mut self) -> f64 {
        let phase = f64::from(self.tick % self.period) / f64::from(self.period);
        self.tick = self.tick.wrapping_add(1);
        self.base + self.amplitude * (TAU * phase).sin() + self.jitter * self.next_noise()
    }
}

// ───────────────────────────────────────────────────────────────
// I2C bus: BMP180 + ADS1115
// ───────────────────────────────────────────────────────────────

/// Coefficients from the BMP180 datasheet worked example.
pub const SIM_BMP180_CALIBRATION: Calibration = Calibration {
    ac1: 408,
    ac2: -72,
    ac3: -14383,
    ac4: 32741,
    ac5: 32757,
    ac6: 23153,
    b1: 6190,
    b2: 4,
    mb: -32768,
    mc: -8711,
    md: 2868,
};

pub struct SimI2cBus {
    bmp180_address: u8,
    ads1115_address: u8,
    bmp_result: [u8; 3],
    ut: Wave,
    up: Wave,
    ads_config: u16,
    /// Indexed by ADS1115 input.
    channels: [Wave; 4],
}

impl SimI2cBus {
    pub fn new(hw: &HardwareConfig) -> Self {
        let mut channels = [
            Wave::new(16_000.0, 2_000.0, 60, 300.0, 11),
            Wave::new(16_000.0, 2_000.0, 60, 300.0, 12),
            Wave::new(16_000.0, 2_000.0, 60, 300.0, 13),
            Wave::new(16_000.0, 2_000.0, 60, 300.0, 14),
        ];
        // Light swings day/night, rain mostly dry, soil around optimal.
        channels[usize::from(hw.light_input & 3)] = Wave::new(15_000.0, 9_000.0, 120, 400.0, 21);
        channels[usize::from(hw.gas_input & 3)] = Wave::new(11_000.0, 4_000.0, 90, 500.0, 22);
        channels[usize::from(hw.rain_input & 3)] = Wave::new(23_000.0, 5_000.0, 200, 300.0, 23);
        channels[usize::from(hw.soil_input & 3)] = Wave::new(19_000.0, 3_500.0, 150, 200.0, 24);
        Self {
            bmp180_address: hw.bmp180_address,
            ads1115_address: hw.ads1115_address,
            bmp_result: [0; 3],
            // ~22 °C die temperature, ~765 hPa before the station offset.
            ut: Wave::new(28_800.0, 300.0, 100, 20.0, 31),
            up: Wave::new(25_600.0, 250.0, 300, 10.0, 32),
            ads_config: 0,
            channels,
        }
    }

    fn bmp_read(&mut self, register: u8, buf: &mut [u8]) -> Result<(), TransportError> {
        match register {
            REG_CALIBRATION => {
                let cal = SIM_BMP180_CALIBRATION.to_bytes();
                let n = buf.len().min(cal.len());
                buf[..n].copy_from_slice(&cal[..n]);
                Ok(())
            }
            REG_RESULT => {
                let n = buf.len().min(3);
                buf[..n].copy_from_slice(&self.bmp_result[..n]);
                Ok(())
            }
            _ => Err(TransportError::Nack),
        }
    }

    fn bmp_write(&mut self, register: u8, value: u8) -> Result<(), TransportError> {
        if register != REG_CONTROL {
            return Err(TransportError::Nack);
        }
        match value {
            CMD_READ_TEMPERATURE => {
                let ut = self.ut.sample().clamp(0.0, 65_535.0) as u16;
                let [hi, lo] = ut.to_be_bytes();
                self.bmp_result = [hi, lo, 0];
            }
            CMD_READ_PRESSURE => {
                let up = self.up.sample().clamp(0.0, 65_535.0) as u32;
                let [_, hi, lo, xlo] = (up << 8).to_be_bytes();
                self.bmp_result = [hi, lo, xlo];
            }
            _ => return Err(TransportError::Nack),
        }
        Ok(())
    }

    fn ads_read(&mut self, register: u8, buf: &mut [u8]) -> Result<(), TransportError> {
        let word = match register {
            // Conversion is instant in simulation: OS bit always set.
            REG_CONFIG => self.ads_config | 0x8000,
            REG_CONVERSION => {
                let input = input_from_config(self.ads_config).ok_or(TransportError::Nack)?;
                let raw = self.channels[usize::from(input.index())]
                    .sample()
                    .clamp(0.0, 32_767.0);
                raw as i16 as u16
            }
            _ => return Err(TransportError::Nack),
        };
        let bytes = word.to_be_bytes();
        let n = buf.len().min(2);
        buf[..n].copy_from_slice(&bytes[..n]);
        Ok(())
    }
}

impl I2cBus for SimI2cBus {
    fn read_block(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), TransportError> {
        if address == self.bmp180_address {
            self.bmp_read(register, buf)
        } else if address == self.ads1115_address {
            self.ads_read(register, buf)
        } else {
            Err(TransportError::Nack)
        }
    }

    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), TransportError> {
        if address == self.bmp180_address {
            self.bmp_write(register, value)
        } else {
            Err(TransportError::Nack)
        }
    }

    fn write_block(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), TransportError> {
        if address == self.ads1115_address && register == REG_CONFIG && data.len() == 2 {
            self.ads_config = u16::from_be_bytes([data[0], data[1]]);
            Ok(())
        } else if address == self.bmp180_address && data.len() == 1 {
            self.bmp_write(register, data[0])
        } else {
            Err(TransportError::Nack)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// NPK Modbus responder
// ───────────────────────────────────────────────────────────────

pub struct SimNpkProbe {
    address: u8,
    pending: Option<[u8; 7]>,
    nitrogen: Wave,
    phosphorus: Wave,
    potassium: Wave,
}

impl SimNpkProbe {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            pending: None,
            nitrogen: Wave::new(90.0, 40.0, 400, 3.0, 41),
            phosphorus: Wave::new(38.0, 18.0, 400, 2.0, 42),
            potassium: Wave::new(75.0, 35.0, 400, 3.0, 43),
        }
    }
}

impl SerialPort for SimNpkProbe {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.pending = None;
        if data.len() != QUERY_LEN
            || data[0] != self.address
            || data[1] != FN_READ_HOLDING
            || !crc_matches(data)
        {
            debug!("SimNPK: ignoring malformed query {:02X?}", data);
            return Ok(());
        }
        let register = u16::from_be_bytes([data[2], data[3]]);
        let value = match Nutrient::from_register(register) {
            Some(Nutrient::Nitrogen) => self.nitrogen.sample(),
            Some(Nutrient::Phosphorus) => self.phosphorus.sample(),
            Some(Nutrient::Potassium) => self.potassium.sample(),
            None => return Ok(()),
        };
        self.pending = Some(build_read_response(
            self.address,
            value.clamp(0.0, 1999.0) as u16,
        ));
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize, TransportError> {
        let Some(frame) = self.pending.take() else {
            return Ok(0);
        };
        let n = buf.len().min(frame.len());
        buf[..n].copy_from_slice(&frame[..n]);
        Ok(n)
    }

    fn discard_input(&mut self) -> Result<(), TransportError> {
        self.pending = None;
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// DHT22 and DS18B20 sources
// ───────────────────────────────────────────────────────────────

pub struct SimDht22 {
    reads: u32,
    temperature: Wave,
    humidity: Wave,
}

/// The real sensor misses roughly one read in seven.
const DHT_MISS_EVERY: u32 = 7;

impl SimDht22 {
    pub fn new() -> Self {
        Self {
            reads: 0,
            temperature: Wave::new(24.0, 4.0, 240, 0.2, 51),
            humidity: Wave::new(62.0, 12.0, 240, 1.0, 52),
        }
    }
}

impl Default for SimDht22 {
    fn default() -> Self {
        Self::new()
    }
}

impl HumidityTemperatureSensor for SimDht22 {
    fn read(&mut self) -> Result<Option<(f64, f64)>, TransportError> {
        self.reads = self.reads.wrapping_add(1);
        if self.reads % DHT_MISS_EVERY == 0 {
            return Ok(None);
        }
        Ok(Some((self.temperature.sample(), self.humidity.sample())))
    }
}

pub struct SimOneWire {
    device: OneWireDevice,
    water: Wave,
}

impl SimOneWire {
    pub fn new() -> Self {
        let id = "28-00000a1b2c3d".to_string();
        Self {
            device: OneWireDevice {
                path: PathBuf::from("/sim/w1").join(&id).join("w1_slave"),
                id,
            },
            water: Wave::new(24.0, 7.0, 300, 0.1, 61),
        }
    }
}

impl Default for SimOneWire {
    fn default() -> Self {
        Self::new()
    }
}

impl OneWireBus for SimOneWire {
    fn find_device(&mut self) -> Option<OneWireDevice> {
        Some(self.device.clone())
    }

    fn is_present(&self, device: &OneWireDevice) -> bool {
        *device == self.device
    }

    fn read_text(&mut self, device: &OneWireDevice) -> Result<String, TransportError> {
        if *device != self.device {
            return Err(TransportError::NotPresent);
        }
        let millis = (self.water.sample() * 1000.0).round() as i64;
        Ok(format!(
            "72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n72 01 4b 46 7f ff 0e 10 57 t={millis}\n"
        ))
    }
}

/// A complete simulated station wired the way `config` describes it.
pub fn station(config: &AgentConfig) -> Hardware {
    Hardware {
        i2c: Box::new(SimI2cBus::new(&config.hardware)),
        serial: Some(Box::new(SimNpkProbe::new(config.npk.device_address))),
        dht: Box::new(SimDht22::new()),
        one_wire: Box::new(SimOneWire::new()),
    }
}
