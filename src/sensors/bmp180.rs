//! BMP180 barometric pressure sensor reader.
//!
//! Calibration is read once at init. Each poll triggers a temperature and
//! a pressure conversion under a single bus hold, compensates them, applies
//! the station offset and derives the pressure trend label and altitude.

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::adapters::delay::StdDelay;
use crate::app::ports::I2cBus;
use crate::channel::Channel;
use crate::codec::bmp180::{
    CALIBRATION_LEN, CMD_READ_PRESSURE, CMD_READ_TEMPERATURE, CONVERSION_DELAY_MS,
    REG_CALIBRATION, REG_CONTROL, REG_RESULT, raw_pressure_from_bytes,
};
use crate::codec::{BreakpointTable, Calibration, calculate_altitude, decode_bmp180};
use crate::error::{ConfigError, Result, TransportError};
use crate::snapshot::{Reading, SnapshotStore};

use super::{SensorReader, SharedI2c};

/// Attempts at reading the calibration block before giving up.
const CALIBRATION_ATTEMPTS: usize = 3;

pub struct Bmp180Reader {
    bus: SharedI2c,
    delay: StdDelay,
    address: u8,
    pressure_offset_hpa: f64,
    sea_level_hpa: f64,
    trend: BreakpointTable,
    calibration: Option<Calibration>,
}

impl Bmp180Reader {
    pub fn new(
        bus: SharedI2c,
        address: u8,
        pressure_offset_hpa: f64,
        sea_level_hpa: f64,
        trend: BreakpointTable,
    ) -> Self {
        Self {
            bus,
            delay: StdDelay,
            address,
            pressure_offset_hpa,
            sea_level_hpa,
            trend,
            calibration: None,
        }
    }
}

fn read_calibration(bus: &mut dyn I2cBus, address: u8) -> Result<Calibration> {
    let mut raw = [0u8; CALIBRATION_LEN];
    let mut last = TransportError::Io;
    for _ in 0..CALIBRATION_ATTEMPTS {
        match bus.read_block(address, REG_CALIBRATION, &mut raw) {
            Ok(()) => return Ok(Calibration::from_bytes(&raw)?),
            Err(e) => last = e,
        }
    }
    debug!("BMP180: calibration read failed: {}", last);
    Err(ConfigError::CalibrationUnavailable.into())
}

/// Temperature then pressure conversion; the caller holds the bus.
fn read_raw(
    bus: &mut dyn I2cBus,
    delay: &mut impl DelayNs,
    address: u8,
) -> core::result::Result<(u16, u32), TransportError> {
    bus.write_byte(address, REG_CONTROL, CMD_READ_TEMPERATURE)?;
    delay.delay_ms(CONVERSION_DELAY_MS);
    let mut t = [0u8; 2];
    bus.read_block(address, REG_RESULT, &mut t)?;

    bus.write_byte(address, REG_CONTROL, CMD_READ_PRESSURE)?;
    delay.delay_ms(CONVERSION_DELAY_MS);
    let mut p = [0u8; 3];
    bus.read_block(address, REG_RESULT, &mut p)?;

    Ok((u16::from_be_bytes(t), raw_pressure_from_bytes(p)))
}

impl SensorReader for Bmp180Reader {
    fn name(&self) -> &'static str {
        "BMP180"
    }

    fn channels(&self) -> &'static [Channel] {
        &[Channel::AirPressure, Channel::Altitude]
    }

    async fn init(&mut self) -> Result<()> {
        let address = self.address;
        let cal = self
            .bus
            .with_bus(|bus| read_calibration(&mut **bus, address))
            .await??;
        info!("BMP180: calibration loaded (AC1={} MD={})", cal.ac1, cal.md);
        self.calibration = Some(cal);
        Ok(())
    }

    async fn poll(&mut self, store: &SnapshotStore) -> Result<()> {
        let cal = self
            .calibration
            .ok_or(ConfigError::CalibrationUnavailable)?;
        let address = self.address;
        let delay = &mut self.delay;
        let (ut, up) = self
            .bus
            .with_bus(|bus| read_raw(&mut **bus, delay, address))
            .await??;

        let (celsius, raw_hpa) = decode_bmp180(&cal, ut, up)?;
        let pressure = raw_hpa + self.pressure_offset_hpa;
        let altitude = calculate_altitude(pressure, self.sea_level_hpa);
        debug!(
            "BMP180: die {:.1}\u{00b0}C, raw {:.2} hPa, corrected {:.2} hPa",
            celsius, raw_hpa, pressure
        );

        store.write(
            Channel::AirPressure,
            Reading::Value(pressure),
            Some(self.trend.classify(pressure)),
        );
        store.write(Channel::Altitude, Reading::Value(altitude), None);
        Ok(())
    }
}
