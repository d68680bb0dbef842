//! BMP180 compensation arithmetic.
//!
//! Integer pipeline from the Bosch datasheet (section 3.5), run at
//! oversampling setting 0. Divisions truncate toward zero and shifts are
//! arithmetic, matching the reference C implementation bit-for-bit.

use crate::error::{ConfigError, DecodeError};

/// Default I2C address.
pub const I2C_ADDRESS: u8 = 0x77;
/// First calibration register; 22 bytes follow (0xAA..=0xBF).
pub const REG_CALIBRATION: u8 = 0xAA;
pub const CALIBRATION_LEN: usize = 22;
/// Measurement control register.
pub const REG_CONTROL: u8 = 0xF4;
/// Conversion result, MSB first.
pub const REG_RESULT: u8 = 0xF6;
pub const CMD_READ_TEMPERATURE: u8 = 0x2E;
/// Pressure command with oss = 0.
pub const CMD_READ_PRESSURE: u8 = 0x34;
/// Worst-case conversion time at oss = 0 is 4.5 ms.
pub const CONVERSION_DELAY_MS: u32 = 5;

const OSS: u32 = 0;

/// Factory calibration coefficients, read once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub ac1: i16,
    pub ac2: i16,
    pub ac3: i16,
    pub ac4: u16,
    pub ac5: u16,
    pub ac6: u16,
    pub b1: i16,
    pub b2: i16,
    pub mb: i16,
    pub mc: i16,
    pub md: i16,
}

impl Calibration {
    /// Decode the 22-byte big-endian calibration block.
    ///
    /// A word of 0x0000 or 0xFFFF means the EEPROM read failed.
    pub fn from_bytes(raw: &[u8; CALIBRATION_LEN]) -> Result<Self, ConfigError> {
        let mut words = [0u16; 11];
        for (i, w) in words.iter_mut().enumerate() {
            *w = u16::from_be_bytes([raw[2 * i], raw[2 * i + 1]]);
            if *w == 0x0000 || *w == 0xFFFF {
                return Err(ConfigError::CalibrationUnavailable);
            }
        }
        let s = |i: usize| words[i] as i16;
        Ok(Self {
            ac1: s(0),
            ac2: s(1),
            ac3: s(2),
            ac4: words[3],
            ac5: words[4],
            ac6: words[5],
            b1: s(6),
            b2: s(7),
            mb: s(8),
            mc: s(9),
            md: s(10),
        })
    }

    /// Inverse of [`Calibration::from_bytes`].
    pub fn to_bytes(&self) -> [u8; CALIBRATION_LEN] {
        let words = [
            self.ac1 as u16,
            self.ac2 as u16,
            self.ac3 as u16,
            self.ac4,
            self.ac5,
            self.ac6,
            self.b1 as u16,
            self.b2 as u16,
            self.mb as u16,
            self.mc as u16,
            self.md as u16,
        ];
        let mut out = [0u8; CALIBRATION_LEN];
        for (chunk, w) in out.chunks_exact_mut(2).zip(words) {
            chunk.copy_from_slice(&w.to_be_bytes());
        }
        out
    }
}

/// Assemble the 19-bit uncompensated pressure from the MSB/LSB/XLSB bytes.
pub fn raw_pressure_from_bytes(bytes: [u8; 3]) -> u32 {
    let raw = (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2]);
    raw >> (8 - OSS)
}

/// Compensate raw readings into (°C, hPa).
///
/// A zero temperature divisor (`X1 + MD == 0`) takes `X2 = 0` and carries
/// on. `OutOfRange` is returned only when `B4` is not positive, `B7` is
/// negative, or the pressure intermediate overflows 32 bits.
pub fn decode_bmp180(
    cal: &Calibration,
    raw_temp: u16,
    raw_pressure: u32,
) -> Result<(f64, f64), DecodeError> {
    let ut = i64::from(raw_temp);
    let up = i64::from(raw_pressure);

    // Temperature
    let x1 = ((ut - i64::from(cal.ac6)) * i64::from(cal.ac5)) >> 15;
    let denom = x1 + i64::from(cal.md);
    let x2 = if denom == 0 {
        0
    } else {
        (i64::from(cal.mc) << 11) / denom
    };
    let b5 = x1 + x2;
    let t = (b5 + 8) >> 4;

    // Pressure
    let b6 = b5 - 4000;
    let x1 = (i64::from(cal.b2) * ((b6 * b6) >> 12)) >> 11;
    let x2 = (i64::from(cal.ac2) * b6) >> 11;
    let x3 = x1 + x2;
    let b3 = (((i64::from(cal.ac1) * 4 + x3) << OSS) + 2) / 4;

    let x1 = (i64::from(cal.ac3) * b6) >> 13;
    let x2 = (i64::from(cal.b1) * ((b6 * b6) >> 12)) >> 16;
    let x3 = ((x1 + x2) + 2) >> 2;
    let b4 = (i64::from(cal.ac4) * (x3 + 32768)) >> 15;
    let b7 = (up - b3) * (50_000 >> OSS);
    if b4 <= 0 || b7 < 0 {
        return Err(DecodeError::OutOfRange);
    }

    let mut p = if b7 < 0x8000_0000 {
        (b7 * 2) / b4
    } else {
        (b7 / b4) * 2
    };
    if p > i64::from(u32::MAX) {
        return Err(DecodeError::OutOfRange);
    }
    let x1 = (p >> 8) * (p >> 8);
    let x1 = (x1 * 3038) >> 16;
    let x2 = (-7357 * p) >> 16;
    p += (x1 + x2 + 3791) >> 4;

    Ok((t as f64 / 10.0, p as f64 / 100.0))
}

/// Barometric altitude in metres relative to the given sea-level pressure.
pub fn calculate_altitude(pressure_hpa: f64, sea_level_hpa: f64) -> f64 {
    44330.0 * (1.0 - (pressure_hpa / sea_level_hpa).powf(1.0 / 5.255))
}
