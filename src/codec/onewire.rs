//! DS18B20 kernel text formats.
//!
//! The w1-therm driver exposes a reading in one of two shapes:
//!
//! ```text
//! temperature:  24312
//! w1_slave:     72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
//!               72 01 4b 46 7f ff 0e 10 57 t=24312
//! ```
//!
//! Both carry millidegrees Celsius. The format is detected from the content.

use crate::error::DecodeError;

/// DS18B20 measurement range.
pub const MIN_CELSIUS: f64 = -55.0;
pub const MAX_CELSIUS: f64 = 125.0;

/// Parse either kernel format into degrees Celsius.
pub fn parse_one_wire_text(raw: &str) -> Result<f64, DecodeError> {
    let mut lines = raw.lines().map(str::trim).filter(|l| !l.is_empty());
    let first = lines.next().ok_or(DecodeError::MalformedPayload)?;

    let millis = match lines.next() {
        None => parse_millis(first)?,
        Some(second) => {
            if !first.ends_with("YES") {
                return Err(DecodeError::CrcInvalid);
            }
            let (_, value) = second
                .rsplit_once("t=")
                .ok_or(DecodeError::MalformedPayload)?;
            parse_millis(value)?
        }
    };

    let celsius = millis / 1000.0;
    if !(MIN_CELSIUS..=MAX_CELSIUS).contains(&celsius) {
        return Err(DecodeError::OutOfRange);
    }
    Ok(celsius)
}

fn parse_millis(text: &str) -> Result<f64, DecodeError> {
    let v: f64 = text
        .trim()
        .parse()
        .map_err(|_| DecodeError::MalformedPayload)?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(DecodeError::MalformedPayload)
    }
}
