//! MQ135 electrochemical sensor model.
//!
//! The sensor forms a divider with a load resistor. From the divider
//! voltage we recover the sensing resistance Rs, normalise it by the
//! clean-air resistance R0 and map the ratio through a power-law curve
//! `ppm = a * (Rs/R0)^b` fitted per gas from the datasheet sensitivity plot.

use serde::{Deserialize, Serialize};

/// Power-law fit coefficients for one gas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasCurve {
    pub a: f64,
    pub b: f64,
}

impl GasCurve {
    pub const CO2: Self = Self {
        a: 116.602_068_2,
        b: -2.769_034_857,
    };
    pub const NH3: Self = Self { a: 102.2, b: -2.473 };
    pub const VOC: Self = Self { a: 110.47, b: -2.854 };
}

/// Sensing resistance in the same unit as `load_resistance`.
///
/// A non-positive voltage means the divider reads open circuit and yields
/// `+inf` rather than dividing by zero.
pub fn sensor_resistance(voltage: f64, vcc: f64, load_resistance: f64) -> f64 {
    if voltage <= 0.0 {
        return f64::INFINITY;
    }
    (vcc - voltage) / voltage * load_resistance
}

/// Gas concentration in ppm.
///
/// The ratio's absolute value is used so a supply-rail overshoot
/// (voltage above `vcc`) still produces a finite number.
pub fn gas_concentration_ppm(
    voltage: f64,
    vcc: f64,
    load_resistance: f64,
    r0: f64,
    curve: GasCurve,
) -> f64 {
    let rs = sensor_resistance(voltage, vcc, load_resistance);
    let ratio = if r0 <= 0.0 { f64::INFINITY } else { rs / r0 };
    curve.a * ratio.abs().powf(curve.b)
}
