//! Measurement channels, their units and the qualitative status labels.
//!
//! A [`Channel`] is one named quantity in the snapshot. Channels are a closed
//! set, so the snapshot can store them in a fixed array indexed by
//! [`Channel::index`] instead of a map.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Physical unit attached to a channel's numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Celsius,
    Percent,
    Hectopascal,
    Metre,
    /// Raw 16-bit ADC counts.
    Counts,
    Ppm,
    MgPerKg,
}

impl Unit {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "\u{00b0}C",
            Self::Percent => "%",
            Self::Hectopascal => "hPa",
            Self::Metre => "m",
            Self::Counts => "counts",
            Self::Ppm => "ppm",
            Self::MgPerKg => "mg/kg",
        }
    }
}

/// A named measured quantity.
///
/// The serde name doubles as the snapshot key and the CSV column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "air_temp_c")]
    AirTemperature,
    #[serde(rename = "humidity_percent")]
    Humidity,
    #[serde(rename = "water_soil_temp_c")]
    WaterTemperature,
    #[serde(rename = "air_pressure_hpa")]
    AirPressure,
    #[serde(rename = "altitude_m")]
    Altitude,
    #[serde(rename = "soil_moisture_raw")]
    SoilMoisture,
    #[serde(rename = "light_level_raw")]
    Light,
    #[serde(rename = "rain_level_raw")]
    Rain,
    #[serde(rename = "co2_ppm")]
    Co2,
    #[serde(rename = "nh3_ppm")]
    Nh3,
    #[serde(rename = "voc_ppm")]
    Voc,
    #[serde(rename = "nitrogen_mg_kg")]
    Nitrogen,
    #[serde(rename = "phosphorus_mg_kg")]
    Phosphorus,
    #[serde(rename = "potassium_mg_kg")]
    Potassium,
}

impl Channel {
    pub const COUNT: usize = 14;

    /// Every channel, in snapshot order.
    pub const ALL: [Channel; Self::COUNT] = [
        Self::AirTemperature,
        Self::Humidity,
        Self::WaterTemperature,
        Self::AirPressure,
        Self::Altitude,
        Self::SoilMoisture,
        Self::Light,
        Self::Rain,
        Self::Co2,
        Self::Nh3,
        Self::Voc,
        Self::Nitrogen,
        Self::Phosphorus,
        Self::Potassium,
    ];

    /// Position of this channel in [`Channel::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Machine-readable key, also used as the CSV column name.
    pub const fn key(self) -> &'static str {
        match self {
            Self::AirTemperature => "air_temp_c",
            Self::Humidity => "humidity_percent",
            Self::WaterTemperature => "water_soil_temp_c",
            Self::AirPressure => "air_pressure_hpa",
            Self::Altitude => "altitude_m",
            Self::SoilMoisture => "soil_moisture_raw",
            Self::Light => "light_level_raw",
            Self::Rain => "rain_level_raw",
            Self::Co2 => "co2_ppm",
            Self::Nh3 => "nh3_ppm",
            Self::Voc => "voc_ppm",
            Self::Nitrogen => "nitrogen_mg_kg",
            Self::Phosphorus => "phosphorus_mg_kg",
            Self::Potassium => "potassium_mg_kg",
        }
    }

    /// Column name of the status label paired with this channel, if any.
    pub const fn status_key(self) -> Option<&'static str> {
        match self {
            Self::WaterTemperature => Some("water_soil_temp_status"),
            Self::AirPressure => Some("air_pressure_status"),
            Self::SoilMoisture => Some("soil_moisture_status"),
            Self::Light => Some("light_level_status"),
            Self::Rain => Some("rain_level_status"),
            Self::Co2 => Some("air_quality_status"),
            Self::Nitrogen => Some("nitrogen_status"),
            Self::Phosphorus => Some("phosphorus_status"),
            Self::Potassium => Some("potassium_status"),
            _ => None,
        }
    }

    /// Human-readable label for console output.
    pub const fn label(self) -> &'static str {
        match self {
            Self::AirTemperature => "Air Temperature",
            Self::Humidity => "Humidity",
            Self::WaterTemperature => "Water/Soil Temperature",
            Self::AirPressure => "Air Pressure",
            Self::Altitude => "Altitude",
            Self::SoilMoisture => "Soil Moisture",
            Self::Light => "Light Level",
            Self::Rain => "Rain Level",
            Self::Co2 => "CO2",
            Self::Nh3 => "NH3",
            Self::Voc => "VOC",
            Self::Nitrogen => "Nitrogen",
            Self::Phosphorus => "Phosphorus",
            Self::Potassium => "Potassium",
        }
    }

    pub const fn unit(self) -> Unit {
        match self {
            Self::AirTemperature | Self::WaterTemperature => Unit::Celsius,
            Self::Humidity => Unit::Percent,
            Self::AirPressure => Unit::Hectopascal,
            Self::Altitude => Unit::Metre,
            Self::SoilMoisture | Self::Light | Self::Rain => Unit::Counts,
            Self::Co2 | Self::Nh3 | Self::Voc => Unit::Ppm,
            Self::Nitrogen | Self::Phosphorus | Self::Potassium => Unit::MgPerKg,
        }
    }

    /// Decimal places used when rendering a value as text.
    pub const fn precision(self) -> usize {
        match self.unit() {
            Unit::Counts | Unit::MgPerKg => 0,
            _ => 2,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Qualitative label derived from a channel value by a breakpoint table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    // Soil moisture
    Dry,
    Optimal,
    Wet,
    // Light
    VeryDark,
    LowLight,
    MediumLight,
    BrightLight,
    // Rain (the dry end reuses `Dry`)
    LightRain,
    ModerateRain,
    HeavyRain,
    // Barometric trend
    Unsettled,
    Normal,
    Stable,
    // Nutrients (`Optimal` shared with soil)
    Low,
    High,
    // Water temperature
    Cool,
    HeatStress,
    // Air quality
    CleanAir,
    LowPollution,
    ModeratePollution,
    HighPollution,
    VeryHighPollution,
}

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dry => "Dry",
            Self::Optimal => "Optimal",
            Self::Wet => "Wet",
            Self::VeryDark => "Very Dark",
            Self::LowLight => "Low Light",
            Self::MediumLight => "Medium Light",
            Self::BrightLight => "Bright Light",
            Self::LightRain => "Light Rain",
            Self::ModerateRain => "Moderate Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Unsettled => "Low (Unsettled)",
            Self::Normal => "Normal",
            Self::Stable => "High (Stable)",
            Self::Low => "Low",
            Self::High => "High",
            Self::Cool => "Cool",
            Self::HeatStress => "Heat Stress",
            Self::CleanAir => "Clean Air",
            Self::LowPollution => "Low Pollution",
            Self::ModeratePollution => "Moderate Pollution",
            Self::HighPollution => "High Pollution",
            Self::VeryHighPollution => "Very High Pollution",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
