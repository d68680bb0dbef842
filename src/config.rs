//! Agent configuration parameters
//!
//! All tunable parameters for the telemetry agent: reader cadence,
//! calibration offsets, classification thresholds, gas model constants,
//! NPK serial settings, publish destinations and the field mapping.
//! Every section has field-level defaults, so a config file only needs to
//! name what it overrides.

use std::path::{Path, PathBuf};

use anyhow::Context;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::codec::GasCurve;
use crate::error::ConfigError;

/// ThingSpeak channels accept at most eight fields.
pub const MAX_MAPPED_FIELDS: usize = 8;

/// Core agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub timing: TimingConfig,
    pub calibration: CalibrationConfig,
    pub thresholds: ThresholdConfig,
    pub gas: GasConfig,
    pub npk: NpkConfig,
    pub hardware: HardwareConfig,
    pub thingspeak: ThingSpeakConfig,
    pub csv_log: CsvLogConfig,
    pub field_mapping: FieldMapping,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            calibration: CalibrationConfig::default(),
            thresholds: ThresholdConfig::default(),
            gas: GasConfig::default(),
            npk: NpkConfig::default(),
            hardware: HardwareConfig::default(),
            thingspeak: ThingSpeakConfig::default(),
            csv_log: CsvLogConfig::default(),
            field_mapping: default_field_mapping(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Timing
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Poll cadence of each reader
    pub readers: ReaderIntervals,
    /// Publish cadence (seconds)
    pub publish_interval_secs: u64,
    /// Delay before the first publish so readers populate the store
    pub publish_warmup_ms: u64,
    /// Upper bound on waiting for a shared bus (milliseconds)
    pub bus_lock_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            readers: ReaderIntervals::uniform(5_000),
            publish_interval_secs: 300, // 5 min
            publish_warmup_ms: 2_000,
            bus_lock_timeout_ms: 2_000,
        }
    }
}

/// Poll interval of each reader (milliseconds). Readers run on
/// independent schedules, so a slow probe never holds back a fast one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderIntervals {
    pub bmp180_ms: u64,
    pub dht22_ms: u64,
    pub ds18b20_ms: u64,
    pub soil_ms: u64,
    pub light_ms: u64,
    pub rain_ms: u64,
    pub mq135_ms: u64,
    pub npk_ms: u64,
}

impl ReaderIntervals {
    /// Every reader on the same cadence.
    pub const fn uniform(ms: u64) -> Self {
        Self {
            bmp180_ms: ms,
            dht22_ms: ms,
            ds18b20_ms: ms,
            soil_ms: ms,
            light_ms: ms,
            rain_ms: ms,
            mq135_ms: ms,
            npk_ms: ms,
        }
    }

    fn all(&self) -> [u64; 8] {
        [
            self.bmp180_ms,
            self.dht22_ms,
            self.ds18b20_ms,
            self.soil_ms,
            self.light_ms,
            self.rain_ms,
            self.mq135_ms,
            self.npk_ms,
        ]
    }
}

impl Default for ReaderIntervals {
    fn default() -> Self {
        Self::uniform(5_000)
    }
}

// ───────────────────────────────────────────────────────────────
// Calibration
// ───────────────────────────────────────────────────────────────

/// Additive corrections applied after decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub air_temp_offset_c: f64,
    pub humidity_offset_pct: f64,
    pub water_temp_offset_c: f64,
    /// Station-specific correction from raw BMP180 pressure to local reference
    pub air_pressure_offset_hpa: f64,
    /// Reference for the altitude estimate
    pub sea_level_pressure_hpa: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            air_temp_offset_c: -0.45,
            humidity_offset_pct: 0.0,
            water_temp_offset_c: 0.0,
            air_pressure_offset_hpa: 245.2,
            sea_level_pressure_hpa: 1013.25,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Thresholds
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub air_pressure: PressureThresholds,
    pub soil_moisture: SoilThresholds,
    pub light: LightThresholds,
    pub rain: RainThresholds,
    pub water_temperature: WaterTempThresholds,
    pub air_quality: AirQualityThresholds,
    pub nitrogen: NutrientThresholds,
    pub phosphorus: NutrientThresholds,
    pub potassium: NutrientThresholds,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            air_pressure: PressureThresholds::default(),
            soil_moisture: SoilThresholds::default(),
            light: LightThresholds::default(),
            rain: RainThresholds::default(),
            water_temperature: WaterTempThresholds::default(),
            air_quality: AirQualityThresholds::default(),
            nitrogen: NutrientThresholds::NITROGEN,
            phosphorus: NutrientThresholds::PHOSPHORUS,
            potassium: NutrientThresholds::POTASSIUM,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureThresholds {
    pub low_below: f64,
    pub high_above: f64,
}

impl Default for PressureThresholds {
    fn default() -> Self {
        Self {
            low_below: 1005.0,
            high_above: 1015.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoilThresholds {
    pub dry_above: f64,
    pub optimal_from: f64,
}

impl Default for SoilThresholds {
    fn default() -> Self {
        Self {
            dry_above: 23_000.0,
            optimal_from: 16_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightThresholds {
    pub very_dark_above: f64,
    pub low_light_above: f64,
    pub medium_light_above: f64,
}

impl Default for LightThresholds {
    fn default() -> Self {
        Self {
            very_dark_above: 22_000.0,
            low_light_above: 17_000.0,
            medium_light_above: 8_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RainThresholds {
    pub dry_above: f64,
    pub light_rain_above: f64,
    pub moderate_rain_above: f64,
}

impl Default for RainThresholds {
    fn default() -> Self {
        Self {
            dry_above: 25_000.0,
            light_rain_above: 18_000.0,
            moderate_rain_above: 14_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterTempThresholds {
    pub cool_below: f64,
    pub optimal_max: f64,
}

impl Default for WaterTempThresholds {
    fn default() -> Self {
        Self {
            cool_below: 20.0,
            optimal_max: 30.0,
        }
    }
}

/// Bands over the MQ135 raw ADC count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AirQualityThresholds {
    pub very_high_above: f64,
    pub high_above: f64,
    pub moderate_above: f64,
    pub low_above: f64,
}

impl Default for AirQualityThresholds {
    fn default() -> Self {
        Self {
            very_high_above: 25_000.0,
            high_above: 20_000.0,
            moderate_above: 15_000.0,
            low_above: 10_000.0,
        }
    }
}

/// mg/kg bands for one macronutrient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutrientThresholds {
    pub low_below: f64,
    pub optimal_max: f64,
}

impl NutrientThresholds {
    pub const NITROGEN: Self = Self {
        low_below: 60.0,
        optimal_max: 120.0,
    };
    pub const PHOSPHORUS: Self = Self {
        low_below: 25.0,
        optimal_max: 50.0,
    };
    pub const POTASSIUM: Self = Self {
        low_below: 50.0,
        optimal_max: 100.0,
    };
}

// ───────────────────────────────────────────────────────────────
// Gas model
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GasConfig {
    /// Divider supply voltage
    pub vcc: f64,
    /// Load resistor (kΩ)
    pub load_resistance_kohm: f64,
    /// Clean-air sensing resistance (kΩ)
    pub r0_kohm: f64,
    pub co2: GasCurve,
    pub nh3: GasCurve,
    pub voc: GasCurve,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            vcc: 5.0,
            load_resistance_kohm: 10.0,
            r0_kohm: 664.75,
            co2: GasCurve::CO2,
            nh3: GasCurve::NH3,
            voc: GasCurve::VOC,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// NPK probe
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NpkConfig {
    pub device_address: u8,
    /// Wait between sending a query and reading the answer
    pub response_delay_ms: u64,
    /// Gap between consecutive register queries
    pub inter_query_delay_ms: u64,
    /// Read timeout per response
    pub read_timeout_ms: u64,
    pub verify_response_crc: bool,
    pub nitrogen_offset: f64,
    pub phosphorus_offset: f64,
    pub potassium_offset: f64,
}

impl Default for NpkConfig {
    fn default() -> Self {
        Self {
            device_address: 0x01,
            response_delay_ms: 200,
            inter_query_delay_ms: 1_000,
            read_timeout_ms: 2_000,
            verify_response_crc: true,
            nitrogen_offset: 0.0,
            phosphorus_offset: 0.0,
            potassium_offset: 0.0,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Hardware wiring
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// I2C controller carrying the BMP180 and ADS1115
    pub i2c_device: PathBuf,
    pub bmp180_address: u8,
    pub ads1115_address: u8,
    /// ADS1115 single-ended inputs (0..=3)
    pub light_input: u8,
    pub gas_input: u8,
    pub rain_input: u8,
    pub soil_input: u8,
    /// Directory where the kernel exposes 1-Wire slaves
    pub one_wire_dir: PathBuf,
    /// IIO device of the kernel DHT driver
    pub dht_iio_dir: PathBuf,
    /// RS-485 adapter of the NPK probe, opened 8N1
    pub serial_device: PathBuf,
    pub serial_baud: u32,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            i2c_device: PathBuf::from("/dev/i2c-1"),
            bmp180_address: crate::codec::bmp180::I2C_ADDRESS,
            ads1115_address: 0x48,
            light_input: 0,
            gas_input: 1,
            rain_input: 2,
            soil_input: 3,
            one_wire_dir: PathBuf::from("/sys/bus/w1/devices"),
            dht_iio_dir: PathBuf::from("/sys/bus/iio/devices/iio:device0"),
            serial_device: PathBuf::from("/dev/ttyUSB0"),
            serial_baud: 4800,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Publish destinations
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThingSpeakConfig {
    pub enabled: bool,
    pub endpoint: String,
    /// Channel write key. An empty key disables the sink.
    pub api_key: String,
    pub timeout_ms: u64,
}

impl Default for ThingSpeakConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.thingspeak.com/update".into(),
            api_key: String::new(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvLogConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for CsvLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("sensor_log.csv"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Field mapping
// ───────────────────────────────────────────────────────────────

/// Binds one snapshot channel to a remote field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapEntry {
    pub channel: Channel,
    pub field: String,
}

/// Ordered channel → field bindings, at most [`MAX_MAPPED_FIELDS`].
pub type FieldMapping = heapless::Vec<FieldMapEntry, MAX_MAPPED_FIELDS>;

/// The deployed dashboard layout.
pub fn default_field_mapping() -> FieldMapping {
    let pairs = [
        (Channel::AirTemperature, "field1"),
        (Channel::Humidity, "field2"),
        (Channel::WaterTemperature, "field3"),
        (Channel::SoilMoisture, "field4"),
        (Channel::Light, "field5"),
        (Channel::Nitrogen, "field6"),
        (Channel::Phosphorus, "field7"),
        (Channel::Potassium, "field8"),
    ];
    let mut mapping = FieldMapping::new();
    for (channel, field) in pairs {
        let _ = mapping.push(FieldMapEntry {
            channel,
            field: field.into(),
        });
    }
    mapping
}

// ───────────────────────────────────────────────────────────────
// Loading and validation
// ───────────────────────────────────────────────────────────────

impl AgentConfig {
    /// Parse and validate a JSON document. Missing keys take defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`. No path, or a path that does not exist, yields the
    /// defaults; an unreadable or invalid file is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            warn!("Config: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Reject values that would make a reader or table nonsensical.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timing;
        if t.readers.all().contains(&0) {
            return Err(ConfigError::Invalid("reader interval must be > 0"));
        }
        if t.publish_interval_secs == 0 {
            return Err(ConfigError::Invalid("publish interval must be > 0"));
        }

        let th = &self.thresholds;
        if th.soil_moisture.dry_above < th.soil_moisture.optimal_from {
            return Err(ConfigError::Invalid("soil thresholds out of order"));
        }
        let l = &th.light;
        if !(l.very_dark_above >= l.low_light_above && l.low_light_above >= l.medium_light_above) {
            return Err(ConfigError::Invalid("light thresholds out of order"));
        }
        let r = &th.rain;
        if !(r.dry_above >= r.light_rain_above && r.light_rain_above >= r.moderate_rain_above) {
            return Err(ConfigError::Invalid("rain thresholds out of order"));
        }
        if th.air_pressure.low_below > th.air_pressure.high_above {
            return Err(ConfigError::Invalid("pressure thresholds out of order"));
        }
        if th.water_temperature.cool_below > th.water_temperature.optimal_max {
            return Err(ConfigError::Invalid("water temperature thresholds out of order"));
        }
        let a = &th.air_quality;
        if !(a.very_high_above >= a.high_above
            && a.high_above >= a.moderate_above
            && a.moderate_above >= a.low_above)
        {
            return Err(ConfigError::Invalid("air quality thresholds out of order"));
        }
        for n in [&th.nitrogen, &th.phosphorus, &th.potassium] {
            if n.low_below > n.optimal_max {
                return Err(ConfigError::Invalid("nutrient thresholds out of order"));
            }
        }

        let g = &self.gas;
        if g.vcc <= 0.0 || g.load_resistance_kohm <= 0.0 || g.r0_kohm <= 0.0 {
            return Err(ConfigError::Invalid("gas model constants must be positive"));
        }
        if self.calibration.sea_level_pressure_hpa <= 0.0 {
            return Err(ConfigError::Invalid("sea level pressure must be positive"));
        }

        let hw = &self.hardware;
        let inputs = [hw.light_input, hw.gas_input, hw.rain_input, hw.soil_input];
        if inputs.iter().any(|&i| i > 3) {
            return Err(ConfigError::Invalid("ADS1115 input must be 0..=3"));
        }
        for (i, a) in inputs.iter().enumerate() {
            if inputs[i + 1..].contains(a) {
                return Err(ConfigError::Invalid("ADS1115 inputs must be distinct"));
            }
        }

        for (i, entry) in self.field_mapping.iter().enumerate() {
            if entry.field.is_empty() {
                return Err(ConfigError::Invalid("empty remote field name"));
            }
            if self.field_mapping[i + 1..]
                .iter()
                .any(|e| e.field == entry.field)
            {
                return Err(ConfigError::Invalid("duplicate remote field name"));
            }
        }
        Ok(())
    }
}
