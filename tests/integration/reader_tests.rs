//! Readers against mock devices: decoding, status labels and how each
//! failure mode shows up in the snapshot.

use futures_lite::future::block_on;

use agrimon::channel::{Channel, Status};
use agrimon::codec::classify::{
    air_quality_table, nutrient_table, pressure_table, rain_table, soil_moisture_table,
    water_temperature_table,
};
use agrimon::codec::modbus::build_read_response;
use agrimon::codec::build_read_query;
use agrimon::config::{AgentConfig, GasConfig, NpkConfig, ThresholdConfig};
use agrimon::error::{ConfigError, Error, TransportError};
use agrimon::sensors::ads1115::{AdcInput, REG_CONFIG, config_word};
use agrimon::sensors::npk::NutrientBands;
use agrimon::sensors::{
    AnalogProbeReader, Bmp180Reader, Dht22Reader, Ds18b20Reader, Mq135Reader, NpkReader,
    ProbeKind, SensorReader,
};
use agrimon::snapshot::{Reading, SnapshotStore};

use crate::mock_hw::{
    MockDht, MockI2c, MockOneWire, ScriptedSerial, ads1115_fixed, bmp180_datasheet, shared_i2c,
    shared_serial,
};

fn value(store: &SnapshotStore, channel: Channel) -> f64 {
    store
        .snapshot()
        .reading(channel)
        .value()
        .unwrap_or_else(|| panic!("{channel} unavailable"))
}

// ── BMP180 ────────────────────────────────────────────────────

#[test]
fn bmp180_reproduces_datasheet_example() {
    let thresholds = ThresholdConfig::default();
    let mut reader = Bmp180Reader::new(
        shared_i2c(bmp180_datasheet(0x77)),
        0x77,
        0.0,
        1013.25,
        pressure_table(&thresholds.air_pressure),
    );
    let store = SnapshotStore::new();
    block_on(reader.init()).unwrap();
    block_on(reader.poll(&store)).unwrap();

    let snap = store.snapshot();
    assert!((value(&store, Channel::AirPressure) - 699.64).abs() < 0.005);
    assert_eq!(snap.status(Channel::AirPressure), Some(Status::Unsettled));
    assert!((value(&store, Channel::Altitude) - 3016.66).abs() < 0.1);
}

#[test]
fn bmp180_station_offset_shifts_pressure_and_trend() {
    let thresholds = ThresholdConfig::default();
    let mut reader = Bmp180Reader::new(
        shared_i2c(bmp180_datasheet(0x77)),
        0x77,
        320.0,
        1013.25,
        pressure_table(&thresholds.air_pressure),
    );
    let store = SnapshotStore::new();
    block_on(reader.init()).unwrap();
    block_on(reader.poll(&store)).unwrap();

    assert!((value(&store, Channel::AirPressure) - 1019.64).abs() < 0.005);
    assert_eq!(store.snapshot().status(Channel::AirPressure), Some(Status::Stable));
}

#[test]
fn bmp180_blank_calibration_disables_reader() {
    let bus = MockI2c::new().with_register(0x77, 0xAA, &[0xFF; 22]);
    let mut reader = Bmp180Reader::new(
        shared_i2c(bus),
        0x77,
        0.0,
        1013.25,
        pressure_table(&ThresholdConfig::default().air_pressure),
    );
    assert_eq!(
        block_on(reader.init()),
        Err(Error::Config(ConfigError::CalibrationUnavailable))
    );
}

#[test]
fn bmp180_bus_fault_surfaces_as_transport_error() {
    let bus = bmp180_datasheet(0x77);
    let handle = bus.clone();
    let mut reader = Bmp180Reader::new(
        shared_i2c(bus),
        0x77,
        0.0,
        1013.25,
        pressure_table(&ThresholdConfig::default().air_pressure),
    );
    block_on(reader.init()).unwrap();
    handle.fail_with(Some(TransportError::Nack));
    assert_eq!(
        block_on(reader.poll(&SnapshotStore::new())),
        Err(Error::Transport(TransportError::Nack))
    );
}

// ── ADS1115 probes ────────────────────────────────────────────

#[test]
fn soil_probe_writes_raw_count_and_band() {
    let thresholds = ThresholdConfig::default();
    let input = AdcInput::new(3).unwrap();
    let bus = ads1115_fixed(0x48, 17_000);
    let handle = bus.clone();
    let mut reader = AnalogProbeReader::new(
        ProbeKind::SoilMoisture,
        shared_i2c(bus),
        0x48,
        input,
        soil_moisture_table(&thresholds.soil_moisture),
    );
    let store = SnapshotStore::new();
    block_on(reader.poll(&store)).unwrap();

    assert!((value(&store, Channel::SoilMoisture) - 17_000.0).abs() < f64::EPSILON);
    assert_eq!(store.snapshot().status(Channel::SoilMoisture), Some(Status::Optimal));
    assert_eq!(
        handle.writes()[0],
        (0x48, REG_CONFIG, config_word(input).to_be_bytes().to_vec())
    );
}

#[test]
fn mq135_gas_model_matches_reference_point() {
    // 20000 counts at ±4.096 V full scale is exactly 2.5 V.
    let gas = GasConfig {
        r0_kohm: 76.63,
        ..GasConfig::default()
    };
    let mut reader = Mq135Reader::new(
        shared_i2c(ads1115_fixed(0x48, 20_000)),
        0x48,
        AdcInput::new(1).unwrap(),
        gas,
        air_quality_table(&ThresholdConfig::default().air_quality),
    );
    let store = SnapshotStore::new();
    block_on(reader.poll(&store)).unwrap();

    let co2 = value(&store, Channel::Co2);
    assert!((co2 - 32782.15).abs() / 32782.15 < 1e-4, "co2 = {co2}");
    let nh3 = value(&store, Channel::Nh3);
    assert!((nh3 - 15724.22).abs() / 15724.22 < 1e-4, "nh3 = {nh3}");
    let voc = value(&store, Channel::Voc);
    assert!((voc - 36924.84).abs() / 36924.84 < 1e-4, "voc = {voc}");
    assert_eq!(
        store.snapshot().status(Channel::Co2),
        Some(Status::ModeratePollution)
    );
}

#[test]
fn missing_adc_marks_probe_unavailable_via_error() {
    let mut reader = AnalogProbeReader::new(
        ProbeKind::Rain,
        shared_i2c(MockI2c::new()),
        0x48,
        AdcInput::new(2).unwrap(),
        rain_table(&ThresholdConfig::default().rain),
    );
    assert!(block_on(reader.poll(&SnapshotStore::new())).is_err());
}

// ── NPK ───────────────────────────────────────────────────────

fn fast_npk() -> NpkConfig {
    NpkConfig {
        response_delay_ms: 0,
        inter_query_delay_ms: 0,
        ..NpkConfig::default()
    }
}

fn bands() -> NutrientBands {
    let t = AgentConfig::default().thresholds;
    NutrientBands {
        nitrogen: nutrient_table(&t.nitrogen),
        phosphorus: nutrient_table(&t.phosphorus),
        potassium: nutrient_table(&t.potassium),
    }
}

#[test]
fn npk_reads_all_three_nutrients() {
    let port = ScriptedSerial::new([
        build_read_response(0x01, 45).to_vec(),
        build_read_response(0x01, 40).to_vec(),
        build_read_response(0x01, 250).to_vec(),
    ]);
    let handle = port.clone();
    let mut reader = NpkReader::new(shared_serial(port), fast_npk(), bands());
    let store = SnapshotStore::new();
    block_on(reader.poll(&store)).unwrap();

    assert_eq!(
        handle.writes(),
        vec![
            build_read_query(0x01, 0x001E).to_vec(),
            build_read_query(0x01, 0x001F).to_vec(),
            build_read_query(0x01, 0x0020).to_vec(),
        ]
    );
    let snap = store.snapshot();
    assert_eq!(snap.reading(Channel::Nitrogen), Reading::Value(45.0));
    assert_eq!(snap.status(Channel::Nitrogen), Some(Status::Low));
    assert_eq!(snap.reading(Channel::Phosphorus), Reading::Value(40.0));
    assert_eq!(snap.status(Channel::Phosphorus), Some(Status::Optimal));
    assert_eq!(snap.reading(Channel::Potassium), Reading::Value(250.0));
    assert_eq!(snap.status(Channel::Potassium), Some(Status::High));
}

#[test]
fn npk_failure_only_invalidates_its_own_nutrient() {
    let mut corrupt = build_read_response(0x01, 99);
    corrupt[6] ^= 0xFF;
    let port = ScriptedSerial::new([
        build_read_response(0x01, 45).to_vec(),
        Vec::new(),
        corrupt.to_vec(),
    ]);
    let mut reader = NpkReader::new(shared_serial(port), fast_npk(), bands());

    let store = SnapshotStore::new();
    store.write(Channel::Phosphorus, Reading::Value(30.0), Some(Status::Optimal));
    store.write(Channel::Potassium, Reading::Value(80.0), Some(Status::Optimal));
    block_on(reader.poll(&store)).unwrap();

    let snap = store.snapshot();
    assert_eq!(snap.reading(Channel::Nitrogen), Reading::Value(45.0));
    assert_eq!(snap.reading(Channel::Phosphorus), Reading::Unavailable);
    assert_eq!(snap.status(Channel::Phosphorus), None);
    assert_eq!(snap.reading(Channel::Potassium), Reading::Unavailable);
}

#[test]
fn npk_short_response_is_reported() {
    let mut serial = ScriptedSerial::new([vec![0x01, 0x03, 0x02, 0x00]]);
    let err = agrimon::sensors::npk::query_register(
        &mut serial,
        &mut agrimon::adapters::delay::StdDelay,
        &fast_npk(),
        0x001E,
    )
    .unwrap_err();
    assert_eq!(
        err,
        Error::Transport(TransportError::ShortRead { expected: 7, got: 4 })
    );
}

#[test]
fn npk_crc_check_can_be_disabled() {
    let mut corrupt = build_read_response(0x01, 77);
    corrupt[5] ^= 0xFF;
    let settings = NpkConfig {
        verify_response_crc: false,
        ..fast_npk()
    };
    let mut serial = ScriptedSerial::new([corrupt.to_vec()]);
    let got = agrimon::sensors::npk::query_register(
        &mut serial,
        &mut agrimon::adapters::delay::StdDelay,
        &settings,
        0x001E,
    );
    assert_eq!(got, Ok(77));
}

// ── DHT22 ─────────────────────────────────────────────────────

#[test]
fn dht22_applies_offsets_and_clamps_humidity() {
    let mut reader = Dht22Reader::new(Box::new(MockDht::new([Ok(Some((21.0, 99.0)))])), -0.5, 2.0);
    let store = SnapshotStore::new();
    block_on(reader.poll(&store)).unwrap();
    assert_eq!(store.snapshot().reading(Channel::AirTemperature), Reading::Value(20.5));
    assert_eq!(store.snapshot().reading(Channel::Humidity), Reading::Value(100.0));
}

#[test]
fn dht22_missed_read_marks_both_channels_unavailable() {
    let mut reader = Dht22Reader::new(
        Box::new(MockDht::new([Ok(Some((21.0, 50.0))), Ok(None)])),
        0.0,
        0.0,
    );
    let store = SnapshotStore::new();
    block_on(reader.poll(&store)).unwrap();
    assert_eq!(store.snapshot().available_count(), 2);
    block_on(reader.poll(&store)).unwrap();
    assert_eq!(store.snapshot().available_count(), 0);
}

// ── DS18B20 ───────────────────────────────────────────────────

const PROBE_A: &str = "28-0316a2791aff";
const PROBE_B: &str = "28-0416b3802bee";

#[test]
fn ds18b20_rescans_when_probe_is_swapped() {
    let bus = MockOneWire::new();
    bus.attach(&[(PROBE_A, "aa 01 : crc=aa YES\naa 01 t=18500\n")]);
    let mut reader = Ds18b20Reader::new(
        Box::new(bus.clone()),
        0.0,
        water_temperature_table(&ThresholdConfig::default().water_temperature),
    );
    let store = SnapshotStore::new();

    block_on(reader.poll(&store)).unwrap();
    assert_eq!(store.snapshot().reading(Channel::WaterTemperature), Reading::Value(18.5));
    assert_eq!(store.snapshot().status(Channel::WaterTemperature), Some(Status::Cool));

    bus.attach(&[(PROBE_B, "31250")]);
    block_on(reader.poll(&store)).unwrap();
    assert_eq!(store.snapshot().reading(Channel::WaterTemperature), Reading::Value(31.25));
    assert_eq!(
        store.snapshot().status(Channel::WaterTemperature),
        Some(Status::HeatStress)
    );

    bus.attach(&[]);
    assert_eq!(
        block_on(reader.poll(&store)),
        Err(Error::Transport(TransportError::NotPresent))
    );
}

#[test]
fn ds18b20_bad_crc_is_a_decode_error() {
    let bus = MockOneWire::new();
    bus.attach(&[(PROBE_A, "aa 01 : crc=ab NO\naa 01 t=18500\n")]);
    let mut reader = Ds18b20Reader::new(
        Box::new(bus),
        0.0,
        water_temperature_table(&ThresholdConfig::default().water_temperature),
    );
    assert!(matches!(
        block_on(reader.poll(&SnapshotStore::new())),
        Err(Error::Decode(_))
    ));
}
