//! Whole-agent behaviour: threads, shared bus, publishing and shutdown.

use std::thread;
use std::time::{Duration, Instant};

use agrimon::adapters::sim;
use agrimon::app::service::{Agent, Hardware, build_publisher};
use agrimon::channel::Channel;
use agrimon::config::{AgentConfig, FieldMapEntry, FieldMapping, ReaderIntervals};
use agrimon::publisher::Publisher;
use agrimon::sensors::ads1115::{AdcInput, REG_CONFIG, config_word};
use agrimon::snapshot::Reading;

use crate::mock_hw::{
    MockDht, MockI2c, MockOneWire, RecordingLocal, RecordingRemote, ads1115_fixed,
};

fn fast_config() -> AgentConfig {
    let mut config = AgentConfig::default();
    config.timing.readers = ReaderIntervals::uniform(50);
    config.npk.response_delay_ms = 0;
    config.npk.inter_query_delay_ms = 0;
    config.csv_log.enabled = false;
    config.thingspeak.enabled = false;
    config
}

/// Poll `f` until it holds or `limit` passes.
fn eventually(limit: Duration, mut f: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < limit {
        if f() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    f()
}

#[test]
fn simulated_station_fills_every_bus_channel() {
    let config = fast_config();
    let mut agent = Agent::new();
    agent.start_readers(&config, sim::station(&config)).unwrap();
    assert_eq!(agent.task_count(), 8);

    // The DHT22 misses reads on purpose, so it is not part of the check.
    let bus_channels = [
        Channel::WaterTemperature,
        Channel::AirPressure,
        Channel::Altitude,
        Channel::SoilMoisture,
        Channel::Light,
        Channel::Rain,
        Channel::Co2,
        Channel::Nh3,
        Channel::Voc,
        Channel::Nitrogen,
        Channel::Phosphorus,
        Channel::Potassium,
    ];
    let store = agent.store().clone();
    let filled = eventually(Duration::from_secs(5), || {
        let snap = store.snapshot();
        bus_channels.iter().all(|&c| snap.reading(c).is_available())
    });
    agent.shutdown();
    assert!(filled, "snapshot: {:?}", store.snapshot());

    let snap = store.snapshot();
    for c in [Channel::AirPressure, Channel::SoilMoisture, Channel::Nitrogen] {
        assert!(snap.status(c).is_some(), "{c} has no status");
    }
    let hpa = snap.reading(Channel::AirPressure).value().unwrap();
    assert!((950.0..1070.0).contains(&hpa), "{hpa}");
}

#[test]
fn missing_serial_port_leaves_nutrients_unavailable() {
    let config = fast_config();
    let mut hw = sim::station(&config);
    hw.serial = None;
    let mut agent = Agent::new();
    agent.start_readers(&config, hw).unwrap();
    assert_eq!(agent.task_count(), 7);

    let store = agent.store().clone();
    assert!(eventually(Duration::from_secs(5), || {
        store.snapshot().reading(Channel::SoilMoisture).is_available()
    }));
    agent.shutdown();

    let snap = store.snapshot();
    for c in [Channel::Nitrogen, Channel::Phosphorus, Channel::Potassium] {
        assert_eq!(snap.reading(c), Reading::Unavailable);
    }
}

#[test]
fn dead_i2c_bus_does_not_stop_other_readers() {
    let config = fast_config();
    let one_wire = MockOneWire::new();
    one_wire.attach(&[("28-0316a2791aff", "24125")]);
    let hw = Hardware {
        i2c: Box::new(MockI2c::new()),
        serial: None,
        dht: Box::new(MockDht::new([Ok(Some((22.0, 55.0)))])),
        one_wire: Box::new(one_wire),
    };
    let mut agent = Agent::new();
    agent.start_readers(&config, hw).unwrap();

    let store = agent.store().clone();
    assert!(eventually(Duration::from_secs(5), || {
        store.snapshot().reading(Channel::WaterTemperature).is_available()
    }));
    agent.shutdown();

    let snap = store.snapshot();
    assert_eq!(snap.reading(Channel::WaterTemperature), Reading::Value(24.125));
    assert_eq!(snap.reading(Channel::AirPressure), Reading::Unavailable);
    assert_eq!(snap.reading(Channel::SoilMoisture), Reading::Unavailable);
    assert_eq!(snap.reading(Channel::Co2), Reading::Unavailable);
}

#[test]
fn readers_keep_their_own_cadence() {
    let mut config = fast_config();
    config.timing.readers = ReaderIntervals::uniform(60_000);
    config.timing.readers.soil_ms = 20;

    let bus = ads1115_fixed(config.hardware.ads1115_address, 17_000);
    let hw = Hardware {
        i2c: Box::new(bus.clone()),
        serial: None,
        dht: Box::new(MockDht::default()),
        one_wire: Box::new(MockOneWire::new()),
    };
    let mut agent = Agent::new();
    agent.start_readers(&config, hw).unwrap();

    let conversions = |index: u8| {
        let word = config_word(AdcInput::new(index).unwrap()).to_be_bytes().to_vec();
        bus.writes()
            .iter()
            .filter(|(_, reg, data)| *reg == REG_CONFIG && *data == word)
            .count()
    };
    let soil = config.hardware.soil_input;
    let light = config.hardware.light_input;
    let fast = eventually(Duration::from_secs(5), || {
        conversions(soil) >= 5 && conversions(light) >= 1
    });
    agent.shutdown();

    assert!(fast, "soil polled {} times", conversions(soil));
    assert_eq!(conversions(light), 1);
}

#[test]
fn shutdown_interrupts_long_intervals_promptly() {
    let mut config = fast_config();
    config.timing.readers = ReaderIntervals::uniform(60_000);
    let mut agent = Agent::new();
    agent.start_readers(&config, sim::station(&config)).unwrap();
    agent
        .spawn_publisher(
            Publisher::new(config.field_mapping.clone()),
            Duration::from_secs(60),
            Duration::from_secs(300),
        )
        .unwrap();
    thread::sleep(Duration::from_millis(200));

    let start = Instant::now();
    agent.shutdown();
    assert!(start.elapsed() < Duration::from_secs(2), "{:?}", start.elapsed());
}

#[test]
fn periodic_publisher_delivers_to_every_sink() {
    let config = fast_config();
    let local = RecordingLocal::default();
    let remote = RecordingRemote::accepting();
    let mut publisher = build_publisher(&config);
    publisher.add_local(Box::new(local.clone()));
    publisher.add_remote(Box::new(remote.clone()));

    let mut agent = Agent::new();
    agent.start_readers(&config, sim::station(&config)).unwrap();
    agent
        .spawn_publisher(publisher, Duration::from_millis(300), Duration::from_millis(100))
        .unwrap();

    let delivered = eventually(Duration::from_secs(5), || {
        remote.seen.lock().unwrap().len() >= 2
    });
    agent.shutdown();
    assert!(delivered);

    let snapshots = local.seen.lock().unwrap();
    assert!(snapshots.len() >= 2);
    assert!(snapshots.iter().all(|s| s.timestamp.is_some()));
    let payloads = remote.seen.lock().unwrap();
    let last = payloads.last().unwrap();
    assert!(last.get("field4").is_some(), "soil moisture missing from {last:?}");
    assert!(last.get("field6").is_some(), "nitrogen missing from {last:?}");
}

#[test]
fn gas_reading_reaches_the_payload_and_missing_channels_do_not() {
    let mut config = fast_config();
    config.gas.r0_kohm = 76.63;
    let mut mapping = FieldMapping::new();
    for (channel, field) in [(Channel::Co2, "field1"), (Channel::Nitrogen, "field2")] {
        mapping
            .push(FieldMapEntry {
                channel,
                field: field.into(),
            })
            .unwrap();
    }
    config.field_mapping = mapping;

    // 20000 counts is 2.5 V on every ADS1115 input.
    let hw = Hardware {
        i2c: Box::new(ads1115_fixed(config.hardware.ads1115_address, 20_000)),
        serial: None,
        dht: Box::new(MockDht::default()),
        one_wire: Box::new(MockOneWire::new()),
    };
    let mut agent = Agent::new();
    agent.start_readers(&config, hw).unwrap();
    let store = agent.store().clone();
    assert!(eventually(Duration::from_secs(5), || {
        store.snapshot().reading(Channel::Co2).is_available()
    }));
    agent.shutdown();

    let remote = RecordingRemote::accepting();
    let mut publisher = Publisher::new(config.field_mapping.clone());
    publisher.add_remote(Box::new(remote.clone()));
    let report = publisher.publish_cycle(&store);
    assert_eq!(report.fields, 1);

    let sent = remote.seen.lock().unwrap();
    let co2 = sent[0].get("field1").unwrap();
    assert!((co2 - 32782.15).abs() < 1e-2, "co2 = {co2}");
    assert_eq!(sent[0].get("field2"), None);
}

#[cfg(target_os = "linux")]
#[test]
fn field_station_without_devices_still_runs() {
    let mut config = fast_config();
    config.hardware.i2c_device = "/nonexistent/agrimon/i2c-1".into();
    config.hardware.serial_device = "/nonexistent/agrimon/ttyUSB0".into();
    config.hardware.dht_iio_dir = "/nonexistent/agrimon/iio:device0".into();

    let one_wire = std::env::temp_dir().join(format!("agrimon-it-w1-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&one_wire);
    std::fs::create_dir_all(one_wire.join("28-00000a1b2c3d")).unwrap();
    std::fs::write(one_wire.join("28-00000a1b2c3d/temperature"), "19750").unwrap();
    config.hardware.one_wire_dir = one_wire.clone();

    let mut agent = Agent::new();
    agent
        .start_readers(&config, agrimon::adapters::linux::station(&config))
        .unwrap();
    assert_eq!(agent.task_count(), 7);

    let store = agent.store().clone();
    let read = eventually(Duration::from_secs(5), || {
        store.snapshot().reading(Channel::WaterTemperature).is_available()
    });
    agent.shutdown();
    let _ = std::fs::remove_dir_all(&one_wire);

    assert!(read);
    let snap = store.snapshot();
    assert_eq!(snap.reading(Channel::WaterTemperature), Reading::Value(19.75));
    assert_eq!(snap.reading(Channel::AirPressure), Reading::Unavailable);
    assert_eq!(snap.reading(Channel::Humidity), Reading::Unavailable);
    assert_eq!(snap.reading(Channel::Nitrogen), Reading::Unavailable);
}
