//! Agent orchestration.
//!
//! [`Agent`] owns the snapshot store and every running task. Readers and
//! the publisher each get their own thread and cancel token; the store is
//! the only thing they share.
//!
//! ```text
//!   Hardware ──▶ BusArbiter(I2C) ──▶ BMP180 · Light · Soil · Rain · MQ135 ─┐
//!            ──▶ BusArbiter(UART) ─▶ NPK ───────────────────────────────────┤
//!            ──▶ DHT22 · DS18B20 ───────────────────────────────────────────┤
//!                                                                           ▼
//!                                                                    SnapshotStore
//!                                                                           │
//!                                           Publisher ◀─────────────────────┘
//!                                     (console · CSV · ThingSpeak)
//! ```

use core::time::Duration;
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{Context, anyhow};
use futures_lite::future::block_on;
use log::{error, info, warn};

use crate::adapters::csv_log::CsvLogSink;
use crate::adapters::http::UreqClient;
use crate::adapters::log_sink::LogSummarySink;
use crate::adapters::thingspeak::ThingSpeakSink;
use crate::bus::{BusArbiter, BusId};
use crate::codec::classify::{
    air_quality_table, light_table, nutrient_table, pressure_table, rain_table,
    soil_moisture_table, water_temperature_table,
};
use crate::config::AgentConfig;
use crate::publisher::{Publisher, run_publisher};
use crate::sensors::ads1115::AdcInput;
use crate::sensors::npk::NutrientBands;
use crate::sensors::{
    AnalogProbeReader, Bmp180Reader, Dht22Reader, Ds18b20Reader, Mq135Reader, NpkReader,
    ProbeKind, SensorReader, SharedI2c, SharedSerial, run_reader,
};
use crate::snapshot::SnapshotStore;
use crate::task::{Shutdown, TASK_STACK_KB, spawn_task};

use super::ports::{HumidityTemperatureSensor, I2cBus, OneWireBus, SerialPort};

/// Physical (or simulated) devices handed to [`Agent::start_readers`].
pub struct Hardware {
    pub i2c: Box<dyn I2cBus + Send>,
    /// `None` when the NPK probe's serial device could not be opened.
    pub serial: Option<Box<dyn SerialPort + Send>>,
    pub dht: Box<dyn HumidityTemperatureSensor + Send>,
    pub one_wire: Box<dyn OneWireBus + Send>,
}

// ───────────────────────────────────────────────────────────────
// Agent
// ───────────────────────────────────────────────────────────────

pub struct Agent {
    store: Arc<SnapshotStore>,
    shutdown: Shutdown,
    tasks: Vec<(String, JoinHandle<()>)>,
}

impl Default for Agent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent {
    pub fn new() -> Self {
        Self {
            store: Arc::new(SnapshotStore::new()),
            shutdown: Shutdown::new(),
            tasks: Vec::new(),
        }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Run `reader` on its own thread every `interval`.
    pub fn spawn_reader<R>(&mut self, reader: R, interval: Duration) -> anyhow::Result<()>
    where
        R: SensorReader + 'static,
    {
        let name = reader.name();
        let store = Arc::clone(&self.store);
        let cancel = self.shutdown.token();
        let handle = spawn_task(name, TASK_STACK_KB, move || {
            block_on(run_reader(reader, &store, interval, &cancel));
        })
        .with_context(|| format!("spawning reader {name}"))?;
        self.tasks.push((name.to_string(), handle));
        Ok(())
    }

    /// Build every reader from `config` and start them.
    pub fn start_readers(&mut self, config: &AgentConfig, hw: Hardware) -> anyhow::Result<()> {
        let every = &config.timing.readers;
        let lock_timeout = Duration::from_millis(config.timing.bus_lock_timeout_ms);
        let hwc = &config.hardware;
        let th = &config.thresholds;
        let cal = &config.calibration;

        let i2c: SharedI2c =
            Arc::new(BusArbiter::new(BusId::I2c, hw.i2c).with_lock_timeout(lock_timeout));

        let adc_input = |index: u8| {
            AdcInput::new(index).ok_or_else(|| anyhow!("ADS1115 input {index} out of range"))
        };

        self.spawn_reader(
            Bmp180Reader::new(
                Arc::clone(&i2c),
                hwc.bmp180_address,
                cal.air_pressure_offset_hpa,
                cal.sea_level_pressure_hpa,
                pressure_table(&th.air_pressure),
            ),
            Duration::from_millis(every.bmp180_ms),
        )?;
        self.spawn_reader(
            Dht22Reader::new(hw.dht, cal.air_temp_offset_c, cal.humidity_offset_pct),
            Duration::from_millis(every.dht22_ms),
        )?;
        self.spawn_reader(
            Ds18b20Reader::new(
                hw.one_wire,
                cal.water_temp_offset_c,
                water_temperature_table(&th.water_temperature),
            ),
            Duration::from_millis(every.ds18b20_ms),
        )?;

        let probes = [
            (
                ProbeKind::SoilMoisture,
                hwc.soil_input,
                soil_moisture_table(&th.soil_moisture),
                every.soil_ms,
            ),
            (ProbeKind::Light, hwc.light_input, light_table(&th.light), every.light_ms),
            (ProbeKind::Rain, hwc.rain_input, rain_table(&th.rain), every.rain_ms),
        ];
        for (kind, input, bands, ms) in probes {
            self.spawn_reader(
                AnalogProbeReader::new(
                    kind,
                    Arc::clone(&i2c),
                    hwc.ads1115_address,
                    adc_input(input)?,
                    bands,
                ),
                Duration::from_millis(ms),
            )?;
        }
        self.spawn_reader(
            Mq135Reader::new(
                Arc::clone(&i2c),
                hwc.ads1115_address,
                adc_input(hwc.gas_input)?,
                config.gas.clone(),
                air_quality_table(&th.air_quality),
            ),
            Duration::from_millis(every.mq135_ms),
        )?;

        match hw.serial {
            Some(port) => {
                let serial: SharedSerial =
                    Arc::new(BusArbiter::new(BusId::Serial, port).with_lock_timeout(lock_timeout));
                let bands = NutrientBands {
                    nitrogen: nutrient_table(&th.nitrogen),
                    phosphorus: nutrient_table(&th.phosphorus),
                    potassium: nutrient_table(&th.potassium),
                };
                self.spawn_reader(
                    NpkReader::new(serial, config.npk.clone(), bands),
                    Duration::from_millis(every.npk_ms),
                )?;
            }
            None => {
                warn!(
                    "NPK: no serial port ({}), nutrient channels stay unavailable",
                    hwc.serial_device.display()
                );
            }
        }

        info!("Agent: {} readers running", self.tasks.len());
        Ok(())
    }

    /// Start the periodic publisher.
    pub fn spawn_publisher(
        &mut self,
        publisher: Publisher,
        warmup: Duration,
        interval: Duration,
    ) -> anyhow::Result<()> {
        let store = Arc::clone(&self.store);
        let cancel = self.shutdown.token();
        let handle = spawn_task("Publisher", TASK_STACK_KB, move || {
            block_on(run_publisher(publisher, &store, warmup, interval, &cancel));
        })
        .context("spawning publisher")?;
        self.tasks.push(("Publisher".to_string(), handle));
        Ok(())
    }

    /// Block until every task has exited on its own.
    pub fn wait(self) {
        for (name, handle) in self.tasks {
            if handle.join().is_err() {
                error!("Agent: task {} panicked", name);
            }
        }
    }

    /// Cancel every task and wait for them to finish.
    pub fn shutdown(self) {
        info!("Agent: stopping {} tasks", self.tasks.len());
        self.shutdown.trigger();
        for (name, handle) in self.tasks {
            if handle.join().is_err() {
                error!("Agent: task {} panicked", name);
            }
        }
        info!("Agent: stopped");
    }
}

/// Publisher with the sinks `config` enables. The console summary is
/// always on.
pub fn build_publisher(config: &AgentConfig) -> Publisher {
    let mut publisher = Publisher::new(config.field_mapping.clone());
    publisher.add_local(Box::new(LogSummarySink::new()));

    if config.csv_log.enabled {
        publisher.add_local(Box::new(CsvLogSink::new(&config.csv_log.path)));
    }

    let ts = &config.thingspeak;
    if !ts.enabled {
        info!("ThingSpeak: disabled");
    } else if ts.api_key.is_empty() {
        warn!("ThingSpeak: no API key configured, remote publishing off");
    } else {
        let client = UreqClient::new(Duration::from_millis(ts.timeout_ms));
        publisher.add_remote(Box::new(ThingSpeakSink::new(
            client,
            ts.endpoint.clone(),
            ts.api_key.clone(),
        )));
    }
    publisher
}
