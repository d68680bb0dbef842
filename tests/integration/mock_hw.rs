//! Mock devices and sinks for integration tests.
//!
//! Every mock keeps its state behind an `Arc<Mutex<_>>` and is `Clone`, so
//! a test can hand one copy to a reader or bus arbiter and keep another to
//! inspect what happened.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agrimon::app::ports::{
    EntryId, HumidityTemperatureSensor, I2cBus, LocalSink, OneWireBus, OneWireDevice, Payload,
    RemoteSink, SerialPort,
};
use agrimon::bus::{BusArbiter, BusId};
use agrimon::codec::bmp180::{CMD_READ_PRESSURE, CMD_READ_TEMPERATURE, REG_CALIBRATION, REG_CONTROL, REG_RESULT};
use agrimon::codec::Calibration;
use agrimon::error::{SinkError, TransportError};
use agrimon::sensors::ads1115::{REG_CONFIG, REG_CONVERSION};
use agrimon::sensors::{SharedI2c, SharedSerial};
use agrimon::snapshot::Snapshot;

// ── I2C register map ──────────────────────────────────────────

#[derive(Default)]
struct RegisterMap {
    regs: HashMap<(u8, u8), Vec<u8>>,
    /// (address, register, value) written → (register, contents) loaded.
    triggers: HashMap<(u8, u8, u8), (u8, Vec<u8>)>,
    writes: Vec<(u8, u8, Vec<u8>)>,
    fail: Option<TransportError>,
}

#[derive(Clone, Default)]
pub struct MockI2c {
    state: Arc<Mutex<RegisterMap>>,
}

impl MockI2c {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_register(self, address: u8, register: u8, bytes: &[u8]) -> Self {
        self.state
            .lock()
            .unwrap()
            .regs
            .insert((address, register), bytes.to_vec());
        self
    }

    /// Writing `value` to `register` loads `bytes` into `result_register`.
    pub fn on_command(
        self,
        address: u8,
        register: u8,
        value: u8,
        result_register: u8,
        bytes: &[u8],
    ) -> Self {
        self.state
            .lock()
            .unwrap()
            .triggers
            .insert((address, register, value), (result_register, bytes.to_vec()));
        self
    }

    pub fn fail_with(&self, err: Option<TransportError>) {
        self.state.lock().unwrap().fail = err;
    }

    pub fn writes(&self) -> Vec<(u8, u8, Vec<u8>)> {
        self.state.lock().unwrap().writes.clone()
    }
}

impl I2cBus for MockI2c {
    fn read_block(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), TransportError> {
        let s = self.state.lock().unwrap();
        if let Some(e) = s.fail {
            return Err(e);
        }
        let bytes = s.regs.get(&(address, register)).ok_or(TransportError::Nack)?;
        if bytes.len() < buf.len() {
            return Err(TransportError::ShortRead {
                expected: buf.len(),
                got: bytes.len(),
            });
        }
        buf.copy_from_slice(&bytes[..buf.len()]);
        Ok(())
    }

    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), TransportError> {
        self.write_block(address, register, &[value])
    }

    fn write_block(&mut self, address: u8, register: u8, data: &[u8]) -> Result<(), TransportError> {
        let mut s = self.state.lock().unwrap();
        if let Some(e) = s.fail {
            return Err(e);
        }
        s.writes.push((address, register, data.to_vec()));
        if let [value] = data {
            if let Some((reg, bytes)) = s.triggers.get(&(address, register, *value)).cloned() {
                s.regs.insert((address, reg), bytes);
            }
        }
        Ok(())
    }
}

/// Datasheet worked example: UT = 27898, UP = 23843 → 15.0 °C, 699.64 hPa.
pub const DATASHEET_CALIBRATION: Calibration = Calibration {
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

pub fn bmp180_datasheet(address: u8) -> MockI2c {
    MockI2c::new()
        .with_register(address, REG_CALIBRATION, &DATASHEET_CALIBRATION.to_bytes())
        .on_command(address, REG_CONTROL, CMD_READ_TEMPERATURE, REG_RESULT, &27898u16.to_be_bytes())
        .on_command(address, REG_CONTROL, CMD_READ_PRESSURE, REG_RESULT, &[0x5D, 0x23, 0x00])
}

/// An ADS1115 whose every conversion returns `raw`.
pub fn ads1115_fixed(address: u8, raw: i16) -> MockI2c {
    MockI2c::new()
        .with_register(address, REG_CONFIG, &[0x80, 0x00])
        .with_register(address, REG_CONVERSION, &raw.to_be_bytes())
}

pub fn shared_i2c(bus: MockI2c) -> SharedI2c {
    Arc::new(BusArbiter::new(BusId::I2c, Box::new(bus)))
}

// ── Serial ────────────────────────────────────────────────────

#[derive(Default)]
struct SerialScript {
    /// One entry per read; an empty entry reads nothing (timeout).
    responses: VecDeque<Vec<u8>>,
    writes: Vec<Vec<u8>>,
}

#[derive(Clone, Default)]
pub struct ScriptedSerial {
    state: Arc<Mutex<SerialScript>>,
}

impl ScriptedSerial {
    pub fn new(responses: impl IntoIterator<Item = Vec<u8>>) -> Self {
        let s = Self::default();
        s.state.lock().unwrap().responses = responses.into_iter().collect();
        s
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().writes.clone()
    }
}

impl SerialPort for ScriptedSerial {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.state.lock().unwrap().writes.push(data.to_vec());
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize, TransportError> {
        let next = self.state.lock().unwrap().responses.pop_front().unwrap_or_default();
        let n = next.len().min(buf.len());
        buf[..n].copy_from_slice(&next[..n]);
        Ok(n)
    }
}

pub fn shared_serial(port: ScriptedSerial) -> SharedSerial {
    Arc::new(BusArbiter::new(BusId::Serial, Box::new(port)))
}

// ── DHT22 ─────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockDht {
    script: Arc<Mutex<VecDeque<Result<Option<(f64, f64)>, TransportError>>>>,
}

impl MockDht {
    pub fn new(script: impl IntoIterator<Item = Result<Option<(f64, f64)>, TransportError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
        }
    }
}

impl HumidityTemperatureSensor for MockDht {
    fn read(&mut self) -> Result<Option<(f64, f64)>, TransportError> {
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }
}

// ── 1-Wire ────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockOneWire {
    devices: Arc<Mutex<Vec<(OneWireDevice, String)>>>,
}

pub fn probe(id: &str) -> OneWireDevice {
    OneWireDevice {
        id: id.to_string(),
        path: PathBuf::from("/mock/w1").join(id).join("w1_slave"),
    }
}

impl MockOneWire {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the attached probes.
    pub fn attach(&self, devices: &[(&str, &str)]) {
        *self.devices.lock().unwrap() = devices
            .iter()
            .map(|(id, text)| (probe(id), (*text).to_string()))
            .collect();
    }
}

impl OneWireBus for MockOneWire {
    fn find_device(&mut self) -> Option<OneWireDevice> {
        self.devices.lock().unwrap().first().map(|(d, _)| d.clone())
    }

    fn is_present(&self, device: &OneWireDevice) -> bool {
        self.devices.lock().unwrap().iter().any(|(d, _)| d == device)
    }

    fn read_text(&mut self, device: &OneWireDevice) -> Result<String, TransportError> {
        self.devices
            .lock()
            .unwrap()
            .iter()
            .find(|(d, _)| d == device)
            .map(|(_, t)| t.clone())
            .ok_or(TransportError::NotPresent)
    }
}

// ── Sinks ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RecordingRemote {
    pub seen: Arc<Mutex<Vec<Payload>>>,
    result: Result<EntryId, SinkError>,
}

impl RecordingRemote {
    pub fn accepting() -> Self {
        Self {
            seen: Arc::default(),
            result: Ok(EntryId(1)),
        }
    }

    pub fn failing(err: SinkError) -> Self {
        Self {
            seen: Arc::default(),
            result: Err(err),
        }
    }
}

impl RemoteSink for RecordingRemote {
    fn name(&self) -> &'static str {
        "recording-remote"
    }

    fn publish(&mut self, payload: &Payload) -> Result<EntryId, SinkError> {
        self.seen.lock().unwrap().push(payload.clone());
        self.result
    }
}

#[derive(Clone, Default)]
pub struct RecordingLocal {
    pub seen: Arc<Mutex<Vec<Snapshot>>>,
}

impl LocalSink for RecordingLocal {
    fn name(&self) -> &'static str {
        "recording-local"
    }

    fn record(&mut self, snapshot: &Snapshot) -> Result<(), SinkError> {
        self.seen.lock().unwrap().push(*snapshot);
        Ok(())
    }
}
