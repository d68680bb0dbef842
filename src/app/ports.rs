//! Port traits: the boundary between the agent and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ readers / publisher (domain)
//! ```
//!
//! Bus ports are driven by sensor readers through a
//! [`BusArbiter`](crate::bus::BusArbiter); sink ports are driven by the
//! [`Publisher`](crate::publisher::Publisher). Real hardware, the simulated
//! bench and test mocks all plug in here, so nothing above this layer
//! knows which one it is talking to.
//!
//! Every bus port method is a single blocking transaction. Callers hold the
//! bus lock for the whole multi-step exchange, never just one call.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{SinkError, TransportError};
use crate::snapshot::Snapshot;

// ───────────────────────────────────────────────────────────────
// I2C bus port
// ───────────────────────────────────────────────────────────────

/// Register-oriented I2C access shared by the BMP180 and ADS1115.
pub trait I2cBus {
    /// Read `buf.len()` bytes starting at `register`.
    fn read_block(&mut self, address: u8, register: u8, buf: &mut [u8])
    -> Result<(), TransportError>;

    /// Write one byte to `register`.
    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), TransportError>;

    /// Write several bytes starting at `register`.
    fn write_block(&mut self, address: u8, register: u8, data: &[u8])
    -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Serial port
// ───────────────────────────────────────────────────────────────

/// Half-duplex byte stream to the NPK probe.
pub trait SerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Fill `buf` or give up after `timeout`. Returns the bytes received.
    fn read_bytes(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, TransportError>;

    /// Drop anything still buffered from a previous exchange.
    fn discard_input(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Single-wire humidity sensor
// ───────────────────────────────────────────────────────────────

/// DHT22 driver. Timing-critical, so it owns its pin outright.
pub trait HumidityTemperatureSensor {
    /// `Ok(Some((celsius, percent)))` on success, `Ok(None)` when the
    /// sensor produced no reading this attempt.
    fn read(&mut self) -> Result<Option<(f64, f64)>, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// 1-Wire bus
// ───────────────────────────────────────────────────────────────

/// A discovered 1-Wire slave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneWireDevice {
    /// Bus id such as `28-0316a2791aff`.
    pub id: String,
    /// Where its reading is exposed.
    pub path: PathBuf,
}

/// Enumerates DS18B20 probes and reads their kernel text.
pub trait OneWireBus {
    /// First usable device in a stable order, if any.
    fn find_device(&mut self) -> Option<OneWireDevice>;

    /// Whether a previously found device is still attached.
    fn is_present(&self, device: &OneWireDevice) -> bool;

    fn read_text(&mut self, device: &OneWireDevice) -> Result<String, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Publish sinks
// ───────────────────────────────────────────────────────────────

/// Ordered remote field name → numeric value pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    fields: Vec<(String, f64)>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, value: f64) {
        self.fields.push((field.into(), value));
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|&(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.fields.iter().map(|(name, v)| (name.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Identifier the remote service assigned to an accepted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryId(pub u64);

/// Network destination that accepts a field payload.
pub trait RemoteSink {
    fn name(&self) -> &'static str;
    fn publish(&mut self, payload: &Payload) -> Result<EntryId, SinkError>;
}

/// Local destination that records the full snapshot.
pub trait LocalSink {
    fn name(&self) -> &'static str;
    fn record(&mut self, snapshot: &Snapshot) -> Result<(), SinkError>;
}

// ───────────────────────────────────────────────────────────────
// HTTP client port
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Minimal GET client used by remote sinks.
pub trait HttpClient {
    /// Issue `GET url?query` and return status plus body.
    fn get(&mut self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, SinkError>;
}
