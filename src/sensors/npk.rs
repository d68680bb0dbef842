//! NPK soil nutrient probe over Modbus-RTU.
//!
//! Three holding registers, queried one at a time under a single hold of
//! the serial line:
//!
//! | Nutrient   | Register |
//! |------------|----------|
//! | Nitrogen   | 0x001E   |
//! | Phosphorus | 0x001F   |
//! | Potassium  | 0x0020   |
//!
//! A failed query only invalidates its own nutrient; the other two are
//! still written.

use core::fmt;
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::adapters::delay::StdDelay;
use crate::app::ports::SerialPort;
use crate::channel::Channel;
use crate::codec::BreakpointTable;
use crate::codec::modbus::{RESPONSE_LEN, build_read_query, parse_read_response};
use crate::config::NpkConfig;
use crate::error::{Error, Result, TransportError};
use crate::snapshot::{Reading, SnapshotStore};

use super::{SensorReader, SharedSerial};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nutrient {
    Nitrogen,
    Phosphorus,
    Potassium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 3] = [Self::Nitrogen, Self::Phosphorus, Self::Potassium];

    pub const fn register(self) -> u16 {
        match self {
            Self::Nitrogen => 0x001E,
            Self::Phosphorus => 0x001F,
            Self::Potassium => 0x0020,
        }
    }

    pub const fn channel(self) -> Channel {
        match self {
            Self::Nitrogen => Channel::Nitrogen,
            Self::Phosphorus => Channel::Phosphorus,
            Self::Potassium => Channel::Potassium,
        }
    }

    /// Reverse lookup used by simulated probes.
    pub fn from_register(register: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.register() == register)
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.channel().label())
    }
}

/// Per-nutrient classification tables.
pub struct NutrientBands {
    pub nitrogen: BreakpointTable,
    pub phosphorus: BreakpointTable,
    pub potassium: BreakpointTable,
}

impl NutrientBands {
    fn get(&self, n: Nutrient) -> &BreakpointTable {
        match n {
            Nutrient::Nitrogen => &self.nitrogen,
            Nutrient::Phosphorus => &self.phosphorus,
            Nutrient::Potassium => &self.potassium,
        }
    }
}

pub struct NpkReader {
    port: SharedSerial,
    delay: StdDelay,
    settings: NpkConfig,
    bands: NutrientBands,
}

impl NpkReader {
    pub fn new(port: SharedSerial, settings: NpkConfig, bands: NutrientBands) -> Self {
        Self {
            port,
            delay: StdDelay,
            settings,
            bands,
        }
    }

    fn offset(&self, n: Nutrient) -> f64 {
        match n {
            Nutrient::Nitrogen => self.settings.nitrogen_offset,
            Nutrient::Phosphorus => self.settings.phosphorus_offset,
            Nutrient::Potassium => self.settings.potassium_offset,
        }
    }
}

/// One query/response exchange. The caller holds the serial line.
pub fn query_register(
    port: &mut dyn SerialPort,
    delay: &mut impl DelayNs,
    settings: &NpkConfig,
    register: u16,
) -> Result<u16> {
    port.discard_input()?;
    port.write_bytes(&build_read_query(settings.device_address, register))?;
    delay.delay_ms(settings.response_delay_ms as u32);

    let mut response = [0u8; RESPONSE_LEN];
    let got = port.read_bytes(
        &mut response,
        Duration::from_millis(settings.read_timeout_ms),
    )?;
    if got == 0 {
        return Err(TransportError::Timeout.into());
    }
    if got < RESPONSE_LEN {
        return Err(TransportError::ShortRead {
            expected: RESPONSE_LEN,
            got,
        }
        .into());
    }
    Ok(parse_read_response(
        &response,
        settings.verify_response_crc,
    )?)
}

impl SensorReader for NpkReader {
    fn name(&self) -> &'static str {
        "NPK"
    }

    fn channels(&self) -> &'static [Channel] {
        &[Channel::Nitrogen, Channel::Phosphorus, Channel::Potassium]
    }

    async fn poll(&mut self, store: &SnapshotStore) -> Result<()> {
        let settings = &self.settings;
        let delay = &mut self.delay;
        let results: [core::result::Result<u16, Error>; 3] = self
            .port
            .with_bus(|port| {
                let mut results = [Ok(0); 3];
                for (i, n) in Nutrient::ALL.into_iter().enumerate() {
                    if i > 0 {
                        delay.delay_ms(settings.inter_query_delay_ms as u32);
                    }
                    results[i] = query_register(&mut **port, delay, settings, n.register());
                }
                results
            })
            .await?;

        for (n, result) in Nutrient::ALL.into_iter().zip(results) {
            match result {
                Ok(raw) => {
                    let value = f64::from(raw) + self.offset(n);
                    debug!("NPK: {} = {} mg/kg", n, value);
                    store.write(
                        n.channel(),
                        Reading::Value(value),
                        Some(self.bands.get(n).classify(value)),
                    );
                }
                Err(e) => {
                    warn!("NPK: {} query failed: {}", n, e);
                    store.mark_unavailable(&[n.channel()]);
                }
            }
        }
        Ok(())
    }
}
