//! Resistive probes on the ADS1115: soil moisture, light and rain.
//!
//! All three report the raw 16-bit count and classify it with their own
//! breakpoint table, so one reader type serves them all.

use log::debug;

use crate::adapters::delay::StdDelay;
use crate::channel::Channel;
use crate::codec::BreakpointTable;
use crate::error::Result;
use crate::snapshot::{Reading, SnapshotStore};

use super::ads1115::{AdcInput, read_single_ended};
use super::{SensorReader, SharedI2c};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    SoilMoisture,
    Light,
    Rain,
}

impl ProbeKind {
    pub const fn channel(self) -> Channel {
        match self {
            Self::SoilMoisture => Channel::SoilMoisture,
            Self::Light => Channel::Light,
            Self::Rain => Channel::Rain,
        }
    }

    const fn channels(self) -> &'static [Channel] {
        match self {
            Self::SoilMoisture => &[Channel::SoilMoisture],
            Self::Light => &[Channel::Light],
            Self::Rain => &[Channel::Rain],
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::SoilMoisture => "Soil",
            Self::Light => "Light",
            Self::Rain => "Rain",
        }
    }
}

pub struct AnalogProbeReader {
    kind: ProbeKind,
    bus: SharedI2c,
    delay: StdDelay,
    address: u8,
    input: AdcInput,
    bands: BreakpointTable,
}

impl AnalogProbeReader {
    pub fn new(
        kind: ProbeKind,
        bus: SharedI2c,
        address: u8,
        input: AdcInput,
        bands: BreakpointTable,
    ) -> Self {
        Self {
            kind,
            bus,
            delay: StdDelay,
            address,
            input,
            bands,
        }
    }
}

impl SensorReader for AnalogProbeReader {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn channels(&self) -> &'static [Channel] {
        self.kind.channels()
    }

    async fn poll(&mut self, store: &SnapshotStore) -> Result<()> {
        let (address, input) = (self.address, self.input);
        let delay = &mut self.delay;
        let sample = self
            .bus
            .with_bus(|bus| read_single_ended(&mut **bus, delay, address, input))
            .await??;

        debug!("{}: raw={} {:.3}V", self.kind.name(), sample.raw, sample.volts);
        let raw = f64::from(sample.raw);
        store.write(
            self.kind.channel(),
            Reading::Value(raw),
            Some(self.bands.classify(raw)),
        );
        Ok(())
    }
}
