//! DS18B20 water/soil temperature reader.
//!
//! The probe is discovered lazily and rediscovered whenever it disappears,
//! so hot-plugging a replacement probe needs no restart.

use log::info;

use crate::app::ports::{OneWireBus, OneWireDevice};
use crate::channel::Channel;
use crate::codec::{BreakpointTable, parse_one_wire_text};
use crate::error::{Result, TransportError};
use crate::snapshot::{Reading, SnapshotStore};

use super::SensorReader;

pub struct Ds18b20Reader {
    bus: Box<dyn OneWireBus + Send>,
    device: Option<OneWireDevice>,
    offset_c: f64,
    bands: BreakpointTable,
}

impl Ds18b20Reader {
    pub fn new(bus: Box<dyn OneWireBus + Send>, offset_c: f64, bands: BreakpointTable) -> Self {
        Self {
            bus,
            device: None,
            offset_c,
            bands,
        }
    }

    fn resolve_device(&mut self) -> Result<OneWireDevice> {
        if let Some(dev) = &self.device {
            if self.bus.is_present(dev) {
                return Ok(dev.clone());
            }
            info!("DS18B20: {} disappeared, rescanning", dev.id);
            self.device = None;
        }
        let dev = self.bus.find_device().ok_or(TransportError::NotPresent)?;
        info!("DS18B20: using probe {}", dev.id);
        self.device = Some(dev.clone());
        Ok(dev)
    }
}

impl SensorReader for Ds18b20Reader {
    fn name(&self) -> &'static str {
        "DS18B20"
    }

    fn channels(&self) -> &'static [Channel] {
        &[Channel::WaterTemperature]
    }

    async fn poll(&mut self, store: &SnapshotStore) -> Result<()> {
        let device = self.resolve_device()?;
        let text = self.bus.read_text(&device)?;
        let celsius = parse_one_wire_text(&text)? + self.offset_c;
        store.write(
            Channel::WaterTemperature,
            Reading::Value(celsius),
            Some(self.bands.classify(celsius)),
        );
        Ok(())
    }
}
