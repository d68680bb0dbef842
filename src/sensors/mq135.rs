//! MQ135 gas reader on an ADS1115 input.
//!
//! One conversion yields CO2, NH3 and VOC estimates from the same divider
//! voltage. The air quality label is derived from the raw count and is
//! stored alongside CO2.

use log::debug;

use crate::adapters::delay::StdDelay;
use crate::channel::Channel;
use crate::codec::{BreakpointTable, gas_concentration_ppm};
use crate::config::GasConfig;
use crate::error::Result;
use crate::snapshot::{Reading, SnapshotStore};

use super::ads1115::{AdcInput, read_single_ended};
use super::{SensorReader, SharedI2c};

pub struct Mq135Reader {
    bus: SharedI2c,
    delay: StdDelay,
    address: u8,
    input: AdcInput,
    model: GasConfig,
    air_quality: BreakpointTable,
}

impl Mq135Reader {
    pub fn new(
        bus: SharedI2c,
        address: u8,
        input: AdcInput,
        model: GasConfig,
        air_quality: BreakpointTable,
    ) -> Self {
        Self {
            bus,
            delay: StdDelay,
            address,
            input,
            model,
            air_quality,
        }
    }
}

impl SensorReader for Mq135Reader {
    fn name(&self) -> &'static str {
        "MQ135"
    }

    fn channels(&self) -> &'static [Channel] {
        &[Channel::Co2, Channel::Nh3, Channel::Voc]
    }

    async fn poll(&mut self, store: &SnapshotStore) -> Result<()> {
        let (address, input) = (self.address, self.input);
        let delay = &mut self.delay;
        let sample = self
            .bus
            .with_bus(|bus| read_single_ended(&mut **bus, delay, address, input))
            .await??;

        let m = &self.model;
        let ppm = |curve| {
            gas_concentration_ppm(sample.volts, m.vcc, m.load_resistance_kohm, m.r0_kohm, curve)
        };
        let (co2, nh3, voc) = (ppm(m.co2), ppm(m.nh3), ppm(m.voc));
        debug!(
            "MQ135: raw={} {:.3}V co2={:.1} nh3={:.1} voc={:.1}",
            sample.raw, sample.volts, co2, nh3, voc
        );

        let label = self.air_quality.classify(f64::from(sample.raw));
        store.write(Channel::Co2, Reading::Value(co2), Some(label));
        store.write(Channel::Nh3, Reading::Value(nh3), None);
        store.write(Channel::Voc, Reading::Value(voc), None);
        Ok(())
    }
}
