//! DHT22 air temperature and humidity reader.
//!
//! The DHT22 frequently misses a read; that is reported by the driver as
//! `Ok(None)` and simply leaves both channels unavailable until the next
//! cycle succeeds.

use log::debug;

use crate::app::ports::HumidityTemperatureSensor;
use crate::channel::Channel;
use crate::error::Result;
use crate::snapshot::{Reading, SnapshotStore};

use super::SensorReader;

pub struct Dht22Reader {
    sensor: Box<dyn HumidityTemperatureSensor + Send>,
    temp_offset_c: f64,
    humidity_offset_pct: f64,
}

impl Dht22Reader {
    pub fn new(
        sensor: Box<dyn HumidityTemperatureSensor + Send>,
        temp_offset_c: f64,
        humidity_offset_pct: f64,
    ) -> Self {
        Self {
            sensor,
            temp_offset_c,
            humidity_offset_pct,
        }
    }
}

impl SensorReader for Dht22Reader {
    fn name(&self) -> &'static str {
        "DHT22"
    }

    fn channels(&self) -> &'static [Channel] {
        &[Channel::AirTemperature, Channel::Humidity]
    }

    async fn poll(&mut self, store: &SnapshotStore) -> Result<()> {
        match self.sensor.read()? {
            Some((celsius, humidity)) => {
                let humidity = (humidity + self.humidity_offset_pct).clamp(0.0, 100.0);
                store.write_field(
                    Channel::AirTemperature,
                    Reading::Value(celsius + self.temp_offset_c),
                );
                store.write_field(Channel::Humidity, Reading::Value(humidity));
            }
            None => {
                debug!("DHT22: no reading this cycle");
                store.mark_unavailable(self.channels());
            }
        }
        Ok(())
    }
}
