//! DHT22 through the Linux `dht11` IIO driver.
//!
//! With `dtoverlay=dht11,gpiopin=N` the kernel does the bit timing and
//! exposes the sensor under `/sys/bus/iio/devices/iio:deviceN`:
//!
//! ```text
//!   in_temp_input               milli-degrees Celsius
//!   in_humidityrelative_input   milli-percent
//! ```
//!
//! A failed handshake or checksum surfaces as `EIO`/`ETIMEDOUT` on read,
//! which is an ordinary missed reading for this sensor.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;

use crate::app::ports::HumidityTemperatureSensor;
use crate::error::TransportError;

const TEMP_FILE: &str = "in_temp_input";
const HUMIDITY_FILE: &str = "in_humidityrelative_input";

pub struct IioDht {
    dir: PathBuf,
}

impl IioDht {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_milli(path: &Path) -> Result<Option<f64>, TransportError> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(text.trim().parse::<i64>().ok().map(|m| m as f64 / 1000.0)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(TransportError::NotPresent),
            Err(e) => {
                debug!("DHT22: {} unreadable: {}", path.display(), e);
                Ok(None)
            }
        }
    }
}

impl HumidityTemperatureSensor for IioDht {
    fn read(&mut self) -> Result<Option<(f64, f64)>, TransportError> {
        let Some(celsius) = Self::read_milli(&self.dir.join(TEMP_FILE))? else {
            return Ok(None);
        };
        let Some(humidity) = Self::read_milli(&self.dir.join(HUMIDITY_FILE))? else {
            return Ok(None);
        };
        Ok(Some((celsius, humidity)))
    }
}
