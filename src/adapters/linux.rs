//! Field-station wiring on a Linux single-board computer.
//!
//! | Port                        | Device                                     |
//! |-----------------------------|--------------------------------------------|
//! | `I2cBus`                    | `/dev/i2c-N` through `linux-embedded-hal`  |
//! | `SerialPort`                | USB-RS485 adapter through `serialport`     |
//! | `HumidityTemperatureSensor` | kernel `dht11` IIO driver                  |
//! | `OneWireBus`                | kernel `w1-therm` sysfs                    |
//!
//! A device that cannot be opened leaves only its own readers unavailable;
//! the rest of the station keeps reporting.

use linux_embedded_hal::I2cdev;
use log::{info, warn};

use crate::app::ports::{I2cBus, SerialPort};
use crate::app::service::Hardware;
use crate::config::AgentConfig;
use crate::error::TransportError;

use super::hal_i2c::HalI2c;
use super::iio_dht::IioDht;
use super::serial::SerialLine;
use super::w1_sysfs::W1Sysfs;

/// Stand-in for an I2C controller that failed to open.
pub struct MissingI2c;

impl I2cBus for MissingI2c {
    fn read_block(&mut self, _: u8, _: u8, _: &mut [u8]) -> Result<(), TransportError> {
        Err(TransportError::NotPresent)
    }

    fn write_byte(&mut self, _: u8, _: u8, _: u8) -> Result<(), TransportError> {
        Err(TransportError::NotPresent)
    }

    fn write_block(&mut self, _: u8, _: u8, _: &[u8]) -> Result<(), TransportError> {
        Err(TransportError::NotPresent)
    }
}

/// Open every device named in `config.hardware`.
pub fn station(config: &AgentConfig) -> Hardware {
    let hw = &config.hardware;

    let i2c: Box<dyn I2cBus + Send> = match I2cdev::new(&hw.i2c_device) {
        Ok(dev) => {
            info!("I2C: {} open", hw.i2c_device.display());
            Box::new(HalI2c::new(dev))
        }
        Err(e) => {
            warn!("I2C: cannot open {}: {}", hw.i2c_device.display(), e);
            Box::new(MissingI2c)
        }
    };

    let serial: Option<Box<dyn SerialPort + Send>> =
        match SerialLine::open(&hw.serial_device, hw.serial_baud) {
            Ok(line) => {
                info!(
                    "Serial: {} open at {} baud",
                    hw.serial_device.display(),
                    hw.serial_baud
                );
                Some(Box::new(line))
            }
            Err(e) => {
                warn!("Serial: cannot open {}: {}", hw.serial_device.display(), e);
                None
            }
        };

    Hardware {
        i2c,
        serial,
        dht: Box::new(IioDht::new(&hw.dht_iio_dir)),
        one_wire: Box::new(W1Sysfs::new(&hw.one_wire_dir)),
    }
}
