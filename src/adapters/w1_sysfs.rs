//! Linux w1-therm sysfs adapter.
//!
//! The kernel lists each 1-Wire slave as a directory under
//! `/sys/bus/w1/devices`. DS18B20 probes have family code `28`. Newer
//! kernels add a plain `temperature` file next to the classic `w1_slave`;
//! the plain file is preferred when present.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::app::ports::{OneWireBus, OneWireDevice};
use crate::error::TransportError;

const DS18B20_FAMILY: &str = "28-";

pub struct W1Sysfs {
    base_dir: PathBuf,
}

impl W1Sysfs {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn reading_file(dir: &Path) -> Option<PathBuf> {
        ["temperature", "w1_slave"]
            .into_iter()
            .map(|f| dir.join(f))
            .find(|p| p.is_file())
    }
}

impl OneWireBus for W1Sysfs {
    fn find_device(&mut self) -> Option<OneWireDevice> {
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(e) => e,
            Err(e) => {
                debug!("1-Wire: cannot list {}: {}", self.base_dir.display(), e);
                return None;
            }
        };
        let mut ids: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| name.starts_with(DS18B20_FAMILY))
            .collect();
        ids.sort();

        ids.into_iter().find_map(|id| {
            let path = Self::reading_file(&self.base_dir.join(&id))?;
            Some(OneWireDevice { id, path })
        })
    }

    fn is_present(&self, device: &OneWireDevice) -> bool {
        device.path.is_file()
    }

    fn read_text(&mut self, device: &OneWireDevice) -> Result<String, TransportError> {
        Ok(fs::read_to_string(&device.path)?)
    }
}
