//! Sensor readers and the loop that drives them.
//!
//! A reader owns one physical sensor, polls it on demand and writes the
//! decoded values into the [`SnapshotStore`]. [`run_reader`] is the only
//! place reader errors are absorbed: a failed cycle marks the reader's
//! channels unavailable, logs, and the loop carries on at its next tick.
//!
//! ```text
//!   loop {
//!       poll(store) ── Ok  ──▶ channels hold fresh values
//!                  └─ Err ──▶ channels marked unavailable, warn!
//!       sleep(interval) or cancel
//!   }
//! ```

pub mod ads1115;
pub mod analog;
pub mod bmp180;
pub mod dht22;
pub mod ds18b20;
pub mod mq135;
pub mod npk;

use core::time::Duration;
use std::sync::Arc;

use log::{error, info, warn};

use crate::app::ports::{I2cBus, SerialPort};
use crate::bus::BusArbiter;
use crate::channel::Channel;
use crate::error::Result;
use crate::snapshot::SnapshotStore;
use crate::task::CancelToken;

pub use analog::{AnalogProbeReader, ProbeKind};
pub use bmp180::Bmp180Reader;
pub use dht22::Dht22Reader;
pub use ds18b20::Ds18b20Reader;
pub use mq135::Mq135Reader;
pub use npk::NpkReader;

/// I2C bus shared by every register-mapped sensor.
pub type SharedI2c = Arc<BusArbiter<Box<dyn I2cBus + Send>>>;

/// Serial line owned by the NPK probe.
pub type SharedSerial = Arc<BusArbiter<Box<dyn SerialPort + Send>>>;

/// One physical sensor feeding a fixed set of channels.
#[allow(async_fn_in_trait)]
pub trait SensorReader: Send {
    fn name(&self) -> &'static str;

    /// Channels this reader is responsible for.
    fn channels(&self) -> &'static [Channel];

    /// One-time setup. A failure disables the reader for the process lifetime.
    async fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Take one measurement and write it into `store`.
    async fn poll(&mut self, store: &SnapshotStore) -> Result<()>;
}

/// Drive `reader` until `cancel` fires.
pub async fn run_reader<R: SensorReader>(
    mut reader: R,
    store: &SnapshotStore,
    interval: Duration,
    cancel: &CancelToken,
) {
    let name = reader.name();
    if let Err(e) = reader.init().await {
        error!("{}: init failed ({}), reader disabled", name, e);
        store.mark_unavailable(reader.channels());
        cancel.cancelled().await;
        return;
    }
    info!("{}: polling every {:?}", name, interval);

    while !cancel.is_cancelled() {
        if let Err(e) = reader.poll(store).await {
            warn!("{}: read failed: {}", name, e);
            store.mark_unavailable(reader.channels());
        }
        if cancel.sleep(interval).await {
            break;
        }
    }
    info!("{}: stopped", name);
}
