//! Per-bus mutual exclusion.
//!
//! Several readers share one physical I2C bus and the NPK probe owns the
//! serial line. A [`BusArbiter`] wraps the bus in an async mutex and hands
//! out exclusive access for one closure at a time, so a multi-step exchange
//! (command, wait, read) never interleaves with another reader's bytes.
//!
//! ```text
//!   bmp180 ─┐
//!   soil   ─┤                     ┌──────────────┐
//!   light  ─┼── with_bus(|bus| …) ▶│ Mutex<bus>   │── I2C
//!   rain   ─┤                     └──────────────┘
//!   mq135  ─┘
//! ```
//!
//! Lock acquisition is bounded: a waiter that cannot get the bus within the
//! arbiter's timeout gets [`TransportError::BusBusy`] and retries next cycle.

use core::fmt;
use core::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::with_timeout;
use log::warn;

use crate::error::TransportError;
use crate::task::to_embassy;

/// Default upper bound on waiting for the bus.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

/// Which physical bus an arbiter guards (for logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusId {
    I2c,
    Serial,
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I2c => f.write_str("i2c"),
            Self::Serial => f.write_str("serial"),
        }
    }
}

/// Serialises access to one bus.
pub struct BusArbiter<B> {
    id: BusId,
    lock_timeout: Duration,
    bus: Mutex<CriticalSectionRawMutex, B>,
}

impl<B> BusArbiter<B> {
    pub fn new(id: BusId, bus: B) -> Self {
        Self {
            id,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            bus: Mutex::new(bus),
        }
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn id(&self) -> BusId {
        self.id
    }

    /// Run `f` with exclusive access to the bus.
    ///
    /// The lock is released when `f` returns or panics. `f` is synchronous,
    /// so the whole exchange happens under one lock hold.
    pub async fn with_bus<R>(&self, f: impl FnOnce(&mut B) -> R) -> Result<R, TransportError> {
        let Ok(mut guard) = with_timeout(to_embassy(self.lock_timeout), self.bus.lock()).await
        else {
            warn!(
                "Bus: {} lock not acquired within {:?}",
                self.id, self.lock_timeout
            );
            return Err(TransportError::BusBusy);
        };
        Ok(f(&mut guard))
    }
}
