//! Blocking delay for use inside a held bus transaction.

use embedded_hal::delay::DelayNs;

/// Thread-sleep delay provider.
///
/// Used while a bus lock is held, where yielding to the async timer would
/// let the exchange stall with the bus still claimed.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}
