//! Task spawning and cooperative cancellation.
//!
//! Every reader and the publisher runs as its own named OS thread that
//! drives an async loop with `futures_lite::future::block_on`. Timers come
//! from `embassy-time`'s std driver, so the same `Timer`/`with_timeout`
//! code works on the host and in tests.
//!
//! Shutdown is cooperative: [`Shutdown::trigger`] flips every
//! [`CancelToken`] handed out so far. Tasks observe it at their next sleep
//! point, which is raced against the token's signal, so an idle task wakes
//! immediately instead of finishing its interval.

use core::time::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use futures_lite::future;
use log::info;

/// Default stack for reader and publisher threads.
pub const TASK_STACK_KB: usize = 64;

/// Longest single sleep handed to the timer queue.
const MAX_SLEEP: Duration = Duration::from_secs(365 * 24 * 3600);

pub(crate) fn to_embassy(d: Duration) -> embassy_time::Duration {
    let micros = d.min(MAX_SLEEP).as_micros();
    embassy_time::Duration::from_micros(u64::try_from(micros).unwrap_or(u64::MAX))
}

/// Spawn a named thread with an explicit stack size.
pub fn spawn_task(
    name: &str,
    stack_kb: usize,
    f: impl FnOnce() + Send + 'static,
) -> std::io::Result<JoinHandle<()>> {
    info!("Spawning '{}' (stack={}KB)", name, stack_kb);
    std::thread::Builder::new()
        .name(name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
}

struct TokenState {
    cancelled: AtomicBool,
    signal: Signal<CriticalSectionRawMutex, ()>,
}

/// One task's view of the shutdown request.
///
/// Each token has a single waiter, which is why tokens are minted per task
/// by [`Shutdown::token`] instead of being cloned.
pub struct CancelToken {
    state: Arc<TokenState>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Resolve once shutdown has been requested.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.state.signal.wait().await;
    }

    /// Sleep for `duration` unless cancelled first.
    ///
    /// Returns `true` when the sleep ended because of cancellation.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        future::or(
            async {
                self.cancelled().await;
                true
            },
            async {
                Timer::after(to_embassy(duration)).await;
                false
            },
        )
        .await
    }
}

/// Registry of every token handed out; triggers them together.
#[derive(Default)]
pub struct Shutdown {
    tokens: Vec<Arc<TokenState>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&mut self) -> CancelToken {
        let state = Arc::new(TokenState {
            cancelled: AtomicBool::new(false),
            signal: Signal::new(),
        });
        self.tokens.push(Arc::clone(&state));
        CancelToken { state }
    }

    /// Request every task to stop at its next suspension point.
    pub fn trigger(&self) {
        for t in &self.tokens {
            t.cancelled.store(true, Ordering::Release);
            t.signal.signal(());
        }
    }
}
