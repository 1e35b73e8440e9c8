//! Suspension points.
//!
//! Every wait in the crate (status ticks, retry pauses, polling intervals,
//! deep sleep) goes through [`Sleep`], so tests can record durations
//! instead of waiting them out.

use std::time::Duration;

/// Something that can suspend the caller.
#[allow(async_fn_in_trait)]
pub trait Sleep {
    /// Suspend for `duration`.
    async fn sleep(&mut self, duration: Duration);

    /// Enter the lowest-power state for `duration`.
    ///
    /// On hardware this powers down the MCU and wakes via reset, so callers
    /// must not rely on anything after it. Hosts fall back to [`Sleep::sleep`].
    async fn deep_sleep(&mut self, duration: Duration) {
        self.sleep(duration).await;
    }
}

/// Tokio timer.
#[cfg(feature = "tokio")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleep;

#[cfg(feature = "tokio")]
impl Sleep for TokioSleep {
    async fn sleep(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Blocks the current thread. For single-threaded targets without a runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    async fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
