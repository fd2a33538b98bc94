use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::error::ValidationError;
use crate::shutdown::ShutdownSender;

/// Emits one fire signal per interval, shared by every worker so the
/// aggregate rate does not scale with concurrency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateScheduler {
    interval: Duration,
}

impl RateScheduler {
    /// # Errors
    ///
    /// Returns an error when `interval` is zero.
    pub fn new(interval: Duration) -> Result<Self, ValidationError> {
        if interval.is_zero() {
            return Err(ValidationError::ZeroInterval);
        }
        Ok(Self { interval })
    }

    /// Builds a scheduler from a frequency (requests per second) or a delay.
    /// A non-zero frequency wins and becomes `1s / freq`.
    ///
    /// # Errors
    ///
    /// Returns an error when the resulting interval is zero.
    pub fn from_rate(freq: u32, delay: Duration) -> Result<Self, ValidationError> {
        if freq > 0 {
            return Self::new(Duration::from_secs(1).checked_div(freq).unwrap_or_default());
        }
        Self::new(delay)
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts ticking. The first signal fires one interval from now; at most
    /// one signal is ever pending, so slow workers skip ticks instead of
    /// bursting to catch up. The ticker stops on shutdown.
    #[must_use]
    pub fn start(&self, shutdown_tx: &ShutdownSender) -> (FireSignal, JoinHandle<()>) {
        let permits = Arc::new(Semaphore::new(0));
        let signal = FireSignal {
            permits: Arc::clone(&permits),
        };
        let mut shutdown_rx = shutdown_tx.subscribe();
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let start = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {
                        if permits.available_permits() < 1 {
                            permits.add_permits(1);
                        }
                    }
                }
            }
            permits.close();
        });

        (signal, handle)
    }
}

/// Receiving side of a [`RateScheduler`].
#[derive(Debug, Clone)]
pub struct FireSignal {
    permits: Arc<Semaphore>,
}

impl FireSignal {
    /// Signals fired but not yet taken by a worker.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.permits.available_permits()
    }

    /// Waits for the next signal. Returns `false` once the scheduler stopped.
    pub async fn fired(&self) -> bool {
        match self.permits.acquire().await {
            Ok(permit) => {
                permit.forget();
                true
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
impl FireSignal {
    /// A signal with `permits` fires already pending and no ticker.
    pub(crate) fn with_pending(permits: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(permits)),
        }
    }
}
