use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::error::{AppResult, RunError, ValidationError};
use crate::http::{RESULT_CHANNEL_CAPACITY, RateScheduler, RequestExecutor, WorkerMessage, WorkerPool};
use crate::metrics::ResponseTimings;
use crate::shutdown::ShutdownSender;
use crate::shutdown_handlers::shutdown_channel;

/// Limits and flags for one run. A zero `max_requests` or `max_time`
/// means that limit is off; at least one must be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub concurrency: usize,
    pub max_requests: u64,
    pub max_time: Duration,
    pub ignore_failures: bool,
}

/// How a run that did not abort came to an end. Aborted runs surface as
/// errors from [`RunController::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Completed,
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub state: RunState,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub response_timings: ResponseTimings,
    pub ignore_failures: bool,
}

impl RunOutcome {
    /// 1 when any response failed and failures are not ignored, else 0.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if !self.ignore_failures && self.response_timings.failing_count() > 0 {
            1
        } else {
            0
        }
    }
}

/// Drives one run: starts the scheduler and workers, drains results until
/// a limit is hit, and stops everything.
pub struct RunController {
    executor: Arc<RequestExecutor>,
    scheduler: RateScheduler,
    settings: RunSettings,
}

impl RunController {
    /// # Errors
    ///
    /// Returns an error when neither limit is set or concurrency is zero.
    pub fn new(
        executor: RequestExecutor,
        scheduler: RateScheduler,
        settings: RunSettings,
    ) -> Result<Self, ValidationError> {
        if settings.max_requests == 0 && settings.max_time.is_zero() {
            return Err(ValidationError::MissingRunLimit);
        }
        if settings.concurrency == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }
        Ok(Self {
            executor: Arc::new(executor),
            scheduler,
            settings,
        })
    }

    #[must_use]
    pub const fn settings(&self) -> &RunSettings {
        &self.settings
    }

    #[must_use]
    pub fn target(&self) -> String {
        self.executor.template().target()
    }

    /// Runs until a limit is reached or `interrupt_tx` fires. An interrupt
    /// keeps every result already delivered and is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when a request fails in transport, when fail-fast
    /// sees a failing status, or when every worker stops unexpectedly.
    pub async fn run(&self, interrupt_tx: &ShutdownSender) -> AppResult<RunOutcome> {
        let mut interrupt_rx = interrupt_tx.subscribe();
        let (stop_tx, _) = shutdown_channel();
        let (result_tx, mut result_rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);

        info!(
            "Running {} every {:?} with {} worker(s)",
            self.target(),
            self.scheduler.interval(),
            self.settings.concurrency
        );
        let started_at = Utc::now();
        let start = Instant::now();
        let deadline = (!self.settings.max_time.is_zero())
            .then(|| start.checked_add(self.settings.max_time))
            .flatten();

        let (fire, ticker) = self.scheduler.start(&stop_tx);
        let pool = WorkerPool::spawn(
            self.settings.concurrency,
            &self.executor,
            &fire,
            &stop_tx,
            &result_tx,
        )?;
        drop(result_tx);

        let deadline_timer = sleep_until(deadline.unwrap_or(start));
        tokio::pin!(deadline_timer);

        let mut response_timings = ResponseTimings::new();
        let mut interrupted = false;
        let drained: Result<RunState, RunError> = loop {
            tokio::select! {
                biased;
                _ = interrupt_rx.recv(), if !interrupted => {
                    interrupted = true;
                    drop(stop_tx.send(()));
                    result_rx.close();
                    debug!("Interrupt received, draining buffered results");
                }
                message = result_rx.recv() => match message {
                    Some(WorkerMessage::Completed(entry)) => {
                        response_timings.push(entry);
                        if !interrupted && self.limit_reached(response_timings.len(), deadline) {
                            break Ok(RunState::Completed);
                        }
                    }
                    Some(WorkerMessage::Fatal(err)) => break Err(err),
                    None if interrupted => break Ok(RunState::Interrupted),
                    None => break Err(RunError::WorkersGone),
                },
                () = &mut deadline_timer, if deadline.is_some() && !interrupted => {
                    break Ok(RunState::Completed);
                }
            }
        };

        drop(stop_tx.send(()));
        pool.abort();
        ticker.abort();

        let state = drained?;
        let elapsed = start.elapsed();
        if state == RunState::Interrupted {
            warn!(
                "Run interrupted after {} response(s)",
                response_timings.len()
            );
        }
        Ok(RunOutcome {
            state,
            started_at,
            finished_at: Utc::now(),
            elapsed,
            response_timings,
            ignore_failures: self.settings.ignore_failures,
        })
    }

    fn limit_reached(&self, count: usize, deadline: Option<Instant>) -> bool {
        let max_requests = usize::try_from(self.settings.max_requests).unwrap_or(usize::MAX);
        let by_count = self.settings.max_requests > 0 && count >= max_requests;
        let by_time = deadline.is_some_and(|deadline| Instant::now() >= deadline);
        by_count || by_time
    }
}
