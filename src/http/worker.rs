use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{RunError, ValidationError};
use crate::metrics::ResponseTiming;
use crate::shutdown::ShutdownSender;

use super::executor::RequestExecutor;
use super::rate::FireSignal;

/// Results queue between the workers and the run controller. Producers
/// wait when it is full so no result is dropped.
pub const RESULT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug)]
pub enum WorkerMessage {
    Completed(ResponseTiming),
    Fatal(RunError),
}

/// Fixed set of workers issuing one request per fire signal.
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `concurrency` workers. Each exits on shutdown, when the
    /// signal stops, when the result channel closes, or after reporting a
    /// fatal error.
    ///
    /// # Errors
    ///
    /// Returns an error when `concurrency` is zero.
    pub fn spawn(
        concurrency: usize,
        executor: &Arc<RequestExecutor>,
        fire: &FireSignal,
        shutdown_tx: &ShutdownSender,
        result_tx: &mpsc::Sender<WorkerMessage>,
    ) -> Result<Self, ValidationError> {
        if concurrency == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }

        let mut handles = Vec::with_capacity(concurrency);
        for worker_id in 0..concurrency {
            let executor = Arc::clone(executor);
            let fire = fire.clone();
            let result_tx = result_tx.clone();
            let mut shutdown_rx = shutdown_tx.subscribe();

            handles.push(tokio::spawn(async move {
                loop {
                    let fired = tokio::select! {
                        biased;
                        _ = shutdown_rx.recv() => false,
                        fired = fire.fired() => fired,
                    };
                    if !fired {
                        break;
                    }

                    let (message, fatal) = match executor.execute().await {
                        Ok(timing) => (WorkerMessage::Completed(timing), false),
                        Err(err) => (WorkerMessage::Fatal(err), true),
                    };
                    if result_tx.send(message).await.is_err() || fatal {
                        break;
                    }
                }
                debug!("Worker {} stopped", worker_id);
            }));
        }

        Ok(Self { handles })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Abandons in-flight requests.
    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.abort();
    }
}
