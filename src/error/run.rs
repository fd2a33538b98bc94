use thiserror::Error;

use super::HttpError;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Error during request: {source}")]
    Transport {
        #[source]
        source: HttpError,
    },
    #[error("Got non-success status code: {status_code}")]
    FailFast { status_code: u16 },
    #[error("{count} response(s) had a non-success status code.")]
    FailingStatuses { count: u64 },
    #[error("{failed} of {total} suite test(s) failed.")]
    SuiteFailed { failed: usize, total: usize },
    #[error("All workers stopped before the run finished.")]
    WorkersGone,
}
