use std::sync::Arc;

use tracing::debug;

use crate::error::RunError;
use crate::metrics::{PhaseTimer, ResponseTiming};

use super::template::RequestTemplate;
use super::transport::Transport;

/// Runs the shared template through a transport and times it.
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    template: Arc<RequestTemplate>,
    capture: bool,
    fail_fast: bool,
}

impl RequestExecutor {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, template: Arc<RequestTemplate>) -> Self {
        Self {
            transport,
            template,
            capture: false,
            fail_fast: false,
        }
    }

    /// Buffer headers and body of each response.
    #[must_use]
    pub const fn capture(mut self, capture: bool) -> Self {
        self.capture = capture;
        self
    }

    /// Treat a status outside `[100, 400)` as fatal.
    #[must_use]
    pub const fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    #[must_use]
    pub fn template(&self) -> &RequestTemplate {
        &self.template
    }

    /// Issues one request.
    ///
    /// # Errors
    ///
    /// Returns an error on any transport failure, or on a failing status
    /// when fail-fast is enabled.
    pub async fn execute(&self) -> Result<ResponseTiming, RunError> {
        let timer = Arc::new(PhaseTimer::new());
        let sent = self
            .transport
            .send(&self.template, self.capture, Arc::clone(&timer))
            .await;
        let timing = timer.finish();
        let response = sent.map_err(|source| RunError::Transport { source })?;
        debug!(
            "{} -> {} in {:?}",
            self.template.target(),
            response.status_code,
            timing.total()
        );

        if self.fail_fast && !response.is_success() {
            return Err(RunError::FailFast {
                status_code: response.status_code,
            });
        }
        Ok(ResponseTiming { response, timing })
    }
}
