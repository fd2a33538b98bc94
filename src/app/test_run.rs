use std::sync::Arc;

use tracing::{error, info};

use crate::config::RunParams;
use crate::error::{AppError, AppResult, RunError};
use crate::http::{RateScheduler, RequestExecutor, RequestTemplate, Transport};
use crate::record::write_record;
use crate::shutdown::ShutdownSender;

use super::report::TestReport;
use super::runner::{RunController, RunSettings, RunState};

/// A validated test with its body loaded and its controller built, ready to
/// run.
pub struct PreparedTest {
    params: RunParams,
    controller: RunController,
}

/// What one run produced.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub state: RunState,
    pub report: TestReport,
    pub exit_code: i32,
}

impl PreparedTest {
    /// Validates `params`, reads the body file once and builds the request
    /// template, scheduler and controller.
    ///
    /// # Errors
    ///
    /// Returns an error when the parameters are invalid, the body file
    /// cannot be read, or the method, URL or a header is rejected.
    pub async fn prepare(params: RunParams, transport: Arc<dyn Transport>) -> AppResult<Self> {
        params.validate()?;
        let body = params.body_source().load().await?;

        let mut template = RequestTemplate::new(&params.method, &params.url, params.timeout)?;
        for (name, value) in &params.headers {
            template = template.with_header(name, value)?;
        }
        let template = template.with_body(body);

        let executor = RequestExecutor::new(transport, Arc::new(template))
            .capture(params.capture())
            .fail_fast(params.fail_fast);
        let scheduler = RateScheduler::from_rate(params.freq, params.delay)?;
        let settings = RunSettings {
            concurrency: params.concurrency,
            max_requests: params.max_requests,
            max_time: params.max_time,
            ignore_failures: params.ignore_failures,
        };
        let controller = RunController::new(executor, scheduler, settings)?;
        Ok(Self { params, controller })
    }

    #[must_use]
    pub const fn params(&self) -> &RunParams {
        &self.params
    }

    #[must_use]
    pub fn target(&self) -> String {
        self.controller.target()
    }

    /// Runs the test and writes the run record when an output file is set.
    ///
    /// # Errors
    ///
    /// Returns an error when the run aborts or the record cannot be written.
    pub async fn run(&self, interrupt_tx: &ShutdownSender) -> AppResult<TestResult> {
        let outcome = self.controller.run(interrupt_tx).await?;
        let state = outcome.state;
        let exit_code = outcome.exit_code();
        let report = TestReport::from_outcome(self.target(), self.params.concurrency, outcome);

        if let Some(path) = self.params.out_file.as_deref() {
            write_record(path, &report.to_record(), self.params.out_format).await?;
            info!("Run record written to {}", path.display());
        }
        Ok(TestResult {
            state,
            report,
            exit_code,
        })
    }

    /// Prints the report, and the request listing when interactive.
    pub fn print(&self, result: &TestResult) {
        print!("{}", result.report);
        if self.params.interactive {
            print!("\nRequests:\n{}", result.report.request_details());
        }
    }
}

/// Runs a single test from the command line and prints its report.
///
/// # Errors
///
/// Returns an error when the test cannot be prepared, the run aborts, or
/// any response failed while failures are not ignored.
pub async fn run_test(
    params: RunParams,
    transport: Arc<dyn Transport>,
    interrupt_tx: &ShutdownSender,
) -> AppResult<()> {
    let prepared = PreparedTest::prepare(params, transport).await?;
    let result = prepared.run(interrupt_tx).await?;
    prepared.print(&result);

    if result.exit_code != 0 {
        let count = result.report.response_timings.failing_count();
        error!("{} of {} response(s) failed", count, result.report.response_count);
        return Err(AppError::run(RunError::FailingStatuses { count }));
    }
    Ok(())
}
