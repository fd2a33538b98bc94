use std::sync::Arc;

use tracing::{error, info, warn};

use crate::args::SuiteArgs;
use crate::assertions::Assertion;
use crate::config::{SuiteFile, load_suite_file};
use crate::error::{AppError, AppResult, ConfigError, RunError};
use crate::http::Transport;
use crate::shutdown::ShutdownSender;

use super::runner::RunState;
use super::test_run::PreparedTest;

/// A suite entry ready to run: its test and the AND of its assertions.
pub struct SuiteEntry {
    pub test: PreparedTest,
    pub assertion: Assertion,
}

/// Builds every entry before anything runs, so a broken entry late in the
/// file stops the suite before the first request.
///
/// # Errors
///
/// Returns an error naming the first entry whose parameters, assertions or
/// body file are invalid, or when the suite has no tests.
pub async fn prepare_suite(
    suite: &SuiteFile,
    transport: &Arc<dyn Transport>,
) -> AppResult<Vec<SuiteEntry>> {
    if suite.tests.is_empty() {
        return Err(AppError::config(ConfigError::EmptySuite));
    }
    let mut entries = Vec::with_capacity(suite.tests.len());
    for (index, test) in suite.tests.iter().enumerate() {
        let params = test
            .to_params()
            .map_err(|source| AppError::config(ConfigError::InvalidTest { index, source }))?;
        let assertions = Assertion::from_list(&test.assertions)
            .map_err(|source| AppError::config(ConfigError::InvalidAssertion { index, source }))?;
        let test = PreparedTest::prepare(params, Arc::clone(transport)).await?;
        entries.push(SuiteEntry {
            test,
            assertion: Assertion::all(assertions),
        });
    }
    Ok(entries)
}

/// Runs the entries in order. A test fails when its run aborts, a response
/// fails without `ignorefailures`, or its assertions do not hold. An
/// interrupt stops the suite after the current test.
///
/// Returns the number of failed tests.
pub async fn run_entries(entries: &[SuiteEntry], interrupt_tx: &ShutdownSender) -> usize {
    let mut interrupt_rx = interrupt_tx.subscribe();
    let mut failed = 0_usize;
    for (index, entry) in entries.iter().enumerate() {
        if interrupt_rx.try_recv().is_ok() {
            warn!("Suite interrupted before test {}", index);
            break;
        }
        info!("Suite test {}: {}", index, entry.test.target());
        let result = match entry.test.run(interrupt_tx).await {
            Ok(result) => result,
            Err(err) => {
                error!("Test {} aborted: {}", index, err);
                failed = failed.saturating_add(1);
                continue;
            }
        };
        entry.test.print(&result);

        let assertions_hold = entry.assertion.evaluate(&result.report.response_timings);
        if !assertions_hold {
            println!("Assertions failed: {}", entry.assertion);
        }
        if result.exit_code != 0 || !assertions_hold {
            failed = failed.saturating_add(1);
        }
        println!();
        if result.state == RunState::Interrupted {
            warn!("Suite interrupted during test {}", index);
            break;
        }
    }
    failed
}

/// Loads, validates and (unless `--dry-run`) runs a suite file.
///
/// # Errors
///
/// Returns an error when the suite cannot be loaded or validated, or when
/// any test failed.
pub async fn run_suite(
    args: &SuiteArgs,
    transport: &Arc<dyn Transport>,
    interrupt_tx: &ShutdownSender,
) -> AppResult<()> {
    let suite = load_suite_file(&args.file).await?;
    let entries = prepare_suite(&suite, transport).await?;
    if args.dry_run {
        println!(
            "Suite {} is valid: {} test(s)",
            args.file.display(),
            entries.len()
        );
        return Ok(());
    }

    let failed = run_entries(&entries, interrupt_tx).await;
    if failed > 0 {
        return Err(AppError::run(RunError::SuiteFailed {
            failed,
            total: entries.len(),
        }));
    }
    Ok(())
}
