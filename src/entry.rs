use std::sync::Arc;

use clap::Parser;

use crate::app::{run_replay, run_suite, run_test};
use crate::args::{Command, LodeArgs};
use crate::error::{AppError, AppResult, ValidationError};
use crate::http::{ReqwestTransport, Transport};
use crate::shutdown::ShutdownSender;
use crate::shutdown_handlers::{setup_signal_shutdown_handler, shutdown_channel};

pub(crate) fn run() -> AppResult<()> {
    let args = LodeArgs::parse();

    crate::logger::init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|source| AppError::validation(ValidationError::RuntimeBuildFailed { source }))?;

    runtime.block_on(run_async(&args.command))
}

async fn run_async(command: &Command) -> AppResult<()> {
    let (interrupt_tx, _) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&interrupt_tx);

    let result = execute(command, &interrupt_tx).await;

    signal_handle.abort();
    if let Err(err) = &result {
        tracing::error!("{}", err);
    }
    result
}

async fn execute(command: &Command, interrupt_tx: &ShutdownSender) -> AppResult<()> {
    match command {
        Command::Test(test_args) => {
            run_test(test_args.to_params(), transport()?, interrupt_tx).await
        }
        Command::Time(time_args) => {
            run_test(time_args.to_params(), transport()?, interrupt_tx).await
        }
        Command::Suite(suite_args) => run_suite(suite_args, &transport()?, interrupt_tx).await,
        Command::Replay(replay_args) => run_replay(replay_args).await,
    }
}

fn transport() -> AppResult<Arc<dyn Transport>> {
    let transport = ReqwestTransport::new()?;
    Ok(Arc::new(transport))
}
