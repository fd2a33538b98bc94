mod app;
mod args;
mod assertions;
mod config;
mod entry;
mod error;
mod http;
mod logger;
mod metrics;
mod record;
mod shutdown;
mod shutdown_handlers;

use error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
