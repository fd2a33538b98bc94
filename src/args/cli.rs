use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{DEFAULT_METHOD, RunParams};
use crate::record::RecordFormat;

use super::parsers::{parse_duration_arg, parse_header_arg};

/// Delay between the ticks of a single timed request. Only one request is
/// ever sent, so the value just has to be non-zero.
const TIME_DELAY: Duration = Duration::from_millis(1);

#[derive(Debug, Parser, Clone)]
#[clap(
    name = "lode",
    version,
    about = "Controlled-load HTTP exerciser: fire requests at a fixed rate, then report status codes, latency percentiles and per-phase timings."
)]
pub struct LodeArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Load test a URL at a fixed rate
    Test(TestArgs),
    /// Time a single request and show where the time went
    Time(TimeArgs),
    /// Run every test listed in a suite file
    Suite(SuiteArgs),
    /// Print the report of a recorded run
    Replay(ReplayArgs),
}

/// Request shape shared by `test` and `time`.
#[derive(Debug, Args, Clone)]
pub struct RequestArgs {
    /// Target URL
    pub url: String,

    /// HTTP method
    #[arg(long, short, default_value = DEFAULT_METHOD)]
    pub method: String,

    /// Per-request timeout (e.g. 500ms, 5s)
    #[arg(long, short, default_value = "5s", value_parser = parse_duration_arg)]
    pub timeout: Duration,

    /// Request body
    #[arg(long, short)]
    pub body: Option<String>,

    /// Read the request body from a file (takes precedence over --body)
    #[arg(long = "file", short = 'F')]
    pub file: Option<PathBuf>,

    /// Request header as Key=Value (repeatable or comma separated)
    #[arg(
        long = "header",
        short = 'H',
        value_delimiter = ',',
        value_parser = parse_header_arg
    )]
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Args, Clone)]
pub struct TestArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Requests per second (takes precedence over --delay)
    #[arg(long, short, default_value_t = 0)]
    pub freq: u32,

    /// Delay between requests (e.g. 100ms, 1s)
    #[arg(long, short, default_value = "1s", value_parser = parse_duration_arg)]
    pub delay: Duration,

    /// Number of concurrent workers
    #[arg(long, short, default_value_t = 1)]
    pub concurrency: usize,

    /// Stop after this many responses (0 means no limit)
    #[arg(long = "max-requests", short = 'n', default_value_t = 0)]
    pub max_requests: u64,

    /// Stop after this much time (0 means no limit)
    #[arg(long = "max-time", short = 'l', default_value = "0", value_parser = parse_duration_arg)]
    pub max_time: Duration,

    /// Abort the run on the first non-success status
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,

    /// Exit successfully even when some responses failed
    #[arg(long = "ignore-failures")]
    pub ignore_failures: bool,

    /// List every request after the report
    #[arg(long, short)]
    pub interactive: bool,

    /// Write a run record to this path
    #[arg(long = "out", short = 'o')]
    pub out: Option<PathBuf>,

    /// Run record format (inferred from the --out extension when unset)
    #[arg(long = "out-format", value_enum)]
    pub out_format: Option<RecordFormat>,
}

#[derive(Debug, Args, Clone)]
pub struct TimeArgs {
    #[command(flatten)]
    pub request: RequestArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SuiteArgs {
    /// Suite file (.yaml, .yml, .json or .toml)
    pub file: PathBuf,

    /// Validate the suite without sending requests
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ReplayArgs {
    /// Run record written with `test --out`
    pub file: PathBuf,

    /// Run record format (inferred from the extension when unset)
    #[arg(long = "in-format", value_enum)]
    pub in_format: Option<RecordFormat>,
}

impl RequestArgs {
    fn base_params(&self) -> RunParams {
        RunParams {
            url: self.url.clone(),
            method: self.method.clone(),
            body: self.body.clone(),
            file: self.file.clone(),
            timeout: self.timeout,
            headers: self.headers.clone(),
            ..RunParams::default()
        }
    }
}

impl TestArgs {
    #[must_use]
    pub fn to_params(&self) -> RunParams {
        let out_format = self
            .out_format
            .or_else(|| self.out.as_deref().and_then(RecordFormat::from_path))
            .unwrap_or_default();
        RunParams {
            freq: self.freq,
            delay: self.delay,
            concurrency: self.concurrency,
            max_requests: self.max_requests,
            max_time: self.max_time,
            fail_fast: self.fail_fast,
            ignore_failures: self.ignore_failures,
            interactive: self.interactive,
            out_file: self.out.clone(),
            out_format,
            ..self.request.base_params()
        }
    }
}

impl TimeArgs {
    /// One request on one worker.
    #[must_use]
    pub fn to_params(&self) -> RunParams {
        RunParams {
            delay: TIME_DELAY,
            concurrency: 1,
            max_requests: 1,
            ..self.request.base_params()
        }
    }
}

impl ReplayArgs {
    #[must_use]
    pub fn format(&self) -> RecordFormat {
        self.in_format
            .or_else(|| RecordFormat::from_path(&self.file))
            .unwrap_or_default()
    }
}
