use std::fmt::{self, Write as _};
use std::time::Duration;

use crate::metrics::{
    LatencyPercentiles, ResponseTimings, StatusHistogram, TIMING_RESOLUTION, format_duration,
};
use crate::record::{RECORD_VERSION, RunRecord};

use super::runner::RunOutcome;

/// Summary of one run, printable and convertible to a run record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestReport {
    pub target: String,
    pub concurrency: usize,
    pub duration: Duration,
    pub response_count: usize,
    /// Average requests per second, times 100.
    pub request_rate_x100: u64,
    pub response_timings: ResponseTimings,
}

impl TestReport {
    #[must_use]
    pub fn new(
        target: String,
        concurrency: usize,
        elapsed: Duration,
        response_timings: ResponseTimings,
    ) -> Self {
        let duration = truncate(elapsed);
        let response_count = response_timings.len();
        Self {
            target,
            concurrency,
            duration,
            response_count,
            request_rate_x100: rate_x100(response_count, duration),
            response_timings,
        }
    }

    #[must_use]
    pub fn from_outcome(target: String, concurrency: usize, outcome: RunOutcome) -> Self {
        Self::new(
            target,
            concurrency,
            outcome.elapsed,
            outcome.response_timings,
        )
    }

    #[must_use]
    pub fn from_record(record: RunRecord) -> Self {
        Self {
            target: record.target,
            concurrency: record.concurrency,
            duration: Duration::from_millis(record.duration_ms),
            response_count: record.response_count,
            request_rate_x100: record.request_rate_x100,
            response_timings: record.response_timings,
        }
    }

    #[must_use]
    pub fn to_record(&self) -> RunRecord {
        RunRecord {
            version: RECORD_VERSION.to_owned(),
            target: self.target.clone(),
            concurrency: self.concurrency,
            duration_ms: u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX),
            response_count: self.response_count,
            request_rate_x100: self.request_rate_x100,
            response_timings: self.response_timings.clone(),
        }
    }

    #[must_use]
    pub fn status_histogram(&self) -> StatusHistogram {
        StatusHistogram::build(&self.response_timings)
    }

    #[must_use]
    pub fn latency_percentiles(&self) -> LatencyPercentiles {
        LatencyPercentiles::build(&self.response_timings)
    }

    /// Every recorded request with its timing, headers and body.
    #[must_use]
    pub fn request_details(&self) -> String {
        let mut out = String::new();
        for (index, entry) in self.response_timings.iter().enumerate() {
            let number = index.saturating_add(1);
            let _written = writeln!(
                out,
                "#{} {} {}\n{}",
                number,
                entry.response.status,
                format_duration(entry.timing.total()),
                entry.timing
            );
            if !entry.response.headers.is_empty() {
                let _written = write!(out, "\n{}", entry.response.headers);
            }
            if !entry.response.body.is_empty() {
                let _written = writeln!(out, "\n{}", entry.response.body);
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Target: {}", self.target)?;
        writeln!(f, "Concurrency: {}", self.concurrency)?;
        writeln!(f, "Requests made: {}", self.response_count)?;
        writeln!(f, "Time taken: {}", format_duration(self.duration))?;
        writeln!(
            f,
            "Requests per second (avg): {}",
            format_rate(self.request_rate_x100)
        )?;
        match self.response_timings.first() {
            Some(_) if self.response_count > 1 => {
                write!(
                    f,
                    "\nResponse code breakdown:\n{}\nPercentile latency breakdown:\n{}\n",
                    self.status_histogram(),
                    self.latency_percentiles()
                )
            }
            Some(only) => write!(f, "\nTiming breakdown:\n{}\n", only.timing),
            None => f.write_str("\nNo requests made...\n"),
        }
    }
}

fn truncate(elapsed: Duration) -> Duration {
    let millis = elapsed
        .as_millis()
        .checked_div(TIMING_RESOLUTION.as_millis())
        .unwrap_or(0);
    Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
}

/// Rounded to two decimals; a sub-millisecond run counts as one millisecond.
fn rate_x100(count: usize, duration: Duration) -> u64 {
    let duration_ms = duration.as_millis().max(1);
    let count = u128::try_from(count).unwrap_or(u128::MAX);
    let scaled = count
        .saturating_mul(100_000)
        .saturating_add(duration_ms / 2)
        .checked_div(duration_ms)
        .unwrap_or(0);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// `1333` -> `13.33`, `20` -> `0.2`, `1000` -> `10`.
fn format_rate(rate_x100: u64) -> String {
    let whole = rate_x100 / 100;
    let fraction = rate_x100 % 100;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{:02}", fraction);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
