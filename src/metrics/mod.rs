//! Per-request timing capture and run statistics.
mod histogram;
mod percentiles;
mod timing;
mod types;


pub use histogram::StatusHistogram;
pub use percentiles::{LatencyPercentiles, REPORTED_PERCENTILES};
pub use timing::{PhaseEvent, PhaseTimer, TIMING_RESOLUTION, Timing, format_duration};
pub use types::{Headers, Response, ResponseTiming, ResponseTimings, is_success_status};
