//! Run parameters, suite files and value parsing.
mod loader;
mod parse;
pub mod types;


pub use loader::load_suite_file;
pub use parse::{parse_duration_value, parse_header};
pub use types::{DEFAULT_METHOD, DEFAULT_TIMEOUT, DurationValue, RunParams, SuiteFile, SuiteTest};

#[cfg(test)]
pub(crate) use loader::parse_suite;
