use std::path::PathBuf;
use thiserror::Error;

use super::{AssertionError, ValidationError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read suite '{path}': {source}")]
    ReadSuite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML suite '{path}': {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Failed to parse JSON suite '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to parse TOML suite '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Unsupported suite extension '{ext}'. Use .yaml, .yml, .json or .toml.")]
    UnsupportedExtension { ext: String },
    #[error("Suite file must have a .yaml, .yml, .json or .toml extension.")]
    MissingExtension,
    #[error("Suite has no tests.")]
    EmptySuite,
    #[error("Test {index} is invalid: {source}")]
    InvalidTest {
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("Test {index} has an invalid assertion: {source}")]
    InvalidAssertion {
        index: usize,
        #[source]
        source: AssertionError,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
