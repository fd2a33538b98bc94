use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Failed to encode JSON run record: {source}")]
    EncodeJson {
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode YAML run record: {source}")]
    EncodeYaml {
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Failed to decode JSON run record: {source}")]
    DecodeJson {
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to decode YAML run record: {source}")]
    DecodeYaml {
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Unsupported run record version '{version}'.")]
    UnsupportedVersion { version: String },
    #[error("Run record declares {declared} response(s) but holds {actual}.")]
    CountMismatch { declared: usize, actual: usize },
    #[error("Failed to write run record '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read run record '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
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
