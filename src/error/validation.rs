use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid test parameters:\n{}", problems.join("\n"))]
    InvalidParams { problems: Vec<String> },
    #[error("Invalid header format: '{value}'. Expected 'Key=Value'")]
    InvalidHeaderFormat { value: String },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Unsupported run record format '{value}'. Use json or yaml.")]
    InvalidRecordFormat { value: String },
    #[error("Rate interval must be > 0.")]
    ZeroInterval,
    #[error("Concurrency must be >= 1.")]
    ZeroConcurrency,
    #[error("Either max requests or max time must be set.")]
    MissingRunLimit,
    #[error("Failed to build runtime: {source}")]
    RuntimeBuildFailed {
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
