use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssertionError {
    #[error("Assertion must be a map, got: {value}")]
    NotAMap { value: String },
    #[error("No type provided in assertion: {value}")]
    MissingType { value: String },
    #[error("Unknown assertion type '{kind}'.")]
    UnknownType { kind: String },
    #[error("Assertion '{kind}' is missing field '{field}'.")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
    #[error("Assertion '{kind}' field '{field}' must be {expected}.")]
    InvalidField {
        kind: &'static str,
        field: &'static str,
        expected: &'static str,
    },
    #[error("Unknown property '{property}' in assertion.")]
    UnknownProperty { property: String },
    #[error("No header key provided for '{kind}' assertion on headers.")]
    MissingHeaderKey { kind: &'static str },
    #[error("Invalid matcher regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Threshold '{value}' for '{kind}' is not a number.")]
    InvalidThreshold { kind: &'static str, value: String },
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
