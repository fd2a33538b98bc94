use super::{AssertionError, ConfigError, RecordError, ValidationError};

impl From<&'static str> for ValidationError {
    fn from(message: &'static str) -> Self {
        ValidationError::TestExpectation { message }
    }
}

impl From<String> for ValidationError {
    fn from(value: String) -> Self {
        ValidationError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for ConfigError {
    fn from(message: &'static str) -> Self {
        ConfigError::TestExpectation { message }
    }
}

impl From<String> for ConfigError {
    fn from(value: String) -> Self {
        ConfigError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for AssertionError {
    fn from(message: &'static str) -> Self {
        AssertionError::TestExpectation { message }
    }
}

impl From<String> for AssertionError {
    fn from(value: String) -> Self {
        AssertionError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for RecordError {
    fn from(message: &'static str) -> Self {
        RecordError::TestExpectation { message }
    }
}

impl From<String> for RecordError {
    fn from(value: String) -> Self {
        RecordError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}
