use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::http::BodySource;
use crate::record::RecordFormat;

use super::parse::{parse_duration_value, parse_header};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_METHOD: &str = "GET";

/// Fully resolved parameters for one test run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParams {
    pub url: String,
    pub method: String,
    pub body: Option<String>,
    pub file: Option<PathBuf>,
    pub freq: u32,
    pub delay: Duration,
    pub concurrency: usize,
    pub max_requests: u64,
    pub max_time: Duration,
    pub timeout: Duration,
    pub headers: Vec<(String, String)>,
    pub fail_fast: bool,
    pub ignore_failures: bool,
    pub interactive: bool,
    pub out_file: Option<PathBuf>,
    pub out_format: RecordFormat,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: DEFAULT_METHOD.to_owned(),
            body: None,
            file: None,
            freq: 0,
            delay: Duration::ZERO,
            concurrency: 1,
            max_requests: 0,
            max_time: Duration::ZERO,
            timeout: DEFAULT_TIMEOUT,
            headers: Vec::new(),
            fail_fast: false,
            ignore_failures: false,
            interactive: false,
            out_file: None,
            out_format: RecordFormat::Json,
        }
    }
}

impl RunParams {
    /// Checks every constraint and reports all violations together.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidParams`] listing each problem.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::InvalidParams { problems })
        }
    }

    fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.url.trim().is_empty() {
            problems.push("url must be provided".to_owned());
        }
        if self.method.trim().is_empty() {
            problems.push("method must be provided".to_owned());
        }
        if self.freq == 0 && self.delay.is_zero() {
            problems.push("freq or delay must be provided".to_owned());
        }
        if self.concurrency < 1 {
            problems.push("concurrency must be provided as a positive integer".to_owned());
        }
        if self.timeout.is_zero() {
            problems.push("timeout must be provided".to_owned());
        }
        if self.max_requests == 0 && self.max_time.is_zero() {
            problems.push("maxrequests or maxtime must be provided".to_owned());
        }
        problems
    }

    #[must_use]
    pub fn body_source(&self) -> BodySource {
        BodySource::from_parts(self.file.as_deref(), self.body.as_deref())
    }

    /// Headers and bodies are only kept when something will read them.
    #[must_use]
    pub const fn capture(&self) -> bool {
        self.interactive || self.out_file.is_some()
    }
}

/// Suite file root: `tests:` holds one entry per run.
#[derive(Debug, Default, Deserialize)]
pub struct SuiteFile {
    #[serde(default)]
    pub tests: Vec<SuiteTest>,
}

/// Durations in suite files are strings like `250ms` or whole seconds.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    /// # Errors
    ///
    /// Returns an error when the text form cannot be parsed.
    pub fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            Self::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            Self::Text(text) => parse_duration_value(text),
        }
    }
}

/// One test as written in a suite file. Keys are lowercase, without
/// separators, e.g. `maxrequests`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteTest {
    pub url: String,
    pub method: String,
    pub body: Option<String>,
    pub file: Option<PathBuf>,
    pub freq: u32,
    pub delay: Option<DurationValue>,
    pub concurrency: usize,
    pub maxrequests: u64,
    pub maxtime: Option<DurationValue>,
    pub timeout: Option<DurationValue>,
    pub headers: Vec<String>,
    pub failfast: bool,
    pub ignorefailures: bool,
    pub interactive: bool,
    pub outfile: Option<PathBuf>,
    pub outformat: Option<String>,
    pub assertions: Vec<Value>,
}

impl SuiteTest {
    /// Resolves the entry into run parameters. Parse problems and validation
    /// problems are reported together.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidParams`] listing each problem.
    pub fn to_params(&self) -> Result<RunParams, ValidationError> {
        let mut problems = Vec::new();
        let mut duration = |field: &str, value: Option<&DurationValue>, default: Duration| {
            match value.map(DurationValue::to_duration) {
                Some(Ok(parsed)) => parsed,
                Some(Err(err)) => {
                    problems.push(format!("{}: {}", field, err));
                    default
                }
                None => default,
            }
        };
        let delay = duration("delay", self.delay.as_ref(), Duration::ZERO);
        let max_time = duration("maxtime", self.maxtime.as_ref(), Duration::ZERO);
        let timeout = duration("timeout", self.timeout.as_ref(), DEFAULT_TIMEOUT);

        let mut headers = Vec::with_capacity(self.headers.len());
        for header in &self.headers {
            match parse_header(header) {
                Ok(parsed) => headers.push(parsed),
                Err(err) => problems.push(err.to_string()),
            }
        }

        let out_format = match self.outformat.as_deref() {
            Some(text) => text.parse().unwrap_or_else(|err: ValidationError| {
                problems.push(err.to_string());
                RecordFormat::Json
            }),
            None => self
                .outfile
                .as_deref()
                .and_then(RecordFormat::from_path)
                .unwrap_or_default(),
        };

        let params = RunParams {
            url: self.url.clone(),
            method: self.method.clone(),
            body: self.body.clone(),
            file: self.file.clone(),
            freq: self.freq,
            delay,
            concurrency: self.concurrency,
            max_requests: self.maxrequests,
            max_time,
            timeout,
            headers,
            fail_fast: self.failfast,
            ignore_failures: self.ignorefailures,
            interactive: self.interactive,
            out_file: self.outfile.clone(),
            out_format,
        };
        problems.extend(params.problems());
        if problems.is_empty() {
            Ok(params)
        } else {
            Err(ValidationError::InvalidParams { problems })
        }
    }
}
