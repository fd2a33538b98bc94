use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::timing::Timing;

/// Response headers keyed by lowercase name, preserving repeated values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, Vec<String>>);

impl Headers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.0
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// First value for `name`, matched case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().flat_map(|(name, values)| {
            values
                .iter()
                .map(move |value| (name.as_str(), value.as_str()))
        })
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            writeln!(f, "{}: {}", name, value)?;
        }
        Ok(())
    }
}

/// What a request produced. Headers and body are only captured when asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: String,
    pub status_code: u16,
    pub content_length: Option<u64>,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub body: String,
}

impl Response {
    #[must_use]
    pub fn new(status_code: u16, status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            status_code,
            content_length: None,
            headers: Headers::new(),
            body: String::new(),
        }
    }

    /// Informational, success and redirect codes count as success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        is_success_status(self.status_code)
    }
}

#[must_use]
pub const fn is_success_status(code: u16) -> bool {
    code >= 100 && code < 400
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTiming {
    pub response: Response,
    pub timing: Timing,
}

/// Ordered results of a run, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseTimings(Vec<ResponseTiming>);

impl ResponseTimings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ResponseTiming) {
        self.0.push(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResponseTiming> {
        self.0.iter()
    }

    #[must_use]
    pub fn first(&self) -> Option<&ResponseTiming> {
        self.0.first()
    }

    pub fn responses(&self) -> impl Iterator<Item = &Response> {
        self.0.iter().map(|entry| &entry.response)
    }

    pub fn timings(&self) -> impl Iterator<Item = &Timing> {
        self.0.iter().map(|entry| &entry.timing)
    }

    /// Largest total latency, zero for an empty run.
    #[must_use]
    pub fn longest_duration(&self) -> Duration {
        self.timings()
            .map(Timing::total)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    #[must_use]
    pub fn failing_count(&self) -> u64 {
        let count = self.responses().filter(|resp| !resp.is_success()).count();
        u64::try_from(count).unwrap_or(u64::MAX)
    }
}

impl From<Vec<ResponseTiming>> for ResponseTimings {
    fn from(entries: Vec<ResponseTiming>) -> Self {
        Self(entries)
    }
}

impl<'a> IntoIterator for &'a ResponseTimings {
    type Item = &'a ResponseTiming;
    type IntoIter = std::slice::Iter<'a, ResponseTiming>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
