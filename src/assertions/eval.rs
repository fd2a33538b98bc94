use std::borrow::Cow;

use crate::metrics::{Response, ResponseTimings};

use super::{Assertion, Property};

impl Assertion {
    /// Evaluates the tree against a finished run.
    #[must_use]
    pub fn evaluate(&self, timings: &ResponseTimings) -> bool {
        match self {
            Self::And(children) => children.iter().all(|child| child.evaluate(timings)),
            Self::Or(children) => children.iter().any(|child| child.evaluate(timings)),
            Self::Not(child) => !child.evaluate(timings),
            Self::Equals { property, expected } => {
                every(timings, |resp| property.text(resp) == expected.as_str())
            }
            Self::Contains { property, needle } => {
                every(timings, |resp| property.text(resp).contains(needle.as_str()))
            }
            Self::Matches { property, pattern } => {
                every(timings, |resp| pattern.is_match(&property.text(resp)))
            }
            Self::GreaterThan {
                property,
                threshold,
            } => every(timings, |resp| {
                property.number(resp).is_some_and(|value| value > *threshold)
            }),
            Self::LessThan {
                property,
                threshold,
            } => every(timings, |resp| {
                property.number(resp).is_some_and(|value| value < *threshold)
            }),
        }
    }
}

fn every<F>(timings: &ResponseTimings, predicate: F) -> bool
where
    F: Fn(&Response) -> bool,
{
    timings.responses().all(predicate)
}

impl Property {
    /// A missing header reads as the empty string.
    fn text<'resp>(&self, response: &'resp Response) -> Cow<'resp, str> {
        match self {
            Self::Body => Cow::Borrowed(response.body.as_str()),
            Self::Status => Cow::Owned(response.status_code.to_string()),
            Self::Header(key) => Cow::Borrowed(response.headers.get(key).unwrap_or_default()),
        }
    }

    fn number(&self, response: &Response) -> Option<f64> {
        match self {
            Self::Status => Some(f64::from(response.status_code)),
            Self::Body | Self::Header(_) => self.text(response).trim().parse::<f64>().ok(),
        }
    }
}
