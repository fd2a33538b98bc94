use regex::Regex;
use serde_json::{Map, Value};

use crate::error::AssertionError;

use super::{Assertion, Property};

type Fields = Map<String, Value>;

impl Assertion {
    /// Builds a tree from its map form, e.g.
    /// `{"type": "matches", "property": "status", "regexp": "2\\d\\d"}`.
    /// YAML documents are converted to the same value model first.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-map node, a missing or unknown `type`, a
    /// missing or ill-typed field, an unknown property, a `headers` property
    /// without `key`, an invalid regex or a non-numeric threshold.
    pub fn from_value(value: &Value) -> Result<Self, AssertionError> {
        let fields = value.as_object().ok_or_else(|| AssertionError::NotAMap {
            value: value.to_string(),
        })?;
        let kind = fields
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| AssertionError::MissingType {
                value: value.to_string(),
            })?;

        match kind {
            "and" => Ok(Self::And(children(fields, "and")?)),
            "or" => Ok(Self::Or(children(fields, "or")?)),
            "not" => {
                let child = fields.get("assertion").ok_or(AssertionError::MissingField {
                    kind: "not",
                    field: "assertion",
                })?;
                Ok(Self::Not(Box::new(Self::from_value(child)?)))
            }
            "equals" => Ok(Self::Equals {
                property: property(fields, "equals")?,
                expected: text_field(fields, "equals", "equals")?,
            }),
            "contains" => Ok(Self::Contains {
                property: property(fields, "contains")?,
                needle: text_field(fields, "contains", "contains")?,
            }),
            "matches" => {
                let property = property(fields, "matches")?;
                let pattern = text_field(fields, "matches", "regexp")?;
                let pattern = Regex::new(&pattern)
                    .map_err(|source| AssertionError::InvalidRegex { pattern, source })?;
                Ok(Self::Matches { property, pattern })
            }
            "greaterThan" => Ok(Self::GreaterThan {
                property: property(fields, "greaterThan")?,
                threshold: threshold(fields, "greaterThan")?,
            }),
            "lessThan" => Ok(Self::LessThan {
                property: property(fields, "lessThan")?,
                threshold: threshold(fields, "lessThan")?,
            }),
            unknown => Err(AssertionError::UnknownType {
                kind: unknown.to_owned(),
            }),
        }
    }

    /// Builds every entry of a list of assertion maps.
    ///
    /// # Errors
    ///
    /// Returns the first construction error.
    pub fn from_list(values: &[Value]) -> Result<Vec<Self>, AssertionError> {
        values.iter().map(Self::from_value).collect()
    }
}

fn children(fields: &Fields, kind: &'static str) -> Result<Vec<Assertion>, AssertionError> {
    let list = fields.get("assertions").ok_or(AssertionError::MissingField {
        kind,
        field: "assertions",
    })?;
    let items = list.as_array().ok_or(AssertionError::InvalidField {
        kind,
        field: "assertions",
        expected: "a list",
    })?;
    Assertion::from_list(items)
}

fn property(fields: &Fields, kind: &'static str) -> Result<Property, AssertionError> {
    let name = fields
        .get("property")
        .ok_or(AssertionError::MissingField {
            kind,
            field: "property",
        })?
        .as_str()
        .ok_or(AssertionError::InvalidField {
            kind,
            field: "property",
            expected: "a string",
        })?;

    match name {
        "body" => Ok(Property::Body),
        "status" => Ok(Property::Status),
        "headers" => {
            let key = fields
                .get("key")
                .and_then(Value::as_str)
                .filter(|key| !key.is_empty())
                .ok_or(AssertionError::MissingHeaderKey { kind })?;
            Ok(Property::Header(key.to_owned()))
        }
        unknown => Err(AssertionError::UnknownProperty {
            property: unknown.to_owned(),
        }),
    }
}

/// Strings are taken as-is; numbers are accepted so `equals: 200` works.
fn text_field(
    fields: &Fields,
    kind: &'static str,
    field: &'static str,
) -> Result<String, AssertionError> {
    match fields.get(field) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_)) => {
            Err(AssertionError::InvalidField {
                kind,
                field,
                expected: "a string",
            })
        }
        None => Err(AssertionError::MissingField { kind, field }),
    }
}

fn threshold(fields: &Fields, kind: &'static str) -> Result<f64, AssertionError> {
    match fields.get(kind) {
        Some(Value::Number(number)) => number.as_f64().ok_or(AssertionError::InvalidThreshold {
            kind,
            value: number.to_string(),
        }),
        Some(Value::String(text)) => {
            text.trim()
                .parse::<f64>()
                .map_err(|_err| AssertionError::InvalidThreshold {
                    kind,
                    value: text.clone(),
                })
        }
        Some(other @ (Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_))) => {
            Err(AssertionError::InvalidThreshold {
                kind,
                value: other.to_string(),
            })
        }
        None => Err(AssertionError::MissingField { kind, field: kind }),
    }
}
