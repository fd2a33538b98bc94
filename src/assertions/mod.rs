//! Declarative checks evaluated against every response of a finished run.
mod eval;
mod parse;


use std::fmt;

use regex::Regex;

/// Response field an assertion reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    Body,
    Status,
    Header(String),
}

/// Immutable assertion tree. Leaf predicates hold only when they hold for
/// every response in the run.
#[derive(Debug, Clone)]
pub enum Assertion {
    And(Vec<Assertion>),
    Or(Vec<Assertion>),
    Not(Box<Assertion>),
    Equals { property: Property, expected: String },
    Contains { property: Property, needle: String },
    Matches { property: Property, pattern: Regex },
    GreaterThan { property: Property, threshold: f64 },
    LessThan { property: Property, threshold: f64 },
}

impl Assertion {
    /// Combines a list of top-level assertions; an empty list always passes.
    #[must_use]
    pub const fn all(assertions: Vec<Self>) -> Self {
        Self::And(assertions)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body => f.write_str("body"),
            Self::Status => f.write_str("status"),
            Self::Header(key) => write!(f, "headers[{}]", key),
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(children) => write_group(f, "and", children),
            Self::Or(children) => write_group(f, "or", children),
            Self::Not(child) => write!(f, "not({})", child),
            Self::Equals { property, expected } => {
                write!(f, "{} equals {:?}", property, expected)
            }
            Self::Contains { property, needle } => {
                write!(f, "{} contains {:?}", property, needle)
            }
            Self::Matches { property, pattern } => {
                write!(f, "{} matches /{}/", property, pattern.as_str())
            }
            Self::GreaterThan {
                property,
                threshold,
            } => write!(f, "{} > {}", property, threshold),
            Self::LessThan {
                property,
                threshold,
            } => write!(f, "{} < {}", property, threshold),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, name: &str, children: &[Assertion]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (index, child) in children.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", child)?;
    }
    f.write_str(")")
}
