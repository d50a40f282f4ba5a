//! Subscription topics: exact names or regular expressions.

use regex::Regex;

use crate::error::BusError;

/// What a subscription listens to.
///
/// Exact names are compared case-sensitively. Patterns are tested with
/// [`Regex::is_match`], so they match anywhere in the name unless anchored.
#[derive(Debug, Clone)]
pub enum Topic {
    Name(String),
    Pattern(Regex),
}

impl Topic {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Compile `pattern` into a pattern topic.
    pub fn pattern(pattern: &str) -> Result<Self, BusError> {
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|source| BusError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Topic::Name(exact) => exact == name,
            Topic::Pattern(re) => re.is_match(name),
        }
    }

    /// The exact name, or the source text of the pattern.
    pub fn as_str(&self) -> &str {
        match self {
            Topic::Name(exact) => exact,
            Topic::Pattern(re) => re.as_str(),
        }
    }
}

impl core::fmt::Display for Topic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Topic::Name(exact) => f.write_str(exact),
            Topic::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl From<&str> for Topic {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for Topic {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

impl From<Regex> for Topic {
    fn from(value: Regex) -> Self {
        Self::Pattern(value)
    }
}
