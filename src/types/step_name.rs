// ABOUTME: Validated upgrade step names.
// ABOUTME: Step names double as directory names under the state dir.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepNameError {
    #[error("step name cannot be empty")]
    Empty,

    #[error("step name exceeds maximum length of 64 characters")]
    TooLong,

    #[error("step name cannot start with a hyphen")]
    StartsWithHyphen,

    #[error("step name cannot end with a hyphen")]
    EndsWithHyphen,

    #[error("invalid character in step name: '{0}'")]
    InvalidChar(char),
}

/// Name of an upgrade step.
///
/// Restricted to lowercase ASCII alphanumerics and hyphens so it can be
/// used verbatim as a path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepName(String);

impl StepName {
    pub fn new(value: &str) -> Result<Self, StepNameError> {
        if value.is_empty() {
            return Err(StepNameError::Empty);
        }

        if value.len() > 64 {
            return Err(StepNameError::TooLong);
        }

        if value.starts_with('-') {
            return Err(StepNameError::StartsWithHyphen);
        }

        if value.ends_with('-') {
            return Err(StepNameError::EndsWithHyphen);
        }

        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-')
        {
            return Err(StepNameError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for StepName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StepName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        StepName::new(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_hyphenated_lowercase() {
        let name = StepName::new("init-cluster").unwrap();
        assert_eq!(name.as_str(), "init-cluster");
    }

    #[test]
    fn rejects_path_separators() {
        assert_eq!(
            StepName::new("../etc"),
            Err(StepNameError::InvalidChar('.'))
        );
        assert_eq!(StepName::new("a/b"), Err(StepNameError::InvalidChar('/')));
    }

    #[test]
    fn rejects_uppercase_and_edges() {
        assert_eq!(StepName::new("Config"), Err(StepNameError::InvalidChar('C')));
        assert_eq!(StepName::new("-x"), Err(StepNameError::StartsWithHyphen));
        assert_eq!(StepName::new("x-"), Err(StepNameError::EndsWithHyphen));
        assert_eq!(StepName::new(""), Err(StepNameError::Empty));
        assert_eq!(StepName::new(&"a".repeat(65)), Err(StepNameError::TooLong));
    }
}
