use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LabelError {
    #[error("label cannot be empty")]
    Empty,
}

/// Stable display name of a completed unit (for example a surah name).
///
/// Labels are compared by exact string equality after surrounding whitespace
/// is trimmed.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(String);

impl Label {
    /// Validate and normalize a raw label.
    ///
    /// # Errors
    ///
    /// Returns `LabelError::Empty` if the label is blank.
    pub fn parse(raw: impl Into<String>) -> Result<Self, LabelError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LabelError::Empty);
        }
        if trimmed.len() == raw.len() {
            return Ok(Self(raw));
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({:?})", self.0)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Label {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Label {
    type Error = LabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let label = Label::parse("  Al-Fatiha \n").unwrap();
        assert_eq!(label.as_str(), "Al-Fatiha");
    }

    #[test]
    fn rejects_blank() {
        assert_eq!(Label::parse("   "), Err(LabelError::Empty));
        assert_eq!("".parse::<Label>(), Err(LabelError::Empty));
    }

    #[test]
    fn equality_is_exact() {
        let a = Label::parse("Al-Ikhlas").unwrap();
        let b = Label::parse("al-ikhlas").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn deserialize_validates() {
        let ok: Label = serde_json::from_str("\"Al-Fatiha\"").unwrap();
        assert_eq!(ok.to_string(), "Al-Fatiha");
        assert!(serde_json::from_str::<Label>("\" \"").is_err());
    }
}
