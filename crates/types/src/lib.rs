//! Validated primitive types shared across the Swasthya Saathi crates.
//!
//! - [`NonEmptyText`]: trimmed text that is guaranteed non-empty
//! - [`ReportId`]: canonical report identifier (32 lowercase hex characters)
//! - [`PatientId`]: pseudonymous patient identifier derived from a session id

mod ids;

pub use ids::{PatientId, ReportId};

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// Errors raised when parsing identifiers supplied from outside the core.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    #[error("report id must be 32 lowercase hex characters without hyphens, got: '{0}'")]
    InvalidReportId(String),
    #[error("patient id must be 16 lowercase hex characters, got: '{0}'")]
    InvalidPatientId(String),
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText`, returning [`TextError::Empty`] when the trimmed
    /// input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`], but treats a missing or blank value as `None`.
    pub fn optional(input: Option<impl AsRef<str>>) -> Option<Self> {
        input.and_then(|s| Self::new(s).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Hemoglobin  ").unwrap();
        assert_eq!(text.as_str(), "Hemoglobin");
    }

    #[test]
    fn non_empty_text_rejects_blank() {
        assert!(matches!(NonEmptyText::new("   "), Err(TextError::Empty)));
        assert!(NonEmptyText::optional(Some("")).is_none());
        assert!(NonEmptyText::optional(None::<&str>).is_none());
        assert_eq!(
            NonEmptyText::optional(Some(" llama2 ")).unwrap().as_str(),
            "llama2"
        );
    }

    #[test]
    fn non_empty_text_deserialize_rejects_blank() {
        let err = serde_json::from_str::<NonEmptyText>("\"  \"");
        assert!(err.is_err());
        let ok: NonEmptyText = serde_json::from_str("\"g/dL\"").unwrap();
        assert_eq!(ok.to_string(), "g/dL");
    }
}
