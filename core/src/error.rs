//! Field-level errors reported by extraction, skeleton synthesis and the
//! feature handlers.
//!
//! Nothing inside the merge engine is fatal. Every problem is recorded as a
//! [`FieldError`] and the offending sub-feature is skipped; callers receive the
//! accumulated list next to the (possibly partially enriched) routes and decide
//! for themselves whether to proceed.

use std::fmt;

use crate::SourceRef;

/// Classification of a [`FieldError`], following the Kubernetes field error
/// vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldErrorKind {
    /// The value is syntactically fine but semantically wrong.
    Invalid,
    /// The value could not be parsed into the expected type.
    TypeInvalid,
    /// Something the value refers to does not exist.
    NotFound,
    /// The value is well-formed but not supported by the conversion.
    NotSupported,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Invalid => "Invalid value",
            Self::TypeInvalid => "Invalid value (wrong type)",
            Self::NotFound => "Not found",
            Self::NotSupported => "Unsupported value",
        })
    }
}

/// A `(fieldPath, invalidValue, message)` triple, optionally attributed to the
/// source record that produced it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}{field}: {kind}: {value:?}: {message}", origin_prefix(.origin))]
pub struct FieldError {
    /// Error classification.
    pub kind: FieldErrorKind,
    /// Dotted field path, e.g. `metadata.annotations`.
    pub field: String,
    /// The offending value, rendered as a string.
    pub value: String,
    /// Human readable detail.
    pub message: String,
    /// The source record the value came from, when known.
    pub origin: Option<SourceRef>,
}

fn origin_prefix(origin: &Option<SourceRef>) -> String {
    origin
        .as_ref()
        .map_or_else(String::new, |s| format!("{s}: "))
}

/// Field path used for every annotation-driven error.
pub const ANNOTATIONS_FIELD: &str = "metadata.annotations";

impl FieldError {
    /// Create an error of the given kind.
    pub fn new(
        kind: FieldErrorKind,
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field: field.into(),
            value: value.into(),
            message: message.into(),
            origin: None,
        }
    }

    /// `Invalid` error.
    pub fn invalid(
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(FieldErrorKind::Invalid, field, value, message)
    }

    /// `TypeInvalid` error.
    pub fn type_invalid(
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(FieldErrorKind::TypeInvalid, field, value, message)
    }

    /// `NotFound` error.
    pub fn not_found(
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(FieldErrorKind::NotFound, field, value, message)
    }

    /// `NotSupported` error.
    pub fn not_supported(
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(FieldErrorKind::NotSupported, field, value, message)
    }

    /// Attribute this error to a source record.
    #[must_use]
    pub fn with_source(mut self, source: &SourceRef) -> Self {
        self.origin = Some(source.clone());
        self
    }

    /// Record the error in the log stream and return it unchanged.
    #[must_use]
    pub fn logged(self) -> Self {
        tracing::warn!(
            field = %self.field,
            kind = ?self.kind,
            value = %self.value,
            origin = ?self.origin.as_ref().map(ToString::to_string),
            "{}",
            self.message
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_without_source() {
        let err = FieldError::invalid(ANNOTATIONS_FIELD, "abc", "timeout must be an integer");
        assert_eq!(
            err.to_string(),
            "metadata.annotations: Invalid value: \"abc\": timeout must be an integer"
        );
    }

    #[test]
    fn display_with_source() {
        let source = SourceRef::new("default", "web");
        let err = FieldError::not_found(ANNOTATIONS_FIELD, "/api", "rule not found")
            .with_source(&source);
        assert_eq!(
            err.to_string(),
            "default/web: metadata.annotations: Not found: \"/api\": rule not found"
        );
    }
}
