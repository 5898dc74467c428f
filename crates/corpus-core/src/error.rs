//! Error types shared across the corpus engine crates.

use thiserror::Error;

/// Errors raised by the corpus engine.
///
/// Grouped by handling policy (not-found, state, provider, config, other) so
/// callers can match on category without enumerating every leaf variant.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A `(source_kind, source_id)` key was not present in the corpus store.
    #[error("corpus entry not found: {source_kind:?}/{source_id}")]
    EntryNotFound {
        /// The source kind of the missing key.
        source_kind: crate::model::SourceKind,
        /// The source id of the missing key.
        source_id: String,
    },

    /// A case id was not found in the case repository.
    #[error("case not found: {0}")]
    CaseNotFound(String),

    /// A learning event id was not found.
    #[error("learning event not found: {0}")]
    EventNotFound(String),

    /// A review was attempted on a learning event that already has a final status.
    #[error("learning event {0} already reviewed")]
    AlreadyReviewed(String),

    /// An embedding, generation, or rerank provider call failed.
    #[error("provider error ({port}): {message}")]
    Provider {
        /// Which port failed (`embedding`, `generation`, `rerank`).
        port: &'static str,
        /// Human-readable detail from the underlying transport/quota failure.
        message: String,
    },

    /// A structured generation call failed schema validation after exhausting retries.
    #[error("structured output failed schema validation after {attempts} attempts: {message}")]
    SchemaValidation {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Validation failure detail.
        message: String,
    },

    /// Invalid configuration or invalid input supplied by a caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error (e.g. embedding dimension mismatch at startup).
    #[error("configuration error: {0}")]
    Config(String),

    /// Catch-all for errors that don't warrant a dedicated variant.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Construct an [`Error::EntryNotFound`].
    #[must_use]
    pub fn entry_not_found(source_kind: crate::model::SourceKind, source_id: impl Into<String>) -> Self {
        Error::EntryNotFound {
            source_kind,
            source_id: source_id.into(),
        }
    }

    /// Construct an [`Error::Provider`] for the given port name.
    #[must_use]
    pub fn provider(port: &'static str, message: impl Into<String>) -> Self {
        Error::Provider {
            port,
            message: message.into(),
        }
    }

    /// Construct an [`Error::Config`].
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Construct an [`Error::InvalidInput`].
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }

    /// Construct an [`Error::Other`].
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Error::Other(message.into())
    }
}

/// Result type alias used throughout the corpus engine crates.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceKind;

    #[test]
    fn entry_not_found_displays_key() {
        let err = Error::entry_not_found(SourceKind::Script, "SCR-1");
        assert!(err.to_string().contains("SCR-1"));
        assert!(err.to_string().contains("Script"));
    }

    #[test]
    fn already_reviewed_displays_event_id() {
        let err = Error::AlreadyReviewed("evt-1".to_string());
        assert_eq!(err.to_string(), "learning event evt-1 already reviewed");
    }

    #[test]
    fn provider_error_includes_port_name() {
        let err = Error::provider("embedding", "timeout after 30s");
        assert!(err.to_string().contains("embedding"));
        assert!(err.to_string().contains("timeout after 30s"));
    }
}
