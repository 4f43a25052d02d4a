//! Discovery error taxonomy.

use std::error::Error as StdError;

use axum::http::StatusCode;
use thiserror::Error;

/// Well-known discovery failures with a fixed HTTP mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    KeyNotFound,
    Unexpected,
    Unauthorized,
    BadInput,
}

impl ErrorKind {
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::KeyNotFound => StatusCode::NOT_FOUND,
            Self::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadInput => StatusCode::BAD_REQUEST,
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::KeyNotFound => "entry of public key is not found",
            Self::Unexpected => "something unexpected happened",
            Self::Unauthorized => "invalid signature",
            Self::BadInput => "error bad input",
        }
    }
}

/// Errors returned by discovery operations.
#[derive(Debug, Error)]
pub enum DiscError {
    #[error("entry of public key is not found")]
    KeyNotFound,
    #[error("something unexpected happened")]
    Unexpected,
    #[error("invalid signature")]
    Unauthorized,
    #[error("error bad input")]
    BadInput,
    #[error(transparent)]
    Validation(#[from] EntryValidationError),
}

impl DiscError {
    /// The fixed mapping for this error, if it has one.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::KeyNotFound => Some(ErrorKind::KeyNotFound),
            Self::Unexpected => Some(ErrorKind::Unexpected),
            Self::Unauthorized => Some(ErrorKind::Unauthorized),
            Self::BadInput => Some(ErrorKind::BadInput),
            Self::Validation(_) => None,
        }
    }
}

impl From<ErrorKind> for DiscError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::KeyNotFound => Self::KeyNotFound,
            ErrorKind::Unexpected => Self::Unexpected,
            ErrorKind::Unauthorized => Self::Unauthorized,
            ErrorKind::BadInput => Self::BadInput,
        }
    }
}

/// A discovery entry failed validation.
#[derive(Debug, Error)]
#[error("entry validation error: {cause}")]
pub struct EntryValidationError {
    cause: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl EntryValidationError {
    #[must_use]
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
            source: None,
        }
    }

    /// Attach the error that caused validation to fail.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn cause(&self) -> &str {
        &self.cause
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [ErrorKind; 4] = [
        ErrorKind::KeyNotFound,
        ErrorKind::Unexpected,
        ErrorKind::Unauthorized,
        ErrorKind::BadInput,
    ];

    #[test]
    fn test_kind_messages_match_errors() {
        for kind in KINDS {
            let err = DiscError::from(kind);
            assert_eq!(err.to_string(), kind.message());
            assert_eq!(err.kind(), Some(kind));
        }
    }

    #[test]
    fn test_statuses_are_distinct() {
        let statuses: std::collections::HashSet<_> = KINDS.iter().map(|k| k.status()).collect();
        assert_eq!(statuses.len(), KINDS.len());
    }

    #[test]
    fn test_validation_message_and_source() {
        let err = EntryValidationError::new("entry has no sequence")
            .with_source(DiscError::BadInput);
        assert_eq!(err.to_string(), "entry validation error: entry has no sequence");
        assert_eq!(err.cause(), "entry has no sequence");
        assert_eq!(err.source().unwrap().to_string(), "error bad input");

        let wrapped = DiscError::from(err);
        assert_eq!(wrapped.kind(), None);
        assert_eq!(
            wrapped.to_string(),
            "entry validation error: entry has no sequence"
        );
    }
}
