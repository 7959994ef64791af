//! Error type for backend operations.

use thiserror::Error;

/// Errors surfaced by [`ChatBackend`](super::ChatBackend) operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// A unique-key violation, e.g. creating a room whose name already
    /// exists. Carries the platform's own message.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The access token was missing, expired or rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// The platform answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// The request never completed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The platform's payload did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A change feed or presence stream broke mid-flight.
    #[error("stream error: {0}")]
    Stream(String),
}

impl BackendError {
    /// Whether this error means "the row already exists".
    ///
    /// Classification is structural (`Conflict`, built from the status code)
    /// wherever possible; substring matching on the body is kept only as a
    /// fallback for platforms that answer with an opaque 4xx.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        match self {
            Self::Conflict(_) => true,
            Self::Http { body, .. } => body.contains("duplicate"),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_is_duplicate() {
        assert!(BackendError::Conflict("rooms_name_key".into()).is_duplicate());
    }

    #[test]
    fn opaque_body_falls_back_to_substring() {
        let err = BackendError::Http {
            status: 400,
            body: "duplicate key value violates unique constraint".into(),
        };
        assert!(err.is_duplicate());

        let err = BackendError::Http {
            status: 500,
            body: "internal error".into(),
        };
        assert!(!err.is_duplicate());
    }

    #[test]
    fn transport_is_not_duplicate() {
        assert!(!BackendError::Unauthorized.is_duplicate());
        assert!(!BackendError::Stream("eof".into()).is_duplicate());
    }
}
