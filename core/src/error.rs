//! Error taxonomy shared by the mapper, the store and the HTTP layer.
//!
//! # Design
//! Store-specific failures (driver errors, timeouts, "no match") are
//! normalized into `StoreError` before they leave the storage boundary, so
//! handlers decide on a status code without knowing which backend is in use.
//! Input problems caught before any store call are `ValidationError`.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by a document store or the gateway in front of it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The identifier was well-formed but no record matched it.
    #[error("todo not found")]
    NotFound,

    /// The identifier string is not a valid ObjectId.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// The store could not be reached or refused the connection.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The call exceeded the gateway's deadline and was abandoned.
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Anything the driver reported that does not fit the variants above.
    #[error("store error: {0}")]
    Unknown(String),
}

/// Rejections of client input detected before the store is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title cannot be empty")]
    EmptyTitle,

    /// The request body did not decode into the expected JSON shape.
    #[error("malformed body: {0}")]
    MalformedBody(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display_includes_window() {
        let err = StoreError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "store operation timed out after 5s");
    }

    #[test]
    fn invalid_identifier_quotes_input() {
        let err = StoreError::InvalidIdentifier("not-an-id".to_string());
        assert_eq!(err.to_string(), r#"invalid identifier: "not-an-id""#);
    }
}
