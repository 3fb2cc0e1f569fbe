//! HTTP mapping for handler failures.
//!
//! # Design
//! Handlers return `ApiError`, which pairs the underlying failure with the
//! operation-specific message clients see ("Failed to save todo", ...).
//! `NotFound` and `InvalidIdentifier` override that message with fixed ones
//! because clients key on them. Store failures are logged here, once, so
//! individual handlers stay free of logging boilerplate.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use todo_core::{Envelope, StoreError, ValidationError};

pub const TODO_NOT_FOUND: &str = "Todo not found";
pub const INVALID_ID: &str = "The id is invalid";
pub const EMPTY_TITLE: &str = "Title cannot be empty";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}: {source}")]
    Validation {
        message: &'static str,
        #[source]
        source: ValidationError,
    },

    #[error("{message}: {source}")]
    Store {
        message: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    pub fn validation(message: &'static str, source: ValidationError) -> Self {
        Self::Validation { message, source }
    }

    pub fn store(message: &'static str, source: StoreError) -> Self {
        Self::Store { message, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Store { source, .. } => match source {
                StoreError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
                StoreError::NotFound => StatusCode::NOT_FOUND,
                StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                StoreError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                StoreError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn envelope(&self) -> Envelope {
        match self {
            Self::Validation {
                source: ValidationError::EmptyTitle,
                ..
            } => Envelope::message(EMPTY_TITLE),
            Self::Validation {
                message,
                source: ValidationError::MalformedBody(detail),
            } => Envelope::failure(*message, detail.as_str()),
            Self::Store {
                source: StoreError::InvalidIdentifier(_),
                ..
            } => Envelope::message(INVALID_ID),
            Self::Store {
                source: StoreError::NotFound,
                ..
            } => Envelope::message(TODO_NOT_FOUND),
            Self::Store { message, source } => Envelope::failure(*message, source.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "store call failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(self.envelope())).into_response()
    }
}
