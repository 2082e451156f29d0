//! Request failure taxonomy and its canonical wire format.
//!
//! Handlers return [`ApiError`] instead of writing error responses. The
//! error-normalization middleware ([`middleware::errors`](crate::middleware::errors)) is
//! the only place an `ApiError` becomes a response, using
//! [`FailureKind::status`] as the single kind → status table.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Message sent to clients for every internal failure. The real cause is
/// logged, never serialized.
pub const INTERNAL_MESSAGE: &str = "internal server error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Validation,
    NotFound,
    Unauthenticated,
    Forbidden,
    Internal,
}

impl FailureKind {
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// One invalid input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
        }
    }
}

/// Canonical JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("internal failure: {source}")]
    Internal {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApiError {
    pub fn validation(message: impl Into<String>, fields: Vec<FieldError>) -> Self {
        Self::Validation {
            message: message.into(),
            fields,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn internal(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Internal {
            source: source.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Validation { .. } => FailureKind::Validation,
            Self::NotFound(_) => FailureKind::NotFound,
            Self::Unauthenticated(_) => FailureKind::Unauthenticated,
            Self::Forbidden(_) => FailureKind::Forbidden,
            Self::Internal { .. } => FailureKind::Internal,
        }
    }

    /// The body a client is allowed to see.
    #[must_use]
    pub fn to_body(&self) -> ErrorResponse {
        match self {
            Self::Validation { message, fields } => ErrorResponse {
                error: message.clone(),
                fields: Some(fields.clone()),
            },
            Self::Internal { .. } => ErrorResponse {
                error: INTERNAL_MESSAGE.to_string(),
                fields: None,
            },
            other => ErrorResponse {
                error: other.to_string(),
                fields: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.kind().status(), Json(self.to_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_exact() {
        assert_eq!(FailureKind::Validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(FailureKind::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(FailureKind::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(FailureKind::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            FailureKind::Internal.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_body_hides_cause() {
        let err = ApiError::internal("connection string postgres://admin:hunter2@db");
        let body = serde_json::to_string(&err.to_body()).unwrap();
        assert_eq!(body, r#"{"error":"internal server error"}"#);
    }

    #[test]
    fn fields_only_for_validation() {
        let err = ApiError::validation(
            "data validation error",
            vec![FieldError::new("name", "must not be empty")],
        );
        let body = serde_json::to_value(err.to_body()).unwrap();
        assert_eq!(body["fields"][0]["field"], "name");
        assert_eq!(body["fields"][0]["error"], "must not be empty");

        let body = serde_json::to_value(ApiError::not_found("home not found").to_body()).unwrap();
        assert_eq!(body["error"], "home not found");
        assert!(body.get("fields").is_none());
    }
}
