//! Error types for CyberSentry services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - The `{success: false, error}` response envelope
//! - Error codes for client handling

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    ValidationError,
    MissingField,
    InvalidFormat,

    // Resource errors
    NotFound,
    ArticleNotFound,
    CaseNotFound,

    // Rate limiting
    RateLimited,
    RequestTimeout,

    // Database errors
    DatabaseError,
    ConnectionError,

    // External service errors
    GeoLookupError,
    StorageUploadError,

    // Internal errors
    ConfigurationError,

    // Service unavailable
    ServiceUnavailable,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Missing required fields: {}", .fields.join(", "))]
    MissingFields { fields: Vec<String> },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("News article not found: {id}")]
    ArticleNotFound { id: String },

    #[error("Fraud case not found: {id}")]
    CaseNotFound { id: String },

    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },

    #[error("Request timed out")]
    Timeout,

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // External service errors
    #[error("Geo lookup failed: {message}")]
    GeoLookup { message: String },

    #[error("Image upload failed: {message}")]
    StorageUpload { message: String },

    // Internal errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },
}

impl AppError {
    /// Build a missing-fields error from field names
    pub fn missing_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AppError::MissingFields {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::MissingFields { .. } => ErrorCode::MissingField,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::ArticleNotFound { .. } => ErrorCode::ArticleNotFound,
            AppError::CaseNotFound { .. } => ErrorCode::CaseNotFound,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::Timeout => ErrorCode::RequestTimeout,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::GeoLookup { .. } => ErrorCode::GeoLookupError,
            AppError::StorageUpload { .. } => ErrorCode::StorageUploadError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::ServiceUnavailable { .. } => ErrorCode::ServiceUnavailable,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } |
            AppError::MissingFields { .. } |
            AppError::InvalidFormat { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::NotFound { .. } |
            AppError::ArticleNotFound { .. } |
            AppError::CaseNotFound { .. } => StatusCode::NOT_FOUND,

            // 408 Request Timeout
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,

            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            AppError::Database(_) |
            AppError::DatabaseConnection { .. } |
            AppError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::GeoLookup { .. } |
            AppError::StorageUpload { .. } => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            AppError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Response envelope shared by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data) }
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let fields = match self {
            AppError::MissingFields { fields } => Some(fields),
            _ => None,
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code,
            fields,
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidFormat {
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidFormat {
            message: rejection.body_text(),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::DatabaseConnection {
            message: format!("Migration failed: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::ArticleNotFound { id: "test".into() };
        assert_eq!(err.code(), ErrorCode::ArticleNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_missing_fields_message_lists_every_field() {
        let err = AppError::missing_fields(["title", "summary", "author_name"]);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "Missing required fields: title, summary, author_name"
        );
        assert!(err.is_client_error());
    }

    #[test]
    fn test_timeout_is_client_error() {
        let err = AppError::Timeout;
        assert_eq!(err.status_code(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(err.code(), ErrorCode::RequestTimeout);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_server_error() {
        let err = AppError::DatabaseConnection {
            message: "connection refused".into()
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_server_error());
    }

    #[test]
    fn test_error_envelope_serialization() {
        let body = ErrorResponse {
            success: false,
            error: "Missing required fields: title".into(),
            code: ErrorCode::MissingField,
            fields: Some(vec!["title".into()]),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "MISSING_FIELD");
        assert_eq!(json["fields"][0], "title");
    }
}
