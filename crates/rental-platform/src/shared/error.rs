//! Platform Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use utoipa::ToSchema;

use crate::usecase::UseCaseError;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("{message}")]
    NotFound { message: String },

    #[error("{entity_type} with {field} '{value}' already exists")]
    Duplicate { entity_type: String, field: String, value: String },

    /// Bad request. `details` carries accumulated field messages when there are several.
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Forbidden { message: String },

    /// The entity was modified by a concurrent request.
    #[error("{message}")]
    Conflict { message: String },

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bson::de::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn duplicate(entity_type: impl Into<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type: entity_type.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into(), details: None }
    }

    /// Bad request carrying every failed rule, in rule order.
    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self::Validation {
            message: errors.join(" "),
            details: Some(serde_json::json!({ "errors": errors })),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PlatformError::NotFound { .. } => StatusCode::NOT_FOUND,
            PlatformError::Duplicate { .. } | PlatformError::Conflict { .. } => StatusCode::CONFLICT,
            PlatformError::Validation { .. } => StatusCode::BAD_REQUEST,
            PlatformError::InvalidCredentials => StatusCode::BAD_REQUEST,
            PlatformError::Unauthorized { .. }
            | PlatformError::TokenExpired
            | PlatformError::InvalidToken { .. } => StatusCode::UNAUTHORIZED,
            PlatformError::Forbidden { .. } => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            PlatformError::NotFound { .. } => "NOT_FOUND",
            PlatformError::Duplicate { .. } => "DUPLICATE",
            PlatformError::Validation { .. } => "VALIDATION_ERROR",
            PlatformError::Unauthorized { .. } => "UNAUTHORIZED",
            PlatformError::Forbidden { .. } => "FORBIDDEN",
            PlatformError::Conflict { .. } => "CONFLICT",
            PlatformError::InvalidCredentials => "INVALID_CREDENTIALS",
            PlatformError::TokenExpired => "TOKEN_EXPIRED",
            PlatformError::InvalidToken { .. } => "INVALID_TOKEN",
            PlatformError::Configuration { .. } => "CONFIGURATION_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Error response body
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Failed logins answer with a bare 400 so nothing about the account leaks.
        if matches!(self, PlatformError::InvalidCredentials) {
            return status.into_response();
        }

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let error = self.error_code().to_string();
        let message = self.to_string();
        let details = match self {
            PlatformError::Validation { details, .. } => details,
            _ => None,
        };

        (status, Json(ErrorResponse { error, message, details })).into_response()
    }
}

impl From<UseCaseError> for PlatformError {
    fn from(err: UseCaseError) -> Self {
        match err {
            UseCaseError::ValidationError { message, details, .. } => PlatformError::Validation {
                message,
                details: if details.is_empty() {
                    None
                } else {
                    serde_json::to_value(details).ok()
                },
            },
            UseCaseError::BusinessRuleViolation { message, .. } => PlatformError::validation(message),
            UseCaseError::AuthorizationError { message, .. } => PlatformError::Forbidden { message },
            UseCaseError::NotFoundError { message, .. } => PlatformError::NotFound { message },
            UseCaseError::ConcurrencyError { message, .. } => PlatformError::Conflict { message },
            UseCaseError::CommitError { message, .. } => PlatformError::Internal { message },
        }
    }
}
