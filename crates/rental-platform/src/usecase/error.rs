//! Use Case Errors
//!
//! Errors are categorized so every failure maps to one HTTP status:
//!
//! ```ignore
//! UseCaseError::not_found("USER_NOT_FOUND", "User not found");
//! UseCaseError::validation_with_details(
//!     "INVALID_REGISTRATION",
//!     "Username is required.",
//!     details! { "errors" => errors },
//! );
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Build an error detail map.
#[macro_export]
macro_rules! details {
    () => {
        std::collections::HashMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = std::collections::HashMap::new();
        $(
            map.insert($key.to_string(), serde_json::json!($value));
        )+
        map
    }};
}

/// Categorized use case failure.
///
/// - `ValidationError` -> 400
/// - `BusinessRuleViolation` -> 400 (the request is well formed but cannot apply)
/// - `AuthorizationError` -> 403
/// - `NotFoundError` -> 404
/// - `ConcurrencyError` -> 409
/// - `CommitError` -> 500
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UseCaseError {
    ValidationError {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    BusinessRuleViolation {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    /// The caller's role does not allow the operation.
    AuthorizationError {
        code: String,
        message: String,
    },

    NotFoundError {
        code: String,
        message: String,
    },

    /// The entity changed after it was read; nothing was applied.
    ConcurrencyError {
        code: String,
        message: String,
    },

    /// Persistence failed; nothing was applied.
    CommitError {
        code: String,
        message: String,
    },
}

impl UseCaseError {
    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::validation_with_details(code, message, HashMap::new())
    }

    pub fn validation_with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self::ValidationError {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    pub fn business_rule(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::business_rule_with_details(code, message, HashMap::new())
    }

    pub fn business_rule_with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self::BusinessRuleViolation {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    pub fn authorization(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AuthorizationError {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFoundError {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn concurrency(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConcurrencyError {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn commit(message: impl Into<String>) -> Self {
        Self::CommitError {
            code: "COMMIT_FAILED".to_string(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::ValidationError { code, .. }
            | Self::BusinessRuleViolation { code, .. }
            | Self::AuthorizationError { code, .. }
            | Self::NotFoundError { code, .. }
            | Self::ConcurrencyError { code, .. }
            | Self::CommitError { code, .. } => code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::ValidationError { message, .. }
            | Self::BusinessRuleViolation { message, .. }
            | Self::AuthorizationError { message, .. }
            | Self::NotFoundError { message, .. }
            | Self::ConcurrencyError { message, .. }
            | Self::CommitError { message, .. } => message,
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::ValidationError { .. } | Self::BusinessRuleViolation { .. } => 400,
            Self::AuthorizationError { .. } => 403,
            Self::NotFoundError { .. } => 404,
            Self::ConcurrencyError { .. } => 409,
            Self::CommitError { .. } => 500,
        }
    }
}

impl std::fmt::Display for UseCaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

impl std::error::Error for UseCaseError {}
