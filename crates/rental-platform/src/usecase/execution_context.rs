//! Execution Context
//!
//! Carries the acting principal and tracing ids through a use case so the
//! emitted event and its audit entry can be attributed.

use chrono::{DateTime, Utc};

use crate::shared::tsid::TsidGenerator;

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Unique id of this execution
    pub execution_id: String,
    /// Request-wide id, taken from `x-correlation-id` when the caller sends one
    pub correlation_id: String,
    /// Principal performing the action
    pub principal_id: String,
    pub initiated_at: DateTime<Utc>,
}

impl ExecutionContext {
    /// Fresh context; the correlation id starts as the execution id.
    pub fn create(principal_id: impl Into<String>) -> Self {
        let execution_id = format!("exec-{}", TsidGenerator::generate());
        Self {
            correlation_id: execution_id.clone(),
            execution_id,
            principal_id: principal_id.into(),
            initiated_at: Utc::now(),
        }
    }

    pub fn with_correlation(principal_id: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            ..Self::create(principal_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_context() {
        let ctx = ExecutionContext::create("user-123");
        assert!(ctx.execution_id.starts_with("exec-"));
        assert_eq!(ctx.correlation_id, ctx.execution_id);
        assert_eq!(ctx.principal_id, "user-123");
    }

    #[test]
    fn test_with_correlation() {
        let ctx = ExecutionContext::with_correlation("user-123", "corr-456");
        assert_eq!(ctx.correlation_id, "corr-456");
        assert_ne!(ctx.execution_id, "corr-456");
    }
}
