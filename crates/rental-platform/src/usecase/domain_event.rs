//! Domain Event Trait
//!
//! Events describe what happened, in past tense (`RoleAssigned`, not `AssignRole`).
//! Event types follow `{app}:{domain}:{aggregate}:{action}`, e.g.
//! `rental:iam:user:role-assigned`. Subjects are `{domain}.{aggregate}.{id}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::execution_context::ExecutionContext;
use crate::shared::tsid::TsidGenerator;

pub trait DomainEvent: Send + Sync {
    fn event_id(&self) -> &str;

    fn event_type(&self) -> &str;

    fn source(&self) -> &str;

    /// Qualified aggregate identifier: `{domain}.{aggregate}.{id}`
    fn subject(&self) -> &str;

    fn time(&self) -> DateTime<Utc>;

    fn execution_id(&self) -> &str;

    fn correlation_id(&self) -> &str;

    /// Principal who initiated the action.
    fn principal_id(&self) -> &str;

    /// Event-specific payload as JSON.
    fn to_data_json(&self) -> String;
}

/// Fields shared by every event. Event structs embed this and implement
/// [`DomainEvent`] through `impl_domain_event!`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    pub event_id: String,
    pub event_type: String,
    pub source: String,
    pub subject: String,
    pub time: DateTime<Utc>,
    pub execution_id: String,
    pub correlation_id: String,
    pub principal_id: String,
}

impl EventMetadata {
    pub fn new(ctx: &ExecutionContext, event_type: &str, source: &str, subject: String) -> Self {
        Self {
            event_id: TsidGenerator::generate(),
            event_type: event_type.to_string(),
            source: source.to_string(),
            subject,
            time: Utc::now(),
            execution_id: ctx.execution_id.clone(),
            correlation_id: ctx.correlation_id.clone(),
            principal_id: ctx.principal_id.clone(),
        }
    }
}

/// Implement [`DomainEvent`] for a struct with a `metadata: EventMetadata` field.
#[macro_export]
macro_rules! impl_domain_event {
    ($event_type:ty) => {
        impl $crate::usecase::DomainEvent for $event_type {
            fn event_id(&self) -> &str {
                &self.metadata.event_id
            }

            fn event_type(&self) -> &str {
                &self.metadata.event_type
            }

            fn source(&self) -> &str {
                &self.metadata.source
            }

            fn subject(&self) -> &str {
                &self.metadata.subject
            }

            fn time(&self) -> chrono::DateTime<chrono::Utc> {
                self.metadata.time
            }

            fn execution_id(&self) -> &str {
                &self.metadata.execution_id
            }

            fn correlation_id(&self) -> &str {
                &self.metadata.correlation_id
            }

            fn principal_id(&self) -> &str {
                &self.metadata.principal_id
            }

            fn to_data_json(&self) -> String {
                serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
            }
        }
    };
}
