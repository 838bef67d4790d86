//! Audit Log Entity
//!
//! One entry per committed use case, written in the same transaction as the change.

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::tsid::TsidGenerator;
use crate::usecase::DomainEvent;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    #[serde(rename = "_id")]
    pub id: String,

    /// Entity type affected, e.g. "User"
    pub entity_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    /// Command type name, e.g. "AssignRoleCommand"
    pub operation: String,

    /// Command payload as JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_json: Option<String>,

    pub event_type: String,

    pub correlation_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub performed_at: DateTime<Utc>,
}

impl AuditLog {
    /// Build the entry for a committed event and the command that produced it.
    pub fn for_event<E: DomainEvent, C: Serialize>(event: &E, command: &C) -> Self {
        let operation = std::any::type_name::<C>()
            .rsplit("::")
            .next()
            .unwrap_or("Unknown")
            .to_string();

        let mut subject = event.subject().split('.');
        let entity_type = subject.nth(1).map(capitalize).unwrap_or_else(|| "Unknown".to_string());
        let entity_id = subject.next().map(String::from);

        Self {
            id: TsidGenerator::generate(),
            entity_type,
            entity_id,
            operation,
            operation_json: serde_json::to_string(command).ok(),
            event_type: event.event_type().to_string(),
            correlation_id: event.correlation_id().to_string(),
            principal_id: Some(event.principal_id().to_string()).filter(|p| !p.is_empty()),
            performed_at: event.time(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::{EventMetadata, ExecutionContext};

    #[derive(Serialize)]
    struct PromoteCommand {
        user_id: String,
    }

    #[derive(Serialize)]
    struct Promoted {
        metadata: EventMetadata,
    }

    crate::impl_domain_event!(Promoted);

    #[test]
    fn test_for_event() {
        let ctx = ExecutionContext::create("admin-1");
        let event = Promoted {
            metadata: EventMetadata::new(&ctx, "rental:iam:user:promoted", "rental:iam", "iam.user.0ABC".to_string()),
        };
        let command = PromoteCommand { user_id: "0ABC".to_string() };

        let log = AuditLog::for_event(&event, &command);
        assert_eq!(log.entity_type, "User");
        assert_eq!(log.entity_id.as_deref(), Some("0ABC"));
        assert_eq!(log.operation, "PromoteCommand");
        assert_eq!(log.principal_id.as_deref(), Some("admin-1"));
        assert!(log.operation_json.unwrap().contains("0ABC"));
    }
}
