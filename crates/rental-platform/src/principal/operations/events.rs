//! Principal Domain Events

use serde::Serialize;

use crate::impl_domain_event;
use crate::principal::Principal;
use crate::role::Role;
use crate::usecase::{EventMetadata, ExecutionContext};

const SOURCE: &str = "rental:iam";

fn user_subject(principal_id: &str) -> String {
    format!("iam.user.{}", principal_id)
}

/// Event emitted when a new user is registered.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistered {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub principal_id: String,
    pub email: String,
    pub user_name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<i32>,
    /// Set when the requested role was unknown and Customer was used instead.
    pub role_defaulted: bool,
}

impl_domain_event!(UserRegistered);

impl UserRegistered {
    const EVENT_TYPE: &'static str = "rental:iam:user:registered";

    pub fn new(ctx: &ExecutionContext, principal: &Principal, role: Role, role_defaulted: bool) -> Self {
        Self {
            metadata: EventMetadata::new(ctx, Self::EVENT_TYPE, SOURCE, user_subject(&principal.id)),
            principal_id: principal.id.clone(),
            email: principal.email.clone(),
            user_name: principal.user_name.clone(),
            role,
            store_id: principal.store_id,
            role_defaulted,
        }
    }
}

/// Event emitted when a role is added to a user's role set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssigned {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub principal_id: String,
    pub role: Role,
    pub roles: Vec<Role>,
}

impl_domain_event!(RoleAssigned);

impl RoleAssigned {
    const EVENT_TYPE: &'static str = "rental:iam:user:role-assigned";

    pub fn new(ctx: &ExecutionContext, principal: &Principal, role: Role) -> Self {
        Self {
            metadata: EventMetadata::new(ctx, Self::EVENT_TYPE, SOURCE, user_subject(&principal.id)),
            principal_id: principal.id.clone(),
            role,
            roles: principal.role_list(),
        }
    }
}

/// Event emitted when a role is removed from a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRejected {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub principal_id: String,
    pub role: Role,
    pub roles: Vec<Role>,
    /// True when losing Staff also removed the store link.
    pub store_cleared: bool,
}

impl_domain_event!(RoleRejected);

impl RoleRejected {
    const EVENT_TYPE: &'static str = "rental:iam:user:role-rejected";

    pub fn new(ctx: &ExecutionContext, principal: &Principal, role: Role, store_cleared: bool) -> Self {
        Self {
            metadata: EventMetadata::new(ctx, Self::EVENT_TYPE, SOURCE, user_subject(&principal.id)),
            principal_id: principal.id.clone(),
            role,
            roles: principal.role_list(),
            store_cleared,
        }
    }
}

/// Event emitted when a user's role set is replaced by a single role.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRoleChanged {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub principal_id: String,
    pub previous_roles: Vec<Role>,
    pub role: Role,
    pub store_cleared: bool,
}

impl_domain_event!(UserRoleChanged);

impl UserRoleChanged {
    const EVENT_TYPE: &'static str = "rental:iam:user:role-changed";

    pub fn new(
        ctx: &ExecutionContext,
        principal: &Principal,
        previous_roles: Vec<Role>,
        role: Role,
        store_cleared: bool,
    ) -> Self {
        Self {
            metadata: EventMetadata::new(ctx, Self::EVENT_TYPE, SOURCE, user_subject(&principal.id)),
            principal_id: principal.id.clone(),
            previous_roles,
            role,
            store_cleared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::DomainEvent;

    #[test]
    fn test_role_assigned_event() {
        let ctx = ExecutionContext::create("admin-1");
        let p = Principal::new("jane", "jane@rental.test", "Jane", "Doe", "h")
            .with_role(Role::Customer)
            .with_role(Role::Staff);

        let event = RoleAssigned::new(&ctx, &p, Role::Staff);
        assert_eq!(event.event_type(), "rental:iam:user:role-assigned");
        assert_eq!(event.subject(), format!("iam.user.{}", p.id));
        assert_eq!(event.principal_id(), "admin-1");

        let json = event.to_data_json();
        assert!(json.contains("\"role\":\"Staff\""));
        assert!(json.contains("\"eventType\""));
    }
}
