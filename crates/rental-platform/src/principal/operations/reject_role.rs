//! Reject Role Use Case
//!
//! Removes one role. Losing Staff also drops the store link, in the same commit.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::events::RoleRejected;
use super::{load_manager_tier, load_principal, FAILED_TO_REVOKE_ROLE, ROLE_DOES_NOT_EXIST, USER_NOT_FOUND};
use crate::principal::PrincipalRepository;
use crate::role::Role;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};

pub const STORE_CLEARED_AND_ROLE_REJECTED: &str = "User store was successfully updated. Role was rejected.";
pub const ROLE_REJECTED: &str = "User role was successfully rejected.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRoleCommand {
    pub user_id: String,
    pub role_name: String,
}

pub struct RejectRoleUseCase {
    principals: Arc<dyn PrincipalRepository>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl RejectRoleUseCase {
    pub fn new(principals: Arc<dyn PrincipalRepository>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self { principals, unit_of_work }
    }

    pub async fn execute(&self, command: RejectRoleCommand, ctx: ExecutionContext) -> UseCaseResult<RoleRejected> {
        let mut target = match load_principal(self.principals.as_ref(), &command.user_id, USER_NOT_FOUND).await {
            Ok(p) => p,
            Err(e) => return UseCaseResult::failure(e),
        };

        let caller_tier = match load_manager_tier(self.principals.as_ref(), &ctx.principal_id).await {
            Ok(tier) => tier,
            Err(e) => return UseCaseResult::failure(e),
        };

        let Some(role) = Role::from_name(&command.role_name) else {
            return UseCaseResult::failure(UseCaseError::validation("ROLE_NOT_FOUND", ROLE_DOES_NOT_EXIST));
        };

        if !caller_tier.may_revoke(role) {
            return UseCaseResult::failure(UseCaseError::authorization("ROLE_REVOKE_DENIED", FAILED_TO_REVOKE_ROLE));
        }

        let Some(store_cleared) = target.remove_role(role) else {
            return UseCaseResult::failure(UseCaseError::business_rule("ROLE_NOT_HELD", FAILED_TO_REVOKE_ROLE));
        };

        info!(
            principal_id = %target.id,
            role = %role,
            store_cleared,
            caller_id = %ctx.principal_id,
            "Rejecting role"
        );

        let event = RoleRejected::new(&ctx, &target, role, store_cleared);
        self.unit_of_work.commit(&target, event, &command).await
    }
}

impl RoleRejected {
    /// Response text for the caller.
    pub fn message(&self) -> &'static str {
        if self.store_cleared {
            STORE_CLEARED_AND_ROLE_REJECTED
        } else {
            ROLE_REJECTED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::operations::test_support::Fixture;

    fn command(user_id: &str, role_name: &str) -> RejectRoleCommand {
        RejectRoleCommand {
            user_id: user_id.to_string(),
            role_name: role_name.to_string(),
        }
    }

    fn use_case(fx: &Fixture) -> RejectRoleUseCase {
        RejectRoleUseCase::new(fx.principals(), fx.unit_of_work())
    }

    #[tokio::test]
    async fn test_rejecting_staff_clears_store() {
        let fx = Fixture::new();
        let admin = fx.add("admin", &[Role::Admin], None);
        let target = fx.add("sam", &[Role::Customer, Role::Staff], Some(2));

        let event = use_case(&fx)
            .execute(command(&target.id, "Staff"), ExecutionContext::create(&admin.id))
            .await
            .unwrap();

        assert!(event.store_cleared);
        assert_eq!(event.message(), STORE_CLEARED_AND_ROLE_REJECTED);

        let reloaded = fx.reload(&target.id).await;
        assert_eq!(reloaded.role_list(), vec![Role::Customer]);
        assert_eq!(reloaded.store_id, None);
    }

    #[tokio::test]
    async fn test_rejecting_customer_keeps_store() {
        let fx = Fixture::new();
        let admin = fx.add("admin", &[Role::Admin], None);
        let target = fx.add("ann", &[Role::Admin, Role::Customer], Some(3));

        let event = use_case(&fx)
            .execute(command(&target.id, "customer"), ExecutionContext::create(&admin.id))
            .await
            .unwrap();

        assert_eq!(event.message(), ROLE_REJECTED);
        let reloaded = fx.reload(&target.id).await;
        assert_eq!(reloaded.role_list(), vec![Role::Admin]);
        assert_eq!(reloaded.store_id, Some(3));
    }

    #[tokio::test]
    async fn test_staff_may_only_reject_customer() {
        let fx = Fixture::new();
        let staff = fx.add("staff", &[Role::Staff], Some(1));
        let target = fx.add("sam", &[Role::Customer, Role::Staff], Some(2));

        for role_name in ["Staff", "Admin"] {
            let err = use_case(&fx)
                .execute(command(&target.id, role_name), ExecutionContext::create(&staff.id))
                .await
                .unwrap_err();
            assert_eq!(err.http_status_code(), 403);
            assert_eq!(err.message(), FAILED_TO_REVOKE_ROLE);
        }

        let result = use_case(&fx)
            .execute(command(&target.id, "Customer"), ExecutionContext::create(&staff.id))
            .await;
        assert!(result.is_success());
        assert_eq!(fx.reload(&target.id).await.store_id, Some(2));
    }

    #[tokio::test]
    async fn test_role_not_held() {
        let fx = Fixture::new();
        let admin = fx.add("admin", &[Role::Admin], None);
        let target = fx.add("jane", &[Role::Customer], None);

        let err = use_case(&fx)
            .execute(command(&target.id, "Staff"), ExecutionContext::create(&admin.id))
            .await
            .unwrap_err();

        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.message(), FAILED_TO_REVOKE_ROLE);
        assert!(fx.uow.audit_logs().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_role_name() {
        let fx = Fixture::new();
        let admin = fx.add("admin", &[Role::Admin], None);
        let target = fx.add("jane", &[Role::Customer], None);

        let err = use_case(&fx)
            .execute(command(&target.id, "Manager"), ExecutionContext::create(&admin.id))
            .await
            .unwrap_err();
        assert_eq!(err.message(), ROLE_DOES_NOT_EXIST);
    }

    #[tokio::test]
    async fn test_unknown_target() {
        let fx = Fixture::new();
        let admin = fx.add("admin", &[Role::Admin], None);

        let err = use_case(&fx)
            .execute(command("missing", "Customer"), ExecutionContext::create(&admin.id))
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 404);
    }

    #[tokio::test]
    async fn test_overlapping_grant_cannot_restore_cleared_store() {
        use crate::principal::operations::{AssignRoleCommand, AssignRoleUseCase};

        let fx = Fixture::new();
        let admin = fx.add("admin", &[Role::Admin], None);
        let target = fx.add("sam", &[Role::Staff], Some(3));
        let reject = RejectRoleUseCase::new(fx.slow_principals(), fx.unit_of_work());
        let assign = AssignRoleUseCase::new(fx.slow_principals(), fx.unit_of_work());

        let grant = AssignRoleCommand {
            user_id: target.id.clone(),
            role_id: Role::Customer.id().to_string(),
        };
        let (rejected, granted) = tokio::join!(
            reject.execute(command(&target.id, "Staff"), ExecutionContext::create(&admin.id)),
            assign.execute(grant, ExecutionContext::create(&admin.id)),
        );

        let stored = fx.reload(&target.id).await;
        if rejected.is_success() {
            assert!(!stored.has_role(Role::Staff));
            assert_eq!(stored.store_id, None);
        } else {
            assert_eq!(rejected.unwrap_err().http_status_code(), 409);
            assert!(stored.has_role(Role::Staff));
            assert_eq!(stored.store_id, Some(3));
        }
        if granted.is_success() {
            assert!(stored.has_role(Role::Customer));
        } else {
            assert_eq!(granted.unwrap_err().http_status_code(), 409);
            assert!(!stored.has_role(Role::Customer));
        }
    }
}
