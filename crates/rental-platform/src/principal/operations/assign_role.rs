//! Assign Role Use Case
//!
//! Additive: the role joins the target's role set and nothing else changes.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::events::RoleAssigned;
use super::{load_manager_tier, load_principal, FAILED_TO_ASSIGN_ROLE, ROLE_DOES_NOT_EXIST, USER_NOT_FOUND};
use crate::principal::PrincipalRepository;
use crate::role::Role;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleCommand {
    pub user_id: String,
    /// Numeric role id as sent by the client
    pub role_id: String,
}

pub struct AssignRoleUseCase {
    principals: Arc<dyn PrincipalRepository>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl AssignRoleUseCase {
    pub fn new(principals: Arc<dyn PrincipalRepository>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self { principals, unit_of_work }
    }

    pub async fn execute(&self, command: AssignRoleCommand, ctx: ExecutionContext) -> UseCaseResult<RoleAssigned> {
        let mut target = match load_principal(self.principals.as_ref(), &command.user_id, USER_NOT_FOUND).await {
            Ok(p) => p,
            Err(e) => return UseCaseResult::failure(e),
        };

        let caller_tier = match load_manager_tier(self.principals.as_ref(), &ctx.principal_id).await {
            Ok(tier) => tier,
            Err(e) => return UseCaseResult::failure(e),
        };

        let Some(role) = Role::parse_id(&command.role_id) else {
            return UseCaseResult::failure(UseCaseError::validation("ROLE_NOT_FOUND", ROLE_DOES_NOT_EXIST));
        };

        if !caller_tier.may_grant(role) {
            return UseCaseResult::failure(UseCaseError::authorization("ROLE_GRANT_DENIED", FAILED_TO_ASSIGN_ROLE));
        }

        target.add_role(role);

        info!(
            principal_id = %target.id,
            role = %role,
            caller_id = %ctx.principal_id,
            "Assigning role"
        );

        let event = RoleAssigned::new(&ctx, &target, role);
        self.unit_of_work.commit(&target, event, &command).await
    }
}
