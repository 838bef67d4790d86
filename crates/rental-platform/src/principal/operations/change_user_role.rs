//! Change User Role Use Case
//!
//! Replaces the whole role set with a single role. Only admins reach this
//! use case; the route policy enforces that before the handler runs.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::events::UserRoleChanged;
use super::{load_principal, ROLE_DOES_NOT_EXIST, USER_NOT_FOUND};
use crate::principal::PrincipalRepository;
use crate::role::Role;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeUserRoleCommand {
    pub user_id: String,
    pub role_id: String,
}

pub struct ChangeUserRoleUseCase {
    principals: Arc<dyn PrincipalRepository>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl ChangeUserRoleUseCase {
    pub fn new(principals: Arc<dyn PrincipalRepository>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self { principals, unit_of_work }
    }

    pub async fn execute(
        &self,
        command: ChangeUserRoleCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<UserRoleChanged> {
        let mut target = match load_principal(self.principals.as_ref(), &command.user_id, USER_NOT_FOUND).await {
            Ok(p) => p,
            Err(e) => return UseCaseResult::failure(e),
        };

        let Some(role) = Role::parse_id(&command.role_id) else {
            return UseCaseResult::failure(UseCaseError::validation("ROLE_NOT_FOUND", ROLE_DOES_NOT_EXIST));
        };

        let had_store = target.store_id.is_some();
        let previous: Vec<Role> = target.replace_roles(role).into_iter().collect();
        let store_cleared = had_store && target.store_id.is_none();

        info!(
            principal_id = %target.id,
            role = %role,
            store_cleared,
            caller_id = %ctx.principal_id,
            "Changing user role"
        );

        let event = UserRoleChanged::new(&ctx, &target, previous, role, store_cleared);
        self.unit_of_work.commit(&target, event, &command).await
    }
}
