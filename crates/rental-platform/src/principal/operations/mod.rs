//! Principal Operations
//!
//! Registration and the role transition use cases. Every one of them reads the
//! caller and the target fresh from the repository and commits through the
//! unit of work.

pub mod assign_role;
pub mod change_user_role;
pub mod events;
pub mod register;
pub mod reject_role;

pub use assign_role::{AssignRoleCommand, AssignRoleUseCase};
pub use change_user_role::{ChangeUserRoleCommand, ChangeUserRoleUseCase};
pub use events::*;
pub use register::{RegisterUserCommand, RegisterUserUseCase};
pub use reject_role::{RejectRoleCommand, RejectRoleUseCase};

use crate::principal::{Principal, PrincipalRepository};
use crate::role::Role;
use crate::usecase::UseCaseError;

pub const USER_NOT_FOUND: &str = "User not found";
pub const INSUFFICIENT_PERMISSIONS: &str = "Insufficient permissions";
pub const ROLE_DOES_NOT_EXIST: &str = "Role does not exist";
pub const FAILED_TO_ASSIGN_ROLE: &str = "Failed to assign role to user";
pub const FAILED_TO_REVOKE_ROLE: &str = "Failed to revoke user`s role";
pub const ROLE_ASSIGNED: &str = "Role assigned successfully";

/// Load a principal or fail with `not_found_message`.
pub(crate) async fn load_principal(
    principals: &dyn PrincipalRepository,
    id: &str,
    not_found_message: &str,
) -> Result<Principal, UseCaseError> {
    match principals.find_by_id(id).await {
        Ok(Some(p)) => Ok(p),
        Ok(None) => Err(UseCaseError::not_found("USER_NOT_FOUND", not_found_message)),
        Err(e) => Err(UseCaseError::commit(format!("Failed to fetch user: {}", e))),
    }
}

/// Highest role the caller currently holds, provided it may manage roles.
pub(crate) async fn load_manager_tier(
    principals: &dyn PrincipalRepository,
    caller_id: &str,
) -> Result<Role, UseCaseError> {
    let caller = match principals.find_by_id(caller_id).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            return Err(UseCaseError::authorization("CALLER_NOT_FOUND", INSUFFICIENT_PERMISSIONS));
        }
        Err(e) => return Err(UseCaseError::commit(format!("Failed to fetch caller: {}", e))),
    };

    caller
        .highest_role()
        .filter(|r| r.can_manage_roles())
        .ok_or_else(|| UseCaseError::authorization("INSUFFICIENT_PERMISSIONS", INSUFFICIENT_PERMISSIONS))
}
