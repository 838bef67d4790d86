//! Account API Endpoints
//!
//! - POST /account/register - register a user with one role
//! - POST /account/assign-role?userId&roleId - add a role
//! - POST /account/reject-roles?userId&roleName - remove a role
//! - POST /account/change-user-role?userId&roleId - replace all roles with one
//!
//! Route-level role gates are applied by the request authorizer; the use
//! cases re-check the caller against a fresh read of the repository.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};

use super::operations::{
    AssignRoleCommand, AssignRoleUseCase, ChangeUserRoleCommand, ChangeUserRoleUseCase, RegisterUserCommand,
    RegisterUserUseCase, RejectRoleCommand, RejectRoleUseCase, ROLE_ASSIGNED,
};
use crate::auth::PasswordService;
use crate::principal::PrincipalRepository;
use crate::shared::api_common::MessageResponse;
use crate::shared::error::PlatformError;
use crate::shared::middleware::{Authenticated, CallerContext};
use crate::store::StoreRepository;
use crate::usecase::{ExecutionContext, UnitOfWork};

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct AccountState {
    pub principals: Arc<dyn PrincipalRepository>,
    pub stores: Arc<dyn StoreRepository>,
    pub password_service: Arc<PasswordService>,
    pub unit_of_work: Arc<dyn UnitOfWork>,
}

/// Query for the role id based endpoints
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserRoleIdQuery {
    /// Target user id
    #[serde(default)]
    pub user_id: String,
    /// Role id (1 Customer, 2 Staff, 3 Admin)
    #[serde(default)]
    pub role_id: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserRoleNameQuery {
    /// Target user id
    #[serde(default)]
    pub user_id: String,
    /// Role name: Customer, Staff or Admin
    #[serde(default)]
    pub role_name: String,
}

fn execution_context(caller: &CallerContext, headers: &HeaderMap) -> ExecutionContext {
    match headers.get(CORRELATION_ID_HEADER).and_then(|v| v.to_str().ok()) {
        Some(correlation_id) if !correlation_id.is_empty() => {
            ExecutionContext::with_correlation(&caller.principal_id, correlation_id)
        }
        _ => ExecutionContext::create(&caller.principal_id),
    }
}

/// Register a user
#[utoipa::path(
    post,
    path = "/register",
    tag = "account",
    operation_id = "postAccountRegister",
    request_body = RegisterUserCommand,
    responses(
        (status = 200, description = "User registered", body = MessageResponse),
        (status = 400, description = "Validation or identity errors"),
        (status = 403, description = "Caller is neither Admin nor Staff")
    ),
    security(("bearer_auth" = []))
)]
pub async fn register(
    State(state): State<AccountState>,
    auth: Authenticated,
    headers: HeaderMap,
    Json(command): Json<RegisterUserCommand>,
) -> Result<Json<MessageResponse>, PlatformError> {
    let ctx = execution_context(&auth, &headers);
    let use_case = RegisterUserUseCase::new(
        state.principals.clone(),
        state.stores.clone(),
        state.password_service.clone(),
        state.unit_of_work.clone(),
    );

    let event = use_case.execute(command, ctx).await.into_result()?;
    Ok(Json(MessageResponse::new(event.message())))
}

/// Assign a role
///
/// Adds the role to the user's role set. Staff callers may not grant Admin.
#[utoipa::path(
    post,
    path = "/assign-role",
    tag = "account",
    operation_id = "postAccountAssignRole",
    params(UserRoleIdQuery),
    responses(
        (status = 200, description = "Role assigned", body = MessageResponse),
        (status = 400, description = "Role does not exist"),
        (status = 403, description = "Caller may not grant this role"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn assign_role(
    State(state): State<AccountState>,
    auth: Authenticated,
    headers: HeaderMap,
    Query(query): Query<UserRoleIdQuery>,
) -> Result<Json<MessageResponse>, PlatformError> {
    let ctx = execution_context(&auth, &headers);
    let command = AssignRoleCommand {
        user_id: query.user_id,
        role_id: query.role_id,
    };

    AssignRoleUseCase::new(state.principals.clone(), state.unit_of_work.clone())
        .execute(command, ctx)
        .await
        .into_result()?;

    Ok(Json(MessageResponse::new(ROLE_ASSIGNED)))
}

/// Reject a role
///
/// Removes the role; removing Staff also unlinks the user's store.
#[utoipa::path(
    post,
    path = "/reject-roles",
    tag = "account",
    operation_id = "postAccountRejectRoles",
    params(UserRoleNameQuery),
    responses(
        (status = 200, description = "Role rejected", body = MessageResponse),
        (status = 400, description = "Unknown role or role not held"),
        (status = 403, description = "Caller may not revoke this role"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn reject_roles(
    State(state): State<AccountState>,
    auth: Authenticated,
    headers: HeaderMap,
    Query(query): Query<UserRoleNameQuery>,
) -> Result<Json<MessageResponse>, PlatformError> {
    let ctx = execution_context(&auth, &headers);
    let command = RejectRoleCommand {
        user_id: query.user_id,
        role_name: query.role_name,
    };

    let event = RejectRoleUseCase::new(state.principals.clone(), state.unit_of_work.clone())
        .execute(command, ctx)
        .await
        .into_result()?;

    Ok(Json(MessageResponse::new(event.message())))
}

/// Change a user's role
///
/// Replaces every role the user holds with the given one. Admin only.
#[utoipa::path(
    post,
    path = "/change-user-role",
    tag = "account",
    operation_id = "postAccountChangeUserRole",
    params(UserRoleIdQuery),
    responses(
        (status = 200, description = "Role changed", body = MessageResponse),
        (status = 400, description = "Role does not exist"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_user_role(
    State(state): State<AccountState>,
    auth: Authenticated,
    headers: HeaderMap,
    Query(query): Query<UserRoleIdQuery>,
) -> Result<Json<MessageResponse>, PlatformError> {
    let ctx = execution_context(&auth, &headers);
    let command = ChangeUserRoleCommand {
        user_id: query.user_id,
        role_id: query.role_id,
    };

    ChangeUserRoleUseCase::new(state.principals.clone(), state.unit_of_work.clone())
        .execute(command, ctx)
        .await
        .into_result()?;

    Ok(Json(MessageResponse::new(ROLE_ASSIGNED)))
}

pub fn account_router(state: AccountState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(assign_role))
        .routes(routes!(reject_roles))
        .routes(routes!(change_user_role))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use chrono::Utc;

    fn caller() -> CallerContext {
        CallerContext {
            principal_id: "admin-1".to_string(),
            email: "admin@rental.test".to_string(),
            roles: vec![Role::Admin],
            token: "t".to_string(),
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn test_execution_context_uses_correlation_header() {
        let mut headers = HeaderMap::new();
        headers.insert(CORRELATION_ID_HEADER, "corr-9".parse().unwrap());

        let ctx = execution_context(&caller(), &headers);
        assert_eq!(ctx.correlation_id, "corr-9");
        assert_eq!(ctx.principal_id, "admin-1");

        let ctx = execution_context(&caller(), &HeaderMap::new());
        assert_eq!(ctx.correlation_id, ctx.execution_id);
    }
}
