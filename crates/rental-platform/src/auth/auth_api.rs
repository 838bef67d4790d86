//! Auth API Endpoints
//!
//! - POST /account/login - email and password login, returns a bearer token
//! - POST /account/logout - revokes the presented token

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::auth::{AuthService, PasswordService, RevokedTokenRepository};
use crate::principal::PrincipalRepository;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Signed bearer token, valid for 15 minutes
    #[serde(rename = "jwtToken")]
    pub jwt_token: String,
}

#[derive(Clone)]
pub struct AuthState {
    pub auth_service: Arc<AuthService>,
    pub principals: Arc<dyn PrincipalRepository>,
    pub password_service: Arc<PasswordService>,
    pub revoked_tokens: Arc<dyn RevokedTokenRepository>,
}

/// Login with email and password
///
/// A missing body, an unknown email and a wrong password all answer with the
/// same empty 400.
#[utoipa::path(
    post,
    path = "/login",
    tag = "account",
    operation_id = "postAccountLogin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AuthState>,
    body: Option<Json<LoginRequest>>,
) -> Result<Json<LoginResponse>, PlatformError> {
    let Json(req) = body.ok_or(PlatformError::InvalidCredentials)?;

    let principal = state
        .principals
        .find_by_email(&req.email)
        .await?
        .ok_or(PlatformError::InvalidCredentials)?;

    let password_valid = state
        .password_service
        .verify_password(&req.password, &principal.password_hash)
        .unwrap_or(false);

    if !password_valid {
        debug!(principal_id = %principal.id, "Password check failed");
        return Err(PlatformError::InvalidCredentials);
    }

    let jwt_token = state.auth_service.issue_for(&principal)?;
    info!(principal_id = %principal.id, "User logged in");

    Ok(Json(LoginResponse { jwt_token }))
}

/// Logout
///
/// Adds the presented token to the revocation store. Later requests carrying
/// it are refused even though the signature is still valid.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "account",
    operation_id = "postAccountLogout",
    responses(
        (status = 200, description = "Token revoked"),
        (status = 401, description = "Missing, invalid or already revoked token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout(
    State(state): State<AuthState>,
    auth: Authenticated,
) -> Result<impl IntoResponse, PlatformError> {
    state
        .revoked_tokens
        .add(&auth.token, Some(auth.expires_at))
        .await?;

    info!(principal_id = %auth.principal_id, "User logged out");
    Ok(StatusCode::OK)
}

pub fn auth_router(state: AuthState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(login))
        .routes(routes!(logout))
        .with_state(state)
}
