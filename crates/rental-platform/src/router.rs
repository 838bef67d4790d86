//! HTTP Router
//!
//! Assembles the `/account` endpoints behind the request authorizer and
//! collects their OpenAPI description.

use axum::Router;
use std::sync::Arc;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::auth::auth_api::{auth_router, AuthState};
use crate::auth::{AuthService, PasswordService, RevokedTokenRepository};
use crate::principal::{account_router, AccountState, PrincipalRepository};
use crate::shared::middleware::{AuthorizerState, RequestAuthorizerLayer};
use crate::shared::route_policy::RoutePolicy;
use crate::store::StoreRepository;
use crate::usecase::UnitOfWork;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rental Store Access API",
        version = "0.1.0",
        description = "Registration, login/logout and role management for the rental store"
    ),
    tags(
        (name = "account", description = "Accounts, credentials and roles")
    )
)]
pub struct ApiDoc;

/// Everything the account endpoints and the authorizer share.
#[derive(Clone)]
pub struct PlatformState {
    pub principals: Arc<dyn PrincipalRepository>,
    pub stores: Arc<dyn StoreRepository>,
    pub revoked_tokens: Arc<dyn RevokedTokenRepository>,
    pub unit_of_work: Arc<dyn UnitOfWork>,
    pub auth_service: Arc<AuthService>,
    pub password_service: Arc<PasswordService>,
    pub policy: Arc<RoutePolicy>,
}

impl PlatformState {
    fn account_state(&self) -> AccountState {
        AccountState {
            principals: self.principals.clone(),
            stores: self.stores.clone(),
            password_service: self.password_service.clone(),
            unit_of_work: self.unit_of_work.clone(),
        }
    }

    fn auth_state(&self) -> AuthState {
        AuthState {
            auth_service: self.auth_service.clone(),
            principals: self.principals.clone(),
            password_service: self.password_service.clone(),
            revoked_tokens: self.revoked_tokens.clone(),
        }
    }

    pub fn authorizer_state(&self) -> AuthorizerState {
        AuthorizerState {
            auth_service: self.auth_service.clone(),
            revoked_tokens: self.revoked_tokens.clone(),
            policy: self.policy.clone(),
        }
    }
}

/// Build the account router, already wrapped in the request authorizer, and its OpenAPI document.
pub fn build_router(state: PlatformState) -> (Router, utoipa::openapi::OpenApi) {
    let account = account_router(state.account_state()).merge(auth_router(state.auth_state()));

    let (router, mut openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/account", account)
        .split_for_parts();

    if let Some(components) = openapi.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }

    let router = router.layer(RequestAuthorizerLayer::new(state.authorizer_state()));
    (router, openapi)
}
