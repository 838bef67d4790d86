//! Request Authorizer
//!
//! Tower middleware that gates every protected route:
//! 1. look up the route's [`AccessRule`]; public routes pass straight through
//! 2. take the bearer token from `Authorization` (last space-separated segment)
//! 3. refuse tokens present in the revocation store
//! 4. validate the JWT, apply the route's role gate and attach a [`CallerContext`]

use axum::{
    async_trait,
    extract::{FromRequestParts, MatchedPath},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, TimeZone, Utc};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, error};

use crate::auth::auth_service::{extract_bearer_token, AccessTokenClaims, AuthService};
use crate::auth::RevokedTokenRepository;
use crate::role::Role;
use crate::shared::route_policy::{AccessRule, RoutePolicy};

pub const INVALID_TOKEN: &str = "Invalid token";
pub const TOKEN_BLACKLISTED: &str = "Token is blacklisted";
pub const INSUFFICIENT_PERMISSIONS: &str = "Insufficient permissions";

/// Identity of the caller, attached to the request once authorization succeeds.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub principal_id: String,
    pub email: String,
    pub roles: Vec<Role>,
    /// The raw bearer token, needed to revoke it on logout.
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl CallerContext {
    pub fn from_claims(claims: &AccessTokenClaims, token: &str) -> Self {
        Self {
            principal_id: claims.sub.clone(),
            email: claims.email.clone(),
            roles: claims.roles(),
            token: token.to_string(),
            expires_at: Utc.timestamp_opt(claims.exp, 0).single().unwrap_or_else(Utc::now),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Authorizer rejection, rendered as a plain text body.
#[derive(Debug)]
pub struct AuthError {
    pub status: StatusCode,
    pub message: String,
}

impl AuthError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn invalid_token() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, INVALID_TOKEN)
    }

    pub fn blacklisted() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, TOKEN_BLACKLISTED)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

/// Extracts the [`CallerContext`] placed by [`RequestAuthorizerLayer`].
pub struct Authenticated(pub CallerContext);

impl std::ops::Deref for Authenticated {
    type Target = CallerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerContext>()
            .cloned()
            .map(Authenticated)
            .ok_or_else(AuthError::invalid_token)
    }
}

/// Shared services the authorizer needs on every request.
#[derive(Clone)]
pub struct AuthorizerState {
    pub auth_service: Arc<AuthService>,
    pub revoked_tokens: Arc<dyn RevokedTokenRepository>,
    pub policy: Arc<RoutePolicy>,
}

impl AuthorizerState {
    /// Run steps 2-4 for a protected route.
    pub async fn authorize(&self, headers: &HeaderMap, rule: &AccessRule) -> Result<CallerContext, AuthError> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(AuthError::invalid_token)?;

        // No caching: a revocation must take effect on the very next request.
        match self.revoked_tokens.contains(token).await {
            Ok(false) => {}
            Ok(true) => {
                debug!("Rejected revoked token");
                return Err(AuthError::blacklisted());
            }
            Err(e) => {
                error!(error = %e, "Revocation lookup failed");
                return Err(AuthError::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Authorization temporarily unavailable",
                ));
            }
        }

        let claims = self
            .auth_service
            .validate_token(token)
            .map_err(|e| AuthError::new(StatusCode::UNAUTHORIZED, e.to_string()))?;

        let caller = CallerContext::from_claims(&claims, token);
        if !rule.permits(&caller.roles) {
            debug!(principal_id = %caller.principal_id, "Role gate refused caller");
            return Err(AuthError::new(StatusCode::FORBIDDEN, INSUFFICIENT_PERMISSIONS));
        }

        Ok(caller)
    }
}

#[derive(Clone)]
pub struct RequestAuthorizerLayer {
    state: AuthorizerState,
}

impl RequestAuthorizerLayer {
    pub fn new(state: AuthorizerState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for RequestAuthorizerLayer {
    type Service = RequestAuthorizer<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestAuthorizer {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RequestAuthorizer<S> {
    inner: S,
    state: AuthorizerState,
}

impl<S, B> Service<Request<B>> for RequestAuthorizer<S>
where
    S: Service<Request<B>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        // The readied service goes into the future; a fresh clone stays behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let state = self.state.clone();

        Box::pin(async move {
            let path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|p| p.as_str().to_string())
                .unwrap_or_else(|| req.uri().path().to_string());
            let rule = state.policy.rule_for(req.method(), &path).clone();

            if !rule.is_protected() {
                return inner.call(req).await;
            }

            match state.authorize(req.headers(), &rule).await {
                Ok(caller) => {
                    req.extensions_mut().insert(caller);
                    inner.call(req).await
                }
                Err(rejection) => Ok(rejection.into_response()),
            }
        })
    }
}
