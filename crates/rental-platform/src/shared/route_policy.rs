//! Route Policy
//!
//! Declares which routes require a bearer token and which roles may call them.
//! The request authorizer consults this table before anything reaches a handler.

use axum::http::Method;
use std::collections::HashMap;

use crate::role::Role;

/// Access requirement for a single route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRule {
    /// Forwarded without looking at credentials.
    Public,
    /// Any valid, non-revoked token.
    Authenticated,
    /// Valid token whose role claims include at least one of these roles.
    AnyRole(Vec<Role>),
}

impl AccessRule {
    pub fn is_protected(&self) -> bool {
        !matches!(self, AccessRule::Public)
    }

    /// Whether a caller holding `roles` passes the role gate.
    pub fn permits(&self, roles: &[Role]) -> bool {
        match self {
            AccessRule::Public | AccessRule::Authenticated => true,
            AccessRule::AnyRole(required) => roles.iter().any(|r| required.contains(r)),
        }
    }
}

/// Method + path keyed access table. Routes not listed are public.
#[derive(Debug, Clone, Default)]
pub struct RoutePolicy {
    rules: HashMap<(Method, String), AccessRule>,
}

impl RoutePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, method: Method, path: impl Into<String>, rule: AccessRule) -> Self {
        self.rules.insert((method, path.into()), rule);
        self
    }

    pub fn rule_for(&self, method: &Method, path: &str) -> &AccessRule {
        self.rules
            .get(&(method.clone(), path.to_string()))
            .unwrap_or(&AccessRule::Public)
    }

    /// Access rules of the `/account` endpoints.
    pub fn account_defaults() -> Self {
        let managers = AccessRule::AnyRole(vec![Role::Admin, Role::Staff]);

        Self::new()
            .route(Method::POST, "/account/register", managers.clone())
            .route(Method::POST, "/account/login", AccessRule::Public)
            .route(Method::POST, "/account/logout", AccessRule::Authenticated)
            .route(Method::POST, "/account/assign-role", AccessRule::Authenticated)
            .route(Method::POST, "/account/reject-roles", managers)
            .route(
                Method::POST,
                "/account/change-user-role",
                AccessRule::AnyRole(vec![Role::Admin]),
            )
    }
}
