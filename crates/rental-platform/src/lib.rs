//! Rental Store Access Core
//!
//! Credential issuing and revocation, per-request authorization and the
//! role transition rules of the rental store backend.
//!
//! Domain modules:
//! - `role` - the closed Customer/Staff/Admin role set and its capability table
//! - `principal` - store users, their repository and role transition use cases
//! - `store` - stores and the store-manager invariant
//! - `auth` - token issuing/validation, password hashing and the revocation store
//! - `audit` - audit log entries written alongside every role mutation
//!
//! Infrastructure:
//! - `usecase` - use case result/error types, execution context and unit of work
//! - `shared` - errors, ids, route policy and the request authorizer middleware

pub mod audit;
pub mod auth;
pub mod principal;
pub mod role;
pub mod router;
pub mod shared;
pub mod store;
pub mod usecase;

pub use audit::AuditLog;
pub use auth::{
    AccessTokenClaims, AuthService, InMemoryRevokedTokenRepository, MongoRevokedTokenRepository,
    PasswordService, RevokedToken, RevokedTokenRepository,
};
pub use principal::{
    InMemoryPrincipalRepository, MongoPrincipalRepository, Principal, PrincipalRepository,
};
pub use role::Role;
pub use router::{build_router, ApiDoc, PlatformState};
pub use shared::error::{PlatformError, Result};
pub use shared::middleware::{Authenticated, CallerContext, RequestAuthorizerLayer};
pub use shared::route_policy::{AccessRule, RoutePolicy};
pub use shared::tsid::TsidGenerator;
pub use store::{InMemoryStoreRepository, MongoStoreRepository, Store, StoreRepository};
pub use usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};
