//! Authentication
//!
//! - `auth_service` - issues and validates the 15 minute bearer tokens
//! - `password_service` - Argon2id hashing and the password policy
//! - `revoked_token_repository` - the revocation store consulted on every protected request
//! - `auth_api` - login and logout endpoints

pub mod auth_api;
pub mod auth_service;
pub mod password_service;
pub mod revoked_token;
pub mod revoked_token_repository;

pub use auth_service::{extract_bearer_token, AccessTokenClaims, AuthConfig, AuthService, ACCESS_TOKEN_TTL_SECS};
pub use password_service::{Argon2Config, PasswordPolicy, PasswordService};
pub use revoked_token::RevokedToken;
pub use revoked_token_repository::{
    InMemoryRevokedTokenRepository, MongoRevokedTokenRepository, RevokedTokenRepository,
};
