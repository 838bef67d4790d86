//! Authentication Service
//!
//! Issues and validates signed access tokens.
//! HS256 with a shared secret, or RS256 when a PEM key pair is configured.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::info;

use crate::principal::Principal;
use crate::role::Role;
use crate::shared::error::{PlatformError, Result};
use crate::shared::tsid::TsidGenerator;

/// Access tokens live for 15 minutes. There are no refresh tokens.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// JWT claims of an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (principal ID)
    pub sub: String,

    pub email: String,

    /// One entry per role held when the token was issued
    #[serde(default)]
    pub role: Vec<String>,

    pub iss: String,

    pub aud: String,

    pub iat: i64,

    pub nbf: i64,

    pub exp: i64,

    /// JWT ID, unique per issued token
    pub jti: String,
}

impl AccessTokenClaims {
    /// Role claims that name a known role; unknown names are ignored.
    pub fn roles(&self) -> Vec<Role> {
        self.role.iter().filter_map(|r| Role::from_name(r)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret for HS256
    pub signing_key: Option<String>,

    /// RSA private key PEM content (RS256); takes precedence over `signing_key`
    pub rsa_private_key: Option<String>,

    /// RSA public key PEM content (RS256)
    pub rsa_public_key: Option<String>,

    pub issuer: String,

    pub audience: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_key: None,
            rsa_private_key: None,
            rsa_public_key: None,
            issuer: "rental-store".to_string(),
            audience: "rental-store".to_string(),
        }
    }
}

impl AuthConfig {
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.signing_key = Some(secret.into()).filter(|s: &String| !s.is_empty());
        self
    }

    /// Read the RS256 key pair from PEM files.
    pub fn with_rsa_key_files(mut self, private_key_path: &str, public_key_path: &str) -> Result<Self> {
        let read = |path: &str| {
            fs::read_to_string(path).map_err(|e| {
                PlatformError::configuration(format!("Cannot read JWT key file '{}': {}", path, e))
            })
        };
        self.rsa_private_key = Some(read(private_key_path)?);
        self.rsa_public_key = Some(read(public_key_path)?);
        info!(private_key_path, public_key_path, "Loaded JWT key pair");
        Ok(self)
    }
}

pub struct AuthService {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl AuthService {
    /// RS256 when both PEM keys are present, otherwise HS256 from the secret.
    /// Fails when neither is configured.
    pub fn new(config: AuthConfig) -> Result<Self> {
        if let (Some(private_key), Some(public_key)) = (&config.rsa_private_key, &config.rsa_public_key) {
            let (private_key, public_key) = (private_key.clone(), public_key.clone());
            return Self::new_with_rsa(config, &private_key, &public_key);
        }

        match config.signing_key.clone() {
            Some(secret) if !secret.is_empty() => Ok(Self::new_with_secret(config, &secret)),
            _ => Err(PlatformError::configuration(
                "No JWT signing key configured: set a signing secret or an RSA key pair",
            )),
        }
    }

    fn new_with_rsa(config: AuthConfig, private_key_pem: &str, public_key_pem: &str) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| PlatformError::configuration(format!("Invalid RSA private key: {}", e)))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| PlatformError::configuration(format!("Invalid RSA public key: {}", e)))?;

        info!("AuthService initialized with RS256");

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
            algorithm: Algorithm::RS256,
        })
    }

    fn new_with_secret(config: AuthConfig, secret: &str) -> Self {
        info!("AuthService initialized with HS256");

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            config,
            algorithm: Algorithm::HS256,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Issue a token for a subject. `iat` is now and `exp` is `iat + 15 min`.
    pub fn issue_token(&self, subject: &str, email: &str, roles: &[Role]) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(ACCESS_TOKEN_TTL_SECS);

        let claims = AccessTokenClaims {
            sub: subject.to_string(),
            email: email.to_string(),
            role: roles.iter().map(|r| r.name().to_string()).collect(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: exp.timestamp(),
            jti: TsidGenerator::generate(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| PlatformError::internal(format!("Failed to encode JWT: {}", e)))
    }

    /// Issue a token carrying the principal's current roles.
    pub fn issue_for(&self, principal: &Principal) -> Result<String> {
        self.issue_token(&principal.id, &principal.email, &principal.role_list())
    }

    /// Check signature, issuer, audience, expiry and not-before.
    pub fn validate_token(&self, token: &str) -> Result<AccessTokenClaims> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.validate_nbf = true;

        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => PlatformError::TokenExpired,
                _ => PlatformError::InvalidToken { message: e.to_string() },
            })
    }
}

/// Token part of an `Authorization` header value: its last space-separated segment.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.split(' ').last().filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(AuthConfig::default().with_secret("test-secret-key-for-unit-tests")).unwrap()
    }

    #[test]
    fn test_issue_and_validate() {
        let service = service();
        let token = service
            .issue_token("0HZXEQ5Y8JY5Z", "staff@example.com", &[Role::Staff])
            .unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "0HZXEQ5Y8JY5Z");
        assert_eq!(claims.email, "staff@example.com");
        assert_eq!(claims.role, vec!["Staff".to_string()]);
        assert_eq!(claims.roles(), vec![Role::Staff]);
        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(claims.iss, "rental-store");
    }

    #[test]
    fn test_one_role_claim_per_role() {
        let service = service();
        let token = service
            .issue_token("id", "a@example.com", &[Role::Customer, Role::Admin])
            .unwrap();
        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.role, vec!["Customer".to_string(), "Admin".to_string()]);
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let result = AuthService::new(AuthConfig::default());
        assert!(matches!(result, Err(PlatformError::Configuration { .. })));

        let result = AuthService::new(AuthConfig::default().with_secret(""));
        assert!(matches!(result, Err(PlatformError::Configuration { .. })));
    }

    #[test]
    fn test_invalid_rsa_pem_is_configuration_error() {
        let config = AuthConfig {
            rsa_private_key: Some("not a pem".to_string()),
            rsa_public_key: Some("not a pem".to_string()),
            ..AuthConfig::default()
        };
        assert!(matches!(AuthService::new(config), Err(PlatformError::Configuration { .. })));
    }

    #[test]
    fn test_rejects_foreign_signature_and_audience() {
        let issuer = service();
        let token = issuer.issue_token("id", "a@example.com", &[Role::Customer]).unwrap();

        let other_key = AuthService::new(AuthConfig::default().with_secret("another-secret")).unwrap();
        assert!(matches!(other_key.validate_token(&token), Err(PlatformError::InvalidToken { .. })));

        let other_audience = AuthService::new(AuthConfig {
            audience: "someone-else".to_string(),
            ..AuthConfig::default().with_secret("test-secret-key-for-unit-tests")
        })
        .unwrap();
        assert!(other_audience.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let service = service();
        let past = Utc::now() - Duration::hours(1);
        let claims = AccessTokenClaims {
            sub: "id".to_string(),
            email: "a@example.com".to_string(),
            role: vec![],
            iss: "rental-store".to_string(),
            aud: "rental-store".to_string(),
            iat: past.timestamp(),
            nbf: past.timestamp(),
            exp: (past + Duration::seconds(ACCESS_TOKEN_TTL_SECS)).timestamp(),
            jti: "jti".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key-for-unit-tests"),
        )
        .unwrap();

        assert!(matches!(service.validate_token(&token), Err(PlatformError::TokenExpired)));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token(""), None);
    }
}
