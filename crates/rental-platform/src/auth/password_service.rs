//! Password Service
//!
//! Argon2id hashing plus the password policy applied at registration.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use tracing::debug;

use crate::shared::error::{PlatformError, Result};

pub const PASSWORD_REQUIRED: &str = "Password is required";
pub const PASSWORD_MIN_LENGTH: &str = "Password should contain more than 6 characters.";
pub const PASSWORD_NOT_STRONG: &str = "The password should be strong.";

/// Password policy configuration
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    /// Require an upper case letter, a lower case letter, a digit and one of `special_chars`
    pub require_strong: bool,
    pub special_chars: String,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 6,
            require_strong: true,
            special_chars: "#?!@$%^&*-".to_string(),
        }
    }
}

impl PasswordPolicy {
    /// Validate a password, returning every broken rule.
    ///
    /// Rules do not stop at the first failure: an empty password breaks all three.
    pub fn validate(&self, password: &str) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if password.is_empty() {
            errors.push(PASSWORD_REQUIRED.to_string());
        }

        let long_enough = password.chars().count() >= self.min_length;

        if !long_enough {
            errors.push(PASSWORD_MIN_LENGTH.to_string());
        }

        if self.require_strong && !(long_enough && self.is_strong(password)) {
            errors.push(PASSWORD_NOT_STRONG.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn is_strong(&self, password: &str) -> bool {
        password.chars().any(|c| c.is_ascii_uppercase())
            && password.chars().any(|c| c.is_ascii_lowercase())
            && password.chars().any(|c| c.is_ascii_digit())
            && password.chars().any(|c| self.special_chars.contains(c))
    }
}

/// Argon2id configuration
#[derive(Debug, Clone)]
pub struct Argon2Config {
    /// Memory cost in KiB
    pub memory_cost: u32,
    pub time_cost: u32,
    pub parallelism: u32,
    pub output_len: usize,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MiB
            time_cost: 3,
            parallelism: 4,
            output_len: 32,
        }
    }
}

impl Argon2Config {
    /// Cheap parameters for tests.
    pub fn testing() -> Self {
        Self {
            memory_cost: 4096,
            time_cost: 1,
            parallelism: 1,
            output_len: 32,
        }
    }

    fn to_params(&self) -> Result<Params> {
        Params::new(self.memory_cost, self.time_cost, self.parallelism, Some(self.output_len))
            .map_err(|e| PlatformError::configuration(format!("Invalid Argon2 parameters: {}", e)))
    }
}

pub struct PasswordService {
    argon2: Argon2<'static>,
    policy: PasswordPolicy,
}

impl PasswordService {
    pub fn new(config: Argon2Config, policy: PasswordPolicy) -> Result<Self> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, config.to_params()?);
        Ok(Self { argon2, policy })
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Hash a password that satisfies the policy.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        if let Err(errors) = self.policy.validate(password) {
            return Err(PlatformError::validation_errors(errors));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PlatformError::internal(format!("Failed to hash password: {}", e)))?;

        debug!("Password hashed successfully");
        Ok(hash.to_string())
    }

    /// Verify a password against a stored PHC hash.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PlatformError::internal(format!("Invalid password hash format: {}", e)))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                debug!("Password verification failed");
                Ok(false)
            }
            Err(e) => Err(PlatformError::internal(format!("Password verification error: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PasswordService {
        PasswordService::new(Argon2Config::testing(), PasswordPolicy::default()).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let service = service();
        let hash = service.hash_password("Secret#1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(service.verify_password("Secret#1", &hash).unwrap());
        assert!(!service.verify_password("Secret#2", &hash).unwrap());
    }

    #[test]
    fn test_policy_messages() {
        let policy = PasswordPolicy::default();
        assert!(policy.validate("Abcde1!").is_ok());
        assert_eq!(
            policy.validate("").unwrap_err(),
            vec![
                PASSWORD_REQUIRED.to_string(),
                PASSWORD_MIN_LENGTH.to_string(),
                PASSWORD_NOT_STRONG.to_string(),
            ]
        );
        assert_eq!(
            policy.validate("Ab1!").unwrap_err(),
            vec![PASSWORD_MIN_LENGTH.to_string(), PASSWORD_NOT_STRONG.to_string()]
        );
        assert_eq!(policy.validate("abcdefgh").unwrap_err(), vec![PASSWORD_NOT_STRONG.to_string()]);
        // special characters outside the allowed set do not count
        assert!(policy.validate("Abcdef1_").is_err());
    }

    #[test]
    fn test_weak_password_is_not_hashed() {
        let err = service().hash_password("weak").unwrap_err();
        assert!(matches!(err, PlatformError::Validation { .. }));
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(service().verify_password("x", "not-a-hash").is_err());
    }
}
