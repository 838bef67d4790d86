//! Rental Store Configuration System
//!
//! TOML-based configuration with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,

    /// Enable development mode (seeds a bootstrap admin)
    pub dev_mode: bool,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            cors_origins: vec!["http://localhost:4200".to_string()],
        }
    }
}

/// Which persistence backend the server wires up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Mongodb,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "mongodb" | "mongo" => Ok(Self::Mongodb),
            other => Err(ConfigError::ValidationError(format!(
                "unknown storage backend '{}'",
                other
            ))),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub mongodb: MongoConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            mongodb: MongoConfig::default(),
        }
    }
}

/// MongoDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017/?replicaSet=rs0&directConnection=true".to_string(),
            database: "rental_store".to_string(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt: JwtConfig,
    pub revocation: RevocationConfig,
}

/// JWT signing configuration.
///
/// Either `signing_key` (HS256) or both PEM paths (RS256) must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub signing_key: String,
    pub issuer: String,
    pub audience: String,
    pub private_key_path: String,
    pub public_key_path: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            signing_key: String::new(),
            issuer: "rental-store".to_string(),
            audience: "rental-store".to_string(),
            private_key_path: String::new(),
            public_key_path: String::new(),
        }
    }
}

impl JwtConfig {
    pub fn uses_rsa(&self) -> bool {
        !self.private_key_path.is_empty() && !self.public_key_path.is_empty()
    }
}

/// Revocation store maintenance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RevocationConfig {
    /// Seconds between prune runs; 0 disables pruning.
    pub prune_interval_secs: u64,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Check settings that have no usable default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let jwt = &self.auth.jwt;
        if jwt.signing_key.is_empty() && !jwt.uses_rsa() {
            return Err(ConfigError::ValidationError(
                "auth.jwt.signing_key or both auth.jwt key paths must be set".to_string(),
            ));
        }
        if jwt.issuer.is_empty() || jwt.audience.is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.jwt.issuer and auth.jwt.audience must not be empty".to_string(),
            ));
        }
        if self.storage.backend == StorageBackend::Mongodb && self.storage.mongodb.uri.is_empty() {
            return Err(ConfigError::ValidationError(
                "storage.mongodb.uri is required for the mongodb backend".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Rental Store Configuration
# Environment variables (RENTAL_*) override these settings

[http]
port = 8080
host = "0.0.0.0"
cors_origins = ["http://localhost:4200"]

[storage]
backend = "memory"  # memory or mongodb

[storage.mongodb]
uri = "mongodb://localhost:27017/?replicaSet=rs0&directConnection=true"
database = "rental_store"

[auth.jwt]
signing_key = ""
issuer = "rental-store"
audience = "rental-store"
private_key_path = ""
public_key_path = ""

[auth.revocation]
prune_interval_secs = 0

dev_mode = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_example_toml_parses() {
        let config: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.auth.revocation.prune_interval_secs, 0);
    }

    #[test]
    fn test_from_file_partial_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[auth.jwt]\nsigning_key = \"secret\"\n\n[storage]\nbackend = \"mongodb\""
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.auth.jwt.signing_key, "secret");
        assert_eq!(config.auth.jwt.issuer, "rental-store");
        assert_eq!(config.storage.backend, StorageBackend::Mongodb);
        assert_eq!(config.storage.mongodb.database, "rental_store");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_key_material() {
        let config = AppConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = AppConfig::default();
        config.auth.jwt.private_key_path = "private.pem".to_string();
        config.auth.jwt.public_key_path = "public.pem".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("Memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("mongo".parse::<StorageBackend>().unwrap(), StorageBackend::Mongodb);
        assert!("postgres".parse::<StorageBackend>().is_err());
    }
}
