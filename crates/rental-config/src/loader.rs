//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "rental.toml",
    "./config/config.toml",
    "./config/rental.toml",
    "/etc/rental-store/config.toml",
];

/// Environment variable naming an explicit config file
const CONFIG_PATH_ENV: &str = "RENTAL_CONFIG";

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    search_defaults: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            config_path: None,
            search_defaults: true,
        }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
            search_defaults: false,
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        self.apply_env_overrides(&mut config)?;

        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured config file does not exist");
        }

        if !self.search_defaults {
            return None;
        }

        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    fn apply_env_overrides(&self, config: &mut AppConfig) -> Result<(), ConfigError> {
        // HTTP
        if let Ok(val) = env::var("RENTAL_HTTP_PORT") {
            if let Ok(port) = val.parse() {
                config.http.port = port;
            }
        }
        if let Ok(val) = env::var("RENTAL_HTTP_HOST") {
            config.http.host = val;
        }
        if let Ok(val) = env::var("RENTAL_CORS_ORIGINS") {
            config.http.cors_origins = val.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Storage
        if let Ok(val) = env::var("RENTAL_STORAGE_BACKEND") {
            config.storage.backend = val.parse()?;
        }
        if let Ok(val) = env::var("RENTAL_MONGODB_URI") {
            config.storage.mongodb.uri = val;
        }
        if let Ok(val) = env::var("RENTAL_MONGODB_DATABASE") {
            config.storage.mongodb.database = val;
        }

        // Auth
        if let Ok(val) = env::var("RENTAL_JWT_SIGNING_KEY") {
            config.auth.jwt.signing_key = val;
        }
        if let Ok(val) = env::var("RENTAL_JWT_ISSUER") {
            config.auth.jwt.issuer = val;
        }
        if let Ok(val) = env::var("RENTAL_JWT_AUDIENCE") {
            config.auth.jwt.audience = val;
        }
        if let Ok(val) = env::var("RENTAL_JWT_PRIVATE_KEY_PATH") {
            config.auth.jwt.private_key_path = val;
        }
        if let Ok(val) = env::var("RENTAL_JWT_PUBLIC_KEY_PATH") {
            config.auth.jwt.public_key_path = val;
        }
        if let Ok(val) = env::var("RENTAL_REVOCATION_PRUNE_INTERVAL_SECS") {
            if let Ok(secs) = val.parse() {
                config.auth.revocation.prune_interval_secs = secs;
            }
        }

        // General
        if let Ok(val) = env::var("RENTAL_DEV_MODE") {
            config.dev_mode = val.parse().unwrap_or(false);
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
