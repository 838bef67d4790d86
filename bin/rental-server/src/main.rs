//! Rental Store Server
//!
//! Serves the `/account` APIs: registration, login/logout and role management.
//!
//! ## Configuration
//!
//! Read from `config.toml` (or the file named by `RENTAL_CONFIG`) with
//! `RENTAL_*` environment overrides:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RENTAL_HTTP_PORT` | `8080` | HTTP API port |
//! | `RENTAL_STORAGE_BACKEND` | `memory` | `memory` or `mongodb` |
//! | `RENTAL_MONGODB_URI` | `mongodb://localhost:27017` | MongoDB connection URI |
//! | `RENTAL_MONGODB_DATABASE` | `rental_store` | MongoDB database name |
//! | `RENTAL_JWT_SIGNING_KEY` | - | HS256 shared secret |
//! | `RENTAL_JWT_PRIVATE_KEY_PATH` | - | RSA private key PEM (RS256) |
//! | `RENTAL_JWT_PUBLIC_KEY_PATH` | - | RSA public key PEM (RS256) |
//! | `RENTAL_REVOCATION_PRUNE_INTERVAL_SECS` | `0` | Revocation pruning period, 0 disables |
//! | `RENTAL_DEV_MODE` | `false` | Seed a development admin |
//! | `RUST_LOG` | `info` | Log level |
//! | `LOG_FORMAT` | `text` | `text` or `json` |

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{extract::State, http::HeaderValue, http::StatusCode, response::Json, routing::get, Router};
use mongodb::{bson::doc, Database};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use utoipa_swagger_ui::SwaggerUi;

use rental_common::{init_logging, shutdown_signal};
use rental_config::{AppConfig, HttpConfig, StorageBackend};
use rental_platform::auth::{AuthConfig, Argon2Config, PasswordPolicy};
use rental_platform::shared::indexes::initialize_indexes;
use rental_platform::usecase::{InMemoryUnitOfWork, MongoUnitOfWork};
use rental_platform::{
    build_router, AuthService, InMemoryPrincipalRepository, InMemoryRevokedTokenRepository, InMemoryStoreRepository,
    MongoPrincipalRepository, MongoRevokedTokenRepository, MongoStoreRepository, PasswordService, PlatformState,
    Principal, PrincipalRepository, RevokedTokenRepository, Role, RoutePolicy,
};

const DEV_ADMIN_EMAIL: &str = "admin@rental.local";
const DEV_ADMIN_PASSWORD_ENV: &str = "RENTAL_DEV_ADMIN_PASSWORD";
const DEV_ADMIN_DEFAULT_PASSWORD: &str = "Admin#12345";

/// Storage-dependent parts of the platform state.
struct Backends {
    principals: Arc<dyn PrincipalRepository>,
    stores: Arc<dyn rental_platform::StoreRepository>,
    revoked_tokens: Arc<dyn RevokedTokenRepository>,
    unit_of_work: Arc<dyn rental_platform::UnitOfWork>,
    database: Option<Database>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("rental-server");

    info!("Starting Rental Store Server");

    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let backends = build_backends(&config).await?;

    let auth_service = Arc::new(AuthService::new(auth_config(&config)?)?);
    info!(algorithm = ?auth_service.algorithm(), "JWT signing configured");
    let password_service = Arc::new(PasswordService::new(Argon2Config::default(), PasswordPolicy::default())?);

    if config.dev_mode {
        seed_dev_admin(backends.principals.as_ref(), &password_service).await;
    }

    if config.auth.revocation.prune_interval_secs > 0 {
        spawn_revocation_pruning(
            backends.revoked_tokens.clone(),
            Duration::from_secs(config.auth.revocation.prune_interval_secs),
        );
    }

    let state = PlatformState {
        principals: backends.principals,
        stores: backends.stores,
        revoked_tokens: backends.revoked_tokens,
        unit_of_work: backends.unit_of_work,
        auth_service,
        password_service,
        policy: Arc::new(RoutePolicy::account_defaults()),
    };

    let (router, mut openapi) = build_router(state);
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();

    let health_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(backends.database);

    let app = Router::new()
        .merge(router)
        .merge(health_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.http));

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Rental Store Server shutdown complete");
    Ok(())
}

async fn build_backends(config: &AppConfig) -> Result<Backends> {
    match config.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; all data is lost on shutdown");
            let principals = Arc::new(InMemoryPrincipalRepository::new());
            Ok(Backends {
                unit_of_work: Arc::new(InMemoryUnitOfWork::new(principals.clone())),
                principals,
                stores: Arc::new(InMemoryStoreRepository::new()),
                revoked_tokens: Arc::new(InMemoryRevokedTokenRepository::new()),
                database: None,
            })
        }
        StorageBackend::Mongodb => {
            let mongo = &config.storage.mongodb;
            info!("Connecting to MongoDB: {}", mongo.database);
            let client = mongodb::Client::with_uri_str(&mongo.uri)
                .await
                .context("Failed to connect to MongoDB")?;
            let db = client.database(&mongo.database);

            initialize_indexes(&db).await.context("Failed to create MongoDB indexes")?;

            Ok(Backends {
                principals: Arc::new(MongoPrincipalRepository::new(&db)),
                stores: Arc::new(MongoStoreRepository::new(&db)),
                revoked_tokens: Arc::new(MongoRevokedTokenRepository::new(&db)),
                unit_of_work: Arc::new(MongoUnitOfWork::new(client.clone(), db.clone())),
                database: Some(db),
            })
        }
    }
}

fn auth_config(config: &AppConfig) -> Result<AuthConfig> {
    let jwt = &config.auth.jwt;
    let mut auth = AuthConfig {
        issuer: jwt.issuer.clone(),
        audience: jwt.audience.clone(),
        ..AuthConfig::default()
    };

    if jwt.uses_rsa() {
        auth = auth.with_rsa_key_files(&jwt.private_key_path, &jwt.public_key_path)?;
    } else {
        auth = auth.with_secret(jwt.signing_key.clone());
    }
    Ok(auth)
}

/// Create a development admin unless one with the same email exists.
async fn seed_dev_admin(principals: &dyn PrincipalRepository, passwords: &PasswordService) {
    match principals.find_by_email(DEV_ADMIN_EMAIL).await {
        Ok(Some(_)) => return,
        Ok(None) => {}
        Err(e) => {
            warn!("Dev admin seeding skipped: {}", e);
            return;
        }
    }

    let password = std::env::var(DEV_ADMIN_PASSWORD_ENV).unwrap_or_else(|_| DEV_ADMIN_DEFAULT_PASSWORD.to_string());
    let hash = match passwords.hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Dev admin seeding skipped: {}", e);
            return;
        }
    };

    let admin = Principal::new("admin", DEV_ADMIN_EMAIL, "Dev", "Admin", hash).with_role(Role::Admin);
    match principals.insert(&admin).await {
        Ok(()) => info!(email = DEV_ADMIN_EMAIL, principal_id = %admin.id, "Seeded development admin"),
        Err(e) => warn!("Dev admin seeding skipped (may already exist): {}", e),
    }
}

fn spawn_revocation_pruning(revoked_tokens: Arc<dyn RevokedTokenRepository>, period: Duration) {
    info!(period_secs = period.as_secs(), "Revocation pruning enabled");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match revoked_tokens.prune_expired(chrono::Utc::now()).await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "Pruned expired revoked tokens"),
                Err(e) => error!("Revocation pruning failed: {}", e),
            }
        }
    });
}

fn cors_layer(http: &HttpConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if http.cors_origins.is_empty() || http.cors_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = http
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn ready_handler(State(database): State<Option<Database>>) -> (StatusCode, Json<serde_json::Value>) {
    if let Some(db) = database {
        if let Err(e) = db.run_command(doc! { "ping": 1 }).await {
            warn!("Readiness check failed: {}", e);
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "DOWN" })),
            );
        }
    }
    (StatusCode::OK, Json(serde_json::json!({ "status": "READY" })))
}
