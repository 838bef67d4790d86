//! Revocation Store
//!
//! The set of tokens revoked at logout. Membership is an exact string match
//! and is checked on every protected request without caching.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use mongodb::{bson::doc, error::ErrorKind, error::WriteFailure, Collection, Database};
use tracing::debug;

use crate::auth::revoked_token::RevokedToken;
use crate::shared::error::Result;

#[async_trait]
pub trait RevokedTokenRepository: Send + Sync {
    /// Record `token` as revoked. Revoking an already revoked token is a no-op.
    async fn add(&self, token: &str, expires_at: Option<DateTime<Utc>>) -> Result<()>;

    /// Read-only membership test.
    async fn contains(&self, token: &str) -> Result<bool>;

    /// Drop entries whose token expired at or before `now`. Returns how many were removed.
    ///
    /// Pruned tokens are already rejected by signature validation, so this only bounds growth.
    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

pub struct MongoRevokedTokenRepository {
    collection: Collection<RevokedToken>,
}

impl MongoRevokedTokenRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("revoked_tokens"),
        }
    }
}

#[async_trait]
impl RevokedTokenRepository for MongoRevokedTokenRepository {
    async fn add(&self, token: &str, expires_at: Option<DateTime<Utc>>) -> Result<()> {
        let revoked_at = bson::DateTime::from_chrono(Utc::now());
        let expires_at = expires_at.map(bson::DateTime::from_chrono);

        let result = self
            .collection
            .update_one(
                doc! { "_id": token },
                doc! { "$setOnInsert": { "revokedAt": revoked_at, "expiresAt": expires_at } },
            )
            .upsert(true)
            .await;

        match result {
            Ok(_) => Ok(()),
            // Two concurrent upserts of the same token: the other one won
            Err(e) if matches!(
                e.kind.as_ref(),
                ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000
            ) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn contains(&self, token: &str) -> Result<bool> {
        Ok(self.collection.find_one(doc! { "_id": token }).await?.is_some())
    }

    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! { "expiresAt": { "$lte": bson::DateTime::from_chrono(now) } })
            .await?;
        debug!(deleted = result.deleted_count, "Pruned expired revoked tokens");
        Ok(result.deleted_count)
    }
}

/// Concurrent in-memory revocation store.
#[derive(Default)]
pub struct InMemoryRevokedTokenRepository {
    tokens: DashMap<String, RevokedToken>,
}

impl InMemoryRevokedTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl RevokedTokenRepository for InMemoryRevokedTokenRepository {
    async fn add(&self, token: &str, expires_at: Option<DateTime<Utc>>) -> Result<()> {
        self.tokens
            .entry(token.to_string())
            .or_insert_with(|| RevokedToken::new(token, expires_at));
        Ok(())
    }

    async fn contains(&self, token: &str) -> Result<bool> {
        Ok(self.tokens.contains_key(token))
    }

    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let before = self.tokens.len();
        self.tokens.retain(|_, entry| !entry.is_expired_at(now));
        Ok(before.saturating_sub(self.tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_add_and_contains() {
        let store = InMemoryRevokedTokenRepository::new();
        assert!(!store.contains("abc").await.unwrap());

        store.add("abc", None).await.unwrap();
        assert!(store.contains("abc").await.unwrap());
        assert!(!store.contains("abd").await.unwrap());
        assert!(!store.contains("ab").await.unwrap());
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let store = InMemoryRevokedTokenRepository::new();
        store.add("abc", None).await.unwrap();
        let first = store.tokens.get("abc").unwrap().revoked_at;

        store.add("abc", Some(Utc::now())).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.tokens.get("abc").unwrap().revoked_at, first);
    }

    #[tokio::test]
    async fn test_prune_expired() {
        let store = InMemoryRevokedTokenRepository::new();
        let now = Utc::now();
        store.add("expired", Some(now - Duration::minutes(1))).await.unwrap();
        store.add("live", Some(now + Duration::minutes(10))).await.unwrap();
        store.add("unknown-expiry", None).await.unwrap();

        assert_eq!(store.prune_expired(now).await.unwrap(), 1);
        assert!(!store.contains("expired").await.unwrap());
        assert!(store.contains("live").await.unwrap());
        assert!(store.contains("unknown-expiry").await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_readers_and_writer() {
        let store = Arc::new(InMemoryRevokedTokenRepository::new());
        let mut handles = Vec::new();

        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                if i == 0 {
                    store.add("shared", None).await.unwrap();
                }
                store.contains("shared").await.unwrap()
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert!(store.contains("shared").await.unwrap());
    }
}
