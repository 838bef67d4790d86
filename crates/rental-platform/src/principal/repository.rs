//! Principal Repository

use async_trait::async_trait;
use mongodb::{bson::doc, Collection, Database};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::principal::entity::{normalize, Principal};
use crate::shared::error::{PlatformError, Result};

/// Identity lookups used by login, registration and the role transition engine.
///
/// Writes go through the unit of work; `insert` exists for seeding.
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Principal>>;

    /// Case-insensitive email lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>>;

    /// Case-insensitive user name lookup.
    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<Principal>>;

    async fn insert(&self, principal: &Principal) -> Result<()>;
}

pub struct MongoPrincipalRepository {
    collection: Collection<Principal>,
}

impl MongoPrincipalRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("principals"),
        }
    }
}

#[async_trait]
impl PrincipalRepository for MongoPrincipalRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Principal>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>> {
        Ok(self
            .collection
            .find_one(doc! { "normalizedEmail": normalize(email) })
            .await?)
    }

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<Principal>> {
        Ok(self
            .collection
            .find_one(doc! { "normalizedUserName": normalize(user_name) })
            .await?)
    }

    async fn insert(&self, principal: &Principal) -> Result<()> {
        self.collection.insert_one(principal).await?;
        Ok(())
    }
}

/// Map-backed repository for tests and the `memory` storage backend.
///
/// A single lock guards the map so uniqueness checks and writes are one step.
#[derive(Default)]
pub struct InMemoryPrincipalRepository {
    principals: RwLock<HashMap<String, Principal>>,
}

impl InMemoryPrincipalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by id, enforcing unique email and user name.
    pub fn save(&self, principal: &Principal) -> Result<()> {
        let mut principals = self.principals.write();
        check_unique(&principals, principal)?;
        principals.insert(principal.id.clone(), principal.clone());
        Ok(())
    }

    /// Store `principal` only if the stored copy is still at `principal.version`.
    ///
    /// A principal that is not stored yet must be at version 0. The stored
    /// copy is written at the next version.
    pub fn save_if_unchanged(&self, principal: &Principal) -> Result<()> {
        let mut principals = self.principals.write();

        let stored_version = principals.get(&principal.id).map_or(0, |p| p.version);
        if stored_version != principal.version {
            return Err(PlatformError::conflict(format!(
                "Principal '{}' was modified by another request",
                principal.id
            )));
        }
        check_unique(&principals, principal)?;

        let mut next = principal.clone();
        next.version += 1;
        principals.insert(next.id.clone(), next);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.principals.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.read().is_empty()
    }
}

fn check_unique(principals: &HashMap<String, Principal>, principal: &Principal) -> Result<()> {
    for other in principals.values().filter(|p| p.id != principal.id) {
        if other.normalized_email == principal.normalized_email {
            return Err(PlatformError::duplicate("Principal", "email", &principal.email));
        }
        if other.normalized_user_name == principal.normalized_user_name {
            return Err(PlatformError::duplicate("Principal", "userName", &principal.user_name));
        }
    }
    Ok(())
}

#[async_trait]
impl PrincipalRepository for InMemoryPrincipalRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Principal>> {
        Ok(self.principals.read().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>> {
        let key = normalize(email);
        Ok(self
            .principals
            .read()
            .values()
            .find(|p| p.normalized_email == key)
            .cloned())
    }

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<Principal>> {
        let key = normalize(user_name);
        Ok(self
            .principals
            .read()
            .values()
            .find(|p| p.normalized_user_name == key)
            .cloned())
    }

    async fn insert(&self, principal: &Principal) -> Result<()> {
        self.save(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    #[tokio::test]
    async fn test_lookups_ignore_case() {
        let repo = InMemoryPrincipalRepository::new();
        let p = Principal::new("Alice", "alice@example.com", "Alice", "Smith", "hash")
            .with_role(Role::Customer);
        repo.insert(&p).await.unwrap();

        assert!(repo.find_by_id(&p.id).await.unwrap().is_some());
        assert!(repo.find_by_email("ALICE@example.com").await.unwrap().is_some());
        assert!(repo.find_by_user_name("alice").await.unwrap().is_some());
        assert!(repo.find_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_email() {
        let repo = InMemoryPrincipalRepository::new();
        repo.insert(&Principal::new("alice", "alice@example.com", "A", "S", "h"))
            .await
            .unwrap();

        let clash = Principal::new("alice2", "Alice@Example.com", "A", "S", "h");
        let err = repo.insert(&clash).await.unwrap_err();
        assert!(matches!(err, PlatformError::Duplicate { ref field, .. } if field == "email"));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_save_replaces_same_id() {
        let repo = InMemoryPrincipalRepository::new();
        let mut p = Principal::new("alice", "alice@example.com", "A", "S", "h");
        repo.insert(&p).await.unwrap();

        p.add_role(Role::Staff);
        repo.save(&p).unwrap();

        let stored = repo.find_by_id(&p.id).await.unwrap().unwrap();
        assert!(stored.has_role(Role::Staff));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_save_if_unchanged_bumps_version() {
        let repo = InMemoryPrincipalRepository::new();
        let p = Principal::new("alice", "alice@example.com", "A", "S", "h");
        repo.save_if_unchanged(&p).unwrap();

        let mut stored = repo.find_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);

        stored.add_role(Role::Customer);
        repo.save_if_unchanged(&stored).unwrap();
        assert_eq!(repo.find_by_id(&p.id).await.unwrap().unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_save_if_unchanged_rejects_stale_copy() {
        let repo = InMemoryPrincipalRepository::new();
        repo.save(&Principal::new("alice", "alice@example.com", "A", "S", "h")).unwrap();
        let id = repo.find_by_email("alice@example.com").await.unwrap().unwrap().id;

        let mut first = repo.find_by_id(&id).await.unwrap().unwrap();
        let mut second = first.clone();

        first.add_role(Role::Customer);
        repo.save_if_unchanged(&first).unwrap();

        second.add_role(Role::Staff);
        let err = repo.save_if_unchanged(&second).unwrap_err();
        assert!(matches!(err, PlatformError::Conflict { .. }));

        let stored = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.role_list(), vec![Role::Customer]);
    }

    #[tokio::test]
    async fn test_save_if_unchanged_rejects_unknown_versioned_copy() {
        let repo = InMemoryPrincipalRepository::new();
        let mut p = Principal::new("alice", "alice@example.com", "A", "S", "h");
        p.version = 3;

        assert!(matches!(repo.save_if_unchanged(&p), Err(PlatformError::Conflict { .. })));
        assert!(repo.is_empty());
    }
}
