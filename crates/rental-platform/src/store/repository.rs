//! Store Repository

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use mongodb::{bson::doc, Collection, Database};

use crate::shared::error::{PlatformError, Result};
use crate::store::entity::Store;

#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Store>>;

    async fn find_by_address_id(&self, address_id: i32) -> Result<Option<Store>>;

    async fn find_by_manager_id(&self, manager_id: &str) -> Result<Option<Store>>;

    async fn insert(&self, store: &Store) -> Result<()>;

    async fn exists(&self, id: i32) -> Result<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }
}

pub struct MongoStoreRepository {
    collection: Collection<Store>,
}

impl MongoStoreRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("stores"),
        }
    }
}

#[async_trait]
impl StoreRepository for MongoStoreRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Store>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_address_id(&self, address_id: i32) -> Result<Option<Store>> {
        Ok(self.collection.find_one(doc! { "addressId": address_id }).await?)
    }

    async fn find_by_manager_id(&self, manager_id: &str) -> Result<Option<Store>> {
        Ok(self.collection.find_one(doc! { "managerId": manager_id }).await?)
    }

    async fn insert(&self, store: &Store) -> Result<()> {
        self.collection.insert_one(store).await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryStoreRepository {
    stores: DashMap<i32, Store>,
}

impl InMemoryStoreRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreRepository for InMemoryStoreRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Store>> {
        Ok(self.stores.get(&id).map(|s| s.value().clone()))
    }

    async fn find_by_address_id(&self, address_id: i32) -> Result<Option<Store>> {
        Ok(self
            .stores
            .iter()
            .find(|s| s.address_id == address_id)
            .map(|s| s.value().clone()))
    }

    async fn find_by_manager_id(&self, manager_id: &str) -> Result<Option<Store>> {
        Ok(self
            .stores
            .iter()
            .find(|s| s.manager_id == manager_id)
            .map(|s| s.value().clone()))
    }

    async fn insert(&self, store: &Store) -> Result<()> {
        match self.stores.entry(store.id) {
            Entry::Occupied(_) => Err(PlatformError::duplicate("Store", "id", store.id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(store.clone());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_lookups() {
        let repo = InMemoryStoreRepository::new();
        repo.insert(&Store::new(1, "mgr-1", 10)).await.unwrap();

        assert!(repo.exists(1).await.unwrap());
        assert!(!repo.exists(2).await.unwrap());
        assert_eq!(repo.find_by_address_id(10).await.unwrap().map(|s| s.id), Some(1));
        assert_eq!(repo.find_by_manager_id("mgr-1").await.unwrap().map(|s| s.id), Some(1));
        assert!(repo.insert(&Store::new(1, "mgr-2", 11)).await.is_err());
    }
}
