//! Store Aggregate
//!
//! Stores are read and validated here; the store-manager invariant lives in
//! `manager_validator`.

pub mod entity;
pub mod manager_validator;
pub mod repository;
pub mod validator;

pub use entity::Store;
pub use manager_validator::StoreManagerValidator;
pub use repository::{InMemoryStoreRepository, MongoStoreRepository, StoreRepository};
pub use validator::{CreateStoreRequest, StoreValidator, UpdateStoreRequest};
