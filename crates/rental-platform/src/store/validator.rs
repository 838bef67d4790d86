//! Store Validators
//!
//! Input checks for store create and update requests. Every failed rule is
//! reported, in rule order.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::shared::error::{PlatformError, Result};
use crate::store::manager_validator::StoreManagerValidator;
use crate::store::repository::StoreRepository;

pub const ADDRESS_REQUIRED: &str = "AddressId should be specified!";
pub const ADDRESS_NOT_ZERO: &str = "AddressId should be not 0!";
pub const STORE_ID_REQUIRED: &str = "StoreId should be specified!";
pub const INVALID_MANAGER: &str = "StaffId must be a valid staff or admin ID.";
pub const ADDRESS_TAKEN: &str = "Address is already assigned to another store.";
pub const MANAGER_TAKEN: &str = "StaffId already manages another store.";

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoreRequest {
    pub address_id: Option<i32>,
    pub staff_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoreRequest {
    pub store_id: Option<i32>,
    pub address_id: Option<i32>,
    pub staff_id: Option<String>,
}

pub struct StoreValidator {
    stores: Arc<dyn StoreRepository>,
    managers: StoreManagerValidator,
}

impl StoreValidator {
    pub fn new(stores: Arc<dyn StoreRepository>, managers: StoreManagerValidator) -> Self {
        Self { stores, managers }
    }

    /// Messages for every rule a create request breaks; empty when valid.
    pub async fn validate_create(&self, request: &CreateStoreRequest) -> Result<Vec<String>> {
        let mut errors = Vec::new();

        match request.address_id {
            None | Some(0) => errors.push(ADDRESS_REQUIRED.to_string()),
            Some(address_id) => {
                if self.stores.find_by_address_id(address_id).await?.is_some() {
                    errors.push(ADDRESS_TAKEN.to_string());
                }
            }
        }

        self.check_manager(request.staff_id.as_deref(), None, &mut errors).await?;

        Ok(errors)
    }

    /// Messages for every rule an update request breaks; empty when valid.
    pub async fn validate_update(&self, request: &UpdateStoreRequest) -> Result<Vec<String>> {
        let mut errors = Vec::new();

        let store_id = request.store_id.filter(|id| *id != 0);
        if store_id.is_none() {
            errors.push(STORE_ID_REQUIRED.to_string());
        }

        match request.address_id {
            Some(0) => errors.push(ADDRESS_NOT_ZERO.to_string()),
            Some(address_id) => {
                let holder = self.stores.find_by_address_id(address_id).await?;
                if holder.is_some_and(|s| Some(s.id) != store_id) {
                    errors.push(ADDRESS_TAKEN.to_string());
                }
            }
            None => {}
        }

        self.check_manager(request.staff_id.as_deref(), store_id, &mut errors).await?;

        Ok(errors)
    }

    /// Fail with a 400 carrying all messages if the create request is invalid.
    pub async fn ensure_create(&self, request: &CreateStoreRequest) -> Result<()> {
        into_result(self.validate_create(request).await?)
    }

    pub async fn ensure_update(&self, request: &UpdateStoreRequest) -> Result<()> {
        into_result(self.validate_update(request).await?)
    }

    async fn check_manager(
        &self,
        staff_id: Option<&str>,
        own_store: Option<i32>,
        errors: &mut Vec<String>,
    ) -> Result<()> {
        if !self.managers.is_valid_manager(staff_id).await? {
            errors.push(INVALID_MANAGER.to_string());
            return Ok(());
        }

        if let Some(staff_id) = staff_id.filter(|s| !s.is_empty()) {
            let managed = self.stores.find_by_manager_id(staff_id).await?;
            if managed.is_some_and(|s| Some(s.id) != own_store) {
                errors.push(MANAGER_TAKEN.to_string());
            }
        }
        Ok(())
    }
}

fn into_result(errors: Vec<String>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(PlatformError::validation_errors(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::{InMemoryPrincipalRepository, Principal};
    use crate::role::Role;
    use crate::store::{InMemoryStoreRepository, Store};

    struct Fixture {
        validator: StoreValidator,
        staff: Principal,
        other_staff: Principal,
        customer: Principal,
    }

    async fn fixture() -> Fixture {
        let principals = Arc::new(InMemoryPrincipalRepository::new());
        let staff = Principal::new("staff", "staff@example.com", "S", "T", "h").with_role(Role::Staff);
        let other_staff = Principal::new("staff2", "staff2@example.com", "S", "T", "h").with_role(Role::Staff);
        let customer = Principal::new("cust", "cust@example.com", "C", "U", "h").with_role(Role::Customer);
        for p in [&staff, &other_staff, &customer] {
            principals.save(p).unwrap();
        }

        let stores = Arc::new(InMemoryStoreRepository::new());
        stores.insert(&Store::new(1, staff.id.clone(), 100)).await.unwrap();

        let validator = StoreValidator::new(stores, StoreManagerValidator::new(principals));
        Fixture { validator, staff, other_staff, customer }
    }

    #[tokio::test]
    async fn test_create_valid() {
        let f = fixture().await;
        let request = CreateStoreRequest {
            address_id: Some(200),
            staff_id: Some(f.other_staff.id.clone()),
        };
        assert!(f.validator.validate_create(&request).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_accumulates_errors() {
        let f = fixture().await;
        let request = CreateStoreRequest {
            address_id: Some(0),
            staff_id: Some(f.customer.id.clone()),
        };
        let errors = f.validator.validate_create(&request).await.unwrap();
        assert_eq!(errors, vec![ADDRESS_REQUIRED.to_string(), INVALID_MANAGER.to_string()]);
    }

    #[tokio::test]
    async fn test_create_rejects_taken_address_and_manager() {
        let f = fixture().await;
        let request = CreateStoreRequest {
            address_id: Some(100),
            staff_id: Some(f.staff.id.clone()),
        };
        let errors = f.validator.validate_create(&request).await.unwrap();
        assert_eq!(errors, vec![ADDRESS_TAKEN.to_string(), MANAGER_TAKEN.to_string()]);
    }

    #[tokio::test]
    async fn test_update_own_store_keeps_address_and_manager() {
        let f = fixture().await;
        let request = UpdateStoreRequest {
            store_id: Some(1),
            address_id: Some(100),
            staff_id: Some(f.staff.id.clone()),
        };
        assert!(f.validator.ensure_update(&request).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_requires_store_id_and_non_zero_address() {
        let f = fixture().await;
        let request = UpdateStoreRequest {
            store_id: None,
            address_id: Some(0),
            staff_id: None,
        };
        let errors = f.validator.validate_update(&request).await.unwrap();
        assert_eq!(errors, vec![STORE_ID_REQUIRED.to_string(), ADDRESS_NOT_ZERO.to_string()]);

        let err = f.validator.ensure_update(&request).await.unwrap_err();
        assert!(matches!(err, PlatformError::Validation { .. }));
    }
}
