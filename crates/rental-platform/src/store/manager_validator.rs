//! Store-Manager Invariant
//!
//! A store may only be managed by a principal that currently holds Staff or Admin.

use std::sync::Arc;

use crate::principal::PrincipalRepository;
use crate::role::Role;
use crate::shared::error::Result;

pub struct StoreManagerValidator {
    principals: Arc<dyn PrincipalRepository>,
}

impl StoreManagerValidator {
    pub fn new(principals: Arc<dyn PrincipalRepository>) -> Self {
        Self { principals }
    }

    /// An absent or empty candidate is valid (no manager change requested).
    /// Otherwise the candidate must exist and hold Admin or Staff.
    pub async fn is_valid_manager(&self, candidate: Option<&str>) -> Result<bool> {
        let Some(candidate) = candidate.filter(|c| !c.is_empty()) else {
            return Ok(true);
        };

        Ok(self
            .principals
            .find_by_id(candidate)
            .await?
            .map(|p| p.has_role(Role::Admin) || p.has_role(Role::Staff))
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::{InMemoryPrincipalRepository, Principal};

    fn setup() -> (StoreManagerValidator, Principal, Principal) {
        let repo = Arc::new(InMemoryPrincipalRepository::new());
        let manager = Principal::new("mgr", "mgr@example.com", "M", "G", "h")
            .with_role(Role::Admin)
            .with_role(Role::Staff);
        let customer = Principal::new("cust", "cust@example.com", "C", "U", "h").with_role(Role::Customer);
        repo.save(&manager).unwrap();
        repo.save(&customer).unwrap();
        (StoreManagerValidator::new(repo), manager, customer)
    }

    #[test]
    fn test_staff_or_admin_is_valid() {
        let (validator, manager, _) = setup();
        assert!(tokio_test::block_on(validator.is_valid_manager(Some(&manager.id))).unwrap());
    }

    #[test]
    fn test_customer_is_invalid() {
        let (validator, _, customer) = setup();
        assert!(!tokio_test::block_on(validator.is_valid_manager(Some(&customer.id))).unwrap());
    }

    #[test]
    fn test_unknown_is_invalid() {
        let (validator, _, _) = setup();
        assert!(!tokio_test::block_on(validator.is_valid_manager(Some("missing"))).unwrap());
    }

    #[test]
    fn test_empty_is_valid() {
        let (validator, _, _) = setup();
        assert!(tokio_test::block_on(validator.is_valid_manager(None)).unwrap());
        assert!(tokio_test::block_on(validator.is_valid_manager(Some(""))).unwrap());
    }
}
