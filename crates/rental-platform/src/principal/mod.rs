//! Principal Aggregate
//!
//! Store users (customers, staff, admins) and the role transition use cases.

pub mod api;
pub mod entity;
pub mod operations;
pub mod repository;

pub use api::{account_router, AccountState};
pub use entity::Principal;
pub use repository::{InMemoryPrincipalRepository, MongoPrincipalRepository, PrincipalRepository};
