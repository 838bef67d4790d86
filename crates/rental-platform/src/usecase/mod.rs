//! Use Case Infrastructure
//!
//! - `UseCaseResult<T>` - sealed result type for use case outcomes
//! - `UseCaseError` - categorized errors with consistent HTTP mapping
//! - `DomainEvent` - facts emitted by successful use cases
//! - `ExecutionContext` - who runs the use case and under which correlation id
//! - `UnitOfWork` - atomic commit of principal state plus its audit entry

pub mod domain_event;
pub mod error;
pub mod execution_context;
pub mod result;
pub mod unit_of_work;

pub use domain_event::{DomainEvent, EventMetadata};
pub use error::UseCaseError;
pub use execution_context::ExecutionContext;
pub use result::UseCaseResult;
pub use unit_of_work::{InMemoryUnitOfWork, MongoUnitOfWork, UnitOfWork};
