//! Unit of Work
//!
//! Atomic commit of a principal's new state together with its audit log entry.
//! Role transitions and registration never write the principal any other way,
//! so a half-applied change (roles updated, store link not) cannot be observed.
//!
//! ```ignore
//! pub async fn execute(&self, cmd: AssignRoleCommand, ctx: ExecutionContext) -> UseCaseResult<RoleAssigned> {
//!     // checks return UseCaseResult::failure(..) directly
//!     principal.add_role(role);
//!     let event = RoleAssigned::new(&ctx, &principal, role);
//!     self.unit_of_work.commit(&principal, event, &cmd).await
//! }
//! ```

use async_trait::async_trait;
use mongodb::error::{ErrorKind, WriteFailure, TRANSIENT_TRANSACTION_ERROR};
use mongodb::{bson::doc, Client, Database};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::domain_event::DomainEvent;
use super::error::UseCaseError;
use super::result::UseCaseResult;
use crate::audit::AuditLog;
use crate::principal::{InMemoryPrincipalRepository, Principal};
use crate::shared::error::PlatformError;

/// Entities the unit of work can persist.
pub trait HasId {
    fn id(&self) -> &str;
    fn collection_name() -> &'static str;
}

#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Write the principal (insert or full replace) and the audit entry as one step.
    ///
    /// Either both are stored or neither is. The write only applies if the
    /// stored principal is still at `principal.version`; otherwise it fails
    /// with a `ConcurrencyError` and nothing changes.
    async fn persist(&self, principal: &Principal, audit_log: &AuditLog) -> Result<(), UseCaseError>;
}

impl dyn UnitOfWork {
    /// Commit a principal change with its event.
    ///
    /// **The only way to produce a successful `UseCaseResult`.**
    pub async fn commit<E, C>(&self, principal: &Principal, event: E, command: &C) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize,
        C: Serialize + Sync,
    {
        let audit_log = AuditLog::for_event(&event, command);

        if let Err(e) = self.persist(principal, &audit_log).await {
            return UseCaseResult::failure(e);
        }

        debug!(
            event_id = event.event_id(),
            event_type = event.event_type(),
            principal_id = %principal.id,
            "Committed principal change"
        );
        UseCaseResult::success(event)
    }
}

/// MongoDB implementation using a multi-document transaction.
///
/// Requires a replica set deployment.
#[derive(Clone)]
pub struct MongoUnitOfWork {
    client: Client,
    database: Database,
}

impl MongoUnitOfWork {
    pub fn new(client: Client, database: Database) -> Self {
        Self { client, database }
    }
}

fn principal_modified() -> UseCaseError {
    UseCaseError::concurrency(
        "PRINCIPAL_MODIFIED",
        "User was modified by another request. Please retry.",
    )
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == 11000,
        ErrorKind::Command(ce) => ce.code == 11000,
        _ => false,
    }
}

#[async_trait]
impl UnitOfWork for MongoUnitOfWork {
    async fn persist(&self, principal: &Principal, audit_log: &AuditLog) -> Result<(), UseCaseError> {
        let mut session = self.client.start_session().await.map_err(|e| {
            error!("Failed to start MongoDB session: {}", e);
            UseCaseError::commit(format!("Failed to start session: {}", e))
        })?;

        session.start_transaction().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            UseCaseError::commit(format!("Failed to start transaction: {}", e))
        })?;

        // Full replacement so cleared optional fields (store link) are removed too.
        // The version filter turns a stale read into a conflict instead of a lost update.
        let principals = self.database.collection::<Principal>(Principal::collection_name());
        let mut next = principal.clone();
        next.version += 1;

        let replaced = principals
            .replace_one(doc! { "_id": HasId::id(principal), "version": principal.version }, &next)
            .session(&mut session)
            .await;

        let write = match replaced {
            Ok(result) if result.matched_count == 1 => Ok(()),
            Ok(_) => {
                let existing = principals
                    .find_one(doc! { "_id": HasId::id(principal) })
                    .session(&mut session)
                    .await;
                match existing {
                    Ok(None) if principal.version == 0 => {
                        principals.insert_one(&next).session(&mut session).await.map(|_| ())
                    }
                    Ok(_) => {
                        let _ = session.abort_transaction().await;
                        warn!(principal_id = %principal.id, "Principal changed since it was read");
                        return Err(principal_modified());
                    }
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        };

        if let Err(e) = write {
            let _ = session.abort_transaction().await;
            if is_duplicate_key(&e) {
                return Err(UseCaseError::business_rule(
                    "DUPLICATE_PRINCIPAL",
                    "Email or user name is already taken.",
                ));
            }
            if e.contains_label(TRANSIENT_TRANSACTION_ERROR) {
                warn!(principal_id = %principal.id, "Write conflict on principal: {}", e);
                return Err(principal_modified());
            }
            error!("Failed to persist principal: {}", e);
            return Err(UseCaseError::commit(format!("Failed to persist principal: {}", e)));
        }

        let audit_logs = self.database.collection::<AuditLog>("audit_logs");
        if let Err(e) = audit_logs.insert_one(audit_log).session(&mut session).await {
            let _ = session.abort_transaction().await;
            error!("Failed to insert audit log: {}", e);
            return Err(UseCaseError::commit(format!("Failed to insert audit log: {}", e)));
        }

        session.commit_transaction().await.map_err(|e| {
            if e.contains_label(TRANSIENT_TRANSACTION_ERROR) {
                warn!(principal_id = %principal.id, "Write conflict on commit: {}", e);
                return principal_modified();
            }
            error!("Failed to commit transaction: {}", e);
            UseCaseError::commit(format!("Failed to commit transaction: {}", e))
        })
    }
}

/// In-memory implementation for the `memory` backend and tests.
///
/// The principal write is a single locked compare-and-swap on the repository;
/// the audit entry is only recorded once that write succeeded.
pub struct InMemoryUnitOfWork {
    principals: Arc<InMemoryPrincipalRepository>,
    audit_logs: Mutex<Vec<AuditLog>>,
}

impl InMemoryUnitOfWork {
    pub fn new(principals: Arc<InMemoryPrincipalRepository>) -> Self {
        Self {
            principals,
            audit_logs: Mutex::new(Vec::new()),
        }
    }

    pub fn audit_logs(&self) -> Vec<AuditLog> {
        self.audit_logs.lock().clone()
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn persist(&self, principal: &Principal, audit_log: &AuditLog) -> Result<(), UseCaseError> {
        self.principals.save_if_unchanged(principal).map_err(|e| match e {
            PlatformError::Duplicate { field, value, .. } => UseCaseError::business_rule(
                "DUPLICATE_PRINCIPAL",
                format!("{} '{}' is already taken.", field, value),
            ),
            PlatformError::Conflict { .. } => principal_modified(),
            other => UseCaseError::commit(other.to_string()),
        })?;

        self.audit_logs.lock().push(audit_log.clone());
        Ok(())
    }
}
