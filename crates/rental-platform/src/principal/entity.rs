//! Principal Entity
//!
//! A store user. Roles form a set; `store_id` links staff to the store they work at.

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::role::Role;
use crate::shared::tsid::TsidGenerator;
use crate::usecase::unit_of_work::HasId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// TSID as Crockford Base32 string
    #[serde(rename = "_id")]
    pub id: String,

    pub user_name: String,

    /// Lowercased user name, the uniqueness key
    pub normalized_user_name: String,

    pub email: String,

    /// Lowercased email, the login and uniqueness key
    pub normalized_email: String,

    pub first_name: String,

    pub last_name: String,

    /// Argon2id PHC string
    pub password_hash: String,

    #[serde(default)]
    pub roles: BTreeSet<Role>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<i32>,

    /// Bumped on every committed change; a write only applies over the version it was read at
    #[serde(default)]
    pub version: i64,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    pub fn new(
        user_name: impl Into<String>,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let user_name = user_name.into();
        let email = email.into();
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            normalized_user_name: normalize(&user_name),
            normalized_email: normalize(&email),
            user_name,
            email,
            first_name: first_name.into(),
            last_name: last_name.into(),
            password_hash: password_hash.into(),
            roles: BTreeSet::new(),
            store_id: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }

    pub fn with_store_id(mut self, store_id: i32) -> Self {
        self.store_id = Some(store_id);
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn highest_role(&self) -> Option<Role> {
        Role::highest(&self.roles)
    }

    pub fn role_list(&self) -> Vec<Role> {
        self.roles.iter().copied().collect()
    }

    /// Add a role. Returns false if it was already held.
    pub fn add_role(&mut self, role: Role) -> bool {
        let added = self.roles.insert(role);
        self.touch();
        added
    }

    /// Remove a role, dropping the store link when Staff goes.
    /// Returns `None` if the role was not held, otherwise whether the store was cleared.
    pub fn remove_role(&mut self, role: Role) -> Option<bool> {
        if !self.roles.remove(&role) {
            return None;
        }
        let store_cleared = role == Role::Staff && self.clear_store();
        self.touch();
        Some(store_cleared)
    }

    /// Replace the whole role set with `role`. Returns the previous set.
    pub fn replace_roles(&mut self, role: Role) -> BTreeSet<Role> {
        let previous = std::mem::replace(&mut self.roles, BTreeSet::from([role]));
        if previous.contains(&Role::Staff) {
            self.clear_store();
        }
        self.touch();
        previous
    }

    /// Returns true if a store link was removed.
    fn clear_store(&mut self) -> bool {
        self.store_id.take().is_some()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl HasId for Principal {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        "principals"
    }
}

/// Case-folding applied to user names and emails before lookups.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
