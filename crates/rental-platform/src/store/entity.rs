//! Store Entity

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A rental store. Each store has exactly one manager and one address,
/// neither shared with another store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    #[serde(rename = "_id")]
    pub id: i32,

    /// Principal id of the managing staff member
    pub manager_id: String,

    pub address_id: i32,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub last_update: DateTime<Utc>,
}

impl Store {
    pub fn new(id: i32, manager_id: impl Into<String>, address_id: i32) -> Self {
        Self {
            id,
            manager_id: manager_id.into(),
            address_id,
            last_update: Utc::now(),
        }
    }
}
