//! Revoked Token Entity

use bson::serde_helpers::{chrono_datetime_as_bson_datetime, chrono_datetime_as_bson_datetime_optional};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A token presented at logout. Matched by exact string equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokedToken {
    /// The raw token is the key
    #[serde(rename = "_id")]
    pub token: String,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub revoked_at: DateTime<Utc>,

    /// Embedded expiry of the token, when it could be read. Entries past it may be pruned.
    #[serde(default, with = "chrono_datetime_as_bson_datetime_optional")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl RevokedToken {
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: token.into(),
            revoked_at: Utc::now(),
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}
