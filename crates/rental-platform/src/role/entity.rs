//! Role Entity
//!
//! Three fixed roles ordered by privilege. The capability table below is the
//! single place that decides who may grant or revoke what.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub enum Role {
    Customer,
    Staff,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Customer, Role::Staff, Role::Admin];

    /// Stable numeric id used by the account endpoints.
    pub fn id(self) -> i32 {
        match self {
            Role::Customer => 1,
            Role::Staff => 2,
            Role::Admin => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::Staff => "Staff",
            Role::Admin => "Admin",
        }
    }

    pub fn from_id(id: i32) -> Option<Role> {
        Self::ALL.into_iter().find(|r| r.id() == id)
    }

    /// Parse a role id as it arrives in a query string.
    pub fn parse_id(raw: &str) -> Option<Role> {
        raw.trim().parse().ok().and_then(Self::from_id)
    }

    /// Case-insensitive name lookup.
    pub fn from_name(name: &str) -> Option<Role> {
        let name = name.trim();
        Self::ALL.into_iter().find(|r| r.name().eq_ignore_ascii_case(name))
    }

    /// Whether this role may change other users' roles at all.
    pub fn can_manage_roles(self) -> bool {
        matches!(self, Role::Admin | Role::Staff)
    }

    /// Whether a caller whose highest role is `self` may grant `target`.
    pub fn may_grant(self, target: Role) -> bool {
        match self {
            Role::Admin => true,
            Role::Staff => target != Role::Admin,
            Role::Customer => false,
        }
    }

    /// Whether a caller whose highest role is `self` may revoke `target`.
    pub fn may_revoke(self, target: Role) -> bool {
        match self {
            Role::Admin => true,
            Role::Staff => target == Role::Customer,
            Role::Customer => false,
        }
    }

    /// The highest role in a set; callers act at this tier.
    pub fn highest<'a>(roles: impl IntoIterator<Item = &'a Role>) -> Option<Role> {
        roles.into_iter().copied().max()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
