//! Acting admin identity and server-side capabilities
//!
//! Authorization is decided from the role the server has on record for the
//! admin id, never from a role string supplied by the client.

use crate::AdminId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform admin role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Full access, including administrative corrections
    SuperAdmin,
    /// Finance operations: charge, reconcile, override
    Finance,
    /// Support staff: single-reservation overrides only
    Support,
    /// Read-only access
    ReadOnly,
}

impl AdminRole {
    /// May initiate commission charge batches
    pub fn can_charge(&self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Finance)
    }

    /// May run auto-reconciliation
    pub fn can_reconcile(&self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Finance)
    }

    /// May manually override settlement flags
    pub fn can_override(&self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Finance | Self::Support)
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SuperAdmin => "super_admin",
            Self::Finance => "finance",
            Self::Support => "support",
            Self::ReadOnly => "read_only",
        };
        write!(f, "{s}")
    }
}

/// The admin performing a mutation, as recorded in change entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: AdminId,
    pub name: String,
    pub role: AdminRole,
}

impl Actor {
    pub fn new(id: AdminId, name: impl Into<String>, role: AdminRole) -> Self {
        Self {
            id,
            name: name.into(),
            role,
        }
    }

    /// The synthetic actor used when the platform itself mutates state
    pub fn system() -> Self {
        Self {
            id: AdminId::new(),
            name: "system".to_string(),
            role: AdminRole::SuperAdmin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        assert!(AdminRole::SuperAdmin.can_charge());
        assert!(AdminRole::Finance.can_reconcile());
        assert!(AdminRole::Support.can_override());
        assert!(!AdminRole::Support.can_charge());
        assert!(!AdminRole::ReadOnly.can_override());
    }
}
