//! Append-only change-log entries for settlement flags
//!
//! Every flag flip appends exactly one entry carrying the prior value. Entries
//! are never edited or deleted.

use crate::Actor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The settlement flag a change entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedField {
    CommissionPaid,
    MoneyTransferredToHotel,
}

impl fmt::Display for ChangedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CommissionPaid => "commission_paid",
            Self::MoneyTransferredToHotel => "money_transferred_to_hotel",
        };
        write!(f, "{s}")
    }
}

/// How a flag flip was initiated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeMethod {
    /// Administrative correction (the only method allowed to flip true -> false)
    ManualOverride,
    /// Successful payment-processor charge
    Charge,
    /// Auto-reconciliation netting run
    Reconciliation,
}

impl fmt::Display for ChangeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ManualOverride => "manual_override",
            Self::Charge => "charge",
            Self::Reconciliation => "reconciliation",
        };
        write!(f, "{s}")
    }
}

/// Field group used when scanning the change log backwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    /// Commission-side changes (`commission_paid`)
    Commission,
    /// Transfer-side changes (`money_transferred_to_hotel`)
    Transfer,
}

impl FieldGroup {
    pub fn contains(&self, field: ChangedField) -> bool {
        match self {
            Self::Commission => field == ChangedField::CommissionPaid,
            Self::Transfer => field == ChangedField::MoneyTransferredToHotel,
        }
    }
}

/// One immutable change-log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub field: ChangedField,
    pub old_value: bool,
    pub new_value: bool,
    pub note: Option<String>,
    pub at: DateTime<Utc>,
    pub actor: Actor,
    pub method: ChangeMethod,
}

impl ChangeEntry {
    pub fn new(
        field: ChangedField,
        old_value: bool,
        new_value: bool,
        note: Option<String>,
        actor: Actor,
        method: ChangeMethod,
    ) -> Self {
        Self {
            field,
            old_value,
            new_value,
            note,
            at: Utc::now(),
            actor,
            method,
        }
    }

    /// Whether this entry carries a usable note
    pub fn has_note(&self) -> bool {
        self.note.as_deref().is_some_and(|n| !n.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Actor, AdminRole};

    #[test]
    fn test_field_group_membership() {
        assert!(FieldGroup::Commission.contains(ChangedField::CommissionPaid));
        assert!(!FieldGroup::Commission.contains(ChangedField::MoneyTransferredToHotel));
        assert!(FieldGroup::Transfer.contains(ChangedField::MoneyTransferredToHotel));
    }

    #[test]
    fn test_has_note_ignores_whitespace() {
        let actor = Actor::new(crate::AdminId::new(), "amal", AdminRole::Finance);
        let entry = ChangeEntry::new(
            ChangedField::CommissionPaid,
            false,
            true,
            Some("   ".to_string()),
            actor.clone(),
            ChangeMethod::ManualOverride,
        );
        assert!(!entry.has_note());

        let entry = ChangeEntry::new(
            ChangedField::CommissionPaid,
            false,
            true,
            Some("paid in cash at office".to_string()),
            actor,
            ChangeMethod::ManualOverride,
        );
        assert!(entry.has_note());
    }
}
