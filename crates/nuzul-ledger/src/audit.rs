//! Audit log recorder
//!
//! Shared append/read utility used by every mutator. Entries are append-only;
//! `last_relevant_change` is the pure backward scan the admin UI uses to show
//! "why is this flag set" next to a reservation.

use chrono::{DateTime, Utc};
use nuzul_types::{Actor, ChangeEntry, FieldGroup, Reservation};

/// Append a change entry and bump the reservation's `updated_at`.
pub fn append_change(reservation: &mut Reservation, entry: ChangeEntry) {
    reservation.updated_at = entry.at;
    reservation.change_log.push(entry);
}

/// The most relevant change for a field group
#[derive(Debug, Clone, PartialEq)]
pub struct LastChange {
    pub at: DateTime<Utc>,
    pub note: Option<String>,
    /// Absent when falling back to the reservation's own timestamps
    pub actor: Option<Actor>,
}

/// Find the change an admin most likely wants to see for a field group.
///
/// Scans entries backward, preferring the most recent entry in the group that
/// carries a non-empty note; else the most recent matching entry; else falls
/// back to the reservation's own timestamp fields.
pub fn last_relevant_change(reservation: &Reservation, group: FieldGroup) -> LastChange {
    let mut latest_match: Option<&ChangeEntry> = None;
    for entry in reservation.change_log.iter().rev() {
        if !group.contains(entry.field) {
            continue;
        }
        if entry.has_note() {
            return LastChange {
                at: entry.at,
                note: entry.note.clone(),
                actor: Some(entry.actor.clone()),
            };
        }
        if latest_match.is_none() {
            latest_match = Some(entry);
        }
    }

    if let Some(entry) = latest_match {
        return LastChange {
            at: entry.at,
            note: None,
            actor: Some(entry.actor.clone()),
        };
    }

    let fallback = match group {
        FieldGroup::Commission => reservation.commission_paid_at,
        FieldGroup::Transfer => reservation.money_transferred_at,
    };
    LastChange {
        at: fallback.unwrap_or(reservation.updated_at),
        note: None,
        actor: None,
    }
}
