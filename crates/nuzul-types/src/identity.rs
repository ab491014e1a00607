//! Identity types for Nuzul settlement
//!
//! All identity types are strongly typed wrappers around UUIDs to prevent
//! accidental mixing of different ID types. Reservation ids additionally
//! order lexically, which the query engine relies on for deterministic
//! tie-breaking.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Macro to generate ID types with common implementations
macro_rules! define_id_type {
    ($name:ident, $prefix:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse from a string (with or without prefix)
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                let s = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }

            /// Get the inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id_type!(ReservationId, "rsv", "Unique identifier for a reservation");
define_id_type!(HotelId, "hotel", "Unique identifier for a hotel");
define_id_type!(AdminId, "admin", "Unique identifier for a platform admin");

/// Key identifying one atomic settlement batch.
///
/// Charge batches derive their key from the selection itself (hotel, sorted
/// reservation ids, hour bucket) so that retries collide on purpose;
/// reconciliation batches are random.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchKey(pub String);

impl BatchKey {
    /// Key for a commission charge batch (deterministic, caller-derived)
    pub fn charge(digest: &str) -> Self {
        Self(format!("cchg_{digest}"))
    }

    /// Key for an auto-reconciliation batch (random)
    pub fn reconciliation() -> Self {
        Self(format!("recon_{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_id_prefix() {
        let id = ReservationId::new();
        assert!(id.to_string().starts_with("rsv_"));
    }

    #[test]
    fn test_id_parsing_roundtrip() {
        let id = HotelId::new();
        let parsed = HotelId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_id_parsing_without_prefix() {
        let uuid = Uuid::new_v4();
        let parsed = ReservationId::parse(&uuid.to_string()).unwrap();
        assert_eq!(parsed, ReservationId::from_uuid(uuid));
    }

    #[test]
    fn test_reservation_ids_are_ordered() {
        let mut ids = vec![ReservationId::new(), ReservationId::new(), ReservationId::new()];
        ids.sort();
        assert!(ids[0] <= ids[1] && ids[1] <= ids[2]);
    }

    #[test]
    fn test_batch_key_prefixes() {
        assert!(BatchKey::charge("abc123").as_str().starts_with("cchg_"));
        assert!(BatchKey::reconciliation().as_str().starts_with("recon_"));
    }
}
