//! Nuzul Ledger - canonical reservation payment state
//!
//! The ledger is:
//! - Keyed by ReservationId, partitioned per hotel for write batching
//! - Flag-based (settlement state is boolean, never a fraction of an amount)
//! - Append-only in its change log (entries are never edited or deleted)
//! - Thread-safe and designed for concurrent access
//!
//! # Invariants
//!
//! 1. `commission_paid` flips false -> true only via manual override, a
//!    successful charge, or auto-reconciliation; true -> false only via
//!    manual override. Same for `money_transferred_to_hotel`.
//! 2. Every flag flip appends exactly one change entry carrying the prior
//!    value.
//! 3. Batch writes are all-or-nothing: a failed re-check mutates nothing.

pub mod audit;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use nuzul_types::{
    Actor, BatchKey, ChangeEntry, ChangeMethod, ChangedField, HotelId, NewReservation,
    PaymentChannel, Reservation, ReservationId, Result, SettlementError,
};

/// Requested flag values for a manual override; `None` leaves a flag alone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagOverride {
    pub commission_paid: Option<bool>,
    pub money_transferred_to_hotel: Option<bool>,
}

impl FlagOverride {
    pub fn is_empty(&self) -> bool {
        self.commission_paid.is_none() && self.money_transferred_to_hotel.is_none()
    }
}

/// One false -> true flip inside a settlement batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagFlip {
    pub reservation_id: ReservationId,
    pub field: ChangedField,
}

/// The Nuzul reservation payment ledger
///
/// In-memory, thread-safe. Reads clone out a snapshot and never block
/// writers beyond the brief lock; batch writers additionally serialize per
/// hotel through [`ReservationLedger::hotel_guard`].
#[derive(Clone, Default)]
pub struct ReservationLedger {
    reservations: Arc<RwLock<HashMap<ReservationId, Reservation>>>,
    hotel_locks: Arc<DashMap<HotelId, Arc<Mutex<()>>>>,
}

impl ReservationLedger {
    /// Create a new in-memory ledger
    pub fn new() -> Self {
        Self {
            reservations: Arc::new(RwLock::new(HashMap::new())),
            hotel_locks: Arc::new(DashMap::new()),
        }
    }

    /// Enter a finalized booking into the ledger with both flags false.
    ///
    /// Rejects duplicate ids, non-positive totals, and commissions that are
    /// negative or exceed the total.
    pub async fn admit(&self, new: NewReservation) -> Result<Reservation> {
        if new.total_amount_sar <= rust_decimal::Decimal::ZERO {
            return Err(SettlementError::validation(
                "total_amount_sar",
                "total must be positive",
            ));
        }
        let commission_sar = new.resolve_commission_sar()?;
        if new.checkout_date <= new.checkin_date {
            return Err(SettlementError::validation(
                "checkout_date",
                "checkout must be after checkin",
            ));
        }

        let id = new.id.clone().unwrap_or_default();
        let now = Utc::now();
        let reservation = Reservation {
            id: id.clone(),
            hotel_id: new.hotel_id,
            confirmation_number: new.confirmation_number,
            customer_name: new.customer_name,
            checkin_date: new.checkin_date,
            checkout_date: new.checkout_date,
            total_amount_sar: new.total_amount_sar,
            payment_channel: new.payment_channel,
            commission_sar,
            commission_paid: false,
            commission_paid_at: None,
            money_transferred_to_hotel: false,
            money_transferred_at: None,
            created_at: now,
            updated_at: now,
            change_log: Vec::new(),
        };

        let mut reservations = self.reservations.write().await;
        if reservations.contains_key(&id) {
            return Err(SettlementError::validation(
                "id",
                format!("reservation {id} already exists"),
            ));
        }
        reservations.insert(id, reservation.clone());
        Ok(reservation)
    }

    /// Get a reservation by id
    pub async fn get(&self, id: &ReservationId) -> Result<Reservation> {
        self.reservations
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SettlementError::not_found("reservation", id))
    }

    /// Clone out all reservations, optionally scoped to one hotel.
    ///
    /// A non-blocking read; the snapshot may be slightly stale relative to
    /// in-flight writes.
    pub async fn snapshot(&self, hotel_id: Option<&HotelId>) -> Vec<Reservation> {
        let reservations = self.reservations.read().await;
        reservations
            .values()
            .filter(|r| hotel_id.is_none_or(|h| &r.hotel_id == h))
            .cloned()
            .collect()
    }

    /// Number of reservations in the ledger
    pub async fn len(&self) -> usize {
        self.reservations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// The per-hotel mutex serializing read-then-commit write batches.
    ///
    /// Held only around the commit re-check, never across network I/O.
    pub fn hotel_guard(&self, hotel_id: &HotelId) -> Arc<Mutex<()>> {
        self.hotel_locks
            .entry(hotel_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Apply an administrative flag correction to a single reservation.
    ///
    /// Compare-and-swap on that one document: the delta against current state
    /// is computed under the write lock, an empty delta fails with
    /// [`SettlementError::NoChange`] and mutates nothing, and each field that
    /// actually changes appends one change entry carrying the prior value and
    /// this call's note.
    pub async fn apply_manual_override(
        &self,
        id: &ReservationId,
        requested: FlagOverride,
        note: Option<String>,
        actor: Actor,
    ) -> Result<Reservation> {
        let mut reservations = self.reservations.write().await;
        let reservation = reservations
            .get_mut(id)
            .ok_or_else(|| SettlementError::not_found("reservation", id))?;

        // Flags are only meaningful on their own channel
        if requested.commission_paid.is_some()
            && reservation.payment_channel != PaymentChannel::Offline
        {
            return Err(SettlementError::validation(
                "commission_paid",
                "commission applies to offline reservations only",
            ));
        }
        if requested.money_transferred_to_hotel.is_some()
            && reservation.payment_channel != PaymentChannel::Online
        {
            return Err(SettlementError::validation(
                "money_transferred_to_hotel",
                "transfers apply to online reservations only",
            ));
        }

        let mut deltas: Vec<(ChangedField, bool, bool)> = Vec::new();
        if let Some(target) = requested.commission_paid {
            if target != reservation.commission_paid {
                deltas.push((ChangedField::CommissionPaid, reservation.commission_paid, target));
            }
        }
        if let Some(target) = requested.money_transferred_to_hotel {
            if target != reservation.money_transferred_to_hotel {
                deltas.push((
                    ChangedField::MoneyTransferredToHotel,
                    reservation.money_transferred_to_hotel,
                    target,
                ));
            }
        }
        if deltas.is_empty() {
            return Err(SettlementError::NoChange);
        }

        let now = Utc::now();
        for &(field, old_value, new_value) in &deltas {
            match field {
                ChangedField::CommissionPaid => {
                    reservation.commission_paid = new_value;
                    reservation.commission_paid_at = new_value.then_some(now);
                }
                ChangedField::MoneyTransferredToHotel => {
                    reservation.money_transferred_to_hotel = new_value;
                    reservation.money_transferred_at = new_value.then_some(now);
                }
            }
            audit::append_change(
                reservation,
                ChangeEntry::new(
                    field,
                    old_value,
                    new_value,
                    note.clone(),
                    actor.clone(),
                    ChangeMethod::ManualOverride,
                ),
            );
        }

        info!(
            reservation = %id,
            fields = deltas.len(),
            actor = %actor.id,
            "Manual override applied"
        );
        Ok(reservation.clone())
    }

    /// Flip a batch of settlement flags false -> true, all-or-nothing.
    ///
    /// Under one write lock every flip is re-checked: the reservation must
    /// exist, belong to `hotel_id`, sit on the channel its flag belongs to,
    /// and still hold the flag false. Any failed check aborts the whole batch
    /// with zero mutations; a flag already true means a concurrent write
    /// raced this batch and surfaces as [`SettlementError::Conflict`].
    pub async fn apply_settlement(
        &self,
        hotel_id: &HotelId,
        flips: &[FlagFlip],
        method: ChangeMethod,
        batch_key: &BatchKey,
        note: Option<String>,
        actor: &Actor,
    ) -> Result<Vec<ReservationId>> {
        let mut reservations = self.reservations.write().await;

        // Phase 1: re-check everything before touching anything
        for flip in flips {
            let reservation = reservations
                .get(&flip.reservation_id)
                .ok_or_else(|| SettlementError::not_found("reservation", &flip.reservation_id))?;
            if &reservation.hotel_id != hotel_id {
                return Err(SettlementError::validation(
                    "reservation_ids",
                    format!("reservation {} belongs to another hotel", flip.reservation_id),
                ));
            }
            let (expected_channel, already_set) = match flip.field {
                ChangedField::CommissionPaid => {
                    (PaymentChannel::Offline, reservation.commission_paid)
                }
                ChangedField::MoneyTransferredToHotel => {
                    (PaymentChannel::Online, reservation.money_transferred_to_hotel)
                }
            };
            if reservation.payment_channel != expected_channel {
                return Err(SettlementError::validation(
                    "reservation_ids",
                    format!(
                        "reservation {} is not on the {} channel",
                        flip.reservation_id, expected_channel
                    ),
                ));
            }
            if already_set {
                return Err(SettlementError::conflict(format!(
                    "reservation {} was settled concurrently ({})",
                    flip.reservation_id, flip.field
                )));
            }
        }

        // Phase 2: commit every flip
        let now = Utc::now();
        let mut affected = Vec::with_capacity(flips.len());
        for flip in flips {
            let reservation = reservations
                .get_mut(&flip.reservation_id)
                .expect("checked in phase 1");
            match flip.field {
                ChangedField::CommissionPaid => {
                    reservation.commission_paid = true;
                    reservation.commission_paid_at = Some(now);
                }
                ChangedField::MoneyTransferredToHotel => {
                    reservation.money_transferred_to_hotel = true;
                    reservation.money_transferred_at = Some(now);
                }
            }
            audit::append_change(
                reservation,
                ChangeEntry::new(flip.field, false, true, note.clone(), actor.clone(), method),
            );
            affected.push(flip.reservation_id.clone());
        }

        info!(
            hotel = %hotel_id,
            batch = %batch_key,
            method = %method,
            reservations = affected.len(),
            "Settlement batch committed"
        );
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nuzul_types::{AdminRole, CommissionInput};
    use rust_decimal_macros::dec;

    fn actor() -> Actor {
        Actor::new(nuzul_types::AdminId::new(), "amal", AdminRole::Finance)
    }

    fn new_reservation(hotel_id: &HotelId, channel: PaymentChannel) -> NewReservation {
        NewReservation {
            id: None,
            hotel_id: hotel_id.clone(),
            confirmation_number: "CN-2001".to_string(),
            customer_name: "guest".to_string(),
            checkin_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            checkout_date: NaiveDate::from_ymd_opt(2025, 4, 3).unwrap(),
            total_amount_sar: dec!(1000),
            payment_channel: channel,
            commission: CommissionInput::Precomputed(dec!(120)),
        }
    }

    #[tokio::test]
    async fn test_admit_starts_unsettled() {
        let ledger = ReservationLedger::new();
        let hotel = HotelId::new();
        let r = ledger
            .admit(new_reservation(&hotel, PaymentChannel::Offline))
            .await
            .unwrap();
        assert!(!r.commission_paid);
        assert!(!r.money_transferred_to_hotel);
        assert!(r.change_log.is_empty());
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_admit_rejects_duplicate_id() {
        let ledger = ReservationLedger::new();
        let hotel = HotelId::new();
        let mut new = new_reservation(&hotel, PaymentChannel::Offline);
        new.id = Some(ReservationId::new());
        ledger.admit(new.clone()).await.unwrap();
        assert!(matches!(
            ledger.admit(new).await,
            Err(SettlementError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_manual_override_appends_entry_with_prior_value() {
        let ledger = ReservationLedger::new();
        let hotel = HotelId::new();
        let r = ledger
            .admit(new_reservation(&hotel, PaymentChannel::Offline))
            .await
            .unwrap();

        let updated = ledger
            .apply_manual_override(
                &r.id,
                FlagOverride {
                    commission_paid: Some(true),
                    ..Default::default()
                },
                Some("paid by bank transfer".to_string()),
                actor(),
            )
            .await
            .unwrap();

        assert!(updated.commission_paid);
        assert!(updated.commission_paid_at.is_some());
        assert_eq!(updated.change_log.len(), 1);
        let entry = &updated.change_log[0];
        assert_eq!(entry.field, ChangedField::CommissionPaid);
        assert!(!entry.old_value);
        assert!(entry.new_value);
        assert_eq!(entry.note.as_deref(), Some("paid by bank transfer"));
        assert_eq!(entry.method, ChangeMethod::ManualOverride);
    }

    #[tokio::test]
    async fn test_manual_override_no_change_rejected_without_entry() {
        let ledger = ReservationLedger::new();
        let hotel = HotelId::new();
        let r = ledger
            .admit(new_reservation(&hotel, PaymentChannel::Offline))
            .await
            .unwrap();

        // commission_paid is already false
        let result = ledger
            .apply_manual_override(
                &r.id,
                FlagOverride {
                    commission_paid: Some(false),
                    ..Default::default()
                },
                None,
                actor(),
            )
            .await;
        assert!(matches!(result, Err(SettlementError::NoChange)));
        assert!(ledger.get(&r.id).await.unwrap().change_log.is_empty());
    }

    #[tokio::test]
    async fn test_manual_override_reverses_flag_with_log() {
        let ledger = ReservationLedger::new();
        let hotel = HotelId::new();
        let r = ledger
            .admit(new_reservation(&hotel, PaymentChannel::Offline))
            .await
            .unwrap();

        ledger
            .apply_manual_override(
                &r.id,
                FlagOverride {
                    commission_paid: Some(true),
                    ..Default::default()
                },
                None,
                actor(),
            )
            .await
            .unwrap();
        let reverted = ledger
            .apply_manual_override(
                &r.id,
                FlagOverride {
                    commission_paid: Some(false),
                    ..Default::default()
                },
                Some("charged in error".to_string()),
                actor(),
            )
            .await
            .unwrap();

        assert!(!reverted.commission_paid);
        assert!(reverted.commission_paid_at.is_none());
        assert_eq!(reverted.change_log.len(), 2);
        let last = reverted.change_log.last().unwrap();
        assert!(last.old_value);
        assert!(!last.new_value);
    }

    #[tokio::test]
    async fn test_manual_override_wrong_channel_rejected() {
        let ledger = ReservationLedger::new();
        let hotel = HotelId::new();
        let online = ledger
            .admit(new_reservation(&hotel, PaymentChannel::Online))
            .await
            .unwrap();

        let result = ledger
            .apply_manual_override(
                &online.id,
                FlagOverride {
                    commission_paid: Some(true),
                    ..Default::default()
                },
                None,
                actor(),
            )
            .await;
        assert!(matches!(result, Err(SettlementError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_apply_settlement_is_all_or_nothing() {
        let ledger = ReservationLedger::new();
        let hotel = HotelId::new();
        let a = ledger
            .admit(new_reservation(&hotel, PaymentChannel::Offline))
            .await
            .unwrap();
        let b = ledger
            .admit(new_reservation(&hotel, PaymentChannel::Offline))
            .await
            .unwrap();

        // b's flag raced to true before the batch commit
        ledger
            .apply_manual_override(
                &b.id,
                FlagOverride {
                    commission_paid: Some(true),
                    ..Default::default()
                },
                None,
                actor(),
            )
            .await
            .unwrap();

        let flips = vec![
            FlagFlip {
                reservation_id: a.id.clone(),
                field: ChangedField::CommissionPaid,
            },
            FlagFlip {
                reservation_id: b.id.clone(),
                field: ChangedField::CommissionPaid,
            },
        ];
        let result = ledger
            .apply_settlement(
                &hotel,
                &flips,
                ChangeMethod::Charge,
                &BatchKey::charge("deadbeef"),
                None,
                &actor(),
            )
            .await;
        assert!(matches!(result, Err(SettlementError::Conflict { .. })));

        // a was not touched
        let a_now = ledger.get(&a.id).await.unwrap();
        assert!(!a_now.commission_paid);
        assert!(a_now.change_log.is_empty());
    }

    #[tokio::test]
    async fn test_apply_settlement_rejects_foreign_hotel() {
        let ledger = ReservationLedger::new();
        let hotel = HotelId::new();
        let other = HotelId::new();
        let r = ledger
            .admit(new_reservation(&other, PaymentChannel::Offline))
            .await
            .unwrap();

        let flips = vec![FlagFlip {
            reservation_id: r.id.clone(),
            field: ChangedField::CommissionPaid,
        }];
        let result = ledger
            .apply_settlement(
                &hotel,
                &flips,
                ChangeMethod::Charge,
                &BatchKey::charge("deadbeef"),
                None,
                &actor(),
            )
            .await;
        assert!(matches!(result, Err(SettlementError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_apply_settlement_flips_and_logs_each() {
        let ledger = ReservationLedger::new();
        let hotel = HotelId::new();
        let a = ledger
            .admit(new_reservation(&hotel, PaymentChannel::Offline))
            .await
            .unwrap();
        let b = ledger
            .admit(new_reservation(&hotel, PaymentChannel::Online))
            .await
            .unwrap();

        let batch_key = BatchKey::reconciliation();
        let flips = vec![
            FlagFlip {
                reservation_id: a.id.clone(),
                field: ChangedField::CommissionPaid,
            },
            FlagFlip {
                reservation_id: b.id.clone(),
                field: ChangedField::MoneyTransferredToHotel,
            },
        ];
        let affected = ledger
            .apply_settlement(
                &hotel,
                &flips,
                ChangeMethod::Reconciliation,
                &batch_key,
                None,
                &actor(),
            )
            .await
            .unwrap();
        assert_eq!(affected.len(), 2);

        let a_now = ledger.get(&a.id).await.unwrap();
        let b_now = ledger.get(&b.id).await.unwrap();
        assert!(a_now.commission_paid);
        assert!(b_now.money_transferred_to_hotel);
        assert_eq!(a_now.change_log.len(), 1);
        assert_eq!(b_now.change_log.len(), 1);
        assert_eq!(a_now.change_log[0].method, ChangeMethod::Reconciliation);
    }
}
