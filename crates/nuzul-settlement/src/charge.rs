//! Commission charging
//!
//! Collects commission owed by a hotel's offline reservations in one payment,
//! by capturing USD from the hotel's on-file payment method and then flipping
//! `commission_paid` on every selected reservation atomically.
//!
//! The charge is idempotent: the batch key is derived from the selection
//! itself (hotel, sorted reservation ids, hour bucket), so a retry of the
//! same selection within the hour replays the stored outcome instead of
//! charging twice. A crash between capture and commit leaves an uncommitted
//! batch behind; a retry under the same key resumes the commit without
//! touching the processor again, skipping any reservation an admin settled
//! by hand in the meantime.
//!
//! The per-hotel guard is held only around the ledger commit, never across
//! the processor call.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use nuzul_ledger::FlagFlip;
use nuzul_types::{
    money::sar_to_usd, Actor, BatchKey, CaptureStatus, ChangeMethod, ChangedField, ChargeOutcome,
    HotelId, PaymentChannel, ReservationId, Result, SettlementBatch, SettlementError,
};

use crate::SettlementEngine;

/// Retries of the same selection collide on the key within this window
const CHARGE_KEY_BUCKET_SECS: i64 = 3600;

fn charge_batch_key(
    hotel_id: &HotelId,
    sorted_ids: &[ReservationId],
    at: DateTime<Utc>,
) -> BatchKey {
    let mut hasher = Sha256::new();
    hasher.update(hotel_id.to_string().as_bytes());
    for id in sorted_ids {
        hasher.update(id.to_string().as_bytes());
    }
    hasher.update((at.timestamp() / CHARGE_KEY_BUCKET_SECS).to_be_bytes());
    let digest = hex::encode(hasher.finalize());
    BatchKey::charge(&digest[..16])
}

impl SettlementEngine {
    /// Charge a hotel's on-file payment method for the commission owed by
    /// the selected offline reservations.
    ///
    /// Every reservation must belong to `hotel_id`, sit on the offline
    /// channel, and still hold `commission_paid == false`; any failure
    /// rejects the whole selection before money moves. Pass
    /// `sar_to_usd_rate` to pin the conversion rate; otherwise the
    /// conversion service supplies it.
    pub async fn charge_owner_commissions(
        &self,
        hotel_id: &HotelId,
        reservation_ids: &[ReservationId],
        sar_to_usd_rate: Option<Decimal>,
        actor: &Actor,
    ) -> Result<ChargeOutcome> {
        if reservation_ids.is_empty() {
            return Err(SettlementError::validation(
                "reservation_ids",
                "selection is empty",
            ));
        }
        let mut sorted_ids = reservation_ids.to_vec();
        sorted_ids.sort();
        sorted_ids.dedup();
        if sorted_ids.len() != reservation_ids.len() {
            return Err(SettlementError::validation(
                "reservation_ids",
                "selection contains duplicates",
            ));
        }

        // Replay check comes before validation: a committed batch means this
        // exact selection already settled, and its reservations now being
        // paid must not turn the retry into a validation error.
        let now = Utc::now();
        let key = charge_batch_key(hotel_id, &sorted_ids, now);
        let mut resumed: Option<(SettlementBatch, nuzul_types::Capture)> = None;
        if let Some(batch) = self.batches.read().await.get(&key).cloned() {
            if batch.committed {
                info!(batch = %key, hotel = %hotel_id, "Replaying committed charge batch");
                let capture = batch.capture.clone().ok_or_else(|| {
                    SettlementError::conflict("committed charge batch is missing its capture")
                })?;
                return Ok(ChargeOutcome {
                    reservations_updated: batch.reservation_ids.clone(),
                    batch,
                    capture,
                });
            }
            if let Some(capture) = batch
                .capture
                .clone()
                .filter(|c| c.status == CaptureStatus::Completed)
            {
                warn!(
                    batch = %key,
                    hotel = %hotel_id,
                    "Resuming commit for a captured but uncommitted charge batch"
                );
                resumed = Some((batch, capture));
            }
        }

        let method = self.payment_method(hotel_id).await.ok_or_else(|| {
            SettlementError::validation("hotel_id", "hotel has no payment method on file")
        })?;

        // Validate the whole selection against a snapshot before any money
        // moves; the commit re-check under the hotel guard catches races.
        let mut total_sar = Decimal::ZERO;
        let mut pending_ids = Vec::with_capacity(sorted_ids.len());
        for id in &sorted_ids {
            let reservation = self.ledger.get(id).await.map_err(|_| {
                SettlementError::validation("reservation_ids", format!("unknown reservation {id}"))
            })?;
            if &reservation.hotel_id != hotel_id {
                return Err(SettlementError::validation(
                    "reservation_ids",
                    format!("reservation {id} belongs to another hotel"),
                ));
            }
            if reservation.payment_channel != PaymentChannel::Offline {
                return Err(SettlementError::validation(
                    "reservation_ids",
                    format!("reservation {id} is online; commission is charged on offline reservations only"),
                ));
            }
            if reservation.commission_paid {
                if resumed.is_none() {
                    return Err(SettlementError::validation(
                        "reservation_ids",
                        format!("reservation {id} commission is already paid"),
                    ));
                }
                // The capture landed before the crash and this reservation
                // was settled by hand in the meantime; the retry must still
                // commit the rest instead of stranding the captured payment.
                warn!(
                    batch = %key,
                    reservation = %id,
                    "Skipping manually settled reservation while resuming a charge commit"
                );
                continue;
            }
            pending_ids.push(id.clone());
            total_sar += reservation.commission_sar;
        }
        if resumed.is_none() && total_sar <= Decimal::ZERO {
            return Err(SettlementError::validation(
                "reservation_ids",
                "selection has no commission to charge",
            ));
        }

        let (batch, capture) = match resumed {
            Some(pair) => pair,
            None => {
                let (total_usd, rate) = match sar_to_usd_rate {
                    Some(rate) => {
                        if rate <= Decimal::ZERO {
                            return Err(SettlementError::validation(
                                "sar_to_usd_rate",
                                "rate must be positive",
                            ));
                        }
                        (sar_to_usd(total_sar, rate), rate)
                    }
                    None => {
                        let converted = self.converter.convert(&[total_sar]).await?;
                        let total_usd = converted.first().copied().ok_or_else(|| {
                            SettlementError::external(
                                "currency-conversion",
                                "empty conversion response",
                            )
                        })?;
                        (total_usd, (total_usd / total_sar).round_dp(6))
                    }
                };

                let capture = self.processor.capture(total_usd, &method.token).await?;
                if capture.status != CaptureStatus::Completed {
                    warn!(
                        hotel = %hotel_id,
                        capture = %capture.id,
                        status = %capture.status,
                        "Commission capture did not complete"
                    );
                    return Err(SettlementError::external(
                        "payment-processor",
                        format!("capture {} returned {}", capture.id, capture.status),
                    ));
                }

                let batch = SettlementBatch {
                    batch_key: key.clone(),
                    hotel_id: hotel_id.clone(),
                    reservation_ids: sorted_ids.clone(),
                    total_sar,
                    total_usd,
                    sar_to_usd_rate: rate,
                    capture: Some(capture.clone()),
                    method_label: method.label.clone(),
                    committed: false,
                    created_at: now,
                };
                self.batches.write().await.insert(key.clone(), batch.clone());
                (batch, capture)
            }
        };

        // Money has moved; commit the flags under the hotel guard
        let guard = self.ledger.hotel_guard(hotel_id);
        let _hotel = guard.lock().await;

        let note = format!("Paid via {} • {}", batch.method_label, batch.batch_key);
        let flips: Vec<FlagFlip> = pending_ids
            .iter()
            .map(|id| FlagFlip {
                reservation_id: id.clone(),
                field: ChangedField::CommissionPaid,
            })
            .collect();
        let reservations_updated = if flips.is_empty() {
            Vec::new()
        } else {
            self.ledger
                .apply_settlement(
                    hotel_id,
                    &flips,
                    ChangeMethod::Charge,
                    &batch.batch_key,
                    Some(note),
                    actor,
                )
                .await?
        };

        let batch = {
            let mut batches = self.batches.write().await;
            let stored = batches.get_mut(&key).ok_or_else(|| {
                SettlementError::conflict("charge batch disappeared during commit")
            })?;
            stored.committed = true;
            stored.clone()
        };

        info!(
            hotel = %hotel_id,
            batch = %key,
            total_sar = %batch.total_sar,
            total_usd = %batch.total_usd,
            reservations = reservations_updated.len(),
            "Commission charge committed"
        );
        Ok(ChargeOutcome {
            batch,
            capture,
            reservations_updated,
        })
    }
}
