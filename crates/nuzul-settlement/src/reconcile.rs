//! Auto-reconciliation netting
//!
//! Nets commission owed by a hotel (offline, unpaid) against payout owed to
//! it (online, untransferred) without moving any money. Each side greedily
//! selects whole reservations, largest first, up to the smaller side's total;
//! flags are never split, so whatever does not fit stays due and lands in the
//! wallet remainders.
//!
//! Reconciliation touches no external service, so unlike charging it holds
//! the hotel guard across the whole select-then-commit run.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use nuzul_ledger::FlagFlip;
use nuzul_types::{
    money::round_money, Actor, BatchKey, ChangeMethod, ChangedField, HotelId,
    ReconciliationResult, ReservationId, Result, TransferBreakdown, WalletRemainder,
};

use crate::SettlementEngine;

/// Greedy whole-reservation selection: largest amount first, ids break ties,
/// never exceeding `target`.
fn select_up_to(
    mut candidates: Vec<(ReservationId, Decimal)>,
    target: Decimal,
) -> (Vec<ReservationId>, Decimal) {
    candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let mut selected = Vec::new();
    let mut sum = Decimal::ZERO;
    for (id, amount) in candidates {
        if amount <= Decimal::ZERO {
            continue;
        }
        if sum + amount <= target {
            sum += amount;
            selected.push(id);
        }
    }
    (selected, sum)
}

impl SettlementEngine {
    /// Net a hotel's commission debt against its payout credit.
    ///
    /// Selected reservations on both sides flip in one atomic batch:
    /// `commission_paid` on the offline side, `money_transferred_to_hotel`
    /// on the online side. With nothing due on either side the run settles
    /// zero and mutates nothing; re-running immediately after a settling run
    /// is therefore a no-op.
    pub async fn auto_reconcile_hotel(
        &self,
        hotel_id: &HotelId,
        actor: &Actor,
    ) -> Result<ReconciliationResult> {
        let guard = self.ledger.hotel_guard(hotel_id);
        let _hotel = guard.lock().await;

        let snapshot = self.ledger.snapshot(Some(hotel_id)).await;

        let mut commission_candidates = Vec::new();
        let mut transfer_candidates = Vec::new();
        let mut commission_due = Decimal::ZERO;
        let mut transfer_due = TransferBreakdown::default();
        for reservation in &snapshot {
            if let Some(commission) = reservation.commission_due_sar() {
                if !reservation.commission_paid {
                    commission_candidates.push((reservation.id.clone(), commission));
                    commission_due += commission;
                }
            }
            if let Some(payout) = reservation.online_payout_sar() {
                if !reservation.money_transferred_to_hotel {
                    transfer_candidates.push((reservation.id.clone(), payout));
                    transfer_due.gross_sar += reservation.total_amount_sar;
                    transfer_due.commission_sar += reservation.commission_sar;
                    transfer_due.net_sar += payout;
                }
            }
        }
        commission_due = round_money(commission_due);
        transfer_due.gross_sar = round_money(transfer_due.gross_sar);
        transfer_due.commission_sar = round_money(transfer_due.commission_sar);
        transfer_due.net_sar = round_money(transfer_due.net_sar);

        let target = commission_due.min(transfer_due.net_sar);
        let (commission_ids, commission_sum) = select_up_to(commission_candidates, target);
        let (transfer_ids, transfer_sum) = select_up_to(transfer_candidates, target);

        let batch_key = BatchKey::reconciliation();
        let mut flips: Vec<FlagFlip> = commission_ids
            .iter()
            .map(|id| FlagFlip {
                reservation_id: id.clone(),
                field: ChangedField::CommissionPaid,
            })
            .collect();
        flips.extend(transfer_ids.iter().map(|id| FlagFlip {
            reservation_id: id.clone(),
            field: ChangedField::MoneyTransferredToHotel,
        }));

        let reservation_ids_affected = if flips.is_empty() {
            Vec::new()
        } else {
            self.ledger
                .apply_settlement(
                    hotel_id,
                    &flips,
                    ChangeMethod::Reconciliation,
                    &batch_key,
                    None,
                    actor,
                )
                .await?
        };

        let result = ReconciliationResult {
            batch_key,
            hotel_id: hotel_id.clone(),
            settled_sar: commission_sum.min(transfer_sum),
            commission_side_sar: commission_sum,
            transfer_side_sar: transfer_sum,
            remainder: WalletRemainder {
                hotel_wallet_sar: round_money(transfer_due.net_sar - transfer_sum),
                platform_wallet_sar: round_money(commission_due - commission_sum),
            },
            reservation_ids_affected,
            transfer_due,
            created_at: Utc::now(),
        };

        info!(
            hotel = %hotel_id,
            batch = %result.batch_key,
            settled_sar = %result.settled_sar,
            hotel_wallet_sar = %result.remainder.hotel_wallet_sar,
            platform_wallet_sar = %result.remainder.platform_wallet_sar,
            reservations = result.reservation_ids_affected.len(),
            "Auto-reconciliation run complete"
        );
        Ok(result)
    }
}
