//! Settlement overview aggregation
//!
//! Sums the same snapshot through the same [`PayoutView`] predicate the query
//! engine uses, so for any view the overview's count and totals equal what
//! paging through `list_payouts` would yield.

use rust_decimal::Decimal;

use nuzul_types::{
    money::round_money, FlowSummary, HotelId, PayoutView, Reservation, SettlementOverview,
};

use crate::SettlementEngine;

impl SettlementEngine {
    /// Aggregate counts and totals over the four canonical views, optionally
    /// scoped to one hotel.
    pub async fn compute_overview(&self, hotel_id: Option<&HotelId>) -> SettlementOverview {
        let snapshot = self.ledger.snapshot(hotel_id).await;
        SettlementOverview {
            commission_due_from_hotel: summarize(&snapshot, PayoutView::CommissionDue),
            commission_paid_by_hotel: summarize(&snapshot, PayoutView::CommissionPaid),
            transfers_due_to_hotel: summarize(&snapshot, PayoutView::TransferDue),
            transfers_completed_to_hotel: summarize(&snapshot, PayoutView::TransferCompleted),
        }
    }
}

fn summarize(snapshot: &[Reservation], view: PayoutView) -> FlowSummary {
    let mut summary = FlowSummary {
        net_sar: matches!(view, PayoutView::TransferDue | PayoutView::TransferCompleted)
            .then_some(Decimal::ZERO),
        ..Default::default()
    };
    for reservation in snapshot.iter().filter(|r| view.matches(r)) {
        summary.count += 1;
        summary.total_sar += reservation.total_amount_sar;
        summary.commission_sar += reservation.commission_sar;
        if let Some(net) = summary.net_sar.as_mut() {
            *net += reservation.online_payout_sar().unwrap_or_default();
        }
    }
    summary.total_sar = round_money(summary.total_sar);
    summary.commission_sar = round_money(summary.commission_sar);
    summary.net_sar = summary.net_sar.map(round_money);
    summary
}
