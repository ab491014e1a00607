//! Overview summaries per settlement view

use crate::PayoutView;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate over one settlement view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowSummary {
    pub count: u64,
    /// Sum of reservation totals
    pub total_sar: Decimal,
    /// Sum of commission amounts
    pub commission_sar: Decimal,
    /// Sum of net payouts; transfer-side summaries only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_sar: Option<Decimal>,
}

/// The four summaries returned by `compute_overview`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettlementOverview {
    pub commission_due_from_hotel: FlowSummary,
    pub commission_paid_by_hotel: FlowSummary,
    pub transfers_due_to_hotel: FlowSummary,
    pub transfers_completed_to_hotel: FlowSummary,
}

impl SettlementOverview {
    /// Summary for a given view (used to check list/overview consistency)
    pub fn summary_for(&self, view: PayoutView) -> &FlowSummary {
        match view {
            PayoutView::CommissionDue => &self.commission_due_from_hotel,
            PayoutView::CommissionPaid => &self.commission_paid_by_hotel,
            PayoutView::TransferDue => &self.transfers_due_to_hotel,
            PayoutView::TransferCompleted => &self.transfers_completed_to_hotel,
        }
    }
}
