//! Settlement batch and reconciliation result types

use crate::{BatchKey, HotelId, ReservationId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a payment-processor capture call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaptureStatus {
    Completed,
    Pending,
    Declined,
    Failed,
}

impl fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Completed => "COMPLETED",
            Self::Pending => "PENDING",
            Self::Declined => "DECLINED",
            Self::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

/// A payment-processor capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    /// Processor-side capture id
    pub id: String,
    pub status: CaptureStatus,
}

/// A hotel's on-file payment method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodOnFile {
    /// Opaque processor token
    pub token: String,
    /// Human label recorded in change notes, e.g. "visa •• 4242"
    pub label: String,
}

/// One atomic group of reservations settled together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementBatch {
    pub batch_key: BatchKey,
    pub hotel_id: HotelId,
    /// Sorted for key determinism
    pub reservation_ids: Vec<ReservationId>,
    pub total_sar: Decimal,
    pub total_usd: Decimal,
    pub sar_to_usd_rate: Decimal,
    pub capture: Option<Capture>,
    /// Payment method label, e.g. "visa •• 4242"
    pub method_label: String,
    /// Whether the ledger commit landed; a completed capture with
    /// `committed == false` marks the crash window recoverable by key
    pub committed: bool,
    pub created_at: DateTime<Utc>,
}

/// Residual amounts still owed after a reconciliation run, per direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletRemainder {
    /// Payout the platform still owes the hotel
    pub hotel_wallet_sar: Decimal,
    /// Commission the hotel still owes the platform
    pub platform_wallet_sar: Decimal,
}

/// Gross/commission/net components of the transfer side, for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferBreakdown {
    pub gross_sar: Decimal,
    pub commission_sar: Decimal,
    pub net_sar: Decimal,
}

/// Result of one auto-reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub batch_key: BatchKey,
    pub hotel_id: HotelId,
    /// `min` of the two achieved side sums
    pub settled_sar: Decimal,
    /// Commission actually settled this run
    pub commission_side_sar: Decimal,
    /// Payout actually settled this run
    pub transfer_side_sar: Decimal,
    pub remainder: WalletRemainder,
    pub reservation_ids_affected: Vec<ReservationId>,
    /// Pre-run transfer-due components
    pub transfer_due: TransferBreakdown,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful (or cached) commission charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeOutcome {
    pub batch: SettlementBatch,
    pub capture: Capture,
    pub reservations_updated: Vec<ReservationId>,
}
