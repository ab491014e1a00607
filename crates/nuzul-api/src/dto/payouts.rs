//! Payout, charge, override, and reconciliation DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use nuzul_ledger::audit::last_relevant_change;
use nuzul_types::{
    AdminId, ChargeOutcome, FieldGroup, FlowSummary, HotelId, PayoutFilter, PayoutPage,
    PaymentChannel, PaymentStatus, ReconciliationResult, Reservation, ReservationId,
    SettlementOverview, SettlementStatus, TransferStatus, DEFAULT_PAGE_SIZE,
};

use crate::error::{ApiError, ApiResult};

pub(crate) fn parse_hotel_id(s: &str) -> ApiResult<HotelId> {
    HotelId::parse(s).map_err(|_| ApiError::BadRequest(format!("invalid hotel id: {s}")))
}

pub(crate) fn parse_admin_id(s: &str) -> ApiResult<AdminId> {
    AdminId::parse(s).map_err(|_| ApiError::BadRequest(format!("invalid admin id: {s}")))
}

pub(crate) fn parse_reservation_id(s: &str) -> ApiResult<ReservationId> {
    ReservationId::parse(s).map_err(|_| ApiError::BadRequest(format!("invalid reservation id: {s}")))
}

// =============================================================================
// Listing
// =============================================================================

/// Query parameters for `GET /payouts`
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListPayoutsQuery {
    /// Scope to one hotel
    #[serde(default)]
    pub hotel_id: Option<String>,
    /// Payment channel: "online" or "offline"
    pub channel: String,
    /// Offline channel: filter by commission flag
    #[serde(default)]
    pub commission_paid: Option<bool>,
    /// Online channel: filter by transfer flag
    #[serde(default)]
    pub transferred: Option<bool>,
    /// 1-based page number
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
}

impl ListPayoutsQuery {
    /// Resolve the query into a payout filter.
    ///
    /// Exactly one status flag must be present, and it must match the
    /// channel; mismatches are rejected here or by the view resolution.
    pub fn to_filter(&self) -> ApiResult<PayoutFilter> {
        let channel = match self.channel.as_str() {
            "online" => PaymentChannel::Online,
            "offline" => PaymentChannel::Offline,
            other => {
                return Err(ApiError::BadRequest(format!(
                    "invalid channel: {other} (expected \"online\" or \"offline\")"
                )))
            }
        };
        let status = match (self.commission_paid, self.transferred) {
            (Some(paid), None) => SettlementStatus::CommissionPaid(paid),
            (None, Some(true)) => SettlementStatus::Transfer(TransferStatus::Transferred),
            (None, Some(false)) => SettlementStatus::Transfer(TransferStatus::NotTransferred),
            (None, None) => {
                return Err(ApiError::BadRequest(
                    "one of commissionPaid or transferred is required".to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(ApiError::BadRequest(
                    "commissionPaid and transferred are mutually exclusive".to_string(),
                ))
            }
        };
        let hotel_id = self
            .hotel_id
            .as_deref()
            .map(parse_hotel_id)
            .transpose()?;
        Ok(PayoutFilter::new(hotel_id, channel, status).with_page(
            self.page.unwrap_or(1),
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        ))
    }
}

/// The change an admin most likely wants to see for a reservation's flag
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LastChangeDto {
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Absent when derived from the reservation's own timestamps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_name: Option<String>,
}

/// A reservation's payment state as returned by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDto {
    pub id: String,
    pub hotel_id: String,
    pub confirmation_number: String,
    pub customer_name: String,
    pub checkin_date: NaiveDate,
    pub checkout_date: NaiveDate,
    pub total_amount_sar: Decimal,
    pub payment_channel: String,
    /// Derived from channel and flags
    pub payment_status: String,
    pub commission_sar: Decimal,
    pub commission_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_paid_at: Option<DateTime<Utc>>,
    pub money_transferred_to_hotel: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub money_transferred_at: Option<DateTime<Utc>>,
    /// Total minus commission; online channel only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online_payout_sar: Option<Decimal>,
    /// Most relevant change for this channel's settlement flag
    pub last_change: LastChangeDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReservationDto {
    pub fn from_domain(reservation: &Reservation) -> Self {
        let group = match reservation.payment_channel {
            PaymentChannel::Offline => FieldGroup::Commission,
            PaymentChannel::Online => FieldGroup::Transfer,
        };
        let last = last_relevant_change(reservation, group);
        Self {
            id: reservation.id.to_string(),
            hotel_id: reservation.hotel_id.to_string(),
            confirmation_number: reservation.confirmation_number.clone(),
            customer_name: reservation.customer_name.clone(),
            checkin_date: reservation.checkin_date,
            checkout_date: reservation.checkout_date,
            total_amount_sar: reservation.total_amount_sar,
            payment_channel: reservation.payment_channel.to_string(),
            payment_status: match reservation.payment_status() {
                PaymentStatus::Captured => "captured",
                PaymentStatus::PaidOffline => "paid_offline",
                PaymentStatus::NotCaptured => "not_captured",
                PaymentStatus::NotPaid => "not_paid",
            }
            .to_string(),
            commission_sar: reservation.commission_sar,
            commission_paid: reservation.commission_paid,
            commission_paid_at: reservation.commission_paid_at,
            money_transferred_to_hotel: reservation.money_transferred_to_hotel,
            money_transferred_at: reservation.money_transferred_at,
            online_payout_sar: reservation.online_payout_sar(),
            last_change: LastChangeDto {
                at: last.at,
                note: last.note,
                actor_name: last.actor.map(|a| a.name),
            },
            created_at: reservation.created_at,
            updated_at: reservation.updated_at,
        }
    }
}

/// One page of the payout listing
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayoutPageResponse {
    /// Always true on the success path
    pub ok: bool,
    pub reservations: Vec<ReservationDto>,
    pub total: u64,
    pub page: usize,
    pub page_size: usize,
}

impl From<PayoutPage> for PayoutPageResponse {
    fn from(page: PayoutPage) -> Self {
        Self {
            ok: true,
            reservations: page.reservations.iter().map(ReservationDto::from_domain).collect(),
            total: page.total,
            page: page.page,
            page_size: page.page_size,
        }
    }
}

// =============================================================================
// Overview
// =============================================================================

/// Aggregate over one settlement view
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowSummaryDto {
    pub count: u64,
    pub total_sar: Decimal,
    pub commission_sar: Decimal,
    /// Transfer-side summaries only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_sar: Option<Decimal>,
}

impl From<&FlowSummary> for FlowSummaryDto {
    fn from(summary: &FlowSummary) -> Self {
        Self {
            count: summary.count,
            total_sar: summary.total_sar,
            commission_sar: summary.commission_sar,
            net_sar: summary.net_sar,
        }
    }
}

/// Query parameters for `GET /payouts/overview`
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewQuery {
    #[serde(default)]
    pub hotel_id: Option<String>,
}

/// The four summaries of `GET /payouts/overview`
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    /// Always true on the success path
    pub ok: bool,
    pub commission_due_from_hotel: FlowSummaryDto,
    pub commission_paid_by_hotel: FlowSummaryDto,
    pub transfers_due_to_hotel: FlowSummaryDto,
    pub transfers_completed_to_hotel: FlowSummaryDto,
}

impl From<SettlementOverview> for OverviewResponse {
    fn from(overview: SettlementOverview) -> Self {
        Self {
            ok: true,
            commission_due_from_hotel: (&overview.commission_due_from_hotel).into(),
            commission_paid_by_hotel: (&overview.commission_paid_by_hotel).into(),
            transfers_due_to_hotel: (&overview.transfers_due_to_hotel).into(),
            transfers_completed_to_hotel: (&overview.transfers_completed_to_hotel).into(),
        }
    }
}

// =============================================================================
// Charge
// =============================================================================

/// Request body for `POST /payouts/charge`
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    /// Acting admin
    pub admin_id: String,
    pub hotel_id: String,
    /// Offline reservations whose commission to collect
    #[validate(length(min = 1, message = "at least one reservation is required"))]
    pub reservation_ids: Vec<String>,
    /// Pin the SAR -> USD conversion rate instead of asking the converter
    #[serde(default)]
    pub sar_to_usd_rate: Option<Decimal>,
}

/// The processor capture, present only on charge responses
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptureDto {
    /// Processor-side capture id
    pub id: String,
    /// COMPLETED, PENDING, DECLINED, or FAILED
    pub status: String,
}

/// The settled batch, as returned on charge responses
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChargeBatchDto {
    pub batch_key: String,
    pub hotel_id: String,
    pub total_sar: Decimal,
    pub total_usd: Decimal,
    pub sar_to_usd_rate: Decimal,
    pub method_label: String,
    pub created_at: DateTime<Utc>,
}

/// Response body for `POST /payouts/charge`
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChargeResponse {
    /// Always true on the success path
    pub ok: bool,
    pub capture: CaptureDto,
    pub batch: ChargeBatchDto,
    pub reservations_updated: Vec<String>,
}

impl From<ChargeOutcome> for ChargeResponse {
    fn from(outcome: ChargeOutcome) -> Self {
        Self {
            ok: true,
            capture: CaptureDto {
                id: outcome.capture.id,
                status: outcome.capture.status.to_string(),
            },
            batch: ChargeBatchDto {
                batch_key: outcome.batch.batch_key.to_string(),
                hotel_id: outcome.batch.hotel_id.to_string(),
                total_sar: outcome.batch.total_sar,
                total_usd: outcome.batch.total_usd,
                sar_to_usd_rate: outcome.batch.sar_to_usd_rate,
                method_label: outcome.batch.method_label,
                created_at: outcome.batch.created_at,
            },
            reservations_updated: outcome
                .reservations_updated
                .iter()
                .map(|id| id.to_string())
                .collect(),
        }
    }
}

// =============================================================================
// Manual override
// =============================================================================

/// Request body for `PATCH /payouts/flags`
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverrideFlagsRequest {
    /// Acting admin
    pub admin_id: String,
    pub reservation_id: String,
    /// Offline channel flag
    #[serde(default)]
    pub commission_paid: Option<bool>,
    /// Online channel flag
    #[serde(default)]
    pub money_transferred_to_hotel: Option<bool>,
    /// Recorded verbatim in the change log
    #[serde(default)]
    pub note: Option<String>,
}

/// Response body for `PATCH /payouts/flags`
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverrideFlagsResponse {
    /// Always true on the success path
    pub ok: bool,
    pub reservation: ReservationDto,
}

impl From<&Reservation> for OverrideFlagsResponse {
    fn from(reservation: &Reservation) -> Self {
        Self {
            ok: true,
            reservation: ReservationDto::from_domain(reservation),
        }
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Request body for `POST /payouts/reconcile`
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    /// Acting admin
    pub admin_id: String,
    pub hotel_id: String,
}

/// Pre-run transfer-due components
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferBreakdownDto {
    pub gross_sar: Decimal,
    pub commission_sar: Decimal,
    pub net_sar: Decimal,
}

/// Response body for `POST /payouts/reconcile`
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    /// Always true on the success path
    pub ok: bool,
    pub batch_key: String,
    pub hotel_id: String,
    pub settled_sar: Decimal,
    pub commission_side_sar: Decimal,
    pub transfer_side_sar: Decimal,
    /// Payout still owed to the hotel after the run
    pub hotel_wallet_sar: Decimal,
    /// Commission still owed by the hotel after the run
    pub platform_wallet_sar: Decimal,
    pub transfer_due: TransferBreakdownDto,
    pub reservation_ids_affected: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ReconciliationResult> for ReconcileResponse {
    fn from(result: ReconciliationResult) -> Self {
        Self {
            ok: true,
            batch_key: result.batch_key.to_string(),
            hotel_id: result.hotel_id.to_string(),
            settled_sar: result.settled_sar,
            commission_side_sar: result.commission_side_sar,
            transfer_side_sar: result.transfer_side_sar,
            hotel_wallet_sar: result.remainder.hotel_wallet_sar,
            platform_wallet_sar: result.remainder.platform_wallet_sar,
            transfer_due: TransferBreakdownDto {
                gross_sar: result.transfer_due.gross_sar,
                commission_sar: result.transfer_due.commission_sar,
                net_sar: result.transfer_due.net_sar,
            },
            reservation_ids_affected: result
                .reservation_ids_affected
                .iter()
                .map(|id| id.to_string())
                .collect(),
            created_at: result.created_at,
        }
    }
}
