//! OpenAPI documentation

use utoipa::OpenApi;

use crate::dto;
use crate::error::ErrorResponse;
use crate::handlers;

/// Nuzul settlement API documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Nuzul Settlement API",
        description = "Commission and payout settlement for hotel reservations: payout listings, overview aggregates, commission charges, flag overrides, and auto-reconciliation netting.",
        version = "1.0.0",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local Development")
    ),
    paths(
        handlers::health::health_check,
        handlers::health::ping,
        handlers::health::server_time,
        handlers::payouts::list_payouts,
        handlers::payouts::get_overview,
        handlers::payouts::charge_commissions,
        handlers::payouts::override_flags,
        handlers::payouts::reconcile,
    ),
    components(
        schemas(
            ErrorResponse,
            dto::ServerTimeResponse,
            dto::ListPayoutsQuery,
            dto::LastChangeDto,
            dto::ReservationDto,
            dto::PayoutPageResponse,
            dto::OverviewQuery,
            dto::FlowSummaryDto,
            dto::OverviewResponse,
            dto::ChargeRequest,
            dto::CaptureDto,
            dto::ChargeBatchDto,
            dto::ChargeResponse,
            dto::OverrideFlagsRequest,
            dto::OverrideFlagsResponse,
            dto::ReconcileRequest,
            dto::TransferBreakdownDto,
            dto::ReconcileResponse,
        )
    ),
    tags(
        (name = "General", description = "Liveness and server time"),
        (name = "Payouts", description = "Settlement operations over the reservation ledger"),
    )
)]
pub struct ApiDoc;
