//! Payout operation handlers
//!
//! Every mutating endpoint names an acting admin; the capability check runs
//! against the role the server has on record for that id.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use validator::Validate;

use nuzul_ledger::FlagOverride;
use nuzul_types::Actor;

use crate::dto::{
    parse_admin_id, parse_hotel_id, parse_reservation_id, ChargeRequest, ChargeResponse,
    ListPayoutsQuery, OverrideFlagsRequest, OverrideFlagsResponse, OverviewQuery, OverviewResponse,
    PayoutPageResponse, ReconcileRequest, ReconcileResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

async fn require_admin(state: &AppState, admin_id: &str) -> ApiResult<Actor> {
    let id = parse_admin_id(admin_id)?;
    state
        .resolve_admin(&id)
        .await
        .ok_or_else(|| ApiError::Forbidden(format!("unknown admin: {admin_id}")))
}

/// List payouts for one of the four settlement views
#[utoipa::path(
    get,
    path = "/api/v1/payouts",
    tag = "Payouts",
    params(
        ("hotelId" = Option<String>, Query, description = "Scope to one hotel"),
        ("channel" = String, Query, description = "online or offline"),
        ("commissionPaid" = Option<bool>, Query, description = "Offline channel status"),
        ("transferred" = Option<bool>, Query, description = "Online channel status"),
        ("page" = Option<usize>, Query, description = "1-based page number"),
        ("pageSize" = Option<usize>, Query, description = "Page size, clamped to 200"),
    ),
    responses(
        (status = 200, description = "One page of matching reservations", body = PayoutPageResponse),
        (status = 400, description = "Invalid filter", body = crate::error::ErrorResponse),
    )
)]
pub async fn list_payouts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListPayoutsQuery>,
) -> ApiResult<Json<PayoutPageResponse>> {
    let filter = query.to_filter()?;
    let page = state.engine.list_payouts(&filter).await?;
    Ok(Json(page.into()))
}

/// Aggregate totals over the four settlement views
#[utoipa::path(
    get,
    path = "/api/v1/payouts/overview",
    tag = "Payouts",
    params(
        ("hotelId" = Option<String>, Query, description = "Scope to one hotel"),
    ),
    responses(
        (status = 200, description = "Counts and totals per view", body = OverviewResponse),
    )
)]
pub async fn get_overview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OverviewQuery>,
) -> ApiResult<Json<OverviewResponse>> {
    let hotel_id = query.hotel_id.as_deref().map(parse_hotel_id).transpose()?;
    let overview = state.engine.compute_overview(hotel_id.as_ref()).await;
    Ok(Json(overview.into()))
}

/// Charge a hotel's payment method for selected offline commissions
#[utoipa::path(
    post,
    path = "/api/v1/payouts/charge",
    tag = "Payouts",
    request_body = ChargeRequest,
    responses(
        (status = 200, description = "Charge captured and committed", body = ChargeResponse),
        (status = 400, description = "Invalid selection", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin may not charge", body = crate::error::ErrorResponse),
        (status = 502, description = "Payment processor failure", body = crate::error::ErrorResponse),
    )
)]
pub async fn charge_commissions(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChargeRequest>,
) -> ApiResult<Json<ChargeResponse>> {
    request.validate()?;
    let actor = require_admin(&state, &request.admin_id).await?;
    if !actor.role.can_charge() {
        return Err(ApiError::Forbidden(format!(
            "role {} may not charge commissions",
            actor.role
        )));
    }

    let hotel_id = parse_hotel_id(&request.hotel_id)?;
    let reservation_ids = request
        .reservation_ids
        .iter()
        .map(|s| parse_reservation_id(s))
        .collect::<ApiResult<Vec<_>>>()?;

    let outcome = state
        .engine
        .charge_owner_commissions(&hotel_id, &reservation_ids, request.sar_to_usd_rate, &actor)
        .await?;
    Ok(Json(outcome.into()))
}

/// Manually override settlement flags on one reservation
#[utoipa::path(
    patch,
    path = "/api/v1/payouts/flags",
    tag = "Payouts",
    request_body = OverrideFlagsRequest,
    responses(
        (status = 200, description = "Updated reservation", body = OverrideFlagsResponse),
        (status = 403, description = "Admin may not override", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown reservation", body = crate::error::ErrorResponse),
        (status = 422, description = "No actual change requested", body = crate::error::ErrorResponse),
    )
)]
pub async fn override_flags(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OverrideFlagsRequest>,
) -> ApiResult<Json<OverrideFlagsResponse>> {
    let actor = require_admin(&state, &request.admin_id).await?;
    if !actor.role.can_override() {
        return Err(ApiError::Forbidden(format!(
            "role {} may not override settlement flags",
            actor.role
        )));
    }

    let reservation_id = parse_reservation_id(&request.reservation_id)?;
    let updated = state
        .engine
        .ledger()
        .apply_manual_override(
            &reservation_id,
            FlagOverride {
                commission_paid: request.commission_paid,
                money_transferred_to_hotel: request.money_transferred_to_hotel,
            },
            request.note.clone(),
            actor,
        )
        .await?;
    Ok(Json(OverrideFlagsResponse::from(&updated)))
}

/// Net a hotel's commission debt against its payout credit
#[utoipa::path(
    post,
    path = "/api/v1/payouts/reconcile",
    tag = "Payouts",
    request_body = ReconcileRequest,
    responses(
        (status = 200, description = "Reconciliation run complete", body = ReconcileResponse),
        (status = 403, description = "Admin may not reconcile", body = crate::error::ErrorResponse),
        (status = 409, description = "A flag changed concurrently", body = crate::error::ErrorResponse),
    )
)]
pub async fn reconcile(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReconcileRequest>,
) -> ApiResult<Json<ReconcileResponse>> {
    let actor = require_admin(&state, &request.admin_id).await?;
    if !actor.role.can_reconcile() {
        return Err(ApiError::Forbidden(format!(
            "role {} may not run reconciliation",
            actor.role
        )));
    }

    let hotel_id = parse_hotel_id(&request.hotel_id)?;
    let result = state.engine.auto_reconcile_hotel(&hotel_id, &actor).await?;
    Ok(Json(result.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use chrono::NaiveDate;
    use nuzul_ledger::ReservationLedger;
    use nuzul_settlement::{FixedRateConverter, MockPaymentProcessor, SettlementEngine};
    use nuzul_types::{
        AdminId, AdminRole, CommissionInput, HotelId, NewReservation, PaymentChannel,
        PaymentMethodOnFile, Reservation,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;

    struct Fixture {
        server: TestServer,
        state: Arc<AppState>,
        hotel: HotelId,
        finance: AdminId,
        read_only: AdminId,
    }

    async fn fixture() -> Fixture {
        let engine = Arc::new(SettlementEngine::new(
            Arc::new(ReservationLedger::new()),
            Arc::new(MockPaymentProcessor::new()),
            Arc::new(FixedRateConverter::new(dec!(0.2667))),
        ));
        let state = Arc::new(AppState::new(engine));

        let finance = AdminId::new();
        let read_only = AdminId::new();
        state
            .register_admin(Actor::new(finance.clone(), "amal", AdminRole::Finance))
            .await;
        state
            .register_admin(Actor::new(read_only.clone(), "noor", AdminRole::ReadOnly))
            .await;

        let hotel = HotelId::new();
        state
            .engine
            .register_payment_method(
                hotel.clone(),
                PaymentMethodOnFile {
                    token: "tok_visa".to_string(),
                    label: "visa •• 4242".to_string(),
                },
            )
            .await;

        let server = TestServer::new(crate::create_test_router(state.clone())).unwrap();
        Fixture {
            server,
            state,
            hotel,
            finance,
            read_only,
        }
    }

    async fn seed(
        fx: &Fixture,
        channel: PaymentChannel,
        total: Decimal,
        commission: Decimal,
        day: u32,
    ) -> Reservation {
        fx.state
            .engine
            .ledger()
            .admit(NewReservation {
                id: None,
                hotel_id: fx.hotel.clone(),
                confirmation_number: format!("CN-{day:04}"),
                customer_name: "guest".to_string(),
                checkin_date: NaiveDate::from_ymd_opt(2025, 7, day).unwrap(),
                checkout_date: NaiveDate::from_ymd_opt(2025, 7, day + 1).unwrap(),
                total_amount_sar: total,
                payment_channel: channel,
                commission: CommissionInput::Precomputed(commission),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_ping_and_time() {
        let fx = fixture().await;
        fx.server.get("/api/v1/ping").await.assert_status_ok();
        let time = fx.server.get("/api/v1/time").await;
        time.assert_status_ok();
        assert!(time.json::<serde_json::Value>()["serverTime"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_list_payouts_filters_and_pages() {
        let fx = fixture().await;
        seed(&fx, PaymentChannel::Offline, dec!(500), dec!(60), 1).await;
        seed(&fx, PaymentChannel::Online, dec!(700), dec!(70), 2).await;

        let response = fx
            .server
            .get("/api/v1/payouts")
            .add_query_param("channel", "offline")
            .add_query_param("commissionPaid", "false")
            .add_query_param("hotelId", fx.hotel.to_string())
            .await;
        response.assert_status_ok();
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["ok"], true);
        assert_eq!(body["total"], 1);
        assert_eq!(body["reservations"][0]["paymentChannel"], "offline");
        assert_eq!(body["reservations"][0]["paymentStatus"], "paid_offline");
    }

    #[tokio::test]
    async fn test_list_payouts_rejects_mismatched_filter() {
        let fx = fixture().await;
        let response = fx
            .server
            .get("/api/v1/payouts")
            .add_query_param("channel", "offline")
            .add_query_param("transferred", "true")
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["ok"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_overview_includes_net_for_transfers() {
        let fx = fixture().await;
        seed(&fx, PaymentChannel::Online, dec!(1000), dec!(150), 1).await;

        let response = fx.server.get("/api/v1/payouts/overview").await;
        response.assert_status_ok();
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["ok"], true);
        assert_eq!(body["transfersDueToHotel"]["count"], 1);
        assert_eq!(body["transfersDueToHotel"]["netSar"], "850.00");
        assert!(body["commissionDueFromHotel"]["netSar"].is_null());
    }

    #[tokio::test]
    async fn test_charge_happy_path() {
        let fx = fixture().await;
        let a = seed(&fx, PaymentChannel::Offline, dec!(500), dec!(60), 1).await;

        let response = fx
            .server
            .post("/api/v1/payouts/charge")
            .json(&json!({
                "adminId": fx.finance.to_string(),
                "hotelId": fx.hotel.to_string(),
                "reservationIds": [a.id.to_string()],
            }))
            .await;
        response.assert_status_ok();
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["ok"], true);
        assert_eq!(body["capture"]["status"], "COMPLETED");
        assert_eq!(body["batch"]["totalSar"], "60.00");
        assert_eq!(body["reservationsUpdated"][0], a.id.to_string());
        assert!(fx
            .state
            .engine
            .ledger()
            .get(&a.id)
            .await
            .unwrap()
            .commission_paid);
    }

    #[tokio::test]
    async fn test_charge_requires_capability() {
        let fx = fixture().await;
        let a = seed(&fx, PaymentChannel::Offline, dec!(500), dec!(60), 1).await;

        let response = fx
            .server
            .post("/api/v1/payouts/charge")
            .json(&json!({
                "adminId": fx.read_only.to_string(),
                "hotelId": fx.hotel.to_string(),
                "reservationIds": [a.id.to_string()],
            }))
            .await;
        response.assert_status(axum::http::StatusCode::FORBIDDEN);

        // Unknown admin is forbidden too
        let response = fx
            .server
            .post("/api/v1/payouts/charge")
            .json(&json!({
                "adminId": AdminId::new().to_string(),
                "hotelId": fx.hotel.to_string(),
                "reservationIds": [a.id.to_string()],
            }))
            .await;
        response.assert_status(axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_override_flags_and_no_change() {
        let fx = fixture().await;
        let a = seed(&fx, PaymentChannel::Offline, dec!(500), dec!(60), 1).await;

        let response = fx
            .server
            .patch("/api/v1/payouts/flags")
            .json(&json!({
                "adminId": fx.finance.to_string(),
                "reservationId": a.id.to_string(),
                "commissionPaid": true,
                "note": "paid by bank transfer",
            }))
            .await;
        response.assert_status_ok();
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["ok"], true);
        assert_eq!(body["reservation"]["commissionPaid"], true);
        assert_eq!(body["reservation"]["lastChange"]["note"], "paid by bank transfer");
        assert_eq!(body["reservation"]["lastChange"]["actorName"], "amal");

        // Re-sending the same value is a no-op, reported as such
        let response = fx
            .server
            .patch("/api/v1/payouts/flags")
            .json(&json!({
                "adminId": fx.finance.to_string(),
                "reservationId": a.id.to_string(),
                "commissionPaid": true,
            }))
            .await;
        response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<serde_json::Value>()["code"], "NO_CHANGE");
    }

    #[tokio::test]
    async fn test_reconcile_endpoint() {
        let fx = fixture().await;
        seed(&fx, PaymentChannel::Offline, dec!(900), dec!(120), 1).await;
        // Online payout is 620 - 500 = 120, matching the commission owed
        seed(&fx, PaymentChannel::Online, dec!(620), dec!(500), 2).await;

        let response = fx
            .server
            .post("/api/v1/payouts/reconcile")
            .json(&json!({
                "adminId": fx.finance.to_string(),
                "hotelId": fx.hotel.to_string(),
            }))
            .await;
        response.assert_status_ok();
        let body = response.json::<serde_json::Value>();
        // Commission 120 nets exactly against the 120 payout; both
        // reservations flip and nothing stays owed on either side
        assert_eq!(body["ok"], true);
        assert_eq!(body["settledSar"], "120.00");
        assert_eq!(body["hotelWalletSar"], "0.00");
        assert_eq!(body["platformWalletSar"], "0.00");
        assert_eq!(body["reservationIdsAffected"].as_array().unwrap().len(), 2);
    }
}
