//! API routes

use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;

/// Create API v1 routes
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        // General endpoints
        .route("/ping", get(handlers::health::ping))
        .route("/time", get(handlers::health::server_time))
        // Payout operations
        .route("/payouts", get(handlers::payouts::list_payouts))
        .route("/payouts/overview", get(handlers::payouts::get_overview))
        .route("/payouts/charge", post(handlers::payouts::charge_commissions))
        .route("/payouts/flags", patch(handlers::payouts::override_flags))
        .route("/payouts/reconcile", post(handlers::payouts::reconcile))
}

/// Create Swagger UI routes
pub fn swagger_routes() -> Router<Arc<AppState>> {
    use crate::openapi::ApiDoc;
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
