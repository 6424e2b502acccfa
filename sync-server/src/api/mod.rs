//! API routes
//!
//! Two public webhook endpoints (scheduling + commerce) and a
//! bearer-token-guarded admin surface.

pub mod appointment_webhook;
pub mod auth;
pub mod health;
pub mod orders;
pub mod providers;
pub mod reports;
pub mod sale_webhook;
pub mod settings;

use axum::routing::{get, post, put};
use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Inbound webhooks (authenticity checked per-endpoint: HMAC for
    // commerce, optional shared token for scheduling)
    let webhooks = Router::new()
        .route(
            "/webhooks/appointments",
            post(appointment_webhook::handle_appointment),
        )
        .route("/webhooks/sales", post(sale_webhook::handle_sale));

    // Administrative surface (bearer token)
    let admin = Router::new()
        .route("/api/orders", get(orders::list).post(orders::create_manual))
        .route("/api/orders/{id}", get(orders::get_by_id))
        .route("/api/orders/{id}/checkout", post(orders::begin_checkout))
        .route("/api/orders/{id}/void", post(orders::void))
        .route("/api/orders/{id}/restore", post(orders::restore))
        .route(
            "/api/orders/{id}/appointment-date",
            put(orders::set_appointment_date),
        )
        .route("/api/orders/{id}/adjustment", post(orders::adjust_commission))
        .route("/api/providers", get(providers::list))
        .route("/api/providers/{id}", put(providers::update))
        .route(
            "/api/providers/{id}/tiers",
            get(providers::list_tiers).put(providers::replace_tiers),
        )
        .route("/api/providers/{id}/pin", put(providers::set_pin))
        .route("/api/settings", get(settings::get).put(settings::update))
        .route("/api/reports/commissions", get(reports::commissions))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(webhooks)
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
