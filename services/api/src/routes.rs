use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use mga_underwriting::workflows::claims::{claim_router, ClaimRepository, ClaimService};
use mga_underwriting::workflows::rules::rules_router;
use mga_underwriting::workflows::underwriting::{
    underwriting_router, CarrierGateway, UnderwritingRepository, UnderwritingService,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_application_routes<R, C, K>(
    underwriting: Arc<UnderwritingService<R, C>>,
    claims: Arc<ClaimService<K>>,
) -> axum::Router
where
    R: UnderwritingRepository + 'static,
    C: CarrierGateway + 'static,
    K: ClaimRepository + 'static,
{
    underwriting_router(underwriting)
        .merge(claim_router(claims))
        .merge(rules_router())
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
