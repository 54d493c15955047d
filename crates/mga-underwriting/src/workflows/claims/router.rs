use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{ClaimId, ClaimTransitionRequest, OpenClaimRequest};
use super::repository::ClaimRepository;
use super::service::{ClaimService, ClaimServiceError};
use crate::workflows::{JsonBody, RepositoryError};

/// Router exposing claim intake and status endpoints.
pub fn claim_router<R>(service: Arc<ClaimService<R>>) -> Router
where
    R: ClaimRepository + 'static,
{
    Router::new()
        .route("/api/v1/claims", post(open_handler::<R>))
        .route("/api/v1/claims/:claim_id", get(claim_handler::<R>))
        .route(
            "/api/v1/claims/:claim_id/status",
            post(transition_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn open_handler<R>(
    State(service): State<Arc<ClaimService<R>>>,
    JsonBody(request): JsonBody<OpenClaimRequest>,
) -> Response
where
    R: ClaimRepository + 'static,
{
    match service.open(request) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn claim_handler<R>(
    State(service): State<Arc<ClaimService<R>>>,
    Path(claim_id): Path<String>,
) -> Response
where
    R: ClaimRepository + 'static,
{
    match service.get(&ClaimId(claim_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn transition_handler<R>(
    State(service): State<Arc<ClaimService<R>>>,
    Path(claim_id): Path<String>,
    JsonBody(request): JsonBody<ClaimTransitionRequest>,
) -> Response
where
    R: ClaimRepository + 'static,
{
    match service.transition(&ClaimId(claim_id), request.status, request.note) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_response(error: ClaimServiceError) -> Response {
    let status = match &error {
        ClaimServiceError::MissingPolicy => StatusCode::UNPROCESSABLE_ENTITY,
        ClaimServiceError::Transition(_) => StatusCode::CONFLICT,
        ClaimServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ClaimServiceError::Repository(RepositoryError::Conflict | RepositoryError::Stale) => {
            StatusCode::CONFLICT
        }
        ClaimServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = match &error {
        ClaimServiceError::Transition(refusal) => json!({
            "error": refusal.to_string(),
            "allowed": refusal.allowed,
        }),
        other => json!({ "error": other.to_string() }),
    };

    (status, axum::Json(payload)).into_response()
}
