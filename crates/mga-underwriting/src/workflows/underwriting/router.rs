use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::decision::ProposedDecision;
use super::domain::{PolicyId, ScoreRequest};
use super::repository::{CarrierGateway, UnderwritingRepository, UnderwritingStatusView};
use super::service::{UnderwritingService, UnderwritingServiceError};
use crate::risk::RiskAssessmentInput;
use crate::workflows::{JsonBody, RepositoryError};

const DEFAULT_QUEUE_LIMIT: usize = 50;

/// Body of a decision request: the proposal plus the deciding underwriter.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionRequest {
    #[serde(flatten)]
    pub proposal: ProposedDecision,
    #[serde(default)]
    pub decided_by: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueueParams {
    limit: Option<usize>,
}

/// Router builder exposing HTTP endpoints for assessment intake, evaluation, and decisions.
pub fn underwriting_router<R, C>(service: Arc<UnderwritingService<R, C>>) -> Router
where
    R: UnderwritingRepository + 'static,
    C: CarrierGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/underwriting/assessments",
            post(submit_handler::<R, C>),
        )
        .route("/api/v1/underwriting/scores", post(score_handler::<R, C>))
        .route("/api/v1/underwriting/queue", get(queue_handler::<R, C>))
        .route(
            "/api/v1/underwriting/files/:policy_id",
            get(status_handler::<R, C>),
        )
        .route(
            "/api/v1/underwriting/files/:policy_id/evaluate",
            post(evaluate_handler::<R, C>),
        )
        .route(
            "/api/v1/underwriting/files/:policy_id/decision",
            post(decision_handler::<R, C>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<R, C>(
    State(service): State<Arc<UnderwritingService<R, C>>>,
    JsonBody(input): JsonBody<RiskAssessmentInput>,
) -> Response
where
    R: UnderwritingRepository + 'static,
    C: CarrierGateway + 'static,
{
    match service.submit(input) {
        Ok(record) => (StatusCode::ACCEPTED, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn score_handler<R, C>(
    State(service): State<Arc<UnderwritingService<R, C>>>,
    JsonBody(request): JsonBody<ScoreRequest>,
) -> Response
where
    R: UnderwritingRepository + 'static,
    C: CarrierGateway + 'static,
{
    match service.score(request) {
        Ok(record) => (StatusCode::ACCEPTED, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn queue_handler<R, C>(
    State(service): State<Arc<UnderwritingService<R, C>>>,
    Query(params): Query<QueueParams>,
) -> Response
where
    R: UnderwritingRepository + 'static,
    C: CarrierGateway + 'static,
{
    let limit = params.limit.unwrap_or(DEFAULT_QUEUE_LIMIT);
    match service.queue(limit) {
        Ok(records) => {
            let views: Vec<UnderwritingStatusView> =
                records.iter().map(|record| record.status_view()).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, C>(
    State(service): State<Arc<UnderwritingService<R, C>>>,
    Path(policy_id): Path<String>,
) -> Response
where
    R: UnderwritingRepository + 'static,
    C: CarrierGateway + 'static,
{
    match service.get(&PolicyId(policy_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evaluate_handler<R, C>(
    State(service): State<Arc<UnderwritingService<R, C>>>,
    Path(policy_id): Path<String>,
) -> Response
where
    R: UnderwritingRepository + 'static,
    C: CarrierGateway + 'static,
{
    match service.evaluate(&PolicyId(policy_id)) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decision_handler<R, C>(
    State(service): State<Arc<UnderwritingService<R, C>>>,
    Path(policy_id): Path<String>,
    JsonBody(request): JsonBody<DecisionRequest>,
) -> Response
where
    R: UnderwritingRepository + 'static,
    C: CarrierGateway + 'static,
{
    match service.decide(&PolicyId(policy_id), request.proposal, &request.decided_by) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

/// Business rule failures map to 4xx; storage and integration faults map to 5xx.
pub(crate) fn error_response(error: UnderwritingServiceError) -> Response {
    let (status, payload) = match &error {
        UnderwritingServiceError::Violations(violations) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "error": "rule violations",
                "violations": violations.report().violations(),
            }),
        ),
        UnderwritingServiceError::Transition(refusal) => (
            StatusCode::CONFLICT,
            json!({
                "error": refusal.to_string(),
                "allowed": refusal.allowed,
            }),
        ),
        UnderwritingServiceError::Finalized { .. } => {
            (StatusCode::CONFLICT, json!({ "error": error.to_string() }))
        }
        UnderwritingServiceError::Repository(RepositoryError::NotFound) => {
            (StatusCode::NOT_FOUND, json!({ "error": error.to_string() }))
        }
        UnderwritingServiceError::Repository(RepositoryError::Conflict) => (
            StatusCode::CONFLICT,
            json!({ "error": "underwriting file already exists for this policy" }),
        ),
        UnderwritingServiceError::Repository(RepositoryError::Stale) => (
            StatusCode::CONFLICT,
            json!({ "error": "underwriting file changed concurrently; reload and retry" }),
        ),
        UnderwritingServiceError::Repository(RepositoryError::Unavailable(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": error.to_string() }),
        ),
        UnderwritingServiceError::Carrier(_) => {
            (StatusCode::BAD_GATEWAY, json!({ "error": error.to_string() }))
        }
    };

    (status, axum::Json(payload)).into_response()
}
