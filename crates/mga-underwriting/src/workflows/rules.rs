//! Side-effect free rule endpoints: severity lookup, validators, and the transition gate.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::payload::JsonBody;
use super::transitions::WorkflowEntity;
use super::underwriting::{validate_decision, ProposedDecision};
use crate::risk::{
    validate_assessment, RiskAssessmentInput, RiskScore, Severity, ValidationReport, Violation,
};

#[derive(Debug, Deserialize)]
pub struct SeverityRequest {
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct SeverityResponse {
    pub score: RiskScore,
    pub severity: Severity,
}

#[derive(Debug, Deserialize)]
pub struct TransitionCheckRequest {
    pub entity: WorkflowEntity,
    pub current_status: String,
    pub proposed_status: String,
}

#[derive(Debug, Serialize)]
pub struct TransitionCheckResponse {
    pub entity: WorkflowEntity,
    pub allowed: bool,
    pub allowed_next: Vec<&'static str>,
}

pub fn rules_router() -> Router {
    Router::new()
        .route("/api/v1/rules/severity", post(severity_handler))
        .route(
            "/api/v1/rules/assessments/validate",
            post(assessment_validation_handler),
        )
        .route(
            "/api/v1/rules/decisions/validate",
            post(decision_validation_handler),
        )
        .route("/api/v1/rules/transitions/check", post(transition_handler))
}

pub(crate) async fn severity_handler(JsonBody(request): JsonBody<SeverityRequest>) -> Response {
    match RiskScore::new(request.score) {
        Ok(score) => {
            let body = SeverityResponse {
                score,
                severity: score.severity(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            let report =
                ValidationReport::from_violations(vec![Violation::new("score", err.to_string())]);
            (StatusCode::UNPROCESSABLE_ENTITY, Json(report)).into_response()
        }
    }
}

pub(crate) async fn assessment_validation_handler(
    JsonBody(input): JsonBody<RiskAssessmentInput>,
) -> Json<ValidationReport> {
    Json(validate_assessment(&input))
}

pub(crate) async fn decision_validation_handler(
    JsonBody(proposal): JsonBody<ProposedDecision>,
) -> Json<ValidationReport> {
    Json(validate_decision(&proposal))
}

pub(crate) async fn transition_handler(JsonBody(request): JsonBody<TransitionCheckRequest>) -> Response {
    let TransitionCheckRequest {
        entity,
        current_status,
        proposed_status,
    } = request;

    let checked = entity
        .transition_allowed(&current_status, &proposed_status)
        .and_then(|allowed| Ok((allowed, entity.allowed_from(&current_status)?)));

    match checked {
        Ok((allowed, allowed_next)) => (
            StatusCode::OK,
            Json(TransitionCheckResponse {
                entity,
                allowed,
                allowed_next,
            }),
        )
            .into_response(),
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}
