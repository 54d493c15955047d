//! Underwriting intake, rule evaluation, and decision workflow.
//!
//! Assessments enter through [`UnderwritingService::submit`] (pre-scored) or
//! [`UnderwritingService::score`] (raw factor scores weighted by the evaluator). Every status change
//! after that passes the underwriting transition table; `APPROVED` and `DECLINED` are final.

pub mod decision;
pub mod domain;
pub mod evaluation;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use decision::{
    validate_decision, ProposedDecision, UnderwritingDecision, MIN_DECLINE_NOTES_CHARS,
};
pub use domain::{PolicyId, ScoreRequest, UnderwritingStatus};
pub use evaluation::{
    EvaluationConfig, EvaluationEngine, EvaluationOutcome, FactorWeights, ScoreComponent,
};
pub use repository::{
    CarrierError, CarrierGateway, CarrierReferral, UnderwritingRecord, UnderwritingRepository,
    UnderwritingStatusView,
};
pub use router::{underwriting_router, DecisionRequest};
pub use service::{UnderwritingService, UnderwritingServiceError};
