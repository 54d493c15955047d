use serde::{Deserialize, Serialize};

use super::decision::UnderwritingDecision;
use super::domain::{PolicyId, UnderwritingStatus};
use super::evaluation::EvaluationOutcome;
use crate::risk::{RiskAssessment, Severity};
use crate::workflows::transitions::WorkflowStatus;
use crate::workflows::RepositoryError;

/// Repository record containing the assessment, evaluation, and decision history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderwritingRecord {
    pub assessment: RiskAssessment,
    pub status: UnderwritingStatus,
    pub evaluation: Option<EvaluationOutcome>,
    pub decisions: Vec<UnderwritingDecision>,
    /// Bumped on every successful update; guards against lost updates.
    #[serde(default)]
    pub revision: u64,
}

impl UnderwritingRecord {
    pub fn policy_id(&self) -> &PolicyId {
        self.assessment.policy_id()
    }

    pub fn latest_decision(&self) -> Option<&UnderwritingDecision> {
        self.decisions.last()
    }

    pub fn decision_rationale(&self) -> String {
        if let Some(decision) = self.latest_decision() {
            return match &decision.notes {
                Some(notes) => format!("{} by {}: {}", decision.status, decision.decided_by, notes),
                None => format!("{} by {}", decision.status, decision.decided_by),
            };
        }

        match &self.evaluation {
            Some(outcome) => outcome.summary(),
            None => "pending evaluation".to_string(),
        }
    }

    pub fn status_view(&self) -> UnderwritingStatusView {
        UnderwritingStatusView {
            policy_id: self.policy_id().clone(),
            status: self.status,
            severity: self.assessment.severity(),
            risk_score: self.assessment.risk_score().value(),
            allowed_next: self.status.allowed_codes(),
            decision_rationale: self.decision_rationale(),
            conditions: self
                .latest_decision()
                .map(|decision| decision.conditions.clone())
                .unwrap_or_default(),
        }
    }
}

/// Storage abstraction so the service module can be exercised in isolation.
pub trait UnderwritingRepository: Send + Sync {
    fn insert(&self, record: UnderwritingRecord) -> Result<UnderwritingRecord, RepositoryError>;
    /// Replace the stored file only while its revision still equals `expected_revision`,
    /// returning [`RepositoryError::Stale`] otherwise.
    fn update(
        &self,
        record: UnderwritingRecord,
        expected_revision: u64,
    ) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &PolicyId) -> Result<Option<UnderwritingRecord>, RepositoryError>;
    /// Records still awaiting an underwriter, oldest assessment first.
    fn pending(&self, limit: usize) -> Result<Vec<UnderwritingRecord>, RepositoryError>;
}

/// Outbound hook to the carrier's referral intake.
pub trait CarrierGateway: Send + Sync {
    fn refer(&self, referral: CarrierReferral) -> Result<(), CarrierError>;
}

/// Referral payload handed to the carrier for high risk placements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierReferral {
    pub policy_id: PolicyId,
    pub risk_score: f64,
    pub severity: Severity,
    pub reasons: Vec<String>,
}

/// Carrier dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum CarrierError {
    #[error("carrier integration unavailable: {0}")]
    Transport(String),
    #[error("carrier rejected referral: {0}")]
    Rejected(String),
}

/// Sanitized representation of an underwriting file's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct UnderwritingStatusView {
    pub policy_id: PolicyId,
    pub status: UnderwritingStatus,
    pub severity: Severity,
    pub risk_score: f64,
    pub allowed_next: Vec<&'static str>,
    pub decision_rationale: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
}
