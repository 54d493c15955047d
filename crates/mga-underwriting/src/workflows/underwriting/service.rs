use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::decision::{ProposedDecision, UnderwritingDecision};
use super::domain::{PolicyId, ScoreRequest, UnderwritingStatus};
use super::evaluation::{EvaluationConfig, EvaluationEngine, EvaluationOutcome};
use super::repository::{
    CarrierError, CarrierGateway, CarrierReferral, UnderwritingRecord, UnderwritingRepository,
};
use crate::risk::{RiskAssessment, RiskAssessmentInput, RuleViolations};
use crate::workflows::transitions::{check_transition, TransitionError, WorkflowStatus};
use crate::workflows::RepositoryError;

/// Service composing the rule evaluator, repository, and carrier referral hook.
pub struct UnderwritingService<R, C> {
    repository: Arc<R>,
    carrier: Arc<C>,
    engine: Arc<EvaluationEngine>,
}

impl<R, C> UnderwritingService<R, C>
where
    R: UnderwritingRepository + 'static,
    C: CarrierGateway + 'static,
{
    pub fn new(repository: Arc<R>, carrier: Arc<C>, config: EvaluationConfig) -> Self {
        Self {
            repository,
            carrier,
            engine: Arc::new(EvaluationEngine::new(config)),
        }
    }

    pub fn engine(&self) -> &EvaluationEngine {
        &self.engine
    }

    /// Validate and store a submitted assessment. Rejected input is never persisted.
    pub fn submit(
        &self,
        input: RiskAssessmentInput,
    ) -> Result<UnderwritingRecord, UnderwritingServiceError> {
        let assessment = RiskAssessment::try_from(input).map_err(|err| {
            warn!(violations = err.report().violations().len(), "assessment rejected");
            err
        })?;
        self.open(assessment)
    }

    /// Score raw factor inputs with the configured weights, then store the assessment.
    pub fn score(
        &self,
        request: ScoreRequest,
    ) -> Result<UnderwritingRecord, UnderwritingServiceError> {
        let assessment = self.engine.assess(&request, Utc::now())?;
        self.open(assessment)
    }

    fn open(
        &self,
        assessment: RiskAssessment,
    ) -> Result<UnderwritingRecord, UnderwritingServiceError> {
        let record = UnderwritingRecord {
            assessment,
            status: UnderwritingStatus::PendingReview,
            evaluation: None,
            decisions: Vec::new(),
            revision: 0,
        };

        let stored = self.repository.insert(record)?;
        info!(
            policy_id = %stored.policy_id(),
            risk_score = %stored.assessment.risk_score(),
            severity = %stored.assessment.severity(),
            "underwriting file opened"
        );
        Ok(stored)
    }

    /// Run the rule evaluator and move the file to the recommended status.
    pub fn evaluate(
        &self,
        policy_id: &PolicyId,
    ) -> Result<EvaluationOutcome, UnderwritingServiceError> {
        let mut record = self.fetch(policy_id)?;
        ensure_open(&record)?;

        let outcome = self.engine.evaluate(&record.assessment);
        check_transition(record.status, outcome.recommended_status)?;

        // A failed referral leaves the file where it was so the evaluation can be retried.
        if outcome.recommended_status == UnderwritingStatus::ReferredToCarrier {
            self.carrier.refer(CarrierReferral {
                policy_id: outcome.policy_id.clone(),
                risk_score: outcome.risk_score,
                severity: outcome.severity,
                reasons: outcome.reasons.clone(),
            })?;
        }

        record.status = outcome.recommended_status;
        record.evaluation = Some(outcome.clone());
        self.store(record)?;
        info!(%policy_id, outcome = %outcome.summary(), "underwriting evaluated");

        Ok(outcome)
    }

    /// Apply an underwriter's decision after rule validation and the transition gate.
    pub fn decide(
        &self,
        policy_id: &PolicyId,
        proposal: ProposedDecision,
        decided_by: &str,
    ) -> Result<UnderwritingRecord, UnderwritingServiceError> {
        let decision = UnderwritingDecision::from_proposal(&proposal, decided_by, Utc::now())?;

        let mut record = self.fetch(policy_id)?;
        ensure_open(&record)?;
        if let Err(err) = check_transition(record.status, decision.status) {
            warn!(%policy_id, error = %err, "underwriting decision refused");
            return Err(err.into());
        }

        if decision.status == UnderwritingStatus::ReferredToCarrier {
            self.carrier.refer(CarrierReferral {
                policy_id: policy_id.clone(),
                risk_score: record.assessment.risk_score().value(),
                severity: record.assessment.severity(),
                reasons: decision
                    .notes
                    .iter()
                    .cloned()
                    .chain(decision.conditions.iter().cloned())
                    .collect(),
            })?;
        }

        let from = record.status;
        record.status = decision.status;
        record.decisions.push(decision);
        let stored = self.store(record)?;

        if let Some(decision) = stored.latest_decision() {
            info!(
                %policy_id,
                %from,
                to = %decision.status,
                by = %decision.decided_by,
                "underwriting decision recorded"
            );
        }
        Ok(stored)
    }

    /// Fetch an underwriting file for API responses.
    pub fn get(&self, policy_id: &PolicyId) -> Result<UnderwritingRecord, UnderwritingServiceError> {
        self.fetch(policy_id)
    }

    /// Files still awaiting an underwriter.
    pub fn queue(&self, limit: usize) -> Result<Vec<UnderwritingRecord>, UnderwritingServiceError> {
        Ok(self.repository.pending(limit)?)
    }

    /// Persist a changed file against the revision it was read at.
    fn store(
        &self,
        mut record: UnderwritingRecord,
    ) -> Result<UnderwritingRecord, UnderwritingServiceError> {
        let expected = record.revision;
        record.revision += 1;
        if let Err(err) = self.repository.update(record.clone(), expected) {
            if matches!(err, RepositoryError::Stale) {
                warn!(
                    policy_id = %record.policy_id(),
                    revision = expected,
                    "underwriting file changed concurrently"
                );
            }
            return Err(err.into());
        }
        Ok(record)
    }

    fn fetch(&self, policy_id: &PolicyId) -> Result<UnderwritingRecord, UnderwritingServiceError> {
        let record = self
            .repository
            .fetch(policy_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

fn ensure_open(record: &UnderwritingRecord) -> Result<(), UnderwritingServiceError> {
    if record.status.is_terminal() {
        return Err(UnderwritingServiceError::Finalized {
            policy_id: record.policy_id().clone(),
            status: record.status,
        });
    }
    Ok(())
}

/// Error raised by the underwriting service.
#[derive(Debug, thiserror::Error)]
pub enum UnderwritingServiceError {
    #[error(transparent)]
    Violations(#[from] RuleViolations),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("underwriting for {policy_id} is final ({status})")]
    Finalized {
        policy_id: PolicyId,
        status: UnderwritingStatus,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Carrier(#[from] CarrierError),
}
