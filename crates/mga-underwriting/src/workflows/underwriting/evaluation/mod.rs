mod config;
mod policy;
mod rules;

pub use config::{EvaluationConfig, FactorWeights};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ScoreRequest, UnderwritingStatus};
use crate::risk::{PolicyId, RiskAssessment, RiskFactorType, RuleViolations, Severity};

/// Stateless evaluator that applies the rubric configuration to an assessment.
pub struct EvaluationEngine {
    config: EvaluationConfig,
}

impl EvaluationEngine {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Turn raw factor scores into a validated assessment.
    pub fn assess(
        &self,
        request: &ScoreRequest,
        assessed_at: DateTime<Utc>,
    ) -> Result<RiskAssessment, RuleViolations> {
        let (factors, risk_score) =
            rules::score_factors(&request.factor_scores, &self.config.factor_weights)?;

        RiskAssessment::new(
            PolicyId(request.policy_id.clone()),
            risk_score,
            factors,
            request.assessed_by.clone(),
            assessed_at,
        )
    }

    pub fn evaluate(&self, assessment: &RiskAssessment) -> EvaluationOutcome {
        let components = rules::components(assessment);
        let recommendation = policy::recommend(assessment, &self.config);

        EvaluationOutcome {
            policy_id: assessment.policy_id().clone(),
            risk_score: assessment.risk_score().value(),
            severity: assessment.severity(),
            recommended_status: recommendation.status,
            reasons: recommendation.reasons,
            components,
        }
    }
}

/// Discrete contribution to an evaluation, allowing transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: RiskFactorType,
    pub score: f64,
    pub weight: f64,
    pub contribution: f64,
    pub severity: Severity,
    pub notes: String,
}

/// Evaluation output describing the severity, suggested status, and decision trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub policy_id: PolicyId,
    pub risk_score: f64,
    pub severity: Severity,
    pub recommended_status: UnderwritingStatus,
    pub reasons: Vec<String>,
    pub components: Vec<ScoreComponent>,
}

impl EvaluationOutcome {
    pub fn summary(&self) -> String {
        format!(
            "{} risk ({:.2}), recommended {}",
            self.severity.label(),
            self.risk_score,
            self.recommended_status
        )
    }
}
