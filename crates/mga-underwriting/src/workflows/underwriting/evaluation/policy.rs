use super::super::domain::UnderwritingStatus;
use super::config::EvaluationConfig;
use crate::risk::{RiskAssessment, Severity};

/// Suggested workflow status plus the reasons that produced it.
pub(crate) struct Recommendation {
    pub status: UnderwritingStatus,
    pub reasons: Vec<String>,
}

pub(crate) fn recommend(assessment: &RiskAssessment, config: &EvaluationConfig) -> Recommendation {
    let severity = assessment.severity();
    let mut reasons = vec![format!(
        "composite score {} falls in the {} band",
        assessment.risk_score(),
        severity
    )];

    let status = match severity {
        Severity::Low => {
            let high_factors: Vec<String> = assessment
                .factors()
                .iter()
                .filter(|factor| factor.severity() == Severity::High)
                .map(|factor| {
                    format!(
                        "{} scored {} (HIGH)",
                        factor.factor_type().label(),
                        factor.score()
                    )
                })
                .collect();

            if config.escalate_on_high_factor && !high_factors.is_empty() {
                reasons.extend(high_factors);
                UnderwritingStatus::ManualReview
            } else {
                UnderwritingStatus::AutoApproved
            }
        }
        Severity::Medium => UnderwritingStatus::ManualReview,
        Severity::High if config.refer_high_risk_to_carrier => {
            reasons.push("high risk placements are referred to the carrier".to_string());
            UnderwritingStatus::ReferredToCarrier
        }
        Severity::High => UnderwritingStatus::ManualReview,
    };

    Recommendation { status, reasons }
}
