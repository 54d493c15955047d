use std::collections::BTreeMap;

use super::config::FactorWeights;
use super::ScoreComponent;
use crate::risk::validation::ViolationCollector;
use crate::risk::{RiskAssessment, RiskFactor, RiskFactorType, RiskScore, RuleViolations};

/// Build weighted factors from raw scores and fold them into a composite score.
///
/// The composite is normalised by the weight actually supplied, so a partial factor set is
/// scored on the same 0-100 scale as a complete one.
pub(crate) fn score_factors(
    scores: &BTreeMap<RiskFactorType, f64>,
    weights: &FactorWeights,
) -> Result<(Vec<RiskFactor>, RiskScore), RuleViolations> {
    let mut violations = ViolationCollector::default();

    if scores.is_empty() {
        violations.push("factor_scores", "at least one factor score is required");
    }

    let mut factors = Vec::with_capacity(scores.len());
    for (factor_type, raw) in scores {
        let field = format!("factor_scores.{factor_type}");
        let score = match RiskScore::new(*raw) {
            Ok(score) => score,
            Err(err) => {
                violations.push(field, err.to_string());
                continue;
            }
        };

        match RiskFactor::new(*factor_type, score, weights.weight_for(*factor_type)) {
            Ok(factor) => factors.push(factor),
            Err(err) => {
                for violation in err.into_report().into_violations() {
                    violations.push(format!("{field}.{}", violation.field), violation.message);
                }
            }
        }
    }

    let total_weight: f64 = factors.iter().map(RiskFactor::weight).sum();
    if !factors.is_empty() && total_weight <= 0.0 {
        violations.push("factor_scores", "configured weights for these factors are all zero");
    }

    let report = violations.finish();
    if !report.is_valid() {
        return Err(RuleViolations(report));
    }

    let weighted: f64 = factors
        .iter()
        .map(|factor| factor.score().value() * factor.weight())
        .sum();
    let composite = round_to_hundredths(weighted / total_weight).clamp(0.0, 100.0);
    let risk_score = RiskScore::new(composite).map_err(|err| {
        let mut violations = ViolationCollector::default();
        violations.push("factor_scores", err.to_string());
        RuleViolations(violations.finish())
    })?;

    Ok((factors, risk_score))
}

/// Break an assessment into per-factor contributions for the audit trail.
pub(crate) fn components(assessment: &RiskAssessment) -> Vec<ScoreComponent> {
    let total_weight: f64 = assessment.factors().iter().map(RiskFactor::weight).sum();

    assessment
        .factors()
        .iter()
        .map(|factor| {
            let contribution = if total_weight > 0.0 {
                round_to_hundredths(factor.score().value() * factor.weight() / total_weight)
            } else {
                0.0
            };
            ScoreComponent {
                factor: factor.factor_type(),
                score: factor.score().value(),
                weight: factor.weight(),
                contribution,
                severity: factor.severity(),
                notes: format!(
                    "{} scored {} ({}) at weight {:.2}",
                    factor.factor_type().label(),
                    factor.score(),
                    factor.severity(),
                    factor.weight()
                ),
            }
        })
        .collect()
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
