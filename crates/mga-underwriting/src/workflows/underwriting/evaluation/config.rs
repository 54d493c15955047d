use serde::{Deserialize, Serialize};

use crate::config::UnderwritingSettings;
use crate::risk::RiskFactorType;

/// Weights applied when scoring raw factor inputs. The full set sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub claims_history: f64,
    pub location_risk: f64,
    pub coverage_amount: f64,
    pub business_type: f64,
}

impl FactorWeights {
    pub fn weight_for(&self, factor_type: RiskFactorType) -> f64 {
        match factor_type {
            RiskFactorType::ClaimsHistory => self.claims_history,
            RiskFactorType::LocationRisk => self.location_risk,
            RiskFactorType::CoverageAmount => self.coverage_amount,
            RiskFactorType::BusinessType => self.business_type,
        }
    }
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            claims_history: 0.35,
            location_risk: 0.25,
            coverage_amount: 0.20,
            business_type: 0.20,
        }
    }
}

/// Rubric configuration for the underwriting evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub factor_weights: FactorWeights,
    pub refer_high_risk_to_carrier: bool,
    pub escalate_on_high_factor: bool,
}

impl EvaluationConfig {
    pub fn from_settings(settings: &UnderwritingSettings) -> Self {
        Self {
            factor_weights: FactorWeights::default(),
            refer_high_risk_to_carrier: settings.refer_high_risk_to_carrier,
            escalate_on_high_factor: settings.escalate_on_high_factor,
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self::from_settings(&UnderwritingSettings::default())
    }
}
