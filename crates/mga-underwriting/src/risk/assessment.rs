use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::severity::{RiskScore, Severity};
use super::validation::{RuleViolations, ValidationReport, ViolationCollector};

/// Allowed slack when checking that factor weights sum to one.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Identifier of the policy being underwritten.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(pub String);

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fixed set of contributors to an underwriting score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskFactorType {
    ClaimsHistory,
    LocationRisk,
    CoverageAmount,
    BusinessType,
}

impl RiskFactorType {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::ClaimsHistory,
            Self::LocationRisk,
            Self::CoverageAmount,
            Self::BusinessType,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::ClaimsHistory => "CLAIMS_HISTORY",
            Self::LocationRisk => "LOCATION_RISK",
            Self::CoverageAmount => "COVERAGE_AMOUNT",
            Self::BusinessType => "BUSINESS_TYPE",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ClaimsHistory => "Claims history",
            Self::LocationRisk => "Location risk",
            Self::CoverageAmount => "Coverage amount",
            Self::BusinessType => "Business type",
        }
    }
}

impl fmt::Display for RiskFactorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown risk factor type '{0}'")]
pub struct UnknownFactorType(pub String);

impl FromStr for RiskFactorType {
    type Err = UnknownFactorType;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim();
        RiskFactorType::ordered()
            .into_iter()
            .find(|kind| kind.code().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| UnknownFactorType(raw.to_string()))
    }
}

/// Wire shape of a factor as submitted by callers; nothing is trusted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactorInput {
    #[serde(rename = "type")]
    pub factor_type: String,
    pub score: f64,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

/// Wire shape of an assessment as submitted by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessmentInput {
    pub policy_id: String,
    pub risk_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default)]
    pub factors: Vec<RiskFactorInput>,
    #[serde(default)]
    pub assessed_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_date: Option<DateTime<Utc>>,
}

/// A validated, weighted contributor. Its severity always matches its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RiskFactorInput")]
pub struct RiskFactor {
    #[serde(rename = "type")]
    factor_type: RiskFactorType,
    score: RiskScore,
    weight: f64,
    severity: Severity,
}

impl RiskFactor {
    pub fn new(
        factor_type: RiskFactorType,
        score: RiskScore,
        weight: f64,
    ) -> Result<Self, RuleViolations> {
        if let Err(message) = check_weight(weight) {
            let mut violations = ViolationCollector::default();
            violations.push("weight", message);
            return Err(RuleViolations(violations.finish()));
        }

        Ok(Self {
            factor_type,
            score,
            weight,
            severity: score.severity(),
        })
    }

    pub fn factor_type(&self) -> RiskFactorType {
        self.factor_type
    }

    pub fn score(&self) -> RiskScore {
        self.score
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    fn to_input(&self) -> RiskFactorInput {
        RiskFactorInput {
            factor_type: self.factor_type.code().to_string(),
            score: self.score.value(),
            weight: self.weight,
            severity: Some(self.severity.code().to_string()),
        }
    }
}

impl TryFrom<RiskFactorInput> for RiskFactor {
    type Error = RuleViolations;

    fn try_from(input: RiskFactorInput) -> Result<Self, Self::Error> {
        let mut violations = ViolationCollector::default();
        let factor = parse_factor(&input, "", &mut violations);
        match factor {
            Some(factor) => Ok(factor),
            None => Err(RuleViolations(violations.finish())),
        }
    }
}

/// One scoring pass for a policy. Severity is derived from the score at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RiskAssessmentInput")]
pub struct RiskAssessment {
    policy_id: PolicyId,
    risk_score: RiskScore,
    severity: Severity,
    factors: Vec<RiskFactor>,
    assessed_by: String,
    assessment_date: DateTime<Utc>,
}

impl RiskAssessment {
    /// Assemble an assessment from typed parts, applying the same rules as inbound submissions.
    pub fn new(
        policy_id: PolicyId,
        risk_score: RiskScore,
        factors: Vec<RiskFactor>,
        assessed_by: impl Into<String>,
        assessment_date: DateTime<Utc>,
    ) -> Result<Self, RuleViolations> {
        let input = RiskAssessmentInput {
            policy_id: policy_id.0,
            risk_score: risk_score.value(),
            severity: None,
            factors: factors.iter().map(RiskFactor::to_input).collect(),
            assessed_by: assessed_by.into(),
            assessment_date: Some(assessment_date),
        };
        Self::try_from(input)
    }

    pub fn policy_id(&self) -> &PolicyId {
        &self.policy_id
    }

    pub fn risk_score(&self) -> RiskScore {
        self.risk_score
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn factors(&self) -> &[RiskFactor] {
        &self.factors
    }

    pub fn assessed_by(&self) -> &str {
        &self.assessed_by
    }

    pub fn assessment_date(&self) -> DateTime<Utc> {
        self.assessment_date
    }

    pub fn factor(&self, factor_type: RiskFactorType) -> Option<&RiskFactor> {
        self.factors
            .iter()
            .find(|factor| factor.factor_type == factor_type)
    }
}

impl TryFrom<RiskAssessmentInput> for RiskAssessment {
    type Error = RuleViolations;

    fn try_from(input: RiskAssessmentInput) -> Result<Self, Self::Error> {
        parse_assessment(&input).map_err(RuleViolations)
    }
}

/// Check an inbound assessment without building it. Never mutates the input.
pub fn validate_assessment(input: &RiskAssessmentInput) -> ValidationReport {
    match parse_assessment(input) {
        Ok(_) => ValidationReport::from_violations(Vec::new()),
        Err(report) => report,
    }
}

fn parse_assessment(input: &RiskAssessmentInput) -> Result<RiskAssessment, ValidationReport> {
    let mut violations = ViolationCollector::default();

    let policy_id = input.policy_id.trim();
    if policy_id.is_empty() {
        violations.push("policy_id", "policy id is required");
    }

    let assessed_by = input.assessed_by.trim();
    if assessed_by.is_empty() {
        violations.push("assessed_by", "assessor is required");
    }

    let risk_score = match RiskScore::new(input.risk_score) {
        Ok(score) => Some(score),
        Err(err) => {
            violations.push("risk_score", err.to_string());
            None
        }
    };
    check_declared_severity(
        input.severity.as_deref(),
        risk_score,
        "severity",
        &mut violations,
    );

    if input.factors.is_empty() {
        violations.push(
            "factors",
            "a complete assessment needs at least one risk factor",
        );
    }

    let mut factors = Vec::with_capacity(input.factors.len());
    let mut seen = BTreeSet::new();
    for (index, raw) in input.factors.iter().enumerate() {
        let prefix = format!("factors[{index}].");
        if let Some(factor) = parse_factor(raw, &prefix, &mut violations) {
            if !seen.insert(factor.factor_type) {
                violations.push(
                    format!("{prefix}type"),
                    format!("duplicate risk factor {}", factor.factor_type),
                );
            }
            factors.push(factor);
        }
    }

    let complete_set = factors.len() == input.factors.len()
        && seen.len() == RiskFactorType::ordered().len();
    if complete_set {
        let total: f64 = factors.iter().map(|factor| factor.weight).sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            violations.push(
                "factors",
                format!("factor weights must sum to 1.0, found {total:.4}"),
            );
        }
    }

    let report = violations.finish();
    match risk_score {
        Some(risk_score) if report.is_valid() => Ok(RiskAssessment {
            policy_id: PolicyId(policy_id.to_string()),
            risk_score,
            severity: risk_score.severity(),
            factors,
            assessed_by: assessed_by.to_string(),
            assessment_date: input.assessment_date.unwrap_or_else(Utc::now),
        }),
        _ => Err(report),
    }
}

fn parse_factor(
    raw: &RiskFactorInput,
    prefix: &str,
    violations: &mut ViolationCollector,
) -> Option<RiskFactor> {
    let factor_type = match raw.factor_type.parse::<RiskFactorType>() {
        Ok(kind) => Some(kind),
        Err(err) => {
            violations.push(format!("{prefix}type"), err.to_string());
            None
        }
    };

    let score = match RiskScore::new(raw.score) {
        Ok(score) => Some(score),
        Err(err) => {
            violations.push(format!("{prefix}score"), err.to_string());
            None
        }
    };

    let weight_ok = match check_weight(raw.weight) {
        Ok(()) => true,
        Err(message) => {
            violations.push(format!("{prefix}weight"), message);
            false
        }
    };

    let severity_ok = check_declared_severity(
        raw.severity.as_deref(),
        score,
        &format!("{prefix}severity"),
        violations,
    );

    match (factor_type, score) {
        (Some(factor_type), Some(score)) if weight_ok && severity_ok => Some(RiskFactor {
            factor_type,
            score,
            weight: raw.weight,
            severity: score.severity(),
        }),
        _ => None,
    }
}

fn check_weight(weight: f64) -> Result<(), String> {
    if weight.is_finite() && (0.0..=1.0).contains(&weight) {
        Ok(())
    } else {
        Err(format!("weight {weight} must be between 0 and 1"))
    }
}

/// A declared severity is optional; when present it must parse and agree with the score's band.
fn check_declared_severity(
    declared: Option<&str>,
    score: Option<RiskScore>,
    field: &str,
    violations: &mut ViolationCollector,
) -> bool {
    let Some(raw) = declared else {
        return true;
    };

    match (raw.parse::<Severity>(), score) {
        (Err(err), _) => {
            violations.push(field, err.to_string());
            false
        }
        (Ok(declared), Some(score)) if declared != score.severity() => {
            violations.push(
                field,
                format!(
                    "severity {declared} does not match score {score} (expected {})",
                    score.severity()
                ),
            );
            false
        }
        _ => true,
    }
}
