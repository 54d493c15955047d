//! Risk scoring rules: severity bands, assessments, and field-attributed validation reports.

pub mod assessment;
pub mod severity;
pub mod validation;

pub use assessment::{
    validate_assessment, PolicyId, RiskAssessment, RiskAssessmentInput, RiskFactor,
    RiskFactorInput, RiskFactorType, UnknownFactorType,
};
pub use severity::{RiskScore, ScoreOutOfRange, Severity, UnknownSeverity};
pub use validation::{RuleViolations, ValidationReport, Violation};
