use std::fmt;

use serde::{Deserialize, Serialize};

/// One business-rule failure attributed to an input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Pass/fail result shared by every rule validator.
///
/// Only built from a violation list, so `valid` always agrees with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    valid: bool,
    violations: Vec<Violation>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::from_violations(Vec::new())
    }
}

impl ValidationReport {
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    pub fn has_violation_on(&self, field: &str) -> bool {
        self.violations
            .iter()
            .any(|violation| violation.field == field)
    }

    pub fn fields(&self) -> Vec<&str> {
        self.violations
            .iter()
            .map(|violation| violation.field.as_str())
            .collect()
    }

    /// Convert a failing report into an error; passing reports yield `Ok(())`.
    pub fn into_result(self) -> Result<(), RuleViolations> {
        if self.valid {
            Ok(())
        } else {
            Err(RuleViolations(self))
        }
    }
}

/// Failing validation report surfaced as an error so services can reject input before persistence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} rule violation(s): {}", .0.violations.len(), summarize(.0))]
pub struct RuleViolations(pub ValidationReport);

impl RuleViolations {
    pub fn report(&self) -> &ValidationReport {
        &self.0
    }

    pub fn into_report(self) -> ValidationReport {
        self.0
    }
}

fn summarize(report: &ValidationReport) -> String {
    report
        .violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Accumulates violations while a validator walks its input.
#[derive(Debug, Default)]
pub(crate) struct ViolationCollector {
    violations: Vec<Violation>,
}

impl ViolationCollector {
    pub(crate) fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(field, message));
    }

    pub(crate) fn finish(self) -> ValidationReport {
        ValidationReport::from_violations(self.violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reports_are_valid() {
        let report = ValidationReport::from_violations(Vec::new());
        assert!(report.is_valid());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn failing_reports_list_each_violation_in_the_error() {
        let mut collector = ViolationCollector::default();
        collector.push("notes", "required when declining");
        collector.push("conditions[0]", "must not be blank");
        let report = collector.finish();

        assert!(!report.is_valid());
        assert_eq!(report.fields(), vec!["notes", "conditions[0]"]);

        let error = report.into_result().expect_err("report has violations");
        let message = error.to_string();
        assert!(message.starts_with("2 rule violation(s)"));
        assert!(message.contains("notes: required when declining"));
    }

    #[test]
    fn default_report_agrees_with_its_violation_list() {
        let report = ValidationReport::default();
        assert!(report.is_valid());
        assert!(report.violations().is_empty());

        let body = serde_json::to_value(&report).expect("serializes");
        assert_eq!(body["valid"], true);
        assert_eq!(body["violations"], serde_json::json!([]));
    }
}
