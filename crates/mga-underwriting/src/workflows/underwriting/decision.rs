use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::UnderwritingStatus;
use crate::risk::validation::ViolationCollector;
use crate::risk::{RuleViolations, ValidationReport};

/// Minimum length of the notes explaining a decline.
pub const MIN_DECLINE_NOTES_CHARS: usize = 10;

/// Decision as proposed by an underwriter, before any rule has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedDecision {
    pub decision: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<String>>,
}

/// An accepted decision for one review cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnderwritingDecision {
    pub status: UnderwritingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    pub decided_by: String,
    pub decided_at: DateTime<Utc>,
}

impl UnderwritingDecision {
    pub fn from_proposal(
        proposal: &ProposedDecision,
        decided_by: &str,
        decided_at: DateTime<Utc>,
    ) -> Result<Self, RuleViolations> {
        let mut violations = ViolationCollector::default();
        let status = check_proposal(proposal, &mut violations);
        if decided_by.trim().is_empty() {
            violations.push("decided_by", "decision must name the underwriter");
        }

        let report = violations.finish();
        match status {
            Some(status) if report.is_valid() => Ok(Self {
                status,
                notes: proposal
                    .notes
                    .as_deref()
                    .map(str::trim)
                    .filter(|notes| !notes.is_empty())
                    .map(str::to_string),
                conditions: proposal
                    .conditions
                    .iter()
                    .flatten()
                    .map(|condition| condition.trim().to_string())
                    .collect(),
                decided_by: decided_by.trim().to_string(),
                decided_at,
            }),
            _ => Err(RuleViolations(report)),
        }
    }
}

/// Check a proposed decision. Never mutates the input.
pub fn validate_decision(proposal: &ProposedDecision) -> ValidationReport {
    let mut violations = ViolationCollector::default();
    check_proposal(proposal, &mut violations);
    violations.finish()
}

fn check_proposal(
    proposal: &ProposedDecision,
    violations: &mut ViolationCollector,
) -> Option<UnderwritingStatus> {
    let status = match proposal.decision.parse::<UnderwritingStatus>() {
        Ok(status) => Some(status),
        Err(err) => {
            violations.push("decision", err.to_string());
            None
        }
    };

    if status == Some(UnderwritingStatus::Declined) {
        let length = proposal
            .notes
            .as_deref()
            .map(|notes| notes.trim().chars().count())
            .unwrap_or(0);
        if length < MIN_DECLINE_NOTES_CHARS {
            violations.push(
                "notes",
                format!(
                    "declining requires notes of at least {MIN_DECLINE_NOTES_CHARS} characters"
                ),
            );
        }
    }

    if let Some(conditions) = &proposal.conditions {
        for (index, condition) in conditions.iter().enumerate() {
            if condition.trim().is_empty() {
                violations.push(format!("conditions[{index}]"), "condition must not be blank");
            }
        }
    }

    status
}
