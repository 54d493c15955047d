use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::risk::PolicyId;
use crate::workflows::transitions::{parse_status, UnknownStatus, WorkflowStatus};

/// Identifier wrapper for reported claims.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(pub String);

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Claim handling states. `Closed` only leaves through `Reopened`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    New,
    UnderReview,
    PendingInfo,
    Approved,
    InPayment,
    Paid,
    Denied,
    Closed,
    Reopened,
}

impl WorkflowStatus for ClaimStatus {
    const ENTITY: &'static str = "claim";

    fn all() -> &'static [Self] {
        &[
            Self::New,
            Self::UnderReview,
            Self::PendingInfo,
            Self::Approved,
            Self::InPayment,
            Self::Paid,
            Self::Denied,
            Self::Closed,
            Self::Reopened,
        ]
    }

    fn allowed_next(self) -> &'static [Self] {
        use ClaimStatus::*;
        match self {
            New => &[UnderReview, Denied],
            UnderReview => &[PendingInfo, Approved, Denied],
            PendingInfo => &[UnderReview, Denied],
            Approved => &[InPayment],
            InPayment => &[Paid],
            Paid => &[Closed],
            Denied => &[Closed],
            Closed => &[Reopened],
            Reopened => &[UnderReview],
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    fn code(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::UnderReview => "UNDER_REVIEW",
            Self::PendingInfo => "PENDING_INFO",
            Self::Approved => "APPROVED",
            Self::InPayment => "IN_PAYMENT",
            Self::Paid => "PAID",
            Self::Denied => "DENIED",
            Self::Closed => "CLOSED",
            Self::Reopened => "REOPENED",
        }
    }
}

impl FromStr for ClaimStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_status(raw)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Audit entry appended on every accepted status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: ClaimStatus,
    pub to: ClaimStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Intake payload for first notice of loss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenClaimRequest {
    pub policy_id: PolicyId,
    pub description: String,
}

/// Requested status change for an existing claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimTransitionRequest {
    pub status: ClaimStatus,
    #[serde(default)]
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges() -> Vec<(&'static str, Vec<&'static str>)> {
        ClaimStatus::all()
            .iter()
            .map(|status| (status.code(), status.allowed_codes()))
            .collect()
    }

    #[test]
    fn table_matches_the_published_claim_workflow() {
        assert_eq!(
            edges(),
            vec![
                ("NEW", vec!["UNDER_REVIEW", "DENIED"]),
                ("UNDER_REVIEW", vec!["PENDING_INFO", "APPROVED", "DENIED"]),
                ("PENDING_INFO", vec!["UNDER_REVIEW", "DENIED"]),
                ("APPROVED", vec!["IN_PAYMENT"]),
                ("IN_PAYMENT", vec!["PAID"]),
                ("PAID", vec!["CLOSED"]),
                ("DENIED", vec!["CLOSED"]),
                ("CLOSED", vec!["REOPENED"]),
                ("REOPENED", vec!["UNDER_REVIEW"]),
            ]
        );
    }

    #[test]
    fn closed_claims_only_reopen() {
        assert!(ClaimStatus::Closed.can_transition_to(ClaimStatus::Reopened));
        assert!(!ClaimStatus::Closed.can_transition_to(ClaimStatus::Paid));
        assert!(ClaimStatus::Closed.is_terminal());
    }

    #[test]
    fn new_claims_cannot_skip_to_payment() {
        assert!(!ClaimStatus::New.can_transition_to(ClaimStatus::InPayment));
    }

    #[test]
    fn serde_uses_screaming_codes() {
        let encoded = serde_json::to_string(&ClaimStatus::PendingInfo).expect("serializes");
        assert_eq!(encoded, "\"PENDING_INFO\"");
        for status in ClaimStatus::all() {
            assert_eq!(status.code().parse::<ClaimStatus>(), Ok(*status));
        }
    }
}
