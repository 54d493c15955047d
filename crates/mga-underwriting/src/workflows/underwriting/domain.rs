use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use crate::risk::PolicyId;
use crate::risk::RiskFactorType;
use crate::workflows::transitions::{parse_status, UnknownStatus, WorkflowStatus};

/// Underwriting review states. `Approved` and `Declined` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnderwritingStatus {
    PendingReview,
    PendingDocuments,
    InReview,
    AutoApproved,
    ManualReview,
    ConditionallyApproved,
    ReferredToCarrier,
    Approved,
    Declined,
}

impl WorkflowStatus for UnderwritingStatus {
    const ENTITY: &'static str = "underwriting";

    fn all() -> &'static [Self] {
        &[
            Self::PendingReview,
            Self::PendingDocuments,
            Self::InReview,
            Self::AutoApproved,
            Self::ManualReview,
            Self::ConditionallyApproved,
            Self::ReferredToCarrier,
            Self::Approved,
            Self::Declined,
        ]
    }

    fn allowed_next(self) -> &'static [Self] {
        use UnderwritingStatus::*;
        match self {
            PendingReview => &[
                PendingDocuments,
                InReview,
                AutoApproved,
                ManualReview,
                ReferredToCarrier,
                Declined,
            ],
            PendingDocuments => &[PendingReview, InReview, Declined],
            InReview => &[
                PendingDocuments,
                ManualReview,
                ConditionallyApproved,
                ReferredToCarrier,
                Approved,
                Declined,
            ],
            AutoApproved => &[Approved, ManualReview],
            ManualReview => &[
                PendingDocuments,
                ConditionallyApproved,
                ReferredToCarrier,
                Approved,
                Declined,
            ],
            ConditionallyApproved => &[Approved, Declined],
            ReferredToCarrier => &[ConditionallyApproved, Approved, Declined],
            // No reopening edge: final decisions stay final.
            Approved | Declined => &[],
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Declined)
    }

    fn code(self) -> &'static str {
        match self {
            Self::PendingReview => "PENDING_REVIEW",
            Self::PendingDocuments => "PENDING_DOCUMENTS",
            Self::InReview => "IN_REVIEW",
            Self::AutoApproved => "AUTO_APPROVED",
            Self::ManualReview => "MANUAL_REVIEW",
            Self::ConditionallyApproved => "CONDITIONALLY_APPROVED",
            Self::ReferredToCarrier => "REFERRED_TO_CARRIER",
            Self::Approved => "APPROVED",
            Self::Declined => "DECLINED",
        }
    }
}

impl FromStr for UnderwritingStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_status(raw)
    }
}

impl fmt::Display for UnderwritingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Request to score a policy from raw factor scores using the configured weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub policy_id: String,
    pub factor_scores: BTreeMap<RiskFactorType, f64>,
    #[serde(default)]
    pub assessed_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_statuses_have_no_outgoing_edges() {
        for status in UnderwritingStatus::all() {
            assert_eq!(
                status.is_terminal(),
                status.allowed_next().is_empty(),
                "{status} terminal flag disagrees with its table row"
            );
        }
        assert!(UnderwritingStatus::Approved.is_terminal());
        assert!(UnderwritingStatus::Declined.is_terminal());
    }

    #[test]
    fn every_status_is_reachable_from_pending_review() {
        let mut reached = vec![UnderwritingStatus::PendingReview];
        let mut frontier = reached.clone();
        while let Some(status) = frontier.pop() {
            for next in status.allowed_next() {
                if !reached.contains(next) {
                    reached.push(*next);
                    frontier.push(*next);
                }
            }
        }
        assert_eq!(reached.len(), UnderwritingStatus::all().len());
    }

    #[test]
    fn codes_round_trip_through_parsing() {
        for status in UnderwritingStatus::all() {
            assert_eq!(status.code().parse::<UnderwritingStatus>(), Ok(*status));
        }
        assert!("WITHDRAWN".parse::<UnderwritingStatus>().is_err());
    }
}
