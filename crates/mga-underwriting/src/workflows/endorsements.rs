use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::transitions::{parse_status, UnknownStatus, WorkflowStatus};

/// Lifecycle of a mid-term policy change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndorsementStatus {
    Draft,
    PendingApproval,
    Approved,
    Rejected,
    Issued,
    Cancelled,
}

impl WorkflowStatus for EndorsementStatus {
    const ENTITY: &'static str = "endorsement";

    fn all() -> &'static [Self] {
        &[
            Self::Draft,
            Self::PendingApproval,
            Self::Approved,
            Self::Rejected,
            Self::Issued,
            Self::Cancelled,
        ]
    }

    fn allowed_next(self) -> &'static [Self] {
        use EndorsementStatus::*;
        match self {
            Draft => &[PendingApproval, Cancelled],
            PendingApproval => &[Approved, Rejected, Draft],
            Approved => &[Issued, Cancelled],
            Rejected => &[Draft, Cancelled],
            Issued | Cancelled => &[],
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Issued | Self::Cancelled)
    }

    fn code(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::PendingApproval => "PENDING_APPROVAL",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Issued => "ISSUED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for EndorsementStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_status(raw)
    }
}

impl fmt::Display for EndorsementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_endorsements_return_to_draft() {
        assert!(EndorsementStatus::Rejected.can_transition_to(EndorsementStatus::Draft));
        assert!(!EndorsementStatus::Rejected.can_transition_to(EndorsementStatus::Issued));
    }

    #[test]
    fn only_issued_and_cancelled_are_terminal() {
        let terminal: Vec<_> = EndorsementStatus::all()
            .iter()
            .copied()
            .filter(|status| status.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![EndorsementStatus::Issued, EndorsementStatus::Cancelled]
        );
        for status in terminal {
            assert!(status.allowed_next().is_empty());
        }
    }
}
