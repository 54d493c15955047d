//! Static adjacency tables gating status changes for workflow entities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::claims::ClaimStatus;
use super::endorsements::EndorsementStatus;
use super::underwriting::UnderwritingStatus;

/// A workflow state with a fixed set of legal successors.
pub trait WorkflowStatus:
    Copy + Eq + fmt::Debug + FromStr<Err = UnknownStatus> + 'static
{
    /// Entity name used in error messages.
    const ENTITY: &'static str;

    fn all() -> &'static [Self];

    fn allowed_next(self) -> &'static [Self];

    /// Terminal states accept no further work, except an explicit reopen edge where one exists.
    fn is_terminal(self) -> bool;

    fn code(self) -> &'static str;

    fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next().contains(&next)
    }

    fn allowed_codes(self) -> Vec<&'static str> {
        self.allowed_next()
            .iter()
            .map(|status| status.code())
            .collect()
    }
}

/// Parse a status code against the entity's full state list.
pub(crate) fn parse_status<S: WorkflowStatus>(raw: &str) -> Result<S, UnknownStatus> {
    let normalized = raw.trim();
    S::all()
        .iter()
        .copied()
        .find(|status| status.code().eq_ignore_ascii_case(normalized))
        .ok_or_else(|| UnknownStatus {
            entity: S::ENTITY,
            value: raw.to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {entity} status '{value}'")]
pub struct UnknownStatus {
    pub entity: &'static str,
    pub value: String,
}

/// A proposed edge that the entity's table does not contain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} cannot move from {from} to {to} (allowed: {})", allowed_list(.allowed))]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: &'static str,
    pub to: &'static str,
    pub allowed: Vec<&'static str>,
}

fn allowed_list(allowed: &[&'static str]) -> String {
    if allowed.is_empty() {
        "none".to_string()
    } else {
        allowed.join(", ")
    }
}

/// Gate a status change against the entity's table.
pub fn check_transition<S: WorkflowStatus>(current: S, proposed: S) -> Result<(), TransitionError> {
    if current.can_transition_to(proposed) {
        Ok(())
    } else {
        Err(TransitionError {
            entity: S::ENTITY,
            from: current.code(),
            to: proposed.code(),
            allowed: current.allowed_codes(),
        })
    }
}

/// Entities whose status tables are exposed over the rules API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowEntity {
    Claim,
    Underwriting,
    Endorsement,
}

impl WorkflowEntity {
    /// Look up an edge from raw status codes. Unknown codes are an input error, not a refusal.
    pub fn transition_allowed(self, current: &str, proposed: &str) -> Result<bool, UnknownStatus> {
        match self {
            Self::Claim => edge_exists::<ClaimStatus>(current, proposed),
            Self::Underwriting => edge_exists::<UnderwritingStatus>(current, proposed),
            Self::Endorsement => edge_exists::<EndorsementStatus>(current, proposed),
        }
    }

    pub fn allowed_from(self, current: &str) -> Result<Vec<&'static str>, UnknownStatus> {
        match self {
            Self::Claim => Ok(current.parse::<ClaimStatus>()?.allowed_codes()),
            Self::Underwriting => Ok(current.parse::<UnderwritingStatus>()?.allowed_codes()),
            Self::Endorsement => Ok(current.parse::<EndorsementStatus>()?.allowed_codes()),
        }
    }
}

fn edge_exists<S: WorkflowStatus>(current: &str, proposed: &str) -> Result<bool, UnknownStatus> {
    let current = current.parse::<S>()?;
    let proposed = proposed.parse::<S>()?;
    Ok(current.can_transition_to(proposed))
}
