use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{ClaimId, ClaimStatus, OpenClaimRequest, StatusChange};
use super::repository::{ClaimRecord, ClaimRepository};
use crate::workflows::transitions::{check_transition, TransitionError};
use crate::workflows::RepositoryError;

/// Claim intake and status handling over a repository.
pub struct ClaimService<R> {
    repository: Arc<R>,
    sequence: AtomicU64,
}

impl<R> ClaimService<R>
where
    R: ClaimRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            sequence: AtomicU64::new(1),
        }
    }

    fn next_claim_id(&self) -> ClaimId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        ClaimId(format!("clm-{id:06}"))
    }

    /// Record first notice of loss in the `NEW` state.
    pub fn open(&self, request: OpenClaimRequest) -> Result<ClaimRecord, ClaimServiceError> {
        if request.policy_id.0.trim().is_empty() {
            return Err(ClaimServiceError::MissingPolicy);
        }

        let record = ClaimRecord {
            claim_id: self.next_claim_id(),
            policy_id: request.policy_id,
            description: request.description.trim().to_string(),
            status: ClaimStatus::New,
            history: Vec::new(),
            revision: 0,
        };

        let stored = self.repository.insert(record)?;
        info!(claim_id = %stored.claim_id, policy_id = %stored.policy_id, "claim opened");
        Ok(stored)
    }

    /// Move a claim along its workflow table, appending an audit entry.
    pub fn transition(
        &self,
        claim_id: &ClaimId,
        proposed: ClaimStatus,
        note: Option<String>,
    ) -> Result<ClaimRecord, ClaimServiceError> {
        let mut record = self
            .repository
            .fetch(claim_id)?
            .ok_or(RepositoryError::NotFound)?;

        if let Err(err) = check_transition(record.status, proposed) {
            warn!(%claim_id, error = %err, "claim transition refused");
            return Err(err.into());
        }

        record.history.push(StatusChange {
            from: record.status,
            to: proposed,
            note: note.filter(|text| !text.trim().is_empty()),
            changed_at: Utc::now(),
        });
        let from = record.status;
        record.status = proposed;

        let expected = record.revision;
        record.revision += 1;
        if let Err(err) = self.repository.update(record.clone(), expected) {
            if matches!(err, RepositoryError::Stale) {
                warn!(%claim_id, revision = expected, "claim changed concurrently");
            }
            return Err(err.into());
        }
        info!(%claim_id, %from, to = %proposed, "claim status changed");
        Ok(record)
    }

    pub fn get(&self, claim_id: &ClaimId) -> Result<ClaimRecord, ClaimServiceError> {
        let record = self
            .repository
            .fetch(claim_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

/// Error raised by the claim service.
#[derive(Debug, thiserror::Error)]
pub enum ClaimServiceError {
    #[error("claim must reference a policy")]
    MissingPolicy,
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
