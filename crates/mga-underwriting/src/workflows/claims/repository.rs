use serde::{Deserialize, Serialize};

use super::domain::{ClaimId, ClaimStatus, StatusChange};
use crate::risk::PolicyId;
use crate::workflows::transitions::WorkflowStatus;
use crate::workflows::RepositoryError;

/// Stored claim with its full status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub claim_id: ClaimId,
    pub policy_id: PolicyId,
    pub description: String,
    pub status: ClaimStatus,
    pub history: Vec<StatusChange>,
    #[serde(default)]
    pub revision: u64,
}

impl ClaimRecord {
    pub fn view(&self) -> ClaimView {
        ClaimView {
            claim_id: self.claim_id.clone(),
            policy_id: self.policy_id.clone(),
            status: self.status,
            allowed_next: self.status.allowed_codes(),
            changes: self.history.len(),
        }
    }
}

/// Storage abstraction for claim records.
pub trait ClaimRepository: Send + Sync {
    fn insert(&self, record: ClaimRecord) -> Result<ClaimRecord, RepositoryError>;
    /// Compare-and-set on `revision`: a stored record at any other revision yields
    /// [`RepositoryError::Stale`].
    fn update(&self, record: ClaimRecord, expected_revision: u64) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ClaimId) -> Result<Option<ClaimRecord>, RepositoryError>;
}

/// Response shape for claim endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimView {
    pub claim_id: ClaimId,
    pub policy_id: PolicyId,
    pub status: ClaimStatus,
    pub allowed_next: Vec<&'static str>,
    pub changes: usize,
}
