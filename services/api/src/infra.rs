use metrics_exporter_prometheus::PrometheusHandle;
use mga_underwriting::workflows::claims::{ClaimId, ClaimRecord, ClaimRepository};
use mga_underwriting::workflows::transitions::WorkflowStatus;
use mga_underwriting::workflows::underwriting::{
    CarrierError, CarrierGateway, CarrierReferral, PolicyId, UnderwritingRecord,
    UnderwritingRepository,
};
use mga_underwriting::workflows::RepositoryError;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store poisoned".to_string()))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryUnderwritingRepository {
    records: Arc<Mutex<HashMap<PolicyId, UnderwritingRecord>>>,
}

impl UnderwritingRepository for InMemoryUnderwritingRepository {
    fn insert(&self, record: UnderwritingRecord) -> Result<UnderwritingRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(record.policy_id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.policy_id().clone(), record.clone());
        Ok(record)
    }

    fn update(
        &self,
        record: UnderwritingRecord,
        expected_revision: u64,
    ) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        let stored = guard
            .get_mut(record.policy_id())
            .ok_or(RepositoryError::NotFound)?;
        if stored.revision != expected_revision {
            return Err(RepositoryError::Stale);
        }
        *stored = record;
        Ok(())
    }

    fn fetch(&self, id: &PolicyId) -> Result<Option<UnderwritingRecord>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard.get(id).cloned())
    }

    fn pending(&self, limit: usize) -> Result<Vec<UnderwritingRecord>, RepositoryError> {
        let guard = lock(&self.records)?;
        let mut open: Vec<UnderwritingRecord> = guard
            .values()
            .filter(|record| !record.status.is_terminal())
            .cloned()
            .collect();
        open.sort_by(|left, right| {
            left.assessment
                .assessment_date()
                .cmp(&right.assessment.assessment_date())
                .then_with(|| left.policy_id().cmp(right.policy_id()))
        });
        open.truncate(limit);
        Ok(open)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryClaimRepository {
    records: Arc<Mutex<HashMap<ClaimId, ClaimRecord>>>,
}

impl ClaimRepository for InMemoryClaimRepository {
    fn insert(&self, record: ClaimRecord) -> Result<ClaimRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&record.claim_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.claim_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ClaimRecord, expected_revision: u64) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        let stored = guard
            .get_mut(&record.claim_id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.revision != expected_revision {
            return Err(RepositoryError::Stale);
        }
        *stored = record;
        Ok(())
    }

    fn fetch(&self, id: &ClaimId) -> Result<Option<ClaimRecord>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard.get(id).cloned())
    }
}

/// Stand-in for the carrier's referral intake: logs and keeps each referral.
#[derive(Default, Clone)]
pub(crate) struct LoggingCarrierGateway {
    referrals: Arc<Mutex<Vec<CarrierReferral>>>,
}

impl CarrierGateway for LoggingCarrierGateway {
    fn refer(&self, referral: CarrierReferral) -> Result<(), CarrierError> {
        info!(
            policy_id = %referral.policy_id,
            risk_score = referral.risk_score,
            severity = %referral.severity,
            "referral sent to carrier"
        );
        let mut guard = self
            .referrals
            .lock()
            .map_err(|_| CarrierError::Transport("referral log poisoned".to_string()))?;
        guard.push(referral);
        Ok(())
    }
}

impl LoggingCarrierGateway {
    pub(crate) fn referrals(&self) -> Vec<CarrierReferral> {
        self.referrals
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}
