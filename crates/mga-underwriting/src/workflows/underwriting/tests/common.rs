use std::collections::HashMap;
use std::sync::{Arc, Barrier, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::risk::{RiskAssessment, RiskAssessmentInput, RiskFactorInput, RiskFactorType};
use crate::workflows::transitions::WorkflowStatus;
use crate::workflows::underwriting::{
    CarrierError, CarrierGateway, CarrierReferral, EvaluationConfig, PolicyId, ProposedDecision,
    UnderwritingRecord, UnderwritingRepository, UnderwritingService,
};
use crate::workflows::RepositoryError;

pub(super) const DEFAULT_WEIGHTS: [f64; 4] = [0.35, 0.25, 0.20, 0.20];

pub(super) fn assessed_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

/// Assessment input with the full factor set at the default weights.
pub(super) fn assessment_input(
    policy_id: &str,
    risk_score: f64,
    factor_scores: [f64; 4],
) -> RiskAssessmentInput {
    let factors = RiskFactorType::ordered()
        .into_iter()
        .zip(factor_scores)
        .zip(DEFAULT_WEIGHTS)
        .map(|((factor_type, score), weight)| RiskFactorInput {
            factor_type: factor_type.code().to_string(),
            score,
            weight,
            severity: None,
        })
        .collect();

    RiskAssessmentInput {
        policy_id: policy_id.to_string(),
        risk_score,
        severity: None,
        factors,
        assessed_by: "uw-okafor".to_string(),
        assessment_date: Some(assessed_at()),
    }
}

pub(super) fn low_risk_input(policy_id: &str) -> RiskAssessmentInput {
    assessment_input(policy_id, 35.0, [30.0, 40.0, 35.0, 35.0])
}

pub(super) fn medium_risk_input(policy_id: &str) -> RiskAssessmentInput {
    assessment_input(policy_id, 72.0, [75.0, 70.0, 68.0, 74.0])
}

pub(super) fn high_risk_input(policy_id: &str) -> RiskAssessmentInput {
    assessment_input(policy_id, 88.0, [92.0, 85.0, 86.0, 87.0])
}

/// Low composite score hiding one HIGH factor.
pub(super) fn masked_high_factor_input(policy_id: &str) -> RiskAssessmentInput {
    assessment_input(policy_id, 52.0, [91.0, 30.0, 25.0, 30.0])
}

pub(super) fn assessment(input: RiskAssessmentInput) -> RiskAssessment {
    RiskAssessment::try_from(input).expect("fixture assessment is valid")
}

pub(super) fn proposal(decision: &str, notes: Option<&str>) -> ProposedDecision {
    ProposedDecision {
        decision: decision.to_string(),
        notes: notes.map(str::to_string),
        conditions: None,
    }
}

pub(super) fn build_service() -> (
    UnderwritingService<MemoryRepository, MemoryCarrier>,
    Arc<MemoryRepository>,
    Arc<MemoryCarrier>,
) {
    build_service_with(EvaluationConfig::default())
}

pub(super) fn build_service_with(
    config: EvaluationConfig,
) -> (
    UnderwritingService<MemoryRepository, MemoryCarrier>,
    Arc<MemoryRepository>,
    Arc<MemoryCarrier>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let carrier = Arc::new(MemoryCarrier::default());
    let service = UnderwritingService::new(repository.clone(), carrier.clone(), config);
    (service, repository, carrier)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<PolicyId, UnderwritingRecord>>>,
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }

    pub(super) fn stored(&self, policy_id: &str) -> UnderwritingRecord {
        self.fetch(&PolicyId(policy_id.to_string()))
            .expect("fetch succeeds")
            .expect("record present")
    }
}

impl UnderwritingRepository for MemoryRepository {
    fn insert(&self, record: UnderwritingRecord) -> Result<UnderwritingRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
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
        let mut guard = self.records.lock().expect("repository mutex poisoned");
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
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn pending(&self, limit: usize) -> Result<Vec<UnderwritingRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut open: Vec<UnderwritingRecord> = guard
            .values()
            .filter(|record| !record.status.is_terminal())
            .cloned()
            .collect();
        open.sort_by_key(|record| record.assessment.assessment_date());
        open.truncate(limit);
        Ok(open)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryCarrier {
    referrals: Arc<Mutex<Vec<CarrierReferral>>>,
}

impl MemoryCarrier {
    pub(super) fn referrals(&self) -> Vec<CarrierReferral> {
        self.referrals.lock().expect("carrier mutex poisoned").clone()
    }
}

impl CarrierGateway for MemoryCarrier {
    fn refer(&self, referral: CarrierReferral) -> Result<(), CarrierError> {
        self.referrals
            .lock()
            .expect("carrier mutex poisoned")
            .push(referral);
        Ok(())
    }
}

pub(super) struct OfflineCarrier;

impl CarrierGateway for OfflineCarrier {
    fn refer(&self, _referral: CarrierReferral) -> Result<(), CarrierError> {
        Err(CarrierError::Transport("connection refused".to_string()))
    }
}

/// Holds every `fetch` until `parties` callers have read, so they all act on the same revision.
pub(super) struct LockstepRepository {
    pub(super) inner: MemoryRepository,
    barrier: Barrier,
}

impl LockstepRepository {
    pub(super) fn new(inner: MemoryRepository, parties: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(parties),
        }
    }
}

impl UnderwritingRepository for LockstepRepository {
    fn insert(&self, record: UnderwritingRecord) -> Result<UnderwritingRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(
        &self,
        record: UnderwritingRecord,
        expected_revision: u64,
    ) -> Result<(), RepositoryError> {
        self.inner.update(record, expected_revision)
    }

    fn fetch(&self, id: &PolicyId) -> Result<Option<UnderwritingRecord>, RepositoryError> {
        let record = self.inner.fetch(id);
        self.barrier.wait();
        record
    }

    fn pending(&self, limit: usize) -> Result<Vec<UnderwritingRecord>, RepositoryError> {
        self.inner.pending(limit)
    }
}

pub(super) struct UnavailableRepository;

impl UnderwritingRepository for UnavailableRepository {
    fn insert(&self, _record: UnderwritingRecord) -> Result<UnderwritingRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: UnderwritingRecord, _expected: u64) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &PolicyId) -> Result<Option<UnderwritingRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn pending(&self, _limit: usize) -> Result<Vec<UnderwritingRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
