//! End-to-end underwriting and claim scenarios driven through the public HTTP routers.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use mga_underwriting::workflows::claims::{
        ClaimId, ClaimRecord, ClaimRepository, ClaimService,
    };
    use mga_underwriting::workflows::transitions::WorkflowStatus;
    use mga_underwriting::workflows::underwriting::{
        CarrierError, CarrierGateway, CarrierReferral, EvaluationConfig, PolicyId,
        UnderwritingRecord, UnderwritingRepository, UnderwritingService,
    };
    use mga_underwriting::workflows::RepositoryError;
    use serde_json::{json, Value};

    #[derive(Default)]
    pub struct Files(Mutex<HashMap<PolicyId, UnderwritingRecord>>);

    impl UnderwritingRepository for Files {
        fn insert(
            &self,
            record: UnderwritingRecord,
        ) -> Result<UnderwritingRecord, RepositoryError> {
            let mut guard = self.0.lock().expect("files mutex poisoned");
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
            let mut guard = self.0.lock().expect("files mutex poisoned");
            match guard.get_mut(record.policy_id()) {
                Some(stored) if stored.revision == expected_revision => {
                    *stored = record;
                    Ok(())
                }
                Some(_) => Err(RepositoryError::Stale),
                None => Err(RepositoryError::NotFound),
            }
        }

        fn fetch(&self, id: &PolicyId) -> Result<Option<UnderwritingRecord>, RepositoryError> {
            Ok(self.0.lock().expect("files mutex poisoned").get(id).cloned())
        }

        fn pending(&self, limit: usize) -> Result<Vec<UnderwritingRecord>, RepositoryError> {
            let guard = self.0.lock().expect("files mutex poisoned");
            Ok(guard
                .values()
                .filter(|record| !record.status.is_terminal())
                .take(limit)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    pub struct Carrier(pub Mutex<Vec<CarrierReferral>>);

    impl CarrierGateway for Carrier {
        fn refer(&self, referral: CarrierReferral) -> Result<(), CarrierError> {
            self.0.lock().expect("carrier mutex poisoned").push(referral);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct Claims(Mutex<HashMap<ClaimId, ClaimRecord>>);

    impl ClaimRepository for Claims {
        fn insert(&self, record: ClaimRecord) -> Result<ClaimRecord, RepositoryError> {
            let mut guard = self.0.lock().expect("claims mutex poisoned");
            guard.insert(record.claim_id.clone(), record.clone());
            Ok(record)
        }

        fn update(
            &self,
            record: ClaimRecord,
            expected_revision: u64,
        ) -> Result<(), RepositoryError> {
            let mut guard = self.0.lock().expect("claims mutex poisoned");
            match guard.get_mut(&record.claim_id) {
                Some(stored) if stored.revision == expected_revision => {
                    *stored = record;
                    Ok(())
                }
                Some(_) => Err(RepositoryError::Stale),
                None => Err(RepositoryError::NotFound),
            }
        }

        fn fetch(&self, id: &ClaimId) -> Result<Option<ClaimRecord>, RepositoryError> {
            Ok(self.0.lock().expect("claims mutex poisoned").get(id).cloned())
        }
    }

    pub fn underwriting() -> (Arc<UnderwritingService<Files, Carrier>>, Arc<Carrier>) {
        let carrier = Arc::new(Carrier::default());
        let service = UnderwritingService::new(
            Arc::new(Files::default()),
            carrier.clone(),
            EvaluationConfig::default(),
        );
        (Arc::new(service), carrier)
    }

    pub fn claims() -> Arc<ClaimService<Claims>> {
        Arc::new(ClaimService::new(Arc::new(Claims::default())))
    }

    pub fn assessment(policy_id: &str, risk_score: f64, scores: [f64; 4]) -> Value {
        json!({
            "policy_id": policy_id,
            "risk_score": risk_score,
            "assessed_by": "uw-haddad",
            "factors": [
                { "type": "CLAIMS_HISTORY", "score": scores[0], "weight": 0.35 },
                { "type": "LOCATION_RISK", "score": scores[1], "weight": 0.25 },
                { "type": "COVERAGE_AMOUNT", "score": scores[2], "weight": 0.20 },
                { "type": "BUSINESS_TYPE", "score": scores[3], "weight": 0.20 }
            ]
        })
    }
}

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use mga_underwriting::workflows::claims::claim_router;
use mga_underwriting::workflows::underwriting::underwriting_router;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn call(
    router: &axum::Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serializes")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    };
    let response = router.clone().oneshot(request).await.expect("route executes");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn medium_risk_file_moves_from_review_to_approval() {
    let (service, carrier) = common::underwriting();
    let router = underwriting_router(service);

    let (status, body) = call(
        &router,
        "POST",
        "/api/v1/underwriting/assessments",
        Some(common::assessment("POL-5100", 74.0, [78.0, 70.0, 72.0, 74.0])),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["severity"], "MEDIUM");

    let (status, body) = call(
        &router,
        "POST",
        "/api/v1/underwriting/files/POL-5100/evaluate",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recommended_status"], "MANUAL_REVIEW");
    assert_eq!(body["components"].as_array().map(Vec::len), Some(4));

    let (status, body) = call(
        &router,
        "POST",
        "/api/v1/underwriting/files/POL-5100/decision",
        Some(json!({ "decision": "APPROVED", "decided_by": "uw-haddad" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "APPROVED");
    assert_eq!(body["decision_rationale"], "APPROVED by uw-haddad");

    let (status, body) = call(&router, "GET", "/api/v1/underwriting/queue", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    assert!(carrier.0.lock().expect("carrier mutex poisoned").is_empty());
}

#[tokio::test]
async fn high_risk_scores_are_referred_and_then_declined_with_notes() {
    let (service, carrier) = common::underwriting();
    let router = underwriting_router(service);

    let (status, body) = call(
        &router,
        "POST",
        "/api/v1/underwriting/scores",
        Some(json!({
            "policy_id": "POL-5200",
            "assessed_by": "uw-haddad",
            "factor_scores": { "CLAIMS_HISTORY": 94.0, "LOCATION_RISK": 88.0 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["severity"], "HIGH");

    let (_, body) = call(
        &router,
        "POST",
        "/api/v1/underwriting/files/POL-5200/evaluate",
        None,
    )
    .await;
    assert_eq!(body["recommended_status"], "REFERRED_TO_CARRIER");
    assert_eq!(carrier.0.lock().expect("carrier mutex poisoned").len(), 1);

    let (status, body) = call(
        &router,
        "POST",
        "/api/v1/underwriting/files/POL-5200/decision",
        Some(json!({ "decision": "DECLINED", "decided_by": "uw-haddad" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["violations"][0]["field"], "notes");

    let (status, body) = call(
        &router,
        "POST",
        "/api/v1/underwriting/files/POL-5200/decision",
        Some(json!({
            "decision": "DECLINED",
            "notes": "Carrier declined: coastal frame construction",
            "decided_by": "uw-haddad"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "DECLINED");
}

#[tokio::test]
async fn invalid_assessments_are_rejected_with_every_violation() {
    let (service, _) = common::underwriting();
    let router = underwriting_router(service);

    let mut payload = common::assessment("", 120.0, [30.0, 40.0, 35.0, 35.0]);
    payload["factors"][1]["weight"] = json!(0.5);

    let (status, body) = call(
        &router,
        "POST",
        "/api/v1/underwriting/assessments",
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["violations"]
        .as_array()
        .expect("violations listed")
        .iter()
        .filter_map(|violation| violation["field"].as_str())
        .collect();
    assert!(fields.contains(&"policy_id"));
    assert!(fields.contains(&"risk_score"));
    assert!(fields.contains(&"factors"));

    let (status, _) = call(&router, "GET", "/api/v1/underwriting/files/POL-none", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn claims_follow_the_claim_table_through_reopening() {
    let router = claim_router(common::claims());

    let (status, body) = call(
        &router,
        "POST",
        "/api/v1/claims",
        Some(json!({ "policy_id": "POL-5300", "description": "Kitchen fire" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let claim_id = body["claim_id"].as_str().expect("claim id").to_string();
    let status_path = format!("/api/v1/claims/{claim_id}/status");

    let (status, body) = call(
        &router,
        "POST",
        &status_path,
        Some(json!({ "status": "PAID" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["allowed"], json!(["UNDER_REVIEW", "DENIED"]));

    for next in ["DENIED", "CLOSED", "REOPENED", "UNDER_REVIEW"] {
        let (status, body) = call(
            &router,
            "POST",
            &status_path,
            Some(json!({ "status": next, "note": format!("to {next}") })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "moving to {next}");
        assert_eq!(body["status"], next);
    }

    let (status, body) = call(&router, "GET", &format!("/api/v1/claims/{claim_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["history"].as_array().map(Vec::len), Some(4));
    assert_eq!(body["history"][1]["from"], "DENIED");
}
