use crate::infra::{
    InMemoryClaimRepository, InMemoryUnderwritingRepository, LoggingCarrierGateway,
};
use chrono::Utc;
use clap::Args;
use mga_underwriting::error::AppError;
use mga_underwriting::risk::{
    RiskAssessmentInput, RiskFactorInput, RiskFactorType, RiskScore, RuleViolations,
    ValidationReport, Violation,
};
use mga_underwriting::workflows::claims::{ClaimService, ClaimStatus, OpenClaimRequest};
use mga_underwriting::workflows::underwriting::{
    EvaluationConfig, PolicyId, ProposedDecision, UnderwritingService, UnderwritingServiceError,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ClassifyArgs {
    /// Risk score between 0 and 100
    #[arg(long)]
    pub(crate) score: f64,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Keep high risk files in house instead of referring them to the carrier
    #[arg(long)]
    pub(crate) no_carrier_referral: bool,
    /// Skip the claim lifecycle portion of the demo
    #[arg(long)]
    pub(crate) skip_claims: bool,
}

pub(crate) fn run_classify(args: ClassifyArgs) -> Result<(), AppError> {
    let score = RiskScore::new(args.score).map_err(|err| {
        RuleViolations(ValidationReport::from_violations(vec![Violation::new(
            "score",
            err.to_string(),
        )]))
    })?;
    let severity = score.severity();
    println!("{} -> {} ({} risk)", score, severity, severity.label());
    Ok(())
}

struct SamplePolicy {
    policy_id: &'static str,
    risk_score: f64,
    factor_scores: [f64; 4],
}

const SAMPLE_POLICIES: [SamplePolicy; 4] = [
    SamplePolicy {
        policy_id: "POL-DEMO-001",
        risk_score: 38.5,
        factor_scores: [35.0, 42.0, 40.0, 38.0],
    },
    SamplePolicy {
        policy_id: "POL-DEMO-002",
        risk_score: 49.0,
        factor_scores: [88.0, 30.0, 25.0, 28.0],
    },
    SamplePolicy {
        policy_id: "POL-DEMO-003",
        risk_score: 71.25,
        factor_scores: [72.0, 70.0, 68.0, 75.0],
    },
    SamplePolicy {
        policy_id: "POL-DEMO-004",
        risk_score: 86.0,
        factor_scores: [90.0, 84.0, 82.0, 86.0],
    },
];

fn sample_input(sample: &SamplePolicy, config: &EvaluationConfig) -> RiskAssessmentInput {
    RiskAssessmentInput {
        policy_id: sample.policy_id.to_string(),
        risk_score: sample.risk_score,
        severity: None,
        factors: RiskFactorType::ordered()
            .into_iter()
            .zip(sample.factor_scores)
            .map(|(factor_type, score)| RiskFactorInput {
                factor_type: factor_type.code().to_string(),
                score,
                weight: config.factor_weights.weight_for(factor_type),
                severity: None,
            })
            .collect(),
        assessed_by: "demo-underwriter".to_string(),
        assessment_date: Some(Utc::now()),
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        no_carrier_referral,
        skip_claims,
    } = args;

    let config = EvaluationConfig {
        refer_high_risk_to_carrier: !no_carrier_referral,
        ..EvaluationConfig::default()
    };
    let carrier = Arc::new(LoggingCarrierGateway::default());
    let service = UnderwritingService::new(
        Arc::new(InMemoryUnderwritingRepository::default()),
        carrier.clone(),
        config.clone(),
    );

    println!("Underwriting rules demo");
    for sample in &SAMPLE_POLICIES {
        let record = match service.submit(sample_input(sample, &config)) {
            Ok(record) => record,
            Err(err) => {
                println!("- {} rejected: {}", sample.policy_id, err);
                continue;
            }
        };
        let policy_id = record.policy_id().clone();
        match service.evaluate(&policy_id) {
            Ok(outcome) => {
                println!("- {}: {}", policy_id, outcome.summary());
                for reason in &outcome.reasons {
                    println!("    - {reason}");
                }
            }
            Err(err) => println!("- {} evaluation unavailable: {}", policy_id, err),
        }
    }

    println!("\nRule checks on a rejected submission");
    let mut invalid = sample_input(&SAMPLE_POLICIES[0], &config);
    invalid.policy_id = "POL-DEMO-BAD".to_string();
    invalid.factors.clear();
    invalid.risk_score = 104.0;
    if let Err(UnderwritingServiceError::Violations(violations)) = service.submit(invalid) {
        for violation in violations.report().violations() {
            println!("  - {violation}");
        }
    }

    println!("\nUnderwriter decisions");
    let manual = PolicyId("POL-DEMO-003".to_string());
    let short_decline = ProposedDecision {
        decision: "DECLINED".to_string(),
        notes: Some("no".to_string()),
        conditions: None,
    };
    match service.decide(&manual, short_decline, "demo-underwriter") {
        Ok(_) => println!("- unexpected: terse decline accepted"),
        Err(err) => println!("- terse decline refused: {err}"),
    }
    let conditional = ProposedDecision {
        decision: "CONDITIONALLY_APPROVED".to_string(),
        notes: Some("Bind once the sprinkler certificate arrives".to_string()),
        conditions: Some(vec!["Sprinkler inspection certificate".to_string()]),
    };
    match service.decide(&manual, conditional, "demo-underwriter") {
        Ok(record) => {
            let view = record.status_view();
            println!(
                "- {} -> {} (next: {})",
                view.policy_id,
                view.status,
                view.allowed_next.join(", ")
            );
        }
        Err(err) => println!("- conditional approval failed: {err}"),
    }

    let queue = service.queue(10).unwrap_or_default();
    println!("\nOpen underwriting queue ({} files)", queue.len());
    for record in &queue {
        println!("- {} [{}]", record.policy_id(), record.status);
    }
    println!("Carrier referrals sent: {}", carrier.referrals().len());

    if skip_claims {
        return Ok(());
    }

    println!("\nClaim lifecycle");
    let claims = ClaimService::new(Arc::new(InMemoryClaimRepository::default()));
    let claim = match claims.open(OpenClaimRequest {
        policy_id: PolicyId("POL-DEMO-001".to_string()),
        description: "Burst pipe in warehouse".to_string(),
    }) {
        Ok(claim) => claim,
        Err(err) => {
            println!("- claim intake failed: {err}");
            return Ok(());
        }
    };
    println!("- opened {} as {}", claim.claim_id, claim.status);

    let attempt = claims.transition(&claim.claim_id, ClaimStatus::Paid, None);
    if let Err(err) = attempt {
        println!("- shortcut refused: {err}");
    }

    let path = [
        ClaimStatus::UnderReview,
        ClaimStatus::Approved,
        ClaimStatus::InPayment,
        ClaimStatus::Paid,
        ClaimStatus::Closed,
    ];
    for status in path {
        match claims.transition(&claim.claim_id, status, None) {
            Ok(record) => println!("- {} -> {}", record.claim_id, record.status),
            Err(err) => {
                println!("- transition failed: {err}");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_rejects_scores_out_of_range() {
        let err = run_classify(ClassifyArgs { score: 101.0 }).expect_err("out of range");
        assert!(matches!(err, AppError::Rules(_)));
        assert!(run_classify(ClassifyArgs { score: 60.0 }).is_ok());
    }

    #[test]
    fn sample_policies_are_valid_assessments() {
        let config = EvaluationConfig::default();
        for sample in &SAMPLE_POLICIES {
            let report =
                mga_underwriting::risk::validate_assessment(&sample_input(sample, &config));
            assert!(report.is_valid(), "{} invalid: {:?}", sample.policy_id, report);
        }
    }

    #[test]
    fn demo_runs_end_to_end() {
        run_demo(DemoArgs::default()).expect("demo completes");
    }
}
