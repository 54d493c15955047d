use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryClaimRepository, InMemoryUnderwritingRepository, LoggingCarrierGateway,
};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use mga_underwriting::config::AppConfig;
use mga_underwriting::error::AppError;
use mga_underwriting::telemetry;
use mga_underwriting::workflows::claims::ClaimService;
use mga_underwriting::workflows::underwriting::{EvaluationConfig, UnderwritingService};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let evaluation_config = EvaluationConfig::from_settings(&config.underwriting);
    let underwriting = Arc::new(UnderwritingService::new(
        Arc::new(InMemoryUnderwritingRepository::default()),
        Arc::new(LoggingCarrierGateway::default()),
        evaluation_config,
    ));
    let claims = Arc::new(ClaimService::new(Arc::new(
        InMemoryClaimRepository::default(),
    )));

    let app = with_application_routes(underwriting, claims)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        refer_high_risk = config.underwriting.refer_high_risk_to_carrier,
        escalate_high_factors = config.underwriting.escalate_on_high_factor,
        "underwriting rules engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
