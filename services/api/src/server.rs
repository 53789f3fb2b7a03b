use crate::cli::ServeArgs;
use crate::infra::{AppState, ConfiguredSender, InMemoryEvaluationRepository};
use crate::routes::with_funnel_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};
use valuation_funnel::config::AppConfig;
use valuation_funnel::error::AppError;
use valuation_funnel::telemetry;
use valuation_funnel::workflows::evaluations::EvaluationService;
use valuation_funnel::workflows::recovery::{
    AbandonmentScheduler, RecoveryDelivery, RecoveryTrigger,
};

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

    let repository = Arc::new(InMemoryEvaluationRepository::default());
    let sender = Arc::new(ConfiguredSender::from_config(&config.email));
    if matches!(*sender, ConfiguredSender::Outbox(_)) {
        warn!("SENDGRID_API_KEY not set; emails are captured in memory only");
    }
    if config.recovery.cron_secret.is_empty() {
        warn!("CRON_SECRET not set; the abandonment trigger will reject every call");
    }

    let evaluation_service = Arc::new(EvaluationService::new(
        repository.clone(),
        sender.clone(),
        config.email.internal_recipients.clone(),
    ));
    let scheduler = AbandonmentScheduler::new(
        repository,
        sender.clone(),
        config.recovery.schedule.clone(),
        config.recovery.app_url.clone(),
    )
    .with_delivery(RecoveryDelivery::from_template_id(
        config.recovery.template_id.clone(),
    ));
    let trigger = Arc::new(RecoveryTrigger::new(
        scheduler,
        config.recovery.cron_secret.clone(),
    ));

    let app = with_funnel_routes(evaluation_service, trigger)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        sender = sender.label(),
        thresholds = ?config.recovery.schedule.thresholds(),
        "valuation funnel ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
