use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use valuation_funnel::workflows::evaluations::{
    evaluation_router, EvaluationRepository, EvaluationService,
};
use valuation_funnel::workflows::notifications::NotificationSender;
use valuation_funnel::workflows::recovery::{recovery_router, RecoveryTrigger};

pub(crate) fn with_funnel_routes<R, N>(
    evaluations: Arc<EvaluationService<R, N>>,
    recovery: Arc<RecoveryTrigger<R, N>>,
) -> axum::Router
where
    R: EvaluationRepository + 'static,
    N: NotificationSender + 'static,
{
    evaluation_router(evaluations)
        .merge(recovery_router(recovery))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
