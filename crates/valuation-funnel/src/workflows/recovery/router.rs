use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, warn};

use super::scheduler::AbandonmentScheduler;
use crate::workflows::evaluations::EvaluationRepository;
use crate::workflows::notifications::NotificationSender;

pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// Scheduler plus the shared secret callers must present to trigger a sweep.
pub struct RecoveryTrigger<R, N> {
    scheduler: AbandonmentScheduler<R, N>,
    secret: String,
}

impl<R, N> RecoveryTrigger<R, N>
where
    R: EvaluationRepository + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(scheduler: AbandonmentScheduler<R, N>, secret: impl Into<String>) -> Self {
        Self {
            scheduler,
            secret: secret.into(),
        }
    }

    pub fn scheduler(&self) -> &AbandonmentScheduler<R, N> {
        &self.scheduler
    }

    /// True when any presented secret matches. An unset secret authorizes nobody.
    pub fn authorizes<'a>(&self, presented: impl IntoIterator<Item = &'a str>) -> bool {
        if self.secret.is_empty() {
            return false;
        }
        presented
            .into_iter()
            .any(|candidate| candidate == self.secret)
    }
}

/// Cron-facing trigger, reachable with GET or POST.
pub fn recovery_router<R, N>(trigger: Arc<RecoveryTrigger<R, N>>) -> Router
where
    R: EvaluationRepository + 'static,
    N: NotificationSender + 'static,
{
    Router::new()
        .route(
            "/api/check-abandoned",
            get(check_abandoned_handler::<R, N>).post(check_abandoned_handler::<R, N>),
        )
        .with_state(trigger)
}

pub(crate) async fn check_abandoned_handler<R, N>(
    State(trigger): State<Arc<RecoveryTrigger<R, N>>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationSender + 'static,
{
    if !trigger.authorizes(presented_secrets(&params, &headers)) {
        warn!("rejected unauthorized abandonment sweep trigger");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response();
    }

    match trigger.scheduler.sweep(Utc::now()).await {
        Ok(report) => (
            StatusCode::OK,
            Json(json!({ "success": true, "emailsSent": report.emails_sent })),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "abandonment sweep aborted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

/// Query `secret`, `x-cron-secret` and `Authorization: Bearer`, whichever are present.
fn presented_secrets<'a>(
    params: &'a HashMap<String, String>,
    headers: &'a HeaderMap,
) -> impl Iterator<Item = &'a str> {
    let query = params.get("secret").map(String::as_str);
    let cron_header = headers
        .get(CRON_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    [query, cron_header, bearer].into_iter().flatten()
}
