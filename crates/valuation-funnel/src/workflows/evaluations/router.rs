use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{EvaluationId, ValuationSummary};
use super::repository::{EvaluationRepository, RepositoryError};
use super::service::{EvaluationService, EvaluationServiceError};
use crate::workflows::notifications::NotificationSender;
use crate::workflows::valuation::AnswerSet;

#[derive(Debug, Deserialize)]
pub struct StartEvaluationRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveProgressRequest {
    pub current_section: u32,
    #[serde(default)]
    pub answers: AnswerSet,
}

#[derive(Debug, Deserialize)]
pub struct CompleteEvaluationRequest {
    pub answers: AnswerSet,
    #[serde(default)]
    pub current_section: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ValuationRequest {
    pub answers: AnswerSet,
}

/// Router builder exposing the survey lifecycle and the stateless valuation endpoint.
pub fn evaluation_router<R, N>(service: Arc<EvaluationService<R, N>>) -> Router
where
    R: EvaluationRepository + 'static,
    N: NotificationSender + 'static,
{
    Router::new()
        .route("/api/v1/valuation", post(valuation_handler::<R, N>))
        .route("/api/v1/evaluations", post(start_handler::<R, N>))
        .route(
            "/api/v1/evaluations/:evaluation_id",
            get(resume_handler::<R, N>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id/progress",
            put(progress_handler::<R, N>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id/complete",
            post(complete_handler::<R, N>),
        )
        .with_state(service)
}

pub(crate) async fn valuation_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    Json(request): Json<ValuationRequest>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationSender + 'static,
{
    match service.engine().score(&request.answers) {
        Ok(result) => {
            let summary = ValuationSummary::new(result, &request.answers);
            (StatusCode::OK, Json(summary)).into_response()
        }
        Err(err) => error_response(EvaluationServiceError::from(err)),
    }
}

pub(crate) async fn start_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    Json(request): Json<StartEvaluationRequest>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationSender + 'static,
{
    match service.start(&request.email, Utc::now()) {
        Ok(record) => (StatusCode::CREATED, Json(record.resume_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn resume_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    Path(evaluation_id): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationSender + 'static,
{
    match service.get(&EvaluationId(evaluation_id)) {
        Ok(record) => (StatusCode::OK, Json(record.resume_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn progress_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    Path(evaluation_id): Path<String>,
    Json(request): Json<SaveProgressRequest>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationSender + 'static,
{
    let id = EvaluationId(evaluation_id);
    match service.save_progress(&id, request.current_section, request.answers, Utc::now()) {
        Ok(record) => (StatusCode::OK, Json(record.resume_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn complete_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    Path(evaluation_id): Path<String>,
    Json(request): Json<CompleteEvaluationRequest>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationSender + 'static,
{
    let id = EvaluationId(evaluation_id);
    match service
        .complete(&id, request.answers, request.current_section, Utc::now())
        .await
    {
        Ok(completed) => (StatusCode::OK, Json(completed)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: EvaluationServiceError) -> Response {
    let status = match &err {
        EvaluationServiceError::InvalidEmail(_) | EvaluationServiceError::Valuation(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EvaluationServiceError::AlreadyCompleted(_)
        | EvaluationServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        EvaluationServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        EvaluationServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
