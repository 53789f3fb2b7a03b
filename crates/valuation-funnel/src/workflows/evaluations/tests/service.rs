use std::sync::Arc;

use crate::workflows::evaluations::{
    EvaluationId, EvaluationService, EvaluationServiceError, EvaluationStatus, RepositoryError,
};
use crate::workflows::notifications::NotificationContent;
use crate::workflows::test_support::{financial_answers, now, MemoryRepository, MemorySender};
use crate::workflows::valuation::ValuationError;

fn build_service(
    internal: &[&str],
) -> (
    EvaluationService<MemoryRepository, MemorySender>,
    Arc<MemoryRepository>,
    Arc<MemorySender>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let sender = Arc::new(MemorySender::default());
    let service = EvaluationService::new(
        repository.clone(),
        sender.clone(),
        internal.iter().map(|r| r.to_string()).collect(),
    );
    (service, repository, sender)
}

#[test]
fn start_creates_started_record_with_zero_recovery_count() {
    let (service, repository, _) = build_service(&[]);

    let record = service
        .start(" owner@example.com ", now())
        .expect("evaluation starts");

    let stored = repository.get(&record.id);
    assert_eq!(stored.email, "owner@example.com");
    assert_eq!(stored.status, EvaluationStatus::Started);
    assert_eq!(stored.abandoned_email_count, 0);
    assert_eq!(stored.current_section, 0);
    assert!(stored.last_abandoned_email_at.is_none());
    assert_eq!(stored.created_at, now());
}

#[test]
fn start_rejects_malformed_email() {
    let (service, _, _) = build_service(&[]);

    match service.start("not-an-email", now()) {
        Err(EvaluationServiceError::InvalidEmail(value)) => assert_eq!(value, "not-an-email"),
        other => panic!("expected invalid email, got {other:?}"),
    }
}

#[test]
fn save_progress_replaces_answers_and_section() {
    let (service, repository, _) = build_service(&[]);
    let record = service.start("owner@example.com", now()).expect("starts");

    let later = now() + chrono::Duration::minutes(5);
    service
        .save_progress(&record.id, 2, financial_answers(), later)
        .expect("progress saved");

    let stored = repository.get(&record.id);
    assert_eq!(stored.current_section, 2);
    assert_eq!(stored.answers, financial_answers());
    assert_eq!(stored.updated_at, later);
    assert_eq!(stored.created_at, now());
}

#[test]
fn get_propagates_not_found() {
    let (service, _, _) = build_service(&[]);

    match service.get(&EvaluationId("missing".to_string())) {
        Err(EvaluationServiceError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[tokio::test]
async fn complete_persists_valuation_and_mails_results() {
    let (service, repository, sender) = build_service(&["deals@example.com"]);
    let record = service.start("owner@example.com", now()).expect("starts");

    let answers = financial_answers().with("top_client_concentration", "over_60");
    let completed = service
        .complete(&record.id, answers, Some(6), now())
        .await
        .expect("completes");

    assert_eq!(completed.summary.result.valuation_low, 1_250_000.0);
    assert_eq!(completed.summary.result.valuation_high, 2_187_500.0);
    assert!(completed.summary.concentration_risk);
    assert_eq!(completed.notifications_sent, 2);

    let stored = repository.get(&record.id);
    assert_eq!(stored.status, EvaluationStatus::Completed);
    assert_eq!(stored.current_section, 6);
    assert_eq!(stored.valuation_low, Some(1_250_000.0));
    assert_eq!(stored.ebitda_multiple_low, Some(2.0));
    assert_eq!(stored.ebitda_multiple_high, Some(3.5));
    assert_eq!(stored.completed_at, Some(now()));

    let sent = sender.sent();
    assert_eq!(sent[0].recipients, vec!["owner@example.com".to_string()]);
    assert_eq!(sent[1].recipients, vec!["deals@example.com".to_string()]);
    match &sent[0].content {
        NotificationContent::Html { html, .. } => assert!(html.contains("$1.3M – $2.2M")),
        other => panic!("expected html results, got {other:?}"),
    }
}

#[tokio::test]
async fn complete_without_financials_leaves_record_started() {
    let (service, repository, sender) = build_service(&[]);
    let record = service.start("owner@example.com", now()).expect("starts");

    let answers = financial_answers().with("revenue_range", "unknown");
    match service.complete(&record.id, answers, None, now()).await {
        Err(EvaluationServiceError::Valuation(ValuationError::MissingInput { fields })) => {
            assert_eq!(fields, vec!["revenue_range"]);
        }
        other => panic!("expected missing input, got {other:?}"),
    }

    let stored = repository.get(&record.id);
    assert_eq!(stored.status, EvaluationStatus::Started);
    assert!(stored.valuation_low.is_none());
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn completion_happens_exactly_once() {
    let (service, _, _) = build_service(&[]);
    let record = service.start("owner@example.com", now()).expect("starts");

    service
        .complete(&record.id, financial_answers(), None, now())
        .await
        .expect("first completion");

    match service
        .complete(&record.id, financial_answers(), None, now())
        .await
    {
        Err(EvaluationServiceError::AlreadyCompleted(id)) => assert_eq!(id, record.id),
        other => panic!("expected already completed, got {other:?}"),
    }
    match service.save_progress(&record.id, 1, financial_answers(), now()) {
        Err(EvaluationServiceError::AlreadyCompleted(_)) => {}
        other => panic!("expected already completed, got {other:?}"),
    }
}

#[tokio::test]
async fn results_mail_failures_do_not_fail_completion() {
    let (service, repository, sender) = build_service(&["deals@example.com"]);
    sender.reject("owner@example.com");
    let record = service.start("owner@example.com", now()).expect("starts");

    let completed = service
        .complete(&record.id, financial_answers(), None, now())
        .await
        .expect("completion survives mail failure");

    assert_eq!(completed.notifications_sent, 1);
    assert_eq!(
        repository.get(&record.id).status,
        EvaluationStatus::Completed
    );
}
