use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{
    is_plausible_email, CompletedEvaluation, EvaluationId, EvaluationRecord, ValuationSummary,
};
use super::messages::{internal_alert, owner_results};
use super::repository::{EvaluationRepository, RepositoryError};
use crate::workflows::notifications::NotificationSender;
use crate::workflows::valuation::{AnswerSet, ValuationEngine, ValuationError};

/// Service composing the repository, valuation engine, and results mailer.
pub struct EvaluationService<R, N> {
    repository: Arc<R>,
    sender: Arc<N>,
    engine: ValuationEngine,
    internal_recipients: Vec<String>,
}

impl<R, N> EvaluationService<R, N>
where
    R: EvaluationRepository + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(repository: Arc<R>, sender: Arc<N>, internal_recipients: Vec<String>) -> Self {
        Self {
            repository,
            sender,
            engine: ValuationEngine::standard(),
            internal_recipients,
        }
    }

    pub fn engine(&self) -> &ValuationEngine {
        &self.engine
    }

    /// Open a new evaluation for `email`.
    pub fn start(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<EvaluationRecord, EvaluationServiceError> {
        if !is_plausible_email(email) {
            return Err(EvaluationServiceError::InvalidEmail(email.to_string()));
        }

        let record = EvaluationRecord::started(email.trim(), now);
        let stored = self.repository.insert(record)?;
        info!(evaluation_id = %stored.id, "evaluation started");
        Ok(stored)
    }

    /// Persist answers and the section the respondent is now on.
    pub fn save_progress(
        &self,
        id: &EvaluationId,
        current_section: u32,
        answers: AnswerSet,
        now: DateTime<Utc>,
    ) -> Result<EvaluationRecord, EvaluationServiceError> {
        let mut record = self.get(id)?;
        if record.is_completed() {
            return Err(EvaluationServiceError::AlreadyCompleted(id.clone()));
        }

        record.current_section = current_section;
        record.answers = answers;
        record.updated_at = now;
        self.repository.update(record.clone())?;
        Ok(record)
    }

    /// Fetch an evaluation, e.g. to rehydrate the form from a resume link.
    pub fn get(&self, id: &EvaluationId) -> Result<EvaluationRecord, EvaluationServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Score the final answers, mark the evaluation completed, and mail the
    /// results. Nothing is written when the valuation cannot be computed.
    pub async fn complete(
        &self,
        id: &EvaluationId,
        answers: AnswerSet,
        final_section: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<CompletedEvaluation, EvaluationServiceError> {
        let mut record = self.get(id)?;
        if record.is_completed() {
            return Err(EvaluationServiceError::AlreadyCompleted(id.clone()));
        }

        let result = self.engine.score(&answers)?;
        let summary = ValuationSummary::new(result, &answers);

        record.answers = answers;
        if let Some(section) = final_section {
            record.current_section = section;
        }
        record.apply_valuation(&summary.result, now);
        self.repository.update(record.clone())?;

        info!(
            evaluation_id = %record.id,
            valuation = %summary.valuation_range,
            "evaluation completed"
        );

        let notifications_sent = self.send_results(&record, &summary).await;

        Ok(CompletedEvaluation {
            evaluation_id: record.id,
            summary,
            notifications_sent,
        })
    }

    /// Results mail is best-effort; failures are logged and never surface to
    /// the respondent.
    async fn send_results(&self, record: &EvaluationRecord, summary: &ValuationSummary) -> usize {
        let mut outgoing = vec![owner_results(record, summary)];
        outgoing.extend(
            self.internal_recipients
                .iter()
                .map(|recipient| internal_alert(recipient, record, summary)),
        );

        let mut sent = 0;
        for notification in outgoing {
            let recipients = notification.recipients.join(", ");
            match self.sender.send(notification).await {
                Ok(()) => sent += 1,
                Err(err) => warn!(
                    evaluation_id = %record.id,
                    %recipients,
                    error = %err,
                    "results email failed"
                ),
            }
        }
        sent
    }
}

/// Error raised by the evaluation service.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationServiceError {
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("evaluation {0} is already completed")]
    AlreadyCompleted(EvaluationId),
    #[error(transparent)]
    Valuation(#[from] ValuationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
