use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::schedule::{RecoveryDecision, RecoverySchedule};
use super::templates::{resume_url, RecoveryDelivery};
use crate::workflows::evaluations::{
    EvaluationId, EvaluationRecord, EvaluationRepository, RepositoryError,
};
use crate::workflows::notifications::NotificationSender;

/// Walks abandoned evaluations and sends at most one recovery email per record
/// per sweep.
pub struct AbandonmentScheduler<R, N> {
    repository: Arc<R>,
    sender: Arc<N>,
    schedule: RecoverySchedule,
    app_url: String,
    delivery: RecoveryDelivery,
}

impl<R, N> AbandonmentScheduler<R, N>
where
    R: EvaluationRepository + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(
        repository: Arc<R>,
        sender: Arc<N>,
        schedule: RecoverySchedule,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            sender,
            schedule,
            app_url: app_url.into(),
            delivery: RecoveryDelivery::Html,
        }
    }

    pub fn with_delivery(mut self, delivery: RecoveryDelivery) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn schedule(&self) -> &RecoverySchedule {
        &self.schedule
    }

    /// One pass over every candidate. Per-record failures are recorded in the
    /// report; only a failed candidate read aborts the sweep.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, SweepError> {
        let candidates = self
            .repository
            .abandoned(self.schedule.max_notifications())?;

        let mut report = SweepReport {
            candidates: candidates.len(),
            ..SweepReport::default()
        };

        for record in candidates {
            self.process(&record, now, &mut report).await;
        }

        info!(
            candidates = report.candidates,
            emails_sent = report.emails_sent,
            not_due = report.not_due,
            failures = report.failures.len(),
            stale_advances = report.stale_advances,
            "abandonment sweep finished"
        );
        Ok(report)
    }

    async fn process(
        &self,
        record: &EvaluationRecord,
        now: DateTime<Utc>,
        report: &mut SweepReport,
    ) {
        let email_index = match self.schedule.decide(record, now) {
            RecoveryDecision::Due { email_index } => email_index,
            RecoveryDecision::NotYet {
                email_index,
                hours_since_creation,
                hours_since_anchor,
            } => {
                debug!(
                    evaluation_id = %record.id,
                    email_index,
                    hours_since_creation,
                    hours_since_anchor,
                    "recovery email not due"
                );
                report.not_due += 1;
                return;
            }
            RecoveryDecision::Exhausted => return,
        };

        let link = resume_url(&self.app_url, &record.id);
        let Some(notification) = self.delivery.notification(&record.email, email_index, &link)
        else {
            report.fail(&record.id, format!("no template for email #{email_index}"));
            return;
        };

        if let Err(err) = self.sender.send(notification).await {
            error!(
                evaluation_id = %record.id,
                email_index,
                error = %err,
                "recovery email failed"
            );
            report.fail(&record.id, err.to_string());
            return;
        }

        report.emails_sent += 1;
        info!(evaluation_id = %record.id, email_index, "recovery email sent");

        match self
            .repository
            .advance_recovery(&record.id, email_index, now)
        {
            Ok(()) => {}
            Err(RepositoryError::Conflict) => {
                warn!(
                    evaluation_id = %record.id,
                    email_index,
                    "recovery counter moved during sweep; skipped advance"
                );
                report.stale_advances += 1;
            }
            Err(err) => {
                error!(
                    evaluation_id = %record.id,
                    email_index,
                    error = %err,
                    "recovery email sent but counter not advanced"
                );
                report.fail(&record.id, err.to_string());
            }
        }
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub candidates: usize,
    pub emails_sent: usize,
    pub not_due: usize,
    pub failures: Vec<SweepFailure>,
    /// Sends whose counter advance lost to a concurrent update.
    pub stale_advances: usize,
}

impl SweepReport {
    fn fail(&mut self, evaluation_id: &EvaluationId, reason: String) {
        self.failures.push(SweepFailure {
            evaluation_id: evaluation_id.clone(),
            reason,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepFailure {
    pub evaluation_id: EvaluationId,
    pub reason: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("failed to load abandoned evaluations: {0}")]
    Store(#[from] RepositoryError),
}
