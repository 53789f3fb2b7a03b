use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;
use valuation_funnel::config::EmailConfig;
use valuation_funnel::workflows::evaluations::{
    EvaluationId, EvaluationRecord, EvaluationRepository, EvaluationStatus, RepositoryError,
};
use valuation_funnel::workflows::notifications::{
    Notification, NotificationSender, SendError, SendGridSender,
};
use valuation_funnel::workflows::valuation::AnswerValue;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryEvaluationRepository {
    records: Arc<Mutex<HashMap<EvaluationId, EvaluationRecord>>>,
}

impl EvaluationRepository for InMemoryEvaluationRepository {
    fn insert(&self, record: EvaluationRecord) -> Result<EvaluationRecord, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: EvaluationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &EvaluationId) -> Result<Option<EvaluationRecord>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.get(id).cloned())
    }

    fn abandoned(&self, max_notifications: u8) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        let guard = self.lock()?;
        let mut records: Vec<_> = guard
            .values()
            .filter(|record| record.awaiting_recovery(max_notifications))
            .cloned()
            .collect();
        records.sort_by_key(|record| record.created_at);
        Ok(records)
    }

    fn advance_recovery(
        &self,
        id: &EvaluationId,
        expected_count: u8,
        sent_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if record.status != EvaluationStatus::Started
            || record.abandoned_email_count != expected_count
        {
            return Err(RepositoryError::Conflict);
        }
        record.abandoned_email_count = expected_count + 1;
        record.last_abandoned_email_at = Some(sent_at);
        record.updated_at = sent_at;
        Ok(())
    }
}

impl InMemoryEvaluationRepository {
    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<EvaluationId, EvaluationRecord>>, RepositoryError>
    {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("evaluation store lock poisoned".to_string()))
    }
}

/// Keeps every notification in memory instead of delivering it. Used when no
/// mail provider key is configured and by the demo.
#[derive(Default, Clone)]
pub(crate) struct InMemoryOutbox {
    messages: Arc<Mutex<Vec<Notification>>>,
}

#[async_trait]
impl NotificationSender for InMemoryOutbox {
    async fn send(&self, notification: Notification) -> Result<(), SendError> {
        if notification.recipients.is_empty() {
            return Err(SendError::NoRecipients);
        }
        info!(
            recipients = %notification.recipients.join(", "),
            subject = notification.subject().unwrap_or("<provider template>"),
            "notification captured in outbox"
        );
        self.messages
            .lock()
            .map_err(|_| SendError::Transport("outbox lock poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}

impl InMemoryOutbox {
    pub(crate) fn messages(&self) -> Vec<Notification> {
        self.messages
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// Sender chosen at startup from the email configuration.
pub(crate) enum ConfiguredSender {
    SendGrid(SendGridSender),
    Outbox(InMemoryOutbox),
}

impl ConfiguredSender {
    pub(crate) fn from_config(config: &EmailConfig) -> Self {
        match SendGridSender::from_config(config) {
            Some(sender) => ConfiguredSender::SendGrid(sender),
            None => ConfiguredSender::Outbox(InMemoryOutbox::default()),
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            ConfiguredSender::SendGrid(_) => "sendgrid",
            ConfiguredSender::Outbox(_) => "outbox",
        }
    }
}

#[async_trait]
impl NotificationSender for ConfiguredSender {
    async fn send(&self, notification: Notification) -> Result<(), SendError> {
        match self {
            ConfiguredSender::SendGrid(sender) => sender.send(notification).await,
            ConfiguredSender::Outbox(outbox) => outbox.send(notification).await,
        }
    }
}

/// Parses `question=value`; a comma-separated value becomes a multi-select answer.
pub(crate) fn parse_answer(raw: &str) -> Result<(String, AnswerValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected question=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing question id in '{raw}'"));
    }

    let value = value.trim();
    let answer = if value.contains(',') {
        AnswerValue::Multiple(
            value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        )
    } else {
        AnswerValue::Single(value.to_string())
    };
    Ok((key.to_string(), answer))
}
