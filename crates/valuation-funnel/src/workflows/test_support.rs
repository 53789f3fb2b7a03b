use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::workflows::evaluations::{
    EvaluationId, EvaluationRecord, EvaluationRepository, EvaluationStatus, RepositoryError,
};
use crate::workflows::notifications::{Notification, NotificationSender, SendError};
use crate::workflows::valuation::AnswerSet;

pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn hours_ago(hours: i64) -> DateTime<Utc> {
    now() - Duration::hours(hours)
}

pub(crate) fn financial_answers() -> AnswerSet {
    AnswerSet::new()
        .with("revenue_range", "3m_7m")
        .with("ebitda_margin", "10_15")
}

/// Started record created `created_hours_ago` before [`now`].
pub(crate) fn abandoned_record(
    email: &str,
    created_hours_ago: i64,
    sent: u8,
    last_sent_hours_ago: Option<i64>,
) -> EvaluationRecord {
    let mut record = EvaluationRecord::started(email, hours_ago(created_hours_ago));
    record.abandoned_email_count = sent;
    record.last_abandoned_email_at = last_sent_hours_ago.map(hours_ago);
    record
}

#[derive(Default)]
pub(crate) struct MemoryRepository {
    records: Mutex<BTreeMap<EvaluationId, EvaluationRecord>>,
    reads_unavailable: AtomicBool,
    advances_unavailable: AtomicBool,
}

impl MemoryRepository {
    pub(crate) fn with_records(records: Vec<EvaluationRecord>) -> Self {
        let repository = Self::default();
        {
            let mut guard = repository.records.lock().expect("repository mutex poisoned");
            for record in records {
                guard.insert(record.id.clone(), record);
            }
        }
        repository
    }

    pub(crate) fn fail_reads(&self) {
        self.reads_unavailable.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_advances(&self) {
        self.advances_unavailable.store(true, Ordering::SeqCst);
    }

    pub(crate) fn get(&self, id: &EvaluationId) -> EvaluationRecord {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
            .expect("record present")
    }
}

impl EvaluationRepository for MemoryRepository {
    fn insert(&self, record: EvaluationRecord) -> Result<EvaluationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: EvaluationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get_mut(&record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &EvaluationId) -> Result<Option<EvaluationRecord>, RepositoryError> {
        if self.reads_unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("read replica down".to_string()));
        }
        Ok(self
            .records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned())
    }

    fn abandoned(&self, max_notifications: u8) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        if self.reads_unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("read replica down".to_string()));
        }
        Ok(self
            .records
            .lock()
            .expect("repository mutex poisoned")
            .values()
            .filter(|record| record.awaiting_recovery(max_notifications))
            .cloned()
            .collect())
    }

    fn advance_recovery(
        &self,
        id: &EvaluationId,
        expected_count: u8,
        sent_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        if self.advances_unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("primary down".to_string()));
        }
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if record.status != EvaluationStatus::Started
            || record.abandoned_email_count != expected_count
        {
            return Err(RepositoryError::Conflict);
        }
        record.abandoned_email_count = expected_count + 1;
        record.last_abandoned_email_at = Some(sent_at);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemorySender {
    sent: Mutex<Vec<Notification>>,
    rejected_recipients: Mutex<HashSet<String>>,
}

impl MemorySender {
    pub(crate) fn reject(&self, recipient: &str) {
        self.rejected_recipients
            .lock()
            .expect("sender mutex poisoned")
            .insert(recipient.to_string());
    }

    pub(crate) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("sender mutex poisoned").clone()
    }
}

#[async_trait]
impl NotificationSender for MemorySender {
    async fn send(&self, notification: Notification) -> Result<(), SendError> {
        let rejected = {
            let guard = self
                .rejected_recipients
                .lock()
                .expect("sender mutex poisoned");
            notification
                .recipients
                .iter()
                .any(|recipient| guard.contains(recipient))
        };
        if rejected {
            return Err(SendError::Rejected {
                status: 550,
                body: "mailbox unavailable".to_string(),
            });
        }
        self.sent
            .lock()
            .expect("sender mutex poisoned")
            .push(notification);
        Ok(())
    }
}
