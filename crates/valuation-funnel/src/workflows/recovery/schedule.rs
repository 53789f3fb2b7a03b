use chrono::{DateTime, Utc};

use super::templates::RECOVERY_TEMPLATES;
use crate::workflows::evaluations::EvaluationRecord;

/// Cumulative hour offsets from record creation at which each recovery email
/// becomes eligible. Entry `i` gates email index `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoverySchedule {
    thresholds: Vec<f64>,
}

impl RecoverySchedule {
    /// 1 hour, 1 day, 3 days.
    pub fn standard() -> Self {
        Self {
            thresholds: vec![1.0, 24.0, 72.0],
        }
    }

    pub fn new(thresholds: Vec<f64>) -> Result<Self, ScheduleError> {
        if thresholds.is_empty() {
            return Err(ScheduleError::Empty);
        }
        if thresholds.len() > RECOVERY_TEMPLATES.len() {
            return Err(ScheduleError::TooMany {
                configured: thresholds.len(),
                max: RECOVERY_TEMPLATES.len(),
            });
        }
        for (index, hours) in thresholds.iter().enumerate() {
            if !hours.is_finite() || *hours <= 0.0 {
                return Err(ScheduleError::NonPositive {
                    index,
                    hours: *hours,
                });
            }
            if index > 0 && *hours <= thresholds[index - 1] {
                return Err(ScheduleError::NotIncreasing { index });
            }
        }
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Upper bound on `abandoned_email_count`.
    pub fn max_notifications(&self) -> u8 {
        self.thresholds.len() as u8
    }

    pub fn threshold(&self, email_index: u8) -> Option<f64> {
        self.thresholds.get(usize::from(email_index)).copied()
    }

    /// Hours that must pass after the previous send before `email_index` may go out.
    pub fn gap_before(&self, email_index: u8) -> Option<f64> {
        let index = usize::from(email_index);
        let current = *self.thresholds.get(index)?;
        match index {
            0 => Some(current),
            _ => Some(current - self.thresholds[index - 1]),
        }
    }

    /// Decides whether `record` is owed its next recovery email at `now`.
    ///
    /// The first email only needs the record to be old enough. Later emails need
    /// both the incremental gap since the anchor and the cumulative age since
    /// creation; either one alone is not enough.
    pub fn decide(&self, record: &EvaluationRecord, now: DateTime<Utc>) -> RecoveryDecision {
        let email_index = record.abandoned_email_count;
        let Some(threshold) = self.threshold(email_index) else {
            return RecoveryDecision::Exhausted;
        };

        let hours_since_creation = hours_between(record.created_at, now);
        let hours_since_anchor = hours_between(record.recovery_anchor(), now);

        let due = if email_index == 0 {
            hours_since_creation >= threshold
        } else {
            let gap = threshold - self.thresholds[usize::from(email_index) - 1];
            hours_since_anchor >= gap && hours_since_creation >= threshold
        };

        if due {
            RecoveryDecision::Due { email_index }
        } else {
            RecoveryDecision::NotYet {
                email_index,
                hours_since_creation,
                hours_since_anchor,
            }
        }
    }
}

impl Default for RecoverySchedule {
    fn default() -> Self {
        Self::standard()
    }
}

/// Fractional hours from `from` to `to`; negative when `from` is in the future.
pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecoveryDecision {
    Due {
        email_index: u8,
    },
    NotYet {
        email_index: u8,
        hours_since_creation: f64,
        hours_since_anchor: f64,
    },
    /// No threshold configured for the record's next index.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    #[error("at least one threshold is required")]
    Empty,
    #[error("{configured} thresholds configured but only {max} recovery templates exist")]
    TooMany { configured: usize, max: usize },
    #[error("threshold #{index} ({hours}h) must be a positive number of hours")]
    NonPositive { index: usize, hours: f64 },
    #[error("threshold #{index} must be later than the one before it")]
    NotIncreasing { index: usize },
}
