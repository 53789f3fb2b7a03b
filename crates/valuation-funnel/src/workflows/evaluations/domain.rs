use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::valuation::{
    format_currency, has_concentration_risk, AnswerSet, ValuationResult,
};

/// Identifier wrapper for persisted evaluations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationId(pub String);

impl EvaluationId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EvaluationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationStatus {
    Started,
    Completed,
}

impl EvaluationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EvaluationStatus::Started => "started",
            EvaluationStatus::Completed => "completed",
        }
    }
}

/// One respondent's questionnaire, in progress or finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: EvaluationId,
    pub email: String,
    pub status: EvaluationStatus,
    pub current_section: u32,
    pub answers: AnswerSet,
    /// Recovery emails sent so far. Advanced only after a confirmed send.
    pub abandoned_email_count: u8,
    pub last_abandoned_email_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub valuation_low: Option<f64>,
    pub valuation_high: Option<f64>,
    pub ebitda_multiple_low: Option<f64>,
    pub ebitda_multiple_high: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl EvaluationRecord {
    /// Fresh record as written when the respondent submits their email.
    pub fn started(email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: EvaluationId::generate(),
            email: email.into(),
            status: EvaluationStatus::Started,
            current_section: 0,
            answers: AnswerSet::new(),
            abandoned_email_count: 0,
            last_abandoned_email_at: None,
            created_at: now,
            updated_at: now,
            valuation_low: None,
            valuation_high: None,
            ebitda_multiple_low: None,
            ebitda_multiple_high: None,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == EvaluationStatus::Completed
    }

    /// Reference point for the next recovery gap: the last send, else creation.
    pub fn recovery_anchor(&self) -> DateTime<Utc> {
        self.last_abandoned_email_at.unwrap_or(self.created_at)
    }

    pub fn awaiting_recovery(&self, max_notifications: u8) -> bool {
        self.status == EvaluationStatus::Started && self.abandoned_email_count < max_notifications
    }

    pub(crate) fn apply_valuation(&mut self, valuation: &ValuationResult, now: DateTime<Utc>) {
        self.status = EvaluationStatus::Completed;
        self.valuation_low = Some(valuation.valuation_low);
        self.valuation_high = Some(valuation.valuation_high);
        self.ebitda_multiple_low = Some(valuation.ebitda_multiple_low);
        self.ebitda_multiple_high = Some(valuation.ebitda_multiple_high);
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    pub fn resume_view(&self) -> ResumeView {
        ResumeView {
            id: self.id.clone(),
            email: self.email.clone(),
            status: self.status.label(),
            current_section: self.current_section,
            answers: self.answers.clone(),
        }
    }
}

/// Payload the survey uses to rehydrate an in-progress form from a resume link.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeView {
    pub id: EvaluationId,
    pub email: String,
    pub status: &'static str,
    pub current_section: u32,
    pub answers: AnswerSet,
}

/// Valuation plus the display strings every surface renders identically.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationSummary {
    #[serde(flatten)]
    pub result: ValuationResult,
    pub valuation_range: String,
    pub multiple_range: String,
    pub estimated_ebitda_label: String,
    pub concentration_risk: bool,
}

impl ValuationSummary {
    pub fn new(result: ValuationResult, answers: &AnswerSet) -> Self {
        Self {
            valuation_range: result.valuation_range_label(),
            multiple_range: result.multiple_range_label(),
            estimated_ebitda_label: format_currency(result.estimated_ebitda),
            concentration_risk: has_concentration_risk(answers),
            result,
        }
    }
}

/// Result of finishing an evaluation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedEvaluation {
    pub evaluation_id: EvaluationId,
    pub summary: ValuationSummary,
    pub notifications_sent: usize,
}

/// Presence/shape check only; deliverability is the mail provider's problem.
pub fn is_plausible_email(raw: &str) -> bool {
    let value = raw.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}
