//! Evaluation lifecycle: start, save progress, resume, and complete with a
//! valuation and results mail.

pub mod domain;
mod messages;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    is_plausible_email, CompletedEvaluation, EvaluationId, EvaluationRecord, EvaluationStatus,
    ResumeView, ValuationSummary,
};
pub use repository::{EvaluationRepository, RepositoryError};
pub use router::evaluation_router;
pub use service::{EvaluationService, EvaluationServiceError};
