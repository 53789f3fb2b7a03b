//! Abandonment recovery: a timed sequence of reminder emails for evaluations
//! that were started but never completed.

pub mod router;
pub mod schedule;
pub mod scheduler;
pub mod templates;


pub use router::{recovery_router, RecoveryTrigger, CRON_SECRET_HEADER};
pub use schedule::{hours_between, RecoveryDecision, RecoverySchedule, ScheduleError};
pub use scheduler::{AbandonmentScheduler, SweepError, SweepFailure, SweepReport};
pub use templates::{resume_url, RecoveryDelivery, RecoveryTemplate, RECOVERY_TEMPLATES};
