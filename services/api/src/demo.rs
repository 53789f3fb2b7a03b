use crate::infra::{parse_answer, InMemoryEvaluationRepository, InMemoryOutbox};
use chrono::{Duration, Utc};
use clap::Args;
use std::sync::Arc;
use valuation_funnel::error::AppError;
use valuation_funnel::workflows::evaluations::{
    EvaluationRepository, EvaluationService, EvaluationServiceError, ValuationSummary,
};
use valuation_funnel::workflows::recovery::{AbandonmentScheduler, RecoverySchedule};
use valuation_funnel::workflows::valuation::{AnswerSet, AnswerValue, ValuationEngine};

#[derive(Args, Debug, Default)]
pub(crate) struct ValuateArgs {
    /// Survey answer as question=value; repeat per question. Commas make a multi-select.
    #[arg(long = "answer", value_parser = parse_answer)]
    pub(crate) answers: Vec<(String, AnswerValue)>,
    /// Print the full summary as JSON instead of a text report
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Respondent email used for the simulated evaluation
    #[arg(long, default_value = "owner@example.com")]
    pub(crate) email: String,
    /// Stop after the recovery sequence instead of completing the evaluation
    #[arg(long)]
    pub(crate) skip_completion: bool,
}

pub(crate) fn run_valuation(args: ValuateArgs) -> Result<(), AppError> {
    let answers: AnswerSet = args.answers.into_iter().collect();
    let result = ValuationEngine::standard().score(&answers)?;
    let summary = ValuationSummary::new(result, &answers);

    if args.json {
        let rendered = serde_json::to_string_pretty(&summary).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        render_summary(&summary);
    }
    Ok(())
}

/// Replays an abandoned evaluation against the standard recovery schedule,
/// then completes it and shows the results mail.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        email,
        skip_completion,
    } = args;

    let repository = Arc::new(InMemoryEvaluationRepository::default());
    let outbox = InMemoryOutbox::default();
    let sender = Arc::new(outbox.clone());
    let service = EvaluationService::new(
        repository.clone(),
        sender.clone(),
        vec!["team@fulfill.com".to_string()],
    );
    let scheduler = AbandonmentScheduler::new(
        repository.clone(),
        sender,
        RecoverySchedule::standard(),
        "https://fulfill.com/evaluate",
    );

    let started_at = Utc::now();
    let record = match service.start(&email, started_at) {
        Ok(record) => record,
        Err(err) => {
            println!("Evaluation rejected: {err}");
            return Ok(());
        }
    };
    println!("Started evaluation {} for {}", record.id, record.email);
    println!(
        "Recovery thresholds (hours since start): {:?}",
        scheduler.schedule().thresholds()
    );

    println!("\nAbandonment sweeps");
    for hours in [0.5_f64, 2.0, 20.0, 26.0, 50.0, 75.0, 100.0] {
        let at = started_at + Duration::minutes((hours * 60.0) as i64);
        let report = scheduler.sweep(at).await?;
        let sent_so_far = repository
            .fetch(&record.id)
            .ok()
            .flatten()
            .map(|stored| stored.abandoned_email_count)
            .unwrap_or_default();
        println!(
            "  +{hours:>5.1}h  candidates {} | sent {} | not due {} | total reminders {}",
            report.candidates, report.emails_sent, report.not_due, sent_so_far
        );
    }
    for notification in outbox.messages() {
        println!(
            "  - {}",
            notification.subject().unwrap_or("<provider template>")
        );
    }

    if skip_completion {
        return Ok(());
    }

    println!("\nCompleting the evaluation");
    let answers = AnswerSet::new()
        .with("revenue_range", "7m_15m")
        .with("ebitda_margin", "15_20")
        .with("revenue_trend", "growing_moderate")
        .with("top_client_concentration", "25_40")
        .with("recurring_revenue_pct", "majority_contracted")
        .with("mgmt_independence", "mostly_delegated")
        .with("lease_terms", "long_lease");
    let completed_at = started_at + Duration::hours(120);
    let completed = match service
        .complete(&record.id, answers, Some(6), completed_at)
        .await
    {
        Ok(completed) => completed,
        Err(EvaluationServiceError::Valuation(err)) => return Err(err.into()),
        Err(err) => {
            println!("  Completion failed: {err}");
            return Ok(());
        }
    };
    render_summary(&completed.summary);
    println!(
        "  Results emails sent: {} (outbox holds {})",
        completed.notifications_sent,
        outbox.messages().len()
    );

    let report = scheduler.sweep(completed_at + Duration::hours(1)).await?;
    println!(
        "  Follow-up sweep candidates after completion: {}",
        report.candidates
    );
    Ok(())
}

fn render_summary(summary: &ValuationSummary) {
    println!("Estimated valuation: {}", summary.valuation_range);
    println!("EBITDA multiple: {}", summary.multiple_range);
    println!("Estimated EBITDA: {}", summary.estimated_ebitda_label);
    if summary.concentration_risk {
        println!("Client concentration flagged as a buyer risk");
    }
    if summary.result.factors.is_empty() {
        return;
    }
    println!("Factors:");
    for factor in &summary.result.factors {
        println!(
            "  - [{}] {}: {}",
            factor.impact.label(),
            factor.name,
            factor.description
        );
    }
}
