use super::domain::{EvaluationRecord, ValuationSummary};
use crate::workflows::notifications::Notification;

const OWNER_SUBJECT: &str = "Your 3PL Valuation Results — Fulfill M&A";

pub(crate) fn owner_results(
    record: &EvaluationRecord,
    summary: &ValuationSummary,
) -> Notification {
    let html = format!(
        r#"
      <div style="font-family: 'Plus Jakarta Sans', Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 40px 20px;">
        <h1 style="color: #1A1A2E; font-size: 24px;">Your 3PL Valuation Results</h1>
        <p style="color: #6B7280; font-size: 16px; line-height: 1.6;">
          Thank you for completing the Fulfill M&A evaluation tool. Here's a summary of your estimated valuation:
        </p>
        <div style="background: linear-gradient(135deg, #1B76FF, #29359D); border-radius: 12px; padding: 32px; text-align: center; margin: 24px 0;">
          <p style="color: rgba(255,255,255,0.8); font-size: 14px; margin: 0 0 8px;">Estimated Enterprise Value</p>
          <p style="color: #fff; font-size: 36px; font-weight: 800; margin: 0;">{valuation}</p>
          <p style="color: rgba(255,255,255,0.8); font-size: 14px; margin: 8px 0 0;">{multiple} EBITDA Multiple</p>
        </div>
        <p style="color: #6B7280; font-size: 14px; line-height: 1.6;">
          Estimated EBITDA: {ebitda}
        </p>
        <hr style="border: none; border-top: 1px solid #E5E7EB; margin: 32px 0;" />
        <p style="color: #9CA3AF; font-size: 12px;">
          This valuation is an estimate based on industry benchmarks and self-reported data. It is not a formal appraisal.
        </p>
      </div>
    "#,
        valuation = summary.valuation_range,
        multiple = summary.multiple_range,
        ebitda = summary.estimated_ebitda_label,
    );

    Notification::html(record.email.clone(), OWNER_SUBJECT, html)
}

pub(crate) fn internal_alert(
    recipient: &str,
    record: &EvaluationRecord,
    summary: &ValuationSummary,
) -> Notification {
    let subject = format!(
        "New 3PL Valuation: {} — {}",
        summary.valuation_range, record.email
    );
    let html = format!(
        r#"
      <div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2>New M&A Evaluation Completed</h2>
        <table style="width: 100%; border-collapse: collapse;">
          <tr><td style="padding: 8px; font-weight: bold;">Email:</td><td style="padding: 8px;">{email}</td></tr>
          <tr><td style="padding: 8px; font-weight: bold;">Evaluation ID:</td><td style="padding: 8px;">{id}</td></tr>
          <tr><td style="padding: 8px; font-weight: bold;">Valuation Range:</td><td style="padding: 8px;">{valuation}</td></tr>
          <tr><td style="padding: 8px; font-weight: bold;">Multiple Range:</td><td style="padding: 8px;">{multiple}</td></tr>
          <tr><td style="padding: 8px; font-weight: bold;">Est. EBITDA:</td><td style="padding: 8px;">{ebitda}</td></tr>
          <tr><td style="padding: 8px; font-weight: bold;">Concentration Risk:</td><td style="padding: 8px;">{risk}</td></tr>
        </table>
      </div>
    "#,
        email = record.email,
        id = record.id,
        valuation = summary.valuation_range,
        multiple = summary.multiple_range,
        ebitda = summary.estimated_ebitda_label,
        risk = if summary.concentration_risk { "yes" } else { "no" },
    );

    Notification::html(recipient, subject, html)
}
