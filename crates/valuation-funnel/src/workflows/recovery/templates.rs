use std::collections::BTreeMap;

use crate::workflows::evaluations::EvaluationId;
use crate::workflows::notifications::Notification;

/// Copy for one step of the recovery sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryTemplate {
    pub subject: &'static str,
    pub heading: &'static str,
    pub body: &'static str,
    pub cta: &'static str,
}

pub const RECOVERY_TEMPLATES: [RecoveryTemplate; 3] = [
    RecoveryTemplate {
        subject: "Your 3PL valuation is waiting",
        heading: "You're Almost There",
        body: "You started your confidential 3PL valuation but didn't finish. It only takes a few more minutes to see what your business could be worth.",
        cta: "Continue My Valuation",
    },
    RecoveryTemplate {
        subject: "You're just a few questions away from your valuation",
        heading: "Pick Up Where You Left Off",
        body: "You're close to getting your personalized 3PL valuation. We saved your progress, so just click below to continue right where you left off.",
        cta: "Finish My Valuation",
    },
    RecoveryTemplate {
        subject: "Last chance: see what your 3PL is worth",
        heading: "Don't Miss Out",
        body: "This is our final reminder. Your partially completed valuation is still saved, but we'll remove it soon. Take 3 minutes to finish and discover what your 3PL could be worth.",
        cta: "Get My Valuation Now",
    },
];

impl RecoveryTemplate {
    pub fn for_index(email_index: u8) -> Option<&'static RecoveryTemplate> {
        RECOVERY_TEMPLATES.get(usize::from(email_index))
    }

    pub fn render_html(&self, resume_url: &str) -> String {
        format!(
            r#"
    <div style="font-family: 'Plus Jakarta Sans', Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 40px 20px;">
      <h1 style="color: #1A1A2E; font-size: 24px;">{heading}</h1>
      <p style="color: #6B7280; font-size: 16px; line-height: 1.6; margin: 16px 0 24px;">{body}</p>
      <a href="{resume_url}" style="display: inline-block; padding: 14px 32px; background: linear-gradient(135deg, #1B76FF, #29359D); color: #fff; font-size: 16px; font-weight: 700; border-radius: 100px; text-decoration: none;">{cta}</a>
      <hr style="border: none; border-top: 1px solid #E5E7EB; margin: 32px 0;" />
      <p style="color: #9CA3AF; font-size: 12px;">
        You received this email because you started a valuation at Fulfill. If you didn't request this, you can safely ignore it.
      </p>
    </div>
  "#,
            heading = self.heading,
            body = self.body,
            resume_url = resume_url,
            cta = self.cta,
        )
    }
}

/// `<app url>?resume=<id>`, or `&resume=` when the app URL already has a query.
pub fn resume_url(app_url: &str, id: &EvaluationId) -> String {
    let separator = if app_url.contains('?') { '&' } else { '?' };
    format!("{app_url}{separator}resume={id}")
}

/// How recovery emails are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryDelivery {
    /// Built-in HTML bodies, one per step.
    Html,
    /// Provider template fed `{ resume_url }`.
    ProviderTemplate { template_id: String },
}

impl RecoveryDelivery {
    pub fn from_template_id(template_id: Option<String>) -> Self {
        match template_id {
            Some(template_id) => RecoveryDelivery::ProviderTemplate { template_id },
            None => RecoveryDelivery::Html,
        }
    }

    /// `None` when `email_index` has no template.
    pub fn notification(
        &self,
        recipient: &str,
        email_index: u8,
        resume_url: &str,
    ) -> Option<Notification> {
        let template = RecoveryTemplate::for_index(email_index)?;
        let notification = match self {
            RecoveryDelivery::Html => Notification::html(
                recipient,
                template.subject,
                template.render_html(resume_url),
            ),
            RecoveryDelivery::ProviderTemplate { template_id } => {
                let mut data = BTreeMap::new();
                data.insert("resume_url".to_string(), resume_url.to_string());
                data.insert("subject".to_string(), template.subject.to_string());
                Notification::template(recipient, template_id.clone(), data)
            }
        };
        Some(notification)
    }
}
