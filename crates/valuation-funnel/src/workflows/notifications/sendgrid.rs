use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::{Notification, NotificationContent, NotificationSender, SendError};
use crate::config::EmailConfig;

/// `from` block attached to every outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderIdentity {
    pub email: String,
    pub name: String,
}

/// SendGrid v3 mail-send adapter.
pub struct SendGridSender {
    client: Client,
    api_key: String,
    api_base: String,
    from: SenderIdentity,
}

impl SendGridSender {
    pub fn new(api_key: String, api_base: String, from: SenderIdentity) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            from,
        }
    }

    /// Returns `None` when no API key is configured.
    pub fn from_config(config: &EmailConfig) -> Option<Self> {
        let api_key = config.sendgrid_api_key.clone()?;
        Some(Self::new(
            api_key,
            config.api_base.clone(),
            SenderIdentity {
                email: config.from_email.clone(),
                name: config.from_name.clone(),
            },
        ))
    }

    fn endpoint(&self) -> String {
        format!("{}/v3/mail/send", self.api_base)
    }

    pub(crate) fn payload(&self, notification: &Notification) -> Value {
        let to: Vec<Value> = notification
            .recipients
            .iter()
            .map(|email| json!({ "email": email }))
            .collect();
        let from = json!({ "email": self.from.email, "name": self.from.name });

        match &notification.content {
            NotificationContent::Html { subject, html } => json!({
                "personalizations": [{ "to": to }],
                "from": from,
                "subject": subject,
                "content": [{ "type": "text/html", "value": html }],
            }),
            NotificationContent::Template { template_id, data } => json!({
                "personalizations": [{ "to": to, "dynamic_template_data": data }],
                "from": from,
                "template_id": template_id,
            }),
        }
    }
}

#[async_trait]
impl NotificationSender for SendGridSender {
    async fn send(&self, notification: Notification) -> Result<(), SendError> {
        if notification.recipients.is_empty() {
            return Err(SendError::NoRecipients);
        }

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.payload(&notification))
            .send()
            .await
            .map_err(|err| SendError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SendError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(recipients = notification.recipients.len(), "sendgrid accepted message");
        Ok(())
    }
}
