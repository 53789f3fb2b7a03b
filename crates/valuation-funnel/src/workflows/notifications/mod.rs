//! Outbound notification boundary. The scheduler and the evaluation service only
//! see [`NotificationSender`]; provider adapters live beside it.

mod sendgrid;

pub use sendgrid::{SendGridSender, SenderIdentity};

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

/// Message body: either rendered HTML or a provider-side template plus its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationContent {
    Html {
        subject: String,
        html: String,
    },
    Template {
        template_id: String,
        data: BTreeMap<String, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub recipients: Vec<String>,
    pub content: NotificationContent,
}

impl Notification {
    pub fn html(recipient: impl Into<String>, subject: impl Into<String>, html: String) -> Self {
        Self {
            recipients: vec![recipient.into()],
            content: NotificationContent::Html {
                subject: subject.into(),
                html,
            },
        }
    }

    pub fn template(
        recipient: impl Into<String>,
        template_id: impl Into<String>,
        data: BTreeMap<String, String>,
    ) -> Self {
        Self {
            recipients: vec![recipient.into()],
            content: NotificationContent::Template {
                template_id: template_id.into(),
                data,
            },
        }
    }

    pub fn subject(&self) -> Option<&str> {
        match &self.content {
            NotificationContent::Html { subject, .. } => Some(subject),
            NotificationContent::Template { .. } => None,
        }
    }
}

/// Delivery capability. `Ok` means the provider accepted the message.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), SendError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("notification has no recipients")]
    NoRecipients,
    #[error("mail transport unavailable: {0}")]
    Transport(String),
    #[error("mail provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
