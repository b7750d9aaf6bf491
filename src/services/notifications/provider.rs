//! Notification sender contract and mail templates.

use async_trait::async_trait;

use crate::error::AppResult;

/// A message template together with the data it is rendered from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailTemplate {
    /// Sent after registration; carries the plaintext activation token
    UserWelcome {
        app_name: String,
        user_name: String,
        activation_url: String,
        token: String,
        valid_hours: i64,
    },
}

/// Subject and plain-text body ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    pub subject: String,
    pub body: String,
}

impl MailTemplate {
    pub fn key(&self) -> &'static str {
        match self {
            MailTemplate::UserWelcome { .. } => "user_welcome",
        }
    }

    pub fn render(&self) -> RenderedMail {
        match self {
            MailTemplate::UserWelcome {
                app_name,
                user_name,
                activation_url,
                token,
                valid_hours,
            } => RenderedMail {
                subject: format!("Welcome to {}!", app_name),
                body: format!(
                    "Hi {user_name},\n\n\
                     Thanks for signing up for a {app_name} account. We're excited to have you on board!\n\n\
                     Please send a PUT request to {activation_url} with the following JSON body to activate your account:\n\n\
                     {{\"token\": \"{token}\"}}\n\n\
                     Please note that this is a one-time use token and it will expire in {valid_hours} hours.\n\n\
                     Thanks,\n\n\
                     The {app_name} Team\n"
                ),
            },
        }
    }
}

/// Delivery channel for outgoing notifications (SMTP, log, ...)
///
/// Called from the dispatcher's worker tasks, never from a request path.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, recipient: &str, template: &MailTemplate) -> AppResult<()>;

    /// Sender name for logging
    fn name(&self) -> &'static str;
}
