use async_trait::async_trait;

use super::provider::{MailTemplate, NotificationSender};
use crate::error::AppResult;

/// Writes rendered mail to the log instead of delivering it.
///
/// The body contains the plaintext activation token, so it is logged at
/// debug level only.
#[derive(Debug, Default, Clone)]
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    async fn send(&self, recipient: &str, template: &MailTemplate) -> AppResult<()> {
        let mail = template.render();
        tracing::info!(
            recipient = %recipient,
            template = template.key(),
            subject = %mail.subject,
            "Notification rendered (log sender)"
        );
        tracing::debug!(recipient = %recipient, body = %mail.body, "Notification body");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
