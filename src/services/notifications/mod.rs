//! Outgoing notifications.
//!
//! `NotificationSender` is the delivery contract; `SmtpSender` and
//! `LogSender` implement it. `NotificationDispatcher` decouples delivery from
//! request handling through a bounded queue and worker tasks.

mod dispatcher;
mod log_provider;
mod provider;
mod smtp_provider;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::{NotificationDispatcher, NotificationJob};
pub use log_provider::LogSender;
pub use provider::{MailTemplate, NotificationSender, RenderedMail};
pub use smtp_provider::SmtpSender;

use std::sync::Arc;

use crate::config::{NotificationConfig, SenderKind};
use crate::error::AppResult;

/// Build the sender selected by `notifications.sender`
pub fn build_sender(config: &NotificationConfig) -> AppResult<Arc<dyn NotificationSender>> {
    let sender: Arc<dyn NotificationSender> = match config.sender {
        SenderKind::Smtp => Arc::new(SmtpSender::new(&config.smtp)?),
        SenderKind::Log => Arc::new(LogSender),
    };
    Ok(sender)
}
