//! Test double that records every notification it is asked to send.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::provider::{MailTemplate, NotificationSender};
use crate::error::AppResult;

#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(String, MailTemplate)>>,
    notify: Notify,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<(String, MailTemplate)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Wait until at least `count` messages were recorded or `timeout` passes
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<(String, MailTemplate)> {
        let _ = tokio::time::timeout(timeout, async {
            loop {
                let notified = self.notify.notified();
                if self.sent().len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await;
        self.sent()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, recipient: &str, template: &MailTemplate) -> AppResult<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((recipient.to_string(), template.clone()));
        }
        self.notify.notify_waiters();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
