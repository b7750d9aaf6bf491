//! Bounded worker pool for outgoing notifications.
//!
//! Request handlers enqueue with [`NotificationDispatcher::submit`], which
//! never waits. A fixed number of worker tasks drain the queue and deliver
//! through the configured [`NotificationSender`]. Delivery failures and
//! dropped jobs are visible in the log only.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::provider::{MailTemplate, NotificationSender};

#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub recipient: String,
    pub template: MailTemplate,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<NotificationJob>,
}

impl NotificationDispatcher {
    /// Spawn `workers` tasks sharing a queue of `capacity` jobs.
    ///
    /// Workers stop when `shutdown` is cancelled or every dispatcher clone
    /// has been dropped.
    pub fn start(
        sender: Arc<dyn NotificationSender>,
        workers: usize,
        capacity: usize,
        shutdown: CancellationToken,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let handles = (0..workers.max(1))
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    sender.clone(),
                    rx.clone(),
                    shutdown.clone(),
                ))
            })
            .collect();

        tracing::info!(
            workers,
            capacity,
            sender = sender.name(),
            "Notification dispatcher started"
        );

        (Self { tx }, handles)
    }

    /// Enqueue a job without waiting. Returns false if it was dropped.
    pub fn submit(&self, recipient: impl Into<String>, template: MailTemplate) -> bool {
        let job = NotificationJob {
            recipient: recipient.into(),
            template,
        };
        let key = job.template.key();

        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(job)) => {
                tracing::warn!(
                    recipient = %job.recipient,
                    template = key,
                    "Notification queue full, dropping job"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                tracing::warn!(
                    recipient = %job.recipient,
                    template = key,
                    "Notification dispatcher stopped, dropping job"
                );
                false
            }
        }
    }
}

async fn run_worker(
    worker: usize,
    sender: Arc<dyn NotificationSender>,
    rx: Arc<Mutex<mpsc::Receiver<NotificationJob>>>,
    shutdown: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                let dropped = discard_pending(&mut *rx.lock().await);
                if dropped > 0 {
                    tracing::warn!(worker, dropped, "Shutting down, dropping queued notifications");
                }
                None
            }
            job = async { rx.lock().await.recv().await } => job,
        };
        let Some(job) = next else {
            break;
        };

        let start = Instant::now();
        match sender.send(&job.recipient, &job.template).await {
            Ok(()) => tracing::info!(
                worker,
                recipient = %job.recipient,
                template = job.template.key(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Notification sent"
            ),
            Err(e) => tracing::error!(
                worker,
                recipient = %job.recipient,
                template = job.template.key(),
                error = %e,
                "Notification delivery failed"
            ),
        }
    }
    tracing::debug!(worker, "Notification worker stopped");
}

/// Close the queue and throw away whatever is still in it
fn discard_pending(rx: &mut mpsc::Receiver<NotificationJob>) -> usize {
    rx.close();
    let mut dropped = 0;
    while rx.try_recv().is_ok() {
        dropped += 1;
    }
    dropped
}
