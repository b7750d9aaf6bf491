use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler as TokioCronScheduler};

use crate::error::{AppError, AppResult};
use crate::jobs::types::{JobContext, JobTask};

/// Wrapper around tokio-cron-scheduler running [`JobTask`]s on cron schedules
pub struct JobScheduler {
    scheduler: Arc<Mutex<TokioCronScheduler>>,
    context: JobContext,
}

impl JobScheduler {
    pub async fn new(context: JobContext) -> AppResult<Self> {
        let scheduler = TokioCronScheduler::new()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            context,
        })
    }

    /// Register `task` to run on the six-field cron `schedule`
    pub async fn schedule(&self, schedule: &str, task: Arc<dyn JobTask>) -> AppResult<()> {
        let context = self.context.clone();
        let task_type = task.task_type();
        let description = task.description().unwrap_or_default();

        let cron_job = Job::new_async(schedule, move |_uuid, _lock| {
            let context = context.clone();
            let task = Arc::clone(&task);

            Box::pin(async move {
                let started = std::time::Instant::now();
                match task.execute(context).await {
                    Ok(()) => tracing::debug!(
                        task = task.task_type(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Job finished"
                    ),
                    Err(e) => tracing::error!(task = task.task_type(), error = %e, "Job execution failed"),
                }
            })
        })
        .map_err(|e| AppError::BadRequest {
            message: format!("Invalid cron expression: {}", e),
        })?;

        self.scheduler
            .lock()
            .await
            .add(cron_job)
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;

        tracing::info!(task = task_type, schedule, description = %description, "Job scheduled");
        Ok(())
    }

    pub async fn start(&self) -> AppResult<()> {
        self.scheduler
            .lock()
            .await
            .start()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        Ok(())
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&self) -> AppResult<()> {
        self.scheduler
            .lock()
            .await
            .shutdown()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        Ok(())
    }
}
