use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::AppResult;
use crate::services::Services;

/// Context handed to a task on every run
#[derive(Clone)]
pub struct JobContext {
    pub services: Services,
    pub cancellation_token: CancellationToken,
}

/// Trait that all scheduled tasks implement
#[async_trait]
pub trait JobTask: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this task type, used in logs
    fn task_type(&self) -> &'static str;

    async fn execute(&self, ctx: JobContext) -> AppResult<()>;

    fn description(&self) -> Option<String> {
        None
    }
}
