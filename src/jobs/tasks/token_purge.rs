use async_trait::async_trait;

use crate::error::AppResult;
use crate::jobs::types::{JobContext, JobTask};

/// Deletes tokens whose expiry has passed.
///
/// Expired tokens are already unusable; this only keeps the table small.
#[derive(Debug, Clone, Default)]
pub struct TokenPurgeTask;

#[async_trait]
impl JobTask for TokenPurgeTask {
    fn task_type(&self) -> &'static str {
        "token_purge"
    }

    async fn execute(&self, ctx: JobContext) -> AppResult<()> {
        if ctx.cancellation_token.is_cancelled() {
            return Ok(());
        }

        let deleted = ctx.services.tokens.purge_expired().await?;
        tracing::info!(deleted_count = deleted, "Expired token purge completed");
        Ok(())
    }

    fn description(&self) -> Option<String> {
        Some("Delete expired activation and authentication tokens".to_string())
    }
}
