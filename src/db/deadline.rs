use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Run a store call with a bounded deadline.
///
/// An elapsed deadline surfaces as `AppError::Timeout` naming `operation`;
/// the inner future is dropped, which cancels the query.
pub async fn with_deadline<T, F>(deadline: Duration, operation: &str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, deadline_ms = deadline.as_millis() as u64, "Store call timed out");
            Err(AppError::Timeout {
                operation: operation.to_string(),
            })
        }
    }
}
