//! Background maintenance jobs driven by cron schedules.

pub mod scheduler;
pub mod tasks;
pub mod types;

pub use scheduler::JobScheduler;
pub use tasks::TokenPurgeTask;
pub use types::{JobContext, JobTask};
