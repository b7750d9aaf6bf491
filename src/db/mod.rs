//! Database connection pool module.
//!
//! Provides async PostgreSQL connection pooling using diesel_async with bb8,
//! plus the deadline wrapper every store call goes through.

mod deadline;
mod pool;

pub use deadline::with_deadline;
pub use pool::{AsyncDbPool, establish_async_connection_pool};
