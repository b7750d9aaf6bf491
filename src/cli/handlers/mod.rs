//! Command handlers

pub mod serve;

pub use serve::ServeCommandHandler;
