mod token_purge;

pub use token_purge::TokenPurgeTask;
