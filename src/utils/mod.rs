pub mod password;
pub mod token;
pub mod validate;

pub use password::PasswordHasher;
pub use token::TokenCodec;
pub use validate::{ValidatedJson, ValidationOutcome};
