mod principal;
mod token;
mod user;

pub use principal::Principal;
pub use token::{Token, TokenScope};
pub use user::{NewUser, User};
