//! Password hashing and bearer tokens.

pub mod password;
pub mod token;

pub use token::{Claims, TokenService, ROLE_ADMIN};
