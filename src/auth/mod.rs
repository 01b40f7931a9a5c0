//! Customer credentials and bearer tokens

pub mod jwt;
pub mod password;

pub use jwt::{Claims, TokenService};
pub use password::{hash_password, validate_password, verify_password};
