pub mod jwt;
pub mod password;

pub use jwt::{TokenPurpose, TokenService};
pub use password::{hash_password, verify_password};
