//! Authentication system
//!
//! Holds the configured credentials and validates the login handshake.

pub mod credentials;
pub mod validator;

pub use credentials::Credentials;
pub use validator::{auth_failure_reply, validate_password, validate_user};
