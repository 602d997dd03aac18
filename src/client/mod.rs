//! Client session management
//!
//! Lifecycle states and per-session variables of the single control client.

pub mod state;

pub use state::{Session, SessionState};
