//! Server core functionality
//!
//! This module contains the engine, its settings and the clock it reads.

pub mod clock;
pub mod config;
pub mod core;

pub use clock::{Clock, SystemClock};
pub use config::EngineSettings;
pub use self::core::FtpServer;
