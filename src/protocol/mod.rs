//! FTP Protocol implementation
//!
//! Reads and parses control lines, and defines the verb table, the reply
//! conventions and the ready-state command handlers.

pub mod commands;
pub mod handlers;
pub mod parser;
pub mod reader;
pub mod responses;

pub use commands::{CommandResult, CommandStatus, DataAction, Verb};
pub use handlers::{CommandContext, handle_command};
pub use parser::{Command, parse_command};
pub use reader::{LineReader, ReadEvent};
