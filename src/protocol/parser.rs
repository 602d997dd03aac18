//! Command line parser
//!
//! Splits a line into an uppercase verb of at most four characters and
//! the raw parameter that follows the first space.

use crate::error::ProtocolError;

pub const MAX_VERB_LEN: usize = 4;

/// One parsed command line
#[derive(Debug, PartialEq, Eq)]
pub struct Command<'a> {
    pub verb: String,
    /// Text after the first space with leading spaces skipped, `None` when
    /// the line holds no space.
    pub param: Option<&'a str>,
}

impl<'a> Command<'a> {
    /// The parameter, or the empty string when absent.
    pub fn arg(&self) -> &'a str {
        self.param.unwrap_or("")
    }
}

/// Parses a raw command line received from the client.
pub fn parse_command(line: &str) -> Result<Command<'_>, ProtocolError> {
    match line.find(' ') {
        Some(idx) if idx > MAX_VERB_LEN => Err(ProtocolError::VerbTooLong(line[..idx].to_string())),
        Some(idx) => Ok(Command {
            verb: line[..idx].to_ascii_uppercase(),
            param: Some(line[idx + 1..].trim_start_matches(' ')),
        }),
        None if line.len() > MAX_VERB_LEN => Err(ProtocolError::VerbTooLong(line.to_string())),
        None => Ok(Command {
            verb: line.to_ascii_uppercase(),
            param: None,
        }),
    }
}
