//! Module `commands`
//!
//! Defines the verb table and the data structures used to represent the
//! outcome of executing a command.

use crate::transfer::DataRequest;
use std::net::SocketAddrV4;

/// FTP verbs understood by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    User,
    Pass,
    Cdup,
    Cwd,
    Pwd,
    Quit,
    Mode,
    Stru,
    Type,
    Pasv,
    Port,
    Abor,
    Dele,
    List,
    Nlst,
    Mlsd,
    Noop,
    Retr,
    Stor,
    Mkd,
    Rmd,
    Rnfr,
    Rnto,
    Feat,
    Mdtm,
    Size,
    Site,
    Syst,
    Unknown(String),
}

impl Verb {
    /// Exact match on an already uppercased verb.
    pub fn from_verb(verb: &str) -> Verb {
        match verb {
            "USER" => Verb::User,
            "PASS" => Verb::Pass,
            "CDUP" => Verb::Cdup,
            "CWD" => Verb::Cwd,
            "PWD" => Verb::Pwd,
            "QUIT" => Verb::Quit,
            "MODE" => Verb::Mode,
            "STRU" => Verb::Stru,
            "TYPE" => Verb::Type,
            "PASV" => Verb::Pasv,
            "PORT" => Verb::Port,
            "ABOR" => Verb::Abor,
            "DELE" => Verb::Dele,
            "LIST" => Verb::List,
            "NLST" => Verb::Nlst,
            "MLSD" => Verb::Mlsd,
            "NOOP" => Verb::Noop,
            "RETR" => Verb::Retr,
            "STOR" => Verb::Stor,
            "MKD" => Verb::Mkd,
            "RMD" => Verb::Rmd,
            "RNFR" => Verb::Rnfr,
            "RNTO" => Verb::Rnto,
            "FEAT" => Verb::Feat,
            "MDTM" => Verb::Mdtm,
            "SIZE" => Verb::Size,
            "SITE" => Verb::Site,
            "SYST" => Verb::Syst,
            other => Verb::Unknown(other.to_string()),
        }
    }
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Data-channel side effect requested by a command.
pub enum DataAction {
    /// Drop any data connection and switch to passive mode.
    Passive(SocketAddrV4),
    /// Drop any data connection and record the client's endpoint.
    Active(SocketAddrV4),
    /// Cancel the running transfer and close the data connection.
    Abort,
    /// Wait for a data connection, then run the request.
    Open(DataRequest),
}

/// Struct encapsulating the full result of a command execution.
pub struct CommandResult {
    pub status: CommandStatus,
    /// Reply text, possibly several CRLF-separated lines.
    pub message: Option<String>,
    pub data: Option<DataAction>,
}

impl CommandResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Success,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status: CommandStatus::Failure(message.clone()),
            message: Some(message),
            data: None,
        }
    }

    pub fn with_data(mut self, action: DataAction) -> Self {
        self.data = Some(action);
        self
    }

    /// A result that only schedules data-channel work; the replies come
    /// from the transfer once the connection is up.
    pub fn deferred(action: DataAction) -> Self {
        Self {
            status: CommandStatus::Success,
            message: None,
            data: Some(action),
        }
    }

    pub fn close() -> Self {
        Self {
            status: CommandStatus::CloseConnection,
            message: None,
            data: None,
        }
    }

    /// Whether the session continues after this command.
    pub fn keeps_session(&self) -> bool {
        self.status != CommandStatus::CloseConnection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_lookup() {
        assert_eq!(Verb::from_verb("MLSD"), Verb::Mlsd);
        assert_eq!(Verb::from_verb("CWD"), Verb::Cwd);
        assert_eq!(Verb::from_verb("XYZ"), Verb::Unknown("XYZ".into()));
        assert_eq!(Verb::from_verb("cwd"), Verb::Unknown("cwd".into()));
    }

    #[test]
    fn test_command_result_status() {
        assert!(CommandResult::success("200 ok").keeps_session());
        assert!(CommandResult::failure("550 no").keeps_session());
        assert!(!CommandResult::close().keeps_session());
    }
}
