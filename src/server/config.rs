//! Engine settings
//!
//! Tunables of the session engine. The defaults match a small embedded
//! deployment.

use std::net::Ipv4Addr;
use std::time::Duration;

pub const DEFAULT_CONTROL_PORT: u16 = 21;
pub const DEFAULT_DATA_PORT: u16 = 50009;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Inactivity allowed once logged in.
    pub idle_timeout: Duration,
    /// Time allowed to send USER and PASS after connecting.
    pub login_timeout: Duration,
    /// How long a command waits for the data connection.
    pub data_connect_timeout: Duration,
    /// Bytes moved per tick by RETR/STOR.
    pub chunk_size: usize,
    /// Longest accepted command line.
    pub max_command_len: usize,
    /// Address announced by PASV. Unspecified means the data listener's
    /// own address.
    pub passive_address: Ipv4Addr,
    /// Port announced by PASV when the data listener cannot report one.
    pub data_port: u16,
    /// Hold after a rejected USER/PASS.
    pub auth_failure_delay: Duration,
    /// Hold after `530 Timeout`.
    pub timeout_delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(5 * 60),
            login_timeout: Duration::from_secs(10),
            data_connect_timeout: Duration::from_secs(10),
            chunk_size: 4096,
            max_command_len: 263,
            passive_address: Ipv4Addr::UNSPECIFIED,
            data_port: DEFAULT_DATA_PORT,
            auth_failure_delay: Duration::from_millis(100),
            timeout_delay: Duration::from_millis(200),
        }
    }
}
