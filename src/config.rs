//! Configuration management for the RAX FTP engine
//!
//! Loads `config.toml` with `RAX_FTP_*` environment overrides. Every key
//! has a default, so the file is optional.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::server::EngineSettings;
use crate::server::config::{DEFAULT_CONTROL_PORT, DEFAULT_DATA_PORT};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    // ═══ NETWORK ═══
    /// IP address both listeners bind to
    pub bind_address: String,

    /// Port for the FTP control connection
    pub control_port: u16,

    /// Port the data listener waits on
    pub data_port: u16,

    /// Address announced by PASV, empty for the data listener's own
    pub passive_address: String,

    // ═══ STORAGE ═══
    /// Host directory served as `/`
    pub server_root: String,

    // ═══ CREDENTIALS ═══
    pub username: String,
    pub password: String,

    // ═══ ENGINE TUNABLES ═══
    pub idle_timeout_secs: u64,
    pub login_timeout_secs: u64,
    pub data_connect_timeout_secs: u64,
    pub chunk_size: usize,
    pub max_command_length: usize,

    // ═══ HOST LOOP ═══
    /// Tick interval while a client is attended
    pub tick_interval_ms: u64,
    /// Tick interval while waiting for a client
    pub idle_tick_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let engine = EngineSettings::default();
        Self {
            bind_address: "0.0.0.0".to_string(),
            control_port: DEFAULT_CONTROL_PORT,
            data_port: DEFAULT_DATA_PORT,
            passive_address: String::new(),
            server_root: "./server_root".to_string(),
            username: String::new(),
            password: String::new(),
            idle_timeout_secs: engine.idle_timeout.as_secs(),
            login_timeout_secs: engine.login_timeout.as_secs(),
            data_connect_timeout_secs: engine.data_connect_timeout.as_secs(),
            chunk_size: engine.chunk_size,
            max_command_length: engine.max_command_len,
            tick_interval_ms: 5,
            idle_tick_interval_ms: 50,
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from `path` (extension optional) with
    /// environment overrides
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("RAX_FTP").try_parsing(true))
            .build()?;
        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.control_port == 0 {
            return Err(config::ConfigError::Message(
                "Control port cannot be 0".into(),
            ));
        }

        if self.data_port == 0 {
            return Err(config::ConfigError::Message("Data port cannot be 0".into()));
        }

        if self.control_port == self.data_port {
            return Err(config::ConfigError::Message(
                "control_port and data_port must differ".into(),
            ));
        }

        if self.bind_address.parse::<std::net::IpAddr>().is_err() {
            return Err(config::ConfigError::Message(format!(
                "bind_address is not an IP address: {}",
                self.bind_address
            )));
        }

        if !self.passive_address.is_empty() && self.passive_address.parse::<Ipv4Addr>().is_err()
        {
            return Err(config::ConfigError::Message(format!(
                "passive_address is not an IPv4 address: {}",
                self.passive_address
            )));
        }

        if self.server_root.is_empty() {
            return Err(config::ConfigError::Message(
                "server_root cannot be empty".into(),
            ));
        }

        if self.username.is_empty() || self.password.is_empty() {
            return Err(config::ConfigError::Message(
                "username and password must be set".into(),
            ));
        }

        if self.chunk_size == 0 {
            return Err(config::ConfigError::Message(
                "chunk_size must be greater than 0".into(),
            ));
        }

        if self.max_command_length == 0 {
            return Err(config::ConfigError::Message(
                "max_command_length must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Control listener address
    pub fn control_socket(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.bind_address, self.control_port).parse()
    }

    /// Data listener address
    pub fn data_socket(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.bind_address, self.data_port).parse()
    }

    /// Get server root as PathBuf
    pub fn server_root_path(&self) -> PathBuf {
        PathBuf::from(&self.server_root)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn idle_tick_interval(&self) -> Duration {
        Duration::from_millis(self.idle_tick_interval_ms)
    }

    /// Engine tunables described by this configuration
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            login_timeout: Duration::from_secs(self.login_timeout_secs),
            data_connect_timeout: Duration::from_secs(self.data_connect_timeout_secs),
            chunk_size: self.chunk_size,
            max_command_len: self.max_command_length,
            passive_address: self
                .passive_address
                .parse()
                .unwrap_or(Ipv4Addr::UNSPECIFIED),
            data_port: self.data_port,
            ..EngineSettings::default()
        }
    }
}
