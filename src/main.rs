//! RAX FTP engine - Entry Point
//!
//! Binds the control and data listeners, serves the configured root
//! directory and drives the engine's tick from a tokio loop.

use log::{error, info, warn};
use std::process;

use rax_ftp_engine::FtpServer;
use rax_ftp_engine::config::ServerConfig;
use rax_ftp_engine::storage::LocalFileStore;
use rax_ftp_engine::transport::TcpEndpoint;

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching FTP engine...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let (control_addr, data_addr) = match (config.control_socket(), config.data_socket()) {
        (Ok(control), Ok(data)) => (control, data),
        (Err(e), _) | (_, Err(e)) => {
            error!("Invalid listener address: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = std::fs::create_dir_all(config.server_root_path()) {
        warn!("Failed to create server root directory: {}", e);
    } else {
        info!("Server root directory: {}", config.server_root);
    }

    let store = LocalFileStore::new(config.server_root_path());
    let mut server = match FtpServer::begin(
        TcpEndpoint::new(control_addr),
        TcpEndpoint::new(data_addr),
        store,
        &config.username,
        &config.password,
        config.engine_settings(),
    ) {
        Ok(server) => server,
        Err(e) => {
            error!("FTP engine startup failed: {}", e);
            process::exit(1);
        }
    };

    info!(
        "Serving {} on {} (data on {})",
        config.server_root, control_addr, data_addr
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let pause = if server.handle_ftp() {
            config.tick_interval()
        } else {
            config.idle_tick_interval()
        };

        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
            _ = tokio::time::sleep(pause) => {}
        }
    }
}
