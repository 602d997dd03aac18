//! Transfer module for FTP server
//!
//! Handles the data channel, PORT/PASV negotiation, directory listings and
//! the chunked RETR/STOR copy loop.

pub mod data_channel;
pub mod listing;
pub mod modes;
pub mod operations;
pub mod results;

// Re-export key types and functions
pub use data_channel::DataChannel;
pub use listing::ListFormat;
pub use modes::{TransferMode, format_pasv_address, parse_port_argument};
pub use operations::{
    DataRequest, StepOutcome, Transfer, TransferJob, retrieve_step, store_step,
};
pub use results::TransferSummary;
