//! Error handlers
//!
//! Maps domain errors onto FTP reply codes.

use crate::error::types::{
    FtpServerError, NavigateError, ProtocolError, StorageError, TransferError,
};
use crate::protocol::responses;
use log::error;

/// Log an FTP server error
pub fn handle_error(err: &FtpServerError) {
    error!("FTP Server Error: {}", err);
}

/// Convert error to FTP response code
pub fn error_to_ftp_code(err: &FtpServerError) -> u16 {
    match err {
        FtpServerError::Path(_) => responses::SYNTAX_ERROR,
        FtpServerError::Protocol(ProtocolError::LineTooLong(_)) => responses::SYNTAX_ERROR,
        FtpServerError::Protocol(ProtocolError::VerbTooLong(_)) => responses::SYNTAX_ERROR,
        FtpServerError::Protocol(ProtocolError::InvalidEncoding) => responses::SYNTAX_ERROR,
        FtpServerError::Auth(_) => responses::NOT_LOGGED_IN,
        FtpServerError::Storage(StorageError::NotFound(_))
        | FtpServerError::Storage(StorageError::NotADirectory(_)) => responses::FILE_UNAVAILABLE,
        FtpServerError::Storage(StorageError::AlreadyExists(_)) => {
            responses::FILE_NAME_NOT_ALLOWED
        }
        FtpServerError::Storage(StorageError::Io(_)) => responses::FILE_ACTION_NOT_TAKEN,
        FtpServerError::Navigate(NavigateError::Path(_)) => responses::SYNTAX_ERROR,
        FtpServerError::Navigate(NavigateError::DirectoryNotFound(_)) => {
            responses::FILE_UNAVAILABLE
        }
        FtpServerError::Transfer(TransferError::InvalidPortArgument(_)) => {
            responses::SYNTAX_ERROR_IN_PARAMETERS
        }
        FtpServerError::Transfer(TransferError::DataConnectionLost(_)) => {
            responses::TRANSFER_ABORTED
        }
        FtpServerError::Transfer(TransferError::File(_)) => responses::LOCAL_ERROR,
    }
}
