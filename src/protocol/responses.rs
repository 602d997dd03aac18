//! FTP Response handling
//!
//! Defines FTP response codes and formatting.

/// Standard FTP response codes
pub const FILE_STATUS_OK: u16 = 150;
pub const OK: u16 = 200;
pub const SYSTEM_STATUS: u16 = 211;
pub const FILE_STATUS: u16 = 213;
pub const SYSTEM_TYPE: u16 = 215;
pub const READY: u16 = 220;
pub const CLOSING: u16 = 221;
pub const TRANSFER_COMPLETE: u16 = 226;
pub const ENTERING_PASSIVE: u16 = 227;
pub const LOGIN_SUCCESS: u16 = 230;
pub const FILE_ACTION_OK: u16 = 250;
pub const PATH_CREATED: u16 = 257;
pub const PASSWORD_REQUIRED: u16 = 331;
pub const PENDING_FURTHER_INFO: u16 = 350;
pub const CANT_OPEN_DATA: u16 = 425;
pub const TRANSFER_ABORTED: u16 = 426;
pub const FILE_ACTION_NOT_TAKEN: u16 = 450;
pub const LOCAL_ERROR: u16 = 451;
pub const SYNTAX_ERROR: u16 = 500;
pub const SYNTAX_ERROR_IN_PARAMETERS: u16 = 501;
pub const NOT_IMPLEMENTED: u16 = 502;
pub const BAD_SEQUENCE: u16 = 503;
pub const PARAMETER_NOT_IMPLEMENTED: u16 = 504;
pub const NOT_LOGGED_IN: u16 = 530;
pub const FILE_UNAVAILABLE: u16 = 550;
pub const FILE_NAME_NOT_ALLOWED: u16 = 553;

/// Format a single-line FTP reply, without the line terminator
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}", code, message)
}

/// Format a multi-line reply.
///
/// Every line but the last uses the `-` continuation marker. Lines that
/// start with a space are passed through verbatim. The lines are joined
/// with CRLF, the final terminator is left to the writer.
pub fn format_multiline(code: u16, lines: &[&str]) -> String {
    let mut out = String::new();
    let last = lines.len().saturating_sub(1);
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push_str("\r\n");
        }
        if line.starts_with(' ') {
            out.push_str(line);
        } else if i == last {
            out.push_str(&format!("{} {}", code, line));
        } else {
            out.push_str(&format!("{}-{}", code, line));
        }
    }
    out
}

/// Three-line welcome banner sent when a client connects
pub fn banner() -> String {
    format_multiline(
        READY,
        &[
            "-- Welcome to RAX FTP engine --",
            "--   single client mode   --",
            &format!("--   Version {}   --", env!("CARGO_PKG_VERSION")),
        ],
    )
}
