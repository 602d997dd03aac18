//! Authentication validator
//!
//! Checks the USER and PASS lines of the login handshake. Matching is
//! exact and case-sensitive.

use super::credentials::Credentials;
use crate::error::AuthError;
use crate::protocol::Command;

/// Validates the line expected while waiting for a username.
pub fn validate_user(credentials: &Credentials, command: &Command<'_>) -> Result<(), AuthError> {
    if command.verb != "USER" {
        return Err(AuthError::UnexpectedCommand {
            expected: "USER",
            received: command.verb.clone(),
        });
    }
    if command.arg() != credentials.username() {
        return Err(AuthError::UserNotFound(command.arg().to_string()));
    }
    Ok(())
}

/// Validates the line expected while waiting for a password.
pub fn validate_password(
    credentials: &Credentials,
    command: &Command<'_>,
) -> Result<(), AuthError> {
    if command.verb != "PASS" {
        return Err(AuthError::UnexpectedCommand {
            expected: "PASS",
            received: command.verb.clone(),
        });
    }
    if command.arg() != credentials.password() {
        return Err(AuthError::InvalidPassword);
    }
    Ok(())
}

/// Reply line for a rejected login step.
pub fn auth_failure_reply(err: &AuthError) -> &'static str {
    match err {
        AuthError::UnexpectedCommand { .. } => "500 Syntax error",
        AuthError::UserNotFound(_) => "530 user not found",
        AuthError::InvalidPassword => "530 Login incorrect",
    }
}
