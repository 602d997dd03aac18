//! Module `state`
//!
//! Lifecycle states of the control session and the per-session variables
//! that are reset every time the session starts over.

use std::time::Instant;

use crate::navigate::FtpPath;

/// Lifecycle of the control session.
///
/// The waiting states carry the deadline after which the session times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Resetting,
    Idle,
    AwaitingUsername { deadline: Instant },
    AwaitingPassword { deadline: Instant },
    Ready { deadline: Instant },
}

impl SessionState {
    /// Inactivity deadline, for the states that have one.
    pub fn deadline(&self) -> Option<Instant> {
        match self {
            SessionState::AwaitingUsername { deadline }
            | SessionState::AwaitingPassword { deadline }
            | SessionState::Ready { deadline } => Some(*deadline),
            _ => None,
        }
    }

    /// Whether a client is attached and reading command lines.
    pub fn is_attended(&self) -> bool {
        self.deadline().is_some()
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Resetting => "resetting",
            SessionState::Idle => "idle",
            SessionState::AwaitingUsername { .. } => "awaiting username",
            SessionState::AwaitingPassword { .. } => "awaiting password",
            SessionState::Ready { .. } => "ready",
        }
    }
}

/// Variables of the current session.
#[derive(Debug, Default)]
pub struct Session {
    cwd: FtpPath,
    rename_from: Option<FtpPath>,
}

impl Session {
    /// Restores the initial values: root directory, no pending rename.
    pub fn reset(&mut self) {
        self.cwd = FtpPath::root();
        self.rename_from = None;
    }

    pub fn cwd(&self) -> &FtpPath {
        &self.cwd
    }

    pub fn set_cwd(&mut self, cwd: FtpPath) {
        self.cwd = cwd;
    }

    pub fn rename_pending(&self) -> bool {
        self.rename_from.is_some()
    }

    pub fn set_rename_from(&mut self, path: FtpPath) {
        self.rename_from = Some(path);
    }

    /// Takes the pending rename source, clearing it.
    pub fn take_rename_from(&mut self) -> Option<FtpPath> {
        self.rename_from.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigate::resolve;
    use std::time::Duration;

    #[test]
    fn test_deadlines() {
        let now = Instant::now();
        assert_eq!(SessionState::Idle.deadline(), None);
        assert!(!SessionState::Disconnected.is_attended());
        let ready = SessionState::Ready {
            deadline: now + Duration::from_secs(1),
        };
        assert_eq!(ready.deadline(), Some(now + Duration::from_secs(1)));
        assert!(ready.is_attended());
    }

    #[test]
    fn test_session_reset() {
        let mut session = Session::default();
        let dir = resolve(session.cwd(), "/music").unwrap();
        session.set_cwd(dir.clone());
        session.set_rename_from(dir);
        assert!(session.rename_pending());

        session.reset();
        assert!(session.cwd().is_root());
        assert!(!session.rename_pending());
        assert_eq!(session.take_rename_from(), None);
    }
}
