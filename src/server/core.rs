//! The FTP engine
//!
//! `FtpServer` serves one control client at a time. The host calls
//! `handle_ftp` repeatedly; each call performs at most one session state
//! step, reads at most one command line and moves at most one chunk of an
//! active transfer.

use log::{debug, error, info, warn};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::{Duration, Instant};

use crate::auth::{Credentials, auth_failure_reply, validate_password, validate_user};
use crate::client::{Session, SessionState};
use crate::error::handlers::{error_to_ftp_code, handle_error};
use crate::error::{EngineError, FtpServerError, TransferError};
use crate::navigate::FtpPath;
use crate::protocol::responses::{self, format_response};
use crate::protocol::{
    Command, CommandContext, CommandResult, CommandStatus, DataAction, LineReader, ReadEvent,
    handle_command, parse_command,
};
use crate::server::clock::{Clock, SystemClock};
use crate::server::config::EngineSettings;
use crate::storage::FileStore;
use crate::transfer::{
    DataChannel, DataRequest, ListFormat, StepOutcome, Transfer, TransferJob, retrieve_step,
    store_step,
};
use crate::transport::{Connection, Listener};

pub struct FtpServer<L: Listener, S: FileStore, K: Clock = SystemClock> {
    control_listener: L,
    data_listener: L,
    store: S,
    clock: K,
    credentials: Credentials,
    settings: EngineSettings,
    passive_endpoint: SocketAddrV4,

    state: SessionState,
    control: Option<L::Conn>,
    reader: LineReader,
    session: Session,
    data: DataChannel<L::Conn>,
    transfer: Transfer,
    /// Ticks before this instant do nothing.
    hold_until: Option<Instant>,
    buffer: Vec<u8>,
}

impl<L: Listener, S: FileStore> FtpServer<L, S, SystemClock> {
    /// Starts both listeners and returns an engine waiting for a client.
    pub fn begin(
        control_listener: L,
        data_listener: L,
        store: S,
        username: &str,
        password: &str,
        settings: EngineSettings,
    ) -> Result<Self, EngineError> {
        Self::begin_with_clock(
            control_listener,
            data_listener,
            store,
            Credentials::new(username, password),
            settings,
            SystemClock,
        )
    }
}

impl<L: Listener, S: FileStore, K: Clock> FtpServer<L, S, K> {
    pub fn begin_with_clock(
        mut control_listener: L,
        mut data_listener: L,
        store: S,
        credentials: Credentials,
        settings: EngineSettings,
        clock: K,
    ) -> Result<Self, EngineError> {
        if credentials.is_empty() {
            return Err(EngineError::EmptyCredentials);
        }

        control_listener
            .listen()
            .map_err(|source| EngineError::Listen {
                endpoint: "control",
                source,
            })?;
        data_listener.listen().map_err(|source| EngineError::Listen {
            endpoint: "data",
            source,
        })?;

        let passive_endpoint = passive_endpoint(&settings, data_listener.local_addr());
        info!(
            "FTP engine started (control {:?}, passive data {})",
            control_listener.local_addr(),
            passive_endpoint
        );

        Ok(Self {
            control_listener,
            data_listener,
            store,
            clock,
            credentials,
            passive_endpoint,
            state: SessionState::Disconnected,
            control: None,
            reader: LineReader::new(settings.max_command_len),
            session: Session::default(),
            data: DataChannel::default(),
            transfer: Transfer::Idle,
            hold_until: None,
            buffer: vec![0u8; settings.chunk_size.max(1)],
            settings,
        })
    }

    /// Runs one tick. Returns whether a client is attended or a transfer
    /// is running, so the host can poll eagerly.
    pub fn handle_ftp(&mut self) -> bool {
        let now = self.clock.now();

        if let Some(until) = self.hold_until {
            if now < until {
                return self.is_live();
            }
            self.hold_until = None;
        }

        self.accept_control_client();
        self.step_session(now);
        self.step_transfer(now);
        self.check_timeout(now);

        self.is_live()
    }

    pub fn is_live(&self) -> bool {
        !self.transfer.is_idle() || self.state.is_attended()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn cwd(&self) -> &FtpPath {
        self.session.cwd()
    }

    pub fn is_transferring(&self) -> bool {
        self.transfer.is_active()
    }

    pub fn passive_endpoint(&self) -> SocketAddrV4 {
        self.passive_endpoint
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // --------------------
    // Connection handling
    // --------------------

    /// Adopts a newly connected client. A client already being served is
    /// dropped and the session starts over. Clients arriving while the
    /// session is being torn down wait in the listener until it is idle.
    fn accept_control_client(&mut self) {
        if matches!(
            self.state,
            SessionState::Disconnected | SessionState::Resetting
        ) {
            return;
        }
        if !self.control_listener.has_pending_client() {
            return;
        }
        let Some(conn) = self.control_listener.accept_client() else {
            return;
        };

        if self.control.is_some() {
            info!("New control connection replaces the current client");
            self.abort_transfer();
            if let Some(mut old) = self.control.take() {
                old.close();
            }
            self.state = SessionState::Resetting;
        }
        self.control = Some(conn);
    }

    fn control_connected(&self) -> bool {
        self.control.as_ref().is_some_and(|c| c.is_connected())
    }

    fn reply(&mut self, text: &str) {
        let Some(control) = self.control.as_mut() else {
            return;
        };
        debug!("<- {}", text);
        if let Err(e) = control.write_line(text) {
            warn!("Failed to send reply: {}", e);
        }
    }

    fn hold(&mut self, now: Instant, delay: Duration) {
        self.hold_until = Some(now + delay);
    }

    // --------------------
    // Session state machine
    // --------------------

    fn step_session(&mut self, now: Instant) {
        match self.state {
            SessionState::Disconnected => {
                if self.control_connected() {
                    info!("Disconnecting client");
                    self.abort_transfer();
                    self.reply(&format_response(responses::CLOSING, "Goodbye"));
                }
                if let Some(mut control) = self.control.take() {
                    control.close();
                }
                self.state = SessionState::Resetting;
            }
            SessionState::Resetting => {
                self.abort_transfer();
                self.session.reset();
                self.reader.clear();
                self.data.reset();
                info!("FTP engine waiting for a connection");
                self.state = SessionState::Idle;
            }
            SessionState::Idle => {
                if self.control_connected() {
                    info!("Client connected");
                    self.reader.clear();
                    self.reply(&responses::banner());
                    self.state = SessionState::AwaitingUsername {
                        deadline: now + self.settings.login_timeout,
                    };
                }
            }
            SessionState::AwaitingUsername { .. }
            | SessionState::AwaitingPassword { .. }
            | SessionState::Ready { .. } => self.step_attended(now),
        }
    }

    fn step_attended(&mut self, now: Instant) {
        // No command lines are consumed while a command waits for its
        // data connection.
        if self.transfer.is_connecting() {
            if !self.control_connected() {
                info!("Client disconnected");
                self.state = SessionState::Disconnected;
            }
            return;
        }

        let event = match self.control.as_mut() {
            Some(control) => self.reader.poll(control),
            None => ReadEvent::Pending,
        };

        match event {
            ReadEvent::Line(line) => self.process_line(&line, now),
            ReadEvent::Invalid(e) => {
                debug!("Discarding input: {}", e);
                self.reply(&format_response(responses::SYNTAX_ERROR, "Syntax error"));
            }
            ReadEvent::Pending => {
                if !self.control_connected() {
                    info!("Client disconnected");
                    self.state = SessionState::Disconnected;
                }
            }
        }
    }

    fn process_line(&mut self, line: &str, now: Instant) {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(e) => {
                debug!("{}", e);
                self.reply(&format_response(responses::SYNTAX_ERROR, "Syntax error"));
                return;
            }
        };

        if command.verb == "PASS" {
            debug!("-> PASS ***");
        } else {
            debug!("-> {} {}", command.verb, command.arg());
        }

        match self.state {
            SessionState::AwaitingUsername { deadline } => {
                match validate_user(&self.credentials, &command) {
                    Ok(()) => {
                        self.reply(&format_response(
                            responses::PASSWORD_REQUIRED,
                            "OK. Password required",
                        ));
                        self.session.set_cwd(FtpPath::root());
                        self.state = SessionState::AwaitingPassword { deadline };
                    }
                    Err(e) => self.reject_login(e.into(), now),
                }
            }
            SessionState::AwaitingPassword { .. } => {
                match validate_password(&self.credentials, &command) {
                    Ok(()) => {
                        info!("User {} logged in", self.credentials.username());
                        self.reply(&format_response(responses::LOGIN_SUCCESS, "OK."));
                        self.state = SessionState::Ready {
                            deadline: now + self.settings.idle_timeout,
                        };
                    }
                    Err(e) => self.reject_login(e.into(), now),
                }
            }
            SessionState::Ready { .. } => self.dispatch(&command, now),
            _ => {}
        }
    }

    fn reject_login(&mut self, err: FtpServerError, now: Instant) {
        warn!("Login rejected: {}", err);
        if let FtpServerError::Auth(auth) = &err {
            self.reply(auth_failure_reply(auth));
        }
        self.hold(now, self.settings.auth_failure_delay);
        self.state = SessionState::Disconnected;
    }

    fn dispatch(&mut self, command: &Command<'_>, now: Instant) {
        let mut ctx = CommandContext {
            session: &mut self.session,
            store: &self.store,
            passive_endpoint: self.passive_endpoint,
        };
        let result = handle_command(&mut ctx, command);
        let keeps_session = result.keeps_session();
        let CommandResult {
            status,
            message,
            data,
        } = result;

        if let CommandStatus::Failure(reason) = &status {
            debug!("{} failed: {}", command.verb, reason);
        }
        if let Some(action) = data {
            self.apply_data_action(action, now);
        }
        if let Some(message) = message {
            self.reply(&message);
        }

        if !keeps_session {
            info!("Client quit");
            self.state = SessionState::Disconnected;
        } else {
            self.state = SessionState::Ready {
                deadline: now + self.settings.idle_timeout,
            };
        }
    }

    fn check_timeout(&mut self, now: Instant) {
        if !self.transfer.is_idle() {
            return;
        }
        let Some(deadline) = self.state.deadline() else {
            return;
        };
        if now >= deadline {
            info!("Client timed out while {}", self.state.name());
            self.reply(&format_response(responses::NOT_LOGGED_IN, "Timeout"));
            self.hold(now, self.settings.timeout_delay);
            self.state = SessionState::Disconnected;
        }
    }

    // --------------------
    // Data channel and transfers
    // --------------------

    fn apply_data_action(&mut self, action: DataAction, now: Instant) {
        match action {
            DataAction::Passive(endpoint) => self.data.set_passive(endpoint),
            DataAction::Active(endpoint) => self.data.set_active(endpoint),
            DataAction::Abort => {
                self.abort_transfer();
                self.data.close();
            }
            DataAction::Open(request) => {
                self.abort_transfer();
                debug!("Waiting for data connection: {}", request.describe());
                self.transfer = Transfer::Connecting {
                    request,
                    deadline: now + self.settings.data_connect_timeout,
                };
            }
        }
    }

    /// Cancels a running transfer, closing its file and the data
    /// connection. Does nothing when no transfer runs.
    fn abort_transfer(&mut self) {
        match std::mem::take(&mut self.transfer) {
            Transfer::Retrieving(job) | Transfer::Storing(job) => {
                warn!("Transfer of {} aborted after {} bytes", job.path(), job.bytes());
                drop(job);
                self.data.close();
                self.reply(&format_response(responses::TRANSFER_ABORTED, "Transfer aborted"));
            }
            Transfer::Connecting { request, .. } => {
                debug!("Dropped pending {}", request.describe());
            }
            Transfer::Idle => {}
        }
    }

    fn step_transfer(&mut self, now: Instant) {
        let was_busy = !self.transfer.is_idle();
        self.transfer = match std::mem::take(&mut self.transfer) {
            Transfer::Idle => Transfer::Idle,
            Transfer::Connecting { request, deadline } => {
                if self.data.try_connect(&mut self.data_listener) {
                    self.start_request(request, now)
                } else if now >= deadline {
                    warn!("No data connection for {}", request.describe());
                    drop(request);
                    self.reply(&format_response(
                        responses::CANT_OPEN_DATA,
                        "No data connection",
                    ));
                    Transfer::Idle
                } else {
                    Transfer::Connecting { request, deadline }
                }
            }
            Transfer::Retrieving(mut job) => {
                let outcome = match self.data.conn_mut() {
                    Some(conn) => retrieve_step(&mut job, conn, &mut self.buffer),
                    None => Err(data_gone()),
                };
                self.after_step(job, outcome, now, Transfer::Retrieving)
            }
            Transfer::Storing(mut job) => {
                let outcome = match self.data.conn_mut() {
                    Some(conn) => store_step(&mut job, conn, &mut self.buffer),
                    None => Ok(StepOutcome::Done),
                };
                self.after_step(job, outcome, now, Transfer::Storing)
            }
        };
        if was_busy && self.transfer.is_idle() {
            self.rearm_idle(now);
        }
    }

    /// Restarts the inactivity window once a transfer no longer holds it
    /// open.
    fn rearm_idle(&mut self, now: Instant) {
        if let SessionState::Ready { .. } = self.state {
            self.state = SessionState::Ready {
                deadline: now + self.settings.idle_timeout,
            };
        }
    }

    fn after_step(
        &mut self,
        job: TransferJob,
        outcome: Result<StepOutcome, TransferError>,
        now: Instant,
        resume: fn(TransferJob) -> Transfer,
    ) -> Transfer {
        match outcome {
            Ok(StepOutcome::Pending) => resume(job),
            Ok(StepOutcome::Done) => {
                let path = job.path().clone();
                let summary = job.finish(now);
                self.data.close();
                info!(
                    "Transfer of {} finished: {} bytes in {} ms",
                    path,
                    summary.bytes,
                    summary.elapsed.as_millis()
                );
                self.reply(&summary.reply());
                Transfer::Idle
            }
            Err(e) => {
                let err = FtpServerError::from(e);
                handle_error(&err);
                warn!("Transfer of {} failed after {} bytes", job.path(), job.bytes());
                drop(job);
                self.data.close();
                let code = error_to_ftp_code(&err);
                let text = if code == responses::TRANSFER_ABORTED {
                    "Transfer aborted"
                } else {
                    "Requested action aborted: local error in processing"
                };
                self.reply(&format_response(code, text));
                Transfer::Idle
            }
        }
    }

    /// Runs a request whose data connection has just been established.
    fn start_request(&mut self, request: DataRequest, now: Instant) -> Transfer {
        let port = self
            .data
            .endpoint()
            .map(|endpoint| endpoint.port())
            .unwrap_or(self.passive_endpoint.port());
        debug!(
            "{:?} data connection on port {} for {}",
            self.data.mode(),
            port,
            request.describe()
        );

        match request {
            DataRequest::List { format, dir } => {
                self.send_listing(format, &dir);
                Transfer::Idle
            }
            DataRequest::Retrieve { file, path } => {
                info!("Sending {}", path);
                let job = TransferJob::new(file, path, now);
                self.reply(&format!(
                    "150-Connected to port {}\r\n150 {} bytes to download",
                    port,
                    job.file_size()
                ));
                Transfer::Retrieving(job)
            }
            DataRequest::Store { path } => match self.store.open_write(&path) {
                Ok(file) => {
                    info!("Receiving {}", path);
                    self.reply(&format!(
                        "{} Connected to port {}",
                        responses::FILE_STATUS_OK,
                        port
                    ));
                    Transfer::Storing(TransferJob::new(file, path, now))
                }
                Err(e) => {
                    error!("Failed to open {} for writing: {}", path, e);
                    self.data.close();
                    self.reply(&format!(
                        "{} Can't open/create {}",
                        responses::LOCAL_ERROR,
                        path
                    ));
                    Transfer::Idle
                }
            },
        }
    }

    /// Streams a directory listing over the data connection, then closes it.
    fn send_listing(&mut self, format: ListFormat, dir: &FtpPath) {
        self.reply(&format_response(
            responses::FILE_STATUS_OK,
            "Accepted data connection",
        ));

        match self.store.list_dir(dir) {
            Ok(entries) => {
                let mut count = 0;
                if let Some(conn) = self.data.conn_mut() {
                    for entry in &entries {
                        if let Err(e) = conn.write_line(&format.format_entry(entry)) {
                            warn!("Listing of {} interrupted: {}", dir, e);
                            break;
                        }
                        count += 1;
                    }
                }
                debug!("Listed {} entries of {}", count, dir);
                self.reply(&format.completion(count));
            }
            Err(e) => {
                warn!("Failed to list {}: {}", dir, e);
                self.reply(&format!(
                    "{} Can't open directory {}",
                    responses::FILE_UNAVAILABLE,
                    dir
                ));
            }
        }

        self.data.close();
    }
}

fn data_gone() -> TransferError {
    TransferError::DataConnectionLost(io::Error::from(io::ErrorKind::NotConnected))
}

/// Endpoint announced by PASV: the configured address, else the data
/// listener's own address, else loopback.
fn passive_endpoint(settings: &EngineSettings, local: Option<SocketAddr>) -> SocketAddrV4 {
    let port = local
        .map(|addr| addr.port())
        .filter(|port| *port != 0)
        .unwrap_or(settings.data_port);

    let ip = if !settings.passive_address.is_unspecified() {
        settings.passive_address
    } else {
        match local {
            Some(SocketAddr::V4(addr)) if !addr.ip().is_unspecified() => *addr.ip(),
            _ => Ipv4Addr::LOCALHOST,
        }
    };

    SocketAddrV4::new(ip, port)
}
