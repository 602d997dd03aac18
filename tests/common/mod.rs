//! In-memory transport, file store and clock used to drive the engine
//! tick by tick.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::{Duration, Instant};

use rax_ftp_engine::auth::Credentials;
use rax_ftp_engine::error::StorageError;
use rax_ftp_engine::navigate::FtpPath;
use rax_ftp_engine::server::Clock;
use rax_ftp_engine::storage::{DirEntry, FileHandle, FileStore};
use rax_ftp_engine::transport::{Connection, Listener};
use rax_ftp_engine::{EngineSettings, FtpServer};

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "secret";

// --------------------
// Transport
// --------------------

#[derive(Default)]
struct Pipe {
    to_server: VecDeque<u8>,
    to_client: Vec<u8>,
    client_closed: bool,
    server_closed: bool,
    /// Bytes `write` accepts before the send buffer counts as full.
    write_limit: Option<usize>,
}

/// Server side of an in-memory connection
pub struct MemoryConnection {
    pipe: Rc<RefCell<Pipe>>,
}

/// Client side of an in-memory connection
#[derive(Clone)]
pub struct MemoryPeer {
    pipe: Rc<RefCell<Pipe>>,
}

fn pair() -> (MemoryConnection, MemoryPeer) {
    let pipe = Rc::new(RefCell::new(Pipe::default()));
    (
        MemoryConnection { pipe: pipe.clone() },
        MemoryPeer { pipe },
    )
}

impl Connection for MemoryConnection {
    fn is_connected(&self) -> bool {
        let pipe = self.pipe.borrow();
        !pipe.server_closed && (!pipe.client_closed || !pipe.to_server.is_empty())
    }

    fn available(&self) -> usize {
        let pipe = self.pipe.borrow();
        if pipe.server_closed {
            0
        } else {
            pipe.to_server.len()
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut pipe = self.pipe.borrow_mut();
        if pipe.server_closed {
            return None;
        }
        pipe.to_server.pop_front()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut pipe = self.pipe.borrow_mut();
        if pipe.server_closed {
            return Ok(0);
        }
        let n = buf.len().min(pipe.to_server.len());
        for (slot, byte) in buf.iter_mut().zip(pipe.to_server.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut pipe = self.pipe.borrow_mut();
        if pipe.server_closed || pipe.client_closed {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        let n = match pipe.write_limit.as_mut() {
            Some(limit) => {
                let n = data.len().min(*limit);
                *limit -= n;
                n
            }
            None => data.len(),
        };
        pipe.to_client.extend_from_slice(&data[..n]);
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut pipe = self.pipe.borrow_mut();
        if pipe.server_closed || pipe.client_closed {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        pipe.to_client.extend_from_slice(data);
        Ok(())
    }

    fn close(&mut self) {
        self.pipe.borrow_mut().server_closed = true;
    }
}

impl MemoryPeer {
    pub fn send(&self, data: &[u8]) {
        self.pipe.borrow_mut().to_server.extend(data.iter().copied());
    }

    pub fn send_line(&self, line: &str) {
        self.send(format!("{}\r\n", line).as_bytes());
    }

    /// Everything the server wrote since the last call.
    pub fn take_bytes(&self) -> Vec<u8> {
        std::mem::take(&mut self.pipe.borrow_mut().to_client)
    }

    pub fn take_output(&self) -> String {
        String::from_utf8_lossy(&self.take_bytes()).into_owned()
    }

    /// Reply lines written since the last call, without terminators.
    pub fn take_lines(&self) -> Vec<String> {
        self.take_output()
            .split("\r\n")
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn close(&self) {
        self.pipe.borrow_mut().client_closed = true;
    }

    /// Caps how many more bytes the server may write; `None` lifts the cap.
    pub fn limit_writes(&self, limit: Option<usize>) {
        self.pipe.borrow_mut().write_limit = limit;
    }

    pub fn closed_by_server(&self) -> bool {
        self.pipe.borrow().server_closed
    }
}

#[derive(Default)]
struct ListenerState {
    pending: VecDeque<MemoryConnection>,
    listening: bool,
    fail_listen: bool,
}

/// In-memory listening endpoint
pub struct MemoryListener {
    addr: SocketAddr,
    state: Rc<RefCell<ListenerState>>,
}

/// Test-side handle that opens connections to a `MemoryListener`
#[derive(Clone)]
pub struct ListenerHandle {
    state: Rc<RefCell<ListenerState>>,
}

impl MemoryListener {
    pub fn new(addr: &str) -> (Self, ListenerHandle) {
        let state = Rc::new(RefCell::new(ListenerState::default()));
        let listener = MemoryListener {
            addr: addr.parse().expect("valid socket address"),
            state: state.clone(),
        };
        (listener, ListenerHandle { state })
    }
}

impl ListenerHandle {
    pub fn connect(&self) -> MemoryPeer {
        let (server, client) = pair();
        self.state.borrow_mut().pending.push_back(server);
        client
    }

    pub fn fail_listen(&self) {
        self.state.borrow_mut().fail_listen = true;
    }

    pub fn is_listening(&self) -> bool {
        self.state.borrow().listening
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }
}

impl Listener for MemoryListener {
    type Conn = MemoryConnection;

    fn listen(&mut self) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_listen {
            return Err(io::Error::from(io::ErrorKind::AddrInUse));
        }
        state.listening = true;
        Ok(())
    }

    fn has_pending_client(&mut self) -> bool {
        !self.state.borrow().pending.is_empty()
    }

    fn accept_client(&mut self) -> Option<MemoryConnection> {
        self.state.borrow_mut().pending.pop_front()
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some(self.addr)
    }
}

// --------------------
// File store
// --------------------

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
}

#[derive(Default)]
struct StoreState {
    nodes: BTreeMap<String, Node>,
}

/// In-memory `FileStore`. Clones share the same tree.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Rc<RefCell<StoreState>>,
    open_handles: Rc<Cell<usize>>,
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

fn name_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: &str, content: &[u8]) {
        self.state
            .borrow_mut()
            .nodes
            .insert(path.to_string(), Node::File(content.to_vec()));
    }

    pub fn add_dir(&self, path: &str) {
        self.state
            .borrow_mut()
            .nodes
            .insert(path.to_string(), Node::Dir);
    }

    pub fn read_file(&self, path: &str) -> Option<Vec<u8>> {
        match self.state.borrow().nodes.get(path) {
            Some(Node::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        path == "/" || self.state.borrow().nodes.contains_key(path)
    }

    /// Handles returned by `open_read`/`open_write` and not dropped yet.
    pub fn open_handles(&self) -> usize {
        self.open_handles.get()
    }

    fn is_dir(&self, path: &str) -> bool {
        path == "/" || matches!(self.state.borrow().nodes.get(path), Some(Node::Dir))
    }

    fn handle(&self, path: &str, content: Vec<u8>, writable: bool) -> Box<dyn FileHandle> {
        self.open_handles.set(self.open_handles.get() + 1);
        Box::new(MemoryFile {
            path: path.to_string(),
            content,
            pos: 0,
            writable,
            store: self.clone(),
        })
    }
}

struct MemoryFile {
    path: String,
    content: Vec<u8>,
    pos: usize,
    writable: bool,
    store: MemoryStore,
}

impl Read for MemoryFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.content[self.pos..];
        let n = buf.len().min(remaining.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for MemoryFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.writable {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        self.content.extend_from_slice(buf);
        self.store.add_file(&self.path, &self.content);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl FileHandle for MemoryFile {
    fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

impl Drop for MemoryFile {
    fn drop(&mut self) {
        let open = self.store.open_handles.get();
        self.store.open_handles.set(open.saturating_sub(1));
    }
}

impl FileStore for MemoryStore {
    fn exists(&self, path: &FtpPath) -> bool {
        self.contains(path.as_str())
    }

    fn open_read(&self, path: &FtpPath) -> Result<Box<dyn FileHandle>, StorageError> {
        let content = self.read_file(path.as_str());
        match content {
            Some(content) => Ok(self.handle(path.as_str(), content, false)),
            None => Err(StorageError::NotFound(path.to_string())),
        }
    }

    fn open_write(&self, path: &FtpPath) -> Result<Box<dyn FileHandle>, StorageError> {
        let path = path.as_str();
        if !self.is_dir(parent_of(path)) || self.is_dir(path) {
            return Err(StorageError::NotFound(path.to_string()));
        }
        self.add_file(path, b"");
        Ok(self.handle(path, Vec::new(), true))
    }

    fn remove(&self, path: &FtpPath) -> Result<(), StorageError> {
        let mut state = self.state.borrow_mut();
        match state.nodes.get(path.as_str()) {
            Some(Node::File(_)) => {
                state.nodes.remove(path.as_str());
                Ok(())
            }
            _ => Err(StorageError::NotFound(path.to_string())),
        }
    }

    fn rename(&self, from: &FtpPath, to: &FtpPath) -> Result<(), StorageError> {
        if self.contains(to.as_str()) {
            return Err(StorageError::AlreadyExists(to.to_string()));
        }
        let mut state = self.state.borrow_mut();
        let node = state
            .nodes
            .remove(from.as_str())
            .ok_or_else(|| StorageError::NotFound(from.to_string()))?;
        let prefix = format!("{}/", from.as_str());
        let children: Vec<String> = state
            .nodes
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .cloned()
            .collect();
        for child in children {
            if let Some(moved) = state.nodes.remove(&child) {
                let renamed = format!("{}/{}", to.as_str(), &child[prefix.len()..]);
                state.nodes.insert(renamed, moved);
            }
        }
        state.nodes.insert(to.to_string(), node);
        Ok(())
    }

    fn mkdir(&self, path: &FtpPath) -> Result<(), StorageError> {
        if self.contains(path.as_str()) {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        if !self.is_dir(parent_of(path.as_str())) {
            return Err(StorageError::NotFound(path.to_string()));
        }
        self.add_dir(path.as_str());
        Ok(())
    }

    fn rmdir(&self, path: &FtpPath) -> Result<(), StorageError> {
        if path.is_root() || !self.is_dir(path.as_str()) {
            return Err(StorageError::NotADirectory(path.to_string()));
        }
        let prefix = format!("{}/", path.as_str());
        let mut state = self.state.borrow_mut();
        if state.nodes.keys().any(|key| key.starts_with(&prefix)) {
            return Err(StorageError::Io(io::Error::other("directory not empty")));
        }
        state.nodes.remove(path.as_str());
        Ok(())
    }

    fn list_dir(&self, path: &FtpPath) -> Result<Vec<DirEntry>, StorageError> {
        if !self.is_dir(path.as_str()) {
            return Err(StorageError::NotADirectory(path.to_string()));
        }
        let state = self.state.borrow();
        Ok(state
            .nodes
            .iter()
            .filter(|(key, _)| key.as_str() != "/" && parent_of(key) == path.as_str())
            .map(|(key, node)| match node {
                Node::File(content) => DirEntry::file(name_of(key), content.len() as u64),
                Node::Dir => DirEntry::dir(name_of(key)),
            })
            .collect())
    }
}

// --------------------
// Clock
// --------------------

/// Clock advanced by hand. Clones share the same time.
#[derive(Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }
}

// --------------------
// Harness
// --------------------

pub type TestServer = FtpServer<MemoryListener, MemoryStore, ManualClock>;

/// An engine wired to in-memory collaborators, already idle.
pub struct Harness {
    pub server: TestServer,
    pub control: ListenerHandle,
    pub data: ListenerHandle,
    pub store: MemoryStore,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        let (control_listener, control) = MemoryListener::new("127.0.0.1:21");
        let (data_listener, data) = MemoryListener::new("127.0.0.1:50009");
        let store = MemoryStore::new();
        let clock = ManualClock::new();

        let server = FtpServer::begin_with_clock(
            control_listener,
            data_listener,
            store.clone(),
            Credentials::new(USERNAME, PASSWORD),
            settings,
            clock.clone(),
        )
        .expect("engine starts");

        let mut harness = Self {
            server,
            control,
            data,
            store,
            clock,
        };
        // Disconnected -> Resetting -> Idle
        harness.ticks(2);
        harness
    }

    pub fn tick(&mut self) -> bool {
        self.server.handle_ftp()
    }

    pub fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.server.handle_ftp();
        }
    }

    /// Connects a control client and returns it once the banner arrived.
    pub fn connect(&mut self) -> MemoryPeer {
        let peer = self.control.connect();
        for _ in 0..5 {
            self.tick();
            let banner = peer.take_output();
            if !banner.is_empty() {
                assert!(banner.starts_with("220"), "unexpected banner: {banner}");
                return peer;
            }
        }
        panic!("no banner received");
    }

    /// Sends one command line, runs one tick and returns the reply lines.
    pub fn send_command(&mut self, peer: &MemoryPeer, line: &str) -> Vec<String> {
        peer.send_line(line);
        self.tick();
        peer.take_lines()
    }

    /// Connects and logs in as the configured user.
    pub fn login(&mut self) -> MemoryPeer {
        let peer = self.connect();
        assert_eq!(
            self.send_command(&peer, &format!("USER {USERNAME}")),
            vec!["331 OK. Password required"]
        );
        assert_eq!(
            self.send_command(&peer, &format!("PASS {PASSWORD}")),
            vec!["230 OK."]
        );
        peer
    }

    /// Opens a data connection the way a passive-mode client would.
    pub fn open_data(&mut self, peer: &MemoryPeer) -> MemoryPeer {
        let reply = self.send_command(peer, "PASV");
        assert_eq!(
            reply,
            vec!["227 Entering Passive Mode (127,0,0,1,195,89)."]
        );
        self.data.connect()
    }
}
