//! Module `data_channel`
//!
//! Tracks the single data connection: the negotiated mode and endpoint,
//! and the connection adopted from the data listener.

use log::{debug, info};
use std::net::SocketAddrV4;

use crate::transfer::modes::TransferMode;
use crate::transport::{Connection, Listener};

pub struct DataChannel<C> {
    mode: TransferMode,
    endpoint: Option<SocketAddrV4>,
    conn: Option<C>,
}

impl<C> Default for DataChannel<C> {
    fn default() -> Self {
        Self {
            mode: TransferMode::default(),
            endpoint: None,
            conn: None,
        }
    }
}

impl<C: Connection> DataChannel<C> {
    pub fn mode(&self) -> TransferMode {
        self.mode
    }

    pub fn endpoint(&self) -> Option<SocketAddrV4> {
        self.endpoint
    }

    /// Closes any connection and records the passive endpoint.
    pub fn set_passive(&mut self, endpoint: SocketAddrV4) {
        self.close();
        self.mode = TransferMode::Passive;
        self.endpoint = Some(endpoint);
        info!("Data connection set to passive on {}", endpoint);
    }

    /// Closes any connection and records the client's endpoint.
    pub fn set_active(&mut self, endpoint: SocketAddrV4) {
        self.close();
        self.mode = TransferMode::Active;
        self.endpoint = Some(endpoint);
        info!("Data connection set to active towards {}", endpoint);
    }

    pub fn is_connected(&self) -> bool {
        self.conn.as_ref().is_some_and(|c| c.is_connected())
    }

    /// Polls `listener` once. A pending client replaces any stale
    /// connection. Returns whether a connected data channel exists.
    pub fn try_connect<L>(&mut self, listener: &mut L) -> bool
    where
        L: Listener<Conn = C>,
    {
        if self.is_connected() {
            return true;
        }
        if listener.has_pending_client() {
            if let Some(conn) = listener.accept_client() {
                self.close();
                self.conn = Some(conn);
                debug!("Data connection accepted ({:?} mode)", self.mode);
            }
        }
        self.is_connected()
    }

    pub fn conn_mut(&mut self) -> Option<&mut C> {
        self.conn.as_mut()
    }

    pub fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.close();
            debug!("Data connection closed");
        }
    }

    /// Closes the connection and forgets the negotiated mode.
    pub fn reset(&mut self) {
        self.close();
        self.mode = TransferMode::default();
        self.endpoint = None;
    }
}
