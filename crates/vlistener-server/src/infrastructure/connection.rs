//! Per-connection handling and the registry of open connections.
//!
//! Each accepted TCP stream is owned by one [`ConnectionHandler`] running in
//! its own Tokio task.  The handler loops:
//!
//! ```text
//! Open ─▶ Reading ─▶ Dispatching ─┐
//!            ▲                    │
//!            └────────────────────┘
//!            │
//!            └─▶ Closed   (EOF, I/O error, or server stop)
//! ```
//!
//! Payloads on one connection are handled strictly in the order received:
//! the handler does not read again until every payload of the previous chunk
//! has been dispatched and answered.  The `running` flag is checked before
//! each payload, so after a stop at most the command already inside its
//! pre-action delay is performed.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;
use vlistener_core::protocol::framing::split_payloads;
use vlistener_core::protocol::response::RESPONSE_TERMINATOR;
use vlistener_core::ResponseMode;

use crate::infrastructure::server::ServerState;

/// Identifies one accepted connection in logs and in the registry.
pub type ConnectionId = Uuid;

/// Why a connection's loop ended without an I/O error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    PeerClosed,
    ServerStopping,
}

/// A registered connection: its peer and the trigger that force-closes it.
struct ActiveConnection {
    peer_addr: SocketAddr,
    close: oneshot::Sender<()>,
}

/// The set of currently open connections.
///
/// Handlers add themselves on entry and remove themselves on exit; the
/// server drains the whole set on stop.  All access goes through one async
/// mutex.
#[derive(Default)]
pub struct ConnectionRegistry {
    active: Mutex<HashMap<ConnectionId, ActiveConnection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection and returns its ID plus the close signal.
    pub async fn register(&self, peer_addr: SocketAddr) -> (ConnectionId, oneshot::Receiver<()>) {
        let id = Uuid::new_v4();
        let (close, closed) = oneshot::channel();
        self.active
            .lock()
            .await
            .insert(id, ActiveConnection { peer_addr, close });
        (id, closed)
    }

    /// Removes a connection.  Removing an unknown ID is a no-op.
    pub async fn remove(&self, id: ConnectionId) {
        self.active.lock().await.remove(&id);
    }

    /// Signals every registered connection to close and empties the set.
    ///
    /// Returns the number of connections signalled.
    pub async fn close_all(&self) -> usize {
        let drained: Vec<(ConnectionId, ActiveConnection)> =
            self.active.lock().await.drain().collect();
        let count = drained.len();
        for (id, conn) in drained {
            debug!("closing connection {id} ({})", conn.peer_addr);
            // The handler may already be on its way out; a dropped receiver is fine.
            let _ = conn.close.send(());
        }
        count
    }

    pub async fn len(&self) -> usize {
        self.active.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Owns one accepted connection for its whole lifetime.
pub struct ConnectionHandler {
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<ServerState>,
}

impl ConnectionHandler {
    pub(crate) fn new(stream: TcpStream, peer_addr: SocketAddr, state: Arc<ServerState>) -> Self {
        Self {
            stream,
            peer_addr,
            state,
        }
    }

    /// Runs the receive → parse → authenticate → dispatch → respond loop
    /// until the peer disconnects, an I/O error occurs, or the server stops.
    ///
    /// The socket is closed when this returns.
    pub async fn run(mut self) {
        let (id, mut closed) = self.state.connections.register(self.peer_addr).await;

        // A stop that raced with registration has already drained the
        // registry; checking the flag after registering closes that gap.
        if !self.state.is_running() {
            self.state.connections.remove(id).await;
            debug!("server stopping; dropping new connection {}", self.peer_addr);
            return;
        }

        info!("connection {id} open");

        let outcome = self.serve(&mut closed).await;
        self.state.connections.remove(id).await;

        match outcome {
            Ok(CloseReason::PeerClosed) => info!("connection {id} closed by peer"),
            Ok(CloseReason::ServerStopping) => info!("connection {id} closed by server stop"),
            Err(e) => warn!("connection {id} closed with error: {e}"),
        }
    }

    async fn serve(&mut self, closed: &mut oneshot::Receiver<()>) -> io::Result<CloseReason> {
        let mut buf = vec![0u8; self.state.read_buffer_size];

        loop {
            let n = tokio::select! {
                _ = &mut *closed => return Ok(CloseReason::ServerStopping),
                read = self.stream.read(&mut buf) => read?,
            };
            if n == 0 {
                return Ok(CloseReason::PeerClosed);
            }

            let chunk = String::from_utf8_lossy(&buf[..n]);
            for payload in split_payloads(&chunk) {
                // A stop during the previous payload's delay drops the rest of the chunk.
                if !self.state.is_running() {
                    return Ok(CloseReason::ServerStopping);
                }
                let result = self.state.service.handle(payload).await;
                info!("{result}");
                self.respond(&result).await?;
            }
        }
    }

    async fn respond(&mut self, result: &str) -> io::Result<()> {
        match self.state.response_mode {
            ResponseMode::Respond => {
                let line = format!("{result}{RESPONSE_TERMINATOR}");
                self.stream.write_all(line.as_bytes()).await
            }
            ResponseMode::FireAndForget => Ok(()),
        }
    }
}
