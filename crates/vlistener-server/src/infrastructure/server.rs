//! Command server: listening socket, accept loop, and coordinated shutdown.
//!
//! [`Server::start`] binds the listener and spawns the accept loop; every
//! accepted connection gets its own Tokio task running a
//! [`ConnectionHandler`].  [`Server::stop`] clears the `running` flag,
//! force-closes every open connection, and waits for the accept loop to drop
//! the listening socket.
//!
//! # Shutdown
//!
//! Shutdown is cooperative.  The accept loop wakes every
//! [`ACCEPT_POLL_INTERVAL`] to check the `running` flag.  Connections blocked
//! in a read are woken by their close signal.  A connection that is in the
//! middle of a pre-action delay finishes that command first, then notices
//! the flag and closes without touching the rest of its chunk.
//!
//! # Failure policy
//!
//! Only a bind failure or an accept failure stops the server.  An accept
//! error ends the accept loop (no retry); [`Server::wait`] reports it.
//! Everything that happens on a single connection stays on that connection.

use std::io;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{error, info, info_span, Instrument};
use vlistener_core::{ConfigError, ResponseMode, ServerConfig};

use crate::application::dispatch::InputSimulator;
use crate::application::handle_payload::CommandService;
use crate::infrastructure::connection::{ConnectionHandler, ConnectionRegistry};

/// How often the accept loop re-checks the `running` flag while idle.
pub const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Errors that stop the server as a whole.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configuration snapshot was rejected before binding.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The listen address could not be bound.
    #[error("bind failed on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// `accept` failed while the server was running; the accept loop ended.
    #[error("accept failed: {source}")]
    Accept {
        #[source]
        source: Arc<io::Error>,
    },

    /// The accept loop task ended without reporting an outcome.
    #[error("accept loop terminated unexpectedly")]
    AcceptLoopAborted,
}

/// How the accept loop finished.
#[derive(Debug, Clone)]
enum AcceptLoopExit {
    Stopped,
    Failed(Arc<io::Error>),
}

/// State shared between the server handle, the accept loop, and every
/// connection handler.
pub(crate) struct ServerState {
    running: AtomicBool,
    pub(crate) connections: ConnectionRegistry,
    pub(crate) service: CommandService,
    pub(crate) response_mode: ResponseMode,
    pub(crate) read_buffer_size: usize,
}

impl ServerState {
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// A running command server.
///
/// Dropping the handle does not stop the server; call [`Server::stop`].
pub struct Server {
    local_addr: SocketAddr,
    state: Arc<ServerState>,
    exit: watch::Receiver<Option<AcceptLoopExit>>,
}

impl Server {
    /// Validates `config`, binds the listener, and starts accepting connections.
    ///
    /// Binding to port 0 picks a free port; use [`Server::local_addr`] to
    /// find out which.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] for an invalid configuration and
    /// [`ServerError::Bind`] if the address is in use, not permitted, or not
    /// a local address.
    pub async fn start(
        config: ServerConfig,
        simulator: Arc<dyn InputSimulator>,
    ) -> Result<Self, ServerError> {
        config.validate()?;

        let listener = bind_listener(config.bind_addr, config.backlog)?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind {
                addr: config.bind_addr,
                source,
            })?;

        info!(
            "listening on {local_addr} (delay {:?}, {:?} mode)",
            config.pre_action_delay, config.response_mode
        );

        let state = Arc::new(ServerState {
            running: AtomicBool::new(true),
            connections: ConnectionRegistry::new(),
            service: CommandService::from_config(&config, simulator),
            response_mode: config.response_mode,
            read_buffer_size: config.read_buffer_size,
        });

        let (exit_tx, exit) = watch::channel(None);
        let loop_state = Arc::clone(&state);
        tokio::spawn(async move {
            let outcome = accept_loop(listener, loop_state).await;
            let _ = exit_tx.send(Some(outcome));
        });

        Ok(Self {
            local_addr,
            state,
            exit,
        })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Number of connections currently registered.
    pub async fn active_connections(&self) -> usize {
        self.state.connections.len().await
    }

    /// Stops the server.
    ///
    /// Clears the `running` flag, force-closes every registered connection,
    /// and returns once the accept loop has dropped the listening socket.
    /// Calling `stop` again (or after an accept failure) is harmless.
    pub async fn stop(&self) {
        if self.state.running.swap(false, Ordering::SeqCst) {
            info!("shutting down {}", self.local_addr);
        }

        let closed = self.state.connections.close_all().await;
        if closed > 0 {
            info!("closed {closed} active connection(s)");
        }

        let _ = self.wait().await;
    }

    /// Waits until the accept loop ends.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Accept`] if the loop ended on an accept failure
    /// rather than on [`Server::stop`].
    pub async fn wait(&self) -> Result<(), ServerError> {
        let mut exit = self.exit.clone();
        let outcome = match exit.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => return Err(ServerError::AcceptLoopAborted),
        };

        match outcome {
            Some(AcceptLoopExit::Failed(source)) => Err(ServerError::Accept { source }),
            Some(AcceptLoopExit::Stopped) | None => Ok(()),
        }
    }
}

/// Creates the listening socket with an explicit backlog.
fn bind_listener(addr: SocketAddr, backlog: u32) -> Result<TcpListener, ServerError> {
    let bind_err = |source: io::Error| ServerError::Bind { addr, source };

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .map_err(bind_err)?;

    // Lets a restarted server rebind while old connections sit in TIME_WAIT.
    #[cfg(unix)]
    socket.set_reuseaddr(true).map_err(bind_err)?;

    socket.bind(addr).map_err(bind_err)?;
    socket.listen(backlog).map_err(bind_err)
}

async fn accept_loop(listener: TcpListener, state: Arc<ServerState>) -> AcceptLoopExit {
    loop {
        if !state.is_running() {
            info!("shutdown flag set; stopping accept loop");
            return AcceptLoopExit::Stopped;
        }

        // The timeout lets the loop observe the flag while nobody connects.
        match timeout(ACCEPT_POLL_INTERVAL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                info!("accepted connection from {peer_addr}");
                let handler = ConnectionHandler::new(stream, peer_addr, Arc::clone(&state));
                tokio::spawn(
                    handler
                        .run()
                        .instrument(info_span!("connection", peer = %peer_addr)),
                );
            }
            Ok(Err(e)) => {
                if !state.is_running() {
                    return AcceptLoopExit::Stopped;
                }
                error!("accept error: {e}; accept loop ending");
                return AcceptLoopExit::Failed(Arc::new(e));
            }
            Err(_) => {}
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
