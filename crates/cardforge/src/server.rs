//! `CardforgeServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session →
//! rooms/games, with the store behind its own lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Notify, mpsc, Mutex};

use cardforge_game::Rooms;
use cardforge_protocol::{JsonCodec, ServerMessage};
use cardforge_session::{SessionConfig, SessionManager};
use cardforge_store::Store;
use cardforge_transport::{Connection, ConnectionId, TcpTransport, Transport};

use crate::CardforgeError;
use crate::handler::handle_connection;

/// One room to create at startup.
#[derive(Debug, Clone)]
pub struct RoomSpec {
    pub name: String,
    pub description: String,
    pub auto_join: bool,
    pub game_types: Vec<String>,
}

/// The writer-side handle of one connection: where outbound messages
/// are queued, and the switch that tells its reader task to stop.
pub(crate) struct ConnHandle {
    pub(crate) sender: mpsc::UnboundedSender<ServerMessage>,
    pub(crate) shutdown: Arc<Notify>,
}

/// Shared server state handed to every connection handler task.
pub(crate) struct ServerState {
    pub(crate) welcome: String,
    pub(crate) session_config: SessionConfig,
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) rooms: Mutex<Rooms>,
    pub(crate) store: Mutex<Box<dyn Store>>,
    pub(crate) connections: Mutex<HashMap<ConnectionId, ConnHandle>>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a server.
pub struct CardforgeServerBuilder {
    bind_addr: String,
    welcome: String,
    session_config: SessionConfig,
    rooms: Vec<RoomSpec>,
}

impl CardforgeServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:4747".to_owned(),
            welcome: "Welcome to Cardforge.".to_owned(),
            session_config: SessionConfig::default(),
            rooms: vec![RoomSpec {
                name: "Main".to_owned(),
                description: "General play".to_owned(),
                auto_join: true,
                game_types: vec!["standard".to_owned()],
            }],
        }
    }

    /// Sets the address to bind to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_owned();
        self
    }

    /// Sets the notice every client receives after the handshake.
    pub fn welcome(mut self, text: &str) -> Self {
        self.welcome = text.to_owned();
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Replaces the default room set.
    pub fn rooms(mut self, rooms: Vec<RoomSpec>) -> Self {
        self.rooms = rooms;
        self
    }

    /// Binds the listener and assembles the shared state.
    pub async fn build(self, store: impl Store) -> Result<CardforgeServer, CardforgeError> {
        let transport = TcpTransport::bind(&self.bind_addr).await?;

        let mut rooms = Rooms::new();
        for spec in self.rooms {
            rooms.add_room(spec.name, spec.description, spec.auto_join, spec.game_types);
        }

        let state = Arc::new(ServerState {
            welcome: self.welcome,
            session_config: self.session_config,
            sessions: Mutex::new(SessionManager::new()),
            rooms: Mutex::new(rooms),
            store: Mutex::new(Box::new(store)),
            connections: Mutex::new(HashMap::new()),
            codec: JsonCodec,
        });

        Ok(CardforgeServer { transport, state })
    }
}

impl Default for CardforgeServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running server. Call [`run`](Self::run) to start accepting.
pub struct CardforgeServer {
    transport: TcpTransport,
    state: Arc<ServerState>,
}

impl CardforgeServer {
    pub fn builder() -> CardforgeServerBuilder {
        CardforgeServerBuilder::new()
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the task is aborted.
    pub async fn run(mut self) -> Result<(), CardforgeError> {
        tracing::info!("cardforge server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        let conn_id = conn.id();
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(%conn_id, error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
