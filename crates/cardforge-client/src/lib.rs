//! Minimal Cardforge client.
//!
//! Speaks the wire contract from the client side: version handshake,
//! container submission with pending-response tracking, and an inbox
//! for events that arrive while a response is awaited. Used by tools
//! and by the server's end-to-end tests; it is not a game UI.
//!
//! The client is single-task: callers drive it by awaiting one method
//! at a time. To stay inside the server's idle window, call
//! [`CardforgeClient::ping`] on an interval when otherwise quiet.

use std::collections::{BTreeSet, HashMap, VecDeque};

use cardforge_protocol::{
    ClientMessage, Codec, Command, CommandContainer, JsonCodec,
    PROTOCOL_VERSION, ProtocolError, ResponseCode, ResponseData,
    ServerMessage, SessionEvent, UserInfo,
};
use cardforge_transport::{Connection, TcpConnection, TransportError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The connection closed while a reply was still expected.
    #[error("connection lost")]
    ConnectionLost,

    /// The server sent something the current state can't accept.
    #[error("unexpected message: {0}")]
    Unexpected(String),

    /// A command was answered with a non-`Ok` code.
    #[error("server refused: {0:?}")]
    Refused(ResponseCode),
}

// ---------------------------------------------------------------------------
// Status ladder
// ---------------------------------------------------------------------------

/// Where the client is in its lifecycle. Strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientStatus {
    /// Hello exchanged and welcome received; not yet authenticated.
    Connected,
    /// Login accepted by the server.
    LoggedIn,
    /// The server announced it is closing this connection.
    Closed,
}

// ---------------------------------------------------------------------------
// CardforgeClient
// ---------------------------------------------------------------------------

pub struct CardforgeClient {
    conn: TcpConnection,
    codec: JsonCodec,
    status: ClientStatus,
    welcome: String,
    next_cmd_id: u64,
    pending: BTreeSet<u64>,
    responses: HashMap<u64, (ResponseCode, Option<ResponseData>)>,
    inbox: VecDeque<ServerMessage>,
}

impl CardforgeClient {
    /// Connects and runs the handshake: server hello, client hello,
    /// welcome notice. `compression` asks for lz4 frames; it is only
    /// used when the server offers it too.
    pub async fn connect(addr: &str, compression: bool) -> Result<Self, ClientError> {
        let conn = TcpConnection::connect(addr).await?;
        let codec = JsonCodec;

        let payload = conn.recv().await?.ok_or(ClientError::ConnectionLost)?;
        let hello: ServerMessage = codec.decode(&payload)?;
        let ServerMessage::Hello {
            version,
            compression: server_compression,
        } = hello
        else {
            return Err(ClientError::Unexpected(format!("{hello:?}")));
        };
        if version != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                got: version,
            }
            .into());
        }

        let compression = compression && server_compression;
        let client_hello = codec.encode(&ClientMessage::Hello {
            version: PROTOCOL_VERSION,
            compression,
        })?;
        conn.send(&client_hello).await?;
        conn.set_compression(compression);

        let mut client = Self {
            conn,
            codec,
            status: ClientStatus::Connected,
            welcome: String::new(),
            next_cmd_id: 1,
            pending: BTreeSet::new(),
            responses: HashMap::new(),
            inbox: VecDeque::new(),
        };

        // The welcome notice follows the handshake; anything pushed
        // around it is kept for later.
        loop {
            let msg = client.recv_message().await?;
            match msg {
                ServerMessage::Session(SessionEvent::ServerNotice { text }) => {
                    client.welcome = text;
                    break;
                }
                ServerMessage::Session(SessionEvent::ConnectionClosed { reason }) => {
                    return Err(ClientError::Unexpected(format!("closed: {reason}")));
                }
                other => client.inbox.push_back(other),
            }
        }
        Ok(client)
    }

    pub fn status(&self) -> ClientStatus {
        self.status
    }

    /// The notice the server sent right after the handshake.
    pub fn welcome(&self) -> &str {
        &self.welcome
    }

    /// Sends a container without waiting for its response. Returns the
    /// assigned `cmd_id`; the response is collected by
    /// [`wait_response`](Self::wait_response).
    pub async fn submit(&mut self, commands: Vec<Command>) -> Result<u64, ClientError> {
        let cmd_id = self.next_cmd_id;
        self.next_cmd_id += 1;
        let bytes = self
            .codec
            .encode(&ClientMessage::Container(CommandContainer { cmd_id, commands }))?;
        self.conn.send(&bytes).await?;
        self.pending.insert(cmd_id);
        Ok(cmd_id)
    }

    /// Waits for the response to a submitted container. Events arriving
    /// in the meantime go to the inbox.
    pub async fn wait_response(
        &mut self,
        cmd_id: u64,
    ) -> Result<(ResponseCode, Option<ResponseData>), ClientError> {
        loop {
            if let Some(response) = self.responses.remove(&cmd_id) {
                self.pending.remove(&cmd_id);
                return Ok(response);
            }
            let msg = self.recv_message().await?;
            self.route(msg);
        }
    }

    /// Submits one container and waits for its response.
    pub async fn call(
        &mut self,
        commands: Vec<Command>,
    ) -> Result<(ResponseCode, Option<ResponseData>), ClientError> {
        let cmd_id = self.submit(commands).await?;
        self.wait_response(cmd_id).await
    }

    /// Authenticates. On success the server's view of the user comes
    /// back, along with the buddy and ignore lists.
    pub async fn login(
        &mut self,
        user: &str,
        password: &str,
    ) -> Result<(UserInfo, Vec<String>, Vec<String>), ClientError> {
        let (code, data) = self
            .call(vec![Command::Login {
                user: user.to_owned(),
                password: password.to_owned(),
            }])
            .await?;
        match (code, data) {
            (
                ResponseCode::Ok,
                Some(ResponseData::LoginOk {
                    user,
                    buddy_list,
                    ignore_list,
                }),
            ) => {
                self.status = ClientStatus::LoggedIn;
                Ok((user, buddy_list, ignore_list))
            }
            (code, _) => Err(ClientError::Refused(code)),
        }
    }

    /// Liveness probe; also resets the server's idle clock.
    pub async fn ping(&mut self) -> Result<(), ClientError> {
        let (code, _) = self.call(vec![Command::Ping]).await?;
        match code {
            ResponseCode::Ok => Ok(()),
            code => Err(ClientError::Refused(code)),
        }
    }

    /// The next pushed event: from the inbox if one is queued, from the
    /// wire otherwise. Responses encountered on the way are stashed for
    /// their waiters.
    pub async fn next_event(&mut self) -> Result<ServerMessage, ClientError> {
        loop {
            if let Some(msg) = self.inbox.pop_front() {
                return Ok(msg);
            }
            let msg = self.recv_message().await?;
            self.route(msg);
        }
    }

    /// A queued event, without touching the wire.
    pub fn try_event(&mut self) -> Option<ServerMessage> {
        self.inbox.pop_front()
    }

    pub async fn close(&self) -> Result<(), ClientError> {
        self.conn.close().await?;
        Ok(())
    }

    async fn recv_message(&mut self) -> Result<ServerMessage, ClientError> {
        let payload = self.conn.recv().await?.ok_or(ClientError::ConnectionLost)?;
        let msg: ServerMessage = self.codec.decode(&payload)?;
        if matches!(
            msg,
            ServerMessage::Session(SessionEvent::ConnectionClosed { .. })
        ) {
            self.status = ClientStatus::Closed;
        }
        Ok(msg)
    }

    fn route(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Response { cmd_id, code, data } => {
                if self.pending.contains(&cmd_id) {
                    self.responses.insert(cmd_id, (code, data));
                } else {
                    tracing::debug!(cmd_id, "response with no pending container");
                }
            }
            other => self.inbox.push_back(other),
        }
    }
}
