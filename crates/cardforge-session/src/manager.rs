//! The session manager: tracks every live connection's session.
//!
//! # Concurrency note
//!
//! `SessionManager` is not thread-safe by itself; it is owned by the
//! server's shared state and accessed through a mutex at a higher
//! level. Keeping it a plain `HashMap` avoids hidden locking overhead.

use std::collections::HashMap;

use cardforge_protocol::UserInfo;
use cardforge_transport::ConnectionId;

use crate::{AuthState, Session, SessionError};

/// Registry of all live sessions, with a name index for the one-session-
/// per-user rule and for routing private messages.
#[derive(Debug, Default)]
pub struct SessionManager {
    /// All sessions, keyed by connection.
    sessions: HashMap<ConnectionId, Session>,

    /// Logged-in user name → connection. Kept in sync with `sessions`.
    names: HashMap<String, ConnectionId>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh connection. Called from the accept loop.
    pub fn register(&mut self, conn_id: ConnectionId) -> &mut Session {
        tracing::debug!(%conn_id, "session registered");
        self.sessions.entry(conn_id).or_insert_with(|| Session::new(conn_id))
    }

    /// Moves a session to `LoggedIn`, enforcing one live session per
    /// user name.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`] for an unregistered connection.
    /// - [`SessionError::AlreadyLoggedIn`] when this connection logged
    ///   in before.
    /// - [`SessionError::NameInUse`] when the name is online on another
    ///   connection.
    pub fn login(&mut self, conn_id: ConnectionId, user: UserInfo) -> Result<(), SessionError> {
        let session = self
            .sessions
            .get(&conn_id)
            .ok_or(SessionError::NotFound(conn_id))?;
        if session.is_logged_in() {
            return Err(SessionError::AlreadyLoggedIn(conn_id));
        }
        if self.names.contains_key(&user.name) {
            return Err(SessionError::NameInUse(user.name));
        }

        tracing::info!(%conn_id, user = %user.name, level = %user.level, "user logged in");
        self.names.insert(user.name.clone(), conn_id);
        // Just looked up above; the entry is still there.
        let session = self.sessions.get_mut(&conn_id).expect("session present");
        session.state = AuthState::LoggedIn { user };
        Ok(())
    }

    /// Removes a connection's session, releasing its name.
    ///
    /// Returns the removed session so the caller can unwind room and
    /// game membership.
    pub fn remove(&mut self, conn_id: ConnectionId) -> Option<Session> {
        let session = self.sessions.remove(&conn_id)?;
        if let Some(user) = session.user() {
            self.names.remove(&user.name);
        }
        tracing::debug!(%conn_id, "session removed");
        Some(session)
    }

    pub fn get(&self, conn_id: ConnectionId) -> Option<&Session> {
        self.sessions.get(&conn_id)
    }

    pub fn get_mut(&mut self, conn_id: ConnectionId) -> Option<&mut Session> {
        self.sessions.get_mut(&conn_id)
    }

    /// Looks up the connection a user name is logged in on.
    pub fn by_name(&self, name: &str) -> Option<ConnectionId> {
        self.names.get(name).copied()
    }

    /// Reports whether a user name is currently online.
    pub fn is_online(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// All registered connections.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.sessions.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
