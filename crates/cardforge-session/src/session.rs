//! Session types: the server's record of one client connection.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use cardforge_protocol::{GameId, PlayerId, RoomId, UserInfo};
use cardforge_transport::ConnectionId;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Tunables for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Seconds of silence after which the connection is dropped.
    pub idle_timeout_secs: u64,

    /// Maximum chat messages allowed within the flood window.
    pub chat_flood_max: usize,

    /// Length of the chat-flood sliding window, in seconds.
    pub chat_flood_window_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 15,
            chat_flood_max: 10,
            chat_flood_window_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// AuthState
// ---------------------------------------------------------------------------

/// The per-connection auth ladder. Strictly forward:
///
/// ```text
/// AwaitingHello ──(hello, version ok)──→ AwaitingLogin ──(login ok)──→ LoggedIn
/// ```
///
/// Any protocol violation along the way closes the connection instead of
/// moving backward.
#[derive(Debug, Clone)]
pub enum AuthState {
    /// Nothing received yet; only a hello is acceptable.
    AwaitingHello,

    /// Hello exchanged. `Ping` and `Login` are the only commands
    /// accepted here.
    AwaitingLogin,

    /// Fully authenticated.
    LoggedIn { user: UserInfo },
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One connection's server-side state: where it is in the auth ladder,
/// which rooms and games it participates in, and the bookkeeping for
/// liveness, flood control, and duplicate-container suppression.
#[derive(Debug)]
pub struct Session {
    /// The underlying transport connection.
    pub conn_id: ConnectionId,

    /// Where this connection is in the auth ladder.
    pub state: AuthState,

    /// Whether the client asked for compressed frames in its hello.
    pub compression: bool,

    /// Rooms this user has joined.
    pub rooms: HashSet<RoomId>,

    /// Games this user sits in, with the seat assigned per game.
    pub games: HashMap<GameId, (RoomId, PlayerId)>,

    /// When the last frame arrived from this connection.
    last_seen: Instant,

    /// Highest `cmd_id` dispatched so far, if any.
    watermark: Option<u64>,

    /// Timestamps of recent chat messages, oldest first.
    chat_times: VecDeque<Instant>,
}

impl Session {
    pub fn new(conn_id: ConnectionId) -> Self {
        Self {
            conn_id,
            state: AuthState::AwaitingHello,
            compression: false,
            rooms: HashSet::new(),
            games: HashMap::new(),
            last_seen: Instant::now(),
            watermark: None,
            chat_times: VecDeque::new(),
        }
    }

    /// The logged-in identity, if past the ladder.
    pub fn user(&self) -> Option<&UserInfo> {
        match &self.state {
            AuthState::LoggedIn { user } => Some(user),
            _ => None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.state, AuthState::LoggedIn { .. })
    }

    /// Records inbound traffic for the liveness check.
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Time since the last inbound frame.
    pub fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }

    /// Admits a container id, advancing the watermark.
    ///
    /// Ids must strictly increase per connection. A stale id means the
    /// container was already dispatched (a retransmit or a confused
    /// client) and must not run twice.
    pub fn admit_container(&mut self, cmd_id: u64) -> Result<(), crate::SessionError> {
        if let Some(watermark) = self.watermark {
            if cmd_id <= watermark {
                return Err(crate::SessionError::StaleCommandId { cmd_id, watermark });
            }
        }
        self.watermark = Some(cmd_id);
        Ok(())
    }

    /// Admits one chat message against the sliding flood window.
    ///
    /// Returns `false` when the window is already full; the message must
    /// be refused with `ChatFlood` and not recorded.
    pub fn admit_chat(&mut self, config: &SessionConfig) -> bool {
        let now = Instant::now();
        let window = Duration::from_secs(config.chat_flood_window_secs);
        while let Some(&oldest) = self.chat_times.front() {
            if now.duration_since(oldest) > window {
                self.chat_times.pop_front();
            } else {
                break;
            }
        }
        if self.chat_times.len() >= config.chat_flood_max {
            return false;
        }
        self.chat_times.push_back(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardforge_protocol::UserLevel;

    fn logged_in_session() -> Session {
        let mut session = Session::new(ConnectionId::new(1));
        session.state = AuthState::LoggedIn {
            user: UserInfo {
                name: "alice".into(),
                level: UserLevel::Registered,
            },
        };
        session
    }

    #[test]
    fn test_new_session_awaits_hello() {
        let session = Session::new(ConnectionId::new(1));
        assert!(matches!(session.state, AuthState::AwaitingHello));
        assert!(!session.is_logged_in());
        assert!(session.user().is_none());
    }

    #[test]
    fn test_admit_container_requires_increasing_ids() {
        let mut session = logged_in_session();
        session.admit_container(1).unwrap();
        session.admit_container(2).unwrap();
        assert_eq!(
            session.admit_container(2),
            Err(crate::SessionError::StaleCommandId { cmd_id: 2, watermark: 2 })
        );
        assert_eq!(
            session.admit_container(1),
            Err(crate::SessionError::StaleCommandId { cmd_id: 1, watermark: 2 })
        );
        // Gaps are fine; only monotonicity matters.
        session.admit_container(10).unwrap();
    }

    #[test]
    fn test_chat_flood_window_fills_and_refuses() {
        let mut session = logged_in_session();
        let config = SessionConfig::default();
        for _ in 0..config.chat_flood_max {
            assert!(session.admit_chat(&config));
        }
        assert!(!session.admit_chat(&config));
    }

    #[test]
    fn test_refused_chat_is_not_recorded() {
        let mut session = logged_in_session();
        let config = SessionConfig {
            chat_flood_max: 1,
            ..SessionConfig::default()
        };
        assert!(session.admit_chat(&config));
        assert!(!session.admit_chat(&config));
        assert_eq!(session.chat_times.len(), 1);
    }
}
