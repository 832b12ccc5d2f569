//! Session layer for Cardforge.
//!
//! A session is the server's record of one client connection: where it
//! stands in the auth ladder, which rooms and games it belongs to, and
//! the per-connection bookkeeping the dispatcher relies on: the
//! monotonic container-id watermark, the chat-flood window, and the
//! last-seen instant driving the idle timeout.
//!
//! The [`SessionManager`] owns all sessions and enforces the
//! one-live-session-per-user-name rule.

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{AuthState, Session, SessionConfig};
