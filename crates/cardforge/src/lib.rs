//! # Cardforge
//!
//! Server for multiplayer tabletop card games.
//!
//! Cardforge is the authority for everything shared: accounts and
//! sessions, chat rooms, the game directory, and the games themselves
//! (zones, cards, counters, turn order), while clients render state
//! and submit commands. Per-observer filtering keeps hidden information
//! (hands, decks) on the server.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use cardforge::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CardforgeError> {
//!     let server = CardforgeServer::builder()
//!         .bind("0.0.0.0:4747")
//!         .build(MemoryStore::new())
//!         .await?;
//!     server.run().await
//! }
//! ```

mod broadcast;
mod dispatch;
mod error;
mod handler;
mod server;

pub use error::CardforgeError;
pub use server::{CardforgeServer, CardforgeServerBuilder, RoomSpec};

pub mod prelude {
    pub use crate::{CardforgeError, CardforgeServer, CardforgeServerBuilder, RoomSpec};
    pub use cardforge_protocol::PROTOCOL_VERSION;
    pub use cardforge_session::SessionConfig;
    pub use cardforge_store::{MemoryStore, Store};
}
