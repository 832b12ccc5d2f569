//! Persistence gateway for Cardforge.
//!
//! The server talks to durable state (accounts, bans, buddy/ignore
//! lists, the per-user deck storage tree) only through the [`Store`]
//! trait. [`MemoryStore`] is the in-process implementation used by
//! tests and standalone servers; a database-backed store slots in
//! behind the same trait.
//!
//! The gateway is not assumed reentrant or thread-safe; the server
//! holds it behind a single mutex and every call completes before the
//! next begins.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use cardforge_protocol::{DeckDir, DeckFile, ListKind, UserLevel};

/// A stored deck, content included. Content is returned only through
/// [`Store::deck_download`]; listings carry [`DeckFile`] metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDeck {
    pub id: u64,
    pub name: String,
    pub content: String,
    pub uploaded_at: u64,
}

/// Everything the server persists.
pub trait Store: Send + 'static {
    /// Validates credentials and returns the user's level.
    ///
    /// Unknown names log in as guests when the store allows it. Active
    /// bans are checked first, regardless of credentials.
    ///
    /// # Errors
    /// [`StoreError::Banned`], [`StoreError::WrongPassword`], or
    /// [`StoreError::UserNotFound`] when guest logins are disabled.
    fn authenticate(&mut self, name: &str, password: &str) -> Result<UserLevel, StoreError>;

    /// Reports whether a registered account with this name exists.
    fn user_exists(&self, name: &str) -> bool;

    /// Records a ban. `minutes == 0` means permanent. The caller is
    /// responsible for verifying the target exists first.
    fn add_ban(&mut self, name: &str, address: &str, minutes: u32, reason: &str);

    /// Returns the reason of an active ban matching this name or
    /// address, if any.
    fn active_ban(&self, name: &str, address: &str) -> Option<String>;

    /// Returns the owner's buddy or ignore list, sorted.
    fn list_members(&self, owner: &str, kind: ListKind) -> Vec<String>;

    /// Adds a user to the owner's buddy or ignore list.
    ///
    /// # Errors
    /// [`StoreError::SelfReference`], [`StoreError::UserNotFound`] for
    /// an unregistered target, or [`StoreError::AlreadyOnList`].
    fn add_to_list(&mut self, owner: &str, kind: ListKind, user: &str) -> Result<(), StoreError>;

    /// Removes a user from the owner's buddy or ignore list.
    ///
    /// # Errors
    /// [`StoreError::NotOnList`] when the user wasn't on it.
    fn remove_from_list(
        &mut self,
        owner: &str,
        kind: ListKind,
        user: &str,
    ) -> Result<(), StoreError>;

    /// Returns the owner's whole deck folder tree. The root has id 0
    /// and an empty name.
    fn deck_tree(&self, owner: &str) -> DeckDir;

    /// Creates a folder named `name` under the folder at `path`
    /// (slash-separated segments, "" for the root).
    fn deck_new_dir(&mut self, owner: &str, path: &str, name: &str) -> Result<(), StoreError>;

    /// Deletes the folder at `path` and everything under it.
    fn deck_del_dir(&mut self, owner: &str, path: &str) -> Result<(), StoreError>;

    /// Deletes one stored deck by id.
    fn deck_delete(&mut self, owner: &str, deck_id: u64) -> Result<(), StoreError>;

    /// Stores a deck under the folder at `path` and returns its listing
    /// entry.
    fn deck_upload(
        &mut self,
        owner: &str,
        path: &str,
        name: &str,
        content: &str,
    ) -> Result<DeckFile, StoreError>;

    /// Fetches a stored deck, content included.
    fn deck_download(&self, owner: &str, deck_id: u64) -> Result<StoredDeck, StoreError>;
}
