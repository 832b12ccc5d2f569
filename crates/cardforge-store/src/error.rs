//! Error types for the persistence gateway.

/// Errors that can occur in the store layer. The server maps each
/// variant to a wire response code.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// The named user has no account.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Login credentials did not match.
    #[error("wrong password for {0}")]
    WrongPassword(String),

    /// Login refused because of an active ban.
    #[error("user is banned: {reason}")]
    Banned { reason: String },

    /// The user is already on the target list.
    #[error("{user} is already on the {list} list")]
    AlreadyOnList { list: String, user: String },

    /// The user is not on the target list.
    #[error("{user} is not on the {list} list")]
    NotOnList { list: String, user: String },

    /// Users cannot add themselves to their own lists.
    #[error("cannot add yourself to a list")]
    SelfReference,

    /// No deck folder at the given path.
    #[error("deck folder not found: {0}")]
    FolderNotFound(String),

    /// A sibling folder with that name already exists.
    #[error("deck folder already exists: {0}")]
    FolderExists(String),

    /// The deck tree root cannot be deleted.
    #[error("cannot delete the root deck folder")]
    RootFolder,

    /// No stored deck with that id.
    #[error("deck not found: {0}")]
    DeckNotFound(u64),

    /// An empty or slash-containing name was given for a folder or deck.
    #[error("invalid name: {0:?}")]
    InvalidName(String),
}
