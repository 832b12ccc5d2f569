//! In-memory [`Store`] implementation.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::debug;

use cardforge_protocol::{DeckDir, DeckFile, ListKind, UserLevel};

use crate::{Store, StoreError, StoredDeck};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Account {
    password: String,
    level: UserLevel,
    buddies: BTreeSet<String>,
    ignores: BTreeSet<String>,
}

#[derive(Debug)]
struct Ban {
    name: String,
    address: String,
    expires_at: Option<SystemTime>,
    reason: String,
}

impl Ban {
    fn is_active(&self, now: SystemTime) -> bool {
        match self.expires_at {
            Some(at) => now < at,
            None => true,
        }
    }

    fn matches(&self, name: &str, address: &str) -> bool {
        (!self.name.is_empty() && self.name == name)
            || (!self.address.is_empty() && self.address == address)
    }
}

#[derive(Debug)]
struct DeckRecord {
    id: u64,
    name: String,
    content: String,
    uploaded_at: u64,
}

#[derive(Debug)]
struct DirNode {
    id: u64,
    name: String,
    dirs: Vec<DirNode>,
    files: Vec<DeckRecord>,
}

impl DirNode {
    fn root() -> Self {
        Self {
            id: 0,
            name: String::new(),
            dirs: Vec::new(),
            files: Vec::new(),
        }
    }

    fn to_listing(&self) -> DeckDir {
        DeckDir {
            id: self.id,
            name: self.name.clone(),
            dirs: self.dirs.iter().map(DirNode::to_listing).collect(),
            files: self
                .files
                .iter()
                .map(|f| DeckFile {
                    id: f.id,
                    name: f.name.clone(),
                    uploaded_at: f.uploaded_at,
                })
                .collect(),
        }
    }

    fn find_deck(&self, deck_id: u64) -> Option<&DeckRecord> {
        if let Some(record) = self.files.iter().find(|f| f.id == deck_id) {
            return Some(record);
        }
        self.dirs.iter().find_map(|d| d.find_deck(deck_id))
    }

    fn remove_deck(&mut self, deck_id: u64) -> bool {
        if let Some(pos) = self.files.iter().position(|f| f.id == deck_id) {
            self.files.remove(pos);
            return true;
        }
        self.dirs.iter_mut().any(|d| d.remove_deck(deck_id))
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Keeps all persistent state in process memory. Nothing survives a
/// restart; tests and standalone servers seed it through
/// [`MemoryStore::add_account`].
#[derive(Debug)]
pub struct MemoryStore {
    allow_guests: bool,
    accounts: HashMap<String, Account>,
    bans: Vec<Ban>,
    deck_trees: HashMap<String, DirNode>,
    next_dir_id: u64,
    next_deck_id: u64,
}

impl MemoryStore {
    /// Creates an empty store that admits unknown names as guests.
    pub fn new() -> Self {
        Self {
            allow_guests: true,
            accounts: HashMap::new(),
            bans: Vec::new(),
            deck_trees: HashMap::new(),
            next_dir_id: 1,
            next_deck_id: 1,
        }
    }

    /// Disables guest logins: unknown names fail with `UserNotFound`.
    pub fn require_registration(mut self) -> Self {
        self.allow_guests = false;
        self
    }

    /// Seeds a registered account.
    pub fn add_account(&mut self, name: &str, password: &str, level: UserLevel) {
        self.accounts.insert(
            name.to_owned(),
            Account {
                password: password.to_owned(),
                level,
                buddies: BTreeSet::new(),
                ignores: BTreeSet::new(),
            },
        );
    }

    fn list_of<'a>(account: &'a mut Account, kind: ListKind) -> &'a mut BTreeSet<String> {
        match kind {
            ListKind::Buddy => &mut account.buddies,
            ListKind::Ignore => &mut account.ignores,
        }
    }

    /// Walks `path` from `root`, one slash-separated segment at a time.
    fn resolve_mut<'a>(root: &'a mut DirNode, path: &str) -> Result<&'a mut DirNode, StoreError> {
        let mut node = root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = node
                .dirs
                .iter_mut()
                .find(|d| d.name == segment)
                .ok_or_else(|| StoreError::FolderNotFound(path.to_owned()))?;
        }
        Ok(node)
    }

    fn validate_name(name: &str) -> Result<(), StoreError> {
        if name.is_empty() || name.contains('/') {
            return Err(StoreError::InvalidName(name.to_owned()));
        }
        Ok(())
    }

    fn unix_now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn authenticate(&mut self, name: &str, password: &str) -> Result<UserLevel, StoreError> {
        if let Some(reason) = self.active_ban(name, "") {
            return Err(StoreError::Banned { reason });
        }
        match self.accounts.get(name) {
            Some(account) if account.password == password => Ok(account.level),
            Some(_) => Err(StoreError::WrongPassword(name.to_owned())),
            None if self.allow_guests => Ok(UserLevel::Guest),
            None => Err(StoreError::UserNotFound(name.to_owned())),
        }
    }

    fn user_exists(&self, name: &str) -> bool {
        self.accounts.contains_key(name)
    }

    fn add_ban(&mut self, name: &str, address: &str, minutes: u32, reason: &str) {
        let expires_at = if minutes == 0 {
            None
        } else {
            Some(SystemTime::now() + Duration::from_secs(u64::from(minutes) * 60))
        };
        debug!(%name, %address, minutes, "recording ban");
        self.bans.push(Ban {
            name: name.to_owned(),
            address: address.to_owned(),
            expires_at,
            reason: reason.to_owned(),
        });
    }

    fn active_ban(&self, name: &str, address: &str) -> Option<String> {
        let now = SystemTime::now();
        self.bans
            .iter()
            .find(|b| b.is_active(now) && b.matches(name, address))
            .map(|b| b.reason.clone())
    }

    fn list_members(&self, owner: &str, kind: ListKind) -> Vec<String> {
        let Some(account) = self.accounts.get(owner) else {
            return Vec::new();
        };
        let list = match kind {
            ListKind::Buddy => &account.buddies,
            ListKind::Ignore => &account.ignores,
        };
        list.iter().cloned().collect()
    }

    fn add_to_list(&mut self, owner: &str, kind: ListKind, user: &str) -> Result<(), StoreError> {
        if owner == user {
            return Err(StoreError::SelfReference);
        }
        if !self.accounts.contains_key(user) {
            return Err(StoreError::UserNotFound(user.to_owned()));
        }
        let account = self
            .accounts
            .get_mut(owner)
            .ok_or_else(|| StoreError::UserNotFound(owner.to_owned()))?;
        if !Self::list_of(account, kind).insert(user.to_owned()) {
            return Err(StoreError::AlreadyOnList {
                list: kind.to_string(),
                user: user.to_owned(),
            });
        }
        Ok(())
    }

    fn remove_from_list(
        &mut self,
        owner: &str,
        kind: ListKind,
        user: &str,
    ) -> Result<(), StoreError> {
        let account = self
            .accounts
            .get_mut(owner)
            .ok_or_else(|| StoreError::UserNotFound(owner.to_owned()))?;
        if !Self::list_of(account, kind).remove(user) {
            return Err(StoreError::NotOnList {
                list: kind.to_string(),
                user: user.to_owned(),
            });
        }
        Ok(())
    }

    fn deck_tree(&self, owner: &str) -> DeckDir {
        match self.deck_trees.get(owner) {
            Some(root) => root.to_listing(),
            None => DirNode::root().to_listing(),
        }
    }

    fn deck_new_dir(&mut self, owner: &str, path: &str, name: &str) -> Result<(), StoreError> {
        Self::validate_name(name)?;
        let id = self.next_dir_id;
        let root = self
            .deck_trees
            .entry(owner.to_owned())
            .or_insert_with(DirNode::root);
        let parent = Self::resolve_mut(root, path)?;
        if parent.dirs.iter().any(|d| d.name == name) {
            return Err(StoreError::FolderExists(name.to_owned()));
        }
        parent.dirs.push(DirNode {
            id,
            name: name.to_owned(),
            dirs: Vec::new(),
            files: Vec::new(),
        });
        self.next_dir_id += 1;
        Ok(())
    }

    fn deck_del_dir(&mut self, owner: &str, path: &str) -> Result<(), StoreError> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(StoreError::RootFolder);
        }
        let (parent_path, name) = match trimmed.rsplit_once('/') {
            Some((parent, name)) => (parent, name),
            None => ("", trimmed),
        };
        let root = self
            .deck_trees
            .get_mut(owner)
            .ok_or_else(|| StoreError::FolderNotFound(path.to_owned()))?;
        let parent = Self::resolve_mut(root, parent_path)?;
        let pos = parent
            .dirs
            .iter()
            .position(|d| d.name == name)
            .ok_or_else(|| StoreError::FolderNotFound(path.to_owned()))?;
        parent.dirs.remove(pos);
        Ok(())
    }

    fn deck_delete(&mut self, owner: &str, deck_id: u64) -> Result<(), StoreError> {
        let root = self
            .deck_trees
            .get_mut(owner)
            .ok_or(StoreError::DeckNotFound(deck_id))?;
        if root.remove_deck(deck_id) {
            Ok(())
        } else {
            Err(StoreError::DeckNotFound(deck_id))
        }
    }

    fn deck_upload(
        &mut self,
        owner: &str,
        path: &str,
        name: &str,
        content: &str,
    ) -> Result<DeckFile, StoreError> {
        Self::validate_name(name)?;
        let id = self.next_deck_id;
        let uploaded_at = Self::unix_now();
        let root = self
            .deck_trees
            .entry(owner.to_owned())
            .or_insert_with(DirNode::root);
        let dir = Self::resolve_mut(root, path)?;
        dir.files.push(DeckRecord {
            id,
            name: name.to_owned(),
            content: content.to_owned(),
            uploaded_at,
        });
        self.next_deck_id += 1;
        Ok(DeckFile {
            id,
            name: name.to_owned(),
            uploaded_at,
        })
    }

    fn deck_download(&self, owner: &str, deck_id: u64) -> Result<StoredDeck, StoreError> {
        let record = self
            .deck_trees
            .get(owner)
            .and_then(|root| root.find_deck(deck_id))
            .ok_or(StoreError::DeckNotFound(deck_id))?;
        Ok(StoredDeck {
            id: record.id,
            name: record.name.clone(),
            content: record.content.clone(),
            uploaded_at: record.uploaded_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_users() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.add_account("alice", "pw-a", UserLevel::Registered);
        store.add_account("bob", "pw-b", UserLevel::Registered);
        store.add_account("mod", "pw-m", UserLevel::Moderator);
        store
    }

    // -- authentication ------------------------------------------------

    #[test]
    fn test_authenticate_known_user_returns_level() {
        let mut store = store_with_users();
        assert_eq!(
            store.authenticate("mod", "pw-m").unwrap(),
            UserLevel::Moderator
        );
    }

    #[test]
    fn test_authenticate_wrong_password_fails() {
        let mut store = store_with_users();
        assert_eq!(
            store.authenticate("alice", "nope"),
            Err(StoreError::WrongPassword("alice".into()))
        );
    }

    #[test]
    fn test_unknown_name_logs_in_as_guest() {
        let mut store = store_with_users();
        assert_eq!(
            store.authenticate("wanderer", "").unwrap(),
            UserLevel::Guest
        );
    }

    #[test]
    fn test_guest_login_refused_when_registration_required() {
        let mut store = store_with_users().require_registration();
        assert_eq!(
            store.authenticate("wanderer", ""),
            Err(StoreError::UserNotFound("wanderer".into()))
        );
    }

    #[test]
    fn test_banned_name_cannot_authenticate() {
        let mut store = store_with_users();
        store.add_ban("alice", "", 0, "rude");
        assert_eq!(
            store.authenticate("alice", "pw-a"),
            Err(StoreError::Banned { reason: "rude".into() })
        );
    }

    #[test]
    fn test_ban_matches_by_address_too() {
        let mut store = store_with_users();
        store.add_ban("", "10.0.0.9", 0, "proxy");
        assert_eq!(store.active_ban("anyone", "10.0.0.9"), Some("proxy".into()));
        assert_eq!(store.active_ban("anyone", "10.0.0.8"), None);
    }

    // -- buddy/ignore lists ---------------------------------------------

    #[test]
    fn test_add_to_list_then_members() {
        let mut store = store_with_users();
        store.add_to_list("alice", ListKind::Buddy, "bob").unwrap();
        assert_eq!(store.list_members("alice", ListKind::Buddy), vec!["bob"]);
        assert!(store.list_members("alice", ListKind::Ignore).is_empty());
    }

    #[test]
    fn test_duplicate_list_add_errors_but_leaves_one_entry() {
        let mut store = store_with_users();
        store.add_to_list("alice", ListKind::Ignore, "bob").unwrap();
        let err = store.add_to_list("alice", ListKind::Ignore, "bob").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyOnList { .. }));
        assert_eq!(store.list_members("alice", ListKind::Ignore), vec!["bob"]);
    }

    #[test]
    fn test_cannot_add_self_to_list() {
        let mut store = store_with_users();
        assert_eq!(
            store.add_to_list("alice", ListKind::Buddy, "alice"),
            Err(StoreError::SelfReference)
        );
    }

    #[test]
    fn test_add_unknown_target_fails() {
        let mut store = store_with_users();
        assert_eq!(
            store.add_to_list("alice", ListKind::Buddy, "nobody"),
            Err(StoreError::UserNotFound("nobody".into()))
        );
    }

    #[test]
    fn test_remove_user_not_on_list_fails() {
        let mut store = store_with_users();
        let err = store
            .remove_from_list("alice", ListKind::Buddy, "bob")
            .unwrap_err();
        assert!(matches!(err, StoreError::NotOnList { .. }));
    }

    // -- deck tree -------------------------------------------------------

    #[test]
    fn test_new_dir_and_nested_path_resolution() {
        let mut store = store_with_users();
        store.deck_new_dir("alice", "", "Standard").unwrap();
        store.deck_new_dir("alice", "Standard", "Aggro").unwrap();
        let tree = store.deck_tree("alice");
        assert_eq!(tree.id, 0);
        assert_eq!(tree.dirs.len(), 1);
        assert_eq!(tree.dirs[0].name, "Standard");
        assert_eq!(tree.dirs[0].dirs[0].name, "Aggro");
    }

    #[test]
    fn test_new_dir_under_missing_path_fails() {
        let mut store = store_with_users();
        assert_eq!(
            store.deck_new_dir("alice", "NoSuch", "Sub"),
            Err(StoreError::FolderNotFound("NoSuch".into()))
        );
    }

    #[test]
    fn test_duplicate_sibling_dir_fails() {
        let mut store = store_with_users();
        store.deck_new_dir("alice", "", "Standard").unwrap();
        assert_eq!(
            store.deck_new_dir("alice", "", "Standard"),
            Err(StoreError::FolderExists("Standard".into()))
        );
    }

    #[test]
    fn test_cannot_delete_root_dir() {
        let mut store = store_with_users();
        assert_eq!(store.deck_del_dir("alice", ""), Err(StoreError::RootFolder));
        assert_eq!(store.deck_del_dir("alice", "/"), Err(StoreError::RootFolder));
    }

    #[test]
    fn test_del_dir_removes_subtree() {
        let mut store = store_with_users();
        store.deck_new_dir("alice", "", "Standard").unwrap();
        store.deck_new_dir("alice", "Standard", "Aggro").unwrap();
        let deck = store
            .deck_upload("alice", "Standard/Aggro", "Burn", "4 Bolt")
            .unwrap();
        store.deck_del_dir("alice", "Standard").unwrap();
        assert!(store.deck_tree("alice").dirs.is_empty());
        assert_eq!(
            store.deck_download("alice", deck.id),
            Err(StoreError::DeckNotFound(deck.id))
        );
    }

    #[test]
    fn test_upload_download_round_trip() {
        let mut store = store_with_users();
        let deck = store.deck_upload("alice", "", "Burn", "4 Bolt").unwrap();
        let fetched = store.deck_download("alice", deck.id).unwrap();
        assert_eq!(fetched.name, "Burn");
        assert_eq!(fetched.content, "4 Bolt");
    }

    #[test]
    fn test_decks_are_scoped_to_owner() {
        let mut store = store_with_users();
        let deck = store.deck_upload("alice", "", "Burn", "4 Bolt").unwrap();
        assert_eq!(
            store.deck_download("bob", deck.id),
            Err(StoreError::DeckNotFound(deck.id))
        );
    }

    #[test]
    fn test_deck_delete_by_id() {
        let mut store = store_with_users();
        store.deck_new_dir("alice", "", "Old").unwrap();
        let deck = store.deck_upload("alice", "Old", "Relic", "60 cards").unwrap();
        store.deck_delete("alice", deck.id).unwrap();
        assert_eq!(
            store.deck_delete("alice", deck.id),
            Err(StoreError::DeckNotFound(deck.id))
        );
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut store = store_with_users();
        assert!(matches!(
            store.deck_new_dir("alice", "", ""),
            Err(StoreError::InvalidName(_))
        ));
        assert!(matches!(
            store.deck_upload("alice", "", "a/b", "x"),
            Err(StoreError::InvalidName(_))
        ));
    }
}
