//! Archive model: a named storage directory guarded by credentials.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A username/password pair allowed to submit URLs to an archive.
///
/// Passwords are stored and compared in cleartext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// A named collection with its own storage directory and credential set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Archive {
    pub name: String,
    /// Directory holding one physical file per canonical file id.
    pub storage: PathBuf,
    #[serde(default, alias = "Users")]
    pub users: Vec<Credential>,
}

impl Archive {
    pub fn new(name: impl Into<String>, storage: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            storage: storage.into(),
            users: Vec::new(),
        }
    }

    /// Add a credential pair.
    pub fn with_user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.push(Credential::new(username, password));
        self
    }

    /// Storage directory for this archive.
    pub fn storage_dir(&self) -> &Path {
        &self.storage
    }

    /// Path of the physical file owned by `file_id`.
    pub fn file_path(&self, file_id: &str) -> PathBuf {
        self.storage.join(file_id)
    }

    /// Check a username/password pair against every configured credential.
    pub fn accepts(&self, username: &str, password: &str) -> bool {
        self.users
            .iter()
            .any(|u| u.username == username && u.password == password)
    }
}

/// Archives keyed by name, built once at startup and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct ArchiveSet {
    archives: HashMap<String, Archive>,
}

impl ArchiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from archives, failing with the first duplicated name.
    pub fn from_archives(archives: impl IntoIterator<Item = Archive>) -> Result<Self, String> {
        let mut set = Self::new();
        for archive in archives {
            if set.archives.contains_key(&archive.name) {
                return Err(archive.name);
            }
            set.archives.insert(archive.name.clone(), archive);
        }
        Ok(set)
    }

    pub fn get(&self, name: &str) -> Option<&Archive> {
        self.archives.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Archive> {
        self.archives.values()
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }
}
