//! The credential store.
//!
//! A [`Database`] owns the group tree, the master password and the current
//! encryption settings. Entry secrets stay unlocked while the database is
//! open and are sealed again by [`Database::close`].

use std::fs::File;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

use crate::codec::{Codec, EnvelopeCodec};
use crate::crypto::ProtectionKey;
use crate::entry::{Entry, EntryRecord};
use crate::error::{Result, VaultError};
use crate::log_timed;
use crate::policy::{EncryptionPolicy, EncryptionSettings, SaveOptions};
use crate::resolver;
use crate::tree::{Group, Tree};

/// Name given to the root group of a new database.
pub const ROOT_GROUP_NAME: &str = "Root";

/// Whether entry secrets are available in plaintext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Open,
    Locked,
}

pub struct Database {
    path: PathBuf,
    password: Zeroizing<String>,
    settings: EncryptionSettings,
    tree: Tree,
    protection: ProtectionKey,
    state: State,
    codec: Box<dyn Codec>,
}

impl Database {
    /// Opens an existing database with the bundled codec.
    pub fn open(path: impl AsRef<Path>, password: &str) -> Result<Self> {
        Self::open_with_codec(path, password, Box::new(EnvelopeCodec))
    }

    /// Reads and decodes `path`, then unlocks every entry secret.
    pub fn open_with_codec(
        path: impl AsRef<Path>,
        password: &str,
        codec: Box<dyn Codec>,
    ) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Opening database {}", path.display());

        let mut file = File::open(path)?;
        let decoded = log_timed!("decode", codec.decode(&mut file, password))?;

        let mut tree = decoded.tree;
        tree.unlock_all(&decoded.protection)?;

        log::info!(
            "Opened database with {} entries ({} cipher)",
            tree.entry_count(),
            decoded.settings.cipher
        );

        Ok(Self {
            path: path.to_path_buf(),
            password: Zeroizing::new(password.to_string()),
            settings: decoded.settings,
            tree,
            protection: decoded.protection,
            state: State::Open,
            codec,
        })
    }

    /// Builds an in-memory database with an empty root group. Nothing is
    /// written until [`Database::save`].
    pub fn create(options: &SaveOptions) -> Result<Self> {
        log::info!("Creating database for {}", options.path.display());
        Ok(Self {
            path: options.path.clone(),
            password: options.password.clone(),
            settings: options.settings(),
            tree: Tree::with_root(ROOT_GROUP_NAME),
            protection: ProtectionKey::generate()?,
            state: State::Open,
            codec: Box::new(EnvelopeCodec),
        })
    }

    /// Replaces the codec used by later saves.
    pub fn with_codec(mut self, codec: Box<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// File the database was opened from or last saved to.
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// Cipher and KDF of the file as last opened or saved.
    pub fn settings(&self) -> EncryptionSettings {
        self.settings
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// `true` after [`Database::close`].
    pub fn is_locked(&self) -> bool {
        self.state == State::Locked
    }

    pub fn entry_count(&self) -> usize {
        self.tree.entry_count()
    }

    /// Every entry in pre-order, each tagged with its group path.
    pub fn entries(&self) -> Vec<Entry> {
        self.tree.entries()
    }

    /// The group hierarchy, starting at the root.
    pub fn groups(&self) -> Vec<Group> {
        self.tree
            .root()
            .and_then(|root| self.tree.snapshot(root))
            .into_iter()
            .collect()
    }

    /// Snapshot of the group at `group_path`, if it exists.
    pub fn group(&self, group_path: &str) -> Option<Group> {
        resolver::find(&self.tree, group_path).and_then(|id| self.tree.snapshot(id))
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            State::Open => Ok(()),
            State::Locked => Err(VaultError::Locked),
        }
    }

    /// Appends an entry to the group at `group_path`, creating missing
    /// groups.
    pub fn add_entry(
        &mut self,
        group_path: &str,
        title: &str,
        username: &str,
        password: &str,
        url: &str,
        notes: &str,
    ) -> Result<()> {
        self.ensure_open()?;
        if self.tree.root().is_none() {
            return Err(VaultError::UninitializedDatabase);
        }

        let group = resolver::resolve(&mut self.tree, group_path)?;
        self.tree.push_entry(
            group,
            EntryRecord::new(title, username, password, url, notes),
        )?;
        log::info!("Added entry '{}' to '{}'", title, group_path);
        Ok(())
    }

    /// Removes the first entry titled `title` in the group at `group_path`.
    /// Returns `false` when there is no such entry.
    pub fn remove_entry(&mut self, group_path: &str, title: &str) -> Result<bool> {
        self.ensure_open()?;
        let Some(group) = resolver::find(&self.tree, group_path) else {
            return Ok(false);
        };
        let index = self
            .tree
            .group(group)
            .and_then(|g| g.entries().iter().position(|e| e.title == title));

        match index {
            Some(i) => {
                self.tree.take_entry(group, i)?;
                log::info!("Removed entry '{}' from '{}'", title, group_path);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes a group and everything below it.
    pub fn remove_group(&mut self, group_path: &str) -> Result<bool> {
        self.ensure_open()?;
        let Some(group) = resolver::find(&self.tree, group_path) else {
            return Ok(false);
        };
        self.tree.remove_group(group)?;
        log::info!("Removed group '{}'", group_path);
        Ok(true)
    }

    /// Saves under the default policy.
    pub fn save(&mut self, options: &SaveOptions) -> Result<()> {
        self.save_with_policy(options, &EncryptionPolicy::default())
    }

    /// Validates `options` against `policy`, then writes the database to
    /// `options.path` through a temporary file and an atomic rename.
    ///
    /// Nothing on disk changes if validation fails.
    pub fn save_with_policy(
        &mut self,
        options: &SaveOptions,
        policy: &EncryptionPolicy,
    ) -> Result<()> {
        self.ensure_open()?;
        if let Err(e) = policy.validate(options) {
            log::warn!("Save rejected by policy: {}", e);
            return Err(e);
        }

        let settings = options.settings();
        self.tree.lock_all(&self.protection)?;

        let codec = &self.codec;
        let tree = &self.tree;
        let protection = &self.protection;
        let written = log_timed!(
            "encode",
            crate::storage::write_atomically(&options.path, |w| {
                codec.encode(tree, &settings, protection, &options.password, w)
            })
        );

        // Saving leaves the database open either way.
        self.tree.unlock_all(&self.protection)?;
        written?;

        // Only a completed write changes what the database reports.
        self.settings = settings;
        self.path = options.path.clone();
        self.password = options.password.clone();
        log::info!(
            "Saved {} entries to {} ({})",
            self.tree.entry_count(),
            self.path.display(),
            self.settings.cipher
        );
        Ok(())
    }

    /// Options that rewrite the current file with the current password and
    /// settings.
    pub fn current_options(&self) -> SaveOptions {
        SaveOptions {
            path: self.path.clone(),
            password: self.password.clone(),
            cipher: self.settings.cipher,
            kdf: self.settings.kdf,
        }
    }

    /// Seals every entry secret. The tree itself is kept. Calling this again
    /// has no effect.
    pub fn close(&mut self) -> Result<()> {
        if self.state == State::Locked {
            return Ok(());
        }
        self.tree.lock_all(&self.protection)?;
        self.state = State::Locked;
        log::info!("Database locked");
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("settings", &self.settings)
            .field("state", &self.state)
            .field("entries", &self.tree.entry_count())
            .finish()
    }
}
