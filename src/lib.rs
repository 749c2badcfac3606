//! keepvault - an encrypted, hierarchical credential store.
//!
//! A [`Database`] holds a tree of groups and entries and is saved through a
//! [`Codec`] under an [`EncryptionPolicy`]. The crate also ships a password
//! generator with an entropy estimate, and the interactive shell used by the
//! `keepvault` binary.

pub mod codec;
pub mod config;
pub mod crypto;
pub mod database;
pub mod entropy;
pub mod entry;
pub mod error;
pub mod generator;
pub mod logging;
pub mod policy;
pub mod resolver;
pub mod shell;
pub mod storage;
pub mod tree;

pub use codec::{Codec, EnvelopeCodec};
pub use config::AppConfig;
pub use database::Database;
pub use entropy::{Strength, entropy};
pub use entry::Entry;
pub use error::{Result, VaultError};
pub use generator::{PasswordOptions, generate};
pub use logging::{LogConfig, init_logging};
pub use policy::{Cipher, EncryptionPolicy, KdfParams, SaveOptions, is_modern_cipher};
pub use shell::Shell;
pub use tree::Group;
