//! Encryption policy: which ciphers and KDF strengths a save may use.
//!
//! The policy is an immutable value. [`crate::Database::save_with_policy`]
//! validates every request against it before touching the filesystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use zeroize::Zeroizing;

use crate::error::{Result, VaultError};

/// Recommended Argon2id pass count.
pub const RECOMMENDED_ITERATIONS: u32 = 10;
/// Recommended Argon2id memory cost in KiB (1 GiB).
pub const RECOMMENDED_MEMORY_KIB: u32 = 1_048_576;
/// Recommended Argon2id lane count.
pub const RECOMMENDED_PARALLELISM: u32 = 4;

/// Highest pass count a container may ask for.
pub const MAX_ITERATIONS: u32 = 100;
/// Highest memory cost a container may ask for, in KiB (4 GiB).
pub const MAX_MEMORY_KIB: u32 = 4_194_304;
/// Highest lane count a container may ask for.
pub const MAX_PARALLELISM: u32 = 64;

/// Outer ciphers known to the container format.
///
/// `Twofish` can appear in files written by other tools but is never
/// accepted for writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cipher {
    Aes256,
    ChaCha20,
    Twofish,
}

impl Cipher {
    /// Canonical identifier stored in the container header.
    pub const fn as_str(self) -> &'static str {
        match self {
            Cipher::Aes256 => "AES-256",
            Cipher::ChaCha20 => "ChaCha20",
            Cipher::Twofish => "Twofish",
        }
    }
}

impl fmt::Display for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cipher {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AES-256" => Ok(Cipher::Aes256),
            "ChaCha20" => Ok(Cipher::ChaCha20),
            "Twofish" => Ok(Cipher::Twofish),
            other => Err(VaultError::Format(format!("unknown cipher '{other}'"))),
        }
    }
}

/// The closed allow-list of modern ciphers.
pub const MODERN_CIPHERS: [Cipher; 2] = [Cipher::Aes256, Cipher::ChaCha20];

/// Returns `true` if the identifier names an allowed cipher.
pub fn is_modern_cipher(id: &str) -> bool {
    id.parse::<Cipher>()
        .map(|c| MODERN_CIPHERS.contains(&c))
        .unwrap_or(false)
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub iterations: u32,
    pub memory_kib: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: RECOMMENDED_ITERATIONS,
            memory_kib: RECOMMENDED_MEMORY_KIB,
            parallelism: RECOMMENDED_PARALLELISM,
        }
    }
}

impl KdfParams {
    /// `true` if any cost is above the `MAX_*` ceilings. The envelope header
    /// is not authenticated, so these are checked before any derivation.
    pub fn exceeds_limits(&self) -> bool {
        self.iterations > MAX_ITERATIONS
            || self.memory_kib > MAX_MEMORY_KIB
            || self.parallelism > MAX_PARALLELISM
    }
}

/// Cipher and KDF currently applied to a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionSettings {
    pub cipher: Cipher,
    pub kdf: KdfParams,
}

impl Default for EncryptionSettings {
    fn default() -> Self {
        Self {
            cipher: Cipher::ChaCha20,
            kdf: KdfParams::default(),
        }
    }
}

/// Parameters for creating or saving a database.
#[derive(Clone)]
pub struct SaveOptions {
    pub path: PathBuf,
    pub password: Zeroizing<String>,
    pub cipher: Cipher,
    pub kdf: KdfParams,
}

impl SaveOptions {
    /// Options with the recommended defaults: ChaCha20 and Argon2id at
    /// 10 passes, 1 GiB, 4 lanes.
    pub fn new(path: impl Into<PathBuf>, password: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            password: Zeroizing::new(password.into()),
            cipher: Cipher::ChaCha20,
            kdf: KdfParams::default(),
        }
    }

    /// Replaces the outer cipher. Policy is checked at save time, not here.
    pub fn with_cipher(mut self, cipher: Cipher) -> Self {
        self.cipher = cipher;
        self
    }

    /// Replaces the Argon2id cost parameters.
    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// The cipher and KDF part of the options.
    pub fn settings(&self) -> EncryptionSettings {
        EncryptionSettings {
            cipher: self.cipher,
            kdf: self.kdf,
        }
    }
}

impl fmt::Debug for SaveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveOptions")
            .field("path", &self.path)
            .field("password", &"***")
            .field("cipher", &self.cipher)
            .field("kdf", &self.kdf)
            .finish()
    }
}

/// Allow-list of ciphers plus floors for the KDF cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionPolicy {
    ciphers: Vec<Cipher>,
    minimums: KdfParams,
}

impl Default for EncryptionPolicy {
    fn default() -> Self {
        Self {
            ciphers: MODERN_CIPHERS.to_vec(),
            minimums: KdfParams::default(),
        }
    }
}

impl EncryptionPolicy {
    /// Same cipher allow-list with custom KDF floors.
    ///
    /// Lowering the floors is meant for tests and memory-constrained hosts;
    /// the cipher allow-list cannot be changed.
    pub fn with_minimums(minimums: KdfParams) -> Self {
        Self {
            minimums,
            ..Self::default()
        }
    }

    /// KDF floors a save must meet.
    pub fn minimums(&self) -> KdfParams {
        self.minimums
    }

    /// Whether `cipher` is on the allow-list.
    pub fn allows(&self, cipher: Cipher) -> bool {
        self.ciphers.contains(&cipher)
    }

    /// Checks a save request. Cipher membership is checked first, then the
    /// KDF floors, then the `MAX_*` ceilings.
    pub fn validate(&self, options: &SaveOptions) -> Result<()> {
        if !self.allows(options.cipher) {
            return Err(VaultError::CipherPolicy(format!(
                "cipher {} is not allowed, use AES-256 or ChaCha20",
                options.cipher
            )));
        }

        let floor = &self.minimums;
        let kdf = &options.kdf;
        if kdf.iterations < floor.iterations
            || kdf.memory_kib < floor.memory_kib
            || kdf.parallelism < floor.parallelism
        {
            return Err(VaultError::CipherPolicy(format!(
                "KDF parameters below policy minimums (iterations >= {}, memory >= {} KiB, parallelism >= {})",
                floor.iterations, floor.memory_kib, floor.parallelism
            )));
        }
        if kdf.exceeds_limits() {
            return Err(VaultError::CipherPolicy(format!(
                "KDF parameters above supported maximums (iterations <= {MAX_ITERATIONS}, memory <= {MAX_MEMORY_KIB} KiB, parallelism <= {MAX_PARALLELISM})"
            )));
        }

        Ok(())
    }
}
