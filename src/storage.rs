//! On-disk envelope and atomic file replacement.

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{Result, VaultError};
use crate::policy::KdfParams;

/// Envelope format version written by this crate.
pub const STORE_VERSION: u8 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct EncryptedStore {
    pub version: u8,
    pub cipher: String,
    pub kdf: KdfParams,
    pub argon2_salt: String,      // Base64 encoded
    pub encryption_nonce: String, // Base64 encoded
    pub encrypted_data: String,   // Base64 encoded
}

pub fn read_store(reader: &mut dyn Read) -> Result<EncryptedStore> {
    let mut content = String::new();
    reader.read_to_string(&mut content).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            VaultError::Format("database file is not valid UTF-8".into())
        } else {
            VaultError::Io(e)
        }
    })?;
    if content.trim().is_empty() {
        return Err(VaultError::Format("database file is empty".into()));
    }
    let store: EncryptedStore = serde_json::from_str(&content)?;
    if store.version != STORE_VERSION {
        return Err(VaultError::Format(format!(
            "unsupported envelope version {}",
            store.version
        )));
    }
    if store.kdf.exceeds_limits() {
        return Err(VaultError::Format(format!(
            "KDF parameters out of range (iterations {}, memory {} KiB, parallelism {})",
            store.kdf.iterations, store.kdf.memory_kib, store.kdf.parallelism
        )));
    }
    Ok(store)
}

pub fn write_store(writer: &mut dyn Write, store: &EncryptedStore) -> Result<()> {
    let json = serde_json::to_string_pretty(store)
        .map_err(|e| VaultError::Crypto(format!("failed to serialize envelope: {e}")))?;
    writer.write_all(json.as_bytes())?;
    writer.flush()?;
    Ok(())
}

pub fn encode_b64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

pub fn decode_b64(encoded: &str) -> Result<Vec<u8>> {
    Ok(general_purpose::STANDARD.decode(encoded)?)
}

/// Decodes a base64 field that must have exactly `N` bytes.
pub fn decode_fixed<const N: usize>(encoded: &str, field: &str) -> Result<[u8; N]> {
    decode_b64(encoded)?
        .try_into()
        .map_err(|_| VaultError::Format(format!("{field} must be {N} bytes")))
}

/// Writes to a temporary file next to `path`, syncs it, then renames it over
/// `path`. If `write` fails the temporary file is removed and `path` is left
/// untouched.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;

    log::debug!("Atomically replaced {}", path.display());
    Ok(())
}
