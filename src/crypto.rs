//! Key derivation, authenticated encryption and in-memory field protection.

use aes_gcm::Aes256Gcm;
use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::{TryRngCore, rngs::OsRng};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Result, VaultError};
use crate::policy::{Cipher, KdfParams};

pub const KEY_LEN: usize = 32;
pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;

pub fn derive_key(
    password: &str,
    salt: &[u8],
    kdf: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let params = Params::new(kdf.memory_kib, kdf.iterations, kdf.parallelism, Some(KEY_LEN))
        .map_err(|e| VaultError::Validation(format!("invalid Argon2id parameters: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut *key)
        .map_err(|e| VaultError::Validation(format!("Argon2id key derivation failed: {e}")))?;
    Ok(key)
}

pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| VaultError::Crypto(format!("OS RNG failure: {e}")))?;
    Ok(salt)
}

pub fn generate_nonce() -> Result<[u8; NONCE_LEN]> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| VaultError::Crypto(format!("OS RNG failure: {e}")))?;
    Ok(nonce)
}

/// Encrypts `data` with the given outer cipher. The tag is appended.
pub fn encrypt(
    cipher: Cipher,
    data: &[u8],
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    match cipher {
        Cipher::ChaCha20 => ChaCha20Poly1305::new(key.into())
            .encrypt(Nonce::from_slice(nonce), data)
            .map_err(|_| VaultError::Crypto("ChaCha20-Poly1305 encryption failed".into())),
        Cipher::Aes256 => {
            let aes = Aes256Gcm::new_from_slice(key)
                .map_err(|e| VaultError::Crypto(format!("invalid AES key: {e}")))?;
            aes.encrypt(aes_gcm::Nonce::from_slice(nonce), data)
                .map_err(|_| VaultError::Crypto("AES-256-GCM encryption failed".into()))
        }
        Cipher::Twofish => Err(VaultError::CipherPolicy(
            "Twofish is not supported for encryption".into(),
        )),
    }
}

/// Decrypts and authenticates. Any tag mismatch is reported as
/// [`VaultError::Decryption`].
pub fn decrypt(
    cipher: Cipher,
    encrypted: &[u8],
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    match cipher {
        Cipher::ChaCha20 => ChaCha20Poly1305::new(key.into())
            .decrypt(Nonce::from_slice(nonce), encrypted)
            .map_err(|_| VaultError::Decryption),
        Cipher::Aes256 => {
            let aes = Aes256Gcm::new_from_slice(key)
                .map_err(|e| VaultError::Crypto(format!("invalid AES key: {e}")))?;
            aes.decrypt(aes_gcm::Nonce::from_slice(nonce), encrypted)
                .map_err(|_| VaultError::Decryption)
        }
        Cipher::Twofish => Err(VaultError::Format(
            "Twofish containers are not supported".into(),
        )),
    }
}

/// Per-database key that protects secret fields while they sit in memory.
///
/// Stored inside the encrypted payload so a reopened database can unlock
/// the values it wrote.
pub struct ProtectionKey(Zeroizing<[u8; KEY_LEN]>);

impl ProtectionKey {
    pub fn generate() -> Result<Self> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        OsRng
            .try_fill_bytes(&mut *key)
            .map_err(|e| VaultError::Crypto(format!("OS RNG failure: {e}")))?;
        Ok(Self(key))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| VaultError::Format(format!("protection key must be {KEY_LEN} bytes")))?;
        Ok(Self(Zeroizing::new(array)))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// A secret in its protected form.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedValue {
    pub nonce: [u8; NONCE_LEN],
    pub data: Vec<u8>,
}

/// A secret field that is either readable or protected.
pub enum ProtectedValue {
    Plain(Zeroizing<String>),
    Sealed(SealedValue),
}

impl ProtectedValue {
    pub fn new(value: impl Into<String>) -> Self {
        ProtectedValue::Plain(Zeroizing::new(value.into()))
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, ProtectedValue::Sealed(_))
    }

    /// The plaintext, if the value is currently unlocked.
    pub fn reveal(&self) -> Option<&str> {
        match self {
            ProtectedValue::Plain(s) => Some(s.as_str()),
            ProtectedValue::Sealed(_) => None,
        }
    }

    /// Returns the protected form without changing `self`.
    pub fn seal(&self, key: &ProtectionKey) -> Result<SealedValue> {
        match self {
            ProtectedValue::Plain(s) => {
                let nonce = generate_nonce()?;
                let data = encrypt(Cipher::ChaCha20, s.as_bytes(), key.as_bytes(), &nonce)?;
                Ok(SealedValue { nonce, data })
            }
            ProtectedValue::Sealed(sealed) => Ok(sealed.clone()),
        }
    }

    /// Replaces the plaintext with its protected form. No-op when locked.
    pub fn lock(&mut self, key: &ProtectionKey) -> Result<()> {
        if let ProtectedValue::Plain(_) = self {
            let sealed = self.seal(key)?;
            *self = ProtectedValue::Sealed(sealed);
        }
        Ok(())
    }

    /// Restores the plaintext. No-op when already unlocked.
    pub fn unlock(&mut self, key: &ProtectionKey) -> Result<()> {
        if let ProtectedValue::Sealed(sealed) = self {
            let bytes = decrypt(Cipher::ChaCha20, &sealed.data, key.as_bytes(), &sealed.nonce)?;
            let plain = String::from_utf8(bytes).map_err(|e| {
                e.into_bytes().zeroize();
                VaultError::Format("protected value is not valid UTF-8".into())
            })?;
            *self = ProtectedValue::Plain(Zeroizing::new(plain));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProtectedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtectedValue::Plain(_) => f.write_str("ProtectedValue::Plain(***)"),
            ProtectedValue::Sealed(_) => f.write_str("ProtectedValue::Sealed(***)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_kdf() -> KdfParams {
        KdfParams {
            iterations: 1,
            memory_kib: 64,
            parallelism: 1,
        }
    }

    #[test]
    fn test_derive_key_is_deterministic() {
        let salt = [7u8; SALT_LEN];
        let a = derive_key("master", &salt, &light_kdf()).unwrap();
        let b = derive_key("master", &salt, &light_kdf()).unwrap();
        let c = derive_key("other", &salt, &light_kdf()).unwrap();
        assert_eq!(*a, *b);
        assert_ne!(*a, *c);
    }

    #[test]
    fn test_derive_key_rejects_invalid_params() {
        let salt = [7u8; SALT_LEN];
        let bad = KdfParams {
            iterations: 0,
            memory_kib: 64,
            parallelism: 1,
        };
        assert!(matches!(
            derive_key("master", &salt, &bad),
            Err(VaultError::Validation(_))
        ));
    }

    #[test]
    fn test_encrypt_decrypt_both_ciphers() {
        let key = [42u8; KEY_LEN];
        let nonce = generate_nonce().unwrap();
        for cipher in [Cipher::ChaCha20, Cipher::Aes256] {
            let ct = encrypt(cipher, b"payload", &key, &nonce).unwrap();
            assert_ne!(ct.as_slice(), b"payload");
            let pt = decrypt(cipher, &ct, &key, &nonce).unwrap();
            assert_eq!(pt, b"payload");
        }
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let nonce = generate_nonce().unwrap();
        let ct = encrypt(Cipher::Aes256, b"payload", &[1u8; KEY_LEN], &nonce).unwrap();
        assert!(matches!(
            decrypt(Cipher::Aes256, &ct, &[2u8; KEY_LEN], &nonce),
            Err(VaultError::Decryption)
        ));
    }

    #[test]
    fn test_twofish_is_refused() {
        let nonce = [0u8; NONCE_LEN];
        assert!(encrypt(Cipher::Twofish, b"x", &[0u8; KEY_LEN], &nonce).is_err());
    }

    #[test]
    fn test_protected_value_lock_unlock() {
        let key = ProtectionKey::generate().unwrap();
        let mut value = ProtectedValue::new("s3cret");
        assert_eq!(value.reveal(), Some("s3cret"));

        value.lock(&key).unwrap();
        assert!(value.is_locked());
        assert_eq!(value.reveal(), None);

        // locking twice keeps the same ciphertext
        let first = value.seal(&key).unwrap();
        value.lock(&key).unwrap();
        assert!(value.seal(&key).unwrap() == first);

        value.unlock(&key).unwrap();
        assert_eq!(value.reveal(), Some("s3cret"));
    }

    #[test]
    fn test_unlock_with_other_key_fails() {
        let key = ProtectionKey::generate().unwrap();
        let other = ProtectionKey::generate().unwrap();
        let mut value = ProtectedValue::new("s3cret");
        value.lock(&key).unwrap();
        assert!(matches!(value.unlock(&other), Err(VaultError::Decryption)));
    }

    #[test]
    fn test_protection_key_length_checked() {
        assert!(ProtectionKey::from_bytes(&[0u8; 16]).is_err());
        assert!(ProtectionKey::from_bytes(&[0u8; KEY_LEN]).is_ok());
    }

    #[test]
    fn test_debug_never_shows_secret() {
        let value = ProtectedValue::new("s3cret");
        assert!(!format!("{:?}", value).contains("s3cret"));
    }
}
