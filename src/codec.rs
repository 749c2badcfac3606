//! Container encode/decode.
//!
//! [`Codec`] is the seam between the credential store and the container
//! format. [`EnvelopeCodec`] is the bundled implementation: a JSON envelope
//! whose payload is the serialized group tree, encrypted with the selected
//! outer cipher under an Argon2id-derived key.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::{self, NONCE_LEN, ProtectedValue, ProtectionKey, SealedValue};
use crate::entry::{
    EntryRecord, FIELD_NOTES, FIELD_PASSWORD, FIELD_TITLE, FIELD_URL, FIELD_USERNAME,
};
use crate::error::{Result, VaultError};
use crate::policy::{Cipher, EncryptionSettings};
use crate::storage::{self, EncryptedStore, STORE_VERSION};
use crate::tree::{GroupId, Tree};

/// Everything a codec recovers from a container.
pub struct DecodedDatabase {
    pub tree: Tree,
    pub settings: EncryptionSettings,
    /// Key the entry secrets in `tree` are sealed under.
    pub protection: ProtectionKey,
}

pub trait Codec {
    /// Parses and decrypts a container. Entry secrets come back sealed.
    fn decode(&self, reader: &mut dyn Read, password: &str) -> Result<DecodedDatabase>;

    /// Serializes and encrypts `tree` with `settings`.
    fn encode(
        &self,
        tree: &Tree,
        settings: &EncryptionSettings,
        protection: &ProtectionKey,
        password: &str,
        writer: &mut dyn Write,
    ) -> Result<()>;
}

/// Inner payload. Groups are a flat pre-order list; each one names its
/// parent by index, and a parent always comes before its children.
#[derive(Serialize, Deserialize)]
struct Payload {
    #[serde(rename = "ProtectionKey")]
    protection_key: String,
    #[serde(rename = "Group", default)]
    groups: Vec<PayloadGroup>,
}

#[derive(Serialize, Deserialize)]
struct PayloadGroup {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Parent", default, skip_serializing_if = "Option::is_none")]
    parent: Option<usize>,
    #[serde(rename = "Entry", default)]
    entries: Vec<PayloadEntry>,
}

#[derive(Serialize, Deserialize)]
struct PayloadEntry {
    #[serde(rename = "String", default)]
    fields: Vec<PayloadField>,
}

#[derive(Serialize, Deserialize)]
struct PayloadField {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Value")]
    value: String,
    #[serde(rename = "Protected", default, skip_serializing_if = "is_false")]
    protected: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl PayloadField {
    fn plain(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            protected: false,
        }
    }
}

/// The bundled codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvelopeCodec;

impl EnvelopeCodec {
    fn tree_to_payload(tree: &Tree, protection: &ProtectionKey) -> Result<Vec<PayloadGroup>> {
        let order = tree.walk();
        let mut index_of = HashMap::with_capacity(order.len());
        let mut groups = Vec::with_capacity(order.len());

        for (id, _) in order {
            let Some(node) = tree.group(id) else { continue };
            let parent = match node.parent() {
                Some(p) => Some(*index_of.get(&p).ok_or_else(|| {
                    VaultError::Validation("group listed before its parent".into())
                })?),
                None => None,
            };

            let mut entries = Vec::with_capacity(node.entries().len());
            for entry in node.entries() {
                entries.push(entry_to_payload(entry, protection)?);
            }

            index_of.insert(id, groups.len());
            groups.push(PayloadGroup {
                name: node.name().to_string(),
                parent,
                entries,
            });
        }
        Ok(groups)
    }

    fn payload_to_tree(groups: Vec<PayloadGroup>) -> Result<Tree> {
        let mut tree = Tree::empty();
        let mut ids: Vec<GroupId> = Vec::with_capacity(groups.len());

        for (index, group) in groups.into_iter().enumerate() {
            let id = match (index, group.parent) {
                (0, None) => tree.set_root(group.name),
                (0, Some(_)) => {
                    return Err(VaultError::Format("first group must be the root".into()));
                }
                (_, None) => {
                    return Err(VaultError::Format(format!("group {index} has no parent")));
                }
                (_, Some(parent)) => {
                    let parent_id = ids.get(parent).copied().ok_or_else(|| {
                        VaultError::Format(format!(
                            "group {index} refers to parent {parent} that does not precede it"
                        ))
                    })?;
                    tree.add_group(parent_id, group.name)?
                }
            };
            for entry in group.entries {
                tree.push_entry(id, entry_from_payload(entry)?)?;
            }
            ids.push(id);
        }
        Ok(tree)
    }
}

fn entry_to_payload(entry: &EntryRecord, protection: &ProtectionKey) -> Result<PayloadEntry> {
    let sealed = entry.password.seal(protection)?;
    let mut blob = Vec::with_capacity(NONCE_LEN + sealed.data.len());
    blob.extend_from_slice(&sealed.nonce);
    blob.extend_from_slice(&sealed.data);

    Ok(PayloadEntry {
        fields: vec![
            PayloadField::plain(FIELD_TITLE, &entry.title),
            PayloadField::plain(FIELD_USERNAME, &entry.username),
            PayloadField {
                key: FIELD_PASSWORD.to_string(),
                value: storage::encode_b64(&blob),
                protected: true,
            },
            PayloadField::plain(FIELD_URL, &entry.url),
            PayloadField::plain(FIELD_NOTES, &entry.notes),
        ],
    })
}

/// Validates an entry's key/value fields once, at the format boundary.
fn entry_from_payload(entry: PayloadEntry) -> Result<EntryRecord> {
    let mut record = EntryRecord::new("", "", "", "", "");
    for mut field in entry.fields {
        match field.key.as_str() {
            FIELD_TITLE => record.title = std::mem::take(&mut field.value),
            FIELD_USERNAME => record.username = std::mem::take(&mut field.value),
            FIELD_URL => record.url = std::mem::take(&mut field.value),
            FIELD_NOTES => record.notes = std::mem::take(&mut field.value),
            FIELD_PASSWORD if field.protected => {
                let blob = storage::decode_b64(&field.value)?;
                if blob.len() < NONCE_LEN {
                    return Err(VaultError::Format("protected value is truncated".into()));
                }
                let (nonce, data) = blob.split_at(NONCE_LEN);
                let mut nonce_bytes = [0u8; NONCE_LEN];
                nonce_bytes.copy_from_slice(nonce);
                record.password = ProtectedValue::Sealed(SealedValue {
                    nonce: nonce_bytes,
                    data: data.to_vec(),
                });
            }
            FIELD_PASSWORD => {
                record.password = ProtectedValue::new(std::mem::take(&mut field.value));
            }
            other => log::debug!("Ignoring unsupported entry field '{}'", other),
        }
        field.value.zeroize();
    }
    Ok(record)
}

impl Codec for EnvelopeCodec {
    fn decode(&self, reader: &mut dyn Read, password: &str) -> Result<DecodedDatabase> {
        let store = storage::read_store(reader)?;
        let cipher: Cipher = store.cipher.parse()?;
        let salt = storage::decode_b64(&store.argon2_salt)?;
        let nonce = storage::decode_fixed::<NONCE_LEN>(&store.encryption_nonce, "nonce")?;
        let encrypted = storage::decode_b64(&store.encrypted_data)?;

        let key = crypto::derive_key(password, &salt, &store.kdf).map_err(|e| match e {
            VaultError::Validation(msg) => VaultError::Format(msg),
            other => other,
        })?;
        let plaintext = Zeroizing::new(crypto::decrypt(cipher, &encrypted, &key, &nonce)?);

        let mut payload: Payload = serde_json::from_slice(&plaintext)?;
        let protection = ProtectionKey::from_bytes(&Zeroizing::new(storage::decode_b64(
            &payload.protection_key,
        )?))?;
        payload.protection_key.zeroize();

        let tree = Self::payload_to_tree(std::mem::take(&mut payload.groups))?;

        log::debug!(
            "Decoded {} groups and {} entries",
            tree.group_count(),
            tree.entry_count()
        );

        Ok(DecodedDatabase {
            tree,
            settings: EncryptionSettings {
                cipher,
                kdf: store.kdf,
            },
            protection,
        })
    }

    fn encode(
        &self,
        tree: &Tree,
        settings: &EncryptionSettings,
        protection: &ProtectionKey,
        password: &str,
        writer: &mut dyn Write,
    ) -> Result<()> {
        let mut payload = Payload {
            protection_key: storage::encode_b64(protection.as_bytes()),
            groups: Self::tree_to_payload(tree, protection)?,
        };
        let json = serde_json::to_vec(&payload)
            .map_err(|e| VaultError::Crypto(format!("failed to serialize payload: {e}")));
        payload.protection_key.zeroize();
        let plaintext = Zeroizing::new(json?);

        let salt = crypto::generate_salt()?;
        let nonce = crypto::generate_nonce()?;
        let key = crypto::derive_key(password, &salt, &settings.kdf)?;
        let encrypted = crypto::encrypt(settings.cipher, &plaintext, &key, &nonce)?;

        let store = EncryptedStore {
            version: STORE_VERSION,
            cipher: settings.cipher.as_str().to_string(),
            kdf: settings.kdf,
            argon2_salt: storage::encode_b64(&salt),
            encryption_nonce: storage::encode_b64(&nonce),
            encrypted_data: storage::encode_b64(&encrypted),
        };
        storage::write_store(writer, &store)
    }
}
