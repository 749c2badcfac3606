//! Credential entries.

use std::fmt;
use zeroize::Zeroizing;

use crate::crypto::ProtectedValue;

/// Field identifiers used by the container format.
pub const FIELD_TITLE: &str = "Title";
pub const FIELD_USERNAME: &str = "UserName";
pub const FIELD_PASSWORD: &str = "Password";
pub const FIELD_URL: &str = "URL";
pub const FIELD_NOTES: &str = "Notes";

/// An entry as stored in the tree. The password stays protected whenever
/// the owning database is locked.
#[derive(Debug)]
pub struct EntryRecord {
    pub title: String,
    pub username: String,
    pub password: ProtectedValue,
    pub url: String,
    pub notes: String,
}

impl EntryRecord {
    pub fn new(
        title: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        url: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            username: username.into(),
            password: ProtectedValue::new(password),
            url: url.into(),
            notes: notes.into(),
        }
    }

    /// Read-only copy with the containing group's path attached.
    pub fn snapshot(&self, group_path: &str) -> Entry {
        Entry {
            title: self.title.clone(),
            username: self.username.clone(),
            password: self
                .password
                .reveal()
                .map(|p| Zeroizing::new(p.to_string())),
            url: self.url.clone(),
            notes: self.notes.clone(),
            group_path: group_path.to_string(),
        }
    }
}

/// A credential as handed to callers by traversal.
///
/// `group_path` is computed during traversal and is never used to navigate
/// the tree.
#[derive(Clone, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    pub username: String,
    password: Option<Zeroizing<String>>,
    pub url: String,
    pub notes: String,
    pub group_path: String,
}

impl Entry {
    /// The password, or `None` while the database is locked.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().map(String::as_str)
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("title", &self.title)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("url", &self.url)
            .field("notes", &self.notes)
            .field("group_path", &self.group_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ProtectionKey;

    #[test]
    fn test_snapshot_copies_fields() {
        let record = EntryRecord::new("GitHub", "octo", "pw", "https://github.com", "2fa on");
        let entry = record.snapshot("Work / Dev");

        assert_eq!(entry.title, "GitHub");
        assert_eq!(entry.username, "octo");
        assert_eq!(entry.password(), Some("pw"));
        assert_eq!(entry.url, "https://github.com");
        assert_eq!(entry.notes, "2fa on");
        assert_eq!(entry.group_path, "Work / Dev");
    }

    #[test]
    fn test_snapshot_of_locked_record_hides_password() {
        let key = ProtectionKey::generate().unwrap();
        let mut record = EntryRecord::new("t", "u", "pw", "", "");
        record.password.lock(&key).unwrap();

        let entry = record.snapshot("");
        assert_eq!(entry.password(), None);
        assert_eq!(entry.title, "t");
    }

    #[test]
    fn test_entry_debug_masks_password() {
        let entry = EntryRecord::new("t", "u", "hunter2", "", "").snapshot("");
        assert!(!format!("{:?}", entry).contains("hunter2"));
    }
}
