//! # Persisted session record
//!
//! The only session state written to durable storage is the raw credential,
//! stored as `{"token": "<credential>"}` under [`SESSION_KEY`]. Identity, role
//! and expiry are always re-derived from the credential on restore, so a
//! persisted record can never disagree with the claims it carries.
//!
//! A record holding anything besides `token` is treated as corrupt.

use serde::{Deserialize, Serialize};

use crate::storage::{ClientStorage, StorageError};

/// Fixed storage key of the session record.
pub const SESSION_KEY: &str = "auth";

/// The persisted form of a session: the credential and nothing else.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionRecord {
    pub token: String,
}

impl std::fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecord")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl SessionRecord {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Read the record. `Ok(None)` when nothing is stored; an error when the
    /// stored value is not a well-formed record.
    pub fn load(storage: &dyn ClientStorage) -> Result<Option<Self>, StorageError> {
        let Some(raw) = storage.get(SESSION_KEY)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn save(&self, storage: &dyn ClientStorage) -> Result<(), StorageError> {
        let raw = serde_json::to_string(self)?;
        storage.set(SESSION_KEY, &raw)
    }

    pub fn clear(storage: &dyn ClientStorage) -> Result<(), StorageError> {
        storage.remove(SESSION_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;

    #[test]
    fn test_record_holds_only_token() {
        let storage = MemoryStorage::new();
        SessionRecord::new("h.p.s").save(&storage).unwrap();

        let raw = storage.entries().remove(SESSION_KEY).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(object["token"], "h.p.s");

        let loaded = SessionRecord::load(&storage).unwrap().unwrap();
        assert_eq!(loaded.token, "h.p.s");
    }

    #[test]
    fn test_extra_fields_are_corrupt() {
        let storage = MemoryStorage::new();
        storage
            .set(SESSION_KEY, r#"{"token":"h.p.s","role":"Admin"}"#)
            .unwrap();
        assert!(SessionRecord::load(&storage).is_err());
    }

    #[test]
    fn test_missing_and_garbage() {
        let storage = MemoryStorage::new();
        assert!(SessionRecord::load(&storage).unwrap().is_none());

        storage.set(SESSION_KEY, "not json").unwrap();
        assert!(matches!(
            SessionRecord::load(&storage),
            Err(StorageError::Serialization(_))
        ));

        SessionRecord::clear(&storage).unwrap();
        assert!(SessionRecord::load(&storage).unwrap().is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let record = SessionRecord::new("secret.token.value");
        assert!(!format!("{record:?}").contains("secret"));
    }
}
