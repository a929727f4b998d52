// Settings store
//
// In-memory settings-record service implementing the backend contract in
// library form: CRUD over per-user settings records plus a dedicated
// increment operation for the replacement counters. The typed errors map
// 1:1 onto the HTTP status contract of a fronting transport.

use crate::models::{SettingsPatch, SettingsRecord};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// One field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn required(field: &'static str) -> Self {
        Self {
            field,
            message: format!("{field} is required"),
        }
    }
}

/// Errors surfaced by the settings store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The payload failed validation; carries one entry per bad field.
    #[error("invalid settings data ({} field errors)", .0.len())]
    Validation(Vec<FieldError>),

    /// No record with the given id.
    #[error("settings record not found")]
    NotFound,

    /// Unexpected storage failure; details stay internal.
    #[error("storage failure")]
    Storage,
}

impl StoreError {
    /// The HTTP status a transport layer should map this error to.
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::Validation(_) => 400,
            StoreError::NotFound => 404,
            StoreError::Storage => 500,
        }
    }
}

/// A settings record as stored: the user's settings plus derived counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSettings {
    pub id: u32,
    pub user_id: u32,
    pub settings: SettingsRecord,
    pub name_replacements: u64,
    pub pronoun_replacements: u64,
}

#[derive(Default)]
struct StoreInner {
    records: HashMap<u32, StoredSettings>,
    next_id: u32,
}

/// In-memory settings store.
pub struct SettingsStore {
    inner: Mutex<StoreInner>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                records: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Fetch the settings record for a user, if one exists.
    pub fn get_for_user(&self, user_id: u32) -> Option<StoredSettings> {
        let inner = self.inner.lock().unwrap();
        inner
            .records
            .values()
            .find(|record| record.user_id == user_id)
            .cloned()
    }

    /// Fetch a record by id.
    pub fn get(&self, id: u32) -> Result<StoredSettings, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.records.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    /// Create a new record. Derived counters start at zero.
    pub fn create(
        &self,
        user_id: u32,
        settings: SettingsRecord,
    ) -> Result<StoredSettings, StoreError> {
        let errors = validate(&settings);
        if !errors.is_empty() {
            return Err(StoreError::Validation(errors));
        }

        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;

        let record = StoredSettings {
            id,
            user_id,
            settings,
            name_replacements: 0,
            pronoun_replacements: 0,
        };
        inner.records.insert(id, record.clone());
        tracing::debug!("Created settings record {} for user {}", id, user_id);
        Ok(record)
    }

    /// Partially update a record; unset patch fields are left unchanged.
    pub fn update(&self, id: u32, patch: &SettingsPatch) -> Result<StoredSettings, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner.records.get_mut(&id).ok_or(StoreError::NotFound)?;
        patch.apply(&mut record.settings);
        Ok(record.clone())
    }

    /// Add non-negative deltas to a record's replacement counters.
    pub fn increment_counts(&self, id: u32, names: u64, pronouns: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner.records.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.name_replacements += names;
        record.pronoun_replacements += pronouns;
        Ok(())
    }

    /// Delete a record.
    pub fn delete(&self, id: u32) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.records.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a settings payload for creation. Field names match the record's
/// wire shape.
fn validate(settings: &SettingsRecord) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if settings.deadname.trim().is_empty() {
        errors.push(FieldError::required("deadname"));
    }
    if settings.preferred_name.trim().is_empty() {
        errors.push(FieldError::required("preferredName"));
    }
    if settings.old_pronouns.trim().is_empty() {
        errors.push(FieldError::required("oldPronouns"));
    }
    if settings.new_pronouns.trim().is_empty() {
        errors.push(FieldError::required("newPronouns"));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> SettingsRecord {
        SettingsRecord {
            deadname: "Alex".to_string(),
            preferred_name: "Sam".to_string(),
            ..SettingsRecord::default()
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = SettingsStore::new();
        let created = store.create(7, valid_settings()).unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(created.user_id, 7);
        assert_eq!(created.name_replacements, 0);

        assert_eq!(store.get(created.id).unwrap(), created);
        assert_eq!(store.get_for_user(7).unwrap(), created);
        assert!(store.get_for_user(8).is_none());
    }

    #[test]
    fn test_create_validates_required_fields() {
        let store = SettingsStore::new();
        let err = store.create(1, SettingsRecord::default()).unwrap_err();

        match err {
            StoreError::Validation(errors) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["deadname", "preferredName"]);
            }
            other => panic!("Expected validation error, got: {:?}", other),
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(StoreError::Validation(Vec::new()).status_code(), 400);
        assert_eq!(StoreError::NotFound.status_code(), 404);
        assert_eq!(StoreError::Storage.status_code(), 500);
    }

    #[test]
    fn test_update_merges_partially() {
        let store = SettingsStore::new();
        let created = store.create(1, valid_settings()).unwrap();

        let patch = SettingsPatch {
            preferred_name: Some("Samantha".to_string()),
            ..SettingsPatch::default()
        };
        let updated = store.update(created.id, &patch).unwrap();

        assert_eq!(updated.settings.preferred_name, "Samantha");
        assert_eq!(updated.settings.deadname, "Alex");
    }

    #[test]
    fn test_update_missing_record() {
        let store = SettingsStore::new();
        let err = store.update(99, &SettingsPatch::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn test_increment_counts() {
        let store = SettingsStore::new();
        let created = store.create(1, valid_settings()).unwrap();

        store.increment_counts(created.id, 3, 2).unwrap();
        store.increment_counts(created.id, 1, 0).unwrap();

        let record = store.get(created.id).unwrap();
        assert_eq!(record.name_replacements, 4);
        assert_eq!(record.pronoun_replacements, 2);
    }

    #[test]
    fn test_increment_missing_record() {
        let store = SettingsStore::new();
        assert!(matches!(
            store.increment_counts(42, 1, 1),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn test_delete() {
        let store = SettingsStore::new();
        let created = store.create(1, valid_settings()).unwrap();

        store.delete(created.id).unwrap();
        assert!(matches!(store.get(created.id), Err(StoreError::NotFound)));
        assert!(matches!(store.delete(created.id), Err(StoreError::NotFound)));
    }

    #[test]
    fn test_ids_increment() {
        let store = SettingsStore::new();
        let a = store.create(1, valid_settings()).unwrap();
        let b = store.create(2, valid_settings()).unwrap();
        assert_eq!(b.id, a.id + 1);
    }
}
