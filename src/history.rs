//! The persisted, newest-first history of generated passwords.
//!
//! The whole history is stored as one JSON array under [`HISTORY_KEY`]. The store keeps an
//! in-memory copy of it, which only changes once the persisted copy has been updated.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::storage::{KeyValueStore, StorageError};
use crate::Secret;

/// The key the history is persisted under.
pub const HISTORY_KEY: &str = "historicoSenhas";

/// Default layout for `created_at`: the pt-BR locale's `dd/mm/yyyy, hh:mm:ss`.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct HistoryEntry {
    /// Creation time in milliseconds since the UNIX epoch, as a decimal string.
    pub id: String,
    #[serde(rename = "senha")]
    pub password: Secret,
    /// Display timestamp, formatted when the entry was created.
    #[serde(rename = "data")]
    pub created_at: String,
}

pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

impl<F: Fn() -> DateTime<Local>> Clock for F {
    fn now(&self) -> DateTime<Local> {
        self()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to serialize the history into JSON: {0}")]
    Serialize(#[source] serde_json::Error),
}

pub struct HistoryStore<S, C = SystemClock> {
    storage: S,
    clock: C,
    timestamp_format: String,
    entries: Vec<HistoryEntry>,
}

impl<S: KeyValueStore> HistoryStore<S, SystemClock> {
    /// Open the history held in `storage`, loading whatever is persisted there.
    pub fn open(storage: S) -> HistoryStore<S, SystemClock> {
        HistoryStore::with_clock(storage, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> HistoryStore<S, C> {
    pub fn with_clock(storage: S, clock: C) -> HistoryStore<S, C> {
        let mut store = HistoryStore {
            storage,
            clock,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_owned(),
            entries: Vec::new(),
        };
        store.load();
        store
    }

    /// Change how `created_at` is rendered for entries appended from now on.
    pub fn set_timestamp_format(&mut self, format: impl Into<String>) {
        self.timestamp_format = format.into();
    }

    /// Re-read the history from storage.
    ///
    /// Missing or malformed data yields an empty history; it never fails.
    pub fn load(&mut self) -> &[HistoryEntry] {
        self.entries = match self.storage.get(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    log::warn!("ignoring malformed password history: {}", err);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                log::error!("failed to load password history: {}", err);
                Vec::new()
            }
        };
        log::debug!("loaded {} history entries", self.entries.len());
        &self.entries
    }

    /// Record a newly generated password at the front of the history.
    ///
    /// Persistence failures are logged, and leave the history as it was.
    pub fn append(&mut self, password: Secret) -> &[HistoryEntry] {
        if let Err(err) = self.try_append(password) {
            log::error!("failed to save password to history: {}", err);
        }
        &self.entries
    }

    pub fn try_append(&mut self, password: Secret) -> Result<&HistoryEntry, HistoryError> {
        let now = self.clock.now();
        let entry = HistoryEntry {
            id: self.next_id(now.timestamp_millis()),
            password,
            created_at: format_timestamp(&now, &self.timestamp_format),
        };

        let mut updated = Vec::with_capacity(self.entries.len() + 1);
        updated.push(entry);
        updated.extend(self.entries.iter().cloned());
        let serialized = serde_json::to_string(&updated).map_err(HistoryError::Serialize)?;
        self.storage.set(HISTORY_KEY, &serialized)?;

        self.entries = updated;
        log::info!(
            "added entry {} to history ({} total)",
            self.entries[0].id,
            self.entries.len()
        );
        Ok(&self.entries[0])
    }

    /// Remove the whole history, both persisted and in memory.
    ///
    /// Persistence failures are logged, and leave the history as it was.
    pub fn clear(&mut self) {
        if let Err(err) = self.try_clear() {
            log::error!("failed to clear password history: {}", err);
        }
    }

    pub fn try_clear(&mut self) -> Result<(), HistoryError> {
        self.storage.remove(HISTORY_KEY)?;
        self.entries.clear();
        log::info!("cleared password history");
        Ok(())
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn newest(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Ids are the creation millisecond, bumped past the newest id if the clock hasn't moved on.
    ///
    /// A newest id that can't be bumped without overflowing is treated like a non-numeric one.
    fn next_id(&self, now_millis: i64) -> String {
        let newest = self
            .entries
            .first()
            .and_then(|entry| entry.id.parse::<i64>().ok());
        let id = match newest {
            Some(newest) if newest >= now_millis => newest.checked_add(1).unwrap_or(now_millis),
            _ => now_millis,
        };
        id.to_string()
    }
}

fn format_timestamp(now: &DateTime<Local>, format: &str) -> String {
    use std::fmt::Write;

    let mut s = String::new();
    if write!(s, "{}", now.format(format)).is_err() {
        log::warn!("invalid timestamp format {:?}; using the default", format);
        s.clear();
        write!(s, "{}", now.format(DEFAULT_TIMESTAMP_FORMAT))
            .expect("the default timestamp format is valid");
    }
    s
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use chrono::TimeZone;

    use super::*;
    use crate::storage::MemoryStore;

    fn fixed_clock() -> impl Fn() -> DateTime<Local> {
        || Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn empty_storage_loads_empty() {
        let store = HistoryStore::open(MemoryStore::new());
        assert!(store.is_empty());
        assert_eq!(store.newest(), None);
    }

    #[test]
    fn append_prepends() {
        let mut store = HistoryStore::with_clock(MemoryStore::new(), fixed_clock());
        store.append(Secret::from("first-password"));
        store.append(Secret::from("second-password"));
        let passwords: Vec<_> = store.entries().iter().map(|e| e.password.as_str()).collect();
        assert_eq!(passwords, ["second-password", "first-password"]);
    }

    #[test]
    fn ids_stay_unique_when_the_clock_stands_still() {
        let mut store = HistoryStore::with_clock(MemoryStore::new(), fixed_clock());
        for _ in 0..3 {
            store.append(Secret::from("abcdefgh"));
        }
        let ids: Vec<i64> = store
            .entries()
            .iter()
            .map(|e| e.id.parse().unwrap())
            .collect();
        assert!(ids.windows(2).all(|w| w[0] > w[1]), "{:?}", ids);
    }

    #[test]
    fn created_at_uses_the_pt_br_layout() {
        let mut store = HistoryStore::with_clock(MemoryStore::new(), fixed_clock());
        store.append(Secret::from("abcdefgh"));
        assert_eq!(store.entries()[0].created_at, "09/03/2024, 14:05:07");

        store.set_timestamp_format("%Y-%m-%d");
        store.append(Secret::from("abcdefgh"));
        assert_eq!(store.entries()[0].created_at, "2024-03-09");
    }

    #[test]
    fn invalid_timestamp_format_falls_back_to_default() {
        let mut store = HistoryStore::with_clock(MemoryStore::new(), fixed_clock());
        store.set_timestamp_format("%Q");
        store.append(Secret::from("abcdefgh"));
        assert_eq!(store.entries()[0].created_at, "09/03/2024, 14:05:07");
    }

    #[test]
    fn persisted_format_uses_portuguese_field_names() {
        let mut store = HistoryStore::with_clock(MemoryStore::new(), fixed_clock());
        store.append(Secret::from("Zz9!Zz9!"));
        let raw = store.storage().get(HISTORY_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let entry = &value[0];
        assert_eq!(entry["senha"], "Zz9!Zz9!");
        assert_eq!(entry["data"], "09/03/2024, 14:05:07");
        assert!(entry["id"].is_string());
    }

    #[test]
    fn malformed_history_loads_empty() {
        let mut storage = MemoryStore::new();
        storage.set(HISTORY_KEY, "{not json").unwrap();
        let store = HistoryStore::open(storage);
        assert!(store.is_empty());
    }

    #[test]
    fn clear_removes_the_key() {
        let mut store = HistoryStore::open(MemoryStore::new());
        store.append(Secret::from("abcdefgh"));
        assert!(store.storage().contains_key(HISTORY_KEY));
        store.clear();
        assert!(store.is_empty());
        assert!(!store.storage().contains_key(HISTORY_KEY));
    }

    #[test]
    fn get_finds_entries_by_id() {
        let mut store = HistoryStore::with_clock(MemoryStore::new(), fixed_clock());
        store.append(Secret::from("abcdefgh"));
        let id = store.entries()[0].id.clone();
        assert_eq!(store.get(&id).unwrap().password.as_str(), "abcdefgh");
        assert!(store.get("0").is_none());
    }

    #[test]
    fn largest_possible_id_does_not_overflow() {
        let mut storage = MemoryStore::new();
        storage
            .set(
                HISTORY_KEY,
                r#"[{"id":"9223372036854775807","senha":"abcdefgh","data":"-"}]"#,
            )
            .unwrap();
        let mut store = HistoryStore::with_clock(storage, fixed_clock());
        assert_eq!(store.len(), 1);

        store.append(Secret::from("ijklmnop"));
        assert_eq!(store.len(), 2);
        let expected_id = fixed_clock()().timestamp_millis().to_string();
        assert_eq!(store.entries()[0].id, expected_id);
        assert_eq!(store.entries()[0].password.as_str(), "ijklmnop");
        assert_eq!(store.entries()[1].id, "9223372036854775807");
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::InvalidKey("unavailable".to_owned()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::InvalidKey("unavailable".to_owned()))
        }

        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::InvalidKey("unavailable".to_owned()))
        }
    }

    #[test]
    fn storage_failures_are_not_fatal() {
        let mut store = HistoryStore::open(BrokenStore);
        assert!(store.is_empty());
        assert!(store.append(Secret::from("abcdefgh")).is_empty());
        assert!(store.try_append(Secret::from("abcdefgh")).is_err());
        store.clear();
        assert!(store.try_clear().is_err());
    }

    /// A store whose writes start failing once `failing` is set.
    struct FlakyStore {
        inner: MemoryStore,
        failing: Rc<Cell<bool>>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.failing.get() {
                return Err(StorageError::InvalidKey(key.to_owned()));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            if self.failing.get() {
                return Err(StorageError::InvalidKey(key.to_owned()));
            }
            self.inner.remove(key)
        }
    }

    #[test]
    fn failed_writes_leave_existing_entries_alone() {
        let failing = Rc::new(Cell::new(false));
        let storage = FlakyStore {
            inner: MemoryStore::new(),
            failing: Rc::clone(&failing),
        };
        let mut store = HistoryStore::with_clock(storage, fixed_clock());
        store.append(Secret::from("first-password"));
        store.append(Secret::from("second-password"));
        let before = store.entries().to_vec();
        assert_eq!(before.len(), 2);

        failing.set(true);
        assert_eq!(store.append(Secret::from("third-password")), &before[..]);
        assert_eq!(store.entries(), &before[..]);
        store.clear();
        assert_eq!(store.entries(), &before[..]);
        assert!(store.try_clear().is_err());
        assert_eq!(store.entries(), &before[..]);

        // What's persisted still matches what's in memory.
        assert_eq!(store.load(), &before[..]);
    }
}
