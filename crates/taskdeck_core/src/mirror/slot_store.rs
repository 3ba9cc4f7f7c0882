//! Flat string-keyed slot storage.
//!
//! # Responsibility
//! - Persist raw string payloads under a fixed set of slot keys.
//! - Keep SQL details inside the mirror boundary.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};

pub type MirrorResult<T> = Result<T, MirrorError>;

/// The three local mirror slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    Tasks,
    UserProfile,
    Theme,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Tasks, Slot::UserProfile, Slot::Theme];

    /// Storage key. Kept identical to the keys web clients use.
    pub fn key(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::UserProfile => "userProfile",
            Self::Theme => "theme",
        }
    }
}

/// Slot storage or payload errors.
#[derive(Debug)]
pub enum MirrorError {
    Db(DbError),
    Json(serde_json::Error),
}

impl Display for MirrorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid slot payload: {err}"),
        }
    }
}

impl Error for MirrorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<DbError> for MirrorError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<serde_json::Error> for MirrorError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

fn slot_error(slot: Slot) -> impl FnOnce(rusqlite::Error) -> MirrorError {
    move |source| {
        MirrorError::Db(DbError::Slot {
            key: slot.key(),
            source,
        })
    }
}

/// Raw slot storage.
pub trait SlotStore: Send + Sync {
    fn read_slot(&self, slot: Slot) -> MirrorResult<Option<String>>;
    fn write_slot(&self, slot: Slot, value: &str) -> MirrorResult<()>;
    fn remove_slot(&self, slot: Slot) -> MirrorResult<()>;
}

/// SQLite-backed slot storage over the `local_slots` table.
///
/// The connection must come from `db::open_db*` so migrations are applied.
pub struct SqliteSlotStore {
    conn: Mutex<Connection>,
}

impl SqliteSlotStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> MirrorResult<T>) -> MirrorResult<T> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&conn)
    }
}

impl SlotStore for SqliteSlotStore {
    fn read_slot(&self, slot: Slot) -> MirrorResult<Option<String>> {
        self.with_conn(|conn| {
            let value = conn
                .query_row(
                    "SELECT slot_value FROM local_slots WHERE slot_key = ?1;",
                    [slot.key()],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .map_err(slot_error(slot))?;
            Ok(value)
        })
    }

    fn write_slot(&self, slot: Slot, value: &str) -> MirrorResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO local_slots (slot_key, slot_value)
                 VALUES (?1, ?2)
                 ON CONFLICT(slot_key) DO UPDATE SET
                    slot_value = excluded.slot_value,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![slot.key(), value],
            )
            .map_err(slot_error(slot))?;
            Ok(())
        })
    }

    fn remove_slot(&self, slot: Slot) -> MirrorResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM local_slots WHERE slot_key = ?1;",
                [slot.key()],
            )
            .map_err(slot_error(slot))?;
            Ok(())
        })
    }
}

/// Process-local slot storage.
#[derive(Default)]
pub struct MemorySlotStore {
    slots: Mutex<BTreeMap<Slot, String>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemorySlotStore {
    fn read_slot(&self, slot: Slot) -> MirrorResult<Option<String>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(&slot).cloned())
    }

    fn write_slot(&self, slot: Slot, value: &str) -> MirrorResult<()> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.insert(slot, value.to_string());
        Ok(())
    }

    fn remove_slot(&self, slot: Slot) -> MirrorResult<()> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(&slot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemorySlotStore, MirrorError, Slot, SlotStore, SqliteSlotStore};
    use crate::db::{open_db_in_memory, DbError};
    use rusqlite::Connection;

    fn exercise(store: &dyn SlotStore) {
        assert_eq!(store.read_slot(Slot::Theme).unwrap(), None);
        store.write_slot(Slot::Theme, "dark").unwrap();
        store.write_slot(Slot::Theme, "light").unwrap();
        assert_eq!(
            store.read_slot(Slot::Theme).unwrap().as_deref(),
            Some("light")
        );
        assert_eq!(store.read_slot(Slot::Tasks).unwrap(), None);

        store.remove_slot(Slot::Theme).unwrap();
        store.remove_slot(Slot::Theme).unwrap();
        assert_eq!(store.read_slot(Slot::Theme).unwrap(), None);
    }

    #[test]
    fn sqlite_store_upserts_and_removes() {
        let store = SqliteSlotStore::new(open_db_in_memory().unwrap());
        exercise(&store);
    }

    #[test]
    fn memory_store_upserts_and_removes() {
        exercise(&MemorySlotStore::new());
    }

    #[test]
    fn unmigrated_connection_reports_failing_slot() {
        let store = SqliteSlotStore::new(Connection::open_in_memory().unwrap());
        let err = store.read_slot(Slot::UserProfile).unwrap_err();
        match err {
            MirrorError::Db(DbError::Slot { key, .. }) => assert_eq!(key, "userProfile"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.write_slot(Slot::Theme, "dark").is_err());
    }

    #[test]
    fn slot_keys_are_stable() {
        let keys: Vec<_> = Slot::ALL.iter().map(|slot| slot.key()).collect();
        assert_eq!(keys, vec!["tasks", "userProfile", "theme"]);
    }
}
