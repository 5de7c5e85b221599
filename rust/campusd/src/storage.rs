use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("tab storage query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("tab storage io failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Key/value storage that lives as long as one tab session: it survives a
/// process restart but is wiped when the tab is closed.
pub trait TabStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
    fn clear(&mut self) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryTabStorage {
    items: HashMap<String, String>,
}

impl MemoryTabStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TabStorage for MemoryTabStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.items.clear();
        Ok(())
    }
}

pub struct SqliteTabStorage {
    conn: Connection,
}

impl SqliteTabStorage {
    pub fn open(workspace: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(workspace)?;
        let conn = Connection::open(workspace.join("tab_storage.sqlite3"))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS tab_storage(
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }
}

impl TabStorage for SqliteTabStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let v = self
            .conn
            .query_row("SELECT value FROM tab_storage WHERE key = ?", [key], |r| {
                r.get(0)
            })
            .optional()?;
        Ok(v)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO tab_storage(key, value) VALUES(?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, value),
        )?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM tab_storage WHERE key = ?", [key])?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM tab_storage", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> std::path::PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    #[test]
    fn memory_storage_set_get_remove() {
        let mut s = MemoryTabStorage::new();
        assert_eq!(s.get_item("k").expect("get"), None);
        s.set_item("k", "v1").expect("set");
        s.set_item("k", "v2").expect("set");
        assert_eq!(s.get_item("k").expect("get").as_deref(), Some("v2"));
        s.remove_item("k").expect("remove");
        s.remove_item("k").expect("remove twice");
        assert_eq!(s.get_item("k").expect("get"), None);
    }

    #[test]
    fn sqlite_storage_survives_reopen_until_cleared() {
        let dir = temp_dir("campusd-tab-storage");
        {
            let mut s = SqliteTabStorage::open(&dir).expect("open");
            s.set_item("currentUser", "{}").expect("set");
        }
        let mut s = SqliteTabStorage::open(&dir).expect("reopen");
        assert_eq!(s.get_item("currentUser").expect("get").as_deref(), Some("{}"));
        s.clear().expect("clear");
        assert_eq!(s.get_item("currentUser").expect("get"), None);
    }
}
