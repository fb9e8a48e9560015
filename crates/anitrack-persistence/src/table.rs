//! Single-file JSON tables with crash-safe rewrites.
//!
//! A table is a list of rows plus an id sequence, kept in memory behind a
//! mutex and mirrored to one JSON file:
//! ```text
//! state/
//! ├── users.json
//! └── subscriptions.json
//! ```
//! Mutations run against a copy of the table. The copy is written to a
//! temp file in the same directory, flushed, synced and renamed over the
//! old file; only then does it replace the in-memory table. A failed write
//! therefore leaves both memory and disk at the previous state.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{PersistenceError, Result};

/// On-disk layout of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableFile<T> {
    /// Next id to hand out.
    pub next_id: u64,
    /// Stored rows in insertion order.
    pub rows: Vec<T>,
}

impl<T> Default for TableFile<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

impl<T> TableFile<T> {
    /// Takes the next id from the sequence.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// A JSON table file with an in-memory cache.
pub struct JsonTable<T> {
    path: PathBuf,
    state: Mutex<TableFile<T>>,
}

impl<T> JsonTable<T>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned + Send,
{
    /// Opens a table, loading the file if it exists.
    ///
    /// A missing file is an empty table; the file is created on the first
    /// mutation.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let data = fs::read_to_string(&path).map_err(|source| PersistenceError::ReadError {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&data)?
        } else {
            TableFile::default()
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs a read-only query against the table.
    pub async fn read<R>(&self, query: impl FnOnce(&TableFile<T>) -> R) -> R {
        let state = self.state.lock().await;
        query(&state)
    }

    /// Applies a mutation and persists it if anything changed.
    ///
    /// If the closure fails, or the file cannot be written, the table is
    /// left untouched.
    pub async fn update<R>(&self, mutation: impl FnOnce(&mut TableFile<T>) -> Result<R>) -> Result<R> {
        let mut state = self.state.lock().await;
        let mut draft = state.clone();
        let result = mutation(&mut draft)?;

        if draft != *state {
            let json = serde_json::to_vec_pretty(&draft)?;
            let path = self.path.clone();
            tokio::task::spawn_blocking(move || write_atomically(&path, &json))
                .await
                .map_err(|e| PersistenceError::WriteError {
                    path: self.path.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
                })??;
            debug!(path = %self.path.display(), rows = draft.rows.len(), "Table persisted");
            *state = draft;
        }

        Ok(result)
    }
}

/// Writes `json` into `path` via temp file + rename. Blocks on fsync.
fn write_atomically(path: &Path, json: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|source| PersistenceError::DirectoryError {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let write_error = |source| PersistenceError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
    temp.write_all(json).map_err(write_error)?;
    temp.flush().map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    temp.persist(path).map_err(|e| write_error(e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u64,
        label: String,
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rows.json");

        let table: JsonTable<Row> = JsonTable::open(&path).unwrap();

        assert_eq!(table.read(|t| t.rows.len()).await, 0);
        assert!(!path.exists(), "opening must not create the file");
    }

    #[tokio::test]
    async fn test_update_persists_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/state/rows.json");

        let table: JsonTable<Row> = JsonTable::open(&path).unwrap();
        let id = table
            .update(|t| {
                let id = t.allocate_id();
                t.rows.push(Row { id, label: "first".to_string() });
                Ok(id)
            })
            .await
            .unwrap();
        assert_eq!(id, 1);
        assert!(path.exists());

        let reopened: JsonTable<Row> = JsonTable::open(&path).unwrap();
        let (next_id, labels) = reopened
            .read(|t| (t.next_id, t.rows.iter().map(|r| r.label.clone()).collect::<Vec<_>>()))
            .await;
        assert_eq!(next_id, 2);
        assert_eq!(labels, vec!["first".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_table_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rows.json");
        let table: JsonTable<Row> = JsonTable::open(&path).unwrap();

        let result: Result<()> = table
            .update(|t| {
                t.rows.push(Row { id: 1, label: "dropped".to_string() });
                Err(PersistenceError::NotFound { kind: "row", id: "1".to_string() })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(table.read(|t| t.rows.len()).await, 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unchanged_update_does_not_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rows.json");
        let table: JsonTable<Row> = JsonTable::open(&path).unwrap();

        table.update(|_| Ok(())).await.unwrap();

        assert!(!path.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_updates_all_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rows.json");
        let table = std::sync::Arc::new(JsonTable::<Row>::open(&path).unwrap());

        let mut tasks = Vec::new();
        for n in 0..8 {
            let table = table.clone();
            tasks.push(tokio::spawn(async move {
                table
                    .update(|t| {
                        let id = t.allocate_id();
                        t.rows.push(Row { id, label: format!("row-{n}") });
                        Ok(())
                    })
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let reopened: JsonTable<Row> = JsonTable::open(&path).unwrap();
        let (next_id, rows) = reopened.read(|t| (t.next_id, t.rows.len())).await;
        assert_eq!(next_id, 9);
        assert_eq!(rows, 8);
    }

    #[test]
    fn test_open_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rows.json");
        fs::write(&path, "{ not json").unwrap();

        let result: Result<JsonTable<Row>> = JsonTable::open(&path);
        assert!(matches!(result, Err(PersistenceError::Json(_))));
    }
}
