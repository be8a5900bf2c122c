//! Durable record of created task ids.
//!
//! The contract is a minimal append-only log: `append` one id, `read_all`
//! in insertion order, `clear` for a fresh run. Everything resume mode does
//! is built on these three operations. Backends:
//! - [`FileStore`]: newline-delimited text file, the interchange format.
//! - [`SqliteStore`]: single-table SQLite database.
//! - [`MemoryStore`]: in-process, for tests and dry runs.
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Append-only persistence for created task ids. A crash mid-run loses at
/// most the in-flight batch; everything appended before it survives a
/// restart and feeds resume mode.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Appends one id, creating the backing store if absent.
    async fn append(&self, task_id: &str) -> Result<(), StoreError>;

    /// Returns every stored id in insertion order.
    async fn read_all(&self) -> Result<Vec<String>, StoreError>;

    /// Removes the store. Used at the start of a fresh (non-resume) run.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// One task id per line, newline-terminated, no header.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TaskStore for FileStore {
    async fn append(&self, task_id: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await?;
        file.write_all(task_id.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<String>, StoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// SQLite-backed store. Same contract as [`FileStore`], for operators who
/// prefer one database file over loose text files.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects (creating the database if missing) and prepares the schema.
    /// Accepts `sqlite:` URLs, including `sqlite::memory:`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let normalized = prepare_sqlite_url(url);
        let options = SqliteConnectOptions::from_str(&normalized)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        // Durability over speed: an appended id must survive a crash.
        sqlx::query("PRAGMA journal_mode=WAL;").execute(&pool).await?;
        sqlx::query("PRAGMA synchronous=FULL;").execute(&pool).await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS task_ids (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }
}

/// For file-backed SQLite URLs, ensure the parent directory exists. Leaves
/// in-memory URLs and non-sqlite schemes untouched.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }
    let rest = url["sqlite:".len()..].trim_start_matches("//");
    let path_part = rest.split('?').next().unwrap_or(rest);
    if let Some(parent) = Path::new(path_part).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }
    url.to_string()
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn append(&self, task_id: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO task_ids (task_id) VALUES (?)")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<String>, StoreError> {
        let ids = sqlx::query_scalar::<_, String>("SELECT task_id FROM task_ids ORDER BY seq")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM task_ids").execute(&self.pool).await?;
        Ok(())
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ids: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn append(&self, task_id: &str) -> Result<(), StoreError> {
        self.ids.lock().await.push(task_id.to_string());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.ids.lock().await.clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.ids.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn file_store_round_trip_in_order() {
        let td = tempdir().unwrap();
        let path = td.path().join("task_ids.dat");
        let store = FileStore::new(&path);

        store.append("task-a").await.unwrap();
        store.append("task-b").await.unwrap();
        store.append("task-c").await.unwrap();

        assert_eq!(store.read_all().await.unwrap(), vec!["task-a", "task-b", "task-c"]);

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, "task-a\ntask-b\ntask-c\n");
    }

    #[tokio::test]
    async fn file_store_empty_when_absent() {
        let td = tempdir().unwrap();
        let store = FileStore::new(td.path().join("missing.dat"));
        assert!(store.read_all().await.unwrap().is_empty());
        // Clearing a store that never existed is not an error.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn file_store_clear_removes_backing_file() {
        let td = tempdir().unwrap();
        let path = td.path().join("task_ids.dat");
        let store = FileStore::new(&path);
        store.append("task-a").await.unwrap();
        assert!(path.exists());
        store.clear().await.unwrap();
        assert!(!path.exists());
        assert!(store.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_store_creates_parent_directories() {
        let td = tempdir().unwrap();
        let path = td.path().join("nested/dir/task_ids.dat");
        let store = FileStore::new(&path);
        store.append("task-a").await.unwrap();
        assert_eq!(store.read_all().await.unwrap(), vec!["task-a"]);
    }

    #[tokio::test]
    async fn sqlite_store_round_trip() {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        store.append("task-1").await.unwrap();
        store.append("task-2").await.unwrap();
        assert_eq!(store.read_all().await.unwrap(), vec!["task-1", "task-2"]);
        store.clear().await.unwrap();
        assert!(store.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::new();
        store.append("task-1").await.unwrap();
        store.append("task-2").await.unwrap();
        assert_eq!(store.read_all().await.unwrap(), vec!["task-1", "task-2"]);
        store.clear().await.unwrap();
        assert!(store.read_all().await.unwrap().is_empty());
    }
}
