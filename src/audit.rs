//! Raw-response audit files: one pretty-printed JSON document appended per
//! record, concatenated with no top-level array wrapper. Consumers are
//! expected to stream-parse.
use chrono::Utc;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("audit serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one document verbatim.
    pub async fn append(&self, document: &Value) -> Result<(), AuditError> {
        self.write(serde_json::to_string_pretty(document)?).await
    }

    /// Appends one document wrapped in a `recorded_at` envelope, for audit
    /// trails where the capture time matters.
    pub async fn append_stamped(&self, document: &Value) -> Result<(), AuditError> {
        let stamped = json!({
            "recorded_at": Utc::now(),
            "response": document,
        });
        self.write(serde_json::to_string_pretty(&stamped)?).await
    }

    async fn write(&self, rendered: String) -> Result<(), AuditError> {
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
        file.write_all(rendered.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }

    /// Deletes the file; missing files are fine (fresh-run cleanup).
    pub async fn remove(&self) -> Result<(), AuditError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Deserializer};
    use tempfile::tempdir;

    #[tokio::test]
    async fn appends_stream_parsable_documents() {
        let td = tempdir().unwrap();
        let log = AuditLog::new(td.path().join("results.json"));

        log.append(&json!({"status_code": 20000, "n": 1})).await.unwrap();
        log.append(&json!({"status_code": 20000, "n": 2})).await.unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let docs: Vec<Value> = Deserializer::from_str(&content)
            .into_iter::<Value>()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1]["n"], 2);
    }

    #[tokio::test]
    async fn stamped_documents_carry_capture_time() {
        let td = tempdir().unwrap();
        let log = AuditLog::new(td.path().join("post_responses.json"));
        log.append_stamped(&json!({"status_code": 20000})).await.unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let doc: Value = serde_json::from_str(&content).unwrap();
        assert!(doc["recorded_at"].is_string());
        assert_eq!(doc["response"]["status_code"], 20000);
    }

    #[tokio::test]
    async fn remove_tolerates_missing_file() {
        let td = tempdir().unwrap();
        let log = AuditLog::new(td.path().join("absent.json"));
        log.remove().await.unwrap();
    }
}
