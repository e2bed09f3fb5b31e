use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::ports::errors::{ErrorLog, ErrorMonitorPort};
use crate::shared::{ensure_directory, write_atomic};

/// Appends errors to a JSON array file, grounded on the original
/// `json_monitor_adapter.py`. Uses the same read-whole-file/append/
/// write-atomic pattern as `JobStore`, guarded by a mutex since multiple
/// workers may log concurrently.
pub struct JsonErrorMonitorAdapter {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonErrorMonitorAdapter {
    pub fn new(path: PathBuf) -> Self {
        JsonErrorMonitorAdapter { path, lock: Arc::new(Mutex::new(())) }
    }

    async fn append(&self, error: ErrorLog) -> std::io::Result<()> {
        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent() {
            ensure_directory(parent)?;
        }
        let mut entries: Vec<ErrorLog> = match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(_) => Vec::new(),
        };
        entries.push(error);
        let bytes = serde_json::to_vec_pretty(&entries)?;
        write_atomic(&self.path, &bytes)
    }
}

#[async_trait]
impl ErrorMonitorPort for JsonErrorMonitorAdapter {
    async fn log_error(&self, error: ErrorLog) {
        if let Err(err) = self.append(error).await {
            tracing::warn!(%err, "failed to persist error log entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_entries_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.json");
        let monitor = JsonErrorMonitorAdapter::new(path.clone());

        monitor.log_error(ErrorLog::new("first".to_string())).await;
        monitor.log_error(ErrorLog::new("second".to_string())).await;

        let bytes = tokio::fs::read(&path).await.unwrap();
        let entries: Vec<ErrorLog> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].message, "second");
    }
}
