use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

/// Append-only per-job log, shipped in the deliverable zip as `logs/job.log`.
/// Separate from process-wide `tracing` output — this is a durable artifact,
/// not a logging backend.
#[derive(Debug, Clone)]
pub struct JobLogger {
    log_path: PathBuf,
}

impl JobLogger {
    pub fn new(log_path: PathBuf) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(JobLogger { log_path })
    }

    pub fn write(&self, message: &str) -> std::io::Result<()> {
        let line = format!("[{}] {}\n", Utc::now().to_rfc3339(), message);
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        file.write_all(line.as_bytes())
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}
