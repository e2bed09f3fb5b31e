use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single monitored error event, grounded on the original
/// `domain.entities.error_log.ErrorLog` pydantic model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorLog {
    pub id: String,
    pub timestamp_utc: DateTime<Utc>,
    pub message: String,
    pub stack_trace: Option<String>,
    #[serde(default)]
    pub context_data: HashMap<String, String>,
}

impl ErrorLog {
    pub fn new(message: String) -> Self {
        ErrorLog {
            id: Uuid::new_v4().to_string(),
            timestamp_utc: Utc::now(),
            message,
            stack_trace: None,
            context_data: HashMap::new(),
        }
    }
}

/// Sink for out-of-band error reporting, separate from the per-job
/// `JobLogger`/`JobStore.errors` trail — grounded on `ErrorMonitorPort`.
#[async_trait]
pub trait ErrorMonitorPort: Send + Sync {
    async fn log_error(&self, error: ErrorLog);
}
