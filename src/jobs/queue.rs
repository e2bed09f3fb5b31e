use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, warn};

pub const QUEUE_SPLITTER: &str = "splitter";
pub const QUEUE_TRANSCRIBER: &str = "transcriber";
pub const QUEUE_MERGER: &str = "merger";
pub const QUEUE_PACKAGER: &str = "packager";

pub fn queue_names() -> [&'static str; 4] {
    [QUEUE_SPLITTER, QUEUE_TRANSCRIBER, QUEUE_MERGER, QUEUE_PACKAGER]
}

/// Parses a comma-separated seconds list such as `"10,60,300"`, per
/// spec.md §4.2. Blank or unparseable entries are skipped; an empty result
/// means "no explicit schedule" (the caller falls back to a flat interval).
pub fn parse_retry_intervals(raw: &str) -> Vec<u64> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .filter_map(|p| p.parse::<u64>().ok())
        .collect()
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub intervals: Vec<Duration>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, flat_interval_secs: u64, explicit_intervals: &[u64]) -> Self {
        let intervals = if explicit_intervals.is_empty() {
            vec![Duration::from_secs(flat_interval_secs)]
        } else {
            explicit_intervals.iter().map(|s| Duration::from_secs(*s)).collect()
        };
        RetryPolicy { max_attempts, intervals }
    }

    fn interval_for_attempt(&self, attempt: u32) -> Duration {
        let idx = (attempt as usize).min(self.intervals.len().saturating_sub(1));
        self.intervals.get(idx).copied().unwrap_or(Duration::ZERO)
    }
}

pub type JobHandler =
    Arc<dyn Fn(String) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> + Send + Sync>;

/// Named FIFO queues with bounded retry, per spec.md §4.2. Handlers MUST be
/// idempotent: the queue guarantees at-least-once delivery and will call a
/// handler again after a failure, up to `RetryPolicy::max_attempts`.
#[async_trait]
pub trait Queue: Send + Sync {
    async fn enqueue(&self, queue_name: &str, job_id: String);
}

/// Default queue backend: one `tokio` worker task per named queue, draining
/// an unbounded channel. Grounded in the teacher's `tokio::spawn` +
/// `mpsc`-channel pipeline (`import/pipeline/mod.rs`) rather than an
/// external broker — a `redis`-backed `Queue` is a drop-in alternative for
/// cross-process delivery (see DESIGN.md).
pub struct InMemoryQueue {
    senders: HashMap<&'static str, mpsc::UnboundedSender<String>>,
}

impl InMemoryQueue {
    /// `handlers` maps each named queue to the async function that processes
    /// a job id on that queue (e.g. `QUEUE_SPLITTER -> split_job`).
    pub fn start(handlers: HashMap<&'static str, JobHandler>, retry: RetryPolicy) -> Self {
        let mut senders = HashMap::new();
        for name in queue_names() {
            let Some(handler) = handlers.get(name).cloned() else {
                continue;
            };
            let (tx, rx) = mpsc::unbounded_channel::<String>();
            senders.insert(name, tx);
            let retry = retry.clone();
            tokio::spawn(Self::run_worker(name, rx, handler, retry));
        }
        InMemoryQueue { senders }
    }

    async fn run_worker(
        name: &'static str,
        mut rx: mpsc::UnboundedReceiver<String>,
        handler: JobHandler,
        retry: RetryPolicy,
    ) {
        while let Some(job_id) = rx.recv().await {
            let handler = handler.clone();
            let retry = retry.clone();
            // Each job processes independently so a slow/stuck job doesn't
            // block the rest of the queue's FIFO order for other jobs.
            tokio::spawn(Self::run_with_retry(name, job_id, handler, retry));
        }
    }

    async fn run_with_retry(name: &'static str, job_id: String, handler: JobHandler, retry: RetryPolicy) {
        let mut attempt = 0u32;
        loop {
            match handler(job_id.clone()).await {
                Ok(()) => return,
                Err(err) => {
                    attempt += 1;
                    if attempt >= retry.max_attempts {
                        error!(queue = name, job_id = %job_id, attempts = attempt, %err, "exhausted retries");
                        return;
                    }
                    let wait = retry.interval_for_attempt(attempt - 1);
                    warn!(queue = name, job_id = %job_id, attempt, %err, ?wait, "retrying");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

#[async_trait]
impl Queue for InMemoryQueue {
    async fn enqueue(&self, queue_name: &str, job_id: String) {
        if let Some(tx) = self.senders.get(queue_name) {
            let _ = tx.send(job_id);
        }
    }
}

/// Queue double for tests: calls handlers inline, synchronously, with no
/// retry — deterministic and fast for exercising stage transitions.
pub struct SyncQueue {
    handlers: Mutex<HashMap<&'static str, JobHandler>>,
}

impl SyncQueue {
    pub fn new(handlers: HashMap<&'static str, JobHandler>) -> Self {
        SyncQueue { handlers: Mutex::new(handlers) }
    }
}

#[async_trait]
impl Queue for SyncQueue {
    async fn enqueue(&self, queue_name: &str, job_id: String) {
        let handler = self.handlers.lock().await.get(queue_name).cloned();
        if let Some(handler) = handler {
            if let Err(err) = handler(job_id.clone()).await {
                error!(queue = queue_name, job_id = %job_id, %err, "sync queue handler failed");
            }
        }
    }
}
