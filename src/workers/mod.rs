pub mod merger;
pub mod packager;
pub mod splitter;
pub mod transcriber;

pub use merger::merge_job;
pub use packager::package_job;
pub use splitter::split_job;
pub use transcriber::transcribe_job;

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::config::Config;
use crate::jobs::{JobStore, Queue};
use crate::ports::{DownloaderPort, ErrorMonitorPort, MediaToolsPort, PdfWriterPort, TranscriberPort};

/// Everything a stage worker needs, wired once at startup and shared
/// (by `Arc`) across every job it processes — mirrors the teacher's
/// dependency-injected manager structs (`LibraryManager`, `CacheManager`).
///
/// `queue` is a `OnceCell` rather than a plain field because the queue's
/// handlers close over this context to enqueue the next stage, so the
/// context must exist before the queue does; `main` fills it in right
/// after `Queue::start`.
#[derive(Clone)]
pub struct WorkerContext {
    pub store: Arc<JobStore>,
    pub config: Arc<Config>,
    pub downloader: Arc<dyn DownloaderPort>,
    pub media: Arc<dyn MediaToolsPort>,
    pub transcriber: Arc<dyn TranscriberPort>,
    pub pdf_writer: Arc<dyn PdfWriterPort>,
    pub error_monitor: Arc<dyn ErrorMonitorPort>,
    pub queue: Arc<OnceCell<Arc<dyn Queue>>>,
}

impl WorkerContext {
    pub async fn enqueue(&self, queue_name: &str, job_id: String) {
        if let Some(queue) = self.queue.get() {
            queue.enqueue(queue_name, job_id).await;
        }
    }
}
