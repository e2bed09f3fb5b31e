use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::OnceCell;

use sealium_transcription::adapters::{
    FfmpegMediaTools, GenPdfWriterAdapter, HttpDownloaderAdapter, JsonErrorMonitorAdapter,
};
use sealium_transcription::config::Config;
use sealium_transcription::http::create_router;
use sealium_transcription::jobs::queue::{parse_retry_intervals, JobHandler, QUEUE_MERGER, QUEUE_PACKAGER, QUEUE_SPLITTER, QUEUE_TRANSCRIBER};
use sealium_transcription::jobs::{InMemoryQueue, JobStore, Queue, RetryPolicy};
use sealium_transcription::ports::{DownloaderPort, ErrorMonitorPort, MediaToolsPort, PdfWriterPort, TranscriberPort};
use sealium_transcription::workers::{merge_job, package_job, split_job, transcribe_job, WorkerContext};

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .parse_lossy("sealium_transcription=info,tower_http=warn,hyper=warn"),
        )
        .init();
}

/// No real ASR engine ships with this crate (spec.md §1 treats the
/// transcription engine as an external collaborator); this placeholder
/// returns an empty transcript per chunk so the pipeline still completes
/// end to end until a real `TranscriberPort` is wired in.
struct NullTranscriber;

#[async_trait::async_trait]
impl TranscriberPort for NullTranscriber {
    async fn transcribe_chunk(
        &self,
        _chunk_path: &std::path::Path,
        _language: &str,
    ) -> Result<sealium_transcription::ports::TranscriptionResult, sealium_transcription::ports::transcriber::TranscriberError> {
        Ok(sealium_transcription::ports::TranscriptionResult { segments: Vec::new() })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = Arc::new(Config::load());
    std::fs::create_dir_all(&config.storage_root)?;

    let store = Arc::new(JobStore::new(config.storage_root.clone()));

    let media: Arc<dyn MediaToolsPort> = match FfmpegMediaTools::from_path() {
        Ok(tools) => Arc::new(tools),
        Err(err) => {
            tracing::warn!(%err, "ffmpeg/ffprobe not found in PATH; media operations will fail until installed");
            Arc::new(FfmpegMediaTools::new("ffmpeg".into(), "ffprobe".into()))
        }
    };
    let downloader: Arc<dyn DownloaderPort> = Arc::new(HttpDownloaderAdapter::new());
    let transcriber: Arc<dyn TranscriberPort> = Arc::new(NullTranscriber);
    let pdf_writer: Arc<dyn PdfWriterPort> = match GenPdfWriterAdapter::new(config.pdf_font_dir.clone()) {
        Ok(writer) => Arc::new(writer),
        Err(err) => {
            tracing::warn!(%err, "no PDF font directory found; PDF generation will fail");
            Arc::new(UnavailablePdfWriter)
        }
    };
    let error_monitor: Arc<dyn ErrorMonitorPort> =
        Arc::new(JsonErrorMonitorAdapter::new(config.storage_root.join("error_log.json")));

    let ctx = WorkerContext {
        store,
        config: config.clone(),
        downloader,
        media,
        transcriber,
        pdf_writer,
        error_monitor,
        queue: Arc::new(OnceCell::new()),
    };

    let mut handlers: HashMap<&'static str, JobHandler> = HashMap::new();
    let splitter_ctx = ctx.clone();
    handlers.insert(
        QUEUE_SPLITTER,
        Arc::new(move |job_id| {
            let ctx = splitter_ctx.clone();
            Box::pin(async move { split_job(job_id, ctx).await })
        }),
    );
    let transcriber_ctx = ctx.clone();
    handlers.insert(
        QUEUE_TRANSCRIBER,
        Arc::new(move |job_id| {
            let ctx = transcriber_ctx.clone();
            Box::pin(async move { transcribe_job(job_id, ctx).await })
        }),
    );
    let merger_ctx = ctx.clone();
    handlers.insert(
        QUEUE_MERGER,
        Arc::new(move |job_id| {
            let ctx = merger_ctx.clone();
            Box::pin(async move { merge_job(job_id, ctx).await })
        }),
    );
    let packager_ctx = ctx.clone();
    handlers.insert(
        QUEUE_PACKAGER,
        Arc::new(move |job_id| {
            let ctx = packager_ctx.clone();
            Box::pin(async move { package_job(job_id, ctx).await })
        }),
    );

    let retry = RetryPolicy::new(
        config.rq_retry_max,
        config.rq_retry_interval,
        &parse_retry_intervals(&config.rq_retry_intervals),
    );
    let queue: Arc<dyn Queue> = Arc::new(InMemoryQueue::start(handlers, retry));
    if ctx.queue.set(queue).is_err() {
        unreachable!("queue cell set exactly once at startup");
    }

    let app = create_router(ctx);
    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!("listening on http://0.0.0.0:8080");
    axum::serve(listener, app).await?;

    Ok(())
}

struct UnavailablePdfWriter;

#[async_trait::async_trait]
impl PdfWriterPort for UnavailablePdfWriter {
    async fn write_pdf(
        &self,
        _pdf_path: &std::path::Path,
        _title: Option<&str>,
        _source_url: Option<&str>,
        _transcript_lines: &[String],
        _sponsor_text: &str,
    ) -> Result<std::path::PathBuf, sealium_transcription::ports::pdf::PdfWriterError> {
        Err(sealium_transcription::ports::pdf::PdfWriterError::Failed(
            "no PDF font directory configured".to_string(),
        ))
    }
}
