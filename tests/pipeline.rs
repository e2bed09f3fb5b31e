use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::OnceCell;

use sealium_transcription::adapters::test_support::{
    FakeDownloader, FakeMediaTools, FakePdfWriter, FakeTranscriber, RecordingErrorMonitor,
};
use sealium_transcription::config::Config;
use sealium_transcription::jobs::queue::{JobHandler, QUEUE_MERGER, QUEUE_PACKAGER, QUEUE_SPLITTER, QUEUE_TRANSCRIBER};
use sealium_transcription::jobs::{JobInput, JobOptions, JobPaths, JobState, JobStatus, JobStore, SyncQueue};
use sealium_transcription::processing::vtt::TimedText;
use sealium_transcription::workers::{merge_job, package_job, split_job, transcribe_job, WorkerContext};

fn build_ctx(storage_root: std::path::PathBuf, duration: f64, silence_report: &str, segments: Vec<TimedText>) -> WorkerContext {
    WorkerContext {
        store: Arc::new(JobStore::new(storage_root.clone())),
        config: Arc::new(Config::for_tests(storage_root)),
        downloader: Arc::new(FakeDownloader),
        media: Arc::new(FakeMediaTools::new(duration, silence_report.to_string())),
        transcriber: Arc::new(FakeTranscriber::new(segments)),
        pdf_writer: Arc::new(FakePdfWriter),
        error_monitor: Arc::new(RecordingErrorMonitor::default()),
        queue: Arc::new(OnceCell::new()),
    }
}

fn wire_sync_queue(ctx: &WorkerContext) {
    let mut handlers: HashMap<&'static str, JobHandler> = HashMap::new();
    let c = ctx.clone();
    handlers.insert(QUEUE_SPLITTER, Arc::new(move |job_id| {
        let c = c.clone();
        Box::pin(async move { split_job(job_id, c).await })
    }));
    let c = ctx.clone();
    handlers.insert(QUEUE_TRANSCRIBER, Arc::new(move |job_id| {
        let c = c.clone();
        Box::pin(async move { transcribe_job(job_id, c).await })
    }));
    let c = ctx.clone();
    handlers.insert(QUEUE_MERGER, Arc::new(move |job_id| {
        let c = c.clone();
        Box::pin(async move { merge_job(job_id, c).await })
    }));
    let c = ctx.clone();
    handlers.insert(QUEUE_PACKAGER, Arc::new(move |job_id| {
        let c = c.clone();
        Box::pin(async move { package_job(job_id, c).await })
    }));
    let queue: Arc<dyn sealium_transcription::jobs::Queue> = Arc::new(SyncQueue::new(handlers));
    if ctx.queue.set(queue).is_err() {
        panic!("queue cell set once");
    }
}

#[tokio::test]
async fn full_pipeline_runs_end_to_end_and_produces_a_downloadable_zip() {
    let dir = tempfile::tempdir().unwrap();

    // One silence from 2s to 3s over a 6s clip splits into two chunks:
    // [0,2) and [3,6).
    let ctx = build_ctx(
        dir.path().to_path_buf(),
        6.0,
        "silence_start: 2.0\nsilence_end: 3.0\n",
        vec![TimedText { start: 0.0, end: 1.0, text: "hola".to_string() }],
    );
    wire_sync_queue(&ctx);

    let job_id = "job-e2e".to_string();
    let source = dir.path().join("source.mp4");
    std::fs::write(&source, b"fake-video-bytes").unwrap();

    let input = JobInput::Path { value: source.to_string_lossy().to_string() };
    let state = JobState::new(job_id.clone(), input, JobOptions::default(), Utc::now());
    ctx.store.create(&state).await.unwrap();

    ctx.enqueue(QUEUE_SPLITTER, job_id.clone()).await;

    let final_state = ctx.store.load(&job_id).await.unwrap().unwrap();
    assert_eq!(final_state.status, JobStatus::Done);
    assert_eq!(final_state.progress.chunks_total, 2);
    assert_eq!(final_state.progress.chunks_done, 2);
    assert!(final_state.errors.is_empty());

    let paths = JobPaths::new(ctx.store.storage_root(), &job_id);
    assert!(paths.final_txt().exists());
    assert!(paths.manifest_path.exists());

    let zip_path = paths.output_zip();
    assert!(zip_path.exists());
    let file = std::fs::File::open(&zip_path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let names: Vec<String> = (0..archive.len()).map(|i| archive.by_index(i).unwrap().name().to_string()).collect();
    assert!(names.contains(&"video.mp4".to_string()));
    assert!(names.contains(&"transcript.txt".to_string()));
    assert!(names.contains(&"manifest.json".to_string()));
}

#[tokio::test]
async fn canceling_a_queued_job_stops_the_splitter_from_progressing_it() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = build_ctx(dir.path().to_path_buf(), 6.0, "", vec![]);
    wire_sync_queue(&ctx);

    let job_id = "job-canceled".to_string();
    let source = dir.path().join("source.mp4");
    std::fs::write(&source, b"fake-video-bytes").unwrap();
    let input = JobInput::Path { value: source.to_string_lossy().to_string() };
    let state = JobState::new(job_id.clone(), input, JobOptions::default(), Utc::now());
    ctx.store.create(&state).await.unwrap();

    ctx.store.set_status(&job_id, JobStatus::Canceled).await.unwrap();
    ctx.enqueue(QUEUE_SPLITTER, job_id.clone()).await;

    let final_state = ctx.store.load(&job_id).await.unwrap().unwrap();
    assert_eq!(final_state.status, JobStatus::Canceled);
    assert!(final_state.errors.is_empty());

    let paths = JobPaths::new(ctx.store.storage_root(), &job_id);
    assert!(!paths.original_mp4().exists());
}

#[tokio::test]
async fn missing_path_input_fails_the_job_with_a_recorded_error() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = build_ctx(dir.path().to_path_buf(), 6.0, "", vec![]);
    wire_sync_queue(&ctx);

    let job_id = "job-missing-input".to_string();
    let input = JobInput::Path { value: dir.path().join("does-not-exist.mp4").to_string_lossy().to_string() };
    let state = JobState::new(job_id.clone(), input, JobOptions::default(), Utc::now());
    ctx.store.create(&state).await.unwrap();

    ctx.enqueue(QUEUE_SPLITTER, job_id.clone()).await;

    let final_state = ctx.store.load(&job_id).await.unwrap().unwrap();
    assert_eq!(final_state.status, JobStatus::Failed);
    assert_eq!(final_state.errors.len(), 1);
}
