use crate::errors::PipelineError;
use crate::jobs::queue::QUEUE_TRANSCRIBER;
use crate::jobs::{ChunkMode, ChunkPlanEntry, JobInput, JobLogger, JobPaths, JobStatus};
use crate::processing::segmenter;
use crate::shared::ensure_directory;

use super::WorkerContext;

async fn ensure_original(
    ctx: &WorkerContext,
    input: &JobInput,
    paths: &JobPaths,
    logger: &JobLogger,
    cookies_from_browser: Option<&str>,
) -> Result<(), PipelineError> {
    if paths.original_mp4().exists() {
        return Ok(());
    }

    match input {
        JobInput::Upload { .. } => Err(PipelineError::MissingUpload),
        JobInput::Path { value } => {
            let src = std::path::Path::new(value);
            if !src.exists() {
                return Err(PipelineError::InputNotFound(value.clone()));
            }
            ensure_directory(&paths.input_dir)?;
            std::fs::copy(src, paths.original_mp4())?;
            Ok(())
        }
        JobInput::Url { value } => {
            let is_direct_mp4 =
                (value.starts_with("http://") || value.starts_with("https://")) && value.to_lowercase().ends_with(".mp4");

            ensure_directory(&paths.input_dir)?;
            let _ = logger.write(if is_direct_mp4 {
                "downloading direct mp4"
            } else {
                "downloading via external downloader"
            });

            let media_path = ctx
                .downloader
                .download(value, &paths.input_dir, cookies_from_browser)
                .await?;
            if !media_path.exists() {
                return Err(PipelineError::InputNotFound(value.clone()));
            }
            if media_path != paths.original_mp4() {
                std::fs::copy(&media_path, paths.original_mp4())?;
            }
            Ok(())
        }
    }
}

async fn normalize_audio(ctx: &WorkerContext, paths: &JobPaths, logger: &JobLogger) -> Result<(), PipelineError> {
    if paths.audio_wav().exists() {
        return Ok(());
    }
    if !paths.original_mp4().exists() {
        return Err(PipelineError::InputNotFound("input/original.mp4 not found".to_string()));
    }
    ensure_directory(&paths.input_dir)?;
    let _ = logger.write("normalizing audio");
    ctx.media.normalize_to_wav(&paths.original_mp4(), &paths.audio_wav()).await?;
    Ok(())
}

async fn plan_chunks(ctx: &WorkerContext, paths: &JobPaths, mode: ChunkMode) -> Result<Vec<ChunkPlanEntry>, PipelineError> {
    if paths.chunks_meta_path.exists() {
        let raw = std::fs::read_to_string(&paths.chunks_meta_path)?;
        let plan: Vec<ChunkPlanEntry> =
            serde_json::from_str(&raw).map_err(|e| PipelineError::SegmentationFailed(e.to_string()))?;
        return Ok(plan);
    }

    let duration = ctx.media.probe_duration_seconds(&paths.audio_wav()).await?;
    let raw_segments = match mode {
        ChunkMode::Silence => {
            let output = ctx
                .media
                .detect_silence(&paths.audio_wav(), &ctx.config.silence_db, ctx.config.silence_min_duration)
                .await?;
            let silences = segmenter::parse_silencedetect_output(&output);
            segmenter::segments_from_silence(&silences, duration, ctx.config.max_chunk_seconds)
        }
        ChunkMode::Vad => {
            // No VAD engine port is wired in this crate's default build (see
            // DESIGN.md) — mirrors the original's RuntimeError when no VAD
            // model is configured rather than silently mis-segmenting.
            return Err(PipelineError::SegmentationFailed(
                "chunk_mode=vad requires a configured VAD engine, which this build does not provide".to_string(),
            ));
        }
    };

    let plan: Vec<ChunkPlanEntry> = segmenter::to_plan(raw_segments)
        .into_iter()
        .map(|s| ChunkPlanEntry { index: s.index, start: s.start, end: s.end })
        .collect();

    ensure_directory(&paths.chunks_dir)?;
    let payload = serde_json::to_vec_pretty(&plan).map_err(|e| PipelineError::SegmentationFailed(e.to_string()))?;
    crate::shared::write_atomic(&paths.chunks_meta_path, &payload)?;
    Ok(plan)
}

async fn run(job_id: &str, ctx: &WorkerContext) -> Result<(), PipelineError> {
    let Some(state) = ctx.store.load(job_id).await? else {
        return Ok(());
    };
    if state.status == JobStatus::Canceled {
        return Ok(());
    }

    let paths = JobPaths::new(ctx.store.storage_root(), job_id);
    ensure_directory(&paths.logs_dir)?;
    let logger = JobLogger::new(paths.job_log())?;

    ctx.store.set_status(job_id, JobStatus::Splitting).await?;

    ensure_original(ctx, &state.input, &paths, &logger, state.options.cookies_from_browser.as_deref()).await?;
    normalize_audio(ctx, &paths, &logger).await?;
    let plan = plan_chunks(ctx, &paths, state.options.chunk_mode).await?;

    ensure_directory(&paths.chunks_dir)?;
    for entry in &plan {
        let Some(current) = ctx.store.load(job_id).await? else {
            return Ok(());
        };
        if current.status == JobStatus::Canceled {
            return Ok(());
        }

        let chunk_path = paths.chunk_path(entry.index);
        if chunk_path.exists() {
            continue;
        }
        ctx.media.export_chunk(&paths.audio_wav(), &chunk_path, entry.start, entry.end).await?;
    }

    ctx.store.set_progress(job_id, Some(plan.len()), None).await?;
    ctx.enqueue(QUEUE_TRANSCRIBER, job_id.to_string()).await;
    let _ = logger.write("splitter completed");
    Ok(())
}

/// Splits the job's source media into a canonical WAV and a chunk plan,
/// then exports per-chunk WAV files — spec.md §4.3.
pub async fn split_job(job_id: String, ctx: WorkerContext) -> anyhow::Result<()> {
    match run(&job_id, &ctx).await {
        Ok(()) => Ok(()),
        Err(err) if err.is_canceled() => Ok(()),
        Err(err) => {
            let _ = ctx.store.add_error(&job_id, err.to_string()).await;
            let _ = ctx.store.set_status(&job_id, JobStatus::Failed).await;
            let paths = JobPaths::new(ctx.store.storage_root(), &job_id);
            if let Ok(logger) = JobLogger::new(paths.job_log()) {
                let _ = logger.write(&format!("splitter failed: {err}"));
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use tokio::sync::OnceCell;

    use super::*;
    use crate::adapters::test_support::{FakeDownloader, FakeMediaTools, FakePdfWriter, FakeTranscriber, RecordingErrorMonitor};
    use crate::config::Config;
    use crate::jobs::{JobOptions, JobState, JobStore};

    #[tokio::test]
    async fn vad_chunk_mode_fails_the_job_without_a_configured_engine() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = WorkerContext {
            store: Arc::new(JobStore::new(dir.path().to_path_buf())),
            config: Arc::new(Config::for_tests(dir.path().to_path_buf())),
            downloader: Arc::new(FakeDownloader),
            media: Arc::new(FakeMediaTools::new(5.0, String::new())),
            transcriber: Arc::new(FakeTranscriber::new(vec![])),
            pdf_writer: Arc::new(FakePdfWriter),
            error_monitor: Arc::new(RecordingErrorMonitor::default()),
            queue: Arc::new(OnceCell::new()),
        };

        let job_id = "job-vad".to_string();
        let source = dir.path().join("source.mp4");
        std::fs::write(&source, b"fake-video-bytes").unwrap();
        let input = JobInput::Path { value: source.to_string_lossy().to_string() };
        let options = JobOptions { chunk_mode: ChunkMode::Vad, ..JobOptions::default() };
        let state = JobState::new(job_id.clone(), input, options, Utc::now());
        ctx.store.create(&state).await.unwrap();

        let result = split_job(job_id.clone(), ctx.clone()).await;
        assert!(result.is_err());

        let stored = ctx.store.load(&job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.errors.len(), 1);
    }
}
