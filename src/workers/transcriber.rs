use futures::stream::{self, StreamExt};

use crate::errors::PipelineError;
use crate::jobs::queue::QUEUE_MERGER;
use crate::jobs::{ChunkPlanEntry, JobLogger, JobPaths, JobStatus, PartialSegment, PartialTranscript};
use crate::processing::chunk_transcriber;

use super::WorkerContext;

fn load_plan(paths: &JobPaths) -> Result<Vec<ChunkPlanEntry>, PipelineError> {
    let raw = std::fs::read_to_string(&paths.chunks_meta_path)?;
    serde_json::from_str(&raw).map_err(|e| PipelineError::SegmentationFailed(e.to_string()))
}

async fn transcribe_one(
    ctx: &WorkerContext,
    paths: &JobPaths,
    entry: ChunkPlanEntry,
    language: &str,
) -> Result<(), PipelineError> {
    let chunk_path = paths.chunk_path(entry.index);
    let result = chunk_transcriber::transcribe_chunk(ctx.transcriber.as_ref(), &chunk_path, entry.start, language).await?;

    let partial = PartialTranscript {
        chunk_index: entry.index,
        chunk_start: entry.start,
        chunk_end: entry.end,
        segments: result
            .segments
            .into_iter()
            .map(|s| PartialSegment { start: s.start, end: s.end, text: s.text })
            .collect(),
        text: result.text,
    };

    let payload = serde_json::to_vec_pretty(&partial).map_err(|e| PipelineError::PartialWriteFailed(e.to_string()))?;
    crate::shared::write_atomic(&paths.partial_path(entry.index), &payload)?;
    Ok(())
}

async fn run(job_id: &str, ctx: &WorkerContext) -> Result<(), PipelineError> {
    let Some(state) = ctx.store.load(job_id).await? else {
        return Ok(());
    };
    if state.status == JobStatus::Canceled {
        return Ok(());
    }

    let paths = JobPaths::new(ctx.store.storage_root(), job_id);
    let logger = JobLogger::new(paths.job_log())?;

    let plan = load_plan(&paths)?;
    let missing: Vec<ChunkPlanEntry> = plan
        .iter()
        .copied()
        .filter(|entry| !paths.partial_path(entry.index).exists())
        .collect();

    if missing.is_empty() {
        ctx.enqueue(QUEUE_MERGER, job_id.to_string()).await;
        return Ok(());
    }

    ctx.store.set_status(job_id, JobStatus::Transcribing).await?;
    let done_initially = plan.len() - missing.len();
    ctx.store.set_progress(job_id, Some(plan.len()), Some(done_initially)).await?;

    let max_parallel = state.options.max_parallel_chunks.max(1).min(missing.len().max(1));
    let language = state.options.language.clone();

    // Each chunk transcription is spawned as its own task rather than driven
    // inline, so that an early return below (on cancellation) only stops
    // this function from waiting on the rest — the already-dispatched ASR
    // calls keep running on the runtime and still write their partials.
    let mut done = done_initially;
    let mut results = stream::iter(missing.into_iter().map(|entry| {
        let ctx = ctx.clone();
        let paths = paths.clone();
        let language = language.clone();
        let handle = tokio::spawn(async move {
            let result = transcribe_one(&ctx, &paths, entry, &language).await;
            (entry, result)
        });
        async move {
            match handle.await {
                Ok(pair) => pair,
                Err(join_err) => (entry, Err(PipelineError::PartialWriteFailed(join_err.to_string()))),
            }
        }
    }))
    .buffer_unordered(max_parallel);

    while let Some((entry, result)) = results.next().await {
        result.map_err(|err| {
            PipelineError::AsrFailed(crate::ports::transcriber::TranscriberError::Engine(format!(
                "chunk {}: {err}",
                entry.index
            )))
        })?;
        done += 1;
        ctx.store.set_progress(job_id, None, Some(done)).await?;

        if let Some(current) = ctx.store.load(job_id).await? {
            if current.status == JobStatus::Canceled {
                return Ok(());
            }
        }
    }

    ctx.enqueue(QUEUE_MERGER, job_id.to_string()).await;
    let _ = logger.write("transcriber completed");
    Ok(())
}

/// Runs the ASR black box over every chunk still missing a partial
/// transcript, bounded to `max_parallel_chunks` concurrent calls —
/// spec.md §4.4.
pub async fn transcribe_job(job_id: String, ctx: WorkerContext) -> anyhow::Result<()> {
    match run(&job_id, &ctx).await {
        Ok(()) => Ok(()),
        Err(err) if err.is_canceled() => Ok(()),
        Err(err) => {
            let _ = ctx.store.add_error(&job_id, err.to_string()).await;
            let _ = ctx.store.set_status(&job_id, JobStatus::Failed).await;
            let paths = JobPaths::new(ctx.store.storage_root(), &job_id);
            if let Ok(logger) = JobLogger::new(paths.job_log()) {
                let _ = logger.write(&format!("transcriber failed: {err}"));
            }
            Err(err.into())
        }
    }
}
