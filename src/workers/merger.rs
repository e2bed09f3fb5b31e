use crate::errors::PipelineError;
use crate::jobs::queue::QUEUE_PACKAGER;
use crate::jobs::{JobLogger, JobPaths, JobStatus, PartialTranscript};
use crate::processing::merge::{normalize_segments, write_merge_outputs};
use crate::processing::vtt::TimedText;

use super::WorkerContext;

fn load_all_partials(paths: &JobPaths) -> Result<Vec<TimedText>, PipelineError> {
    let mut entries: Vec<_> = std::fs::read_dir(&paths.partials_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    entries.sort();

    let mut segments = Vec::new();
    for path in entries {
        let raw = std::fs::read_to_string(&path)?;
        let partial: PartialTranscript =
            serde_json::from_str(&raw).map_err(|e| PipelineError::MergeFailed(e.to_string()))?;
        segments.extend(
            partial
                .segments
                .into_iter()
                .map(|s| TimedText { start: s.start, end: s.end, text: s.text }),
        );
    }
    Ok(segments)
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

    ctx.store.set_status(job_id, JobStatus::Merging).await?;

    let raw_segments = load_all_partials(&paths)?;
    let merged = normalize_segments(raw_segments);

    crate::shared::ensure_directory(&paths.merged_dir)?;
    write_merge_outputs(&paths.merged_dir, &merged, state.options.produce_json, state.options.produce_vtt)?;

    ctx.enqueue(QUEUE_PACKAGER, job_id.to_string()).await;
    let _ = logger.write("merger completed");
    Ok(())
}

/// Flattens every chunk's partial transcript into one non-overlapping,
/// de-duplicated segment list and writes the merged outputs — spec.md §4.5.
pub async fn merge_job(job_id: String, ctx: WorkerContext) -> anyhow::Result<()> {
    match run(&job_id, &ctx).await {
        Ok(()) => Ok(()),
        Err(err) if err.is_canceled() => Ok(()),
        Err(err) => {
            let _ = ctx.store.add_error(&job_id, err.to_string()).await;
            let _ = ctx.store.set_status(&job_id, JobStatus::Failed).await;
            let paths = JobPaths::new(ctx.store.storage_root(), &job_id);
            if let Ok(logger) = JobLogger::new(paths.job_log()) {
                let _ = logger.write(&format!("merger failed: {err}"));
            }
            Err(err.into())
        }
    }
}
