use std::io::Write as _;

use chrono::Utc;
use serde_json::json;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::errors::PipelineError;
use crate::jobs::{JobLogger, JobPaths, JobStatus};
use crate::shared::hash_file_sha256;

use super::WorkerContext;

/// The fixed set of artifacts the manifest records, per original
/// `_write_manifest` — not every intermediate file (chunks, partials) is
/// covered, only the deliverable top-level ones.
const MANIFEST_PATHS: &[&str] = &[
    "input/original.mp4",
    "output/transcript.pdf",
    "merged/final.json",
    "merged/final.vtt",
    "merged/final.txt",
];

fn write_manifest(paths: &JobPaths, job_id: &str) -> Result<(), PipelineError> {
    let mut files = serde_json::Map::new();
    for rel in MANIFEST_PATHS {
        let fp = paths.job_dir.join(rel);
        if fp.exists() {
            let sha256 = hash_file_sha256(&fp)?;
            let size = fp.metadata()?.len();
            files.insert(rel.to_string(), json!({"sha256": sha256, "size": size}));
        }
    }

    let payload = json!({
        "job_id": job_id,
        "created_at": Utc::now().to_rfc3339(),
        "files": files,
    });
    let bytes = serde_json::to_vec_pretty(&payload).map_err(|e| PipelineError::PackagingFailed(e.to_string()))?;
    crate::shared::write_atomic(&paths.manifest_path, &bytes)?;
    Ok(())
}

fn load_non_blank_lines(final_txt: &std::path::Path) -> std::io::Result<Vec<String>> {
    if !final_txt.exists() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(final_txt)?;
    Ok(text.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect())
}

/// Builds the deliverable zip, rewriting archive names away from the job
/// directory's `input/`/`merged/`/`output/` prefixes, per spec.md §4.6.
/// Writes to a temp path then renames so concurrent readers never observe
/// a half-written archive (spec.md §9 ambiguity ii).
fn build_zip(paths: &JobPaths, produce_json: bool, produce_vtt: bool) -> Result<std::path::PathBuf, PipelineError> {
    crate::shared::ensure_directory(&paths.output_dir)?;
    let zip_path = paths.output_zip();
    let tmp_path = zip_path.with_extension("zip.tmp");

    let file = std::fs::File::create(&tmp_path)?;
    let mut zw = ZipWriter::new(file);
    let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let add = |zw: &mut ZipWriter<std::fs::File>, src: &std::path::Path, arcname: &str| -> Result<(), PipelineError> {
        if !src.exists() {
            return Ok(());
        }
        let bytes = std::fs::read(src)?;
        zw.start_file(arcname, opts).map_err(|e| PipelineError::PackagingFailed(e.to_string()))?;
        zw.write_all(&bytes)?;
        Ok(())
    };

    add(&mut zw, &paths.original_mp4(), "video.mp4")?;
    add(&mut zw, &paths.output_pdf(), "transcript.pdf")?;
    if produce_json {
        add(&mut zw, &paths.final_json(), "transcript.json")?;
    }
    if produce_vtt {
        add(&mut zw, &paths.final_vtt(), "transcript.vtt")?;
    }
    add(&mut zw, &paths.final_txt(), "transcript.txt")?;
    add(&mut zw, &paths.manifest_path, "manifest.json")?;

    if paths.logs_dir.exists() {
        for entry in std::fs::read_dir(&paths.logs_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|ext| ext == "log").unwrap_or(false) {
                let arcname = format!("logs/{}", path.file_name().and_then(|n| n.to_str()).unwrap_or("job.log"));
                add(&mut zw, &path, &arcname)?;
            }
        }
    }

    zw.finish().map_err(|e| PipelineError::PackagingFailed(e.to_string()))?;
    std::fs::rename(&tmp_path, &zip_path)?;
    Ok(zip_path)
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

    ctx.store.set_status(job_id, JobStatus::Packaging).await?;
    crate::shared::ensure_directory(&paths.output_dir)?;

    if state.options.produce_pdf {
        let transcript_lines = load_non_blank_lines(&paths.final_txt())?;
        let title = format!("Transcription {job_id}");
        let source_url = match &state.input {
            crate::jobs::JobInput::Url { value } => Some(value.as_str()),
            _ => None,
        };
        ctx.pdf_writer
            .write_pdf(&paths.output_pdf(), Some(&title), source_url, &transcript_lines, &ctx.config.sponsor_text)
            .await?;
    }

    write_manifest(&paths, job_id)?;
    let zip_path = build_zip(&paths, state.options.produce_json, state.options.produce_vtt)?;

    let download_name = zip_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("transcription.zip")
        .to_string();
    ctx.store.set_result(job_id, zip_path.to_string_lossy().to_string(), download_name).await?;
    ctx.store.set_status(job_id, JobStatus::Done).await?;
    let _ = logger.write("packager completed");
    Ok(())
}

/// Renders the optional PDF, computes the hash manifest, and builds the
/// deliverable zip — spec.md §4.6.
pub async fn package_job(job_id: String, ctx: WorkerContext) -> anyhow::Result<()> {
    match run(&job_id, &ctx).await {
        Ok(()) => Ok(()),
        Err(err) if err.is_canceled() => Ok(()),
        Err(err) => {
            let _ = ctx.store.add_error(&job_id, err.to_string()).await;
            let _ = ctx.store.set_status(&job_id, JobStatus::Failed).await;
            let paths = JobPaths::new(ctx.store.storage_root(), &job_id);
            if let Ok(logger) = JobLogger::new(paths.job_log()) {
                let _ = logger.write(&format!("packager failed: {err}"));
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_records_sha256_and_size_for_existing_fixed_paths() {
        let dir = tempfile::tempdir().unwrap();
        let paths = JobPaths::new(dir.path(), "job-manifest");
        std::fs::create_dir_all(&paths.input_dir).unwrap();
        std::fs::create_dir_all(&paths.merged_dir).unwrap();
        std::fs::write(paths.original_mp4(), b"video-bytes").unwrap();
        std::fs::write(paths.final_txt(), b"hola mundo\n").unwrap();

        write_manifest(&paths, "job-manifest").unwrap();
        let manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths.manifest_path).unwrap()).unwrap();
        let files = manifest["files"].as_object().unwrap();
        assert!(files.contains_key("input/original.mp4"));
        assert!(files.contains_key("merged/final.txt"));
        assert!(!files.contains_key("merged/final.json"));
    }

    #[test]
    fn zip_build_contains_rewritten_archive_names() {
        let dir = tempfile::tempdir().unwrap();
        let paths = JobPaths::new(dir.path(), "job-zip");
        std::fs::create_dir_all(&paths.merged_dir).unwrap();
        std::fs::create_dir_all(&paths.logs_dir).unwrap();
        std::fs::write(paths.final_txt(), b"hola\n").unwrap();
        std::fs::write(paths.job_log(), b"[t] line\n").unwrap();
        write_manifest(&paths, "job-zip").unwrap();

        let zip_path = build_zip(&paths, false, false).unwrap();
        let file = std::fs::File::open(&zip_path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let names: Vec<String> = (0..archive.len()).map(|i| archive.by_index(i).unwrap().name().to_string()).collect();
        assert!(names.contains(&"transcript.txt".to_string()));
        assert!(names.contains(&"manifest.json".to_string()));
        assert!(names.contains(&"logs/job.log".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("merged/")));
    }
}
