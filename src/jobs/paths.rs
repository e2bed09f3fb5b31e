use std::path::{Path, PathBuf};

/// Resolves every on-disk location for a single job, rooted at
/// `<storage_root>/jobs/<job_id>/`. See spec.md §3 for the directory layout.
#[derive(Debug, Clone)]
pub struct JobPaths {
    pub job_dir: PathBuf,
    pub input_dir: PathBuf,
    pub chunks_dir: PathBuf,
    pub partials_dir: PathBuf,
    pub merged_dir: PathBuf,
    pub output_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub state_path: PathBuf,
    pub chunks_meta_path: PathBuf,
    pub manifest_path: PathBuf,
    job_id: String,
}

impl JobPaths {
    pub fn new(storage_root: &Path, job_id: &str) -> Self {
        let job_dir = storage_root.join("jobs").join(job_id);
        JobPaths {
            input_dir: job_dir.join("input"),
            chunks_dir: job_dir.join("chunks"),
            partials_dir: job_dir.join("partials"),
            merged_dir: job_dir.join("merged"),
            output_dir: job_dir.join("output"),
            logs_dir: job_dir.join("logs"),
            state_path: job_dir.join("job_state.json"),
            chunks_meta_path: job_dir.join("chunks.json"),
            manifest_path: job_dir.join("manifest.json"),
            job_id: job_id.to_string(),
            job_dir,
        }
    }

    pub fn original_mp4(&self) -> PathBuf {
        self.input_dir.join("original.mp4")
    }

    pub fn audio_wav(&self) -> PathBuf {
        self.input_dir.join("audio.wav")
    }

    pub fn final_json(&self) -> PathBuf {
        self.merged_dir.join("final.json")
    }

    pub fn final_txt(&self) -> PathBuf {
        self.merged_dir.join("final.txt")
    }

    pub fn final_vtt(&self) -> PathBuf {
        self.merged_dir.join("final.vtt")
    }

    pub fn chunk_path(&self, index: u32) -> PathBuf {
        self.chunks_dir.join(format!("{:04}.wav", index))
    }

    pub fn partial_path(&self, index: u32) -> PathBuf {
        self.partials_dir.join(format!("{:04}.json", index))
    }

    pub fn output_pdf(&self) -> PathBuf {
        self.output_dir.join("transcript.pdf")
    }

    pub fn output_zip(&self) -> PathBuf {
        self.output_dir
            .join(format!("sealium_transcription_{}.zip", self.job_id))
    }

    pub fn job_log(&self) -> PathBuf {
        self.logs_dir.join("job.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_and_partial_paths_are_zero_padded() {
        let paths = JobPaths::new(Path::new("/data"), "abc123");
        assert_eq!(paths.chunk_path(7), Path::new("/data/jobs/abc123/chunks/0007.wav"));
        assert_eq!(paths.partial_path(42), Path::new("/data/jobs/abc123/partials/0042.json"));
    }

    #[test]
    fn output_zip_embeds_job_id() {
        let paths = JobPaths::new(Path::new("/data"), "job-1");
        assert_eq!(
            paths.output_zip(),
            Path::new("/data/jobs/job-1/output/sealium_transcription_job-1.zip")
        );
    }
}
