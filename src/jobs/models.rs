use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status progression: queued<splitting<transcribing<merging<packaging<done.
/// `canceled` and `failed` are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Splitting,
    Transcribing,
    Merging,
    Packaging,
    Done,
    Failed,
    Canceled,
}

impl JobStatus {
    /// Ordinal used to check that a transition never regresses, except into
    /// a terminal status which can supersede any non-terminal one.
    fn order(self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Splitting => 1,
            JobStatus::Transcribing => 2,
            JobStatus::Merging => 3,
            JobStatus::Packaging => 4,
            JobStatus::Done => 5,
            JobStatus::Failed => 6,
            JobStatus::Canceled => 6,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed | JobStatus::Canceled)
    }

    pub fn is_working(self) -> bool {
        matches!(
            self,
            JobStatus::Splitting | JobStatus::Transcribing | JobStatus::Merging | JobStatus::Packaging
        )
    }

    /// Whether moving from `self` to `next` is a legal progression.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if next == JobStatus::Canceled {
            return !self.is_terminal() || self == JobStatus::Canceled;
        }
        if self.is_terminal() {
            return self == next;
        }
        next.order() >= self.order()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobInput {
    Url { value: String },
    Path { value: String },
    Upload { value: String },
}

impl JobInput {
    pub fn value(&self) -> &str {
        match self {
            JobInput::Url { value } | JobInput::Path { value } | JobInput::Upload { value } => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkMode {
    #[default]
    Silence,
    Vad,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOptions {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_chunk_mode")]
    pub chunk_mode: ChunkMode,
    #[serde(default = "default_max_parallel_chunks")]
    pub max_parallel_chunks: usize,
    #[serde(default = "default_true")]
    pub produce_json: bool,
    #[serde(default = "default_true")]
    pub produce_vtt: bool,
    #[serde(default = "default_true")]
    pub produce_pdf: bool,
    #[serde(default)]
    pub cookies_from_browser: Option<String>,
}

fn default_language() -> String {
    "es".to_string()
}

fn default_chunk_mode() -> ChunkMode {
    ChunkMode::Silence
}

fn default_max_parallel_chunks() -> usize {
    2
}

fn default_true() -> bool {
    true
}

impl Default for JobOptions {
    fn default() -> Self {
        JobOptions {
            language: default_language(),
            chunk_mode: default_chunk_mode(),
            max_parallel_chunks: default_max_parallel_chunks(),
            produce_json: true,
            produce_vtt: true,
            produce_pdf: true,
            cookies_from_browser: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct JobProgress {
    pub chunks_total: usize,
    pub chunks_done: usize,
    pub percent: u32,
}

impl JobProgress {
    pub fn recompute_percent(&mut self) {
        self.percent = if self.chunks_total > 0 {
            ((self.chunks_done as f64 / self.chunks_total as f64) * 100.0).floor() as u32
        } else {
            0
        };
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTimestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobTimestamps {
    pub fn new(now: DateTime<Utc>) -> Self {
        JobTimestamps {
            created_at: now,
            updated_at: now,
            started_at: None,
            finished_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobResult {
    pub zip_path: Option<String>,
    pub download_name: Option<String>,
}

/// One entry of the persisted `chunks.json` plan (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkPlanEntry {
    pub index: u32,
    pub start: f64,
    pub end: f64,
}

/// One `partials/NNNN.json` transcript (spec.md §3). Segment coordinates
/// are absolute media time (chunk-local time plus `chunk_start`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialTranscript {
    pub chunk_index: u32,
    pub chunk_start: f64,
    pub chunk_end: f64,
    pub segments: Vec<PartialSegment>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: JobProgress,
    pub timestamps: JobTimestamps,
    pub input: JobInput,
    #[serde(default)]
    pub options: JobOptions,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub result: Option<JobResult>,
}

impl JobState {
    pub fn new(job_id: String, input: JobInput, options: JobOptions, now: DateTime<Utc>) -> Self {
        JobState {
            job_id,
            status: JobStatus::Queued,
            progress: JobProgress::default(),
            timestamps: JobTimestamps::new(now),
            input,
            options,
            errors: Vec::new(),
            result: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_progression_is_monotonic() {
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Splitting));
        assert!(!JobStatus::Transcribing.can_transition_to(JobStatus::Splitting));
        assert!(JobStatus::Transcribing.can_transition_to(JobStatus::Transcribing));
    }

    #[test]
    fn canceled_supersedes_any_non_terminal_status() {
        assert!(JobStatus::Splitting.can_transition_to(JobStatus::Canceled));
        assert!(JobStatus::Merging.can_transition_to(JobStatus::Canceled));
        assert!(!JobStatus::Done.can_transition_to(JobStatus::Canceled));
    }

    #[test]
    fn percent_floors_and_handles_zero_total() {
        let mut p = JobProgress { chunks_total: 0, chunks_done: 0, percent: 0 };
        p.recompute_percent();
        assert_eq!(p.percent, 0);

        let mut p = JobProgress { chunks_total: 10, chunks_done: 3, percent: 0 };
        p.recompute_percent();
        assert_eq!(p.percent, 30);
    }
}
