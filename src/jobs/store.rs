use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;

use super::cache::{cache_key, JobCache};
use super::models::{JobState, JobStatus};
use crate::shared::write_atomic;

#[derive(Error, Debug)]
pub enum JobStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("job state is corrupted: {0}")]
    StateCorrupted(String),
}

/// Durable mapping from job id to state, with an optional fast cache.
///
/// `job_state.json` is authoritative on restart (spec.md §3, §9): the cache
/// is consulted first for reads because it is faster, but every write goes
/// to the file first so a crash never loses state the cache claims to have.
pub struct JobStore {
    storage_root: PathBuf,
    cache: Option<Arc<dyn JobCache>>,
    // Per-job lock so add_error/set_progress read-modify-write is atomic
    // per call, per spec.md §4.1 concurrency note.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl JobStore {
    pub fn new(storage_root: PathBuf) -> Self {
        JobStore {
            storage_root,
            cache: None,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_cache(storage_root: PathBuf, cache: Arc<dyn JobCache>) -> Self {
        JobStore {
            storage_root,
            cache: Some(cache),
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn state_path(&self, job_id: &str) -> PathBuf {
        self.storage_root.join("jobs").join(job_id).join("job_state.json")
    }

    async fn lock_for(&self, job_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(job_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn read_file(&self, job_id: &str) -> Result<Option<JobState>, JobStoreError> {
        let path = self.state_path(job_id);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)?;
        let state = serde_json::from_str(&raw)
            .map_err(|e| JobStoreError::StateCorrupted(e.to_string()))?;
        Ok(Some(state))
    }

    fn write_file(&self, state: &JobState) -> Result<(), JobStoreError> {
        let path = self.state_path(&state.job_id);
        let payload = serde_json::to_vec_pretty(state)
            .map_err(|e| JobStoreError::StateCorrupted(e.to_string()))?;
        write_atomic(&path, &payload)?;
        Ok(())
    }

    async fn mirror_cache(&self, state: &JobState) {
        if let Some(cache) = &self.cache {
            if let Ok(payload) = serde_json::to_string(state) {
                cache.set(&cache_key(&state.job_id), payload).await;
            }
        }
    }

    /// Create the durable state record for a new job.
    pub async fn create(&self, state: &JobState) -> Result<(), JobStoreError> {
        self.write_file(state)?;
        self.mirror_cache(state).await;
        Ok(())
    }

    /// Load state: missing file is `Ok(None)`, not an error; corrupt JSON
    /// surfaces as `StateCorrupted`.
    pub async fn load(&self, job_id: &str) -> Result<Option<JobState>, JobStoreError> {
        if let Some(cache) = &self.cache {
            if let Some(raw) = cache.get(&cache_key(job_id)).await {
                if let Ok(state) = serde_json::from_str::<JobState>(&raw) {
                    return Ok(Some(state));
                }
            }
        }
        self.read_file(job_id)
    }

    pub async fn save(&self, state: &JobState) -> Result<(), JobStoreError> {
        self.write_file(state)?;
        self.mirror_cache(state).await;
        Ok(())
    }

    async fn update_with<F>(&self, job_id: &str, f: F) -> Result<Option<JobState>, JobStoreError>
    where
        F: FnOnce(&mut JobState),
    {
        let lock = self.lock_for(job_id).await;
        let _guard = lock.lock().await;

        let Some(mut state) = self.load(job_id).await? else {
            return Ok(None);
        };
        f(&mut state);
        state.timestamps.updated_at = Utc::now();
        self.save(&state).await?;
        Ok(Some(state))
    }

    pub async fn set_status(&self, job_id: &str, status: JobStatus) -> Result<Option<JobState>, JobStoreError> {
        self.update_with(job_id, |state| {
            state.status = status;
            let now = Utc::now();
            if status.is_working() && state.timestamps.started_at.is_none() {
                state.timestamps.started_at = Some(now);
            }
            if status.is_terminal() && state.timestamps.finished_at.is_none() {
                state.timestamps.finished_at = Some(now);
            }
        })
        .await
    }

    pub async fn set_progress(
        &self,
        job_id: &str,
        chunks_total: Option<usize>,
        chunks_done: Option<usize>,
    ) -> Result<Option<JobState>, JobStoreError> {
        self.update_with(job_id, |state| {
            if let Some(total) = chunks_total {
                state.progress.chunks_total = total;
            }
            if let Some(done) = chunks_done {
                state.progress.chunks_done = done;
            }
            state.progress.recompute_percent();
        })
        .await
    }

    pub async fn add_error(&self, job_id: &str, message: String) -> Result<Option<JobState>, JobStoreError> {
        self.update_with(job_id, |state| state.errors.push(message)).await
    }

    pub async fn set_result(
        &self,
        job_id: &str,
        zip_path: String,
        download_name: String,
    ) -> Result<Option<JobState>, JobStoreError> {
        self.update_with(job_id, |state| {
            state.result = Some(super::models::JobResult {
                zip_path: Some(zip_path),
                download_name: Some(download_name),
            });
        })
        .await
    }

    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.storage_root.join("jobs").join(job_id)
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::models::{JobInput, JobOptions};

    fn make_state(job_id: &str) -> JobState {
        JobState::new(
            job_id.to_string(),
            JobInput::Url { value: "https://example.com/a.mp4".to_string() },
            JobOptions::default(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn load_missing_job_returns_none_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path().to_path_buf());
        assert!(store.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_state_file_surfaces_as_state_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path().to_path_buf());
        let job_dir = store.job_dir("bad");
        std::fs::create_dir_all(&job_dir).unwrap();
        std::fs::write(job_dir.join("job_state.json"), b"not json").unwrap();

        let err = store.load("bad").await.unwrap_err();
        assert!(matches!(err, JobStoreError::StateCorrupted(_)));
    }

    // S5: create in queued, set splitting, set progress (10,3) -> percent 30,
    // started_at set, finished_at unset; then set done -> finished_at set,
    // percent preserved.
    #[tokio::test]
    async fn s5_job_store_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path().to_path_buf());
        let state = make_state("job-s5");
        store.create(&state).await.unwrap();

        let state = store.set_status("job-s5", JobStatus::Splitting).await.unwrap().unwrap();
        assert_eq!(state.status, JobStatus::Splitting);
        assert!(state.timestamps.started_at.is_some());
        assert!(state.timestamps.finished_at.is_none());

        let state = store
            .set_progress("job-s5", Some(10), Some(3))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.progress.percent, 30);

        let state = store.set_status("job-s5", JobStatus::Done).await.unwrap().unwrap();
        assert!(state.timestamps.finished_at.is_some());
        assert_eq!(state.progress.percent, 30);
    }

    #[tokio::test]
    async fn add_error_appends_and_updates_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path().to_path_buf());
        let state = make_state("job-err");
        store.create(&state).await.unwrap();

        store.add_error("job-err", "boom".to_string()).await.unwrap();
        let state = store.add_error("job-err", "boom again".to_string()).await.unwrap().unwrap();
        assert_eq!(state.errors, vec!["boom".to_string(), "boom again".to_string()]);
    }

    #[tokio::test]
    async fn cache_mirrors_but_file_is_authoritative_on_restart() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(super::super::cache::InMemoryJobCache::new());
        let store = JobStore::with_cache(dir.path().to_path_buf(), cache.clone());
        let state = make_state("job-cache");
        store.create(&state).await.unwrap();

        // Simulate a restart with a fresh cache: file is still readable.
        let fresh_store = JobStore::new(dir.path().to_path_buf());
        let reloaded = fresh_store.load("job-cache").await.unwrap().unwrap();
        assert_eq!(reloaded.job_id, "job-cache");
    }
}
