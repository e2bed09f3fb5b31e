use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Fast mirror of job state, keyed `transcription:job:<id>`. The job
/// directory's `job_state.json` remains authoritative on disk (spec.md §3);
/// a cache is an optional accelerator, never the only copy.
#[async_trait]
pub trait JobCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String);
}

pub fn cache_key(job_id: &str) -> String {
    format!("transcription:job:{}", job_id)
}

/// In-process cache mirror, grounded in the teacher's `CacheManager`
/// (an `Arc<RwLock<HashMap<..>>>` index) minus the LRU eviction that
/// `CacheManager` needs for chunk bytes and this KV mirror does not.
#[derive(Default, Clone)]
pub struct InMemoryJobCache {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryJobCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobCache for InMemoryJobCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: String) {
        self.entries.write().await.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_value() {
        let cache = InMemoryJobCache::new();
        let key = cache_key("job-1");
        assert!(cache.get(&key).await.is_none());
        cache.set(&key, "{}".to_string()).await;
        assert_eq!(cache.get(&key).await, Some("{}".to_string()));
    }
}
