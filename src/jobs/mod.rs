pub mod cache;
pub mod logger;
pub mod models;
pub mod paths;
pub mod queue;
pub mod store;

pub use cache::{InMemoryJobCache, JobCache};
pub use logger::JobLogger;
pub use models::{
    ChunkMode, ChunkPlanEntry, JobInput, JobOptions, JobProgress, JobResult, JobState, JobStatus,
    JobTimestamps, PartialSegment, PartialTranscript,
};
pub use paths::JobPaths;
pub use queue::{InMemoryQueue, Queue, RetryPolicy, SyncQueue};
pub use store::{JobStore, JobStoreError};
