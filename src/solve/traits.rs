//! Collaborator seams consumed by the upload pipeline
//!
//! All implementations must be safe to call concurrently from many pipeline
//! tasks; each task works on a distinct image.

use crate::error::Result;
use crate::solve::types::{JobStatus, SolveResult, StoredSolve};
use crate::types::{ContentHash, JobId, SolveId};
use async_trait::async_trait;

/// Local lookup of previously solved images by content hash
#[async_trait]
pub trait SolveCache: Send + Sync {
    async fn lookup(&self, hash: &ContentHash) -> Result<Option<StoredSolve>>;
}

/// Client for the remote plate-solving service
#[async_trait]
pub trait RemoteSolveClient: Send + Sync {
    /// Submit compressed image bytes, returning the id of the created job
    async fn submit(&self, image: &[u8]) -> Result<JobId>;

    /// Query the current status of a job
    async fn poll_status(&self, job: &JobId) -> Result<JobStatus>;
}

/// Persistent store for solve results
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn save(&self, solve: SolveResult) -> Result<SolveId>;

    async fn get_by_id(&self, id: SolveId) -> Result<Option<StoredSolve>>;

    /// Remove a result; returns false when no result had that id
    async fn delete(&self, id: SolveId) -> Result<bool>;
}
