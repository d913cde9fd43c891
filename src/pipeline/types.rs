use crate::compress::DEFAULT_MAX_UPLOAD_BYTES;
use crate::error::{Result, UploadError};
use crate::types::{JobId, SolveId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Default pause between job status queries
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Stage of an item that is being processed, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStep {
    CheckingCache,
    Compressing,
    Uploading,
    Analyzing,
    Saving,
}

impl fmt::Display for UploadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UploadStep::CheckingCache => "Checking cache...",
            UploadStep::Compressing => "Compressing...",
            UploadStep::Uploading => "Uploading...",
            UploadStep::Analyzing => "Analyzing stars...",
            UploadStep::Saving => "Saving...",
        };
        f.write_str(label)
    }
}

/// Lifecycle state of one image in a batch
///
/// States only move forward: `Pending`, then `Processing` through the steps
/// in order, then exactly one of `Completed` or `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum ItemState {
    Pending,
    Processing(UploadStep),
    Completed(SolveId),
    Failed(String),
}

impl ItemState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemState::Completed(_) | ItemState::Failed(_))
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, ItemState::Processing(_))
    }

    fn rank(&self) -> u8 {
        match self {
            ItemState::Pending => 0,
            ItemState::Processing(step) => 1 + *step as u8,
            ItemState::Completed(_) | ItemState::Failed(_) => u8::MAX,
        }
    }

    /// Whether moving from `self` to `next` advances the lifecycle
    pub fn can_advance_to(&self, next: &ItemState) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }

    pub fn solve_id(&self) -> Option<SolveId> {
        match self {
            ItemState::Completed(id) => Some(*id),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ItemState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemState::Pending => write!(f, "Pending"),
            ItemState::Processing(step) => write!(f, "{}", step),
            ItemState::Completed(id) => write!(f, "Completed (#{})", id),
            ItemState::Failed(message) => write!(f, "Failed: {}", message),
        }
    }
}

/// A remote job owned by the pipeline that submitted it
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub polls: u32,
    pub submitted_at: Instant,
}

impl Job {
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            polls: 0,
            submitted_at: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.submitted_at.elapsed()
    }
}

/// Receives every state change of one pipeline run
pub trait TransitionSink: Send + Sync {
    fn transition(&self, state: ItemState);
}

impl<F> TransitionSink for F
where
    F: Fn(ItemState) + Send + Sync,
{
    fn transition(&self, state: ItemState) {
        self(state)
    }
}

/// Per-item tuning shared by every pipeline in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub poll_interval: Duration,
    /// Give up on a job after this long; `None` polls until a terminal status
    pub poll_deadline: Option<Duration>,
    pub max_upload_bytes: u64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_deadline: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn poll_deadline(mut self, deadline: Duration) -> Self {
        self.poll_deadline = Some(deadline);
        self
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(UploadError::invalid_parameter(
                "poll_interval",
                "Poll interval must be greater than 0",
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(UploadError::invalid_parameter(
                "max_upload_bytes",
                "Upload cap must be greater than 0",
            ));
        }

        Ok(())
    }
}
