//! Batch configuration

use crate::compress::CompressOptions;
use crate::error::{Result, UploadError};
use crate::pipeline::PipelineOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for a batch orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of images processed at once (default: 2)
    pub max_concurrent: usize,

    /// Pause between job status queries in milliseconds (default: 5000)
    pub poll_interval_ms: u64,

    /// Abandon a job that is still processing after this many milliseconds
    /// (default: poll until the job finishes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_deadline_ms: Option<u64>,

    /// Compression tuning, including the upload cap
    pub compress: CompressOptions,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            poll_interval_ms: 5_000,
            poll_deadline_ms: None,
            compress: CompressOptions::default(),
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn poll_deadline(mut self, deadline: Duration) -> Self {
        self.poll_deadline_ms = Some(u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn compress(mut self, compress: CompressOptions) -> Self {
        self.compress = compress;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.compress.max_upload_bytes = bytes;
        self
    }

    /// Options handed to every pipeline run of a batch
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            poll_deadline: self.poll_deadline_ms.map(Duration::from_millis),
            max_upload_bytes: self.compress.max_upload_bytes,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(UploadError::invalid_parameter(
                "max_concurrent",
                "At least one image must be processed at a time",
            ));
        }

        if self.poll_deadline_ms == Some(0) {
            return Err(UploadError::invalid_parameter(
                "poll_deadline_ms",
                "Poll deadline must be greater than 0",
            ));
        }

        self.compress.validate()?;
        self.pipeline_options().validate()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(UploadError::from)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: BatchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            UploadError::config_error(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }
}
