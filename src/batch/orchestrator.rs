//! Batch orchestration
//!
//! This module provides the [`BatchOrchestrator`], which runs one upload
//! pipeline per selected image under a concurrency bound and publishes the
//! aggregated status of the batch as a stream of snapshots.

use crate::batch::config::BatchConfig;
use crate::batch::status::StatusTable;
use crate::batch::stream::BatchProgressStream;
use crate::batch::types::{BatchResult, BatchSnapshot};
use crate::error::{Result, UploadError};
use crate::pipeline::{ItemState, PipelineServices, UploadPipeline};
use crate::types::ImageRef;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};

/// The batch currently owned by an orchestrator
struct ActiveBatch {
    table: Arc<StatusTable>,
    driver: JoinHandle<()>,
}

impl ActiveBatch {
    fn cancel(self) {
        self.table.close();
        self.driver.abort();
    }
}

/// Runs upload pipelines for a batch of images
///
/// At most `max_concurrent` images are processed at once. An image holds its
/// slot for its whole pipeline, including the time spent waiting on the
/// remote job. Starting a new batch, cancelling or resetting tears down the
/// previous batch and its status table.
pub struct BatchOrchestrator {
    pipeline: Arc<UploadPipeline>,
    config: BatchConfig,
    items: Vec<ImageRef>,
    active: Option<ActiveBatch>,
}

impl BatchOrchestrator {
    /// Create an orchestrator
    ///
    /// # Arguments
    ///
    /// * `services` - Collaborators used by every pipeline run. The default
    ///   compressor is replaced by one tuned with `config.compress`; a custom
    ///   compressor is kept as given.
    /// * `config` - Concurrency, polling and compression settings
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(services: PipelineServices, config: BatchConfig) -> Result<Self> {
        config.validate()?;
        let services = if services.uses_default_compressor() {
            services.with_compress_options(config.compress)
        } else {
            services
        };
        let pipeline = UploadPipeline::new(services, config.pipeline_options());

        Ok(Self {
            pipeline: Arc::new(pipeline),
            config,
            items: Vec::new(),
            active: None,
        })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Images of the most recently started batch
    pub fn items(&self) -> &[ImageRef] {
        &self.items
    }

    /// Start processing a batch of images
    ///
    /// Any batch still running is cancelled first. Every image starts out
    /// `Pending` and that initial snapshot is the first value on the returned
    /// stream. Repeated references are processed once, at their first
    /// position.
    ///
    /// # Errors
    ///
    /// Returns an error if `items` is empty or no Tokio runtime is running.
    pub fn start(&mut self, items: Vec<ImageRef>) -> Result<BatchProgressStream> {
        if items.is_empty() {
            return Err(UploadError::invalid_parameter(
                "items",
                "Batch must contain at least one image",
            ));
        }

        let runtime = Handle::try_current()
            .map_err(|e| UploadError::config_error(format!("No Tokio runtime: {}", e)))?;

        self.cancel();

        let mut seen = HashSet::new();
        let items: Vec<ImageRef> = items
            .into_iter()
            .filter(|image| seen.insert(image.clone()))
            .collect();
        self.items = items.clone();

        let (updates, receiver) = unbounded_channel();
        let table = Arc::new(StatusTable::new(items.clone(), updates));
        table.publish();

        info!(
            "starting batch of {} images, {} at a time",
            items.len(),
            self.config.max_concurrent
        );
        let driver = runtime.spawn(drive(
            Arc::clone(&self.pipeline),
            Arc::clone(&table),
            items,
            self.config.max_concurrent,
        ));

        self.active = Some(ActiveBatch { table, driver });
        Ok(BatchProgressStream::new(receiver))
    }

    /// Start again with the images of the previous batch
    ///
    /// # Errors
    ///
    /// Returns an error if no batch was started since the last reset.
    pub fn retry(&mut self) -> Result<BatchProgressStream> {
        if self.items.is_empty() {
            return Err(UploadError::invalid_parameter(
                "items",
                "No previous batch to retry",
            ));
        }

        info!("retrying batch of {} images", self.items.len());
        self.start(self.items.clone())
    }

    /// Cancel the running batch
    ///
    /// In-flight pipelines stop at their next suspension point and no further
    /// snapshots are published. Results already saved are kept. The images
    /// stay available to [`retry`](Self::retry).
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            if !active.table.is_finished() {
                info!("cancelling batch of {} images", self.items.len());
            }
            active.cancel();
        }
    }

    /// Cancel the running batch and forget its images
    pub fn reset(&mut self) {
        self.cancel();
        self.items.clear();
    }

    /// Current snapshot of the active batch
    pub fn snapshot(&self) -> Option<BatchSnapshot> {
        self.active.as_ref().map(|active| active.table.snapshot())
    }

    /// Result of the active batch, once it has finished
    pub fn result(&self) -> Option<BatchResult> {
        self.active.as_ref().and_then(|active| active.table.result())
    }

    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .map(|active| !active.table.is_finished() && !active.driver.is_finished())
            .unwrap_or(false)
    }

    /// Process a batch to completion and return its result
    ///
    /// # Errors
    ///
    /// Returns the errors of [`start`](Self::start), or a cancelled error if
    /// the batch stopped without finishing.
    pub async fn run(&mut self, items: Vec<ImageRef>) -> Result<BatchResult> {
        self.start(items)?
            .into_result()
            .await
            .ok_or_else(|| UploadError::cancelled("batch"))
    }
}

impl Drop for BatchOrchestrator {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel();
        }
    }
}

/// Spawn one task per image and aggregate once all of them have stopped
///
/// The task set lives inside this future, so aborting the driver aborts
/// every pipeline task with it.
async fn drive(
    pipeline: Arc<UploadPipeline>,
    table: Arc<StatusTable>,
    items: Vec<ImageRef>,
    max_concurrent: usize,
) {
    let permits = Arc::new(Semaphore::new(max_concurrent.min(Semaphore::MAX_PERMITS)));
    let mut tasks = JoinSet::new();

    for (index, image) in items.into_iter().enumerate() {
        let pipeline = Arc::clone(&pipeline);
        let table = Arc::clone(&table);
        let permits = Arc::clone(&permits);

        tasks.spawn(async move {
            // Held until the pipeline run ends, poll loop included.
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };

            let sink = move |state: ItemState| {
                table.update(index, state);
            };
            let state = pipeline.process(&image, &sink).await;
            debug!("{}: pipeline ended in {:?}", image, state);
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            if e.is_panic() {
                warn!("pipeline task panicked: {}", e);
            }
        }
    }

    table.finish();
}
