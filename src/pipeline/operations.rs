//! Single-image upload pipeline
//!
//! [`UploadPipeline::process`] drives one image from `Pending` to a terminal
//! state: cache check, compression, submission, polling and persistence. Every
//! state change is reported to a [`TransitionSink`]; every error ends the run
//! as `Failed` on that image alone.

use crate::compress::{CompressOptions, Compressor, ImageCompressor, JpegCodec};
use crate::error::{Result, UploadError};
use crate::hash::content_hash;
use crate::local::{ImageArchive, ImageSource};
use crate::pipeline::types::{ItemState, Job, PipelineOptions, TransitionSink, UploadStep};
use crate::solve::{JobStatus, RemoteSolveClient, ResultStore, SolveCache, SolveResult};
use crate::types::{ContentHash, ImageRef};
use bytesize::ByteSize;
use log::{debug, info, warn};
use std::sync::Arc;

/// Collaborators a pipeline run talks to
#[derive(Clone)]
pub struct PipelineServices {
    pub source: Arc<dyn ImageSource>,
    pub cache: Arc<dyn SolveCache>,
    pub remote: Arc<dyn RemoteSolveClient>,
    pub store: Arc<dyn ResultStore>,
    pub compressor: Arc<dyn Compressor>,
    /// Where uploaded encodings are kept locally, if anywhere
    pub archive: Option<Arc<dyn ImageArchive>>,
    default_compressor: bool,
}

impl PipelineServices {
    /// Services using the default JPEG compressor and no archive
    pub fn new(
        source: Arc<dyn ImageSource>,
        cache: Arc<dyn SolveCache>,
        remote: Arc<dyn RemoteSolveClient>,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            source,
            cache,
            remote,
            store,
            compressor: Arc::new(ImageCompressor::default()),
            archive: None,
            default_compressor: true,
        }
    }

    pub fn with_compressor(mut self, compressor: Arc<dyn Compressor>) -> Self {
        self.compressor = compressor;
        self.default_compressor = false;
        self
    }

    /// Whether the compressor is still the untuned one installed by [`new`](Self::new)
    pub fn uses_default_compressor(&self) -> bool {
        self.default_compressor
    }

    /// Use the JPEG compressor with custom tuning
    pub fn with_compress_options(self, options: CompressOptions) -> Self {
        self.with_compressor(Arc::new(ImageCompressor::new(JpegCodec, options)))
    }

    pub fn with_archive(mut self, archive: Arc<dyn ImageArchive>) -> Self {
        self.archive = Some(archive);
        self
    }
}

impl std::fmt::Debug for PipelineServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineServices")
            .field("archive", &self.archive.is_some())
            .finish_non_exhaustive()
    }
}

/// Runs the per-image state machine against a fixed set of services
#[derive(Debug, Clone)]
pub struct UploadPipeline {
    services: PipelineServices,
    options: PipelineOptions,
}

impl UploadPipeline {
    pub fn new(services: PipelineServices, options: PipelineOptions) -> Self {
        Self { services, options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn services(&self) -> &PipelineServices {
        &self.services
    }

    /// Process one image to completion
    ///
    /// # Arguments
    ///
    /// * `image` - The image to process
    /// * `sink` - Receives every state change, including the terminal one
    ///
    /// # Returns
    ///
    /// The terminal state. Every error, including one a collaborator reports
    /// as a cancellation, ends the run as `Failed`. Aborting the task running
    /// this future is the only way to stop it without a terminal state.
    pub async fn process(&self, image: &ImageRef, sink: &dyn TransitionSink) -> ItemState {
        match self.run(image, sink).await {
            Ok(state) => state,
            Err(e) => {
                warn!("{}: {}", image, e);
                let state = ItemState::Failed(e.item_message());
                sink.transition(state.clone());
                state
            }
        }
    }

    async fn run(&self, image: &ImageRef, sink: &dyn TransitionSink) -> Result<ItemState> {
        let services = &self.services;

        sink.transition(ItemState::Processing(UploadStep::CheckingCache));
        let bytes = services.source.read(image).await?;
        if bytes.is_empty() {
            return Err(UploadError::image_source(format!("Image is empty: {}", image)));
        }

        let hash = content_hash(&bytes);
        match services.cache.lookup(&hash).await {
            Ok(Some(stored)) => {
                info!("{}: already solved as #{}", image, stored.id);
                let state = ItemState::Completed(stored.id);
                sink.transition(state.clone());
                return Ok(state);
            }
            Ok(None) => debug!("{}: cache miss for {}", image, hash),
            Err(e) => warn!("{}: {}; treating as a miss", image, e),
        }

        sink.transition(ItemState::Processing(UploadStep::Compressing));
        let compressed = services
            .compressor
            .compress(bytes, self.options.max_upload_bytes)
            .await?;
        debug!(
            "{}: compressed {} -> {} at quality {}",
            image,
            ByteSize::b(compressed.original_len as u64),
            ByteSize::b(compressed.len() as u64),
            compressed.quality
        );
        let image_uri = self.archive(image, &hash, &compressed.bytes).await;

        sink.transition(ItemState::Processing(UploadStep::Uploading));
        let job_id = services.remote.submit(&compressed.bytes).await?;
        let mut job = Job::new(job_id);
        info!("{}: submitted as job {}", image, job.id);

        sink.transition(ItemState::Processing(UploadStep::Analyzing));
        let solve = self.poll(&mut job).await?;

        sink.transition(ItemState::Processing(UploadStep::Saving));
        let id = services
            .store
            .save(solve.image_uri(image_uri).image_hash(hash))
            .await?;
        info!("{}: saved as #{} after {} polls", image, id, job.polls);

        let state = ItemState::Completed(id);
        sink.transition(state.clone());
        Ok(state)
    }

    /// Keep the uploaded encoding locally, falling back to the image reference
    async fn archive(&self, image: &ImageRef, hash: &ContentHash, bytes: &[u8]) -> String {
        let Some(archive) = &self.services.archive else {
            return image.to_string();
        };

        match archive.store(hash, bytes).await {
            Ok(uri) => uri,
            Err(e) => {
                warn!("{}: cannot archive upload: {}", image, e);
                image.to_string()
            }
        }
    }

    /// Sleep, then query, until the job reaches a terminal status
    async fn poll(&self, job: &mut Job) -> Result<SolveResult> {
        loop {
            tokio::time::sleep(self.options.poll_interval).await;

            job.polls += 1;
            match self.services.remote.poll_status(&job.id).await? {
                JobStatus::Processing => {
                    debug!("job {}: still processing after {} polls", job.id, job.polls);
                    if let Some(deadline) = self.options.poll_deadline {
                        if job.elapsed() >= deadline {
                            return Err(UploadError::timeout(format!("polling job {}", job.id)));
                        }
                    }
                }
                JobStatus::Success(solve) => return Ok(solve),
                JobStatus::Failed(message) => return Err(UploadError::remote_job(message)),
            }
        }
    }
}
