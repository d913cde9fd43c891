//! Test doubles for the upload pipeline collaborators

#![allow(dead_code)]

use async_trait::async_trait;
use starseek_upload::{
    content_hash, CompressedImage, Compressor, ImageRef, ImageSource, ItemState, JobId,
    JobStatus, MemoryResultStore, PipelineServices, RemoteSolveClient, Result, SolveId,
    SolveResult, StoredSolve, TransitionSink, UploadError,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Image source serving fixed bytes per reference
#[derive(Default)]
pub struct MemorySource {
    images: HashMap<ImageRef, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, image: &str, bytes: &[u8]) -> Self {
        self.images.insert(ImageRef::new(image), bytes.to_vec());
        self
    }
}

#[async_trait]
impl ImageSource for MemorySource {
    async fn read(&self, image: &ImageRef) -> Result<Vec<u8>> {
        self.images
            .get(image)
            .cloned()
            .ok_or_else(|| UploadError::image_source(format!("No such image: {}", image)))
    }
}

/// Compressor passing bytes through unchanged
///
/// Inputs starting with `corrupt` fail like an undecodable image.
#[derive(Default)]
pub struct PassThroughCompressor {
    pub calls: AtomicU32,
}

#[async_trait]
impl Compressor for PassThroughCompressor {
    async fn compress(&self, bytes: Vec<u8>, _max_bytes: u64) -> Result<CompressedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if bytes.starts_with(b"corrupt") {
            return Err(UploadError::compression("Cannot decode image"));
        }

        Ok(CompressedImage {
            original_len: bytes.len(),
            bytes,
            quality: 95,
            attempts: 1,
        })
    }
}

/// How the remote service treats one uploaded image
#[derive(Debug, Clone)]
pub enum Script {
    /// `submit` fails with a network error carrying this message
    SubmitError(String),
    /// Answer `Processing` this many times, then the outcome
    Job { processing: u32, outcome: JobStatus },
}

impl Script {
    pub fn succeed_after(polls: u32) -> Self {
        Script::Job {
            processing: polls.saturating_sub(1),
            outcome: JobStatus::Success(SolveResult::new(vec![])),
        }
    }

    pub fn fail_after(polls: u32, message: &str) -> Self {
        Script::Job {
            processing: polls.saturating_sub(1),
            outcome: JobStatus::Failed(message.to_string()),
        }
    }

    pub fn never_finish() -> Self {
        Script::Job {
            processing: u32::MAX,
            outcome: JobStatus::Processing,
        }
    }
}

#[derive(Default)]
struct RemoteState {
    scripts: HashMap<Vec<u8>, Script>,
    jobs: HashMap<JobId, (u32, JobStatus)>,
    polls_per_job: HashMap<JobId, u32>,
    uploads: Vec<Vec<u8>>,
}

/// Remote solver driven by per-image scripts keyed by uploaded bytes
#[derive(Default)]
pub struct ScriptedRemote {
    state: Mutex<RemoteState>,
    pub submits: AtomicU32,
    pub polls: AtomicU32,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, bytes: &[u8], script: Script) -> Self {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(bytes.to_vec(), script);
        self
    }

    pub fn calls(&self) -> u32 {
        self.submits.load(Ordering::SeqCst) + self.polls.load(Ordering::SeqCst)
    }

    /// Every payload passed to `submit`, in call order
    pub fn uploads(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn polls_for(&self, job: &str) -> u32 {
        self.state
            .lock()
            .unwrap()
            .polls_per_job
            .get(&JobId::new(job))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl RemoteSolveClient for ScriptedRemote {
    async fn submit(&self, image: &[u8]) -> Result<JobId> {
        let n = self.submits.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.lock().unwrap();
        state.uploads.push(image.to_vec());
        let script = state
            .scripts
            .get(image)
            .cloned()
            .unwrap_or_else(|| Script::succeed_after(1));

        match script {
            Script::SubmitError(message) => Err(UploadError::network(message)),
            Script::Job {
                processing,
                outcome,
            } => {
                let id = JobId::new(format!("job-{}", n));
                state.jobs.insert(id.clone(), (processing, outcome));
                Ok(id)
            }
        }
    }

    async fn poll_status(&self, job: &JobId) -> Result<JobStatus> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        *state.polls_per_job.entry(job.clone()).or_insert(0) += 1;

        let (remaining, outcome) = state
            .jobs
            .get_mut(job)
            .ok_or_else(|| UploadError::network(format!("Unknown job {}", job)))?;
        if *remaining > 0 {
            *remaining -= 1;
            return Ok(JobStatus::Processing);
        }
        Ok(outcome.clone())
    }
}

/// Store pre-populated with solves for the given image contents
pub fn seeded_store(entries: &[(i64, &str)]) -> Arc<MemoryResultStore> {
    let entries: Vec<StoredSolve> = entries
        .iter()
        .map(|(id, contents)| StoredSolve {
            id: SolveId::new(*id),
            solve: SolveResult::new(vec![]).image_hash(content_hash(contents.as_bytes())),
        })
        .collect();
    let json = serde_json::to_string(&entries).unwrap();
    Arc::new(MemoryResultStore::from_json(&json).unwrap())
}

/// Everything a test needs to drive pipelines and inspect collaborators
pub struct Harness {
    pub source: Arc<MemorySource>,
    pub remote: Arc<ScriptedRemote>,
    pub store: Arc<MemoryResultStore>,
    pub compressor: Arc<PassThroughCompressor>,
}

impl Harness {
    pub fn new(source: MemorySource, remote: ScriptedRemote, store: Arc<MemoryResultStore>) -> Self {
        Self {
            source: Arc::new(source),
            remote: Arc::new(remote),
            store,
            compressor: Arc::new(PassThroughCompressor::default()),
        }
    }

    pub fn services(&self) -> PipelineServices {
        PipelineServices::new(
            self.source.clone(),
            self.store.clone(),
            self.remote.clone(),
            self.store.clone(),
        )
        .with_compressor(self.compressor.clone())
    }

    pub fn compressions(&self) -> u32 {
        self.compressor.calls.load(Ordering::SeqCst)
    }
}

/// Sink recording every transition it receives
#[derive(Default)]
pub struct RecordingSink {
    states: Mutex<Vec<ItemState>>,
}

impl RecordingSink {
    pub fn states(&self) -> Vec<ItemState> {
        self.states.lock().unwrap().clone()
    }
}

impl TransitionSink for RecordingSink {
    fn transition(&self, state: ItemState) {
        self.states.lock().unwrap().push(state);
    }
}

pub fn refs(names: &[&str]) -> Vec<ImageRef> {
    names.iter().map(|name| ImageRef::new(*name)).collect()
}
