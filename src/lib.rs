pub mod error;
pub mod types;

pub mod batch;
pub mod compress;
pub mod hash;
pub mod local;
pub mod pipeline;
pub mod solve;

pub use batch::{
    BatchConfig, BatchCounts, BatchOrchestrator, BatchProgressStream, BatchResult, BatchSnapshot,
    BatchUpdate,
};

pub use compress::{
    CompressOptions, CompressedImage, Compressor, ImageCodec, ImageCompressor, JpegCodec,
    DEFAULT_MAX_UPLOAD_BYTES,
};

pub use error::{Result, UploadError};

pub use hash::content_hash;

pub use local::{delete_solve_with_image, FsImageArchive, FsImageSource, ImageArchive, ImageSource};

pub use pipeline::{
    ItemState, Job, PipelineOptions, PipelineServices, TransitionSink, UploadPipeline, UploadStep,
};

pub use solve::{
    CelestialObject, JobStatus, MemoryResultStore, ObjectType, RemoteSolveClient, ResultStore,
    SolveCache, SolveResult, StoredSolve,
};

pub use types::{ContentHash, ImageRef, JobId, SolveId};
