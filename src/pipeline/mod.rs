//! Per-image upload pipeline
//!
//! One pipeline run takes a selected image through cache check, compression,
//! submission, polling and persistence, reporting each state change as it
//! happens.

pub mod operations;
pub mod types;

pub use operations::{PipelineServices, UploadPipeline};
pub use types::{
    ItemState, Job, PipelineOptions, TransitionSink, UploadStep, DEFAULT_POLL_INTERVAL,
};
