//! Plate-solve results and the collaborators that produce and keep them

pub mod memory;
pub mod traits;
pub mod types;
pub mod wire;

pub use memory::MemoryResultStore;
pub use traits::{RemoteSolveClient, ResultStore, SolveCache};
pub use types::{CelestialObject, JobStatus, ObjectType, SolveResult, StoredSolve};
pub use wire::{parse_job_status, JobStatusResponse, SubmitResponse};
