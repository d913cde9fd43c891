//! Batch upload orchestration
//!
//! A batch runs one upload pipeline per selected image, at most
//! `max_concurrent` at a time, and streams the status of every image after
//! each change. Once all images are done the batch resolves to a
//! [`BatchResult`]: a success listing the saved result ids if any image
//! completed, otherwise the message of the first failure.

pub mod config;
pub mod orchestrator;
pub mod status;
pub mod stream;
pub mod types;

pub use config::BatchConfig;
pub use orchestrator::BatchOrchestrator;
pub use status::StatusTable;
pub use stream::BatchProgressStream;
pub use types::{BatchCounts, BatchResult, BatchSnapshot, BatchUpdate};
