//! Image compression for uploads
//!
//! This module re-encodes selected photographs so they fit under the remote
//! service's upload cap, trading JPEG quality for size.

pub mod codec;
pub mod operations;
pub mod types;

pub use codec::{ImageCodec, JpegCodec};
pub use operations::{Compressor, ImageCompressor};
pub use types::{CompressOptions, CompressedImage, DEFAULT_MAX_UPLOAD_BYTES};
