//! Adaptive quality search
//!
//! The source is decoded once and re-encoded at decreasing quality until the
//! encoding fits the cap or the quality floor is reached. When the cap cannot
//! be met the floor encoding is returned anyway; the remote service decides
//! whether it accepts it.

use crate::compress::codec::{ImageCodec, JpegCodec};
use crate::compress::types::{CompressOptions, CompressedImage};
use crate::error::{Result, UploadError};
use async_trait::async_trait;
use bytesize::ByteSize;
use log::debug;
use std::sync::Arc;

/// Re-encodes images so they fit under an upload cap
#[async_trait]
pub trait Compressor: Send + Sync {
    async fn compress(&self, bytes: Vec<u8>, max_bytes: u64) -> Result<CompressedImage>;
}

/// Compressor running the quality search with an [`ImageCodec`]
pub struct ImageCompressor<C = JpegCodec> {
    codec: Arc<C>,
    options: CompressOptions,
}

impl<C> Clone for ImageCompressor<C> {
    fn clone(&self) -> Self {
        Self {
            codec: Arc::clone(&self.codec),
            options: self.options,
        }
    }
}

impl Default for ImageCompressor<JpegCodec> {
    fn default() -> Self {
        Self::new(JpegCodec, CompressOptions::default())
    }
}

impl<C: ImageCodec> ImageCompressor<C> {
    pub fn new(codec: C, options: CompressOptions) -> Self {
        Self {
            codec: Arc::new(codec),
            options,
        }
    }

    pub fn options(&self) -> &CompressOptions {
        &self.options
    }

    /// Run the quality search on the calling thread
    ///
    /// # Arguments
    ///
    /// * `bytes` - Source image in any format the codec can decode
    /// * `max_bytes` - Cap the encoding should fit under
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error if the options are invalid, and a
    /// compression error if the source cannot be decoded or an encode attempt
    /// fails. An unreachable cap is not an error.
    pub fn compress_blocking(&self, bytes: &[u8], max_bytes: u64) -> Result<CompressedImage> {
        self.options.validate()?;

        if bytes.is_empty() {
            return Err(UploadError::compression("Cannot decode an empty image"));
        }

        let options = &self.options;
        let decoded = self.codec.decode(bytes, options.sample_size)?;

        let mut quality = options.starting_quality(bytes.len() as u64, max_bytes);
        let mut attempts = 0u32;

        loop {
            let encoded = self.codec.encode(&decoded, quality)?;
            attempts += 1;

            let fits = encoded.len() as u64 <= max_bytes;
            let at_floor = quality.saturating_sub(options.quality_step) < options.min_quality;

            debug!(
                "compression attempt {}: quality {} -> {} (cap {})",
                attempts,
                quality,
                ByteSize::b(encoded.len() as u64),
                ByteSize::b(max_bytes)
            );

            if fits || at_floor {
                if encoded.is_empty() {
                    return Err(UploadError::compression("Encoder produced no output"));
                }

                return Ok(CompressedImage {
                    bytes: encoded,
                    quality,
                    attempts,
                    original_len: bytes.len(),
                });
            }

            quality -= options.quality_step;
        }
    }
}

#[async_trait]
impl<C> Compressor for ImageCompressor<C>
where
    C: ImageCodec,
{
    async fn compress(&self, bytes: Vec<u8>, max_bytes: u64) -> Result<CompressedImage> {
        let compressor = self.clone();
        // Decoding and encoding are CPU-bound; keep them off the async workers.
        tokio::task::spawn_blocking(move || compressor.compress_blocking(&bytes, max_bytes))
            .await?
    }
}
