//! Image codecs used by the compressor
//!
//! The quality search only needs two primitives: decode once, then encode at
//! a given quality as many times as the search requires.

use crate::error::{Result, UploadError};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

/// Decode/encode primitives for the adaptive compressor
pub trait ImageCodec: Send + Sync + 'static {
    /// Decoded representation reused across encode attempts
    type Decoded;

    /// Decode `bytes`, downsampling each edge by `sample_size`
    fn decode(&self, bytes: &[u8], sample_size: u32) -> Result<Self::Decoded>;

    /// Encode `image` at `quality` (1-100)
    fn encode(&self, image: &Self::Decoded, quality: u8) -> Result<Vec<u8>>;
}

/// JPEG codec backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegCodec;

impl ImageCodec for JpegCodec {
    type Decoded = RgbImage;

    fn decode(&self, bytes: &[u8], sample_size: u32) -> Result<RgbImage> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| UploadError::compression(format!("Cannot decode image: {}", e)))?;

        Ok(downsample(image, sample_size).to_rgb8())
    }

    fn encode(&self, image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
            .encode_image(image)
            .map_err(|e| UploadError::compression(format!("Cannot encode image: {}", e)))?;
        Ok(buffer)
    }
}

fn downsample(image: DynamicImage, sample_size: u32) -> DynamicImage {
    if sample_size <= 1 {
        return image;
    }

    let width = (image.width() / sample_size).max(1);
    let height = (image.height() / sample_size).max(1);
    image.resize_exact(width, height, FilterType::Triangle)
}
