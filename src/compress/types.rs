use crate::error::{Result, UploadError};
use serde::{Deserialize, Serialize};

/// Network upload cap used by the plate-solving service (2 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024;

/// Tuning for the adaptive JPEG quality search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressOptions {
    /// Byte cap an encoded upload should fit under
    pub max_upload_bytes: u64,
    /// Starting quality when the source already fits under the cap
    pub initial_quality: u8,
    /// Starting quality when the source is over the cap
    pub reduced_quality: u8,
    /// Lowest quality the search will encode at
    pub min_quality: u8,
    /// Quality decrement between attempts
    pub quality_step: u8,
    /// Integer downsampling factor applied on decode (1 keeps full resolution)
    pub sample_size: u32,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            initial_quality: 95,
            reduced_quality: 90,
            min_quality: 10,
            quality_step: 10,
            sample_size: 2,
        }
    }
}

impl CompressOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    pub fn initial_quality(mut self, quality: u8) -> Self {
        self.initial_quality = quality;
        self
    }

    pub fn reduced_quality(mut self, quality: u8) -> Self {
        self.reduced_quality = quality;
        self
    }

    pub fn min_quality(mut self, quality: u8) -> Self {
        self.min_quality = quality;
        self
    }

    pub fn quality_step(mut self, step: u8) -> Self {
        self.quality_step = step;
        self
    }

    pub fn sample_size(mut self, sample_size: u32) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Starting quality for a source of `source_len` bytes
    pub fn starting_quality(&self, source_len: u64, max_bytes: u64) -> u8 {
        if source_len <= max_bytes {
            self.initial_quality
        } else {
            self.reduced_quality
        }
    }

    /// Upper bound on encode attempts for any input
    pub fn max_attempts(&self) -> u32 {
        let start = self.initial_quality.max(self.reduced_quality);
        let span = u32::from(start.saturating_sub(self.min_quality));
        span / u32::from(self.quality_step.max(1)) + 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(UploadError::invalid_parameter(
                "max_upload_bytes",
                "Upload cap must be greater than 0",
            ));
        }

        if self.min_quality == 0 {
            return Err(UploadError::invalid_parameter(
                "min_quality",
                "Minimum quality must be at least 1",
            ));
        }

        for (name, quality) in [
            ("initial_quality", self.initial_quality),
            ("reduced_quality", self.reduced_quality),
        ] {
            if quality > 100 || quality < self.min_quality {
                return Err(UploadError::invalid_parameter(
                    name,
                    format!(
                        "Quality must be between min_quality ({}) and 100",
                        self.min_quality
                    ),
                ));
            }
        }

        if self.quality_step == 0 {
            return Err(UploadError::invalid_parameter(
                "quality_step",
                "Quality step must be greater than 0",
            ));
        }

        if self.sample_size == 0 {
            return Err(UploadError::invalid_parameter(
                "sample_size",
                "Sample size must be at least 1",
            ));
        }

        Ok(())
    }
}

/// An encoded image ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    /// Quality of the returned encoding
    pub quality: u8,
    /// Number of encode attempts the search made
    pub attempts: u32,
    /// Size of the source bytes before compression
    pub original_len: usize,
}

impl CompressedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the encoding fits under `max_bytes`
    pub fn fits(&self, max_bytes: u64) -> bool {
        self.bytes.len() as u64 <= max_bytes
    }
}
