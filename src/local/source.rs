//! Reading selected images
//!
//! The pipeline never touches the filesystem directly; it asks an
//! [`ImageSource`] for the bytes behind an [`ImageRef`].

use crate::error::{Result, UploadError};
use crate::types::ImageRef;
use async_trait::async_trait;
use bytesize::ByteSize;
use log::debug;
use std::path::PathBuf;

/// Provides the raw bytes of a selected image
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn read(&self, image: &ImageRef) -> Result<Vec<u8>>;
}

/// Image source reading references as filesystem paths
///
/// Relative references are resolved against `root` when one is set.
#[derive(Debug, Clone, Default)]
pub struct FsImageSource {
    root: Option<PathBuf>,
}

impl FsImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative references against `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, image: &ImageRef) -> PathBuf {
        let path = image.as_path();
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl ImageSource for FsImageSource {
    /// Read the whole file behind `image`
    ///
    /// # Errors
    ///
    /// Returns an image source error if the file is missing, unreadable or
    /// empty.
    async fn read(&self, image: &ImageRef) -> Result<Vec<u8>> {
        let path = self.resolve(image);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            UploadError::image_source(format!("Cannot read {}: {}", path.display(), e))
        })?;

        if bytes.is_empty() {
            return Err(UploadError::image_source(format!(
                "Image is empty: {}",
                path.display()
            )));
        }

        debug!("read {} ({})", path.display(), ByteSize::b(bytes.len() as u64));
        Ok(bytes)
    }
}
