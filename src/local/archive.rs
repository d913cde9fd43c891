//! Local copies of uploaded images
//!
//! After compression the pipeline can keep the uploaded encoding on disk so a
//! saved result can be shown without the original photo. The returned URI is
//! recorded on the result; deleting a result removes its archived image too.

use crate::error::{Result, UploadError};
use crate::solve::traits::ResultStore;
use crate::types::{ContentHash, SolveId};
use async_trait::async_trait;
use bytesize::ByteSize;
use log::{debug, info};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Storage for the compressed images that were uploaded
#[async_trait]
pub trait ImageArchive: Send + Sync {
    /// Keep `bytes` under `hash`, returning the URI they can be read back from
    async fn store(&self, hash: &ContentHash, bytes: &[u8]) -> Result<String>;

    /// Remove a previously stored image; unknown URIs are ignored
    async fn delete(&self, uri: &str) -> Result<()>;
}

/// Archive writing `<dir>/<hash>.jpg` files
#[derive(Debug, Clone)]
pub struct FsImageArchive {
    dir: PathBuf,
}

impl FsImageArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, hash: &ContentHash) -> PathBuf {
        self.dir.join(format!("{}.jpg", hash))
    }
}

#[async_trait]
impl ImageArchive for FsImageArchive {
    async fn store(&self, hash: &ContentHash, bytes: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| UploadError::storage("archive", e.to_string()))?;

        let path = self.path_for(hash);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| UploadError::storage("archive", e.to_string()))?;

        debug!("archived {} ({})", path.display(), ByteSize::b(bytes.len() as u64));
        Ok(path.to_string_lossy().into_owned())
    }

    async fn delete(&self, uri: &str) -> Result<()> {
        let path = Path::new(uri);
        if !path.starts_with(&self.dir) {
            debug!("not deleting {} outside {}", uri, self.dir.display());
            return Ok(());
        }

        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(UploadError::storage("delete image", e.to_string())),
        }
    }
}

/// Delete a stored result together with its archived image
///
/// Missing ids are a no-op. The image goes first so a failure leaves the
/// record in place and the delete can be retried.
pub async fn delete_solve_with_image(
    store: &dyn ResultStore,
    archive: &dyn ImageArchive,
    id: SolveId,
) -> Result<()> {
    let Some(stored) = store.get_by_id(id).await? else {
        return Ok(());
    };

    if !stored.solve.image_uri.is_empty() {
        archive.delete(&stored.solve.image_uri).await?;
    }
    store.delete(id).await?;

    info!("deleted solve {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solve::memory::MemoryResultStore;
    use crate::solve::types::SolveResult;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_store_writes_hash_named_file() {
        let dir = tempdir().unwrap();
        let archive = FsImageArchive::new(dir.path().join("images"));

        let uri = archive
            .store(&ContentHash::new("abc123"), b"jpeg")
            .await
            .unwrap();

        assert!(uri.ends_with("abc123.jpg"));
        assert_eq!(std::fs::read(&uri).unwrap(), b"jpeg");
    }

    #[tokio::test]
    async fn test_delete_ignores_missing_and_foreign_files() {
        let dir = tempdir().unwrap();
        let archive = FsImageArchive::new(dir.path().join("images"));
        let outside = dir.path().join("original.jpg");
        std::fs::write(&outside, b"keep").unwrap();

        archive
            .delete(&archive.dir().join("gone.jpg").to_string_lossy())
            .await
            .unwrap();
        archive.delete(&outside.to_string_lossy()).await.unwrap();

        assert!(outside.exists());
    }

    #[tokio::test]
    async fn test_delete_solve_with_image() {
        let dir = tempdir().unwrap();
        let archive = FsImageArchive::new(dir.path());
        let store = MemoryResultStore::new();

        let hash = ContentHash::new("feed");
        let uri = archive.store(&hash, b"jpeg").await.unwrap();
        let id = store
            .save(SolveResult::new(vec![]).image_uri(&uri).image_hash(hash))
            .await
            .unwrap();

        delete_solve_with_image(&store, &archive, id).await.unwrap();

        assert!(store.get_by_id(id).await.unwrap().is_none());
        assert!(!Path::new(&uri).exists());
    }

    #[tokio::test]
    async fn test_delete_unknown_solve_is_noop() {
        let dir = tempdir().unwrap();
        let archive = FsImageArchive::new(dir.path());
        let store = MemoryResultStore::new();

        delete_solve_with_image(&store, &archive, SolveId::new(42))
            .await
            .unwrap();
        assert!(store.is_empty());
    }
}
