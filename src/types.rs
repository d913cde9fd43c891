//! Type-safe wrappers for the identifiers that flow through a batch

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Handle for an image selected by the user
///
/// Image references are opaque: the orchestrator never looks inside them and
/// two references are the same image only if their paths are identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Returns the reference as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interprets the reference as a filesystem path
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl Display for ImageRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ImageRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ImageRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<PathBuf> for ImageRef {
    fn from(path: PathBuf) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

impl From<&Path> for ImageRef {
    fn from(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

/// Hex-encoded SHA-256 digest of an image's bytes
///
/// Used as the deduplication key against the local result cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    /// Length of a hex-encoded SHA-256 digest
    pub const HEX_LEN: usize = 64;

    /// Creates a content hash from a string without validation
    ///
    /// Test fixtures and caches keyed by short placeholder digests use this;
    /// use `from_str()` for validated creation.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Returns the digest as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the hash and returns the inner String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl FromStr for ContentHash {
    type Err = ContentHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::HEX_LEN {
            return Err(ContentHashError::InvalidLength(s.len()));
        }

        if !s.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')) {
            return Err(ContentHashError::InvalidEncoding(
                "Content hash must be lowercase hex".into(),
            ));
        }

        Ok(ContentHash(s.to_string()))
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

/// Identifier of a job on the remote plate-solving service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier assigned to a solve result by the local result store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SolveId(i64);

impl SolveId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl Display for SolveId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SolveId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentHashError {
    InvalidLength(usize),
    InvalidEncoding(String),
}

impl fmt::Display for ContentHashError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ContentHashError::InvalidLength(len) => write!(
                f,
                "Invalid content hash length: expected {}, got {}",
                ContentHash::HEX_LEN,
                len
            ),
            ContentHashError::InvalidEncoding(msg) => {
                write!(f, "Invalid content hash encoding: {}", msg)
            }
        }
    }
}

impl std::error::Error for ContentHashError {}
