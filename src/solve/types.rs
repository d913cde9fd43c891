use crate::types::{ContentHash, SolveId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of an identified celestial object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Star,
    Nebula,
    Galaxy,
    Cluster,
}

impl ObjectType {
    /// Parse a solver label, falling back to `Star` for unknown labels
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "nebula" => ObjectType::Nebula,
            "galaxy" => ObjectType::Galaxy,
            "cluster" => ObjectType::Cluster,
            _ => ObjectType::Star,
        }
    }

    /// Plural heading used when grouping objects
    pub fn display_name(&self) -> &'static str {
        match self {
            ObjectType::Star => "Stars",
            ObjectType::Nebula => "Nebulae",
            ObjectType::Galaxy => "Galaxies",
            ObjectType::Cluster => "Clusters",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::Star => write!(f, "star"),
            ObjectType::Nebula => write!(f, "nebula"),
            ObjectType::Galaxy => write!(f, "galaxy"),
            ObjectType::Cluster => write!(f, "cluster"),
        }
    }
}

/// A celestial object identified in a photograph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialObject {
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    pub constellation: String,
    /// Pixel position of the object in the uploaded image, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_y: Option<f64>,
}

impl CelestialObject {
    pub fn new(
        name: impl Into<String>,
        object_type: ObjectType,
        constellation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            object_type,
            constellation: constellation.into(),
            pixel_x: None,
            pixel_y: None,
        }
    }

    pub fn at_pixel(mut self, x: f64, y: f64) -> Self {
        self.pixel_x = Some(x);
        self.pixel_y = Some(y);
        self
    }
}

/// Outcome of a plate solve
///
/// The remote service fills in the identified objects; the pipeline stamps
/// the image hash and local image URI before the result is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    pub objects: Vec<CelestialObject>,
    #[serde(default)]
    pub image_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotated_image_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_hash: Option<ContentHash>,
    pub solved_at: DateTime<Utc>,
}

impl SolveResult {
    pub fn new(objects: Vec<CelestialObject>) -> Self {
        Self {
            objects,
            image_uri: String::new(),
            annotated_image_uri: None,
            image_hash: None,
            solved_at: Utc::now(),
        }
    }

    pub fn image_uri(mut self, uri: impl Into<String>) -> Self {
        self.image_uri = uri.into();
        self
    }

    pub fn annotated_image_uri(mut self, uri: impl Into<String>) -> Self {
        self.annotated_image_uri = Some(uri.into());
        self
    }

    pub fn image_hash(mut self, hash: ContentHash) -> Self {
        self.image_hash = Some(hash);
        self
    }

    /// Objects of one category, in solver order
    pub fn objects_of(&self, object_type: ObjectType) -> impl Iterator<Item = &CelestialObject> {
        self.objects
            .iter()
            .filter(move |object| object.object_type == object_type)
    }
}

/// A solve result together with the id the store assigned to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSolve {
    pub id: SolveId,
    pub solve: SolveResult,
}

/// Status of a remote plate-solving job
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// The job is still running; keep polling
    Processing,
    Success(SolveResult),
    /// The service rejected or could not solve the image
    Failed(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}
