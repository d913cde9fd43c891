//! JSON bodies exchanged with the remote plate-solving service
//!
//! Transport belongs to the [`RemoteSolveClient`](crate::solve::RemoteSolveClient)
//! implementation; these types only describe the payloads and how they map
//! onto [`JobStatus`].

use crate::error::{Result, UploadError};
use crate::solve::types::{CelestialObject, JobStatus, ObjectType, SolveResult};
use crate::types::JobId;
use serde::{Deserialize, Serialize};

/// Response to an image submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(rename = "jobId")]
    pub job_id: String,
    pub status: String,
}

impl SubmitResponse {
    pub fn job_id(&self) -> JobId {
        JobId::new(self.job_id.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatusKind {
    Processing,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CelestialObjectDto {
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub constellation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_y: Option<f64>,
}

impl From<CelestialObjectDto> for CelestialObject {
    fn from(dto: CelestialObjectDto) -> Self {
        CelestialObject {
            name: dto.name,
            object_type: ObjectType::from_label(&dto.object_type),
            constellation: dto.constellation,
            pixel_x: dto.pixel_x,
            pixel_y: dto.pixel_y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResultDto {
    pub objects: Vec<CelestialObjectDto>,
}

/// Response to a job status query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: JobStatusKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<SolveResultDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatusResponse {
    /// Convert into a [`JobStatus`]
    ///
    /// # Errors
    ///
    /// A `success` response without a result is reported as a remote job
    /// error, since there is nothing to save.
    pub fn into_status(self) -> Result<JobStatus> {
        match self.status {
            JobStatusKind::Processing => Ok(JobStatus::Processing),
            JobStatusKind::Success => {
                let result = self.result.ok_or_else(|| {
                    UploadError::remote_job("Job succeeded without a solve result")
                })?;
                let objects = result.objects.into_iter().map(CelestialObject::from).collect();
                Ok(JobStatus::Success(SolveResult::new(objects)))
            }
            JobStatusKind::Failed => Ok(JobStatus::Failed(
                self.error.unwrap_or_else(|| "Unknown error".to_string()),
            )),
        }
    }
}

/// Parse a raw job status body
pub fn parse_job_status(body: &str) -> Result<JobStatus> {
    let response: JobStatusResponse = serde_json::from_str(body)?;
    response.into_status()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_response() {
        let response: SubmitResponse =
            serde_json::from_str(r#"{"jobId":"job-123","status":"processing"}"#).unwrap();
        assert_eq!(response.job_id(), JobId::new("job-123"));
        assert_eq!(response.status, "processing");
    }

    #[test]
    fn test_processing_status() {
        let status = parse_job_status(r#"{"status":"processing"}"#).unwrap();
        assert_eq!(status, JobStatus::Processing);
    }

    #[test]
    fn test_success_maps_objects() {
        let body = r#"{
            "status": "success",
            "result": {
                "objects": [
                    {"name": "Polaris", "type": "star", "constellation": "Ursa Minor",
                     "pixelX": 100.0, "pixelY": 200.0},
                    {"name": "M31", "type": "Galaxy", "constellation": "Andromeda"}
                ]
            }
        }"#;

        let JobStatus::Success(solve) = parse_job_status(body).unwrap() else {
            panic!("expected success");
        };
        assert_eq!(solve.objects.len(), 2);
        assert_eq!(solve.objects[0].name, "Polaris");
        assert_eq!(solve.objects[0].pixel_x, Some(100.0));
        assert_eq!(solve.objects[0].pixel_y, Some(200.0));
        assert_eq!(solve.objects[1].object_type, ObjectType::Galaxy);
        assert_eq!(solve.objects[1].pixel_x, None);
        assert!(solve.image_hash.is_none());
    }

    #[test]
    fn test_success_without_result_is_error() {
        let err = parse_job_status(r#"{"status":"success"}"#).unwrap_err();
        assert!(matches!(err, UploadError::RemoteJob { .. }));
    }

    #[test]
    fn test_failed_status_message() {
        let status = parse_job_status(r#"{"status":"failed","error":"Server rejected"}"#).unwrap();
        assert_eq!(status, JobStatus::Failed("Server rejected".into()));

        let status = parse_job_status(r#"{"status":"failed"}"#).unwrap();
        assert_eq!(status, JobStatus::Failed("Unknown error".into()));
    }

    #[test]
    fn test_unknown_status_is_json_error() {
        let err = parse_job_status(r#"{"status":"queued"}"#).unwrap_err();
        assert!(matches!(err, UploadError::Json(_)));
    }
}
