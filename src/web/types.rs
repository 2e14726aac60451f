// src/web/types.rs

use rocket::serde::{Deserialize, Serialize};

use crate::generation::{GenerationProgress, GenerationStage};
use crate::types::{CvArtifact, JobPosting};

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct GenerateCvRequest {
    pub job: JobPosting,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct CoverLetterRequest {
    pub job: JobPosting,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct FavoriteRequest {
    pub id: String,
    pub favorite: bool,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct StatusRequest {
    pub id: String,
    pub status: String,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct DeleteRequest {
    pub id: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T) -> Self {
        Self {
            success: true,
            message,
            data,
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    pub fn success(message: String) -> Self {
        Self {
            success: true,
            message,
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
}

impl ErrorResponse {
    pub fn new(error: String, error_code: String) -> Self {
        Self {
            success: false,
            error,
            error_code,
        }
    }
}

/// What progress polling returns: the latest emitted progress plus, once
/// the run is over, the artifact or a short error message.
#[derive(Serialize, Clone)]
#[serde(crate = "rocket::serde")]
pub struct RunSnapshot {
    pub job_id: String,
    pub stage: GenerationStage,
    pub percent: u8,
    pub message: String,
    pub finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<CvArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunSnapshot {
    pub fn started(job_id: String) -> Self {
        Self {
            job_id,
            stage: GenerationStage::Idle,
            percent: 0,
            message: "Generation started".to_string(),
            finished: false,
            artifact: None,
            error: None,
        }
    }

    pub fn apply_progress(&mut self, progress: &GenerationProgress) {
        self.stage = progress.stage;
        self.percent = progress.percent;
        self.message = progress.message.clone();
    }
}
