// src/types/artifact.rs
//! The persisted output record of one completed generation run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::cv_data::StructuredCv;
use crate::types::job::JobPosting;
use crate::utils::{clamp_match_score, derive_file_name};

/// Lifecycle status of a generated CV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    Generated,
    Viewed,
    Downloaded,
}

impl ArtifactStatus {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "generated" => Some(Self::Generated),
            "viewed" => Some(Self::Viewed),
            "downloaded" => Some(Self::Downloaded),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generated => "generated",
            Self::Viewed => "viewed",
            Self::Downloaded => "downloaded",
        }
    }
}

/// Outcome of the CV-generation stage: either a structured record or the
/// model's raw text when structured parsing failed. The artifact always
/// carries exactly one of the two.
#[derive(Debug, Clone)]
pub enum CvContent {
    Structured(StructuredCv),
    Raw(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvArtifact {
    pub id: String,
    pub job_title: String,
    pub company: String,
    pub generated_at: DateTime<Utc>,
    pub status: ArtifactStatus,
    pub match_score: u8,
    pub favorite: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub file_name: String,
    #[serde(default)]
    pub source_url: Option<String>,
    pub notes: String,
    #[serde(default)]
    pub structured_content: Option<StructuredCv>,
    #[serde(default)]
    pub raw_content: Option<String>,
    #[serde(default)]
    pub extracted_keywords: Vec<String>,
    #[serde(default)]
    pub ats_suggestions: Option<String>,
}

impl CvArtifact {
    /// Assemble the artifact for a completed run. Mints a fresh time-ordered
    /// id and denormalizes the posting's fields; they are never re-synced if
    /// the posting later changes.
    pub fn from_generation(
        job: &JobPosting,
        content: CvContent,
        extracted_keywords: Vec<String>,
        ats_suggestions: Option<String>,
    ) -> Self {
        let (structured_content, raw_content) = match content {
            CvContent::Structured(cv) => (Some(cv), None),
            CvContent::Raw(text) => (None, Some(text)),
        };

        Self {
            id: Uuid::now_v7().to_string(),
            job_title: job.title.clone(),
            company: job.company.clone(),
            generated_at: Utc::now(),
            status: ArtifactStatus::Generated,
            match_score: clamp_match_score(job.match_score),
            favorite: false,
            tags: job.tags.clone(),
            file_name: derive_file_name(&job.title, &job.company),
            source_url: job.external_url.clone(),
            notes: format!("CV generated automatically for the {} position", job.title),
            structured_content,
            raw_content,
            extracted_keywords,
            ats_suggestions,
        }
    }

    /// The downloadable content, honoring the structured-xor-raw invariant.
    pub fn content(&self) -> CvContent {
        match (&self.structured_content, &self.raw_content) {
            (Some(cv), _) => CvContent::Structured(cv.clone()),
            (None, Some(text)) => CvContent::Raw(text.clone()),
            // Unreachable for artifacts built through from_generation.
            (None, None) => CvContent::Raw(String::new()),
        }
    }
}
