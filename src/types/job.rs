// src/types/job.rs

use serde::{Deserialize, Serialize};

/// A job posting as supplied by the external job source. Immutable once it
/// enters the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub posting_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub match_score: Option<i32>,
    #[serde(default)]
    pub external_url: Option<String>,
}
