// src/generation/progress.rs
//! Progress state machine for one generation run.
//!
//! A run walks LoadingProfile → ExtractingKeywords → GeneratingCv →
//! OptimizingAts → Completed, with Failed reachable from any active stage.
//! Percent is fixed per stage, so within a run it is monotonically
//! non-decreasing and ends at exactly 100 (success) or 0 (failure).

use serde::Serialize;

use crate::generation::orchestrator::GenerationError;
use crate::types::CvArtifact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStage {
    Idle,
    LoadingProfile,
    ExtractingKeywords,
    GeneratingCv,
    OptimizingAts,
    Completed,
    Failed,
}

impl GenerationStage {
    pub fn percent(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::LoadingProfile => 20,
            Self::ExtractingKeywords => 40,
            Self::GeneratingCv => 60,
            Self::OptimizingAts => 80,
            Self::Completed => 100,
            Self::Failed => 0,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::Idle => "Waiting to start",
            Self::LoadingProfile => "Loading user profile...",
            Self::ExtractingKeywords => "Extracting keywords from the job description...",
            Self::GeneratingCv => "Generating a tailored CV...",
            Self::OptimizingAts => "Optimizing for ATS systems...",
            Self::Completed => "CV generated successfully!",
            Self::Failed => "CV generation failed. Try again.",
        }
    }
}

/// One progress event: stage, percent checkpoint, and a human-readable
/// status line. Updated atomically at each transition.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationProgress {
    pub stage: GenerationStage,
    pub percent: u8,
    pub message: String,
}

impl GenerationProgress {
    pub fn at(stage: GenerationStage) -> Self {
        Self {
            stage,
            percent: stage.percent(),
            message: stage.message().to_string(),
        }
    }
}

/// What a subscriber observes: progress transitions, terminated by either
/// the finished artifact or the run's error.
#[derive(Debug)]
pub enum GenerationEvent {
    Progress(GenerationProgress),
    Completed(Box<CvArtifact>),
    Failed(GenerationError),
}
