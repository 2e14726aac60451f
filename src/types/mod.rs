// src/types/mod.rs

pub mod artifact;
pub mod cv_data;
pub mod job;
pub mod profile;

pub use artifact::{ArtifactStatus, CvArtifact, CvContent};
pub use cv_data::StructuredCv;
pub use job::JobPosting;
pub use profile::{EducationEntry, ExperienceEntry, PersonalInfo, UserProfile};
