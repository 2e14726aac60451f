// src/generation/prompts.rs
//! Prompt rendering for the pipeline stages.
//!
//! Pure functions: the same posting and profile always render to the same
//! prompt. Missing profile fields render as an explicit "Not provided"
//! placeholder and absent lists as "Unspecified", so the prompt structure is
//! stable across incomplete profiles.

use crate::core::StageRequest;
use crate::types::{JobPosting, UserProfile};

const NOT_PROVIDED: &str = "Not provided";
const UNSPECIFIED: &str = "Unspecified";

const KEYWORDS_SYSTEM: &str = "You are an expert in job posting analysis. Extract the most \
important keywords from a job description, including technical skills, tools, technologies, \
and requirements. Return only a list of keywords separated by commas.";

const CV_SYSTEM: &str = "You are an expert in résumé writing and ATS (Applicant Tracking \
System) optimization. Your task is to create résumés tailored to specific job postings, \
ensuring that:\n\
1. The résumé is optimized for ATS screening\n\
2. Relevant keywords from the job description are used\n\
3. The most relevant experience and skills are highlighted\n\
4. The format stays professional and clean\n\
5. The content is concise but complete\n\n\
Return the résumé as JSON with the following sections:\n\
- personal_info (contact details)\n\
- summary (tailored professional summary)\n\
- experience (relevant experience)\n\
- skills (technical skills)\n\
- education (education history)\n\
- keywords (keywords extracted from the posting)";

const ATS_SYSTEM: &str = "You are an expert in optimizing résumés for ATS systems. Analyze a \
résumé against a job description and provide specific suggestions to improve ATS \
compatibility, including keywords that should be added and recommended formatting.";

const COVER_LETTER_SYSTEM: &str = "You are an expert in writing professional cover letters. \
Write a personalized, convincing letter that highlights the candidate's fit for the specific \
job posting.";

/// Builds the per-stage completion requests. The model identifier is the
/// only configuration it carries; everything else is fixed per stage.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    model: String,
}

impl PromptBuilder {
    pub fn new(model: String) -> Self {
        Self { model }
    }

    /// Keyword extraction: low temperature, small budget.
    pub fn keywords_request(&self, job: &JobPosting) -> StageRequest {
        StageRequest {
            model: self.model.clone(),
            system: KEYWORDS_SYSTEM.to_string(),
            prompt: format!(
                "Extract the most important keywords from this job description:\n\n{}",
                or_placeholder(&job.description)
            ),
            temperature: 0.3,
            max_tokens: 200,
        }
    }

    /// Full CV generation: the run's central call.
    pub fn cv_request(&self, job: &JobPosting, profile: &UserProfile) -> StageRequest {
        StageRequest {
            model: self.model.clone(),
            system: CV_SYSTEM.to_string(),
            prompt: render_cv_prompt(job, profile),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }

    /// ATS optimization: advisory suggestions against the generated CV.
    pub fn ats_request(&self, job: &JobPosting, cv_content: &str) -> StageRequest {
        StageRequest {
            model: self.model.clone(),
            system: ATS_SYSTEM.to_string(),
            prompt: format!(
                "RESUME:\n{}\n\nJOB DESCRIPTION:\n{}\n\nProvide ATS optimization suggestions:",
                cv_content,
                or_placeholder(&job.description)
            ),
            temperature: 0.5,
            max_tokens: 500,
        }
    }

    /// Cover letter, outside the staged pipeline.
    pub fn cover_letter_request(&self, job: &JobPosting, profile: &UserProfile) -> StageRequest {
        let candidate = profile
            .personal_info
            .full_name
            .as_deref()
            .unwrap_or("Candidate");
        let summary = profile
            .personal_info
            .summary
            .as_deref()
            .unwrap_or("Experienced professional");

        StageRequest {
            model: self.model.clone(),
            system: COVER_LETTER_SYSTEM.to_string(),
            prompt: format!(
                "Write a cover letter for:\n\n\
                 JOB: {} at {}\n\
                 DESCRIPTION: {}\n\n\
                 CANDIDATE: {}\n\
                 SUMMARY: {}\n\n\
                 The letter must be professional, concise (three paragraphs at most), and \
                 highlight why the candidate is ideal for this specific job.",
                job.title,
                job.company,
                or_placeholder(&job.description),
                candidate,
                summary
            ),
            temperature: 0.7,
            max_tokens: 600,
        }
    }
}

fn render_cv_prompt(job: &JobPosting, profile: &UserProfile) -> String {
    format!(
        "JOB POSTING:\n{}\n\nUSER PROFILE:\n{}\n\nINSTRUCTIONS:\n\
         1. Analyze the job description and extract the most important keywords\n\
         2. Tailor the professional summary to highlight experience relevant to this job\n\
         3. Reorder and emphasize the experience most relevant to the position\n\
         4. Include the technical skills that best match the requirements\n\
         5. Optimize the content for ATS systems using keywords from the posting\n\
         6. Keep a professional and objective tone\n\
         7. Where profile information is missing, use generic but plausible content for the field\n\n\
         Return valid JSON with the requested structure.",
        render_job_section(job),
        render_profile_section(profile)
    )
}

fn render_job_section(job: &JobPosting) -> String {
    format!(
        "Title: {}\nCompany: {}\nLocation: {}\nType: {}\nDescription: {}\n\
         Requirements: {}\nTechnologies: {}",
        or_placeholder(&job.title),
        or_placeholder(&job.company),
        or_placeholder(&job.location),
        or_placeholder(&job.posting_type),
        or_placeholder(&job.description),
        join_or_unspecified(&job.requirements),
        join_or_unspecified(&job.tags),
    )
}

fn render_profile_section(profile: &UserProfile) -> String {
    let info = &profile.personal_info;

    let experience = if profile.experience.is_empty() {
        format!("  {}", NOT_PROVIDED)
    } else {
        profile
            .experience
            .iter()
            .map(|exp| {
                let end = if exp.current {
                    "Present".to_string()
                } else {
                    exp.end_date.clone().unwrap_or_else(|| "Present".to_string())
                };
                format!(
                    "  - {} at {} ({} - {}): {}",
                    exp.position,
                    exp.company,
                    exp.start_date.as_deref().unwrap_or(NOT_PROVIDED),
                    end,
                    exp.description.as_deref().unwrap_or(NOT_PROVIDED),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let education = if profile.education.is_empty() {
        format!("  {}", NOT_PROVIDED)
    } else {
        profile
            .education
            .iter()
            .map(|edu| {
                format!(
                    "  - {} in {} - {} ({})",
                    edu.degree,
                    edu.field.as_deref().unwrap_or(NOT_PROVIDED),
                    edu.institution,
                    edu.end_date.as_deref().unwrap_or(NOT_PROVIDED),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Name: {}\nEmail: {}\nPhone: {}\nLocation: {}\nLinkedIn: {}\nWebsite: {}\n\
         Current summary: {}\n\nExperience:\n{}\n\nEducation:\n{}\n\nSkills: {}",
        opt_or_placeholder(&info.full_name),
        opt_or_placeholder(&info.email),
        opt_or_placeholder(&info.phone),
        opt_or_placeholder(&info.location),
        opt_or_placeholder(&info.linkedin),
        opt_or_placeholder(&info.website),
        opt_or_placeholder(&info.summary),
        experience,
        education,
        join_or_unspecified(&profile.skills),
    )
}

fn opt_or_placeholder(value: &Option<String>) -> &str {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => v,
        _ => NOT_PROVIDED,
    }
}

fn or_placeholder(value: &str) -> &str {
    if value.trim().is_empty() {
        NOT_PROVIDED
    } else {
        value
    }
}

fn join_or_unspecified(values: &[String]) -> String {
    if values.is_empty() {
        UNSPECIFIED.to_string()
    } else {
        values.join(", ")
    }
}
