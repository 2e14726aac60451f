// src/generation/interpreter.rs
//! Turns raw model output into stage results.
//!
//! The CV stage asks the model for JSON but the model does not reliably
//! comply; when structured parsing fails the original text is kept verbatim
//! as a raw artifact so the run still produces something downloadable.

use tracing::warn;

use crate::types::{CvContent, StructuredCv};

/// Keyword extraction output: comma-separated keywords. Never fails; empty
/// or garbage input simply yields an empty set.
pub fn interpret_keywords(raw: &str) -> Vec<String> {
    let mut keywords = Vec::new();
    for part in raw.split(',') {
        let keyword = part.trim();
        if keyword.is_empty() {
            continue;
        }
        if !keywords.iter().any(|existing| existing == keyword) {
            keywords.push(keyword.to_string());
        }
    }
    keywords
}

/// CV generation output: structured when the model returned parseable JSON
/// (optionally wrapped in a Markdown code fence), raw text otherwise.
pub fn interpret_cv(raw: &str) -> CvContent {
    let candidate = strip_code_fence(raw);

    match serde_json::from_str::<StructuredCv>(candidate) {
        Ok(cv) => CvContent::Structured(cv),
        Err(e) => {
            warn!("CV output is not structured JSON ({}); keeping raw text", e);
            CvContent::Raw(raw.to_string())
        }
    }
}

/// ATS optimization output: advisory text, passed through unchanged.
pub fn interpret_ats(raw: &str) -> String {
    raw.to_string()
}

/// Models frequently wrap JSON in ``` fences despite instructions.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line.
    match body.split_once('\n') {
        Some((first_line, remainder)) if first_line.trim().chars().all(char::is_alphanumeric) => {
            remainder.trim()
        }
        _ => body.trim(),
    }
}
