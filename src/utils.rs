// src/utils.rs

/// Match score used when the posting does not carry one. Product decision
/// carried over from the original behavior; see DESIGN.md.
pub const DEFAULT_MATCH_SCORE: u8 = 85;

/// Clamp an optional posting score into [0, 100], defaulting when absent.
pub fn clamp_match_score(score: Option<i32>) -> u8 {
    match score {
        Some(value) => value.clamp(0, 100) as u8,
        None => DEFAULT_MATCH_SCORE,
    }
}

/// Derive the artifact file name from the posting's title and company.
/// Deterministic: the same posting always yields the same name.
pub fn derive_file_name(job_title: &str, company: &str) -> String {
    format!(
        "CV_{}_{}.pdf",
        collapse_whitespace(job_title),
        collapse_whitespace(company)
    )
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join("_")
}
