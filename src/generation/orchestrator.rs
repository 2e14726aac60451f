// src/generation/orchestrator.rs
//! Drives the staged generation pipeline for one job posting.
//!
//! Stage fatality rules: profile loading and keyword extraction degrade
//! gracefully, CV generation is the run's reason to exist and fails the run,
//! ATS optimization is best-effort enrichment. Only a completed run persists
//! an artifact.

use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::core::{CompletionError, CompletionService};
use crate::generation::interpreter::{interpret_ats, interpret_cv, interpret_keywords};
use crate::generation::progress::{GenerationEvent, GenerationProgress, GenerationStage};
use crate::generation::prompts::PromptBuilder;
use crate::history::{HistoryError, HistoryStore};
use crate::profile::ProfileSource;
use crate::types::{CvArtifact, CvContent, JobPosting, UserProfile};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("a generation run is already active for job {job_id}")]
    AlreadyRunning { job_id: String },
    #[error("CV generation failed: {0}")]
    Completion(#[from] CompletionError),
    #[error("failed to persist the generated CV: {0}")]
    Persistence(#[from] HistoryError),
}

impl GenerationError {
    /// Short message for end users; never includes provider payloads.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AlreadyRunning { .. } => "A CV is already being generated for this job.",
            Self::Completion(_) => "CV generation failed. Try again.",
            Self::Persistence(_) => "The generated CV could not be saved.",
        }
    }
}

pub struct GenerationOrchestrator {
    completion: Arc<dyn CompletionService>,
    profiles: Arc<dyn ProfileSource>,
    history: Arc<HistoryStore>,
    prompts: PromptBuilder,
    active: Mutex<HashSet<String>>,
}

impl GenerationOrchestrator {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        profiles: Arc<dyn ProfileSource>,
        history: Arc<HistoryStore>,
        model: String,
    ) -> Self {
        Self {
            completion,
            profiles,
            history,
            prompts: PromptBuilder::new(model),
            active: Mutex::new(HashSet::new()),
        }
    }

    /// Start a run for the posting. Single-flight per job id: a second start
    /// while one is active is rejected, not queued. The returned receiver
    /// yields progress events terminated by `Completed` or `Failed`;
    /// dropping it abandons the run and its result is discarded.
    pub async fn start(
        self: &Arc<Self>,
        job: JobPosting,
    ) -> Result<UnboundedReceiver<GenerationEvent>, GenerationError> {
        {
            let mut active = self.active.lock().await;
            if !active.insert(job.id.clone()) {
                return Err(GenerationError::AlreadyRunning { job_id: job.id });
            }
        }

        info!("Starting CV generation for {} at {}", job.title, job.company);

        let (tx, rx) = mpsc::unbounded_channel();
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            orchestrator.run(job, tx).await;
        });

        Ok(rx)
    }

    /// One-shot cover letter, outside the staged pipeline.
    pub async fn generate_cover_letter(
        &self,
        job: &JobPosting,
    ) -> Result<String, GenerationError> {
        let profile = self.load_profile().await;
        let raw = self
            .completion
            .complete(self.prompts.cover_letter_request(job, &profile))
            .await?;
        Ok(raw.trim().to_string())
    }

    async fn run(self: Arc<Self>, job: JobPosting, tx: UnboundedSender<GenerationEvent>) {
        let outcome = self.run_pipeline(&job, &tx).await;

        match outcome {
            Ok(artifact) => {
                if tx.is_closed() {
                    // The caller abandoned the run; the result is discarded,
                    // never persisted.
                    info!("Run for job {} was abandoned; discarding result", job.id);
                } else {
                    self.finish(artifact, &tx).await;
                }
            }
            Err(err) => {
                error!("CV generation failed for job {}: {}", job.id, err);
                emit(&tx, GenerationStage::Failed);
                let _ = tx.send(GenerationEvent::Failed(err));
            }
        }

        self.active.lock().await.remove(&job.id);
    }

    async fn run_pipeline(
        &self,
        job: &JobPosting,
        tx: &UnboundedSender<GenerationEvent>,
    ) -> Result<CvArtifact, GenerationError> {
        emit(tx, GenerationStage::LoadingProfile);
        let profile = self.load_profile().await;

        emit(tx, GenerationStage::ExtractingKeywords);
        let keywords = match self
            .completion
            .complete(self.prompts.keywords_request(job))
            .await
        {
            Ok(raw) => interpret_keywords(&raw),
            Err(e) => {
                // Non-fatal: the CV can still be generated without them.
                warn!("Keyword extraction failed for job {}: {}", job.id, e);
                Vec::new()
            }
        };

        emit(tx, GenerationStage::GeneratingCv);
        let raw_cv = self
            .completion
            .complete(self.prompts.cv_request(job, &profile))
            .await?;
        let content = interpret_cv(&raw_cv);

        emit(tx, GenerationStage::OptimizingAts);
        let cv_text = content_as_text(&content);
        let suggestions = match self
            .completion
            .complete(self.prompts.ats_request(job, &cv_text))
            .await
        {
            Ok(raw) => Some(interpret_ats(&raw)),
            Err(e) => {
                warn!("ATS optimization failed for job {}: {}", job.id, e);
                None
            }
        };

        Ok(CvArtifact::from_generation(
            job, content, keywords, suggestions,
        ))
    }

    async fn finish(&self, artifact: CvArtifact, tx: &UnboundedSender<GenerationEvent>) {
        match self.history.create(artifact.clone()).await {
            Ok(()) => {
                emit(tx, GenerationStage::Completed);
                let _ = tx.send(GenerationEvent::Completed(Box::new(artifact)));
            }
            Err(e) => {
                error!("Failed to persist artifact {}: {}", artifact.id, e);
                emit(tx, GenerationStage::Failed);
                let _ = tx.send(GenerationEvent::Failed(e.into()));
            }
        }
    }

    async fn load_profile(&self) -> UserProfile {
        match self.profiles.read().await {
            Ok(Some(profile)) => profile,
            Ok(None) => UserProfile::default(),
            Err(e) => {
                // Profile problems never sink a run.
                warn!("Profile store unavailable, using empty profile: {}", e);
                UserProfile::default()
            }
        }
    }
}

fn emit(tx: &UnboundedSender<GenerationEvent>, stage: GenerationStage) {
    let _ = tx.send(GenerationEvent::Progress(GenerationProgress::at(stage)));
}

fn content_as_text(content: &CvContent) -> String {
    match content {
        CvContent::Structured(cv) => {
            serde_json::to_string_pretty(cv).unwrap_or_else(|_| String::new())
        }
        CvContent::Raw(text) => text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageRequest;
    use crate::history::{HistoryFilter, HistorySort};
    use crate::storage::memory::MemoryStorage;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Completion stub keyed by stage token budget (each stage uses a
    /// distinct one: keywords 200, CV 2000, ATS 500).
    struct ScriptedCompletion {
        responses: HashMap<u32, Result<String, u16>>,
    }

    impl ScriptedCompletion {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
            }
        }

        fn ok(mut self, max_tokens: u32, body: &str) -> Self {
            self.responses.insert(max_tokens, Ok(body.to_string()));
            self
        }

        fn fail(mut self, max_tokens: u32, status: u16) -> Self {
            self.responses.insert(max_tokens, Err(status));
            self
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedCompletion {
        async fn complete(&self, request: StageRequest) -> Result<String, CompletionError> {
            match self.responses.get(&request.max_tokens) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(CompletionError::Server {
                    status: *status,
                    message: "scripted failure".to_string(),
                }),
                None => Err(CompletionError::Transport("no scripted response".to_string())),
            }
        }
    }

    struct NoProfile;

    #[async_trait]
    impl ProfileSource for NoProfile {
        async fn read(&self) -> anyhow::Result<Option<UserProfile>> {
            Ok(None)
        }
    }

    fn posting() -> JobPosting {
        JobPosting {
            id: "job-1".to_string(),
            title: "Data Engineer".to_string(),
            company: "TechCorp".to_string(),
            location: "Remote".to_string(),
            posting_type: "Full-time".to_string(),
            description: "Pipelines all day".to_string(),
            tags: vec!["python".to_string()],
            requirements: vec![],
            match_score: None,
            external_url: None,
        }
    }

    fn orchestrator(completion: ScriptedCompletion) -> (Arc<GenerationOrchestrator>, Arc<HistoryStore>) {
        let history = Arc::new(HistoryStore::new(Arc::new(MemoryStorage::new())));
        let orchestrator = Arc::new(GenerationOrchestrator::new(
            Arc::new(completion),
            Arc::new(NoProfile),
            Arc::clone(&history),
            "test-model".to_string(),
        ));
        (orchestrator, history)
    }

    async fn drain(
        mut rx: UnboundedReceiver<GenerationEvent>,
    ) -> (Vec<GenerationProgress>, Option<CvArtifact>, Option<GenerationError>) {
        let mut progress = Vec::new();
        let mut artifact = None;
        let mut error = None;
        while let Some(event) = rx.recv().await {
            match event {
                GenerationEvent::Progress(p) => progress.push(p),
                GenerationEvent::Completed(a) => artifact = Some(*a),
                GenerationEvent::Failed(e) => error = Some(e),
            }
        }
        (progress, artifact, error)
    }

    #[tokio::test]
    async fn successful_run_persists_structured_artifact() {
        let completion = ScriptedCompletion::new()
            .ok(200, "python, sql, airflow")
            .ok(2000, r#"{"summary": "tailored", "skills": ["python"]}"#)
            .ok(500, "add more keywords");
        let (orchestrator, history) = orchestrator(completion);

        let rx = orchestrator.start(posting()).await.unwrap();
        let (progress, artifact, error) = drain(rx).await;

        assert!(error.is_none());
        let artifact = artifact.expect("run should complete");
        assert!(artifact.structured_content.is_some());
        assert!(artifact.raw_content.is_none());
        assert_eq!(artifact.extracted_keywords, vec!["python", "sql", "airflow"]);
        assert_eq!(artifact.ats_suggestions.as_deref(), Some("add more keywords"));

        // Progress is monotonic and ends at exactly 100.
        let percents: Vec<u8> = progress.iter().map(|p| p.percent).collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(percents.last(), Some(&100));

        let stored = history
            .list(HistoryFilter::All, HistorySort::default())
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, artifact.id);
    }

    #[tokio::test]
    async fn keyword_failure_degrades_to_empty_set() {
        let completion = ScriptedCompletion::new()
            .fail(200, 503)
            .ok(2000, r#"{"summary": "tailored"}"#)
            .ok(500, "suggestions");
        let (orchestrator, _history) = orchestrator(completion);

        let rx = orchestrator.start(posting()).await.unwrap();
        let (progress, artifact, error) = drain(rx).await;

        assert!(error.is_none());
        let artifact = artifact.expect("keyword failure is non-fatal");
        assert!(artifact.extracted_keywords.is_empty());
        assert!(artifact.structured_content.is_some());
        assert_eq!(artifact.status, crate::types::ArtifactStatus::Generated);

        // The run still reached the CV stage and beyond.
        assert!(progress
            .iter()
            .any(|p| p.stage == GenerationStage::GeneratingCv));
    }

    #[tokio::test]
    async fn prose_cv_output_falls_back_to_raw_content() {
        let prose = "Ada Lovelace\nSeasoned engineer with pipeline experience.";
        let completion = ScriptedCompletion::new()
            .ok(200, "python")
            .ok(2000, prose)
            .ok(500, "suggestions");
        let (orchestrator, _history) = orchestrator(completion);

        let rx = orchestrator.start(posting()).await.unwrap();
        let (progress, artifact, error) = drain(rx).await;

        assert!(error.is_none());
        let artifact = artifact.expect("unparsable output is not an error");
        assert_eq!(artifact.raw_content.as_deref(), Some(prose));
        assert!(artifact.structured_content.is_none());
        assert_eq!(
            progress.last().map(|p| p.stage),
            Some(GenerationStage::Completed)
        );
    }

    #[tokio::test]
    async fn cv_stage_failure_fails_run_and_persists_nothing() {
        let completion = ScriptedCompletion::new()
            .ok(200, "python")
            .fail(2000, 500)
            .ok(500, "unused");
        let (orchestrator, history) = orchestrator(completion);

        let rx = orchestrator.start(posting()).await.unwrap();
        let (progress, artifact, error) = drain(rx).await;

        assert!(artifact.is_none());
        let error = error.expect("CV failure is fatal");
        assert!(matches!(
            error,
            GenerationError::Completion(CompletionError::Server { status: 500, .. })
        ));

        // Final progress event resets percent to 0.
        let last = progress.last().expect("failure emits a final event");
        assert_eq!(last.stage, GenerationStage::Failed);
        assert_eq!(last.percent, 0);

        let stored = history
            .list(HistoryFilter::All, HistorySort::default())
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn ats_failure_omits_suggestions_only() {
        let completion = ScriptedCompletion::new()
            .ok(200, "python")
            .ok(2000, r#"{"summary": "tailored"}"#)
            .fail(500, 502);
        let (orchestrator, _history) = orchestrator(completion);

        let rx = orchestrator.start(posting()).await.unwrap();
        let (_, artifact, error) = drain(rx).await;

        assert!(error.is_none());
        let artifact = artifact.expect("ATS failure is non-fatal");
        assert!(artifact.ats_suggestions.is_none());
        assert!(artifact.structured_content.is_some());
    }

    #[tokio::test]
    async fn second_start_for_same_job_is_rejected() {
        // The spawned run has not been polled yet, so the job id is still
        // held when the second start arrives.
        let completion = ScriptedCompletion::new()
            .ok(200, "python")
            .ok(2000, r#"{"summary": "tailored"}"#)
            .ok(500, "suggestions");
        let (orchestrator, _history) = orchestrator(completion);

        let _rx = orchestrator.start(posting()).await.unwrap();
        let second = orchestrator.start(posting()).await;

        match second {
            Err(GenerationError::AlreadyRunning { job_id }) => assert_eq!(job_id, "job-1"),
            other => panic!("expected AlreadyRunning, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn finished_run_frees_the_job_for_a_new_start() {
        let completion = ScriptedCompletion::new()
            .ok(200, "python")
            .ok(2000, r#"{"summary": "tailored"}"#)
            .ok(500, "suggestions");
        let (orchestrator, _history) = orchestrator(completion);

        let rx = orchestrator.start(posting()).await.unwrap();
        let _ = drain(rx).await;

        assert!(orchestrator.start(posting()).await.is_ok());
    }

    #[tokio::test]
    async fn abandoned_run_is_not_persisted() {
        let completion = ScriptedCompletion::new()
            .ok(200, "python")
            .ok(2000, r#"{"summary": "tailored"}"#)
            .ok(500, "suggestions");
        let (orchestrator, history) = orchestrator(completion);

        let rx = orchestrator.start(posting()).await.unwrap();
        drop(rx);

        // Wait for the run to notice the abandonment and release the job.
        for _ in 0..50 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            if orchestrator.active.lock().await.is_empty() {
                break;
            }
        }

        let stored = history
            .list(HistoryFilter::All, HistorySort::default())
            .await
            .unwrap();
        assert!(stored.is_empty());
    }
}
