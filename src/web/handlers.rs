// src/web/handlers.rs

use rocket::serde::json::Json;
use rocket::State;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::generation::{GenerationError, GenerationEvent, GenerationOrchestrator};
use crate::history::{HistoryFilter, HistorySort, HistoryStore};
use crate::types::{ArtifactStatus, CvArtifact};
use crate::web::types::{
    ActionResponse, CoverLetterRequest, DataResponse, DeleteRequest, ErrorResponse,
    FavoriteRequest, GenerateCvRequest, RunSnapshot, StatusRequest,
};

/// Tracks active and recently finished runs for the polling UI. The
/// orchestrator owns pipeline state; this only mirrors emitted events.
pub struct RunRegistry {
    runs: RwLock<HashMap<String, RunEntry>>,
}

struct RunEntry {
    snapshot: RunSnapshot,
    consumer: Option<JoinHandle<()>>,
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
        }
    }
}

impl RunRegistry {
    pub async fn snapshot(&self, job_id: &str) -> Option<RunSnapshot> {
        self.runs
            .read()
            .await
            .get(job_id)
            .map(|entry| entry.snapshot.clone())
    }

    async fn insert(&self, job_id: String) {
        let mut runs = self.runs.write().await;
        runs.insert(
            job_id.clone(),
            RunEntry {
                snapshot: RunSnapshot::started(job_id),
                consumer: None,
            },
        );
    }

    async fn attach_consumer(&self, job_id: &str, handle: JoinHandle<()>) {
        if let Some(entry) = self.runs.write().await.get_mut(job_id) {
            entry.consumer = Some(handle);
        }
    }

    async fn update<F: FnOnce(&mut RunSnapshot)>(&self, job_id: &str, apply: F) {
        if let Some(entry) = self.runs.write().await.get_mut(job_id) {
            apply(&mut entry.snapshot);
        }
    }

    /// Abandon a run: dropping the consumer task drops its event receiver,
    /// which tells the orchestrator to discard the eventual result.
    async fn cancel(&self, job_id: &str) -> bool {
        let mut runs = self.runs.write().await;
        match runs.remove(job_id) {
            Some(entry) => {
                if let Some(consumer) = entry.consumer {
                    consumer.abort();
                }
                true
            }
            None => false,
        }
    }
}

pub async fn start_generation_handler(
    request: Json<GenerateCvRequest>,
    orchestrator: &State<Arc<GenerationOrchestrator>>,
    registry: &State<Arc<RunRegistry>>,
) -> Result<Json<DataResponse<RunSnapshot>>, Json<ErrorResponse>> {
    let job = request.into_inner().job;
    let job_id = job.id.clone();

    info!("Generation requested for job {} ({})", job_id, job.title);

    let rx = match orchestrator.start(job).await {
        Ok(rx) => rx,
        Err(e @ GenerationError::AlreadyRunning { .. }) => {
            warn!("Rejected duplicate generation start for job {}", job_id);
            return Err(Json(ErrorResponse::new(
                e.user_message().to_string(),
                "ALREADY_RUNNING".to_string(),
            )));
        }
        Err(e) => {
            error!("Failed to start generation for job {}: {}", job_id, e);
            return Err(Json(ErrorResponse::new(
                e.user_message().to_string(),
                "GENERATION_START_FAILED".to_string(),
            )));
        }
    };

    registry.insert(job_id.clone()).await;

    let registry_for_run = Arc::clone(registry.inner());
    let run_job_id = job_id.clone();
    let consumer = tokio::spawn(async move {
        let mut rx = rx;
        while let Some(event) = rx.recv().await {
            match event {
                GenerationEvent::Progress(progress) => {
                    registry_for_run
                        .update(&run_job_id, |snapshot| snapshot.apply_progress(&progress))
                        .await;
                }
                GenerationEvent::Completed(artifact) => {
                    registry_for_run
                        .update(&run_job_id, |snapshot| {
                            snapshot.finished = true;
                            snapshot.artifact = Some(*artifact);
                        })
                        .await;
                }
                GenerationEvent::Failed(e) => {
                    registry_for_run
                        .update(&run_job_id, |snapshot| {
                            snapshot.finished = true;
                            snapshot.error = Some(e.user_message().to_string());
                        })
                        .await;
                }
            }
        }
    });
    registry.attach_consumer(&job_id, consumer).await;

    let snapshot = registry
        .snapshot(&job_id)
        .await
        .unwrap_or_else(|| RunSnapshot::started(job_id));

    Ok(Json(DataResponse::success(
        "CV generation started".to_string(),
        snapshot,
    )))
}

pub async fn get_progress_handler(
    job_id: String,
    registry: &State<Arc<RunRegistry>>,
) -> Result<Json<DataResponse<RunSnapshot>>, Json<ErrorResponse>> {
    match registry.snapshot(&job_id).await {
        Some(snapshot) => Ok(Json(DataResponse::success(
            "Current generation progress".to_string(),
            snapshot,
        ))),
        None => Err(Json(ErrorResponse::new(
            format!("No generation run found for job {}", job_id),
            "RUN_NOT_FOUND".to_string(),
        ))),
    }
}

pub async fn cancel_generation_handler(
    job_id: String,
    registry: &State<Arc<RunRegistry>>,
) -> Result<Json<ActionResponse>, Json<ErrorResponse>> {
    if registry.cancel(&job_id).await {
        info!("Generation run for job {} abandoned by caller", job_id);
        Ok(Json(ActionResponse::success(
            "Generation abandoned".to_string(),
        )))
    } else {
        Err(Json(ErrorResponse::new(
            format!("No generation run found for job {}", job_id),
            "RUN_NOT_FOUND".to_string(),
        )))
    }
}

pub async fn cover_letter_handler(
    request: Json<CoverLetterRequest>,
    orchestrator: &State<Arc<GenerationOrchestrator>>,
) -> Result<Json<DataResponse<String>>, Json<ErrorResponse>> {
    match orchestrator.generate_cover_letter(&request.job).await {
        Ok(letter) => Ok(Json(DataResponse::success(
            "Cover letter generated".to_string(),
            letter,
        ))),
        Err(e) => {
            error!("Cover letter generation failed: {}", e);
            Err(Json(ErrorResponse::new(
                e.user_message().to_string(),
                "COVER_LETTER_FAILED".to_string(),
            )))
        }
    }
}

pub async fn list_history_handler(
    filter: Option<String>,
    sort: Option<String>,
    history: &State<Arc<HistoryStore>>,
) -> Result<Json<DataResponse<Vec<CvArtifact>>>, Json<ErrorResponse>> {
    let filter = match filter.as_deref() {
        None => HistoryFilter::All,
        Some(value) => match HistoryFilter::parse(value) {
            Some(filter) => filter,
            None => {
                return Err(Json(ErrorResponse::new(
                    format!("Unknown history filter: {}", value),
                    "INVALID_FILTER".to_string(),
                )))
            }
        },
    };

    let sort = match sort.as_deref() {
        None => HistorySort::default(),
        Some(value) => match HistorySort::parse(value) {
            Some(sort) => sort,
            None => {
                return Err(Json(ErrorResponse::new(
                    format!("Unknown history sort: {}", value),
                    "INVALID_SORT".to_string(),
                )))
            }
        },
    };

    match history.list(filter, sort).await {
        Ok(items) => Ok(Json(DataResponse::success(
            format!("{} CVs in history", items.len()),
            items,
        ))),
        Err(e) => {
            error!("Failed to list history: {}", e);
            Err(Json(ErrorResponse::new(
                "Failed to load CV history".to_string(),
                "HISTORY_READ_FAILED".to_string(),
            )))
        }
    }
}

pub async fn set_favorite_handler(
    request: Json<FavoriteRequest>,
    history: &State<Arc<HistoryStore>>,
) -> Result<Json<DataResponse<CvArtifact>>, Json<ErrorResponse>> {
    match history.set_favorite(&request.id, request.favorite).await {
        Ok(artifact) => Ok(Json(DataResponse::success(
            "Favorite updated".to_string(),
            artifact,
        ))),
        Err(e) => Err(history_error_response(e)),
    }
}

pub async fn set_status_handler(
    request: Json<StatusRequest>,
    history: &State<Arc<HistoryStore>>,
) -> Result<Json<DataResponse<CvArtifact>>, Json<ErrorResponse>> {
    let Some(status) = ArtifactStatus::from_str(&request.status) else {
        return Err(Json(ErrorResponse::new(
            format!("Unknown status: {}", request.status),
            "INVALID_STATUS".to_string(),
        )));
    };

    match history.set_status(&request.id, status).await {
        Ok(artifact) => Ok(Json(DataResponse::success(
            "Status updated".to_string(),
            artifact,
        ))),
        Err(e) => Err(history_error_response(e)),
    }
}

pub async fn delete_artifact_handler(
    request: Json<DeleteRequest>,
    history: &State<Arc<HistoryStore>>,
) -> Result<Json<ActionResponse>, Json<ErrorResponse>> {
    match history.delete(&request.id).await {
        Ok(()) => Ok(Json(ActionResponse::success(
            "CV deleted from history".to_string(),
        ))),
        Err(e) => Err(history_error_response(e)),
    }
}

fn history_error_response(e: crate::history::HistoryError) -> Json<ErrorResponse> {
    use crate::history::HistoryError;
    match e {
        HistoryError::NotFound { id } => Json(ErrorResponse::new(
            format!("CV {} not found in history", id),
            "NOT_FOUND".to_string(),
        )),
        other => {
            error!("History operation failed: {}", other);
            Json(ErrorResponse::new(
                "History operation failed".to_string(),
                "HISTORY_WRITE_FAILED".to_string(),
            ))
        }
    }
}
