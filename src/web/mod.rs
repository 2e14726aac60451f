// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use handlers::RunRegistry;
pub use types::*;

use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, routes, Request, Response, State};
use std::sync::Arc;
use tracing::info;

use crate::generation::GenerationOrchestrator;
use crate::history::HistoryStore;
use crate::types::CvArtifact;

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
    }
}

#[post("/cv/generate", data = "<request>")]
pub async fn start_generation(
    request: Json<GenerateCvRequest>,
    orchestrator: &State<Arc<GenerationOrchestrator>>,
    registry: &State<Arc<RunRegistry>>,
) -> Result<Json<DataResponse<RunSnapshot>>, Json<ErrorResponse>> {
    handlers::start_generation_handler(request, orchestrator, registry).await
}

#[get("/cv/progress/<job_id>")]
pub async fn get_progress(
    job_id: String,
    registry: &State<Arc<RunRegistry>>,
) -> Result<Json<DataResponse<RunSnapshot>>, Json<ErrorResponse>> {
    handlers::get_progress_handler(job_id, registry).await
}

#[post("/cv/cancel/<job_id>")]
pub async fn cancel_generation(
    job_id: String,
    registry: &State<Arc<RunRegistry>>,
) -> Result<Json<ActionResponse>, Json<ErrorResponse>> {
    handlers::cancel_generation_handler(job_id, registry).await
}

#[post("/cv/cover-letter", data = "<request>")]
pub async fn cover_letter(
    request: Json<CoverLetterRequest>,
    orchestrator: &State<Arc<GenerationOrchestrator>>,
) -> Result<Json<DataResponse<String>>, Json<ErrorResponse>> {
    handlers::cover_letter_handler(request, orchestrator).await
}

#[get("/history?<filter>&<sort>")]
pub async fn list_history(
    filter: Option<String>,
    sort: Option<String>,
    history: &State<Arc<HistoryStore>>,
) -> Result<Json<DataResponse<Vec<CvArtifact>>>, Json<ErrorResponse>> {
    handlers::list_history_handler(filter, sort, history).await
}

#[post("/history/favorite", data = "<request>")]
pub async fn set_favorite(
    request: Json<FavoriteRequest>,
    history: &State<Arc<HistoryStore>>,
) -> Result<Json<DataResponse<CvArtifact>>, Json<ErrorResponse>> {
    handlers::set_favorite_handler(request, history).await
}

#[post("/history/status", data = "<request>")]
pub async fn set_status(
    request: Json<StatusRequest>,
    history: &State<Arc<HistoryStore>>,
) -> Result<Json<DataResponse<CvArtifact>>, Json<ErrorResponse>> {
    handlers::set_status_handler(request, history).await
}

#[post("/history/delete", data = "<request>")]
pub async fn delete_artifact(
    request: Json<DeleteRequest>,
    history: &State<Arc<HistoryStore>>,
) -> Result<Json<ActionResponse>, Json<ErrorResponse>> {
    handlers::delete_artifact_handler(request, history).await
}

#[get("/health")]
pub async fn health() -> Json<ActionResponse> {
    Json(ActionResponse::success("ok".to_string()))
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<ErrorResponse> {
    Json(ErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<ErrorResponse> {
    Json(ErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
    ))
}

// Main server start function
pub async fn start_web_server(
    orchestrator: Arc<GenerationOrchestrator>,
    history: Arc<HistoryStore>,
) -> Result<()> {
    let registry = Arc::new(RunRegistry::default());

    info!("Starting CvTailor API server");

    let _rocket = rocket::build()
        .attach(Cors)
        .manage(orchestrator)
        .manage(history)
        .manage(registry)
        .register("/api", catchers![bad_request, internal_error])
        .mount(
            "/api",
            routes![
                start_generation,
                get_progress,
                cancel_generation,
                cover_letter,
                list_history,
                set_favorite,
                set_status,
                delete_artifact,
                health,
                options,
            ],
        )
        .launch()
        .await;

    Ok(())
}
