use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use cv_tailor::config::AppConfig;
use cv_tailor::core::CompletionClient;
use cv_tailor::generation::{GenerationEvent, GenerationOrchestrator};
use cv_tailor::history::{HistoryFilter, HistorySort, HistoryStore};
use cv_tailor::profile::FileProfileStore;
use cv_tailor::storage::FileStorage;
use cv_tailor::types::JobPosting;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

#[derive(Parser)]
#[command(name = "cvtailor")]
#[command(about = "Generate job-tailored, ATS-optimized CVs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the API server
    Serve,
    /// Run one generation for a job posting stored as JSON
    Generate {
        /// Path to the job posting JSON file
        #[arg(long)]
        job: PathBuf,
    },
    /// List the CV history
    History {
        /// Filter: all, favorites, recent, generated, viewed, downloaded
        #[arg(long, default_value = "all")]
        filter: String,
        /// Sort: date, company, score, title
        #[arg(long, default_value = "date")]
        sort: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    Registry::default()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or(EnvFilter::new("cv_tailor=info,rocket::server=off")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    config.ensure_directories().await?;

    let storage = Arc::new(FileStorage::new(config.environment.data_path.clone()));
    let history = Arc::new(HistoryStore::new(storage));
    let profiles = Arc::new(FileProfileStore::new(config.environment.profile_path.clone()));
    let completion = Arc::new(CompletionClient::new(config.completion.clone())?);
    let orchestrator = Arc::new(GenerationOrchestrator::new(
        completion,
        profiles,
        Arc::clone(&history),
        config.completion.model.clone(),
    ));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => cv_tailor::start_web_server(orchestrator, history).await,
        Command::Generate { job } => run_generation(&orchestrator, &job).await,
        Command::History { filter, sort } => list_history(&history, &filter, &sort).await,
    }
}

async fn run_generation(
    orchestrator: &Arc<GenerationOrchestrator>,
    job_path: &PathBuf,
) -> Result<()> {
    let job_content = tokio::fs::read_to_string(job_path)
        .await
        .with_context(|| format!("Failed to read job file: {}", job_path.display()))?;
    let job: JobPosting =
        serde_json::from_str(&job_content).context("Failed to parse job posting JSON")?;

    let mut rx = orchestrator
        .start(job)
        .await
        .context("Failed to start generation")?;

    while let Some(event) = rx.recv().await {
        match event {
            GenerationEvent::Progress(progress) => {
                println!("[{:>3}%] {}", progress.percent, progress.message);
            }
            GenerationEvent::Completed(artifact) => {
                println!("✓ Generated {} ({})", artifact.file_name, artifact.id);
                if let Some(suggestions) = &artifact.ats_suggestions {
                    println!("\nATS suggestions:\n{}", suggestions);
                }
                return Ok(());
            }
            GenerationEvent::Failed(e) => {
                anyhow::bail!("{}", e);
            }
        }
    }

    anyhow::bail!("Generation ended without a result")
}

async fn list_history(history: &Arc<HistoryStore>, filter: &str, sort: &str) -> Result<()> {
    let filter = HistoryFilter::parse(filter)
        .ok_or_else(|| anyhow::anyhow!("Unknown filter: {}", filter))?;
    let sort =
        HistorySort::parse(sort).ok_or_else(|| anyhow::anyhow!("Unknown sort: {}", sort))?;

    let items = history.list(filter, sort).await?;
    if items.is_empty() {
        println!("No CVs in history");
        return Ok(());
    }

    for artifact in items {
        let favorite = if artifact.favorite { "★" } else { " " };
        println!(
            "{} {}  {} at {}  [{}]  score {}  {}",
            favorite,
            artifact.generated_at.format("%Y-%m-%d %H:%M"),
            artifact.job_title,
            artifact.company,
            artifact.status.as_str(),
            artifact.match_score,
            artifact.id,
        );
    }

    Ok(())
}
