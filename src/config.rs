// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3.1:free";
const DEFAULT_REFERER: &str = "https://cvtailor.local";
const DEFAULT_APP_TITLE: &str = "CvTailor";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: EnvironmentConfig,
    pub completion: CompletionSettings,
}

/// Paths for the single-user local store.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    pub data_path: PathBuf,
    pub profile_path: PathBuf,
}

/// Completion endpoint settings. The origin and title headers are a fixed
/// provider requirement, not a design variable; the API key comes only from
/// the process environment.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub referer: String,
    pub app_title: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: EnvironmentConfig,
    production: EnvironmentConfig,
}

impl AppConfig {
    /// Load configuration: environment paths from config.yaml (selected by
    /// environment), completion settings from environment variables with
    /// defaults.
    pub fn load() -> Result<Self> {
        let environment = EnvironmentConfig::load()?;
        let completion = CompletionSettings::load()?;

        Ok(Self {
            environment,
            completion,
        })
    }

    /// Ensure configured directories exist.
    pub async fn ensure_directories(&self) -> Result<()> {
        crate::core::FsOps::ensure_dir_exists(&self.environment.data_path).await?;

        if let Some(profile_parent) = self.environment.profile_path.parent() {
            crate::core::FsOps::ensure_dir_exists(profile_parent).await?;
        }

        Ok(())
    }
}

impl EnvironmentConfig {
    fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let config_path = PathBuf::from("config.yaml");
        if !config_path.exists() {
            // No config file: default to a local data directory.
            return Ok(Self {
                data_path: Self::resolve_path(&PathBuf::from("data"))?,
                profile_path: Self::resolve_path(&PathBuf::from("data/profile.toml"))?,
            });
        }

        let config_content =
            std::fs::read_to_string(&config_path).context("Failed to read config.yaml")?;

        let config_file: ConfigFile =
            serde_yaml::from_str(&config_content).context("Failed to parse config.yaml")?;

        let env_config = match environment.as_str() {
            "production" => config_file.production,
            _ => config_file.local,
        };

        Ok(Self {
            data_path: Self::resolve_path(&env_config.data_path)?,
            profile_path: Self::resolve_path(&env_config.profile_path)?,
        })
    }

    fn get_environment() -> String {
        std::env::var("CVTAILOR_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn resolve_path(path: &PathBuf) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.clone())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }
}

impl CompletionSettings {
    fn load() -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .context("OPENROUTER_API_KEY environment variable not set")?;

        let base_url =
            std::env::var("OPENROUTER_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let model =
            std::env::var("OPENROUTER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let referer =
            std::env::var("CVTAILOR_ORIGIN").unwrap_or_else(|_| DEFAULT_REFERER.to_string());

        Ok(Self {
            base_url,
            api_key,
            model,
            referer,
            app_title: DEFAULT_APP_TITLE.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        })
    }
}
