// src/profile.rs
//! Profile store: read-only access to the user's stored profile.
//!
//! The profile lives in a single TOML file. Absence is not an error; a
//! malformed file is logged and reported as absent so profile problems can
//! never sink a generation run.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::core::FsOps;
use crate::types::UserProfile;

#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn read(&self) -> Result<Option<UserProfile>>;
}

pub struct FileProfileStore {
    path: PathBuf,
}

impl FileProfileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ProfileSource for FileProfileStore {
    async fn read(&self) -> Result<Option<UserProfile>> {
        if !FsOps::file_exists(&self.path).await {
            info!("No profile stored at {}", self.path.display());
            return Ok(None);
        }

        let content = FsOps::read_file(&self.path).await?;

        match toml::from_str::<UserProfile>(&content) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                warn!("Failed to parse profile {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }
}
