// src/history.rs
//! History store: the durable collection of generated CV artifacts.
//!
//! The whole collection is read in full and rewritten in full on every
//! mutation, which is fine at the expected scale of a few hundred records.
//! Mutations are serialized behind a mutex so concurrent run completions
//! append safely.

use chrono::{Duration, Utc};
use std::cmp::Ordering;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::storage::StoragePort;
use crate::types::{ArtifactStatus, CvArtifact};

const HISTORY_COLLECTION: &str = "cv_history";

#[derive(Debug, Error)]
pub enum HistoryError {
    /// Invariant violation: artifact ids are freshly minted per run, so a
    /// duplicate means a programming error upstream.
    #[error("artifact {id} already exists in history")]
    Duplicate { id: String },
    #[error("artifact {id} not found in history")]
    NotFound { id: String },
    #[error("history storage failed: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HistoryFilter {
    All,
    FavoritesOnly,
    StatusEquals(ArtifactStatus),
    CreatedWithin(Duration),
}

impl HistoryFilter {
    /// Parse the filter names the UI uses. `recent` is the last seven days.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "favorites" => Some(Self::FavoritesOnly),
            "recent" => Some(Self::CreatedWithin(Duration::days(7))),
            other => ArtifactStatus::from_str(other).map(Self::StatusEquals),
        }
    }

    fn matches(&self, artifact: &CvArtifact) -> bool {
        match self {
            Self::All => true,
            Self::FavoritesOnly => artifact.favorite,
            Self::StatusEquals(status) => artifact.status == *status,
            Self::CreatedWithin(duration) => artifact.generated_at > Utc::now() - *duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistorySort {
    #[default]
    GeneratedAtDesc,
    CompanyAsc,
    MatchScoreDesc,
    JobTitleAsc,
}

impl HistorySort {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "date" => Some(Self::GeneratedAtDesc),
            "company" => Some(Self::CompanyAsc),
            "score" => Some(Self::MatchScoreDesc),
            "title" => Some(Self::JobTitleAsc),
            _ => None,
        }
    }

    fn compare(&self, a: &CvArtifact, b: &CvArtifact) -> Ordering {
        // Ties always break by generated_at descending for a stable view.
        let recency = b.generated_at.cmp(&a.generated_at);
        match self {
            Self::GeneratedAtDesc => recency,
            Self::CompanyAsc => a
                .company
                .to_lowercase()
                .cmp(&b.company.to_lowercase())
                .then(recency),
            Self::MatchScoreDesc => b.match_score.cmp(&a.match_score).then(recency),
            Self::JobTitleAsc => a
                .job_title
                .to_lowercase()
                .cmp(&b.job_title.to_lowercase())
                .then(recency),
        }
    }
}

pub struct HistoryStore {
    storage: Arc<dyn StoragePort>,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(storage: Arc<dyn StoragePort>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// Append a new artifact. Recreating an existing id is rejected; history
    /// entries are never silently overwritten.
    pub async fn create(&self, artifact: CvArtifact) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock().await;

        let mut items = self.load().await?;
        if items.iter().any(|existing| existing.id == artifact.id) {
            return Err(HistoryError::Duplicate {
                id: artifact.id.clone(),
            });
        }

        info!(
            "Recording generated CV {} for {} at {}",
            artifact.id, artifact.job_title, artifact.company
        );
        items.insert(0, artifact);
        self.save(&items).await
    }

    pub async fn list(
        &self,
        filter: HistoryFilter,
        sort: HistorySort,
    ) -> Result<Vec<CvArtifact>, HistoryError> {
        let mut items = self.load().await?;
        items.retain(|artifact| filter.matches(artifact));
        items.sort_by(|a, b| sort.compare(a, b));
        Ok(items)
    }

    pub async fn set_favorite(
        &self,
        id: &str,
        favorite: bool,
    ) -> Result<CvArtifact, HistoryError> {
        self.update(id, |artifact| artifact.favorite = favorite).await
    }

    pub async fn set_status(
        &self,
        id: &str,
        status: ArtifactStatus,
    ) -> Result<CvArtifact, HistoryError> {
        self.update(id, |artifact| artifact.status = status).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock().await;

        let mut items = self.load().await?;
        let before = items.len();
        items.retain(|artifact| artifact.id != id);

        if items.len() == before {
            return Err(HistoryError::NotFound { id: id.to_string() });
        }

        info!("Deleted CV {} from history", id);
        self.save(&items).await
    }

    async fn update(
        &self,
        id: &str,
        apply: impl FnOnce(&mut CvArtifact),
    ) -> Result<CvArtifact, HistoryError> {
        let _guard = self.write_lock.lock().await;

        let mut items = self.load().await?;
        let artifact = items
            .iter_mut()
            .find(|artifact| artifact.id == id)
            .ok_or_else(|| HistoryError::NotFound { id: id.to_string() })?;

        apply(artifact);
        let updated = artifact.clone();
        self.save(&items).await?;
        Ok(updated)
    }

    async fn load(&self) -> Result<Vec<CvArtifact>, HistoryError> {
        match self
            .storage
            .read(HISTORY_COLLECTION)
            .await
            .map_err(|e| HistoryError::Storage(e.to_string()))?
        {
            // Absence of stored data is not an error.
            None => Ok(Vec::new()),
            Some(payload) => serde_json::from_str(&payload)
                .map_err(|e| HistoryError::Storage(e.to_string())),
        }
    }

    async fn save(&self, items: &[CvArtifact]) -> Result<(), HistoryError> {
        let payload = serde_json::to_string(items)
            .map_err(|e| HistoryError::Storage(e.to_string()))?;
        self.storage
            .write(HISTORY_COLLECTION, &payload)
            .await
            .map_err(|e| HistoryError::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use crate::types::{CvContent, JobPosting};

    fn store() -> HistoryStore {
        HistoryStore::new(Arc::new(MemoryStorage::new()))
    }

    fn posting(id: &str, title: &str, company: &str, score: Option<i32>) -> JobPosting {
        JobPosting {
            id: id.to_string(),
            title: title.to_string(),
            company: company.to_string(),
            location: String::new(),
            posting_type: String::new(),
            description: String::new(),
            tags: vec![],
            requirements: vec![],
            match_score: score,
            external_url: None,
        }
    }

    fn artifact(title: &str, company: &str, score: Option<i32>) -> CvArtifact {
        CvArtifact::from_generation(
            &posting("job", title, company, score),
            CvContent::Raw("cv".to_string()),
            vec![],
            None,
        )
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let store = store();
        let items = store
            .list(HistoryFilter::All, HistorySort::default())
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn create_then_list_returns_newest_first() {
        let store = store();
        let older = artifact("Data Engineer", "TechCorp", Some(80));
        let mut newer = artifact("ML Engineer", "AI Labs", Some(70));
        newer.generated_at = older.generated_at + Duration::seconds(5);

        store.create(older.clone()).await.unwrap();
        store.create(newer.clone()).await.unwrap();

        let items = store
            .list(HistoryFilter::All, HistorySort::GeneratedAtDesc)
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, newer.id);
        assert_eq!(items[1].id, older.id);
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let store = store();
        let first = artifact("Data Engineer", "TechCorp", None);
        let mut duplicate = artifact("Other", "Other", None);
        duplicate.id = first.id.clone();

        store.create(first).await.unwrap();
        let err = store.create(duplicate).await.unwrap_err();
        assert!(matches!(err, HistoryError::Duplicate { .. }));

        let items = store
            .list(HistoryFilter::All, HistorySort::default())
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn favorite_round_trip() {
        let store = store();
        let item = artifact("Data Engineer", "TechCorp", None);
        let id = item.id.clone();
        store.create(item).await.unwrap();

        store.set_favorite(&id, true).await.unwrap();
        let favorites = store
            .list(HistoryFilter::FavoritesOnly, HistorySort::default())
            .await
            .unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, id);

        store.set_favorite(&id, false).await.unwrap();
        let favorites = store
            .list(HistoryFilter::FavoritesOnly, HistorySort::default())
            .await
            .unwrap();
        assert!(favorites.is_empty());
    }

    #[tokio::test]
    async fn status_filter_matches_transitions() {
        let store = store();
        let item = artifact("Data Engineer", "TechCorp", None);
        let id = item.id.clone();
        store.create(item).await.unwrap();

        let updated = store
            .set_status(&id, ArtifactStatus::Downloaded)
            .await
            .unwrap();
        assert_eq!(updated.status, ArtifactStatus::Downloaded);

        let downloaded = store
            .list(
                HistoryFilter::StatusEquals(ArtifactStatus::Downloaded),
                HistorySort::default(),
            )
            .await
            .unwrap();
        assert_eq!(downloaded.len(), 1);

        let generated = store
            .list(
                HistoryFilter::StatusEquals(ArtifactStatus::Generated),
                HistorySort::default(),
            )
            .await
            .unwrap();
        assert!(generated.is_empty());
    }

    #[tokio::test]
    async fn created_within_excludes_old_entries() {
        let store = store();
        let mut old = artifact("Old Role", "OldCorp", None);
        old.generated_at = Utc::now() - Duration::days(30);
        let fresh = artifact("New Role", "NewCorp", None);
        let fresh_id = fresh.id.clone();

        store.create(old).await.unwrap();
        store.create(fresh).await.unwrap();

        let recent = store
            .list(
                HistoryFilter::CreatedWithin(Duration::days(7)),
                HistorySort::default(),
            )
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, fresh_id);
    }

    #[tokio::test]
    async fn sort_by_company_breaks_ties_by_recency() {
        let store = store();
        let mut first = artifact("Role A", "Acme", Some(50));
        let mut second = artifact("Role B", "Acme", Some(60));
        let mut third = artifact("Role C", "Beta", Some(90));
        first.generated_at = Utc::now() - Duration::seconds(20);
        second.generated_at = Utc::now() - Duration::seconds(10);
        third.generated_at = Utc::now() - Duration::seconds(5);
        let (a, b, c) = (first.id.clone(), second.id.clone(), third.id.clone());

        store.create(first).await.unwrap();
        store.create(second).await.unwrap();
        store.create(third).await.unwrap();

        let items = store
            .list(HistoryFilter::All, HistorySort::CompanyAsc)
            .await
            .unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        // Acme before Beta; within Acme, newer first.
        assert_eq!(ids, vec![b.as_str(), a.as_str(), c.as_str()]);
    }

    #[tokio::test]
    async fn sort_by_match_score_descending() {
        let store = store();
        let low = artifact("Role", "A", Some(40));
        let high = artifact("Role", "B", Some(95));
        let (low_id, high_id) = (low.id.clone(), high.id.clone());

        store.create(low).await.unwrap();
        store.create(high).await.unwrap();

        let items = store
            .list(HistoryFilter::All, HistorySort::MatchScoreDesc)
            .await
            .unwrap();
        assert_eq!(items[0].id, high_id);
        assert_eq!(items[1].id, low_id);
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let store = store();
        let item = artifact("Data Engineer", "TechCorp", None);
        let id = item.id.clone();
        store.create(item).await.unwrap();

        store.delete(&id).await.unwrap();
        let err = store.delete(&id).await.unwrap_err();
        assert!(matches!(err, HistoryError::NotFound { .. }));

        let items = store
            .list(HistoryFilter::All, HistorySort::default())
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn filter_and_sort_parsing() {
        assert_eq!(HistoryFilter::parse("all"), Some(HistoryFilter::All));
        assert_eq!(
            HistoryFilter::parse("favorites"),
            Some(HistoryFilter::FavoritesOnly)
        );
        assert_eq!(
            HistoryFilter::parse("downloaded"),
            Some(HistoryFilter::StatusEquals(ArtifactStatus::Downloaded))
        );
        assert!(matches!(
            HistoryFilter::parse("recent"),
            Some(HistoryFilter::CreatedWithin(_))
        ));
        assert_eq!(HistoryFilter::parse("bogus"), None);

        assert_eq!(HistorySort::parse("date"), Some(HistorySort::GeneratedAtDesc));
        assert_eq!(HistorySort::parse("score"), Some(HistorySort::MatchScoreDesc));
        assert_eq!(HistorySort::parse("bogus"), None);
    }
}
