use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::{EventLog, ProgressStore, ReviewSink, WordCatalog};
use crate::types::{AttemptStats, CatalogWord, LearningEvent, WordFilter, WordKey, WordProgress};

#[derive(Default)]
struct MemoryInner {
    progress: HashMap<(String, WordKey), WordProgress>,
    events: Vec<LearningEvent>,
}

/// In-memory progress store and event log behind one `RwLock`, which makes
/// `persist_review` atomic for free.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryStore {
    async fn get_progress(
        &self,
        user_id: &str,
        word_key: &WordKey,
    ) -> Result<Option<WordProgress>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .progress
            .get(&(user_id.to_string(), word_key.clone()))
            .cloned())
    }

    async fn upsert_progress(&self, progress: &WordProgress) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.progress.insert(
            (progress.user_id.clone(), progress.word_key.clone()),
            progress.clone(),
        );
        Ok(())
    }

    async fn due_progress(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<WordProgress>, StoreError> {
        let inner = self.inner.read().await;
        let mut due: Vec<WordProgress> = inner
            .progress
            .values()
            .filter(|p| p.user_id == user_id && p.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|p| p.next_review_date);
        Ok(due)
    }

    async fn user_progress(&self, user_id: &str) -> Result<Vec<WordProgress>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .progress
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn reset_user(&self, user_id: &str) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.progress.len();
        inner.progress.retain(|(uid, _), _| uid != user_id);
        Ok((before - inner.progress.len()) as u64)
    }
}

impl EventLog for MemoryStore {
    async fn append(&self, event: &LearningEvent) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.events.push(event.clone());
        Ok(())
    }

    async fn query_events(
        &self,
        user_id: &str,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<LearningEvent>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .events
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| match range {
                Some((start, end)) => e.timestamp >= start && e.timestamp <= end,
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn attempt_stats(
        &self,
        user_id: &str,
    ) -> Result<HashMap<WordKey, AttemptStats>, StoreError> {
        let inner = self.inner.read().await;
        let mut stats: HashMap<WordKey, AttemptStats> = HashMap::new();
        for event in inner.events.iter().filter(|e| e.user_id == user_id) {
            stats
                .entry(event.word_key.clone())
                .or_default()
                .record(event.correct);
        }
        Ok(stats)
    }

    async fn purge_user(&self, user_id: &str) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.events.len();
        inner.events.retain(|e| e.user_id != user_id);
        Ok((before - inner.events.len()) as u64)
    }
}

impl ReviewSink for MemoryStore {
    async fn persist_review(
        &self,
        progress: &WordProgress,
        event: &LearningEvent,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.progress.insert(
            (progress.user_id.clone(), progress.word_key.clone()),
            progress.clone(),
        );
        inner.events.push(event.clone());
        Ok(())
    }
}

/// Fixed word list serving as the catalog collaborator in tests and demos.
#[derive(Default)]
pub struct MemoryCatalog {
    words: Vec<CatalogWord>,
}

impl MemoryCatalog {
    pub fn new(words: Vec<CatalogWord>) -> Self {
        Self { words }
    }
}

impl WordCatalog for MemoryCatalog {
    async fn list_words(&self, filter: &WordFilter) -> Result<Vec<CatalogWord>, StoreError> {
        Ok(self
            .words
            .iter()
            .filter(|w| filter.matches(w))
            .cloned()
            .collect())
    }
}
