//! Ports to the persistence collaborators. The engine is generic over these
//! traits; the in-memory implementation backs tests and embedded use.

pub mod memory;

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::types::{AttemptStats, CatalogWord, LearningEvent, WordFilter, WordKey, WordProgress};

pub use memory::{MemoryCatalog, MemoryStore};

/// Read access to the word catalog (owned by an external collaborator).
#[allow(async_fn_in_trait)]
pub trait WordCatalog {
    async fn list_words(&self, filter: &WordFilter) -> Result<Vec<CatalogWord>, StoreError>;
}

/// Persistence boundary for per-(user, word) memory state.
///
/// `upsert_progress` must be idempotent on (user_id, word_key); concurrent
/// submissions for the same pair resolve last-write-wins.
#[allow(async_fn_in_trait)]
pub trait ProgressStore {
    async fn get_progress(
        &self,
        user_id: &str,
        word_key: &WordKey,
    ) -> Result<Option<WordProgress>, StoreError>;

    async fn upsert_progress(&self, progress: &WordProgress) -> Result<(), StoreError>;

    /// Progress rows with `next_review_date <= now`, oldest due first.
    async fn due_progress(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<WordProgress>, StoreError>;

    /// Every progress row of one user.
    async fn user_progress(&self, user_id: &str) -> Result<Vec<WordProgress>, StoreError>;

    /// Bulk reset: drops all progress rows of one user. The only deletion
    /// path for progress state.
    async fn reset_user(&self, user_id: &str) -> Result<u64, StoreError>;
}

/// Append-only answer-event log.
#[allow(async_fn_in_trait)]
pub trait EventLog {
    async fn append(&self, event: &LearningEvent) -> Result<(), StoreError>;

    async fn query_events(
        &self,
        user_id: &str,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<LearningEvent>, StoreError>;

    /// Per-word accuracy aggregate over the whole log of one user.
    async fn attempt_stats(
        &self,
        user_id: &str,
    ) -> Result<HashMap<WordKey, AttemptStats>, StoreError>;

    /// Bulk wipe of one user's events.
    async fn purge_user(&self, user_id: &str) -> Result<u64, StoreError>;
}

/// The per-answer persistence unit: the new progress state and the event
/// must both land or neither may. Implementations back this with whatever
/// transactional primitive they have; the in-memory store uses one write
/// lock.
#[allow(async_fn_in_trait)]
pub trait ReviewSink {
    async fn persist_review(
        &self,
        progress: &WordProgress,
        event: &LearningEvent,
    ) -> Result<(), StoreError>;
}

// Shared handles work as ports, so an engine and its embedding application
// can hold the same store.

impl<T: WordCatalog> WordCatalog for std::sync::Arc<T> {
    async fn list_words(&self, filter: &WordFilter) -> Result<Vec<CatalogWord>, StoreError> {
        (**self).list_words(filter).await
    }
}

impl<T: ProgressStore> ProgressStore for std::sync::Arc<T> {
    async fn get_progress(
        &self,
        user_id: &str,
        word_key: &WordKey,
    ) -> Result<Option<WordProgress>, StoreError> {
        (**self).get_progress(user_id, word_key).await
    }

    async fn upsert_progress(&self, progress: &WordProgress) -> Result<(), StoreError> {
        (**self).upsert_progress(progress).await
    }

    async fn due_progress(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<WordProgress>, StoreError> {
        (**self).due_progress(user_id, now).await
    }

    async fn user_progress(&self, user_id: &str) -> Result<Vec<WordProgress>, StoreError> {
        (**self).user_progress(user_id).await
    }

    async fn reset_user(&self, user_id: &str) -> Result<u64, StoreError> {
        (**self).reset_user(user_id).await
    }
}

impl<T: EventLog> EventLog for std::sync::Arc<T> {
    async fn append(&self, event: &LearningEvent) -> Result<(), StoreError> {
        (**self).append(event).await
    }

    async fn query_events(
        &self,
        user_id: &str,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<LearningEvent>, StoreError> {
        (**self).query_events(user_id, range).await
    }

    async fn attempt_stats(
        &self,
        user_id: &str,
    ) -> Result<HashMap<WordKey, AttemptStats>, StoreError> {
        (**self).attempt_stats(user_id).await
    }

    async fn purge_user(&self, user_id: &str) -> Result<u64, StoreError> {
        (**self).purge_user(user_id).await
    }
}

impl<T: ReviewSink> ReviewSink for std::sync::Arc<T> {
    async fn persist_review(
        &self,
        progress: &WordProgress,
        event: &LearningEvent,
    ) -> Result<(), StoreError> {
        (**self).persist_review(progress, event).await
    }
}
