use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::services::analytics::{self, group_sessions};
use crate::services::difficulty::difficulty_label;
use crate::services::quality::Quality;
use crate::services::session_builder::assemble_session;
use crate::services::sm2::{sm2_review, Sm2State};
use crate::store::{EventLog, ProgressStore, ReviewSink, WordCatalog};
use crate::types::{
    DailyActivity, LearningEvent, LearningMode, Level, MasteryBreakdown, SessionGroup,
    SessionItem, SessionItemKind, WordFilter, WordKey, WordProgress,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswer {
    pub user_id: String,
    pub word_key: WordKey,
    pub translation: String,
    pub correct: bool,
    pub mode: LearningMode,
    pub level: Level,
    pub category: String,
    pub response_latency_ms: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub next_review_date: DateTime<Utc>,
    pub quality: Quality,
}

/// Orchestration facade over the scheduling services and the collaborator
/// ports. Holds no background tasks and owns no retry policy; every method
/// is a single reactive call.
///
/// The progress store, event log and review sink are one generic parameter
/// because the per-answer unit must be able to persist state and event
/// together (both or neither).
pub struct LearningEngine<Cat, Store, Clk = SystemClock> {
    catalog: Cat,
    store: Store,
    clock: Clk,
    config: EngineConfig,
}

impl<Cat, Store, Clk> LearningEngine<Cat, Store, Clk>
where
    Cat: WordCatalog,
    Store: ProgressStore + EventLog + ReviewSink,
    Clk: Clock,
{
    pub fn new(catalog: Cat, store: Store, clock: Clk, config: EngineConfig) -> Self {
        Self {
            catalog,
            store,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Grades the answer, advances the SM-2 state and persists the new
    /// progress row together with the append-only event.
    pub async fn submit_answer(&self, input: SubmitAnswer) -> Result<AnswerOutcome, EngineError> {
        self.validate(&input)?;

        let now = self.clock.now();
        let prior = self
            .store
            .get_progress(&input.user_id, &input.word_key)
            .await?;
        let prev = prior
            .as_ref()
            .map(|p| Sm2State {
                repetitions: p.repetitions,
                easiness: p.easiness_factor,
                interval_days: p.interval_days,
            })
            .unwrap_or_default();

        let quality = Quality::from_answer(
            input.correct,
            input.response_latency_ms,
            &self.config.quality,
        );
        let next = sm2_review(&prev, quality);
        let next_review_date = now + Duration::days(next.interval_days as i64);

        let progress = WordProgress {
            user_id: input.user_id.clone(),
            word_key: input.word_key.clone(),
            repetitions: next.repetitions,
            easiness_factor: next.easiness,
            interval_days: next.interval_days,
            next_review_date: Some(next_review_date),
            last_reviewed: Some(now),
        };
        let event = LearningEvent {
            id: Uuid::new_v4().to_string(),
            user_id: input.user_id,
            word_key: input.word_key,
            translation: input.translation,
            correct: input.correct,
            mode: input.mode,
            level: input.level,
            category: input.category,
            response_latency_ms: input.response_latency_ms,
            timestamp: now,
        };

        self.store.persist_review(&progress, &event).await?;

        tracing::debug!(
            user_id = %event.user_id,
            word = %event.word_key,
            quality = quality.value(),
            interval_days = next.interval_days,
            "review recorded"
        );

        Ok(AnswerOutcome {
            next_review_date,
            quality,
        })
    }

    /// Assembles a practice session: due reviews first, unseen catalog words
    /// fill the remainder, uniformly shuffled.
    pub async fn build_session(
        &self,
        user_id: &str,
        filter: &WordFilter,
        size: usize,
    ) -> Result<Vec<SessionItem>, EngineError> {
        self.build_session_with_rng(user_id, filter, size, &mut rand::rng())
            .await
    }

    /// `build_session` with a caller-supplied random source, so session
    /// composition can be asserted deterministically.
    pub async fn build_session_with_rng<R: Rng + ?Sized>(
        &self,
        user_id: &str,
        filter: &WordFilter,
        size: usize,
        rng: &mut R,
    ) -> Result<Vec<SessionItem>, EngineError> {
        if size == 0 {
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        // Independent queries, issued concurrently.
        let (catalog, due_rows) = tokio::join!(
            self.catalog.list_words(filter),
            self.store.due_progress(user_id, now)
        );
        let catalog = catalog?;
        let due_rows = due_rows?;

        let by_key: HashMap<&WordKey, &crate::types::CatalogWord> =
            catalog.iter().map(|w| (&w.key, w)).collect();

        // Due rows join the filtered catalog by exact key; rows whose word
        // fell out of the catalog (or out of the filter) drop silently.
        let mut due_items = Vec::new();
        let stats = if due_rows.is_empty() {
            HashMap::new()
        } else {
            self.store.attempt_stats(user_id).await?
        };
        for row in &due_rows {
            if due_items.len() == size {
                break;
            }
            let Some(word) = by_key.get(&row.word_key) else {
                continue;
            };
            let label = stats
                .get(&row.word_key)
                .filter(|s| s.total > 0)
                .map(|s| difficulty_label(s.error_rate(), row.easiness_factor))
                .unwrap_or(1);
            due_items.push(SessionItem {
                word_key: word.key.clone(),
                translation: word.translation.clone(),
                level: word.level,
                category: word.category.clone(),
                kind: SessionItemKind::Review,
                difficulty: Some(label),
            });
        }

        let mut fresh_items = Vec::new();
        if due_items.len() < size {
            let tracked: HashSet<WordKey> = self
                .store
                .user_progress(user_id)
                .await?
                .into_iter()
                .map(|p| p.word_key)
                .collect();
            fresh_items = catalog
                .iter()
                .filter(|w| !tracked.contains(&w.key))
                .take(size - due_items.len())
                .map(|w| SessionItem {
                    word_key: w.key.clone(),
                    translation: w.translation.clone(),
                    level: w.level,
                    category: w.category.clone(),
                    kind: SessionItemKind::New,
                    difficulty: None,
                })
                .collect();
        }

        let session = assemble_session(due_items, fresh_items, size, rng);
        tracing::debug!(
            user_id,
            session_len = session.len(),
            due = due_rows.len(),
            "session assembled"
        );
        Ok(session)
    }

    /// Logical study sessions reconstructed from the event log, newest
    /// first, using the configured gap threshold.
    pub async fn session_history(&self, user_id: &str) -> Result<Vec<SessionGroup>, EngineError> {
        let events = self.store.query_events(user_id, None).await?;
        Ok(group_sessions(events, self.config.gap_threshold()))
    }

    /// New / learning / mastered counts bucketed by interval length.
    pub async fn mastery_breakdown(&self, user_id: &str) -> Result<MasteryBreakdown, EngineError> {
        let progress = self.store.user_progress(user_id).await?;
        Ok(analytics::mastery_breakdown(&progress))
    }

    /// Per-day answer counts for the trailing `days` days, zero-filled.
    pub async fn daily_activity(
        &self,
        user_id: &str,
        days: u32,
    ) -> Result<Vec<DailyActivity>, EngineError> {
        let now = self.clock.now();
        let range = analytics::activity_window(now, days);
        let events = self.store.query_events(user_id, Some(range)).await?;
        Ok(analytics::daily_activity(&events, now.date_naive(), days))
    }

    /// Bulk reset of a user's memory state. Progress rows are never deleted
    /// individually; this and `purge_history` are the only deletion paths.
    pub async fn reset_progress(&self, user_id: &str) -> Result<u64, EngineError> {
        let dropped = self.store.reset_user(user_id).await?;
        tracing::info!(user_id, dropped, "progress reset");
        Ok(dropped)
    }

    /// Bulk wipe of a user's answer events.
    pub async fn purge_history(&self, user_id: &str) -> Result<u64, EngineError> {
        let dropped = self.store.purge_user(user_id).await?;
        tracing::info!(user_id, dropped, "history purged");
        Ok(dropped)
    }

    fn validate(&self, input: &SubmitAnswer) -> Result<(), EngineError> {
        if input.user_id.trim().is_empty() {
            return Err(EngineError::Validation("user id must not be empty".into()));
        }
        if input.word_key.is_empty() || input.word_key.len() > self.config.max_word_len {
            return Err(EngineError::Validation(format!(
                "word key must be 1-{} characters",
                self.config.max_word_len
            )));
        }
        if input.translation.is_empty() || input.translation.len() > self.config.max_word_len {
            return Err(EngineError::Validation(format!(
                "translation must be 1-{} characters",
                self.config.max_word_len
            )));
        }
        if input.category.is_empty() || input.category.len() > self.config.max_category_len {
            return Err(EngineError::Validation(format!(
                "category must be 1-{} characters",
                self.config.max_category_len
            )));
        }
        if input.response_latency_ms < 0 {
            return Err(EngineError::Validation(
                "response latency must not be negative".into(),
            ));
        }
        if input.response_latency_ms > self.config.max_latency_ms {
            return Err(EngineError::Validation(format!(
                "response latency must not exceed {} ms",
                self.config.max_latency_ms
            )));
        }
        Ok(())
    }
}
