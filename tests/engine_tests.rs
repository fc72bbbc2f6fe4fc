//! End-to-end tests for the learning engine over the in-memory store, with
//! a pinned clock and seeded RNG so every assertion is deterministic.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use slowka_engine::store::{EventLog, MemoryCatalog, MemoryStore, ProgressStore, ReviewSink};
use slowka_engine::{
    AnswerOutcome, CatalogWord, EngineConfig, EngineError, LearningEngine, LearningEvent,
    LearningMode, Level, ManualClock, Quality, SessionItemKind, StoreError, SubmitAnswer,
    WordFilter, WordKey, WordProgress,
};

const FIXED_NOW: (i32, u32, u32, u32, u32, u32) = (2024, 5, 10, 9, 0, 0);

fn fixed_now() -> DateTime<Utc> {
    let (y, mo, d, h, mi, s) = FIXED_NOW;
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

type TestEngine = LearningEngine<Arc<MemoryCatalog>, Arc<MemoryStore>, Arc<ManualClock>>;

struct Fixture {
    engine: TestEngine,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
}

fn catalog_words(level: Level, category: &str, prefix: &str, count: usize) -> Vec<CatalogWord> {
    (0..count)
        .map(|i| CatalogWord {
            key: WordKey::from(format!("{prefix}{i}").as_str()),
            translation: format!("{prefix}{i}-pl"),
            level,
            category: category.to_string(),
        })
        .collect()
}

fn fixture(words: Vec<CatalogWord>) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(fixed_now()));
    let engine = LearningEngine::new(
        Arc::new(MemoryCatalog::new(words)),
        Arc::clone(&store),
        Arc::clone(&clock),
        EngineConfig::default(),
    );
    Fixture {
        engine,
        store,
        clock,
    }
}

fn answer(word: &str, correct: bool, latency_ms: i64) -> SubmitAnswer {
    SubmitAnswer {
        user_id: "u1".to_string(),
        word_key: WordKey::from(word),
        translation: format!("{word}-pl"),
        correct,
        mode: LearningMode::NativeToForeignText,
        level: Level::A1,
        category: "food".to_string(),
        response_latency_ms: latency_ms,
    }
}

#[tokio::test]
async fn first_fast_correct_answer_schedules_tomorrow() {
    let fx = fixture(Vec::new());

    let AnswerOutcome {
        next_review_date,
        quality,
    } = fx.engine.submit_answer(answer("apple", true, 900)).await.unwrap();

    assert_eq!(quality, Quality::Perfect);
    assert_eq!(next_review_date, fixed_now() + Duration::days(1));

    let progress = fx
        .store
        .get_progress("u1", &WordKey::from("apple"))
        .await
        .unwrap()
        .expect("progress row created");
    assert_eq!(progress.repetitions, 1);
    assert_eq!(progress.interval_days, 1);
    assert!((progress.easiness_factor - 2.6).abs() < 1e-9);
    assert_eq!(progress.last_reviewed, Some(fixed_now()));
    assert_eq!(progress.next_review_date, Some(fixed_now() + Duration::days(1)));

    let events = fx.store.query_events("u1", None).await.unwrap();
    assert_eq!(events.len(), 1);
    assert!(events[0].correct);
}

#[tokio::test]
async fn wrong_answer_resets_an_established_word() {
    let fx = fixture(Vec::new());
    fx.store
        .upsert_progress(&WordProgress {
            user_id: "u1".to_string(),
            word_key: WordKey::from("apple"),
            repetitions: 3,
            easiness_factor: 2.0,
            interval_days: 10,
            next_review_date: Some(fixed_now()),
            last_reviewed: Some(fixed_now() - Duration::days(10)),
        })
        .await
        .unwrap();

    let outcome = fx.engine.submit_answer(answer("apple", false, 4000)).await.unwrap();
    assert_eq!(outcome.quality, Quality::Incorrect);
    assert_eq!(outcome.next_review_date, fixed_now() + Duration::days(1));

    let progress = fx
        .store
        .get_progress("u1", &WordKey::from("apple"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(progress.repetitions, 0);
    assert_eq!(progress.interval_days, 1);
    assert!(progress.easiness_factor >= 1.3);
}

#[tokio::test]
async fn progress_rows_stay_unique_per_word() {
    let fx = fixture(Vec::new());
    fx.engine.submit_answer(answer("apple", true, 900)).await.unwrap();
    fx.clock.advance(Duration::days(1));
    fx.engine.submit_answer(answer("apple", true, 2500)).await.unwrap();

    let rows = fx.store.user_progress("u1").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].repetitions, 2);
    assert_eq!(rows[0].interval_days, 6);
    assert_eq!(fx.store.query_events("u1", None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_input_is_rejected_before_any_write() {
    let fx = fixture(Vec::new());

    let cases = vec![
        answer("apple", true, -1),
        answer("apple", true, 600_001),
        answer("", true, 100),
        SubmitAnswer {
            category: String::new(),
            ..answer("apple", true, 100)
        },
        SubmitAnswer {
            user_id: "  ".to_string(),
            ..answer("apple", true, 100)
        },
        SubmitAnswer {
            translation: "x".repeat(201),
            ..answer("apple", true, 100)
        },
    ];

    for case in cases {
        let err = fx.engine.submit_answer(case).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)), "got {err:?}");
    }

    assert!(fx.store.user_progress("u1").await.unwrap().is_empty());
    assert!(fx.store.query_events("u1", None).await.unwrap().is_empty());
}

/// Store whose review sink always fails, for the both-or-neither guarantee.
struct BrokenSink {
    inner: MemoryStore,
}

impl ProgressStore for BrokenSink {
    async fn get_progress(
        &self,
        user_id: &str,
        word_key: &WordKey,
    ) -> Result<Option<WordProgress>, StoreError> {
        self.inner.get_progress(user_id, word_key).await
    }

    async fn upsert_progress(&self, progress: &WordProgress) -> Result<(), StoreError> {
        self.inner.upsert_progress(progress).await
    }

    async fn due_progress(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<WordProgress>, StoreError> {
        self.inner.due_progress(user_id, now).await
    }

    async fn user_progress(&self, user_id: &str) -> Result<Vec<WordProgress>, StoreError> {
        self.inner.user_progress(user_id).await
    }

    async fn reset_user(&self, user_id: &str) -> Result<u64, StoreError> {
        self.inner.reset_user(user_id).await
    }
}

impl EventLog for BrokenSink {
    async fn append(&self, event: &LearningEvent) -> Result<(), StoreError> {
        self.inner.append(event).await
    }

    async fn query_events(
        &self,
        user_id: &str,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<LearningEvent>, StoreError> {
        self.inner.query_events(user_id, range).await
    }

    async fn attempt_stats(
        &self,
        user_id: &str,
    ) -> Result<std::collections::HashMap<WordKey, slowka_engine::AttemptStats>, StoreError> {
        self.inner.attempt_stats(user_id).await
    }

    async fn purge_user(&self, user_id: &str) -> Result<u64, StoreError> {
        self.inner.purge_user(user_id).await
    }
}

impl ReviewSink for BrokenSink {
    async fn persist_review(
        &self,
        _progress: &WordProgress,
        _event: &LearningEvent,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("write rejected".to_string()))
    }
}

#[tokio::test]
async fn failed_persist_leaves_no_partial_state() {
    let store = Arc::new(BrokenSink {
        inner: MemoryStore::new(),
    });
    let engine = LearningEngine::new(
        Arc::new(MemoryCatalog::new(Vec::new())),
        Arc::clone(&store),
        ManualClock::new(fixed_now()),
        EngineConfig::default(),
    );

    let err = engine.submit_answer(answer("apple", true, 900)).await.unwrap_err();
    assert!(matches!(err, EngineError::Persistence(_)));

    assert!(store.get_progress("u1", &WordKey::from("apple")).await.unwrap().is_none());
    assert!(store.query_events("u1", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn session_mixes_due_reviews_with_unseen_words() {
    let fx = fixture(catalog_words(Level::A1, "food", "word", 20));

    // Five words answered (once wrong) yesterday are due now.
    fx.clock.set(fixed_now() - Duration::days(1));
    for i in 0..5 {
        fx.engine
            .submit_answer(answer(&format!("word{i}"), i != 0, 900))
            .await
            .unwrap();
    }
    fx.clock.set(fixed_now());

    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let session = fx
        .engine
        .build_session_with_rng("u1", &WordFilter::default(), 15, &mut rng)
        .await
        .unwrap();

    assert_eq!(session.len(), 15);
    let reviews: Vec<_> = session
        .iter()
        .filter(|i| i.kind == SessionItemKind::Review)
        .collect();
    assert_eq!(reviews.len(), 5);
    for i in 0..5 {
        let key = WordKey::from(format!("word{i}").as_str());
        assert!(session.iter().any(|item| item.word_key == key));
    }
    assert!(reviews.iter().all(|i| i.difficulty.is_some()));
    assert!(session
        .iter()
        .filter(|i| i.kind == SessionItemKind::New)
        .all(|i| i.difficulty.is_none()));

    // The failed word carries a harder label than a clean one.
    let failed = reviews
        .iter()
        .find(|i| i.word_key == WordKey::from("word0"))
        .unwrap();
    assert!(failed.difficulty.unwrap() > 1);
}

#[tokio::test]
async fn full_due_set_leaves_no_room_for_new_words() {
    let fx = fixture(catalog_words(Level::A1, "food", "word", 30));

    fx.clock.set(fixed_now() - Duration::days(1));
    for i in 0..20 {
        fx.engine
            .submit_answer(answer(&format!("word{i}"), true, 900))
            .await
            .unwrap();
    }
    fx.clock.set(fixed_now());

    let session = fx
        .engine
        .build_session("u1", &WordFilter::default(), 15)
        .await
        .unwrap();
    assert_eq!(session.len(), 15);
    assert!(session.iter().all(|i| i.kind == SessionItemKind::Review));
}

#[tokio::test]
async fn session_respects_level_and_category_filters() {
    let mut words = catalog_words(Level::A1, "food", "fa", 5);
    words.extend(catalog_words(Level::B1, "food", "fb", 5));
    words.extend(catalog_words(Level::A1, "travel", "ta", 5));
    let fx = fixture(words);

    let filter = WordFilter {
        level: Some(Level::A1),
        category: Some("food".to_string()),
    };
    let session = fx.engine.build_session("u1", &filter, 15).await.unwrap();

    assert_eq!(session.len(), 5);
    assert!(session
        .iter()
        .all(|i| i.level == Level::A1 && i.category == "food"));
}

#[tokio::test]
async fn empty_catalog_yields_an_empty_session() {
    let fx = fixture(Vec::new());
    let session = fx
        .engine
        .build_session("u1", &WordFilter::default(), 15)
        .await
        .unwrap();
    assert!(session.is_empty());
}

#[tokio::test]
async fn words_in_progress_are_neither_due_nor_new() {
    let fx = fixture(catalog_words(Level::A1, "food", "word", 3));

    // Answered just now: next review is tomorrow, so not due today, and no
    // longer unseen either.
    fx.engine.submit_answer(answer("word0", true, 900)).await.unwrap();

    let session = fx
        .engine
        .build_session("u1", &WordFilter::default(), 15)
        .await
        .unwrap();
    assert_eq!(session.len(), 2);
    assert!(session.iter().all(|i| i.word_key != WordKey::from("word0")));
}

#[tokio::test]
async fn history_splits_sessions_on_long_pauses() {
    let fx = fixture(Vec::new());

    fx.engine.submit_answer(answer("w0", true, 1000)).await.unwrap();
    fx.clock.advance(Duration::minutes(10));
    fx.engine.submit_answer(answer("w1", false, 2000)).await.unwrap();
    fx.clock.advance(Duration::minutes(5));
    fx.engine.submit_answer(answer("w2", true, 1500)).await.unwrap();
    fx.clock.advance(Duration::minutes(35));
    fx.engine.submit_answer(answer("w3", true, 800)).await.unwrap();

    let history = fx.engine.session_history("u1").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].event_count, 1);
    assert_eq!(history[1].event_count, 3);
    assert_eq!(history[1].correct_count, 2);
    assert_eq!(history[1].incorrect_count, 1);
    assert_eq!(history[1].total_duration_ms, 4500);
}

#[tokio::test]
async fn mastery_and_activity_reports() {
    let fx = fixture(Vec::new());

    fx.engine.submit_answer(answer("w0", true, 900)).await.unwrap();
    fx.clock.advance(Duration::minutes(1));
    fx.engine.submit_answer(answer("w1", true, 900)).await.unwrap();

    let breakdown = fx.engine.mastery_breakdown("u1").await.unwrap();
    assert_eq!(breakdown.new_words, 2);
    assert_eq!(breakdown.learning, 0);
    assert_eq!(breakdown.mastered, 0);

    let activity = fx.engine.daily_activity("u1", 7).await.unwrap();
    assert_eq!(activity.len(), 7);
    assert_eq!(activity.last().unwrap().count, 2);
    let total: i64 = activity.iter().map(|a| a.count).sum();
    assert_eq!(total, 2);
}

#[tokio::test]
async fn bulk_reset_and_purge_are_the_only_deletion_paths() {
    let fx = fixture(Vec::new());
    fx.engine.submit_answer(answer("w0", true, 900)).await.unwrap();
    fx.engine.submit_answer(answer("w1", false, 900)).await.unwrap();

    assert_eq!(fx.engine.reset_progress("u1").await.unwrap(), 2);
    assert_eq!(fx.engine.purge_history("u1").await.unwrap(), 2);
    assert!(fx.store.user_progress("u1").await.unwrap().is_empty());
    assert!(fx.store.query_events("u1", None).await.unwrap().is_empty());
}
