use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Canonical text of a word, used as its stable identifier.
///
/// Comparison is exact and case-sensitive: "Apple" and "apple" are two
/// different words, matching how progress rows join against the catalog.
/// The translation travels separately as a denormalized display field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordKey(String);

impl WordKey {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for WordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WordKey {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    A1,
    A2,
    B1,
    B2,
    C1,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A1" => Some(Self::A1),
            "A2" => Some(Self::A2),
            "B1" => Some(Self::B1),
            "B2" => Some(Self::B2),
            "C1" => Some(Self::C1),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningMode {
    NativeToForeignText,
    ForeignToNativeText,
    NativeToForeignQuiz,
    ForeignToNativeQuiz,
}

/// Read model owned by the word-catalog collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogWord {
    pub key: WordKey,
    pub translation: String,
    pub level: Level,
    pub category: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordFilter {
    pub level: Option<Level>,
    pub category: Option<String>,
}

impl WordFilter {
    pub fn matches(&self, word: &CatalogWord) -> bool {
        if let Some(level) = self.level {
            if word.level != level {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &word.category != category {
                return false;
            }
        }
        true
    }
}

/// Per-(user, word) memory state. One row per pair; created on the first
/// answer, updated on every later one, deleted only by bulk reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordProgress {
    pub user_id: String,
    pub word_key: WordKey,
    pub repetitions: i32,
    pub easiness_factor: f64,
    pub interval_days: i32,
    pub next_review_date: Option<DateTime<Utc>>,
    pub last_reviewed: Option<DateTime<Utc>>,
}

impl WordProgress {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_date.map(|d| d <= now).unwrap_or(false)
    }
}

/// Append-only answer record. Never mutated; removed only by bulk wipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningEvent {
    pub id: String,
    pub user_id: String,
    pub word_key: WordKey,
    pub translation: String,
    pub correct: bool,
    pub mode: LearningMode,
    pub level: Level,
    pub category: String,
    pub response_latency_ms: i64,
    pub timestamp: DateTime<Utc>,
}

/// Per-word accuracy aggregate derived from the event log.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptStats {
    pub total: i64,
    pub correct: i64,
    pub incorrect: i64,
}

impl AttemptStats {
    pub fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
    }

    pub fn error_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.incorrect as f64 / self.total as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionItemKind {
    Review,
    New,
}

/// One entry of an assembled practice session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionItem {
    pub word_key: WordKey,
    pub translation: String,
    pub level: Level,
    pub category: String,
    pub kind: SessionItemKind,
    /// 1-5 label, present on review items only.
    pub difficulty: Option<i32>,
}

/// Logical study session reconstructed from the event log. Derived on read,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGroup {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub event_count: i64,
    pub correct_count: i64,
    pub incorrect_count: i64,
    pub total_duration_ms: i64,
    pub distinct_levels: BTreeSet<Level>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryBreakdown {
    pub new_words: i64,
    pub learning: i64,
    pub mastered: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub count: i64,
}
