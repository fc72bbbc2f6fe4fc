use serde::{Deserialize, Serialize};

/// Latency cutoffs used to grade a correct answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityThresholds {
    /// Below this the recall counts as instant (quality 5).
    pub fast_ms: i64,
    /// Below this the recall counts as solid (quality 4); slower correct
    /// answers grade 3.
    pub good_ms: i64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            fast_ms: 2000,
            good_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Capacity of an assembled practice session.
    pub session_size: usize,
    /// Pause longer than this splits the event stream into separate
    /// logical sessions.
    pub session_gap_ms: i64,
    pub quality: QualityThresholds,
    /// Upper bound accepted for a single answer latency.
    pub max_latency_ms: i64,
    pub max_word_len: usize,
    pub max_category_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            session_size: 15,
            session_gap_ms: 30 * 60 * 1000,
            quality: QualityThresholds::default(),
            max_latency_ms: 600_000,
            max_word_len: 200,
            max_category_len: 50,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SESSION_SIZE") {
            if let Ok(size) = val.parse::<usize>() {
                config.session_size = size;
            }
        }
        if let Ok(val) = std::env::var("SESSION_GAP_MS") {
            if let Ok(gap) = val.parse::<i64>() {
                config.session_gap_ms = gap;
            }
        }

        config
    }

    pub fn gap_threshold(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.session_gap_ms)
    }
}
