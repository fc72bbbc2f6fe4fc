pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod services;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, QualityThresholds};
pub use engine::{AnswerOutcome, LearningEngine, SubmitAnswer};
pub use error::{EngineError, StoreError};
pub use services::analytics::group_sessions;
pub use services::difficulty::difficulty_label;
pub use services::quality::Quality;
pub use services::sm2::{sm2_review, Sm2State};
pub use types::{
    AttemptStats, CatalogWord, DailyActivity, LearningEvent, LearningMode, Level,
    MasteryBreakdown, SessionGroup, SessionItem, SessionItemKind, WordFilter, WordKey,
    WordProgress,
};
