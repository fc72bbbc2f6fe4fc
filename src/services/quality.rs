use serde::{Deserialize, Serialize};

use crate::config::QualityThresholds;

/// SM-2 recall grade. Incorrect answers land in the low band (0-2), correct
/// ones in the high band (3-5) graded by response speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quality {
    Blackout = 0,
    Incorrect = 1,
    IncorrectRecognized = 2,
    Hard = 3,
    Good = 4,
    Perfect = 5,
}

impl Quality {
    /// Grades a raw answer. A wrong answer is assumed familiar rather than a
    /// total blackout (the learner is actively studying the word), matching
    /// the original platform.
    pub fn from_answer(correct: bool, latency_ms: i64, thresholds: &QualityThresholds) -> Self {
        if !correct {
            return Self::Incorrect;
        }
        if latency_ms < thresholds.fast_ms {
            Self::Perfect
        } else if latency_ms < thresholds.good_ms {
            Self::Good
        } else {
            Self::Hard
        }
    }

    pub fn value(self) -> i32 {
        self as i32
    }

    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Blackout),
            1 => Some(Self::Incorrect),
            2 => Some(Self::IncorrectRecognized),
            3 => Some(Self::Hard),
            4 => Some(Self::Good),
            5 => Some(Self::Perfect),
            _ => None,
        }
    }

    pub fn is_passing(self) -> bool {
        self.value() >= 3
    }
}
