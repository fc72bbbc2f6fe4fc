//! SuperMemo-2 scheduling. Pure: previous state + recall quality in, new
//! state out; the caller attaches the wall-clock due date.

use serde::{Deserialize, Serialize};

use crate::services::quality::Quality;

const MIN_EASINESS: f64 = 1.3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sm2State {
    pub repetitions: i32,
    pub easiness: f64,
    pub interval_days: i32,
}

impl Default for Sm2State {
    fn default() -> Self {
        Self {
            repetitions: 0,
            easiness: 2.5,
            interval_days: 0,
        }
    }
}

/// Applies one review to the memory state.
///
/// EF' = EF + (0.1 - (5 - q)(0.08 + (5 - q) * 0.02)), floored at 1.3 with no
/// ceiling. The delta is non-positive for every failing grade, so easiness
/// never rises from a failure. A failing grade resets repetitions and
/// schedules the first retry for the next day; a passing grade advances the
/// interval through the 1 / 6 / round(I * EF') ladder.
pub fn sm2_review(prev: &Sm2State, quality: Quality) -> Sm2State {
    let q = quality.value();
    let delta = 0.1 - (5 - q) as f64 * (0.08 + (5 - q) as f64 * 0.02);
    let easiness = round2((prev.easiness + delta).max(MIN_EASINESS));

    if !quality.is_passing() {
        return Sm2State {
            repetitions: 0,
            easiness,
            interval_days: 1,
        };
    }

    let repetitions = prev.repetitions + 1;
    let interval_days = match repetitions {
        1 => 1,
        2 => 6,
        _ => (prev.interval_days as f64 * easiness).round() as i32,
    };

    Sm2State {
        repetitions,
        easiness,
        interval_days,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
