//! Presentational 1-5 difficulty label for review items. Derived on demand
//! from historical accuracy plus the current easiness factor; never stored.

/// `clamp(round(error_rate * 3 + (2.5 - easiness) * 2 + 1), 1, 5)`.
///
/// An easiness of 2.5 is the SM-2 starting point, so a fresh word with no
/// errors labels 1; a word at the 1.3 easiness floor with a high error rate
/// saturates at 5.
pub fn difficulty_label(error_rate: f64, easiness: f64) -> i32 {
    let raw = error_rate * 3.0 + (2.5 - easiness) * 2.0 + 1.0;
    (raw.round() as i32).clamp(1, 5)
}
