//! Read-side analytics over the append-only event log. Sessions are
//! reconstructed on demand with a time-gap heuristic instead of being
//! written at interaction time, so they stay re-derivable from raw events.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::types::{DailyActivity, LearningEvent, MasteryBreakdown, SessionGroup, WordProgress};

/// Clusters one user's events into logical sessions, newest first.
///
/// Events are sorted by timestamp, then folded: a gap strictly greater than
/// `gap_threshold` opens a new group, a gap exactly equal to it does not.
/// The output is therefore invariant to the input ordering.
pub fn group_sessions(
    mut events: Vec<LearningEvent>,
    gap_threshold: Duration,
) -> Vec<SessionGroup> {
    events.sort_by_key(|e| e.timestamp);

    let mut groups: Vec<SessionGroup> = Vec::new();
    for event in events {
        let start_new = match groups.last() {
            Some(group) => event.timestamp - group.end_time > gap_threshold,
            None => true,
        };
        if start_new {
            groups.push(new_group(&event));
        }
        fold_event(groups.last_mut().expect("group exists"), &event);
    }

    groups.reverse();
    groups
}

fn new_group(event: &LearningEvent) -> SessionGroup {
    SessionGroup {
        start_time: event.timestamp,
        end_time: event.timestamp,
        event_count: 0,
        correct_count: 0,
        incorrect_count: 0,
        total_duration_ms: 0,
        distinct_levels: Default::default(),
    }
}

fn fold_event(group: &mut SessionGroup, event: &LearningEvent) {
    group.end_time = event.timestamp;
    group.event_count += 1;
    if event.correct {
        group.correct_count += 1;
    } else {
        group.incorrect_count += 1;
    }
    group.total_duration_ms += event.response_latency_ms;
    group.distinct_levels.insert(event.level);
}

/// Buckets progress rows by how far their interval has grown: an interval of
/// a day or less is still new, up to three weeks is in active learning,
/// beyond that counts as mastered.
pub fn mastery_breakdown(progress: &[WordProgress]) -> MasteryBreakdown {
    let mut breakdown = MasteryBreakdown::default();
    for row in progress {
        if row.interval_days <= 1 {
            breakdown.new_words += 1;
        } else if row.interval_days <= 21 {
            breakdown.learning += 1;
        } else {
            breakdown.mastered += 1;
        }
    }
    breakdown
}

/// Per-day answer counts for the trailing `days` days ending at `today`,
/// zero-filled so charts get a continuous series.
pub fn daily_activity(
    events: &[LearningEvent],
    today: NaiveDate,
    days: u32,
) -> Vec<DailyActivity> {
    let start = today - Duration::days(days as i64 - 1);

    let mut counts: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for offset in 0..days {
        counts.insert(start + Duration::days(offset as i64), 0);
    }
    for event in events {
        let date = event.timestamp.date_naive();
        if let Some(count) = counts.get_mut(&date) {
            *count += 1;
        }
    }

    counts
        .into_iter()
        .map(|(date, count)| DailyActivity { date, count })
        .collect()
}

/// Convenience window for `daily_activity` callers that query the log first.
pub fn activity_window(now: DateTime<Utc>, days: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_date = now.date_naive() - Duration::days(days as i64 - 1);
    let start = start_date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is valid")
        .and_utc();
    (start, now)
}
