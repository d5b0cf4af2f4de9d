//! Staleness and capacity rules
//!
//! Pure functions over records and limits. The registry calls these while
//! holding its lock; nothing here touches shared state.

use crate::session::record::SessionRecord;
use chrono::{DateTime, TimeDelta, Utc};

/// A record is stale once strictly more than `timeout` has passed since its
/// last heartbeat
pub fn is_stale(record: &SessionRecord, now: DateTime<Utc>, timeout: TimeDelta) -> bool {
    record.idle_for(now) > timeout
}

/// How many records to evict when the registry holds `len` entries
///
/// Zero until `len` exceeds `max_sessions`; from then on enough to bring the
/// registry down to `max_sessions - eviction_buffer`.
pub fn eviction_count(len: usize, max_sessions: usize, eviction_buffer: usize) -> usize {
    if len <= max_sessions {
        return 0;
    }
    (len - max_sessions + eviction_buffer).min(len)
}

/// Ids of the `count` records with the oldest heartbeats
///
/// Ties on `last_heartbeat` break on the id's lexical order, so the result is
/// independent of map iteration order.
pub fn eviction_victims<'a, I>(records: I, count: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a SessionRecord>,
{
    if count == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<(DateTime<Utc>, &str)> = records
        .into_iter()
        .map(|r| (r.last_heartbeat, r.id.as_str()))
        .collect();
    candidates.sort_unstable();

    candidates
        .into_iter()
        .take(count)
        .map(|(_, id)| id.to_string())
        .collect()
}
