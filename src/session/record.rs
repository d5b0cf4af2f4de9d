//! Session record

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// One live viewing context, keyed by a client-generated id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    /// Opaque client-supplied identifier
    pub id: String,

    /// When the first heartbeat arrived; never changes afterwards
    pub first_seen: DateTime<Utc>,

    /// When the most recent heartbeat arrived
    pub last_heartbeat: DateTime<Utc>,

    /// Last reported page URL
    pub page_url: Option<String>,

    /// Last reported user agent, already truncated
    pub user_agent: Option<String>,
}

impl SessionRecord {
    /// Create a record for a session seen for the first time at `now`
    pub fn new(
        id: impl Into<String>,
        now: DateTime<Utc>,
        page_url: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            first_seen: now,
            last_heartbeat: now,
            page_url,
            user_agent,
        }
    }

    /// Apply a heartbeat to an existing record
    ///
    /// `last_heartbeat` never drops below `first_seen`, even if the wall
    /// clock stepped backwards between heartbeats.
    pub fn refresh(
        &mut self,
        now: DateTime<Utc>,
        page_url: Option<String>,
        user_agent: Option<String>,
    ) {
        self.last_heartbeat = now.max(self.first_seen);
        self.page_url = page_url;
        self.user_agent = user_agent;
    }

    /// Time elapsed since the last heartbeat
    pub fn idle_for(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.last_heartbeat
    }
}

/// Longest prefix of `s` holding at most `max_chars` characters
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
