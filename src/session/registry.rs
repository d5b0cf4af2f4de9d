//! Shared registry of live viewer sessions
//!
//! A single `parking_lot::Mutex` guards the map. Every mutation, including
//! the opportunistic sweep and capacity eviction that ride along with a
//! touch, happens inside one critical section, so readers never see a
//! half-applied change. Logging happens after the lock is released.

use crate::clock::{Clock, SystemClock};
use crate::config::schema::SessionsConfig;
use crate::error::{ViewerError, ViewerResult};
use crate::session::expiry;
use crate::session::record::{truncate_chars, SessionRecord};
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Bounds applied by the registry
#[derive(Debug, Clone)]
pub struct RegistryLimits {
    /// Idle time after which a session is stale
    pub session_timeout: TimeDelta,

    /// Hard cap on tracked sessions
    pub max_sessions: usize,

    /// Extra sessions evicted past the cap so eviction doesn't run on every insert
    pub eviction_buffer: usize,

    /// Probability that a touch also sweeps stale sessions (0 disables)
    pub sweep_sample_rate: f64,

    /// Maximum stored user agent length, in characters
    pub user_agent_max_len: usize,
}

impl Default for RegistryLimits {
    fn default() -> Self {
        Self::from(&SessionsConfig::default())
    }
}

impl From<&SessionsConfig> for RegistryLimits {
    fn from(config: &SessionsConfig) -> Self {
        Self {
            session_timeout: TimeDelta::milliseconds(
                i64::try_from(config.timeout_ms).unwrap_or(i64::MAX),
            ),
            max_sessions: config.max_sessions,
            eviction_buffer: config.eviction_buffer,
            sweep_sample_rate: config.sweep_sample_rate,
            user_agent_max_len: config.user_agent_max_len,
        }
    }
}

/// Result of a heartbeat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchOutcome {
    /// The id was absent before this touch
    pub is_new: bool,

    /// Registry size right after the touch
    pub live_viewers: usize,

    /// Sessions dropped by capacity eviction during this touch
    pub evicted: usize,

    /// Stale sessions dropped by the write-path sweep during this touch
    pub swept: usize,
}

/// Result of an explicit leave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveOutcome {
    /// A record existed and was removed
    pub removed: bool,

    /// Registry size right after the removal
    pub live_viewers: usize,
}

/// Concurrent-safe map from session id to [`SessionRecord`]
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionRecord>>,
    clock: Arc<dyn Clock>,
    limits: RegistryLimits,
}

impl SessionRegistry {
    /// Create a registry reading the wall clock
    pub fn new(limits: RegistryLimits) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    /// Create a registry with a custom time source
    pub fn with_clock(limits: RegistryLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            clock,
            limits,
        }
    }

    /// Current time according to the registry's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Create or refresh a session
    pub fn touch(
        &self,
        id: &str,
        page_url: Option<String>,
        user_agent: Option<&str>,
    ) -> ViewerResult<TouchOutcome> {
        if id.is_empty() {
            return Err(ViewerError::invalid_input("session_id"));
        }

        let user_agent =
            user_agent.map(|ua| truncate_chars(ua, self.limits.user_agent_max_len).to_string());
        let sample_sweep = self.sample_sweep();
        let now = self.clock.now();

        let outcome = {
            let mut sessions = self.sessions.lock();

            let is_new = match sessions.get_mut(id) {
                Some(record) => {
                    record.refresh(now, page_url, user_agent);
                    false
                }
                None => {
                    sessions.insert(
                        id.to_string(),
                        SessionRecord::new(id, now, page_url, user_agent),
                    );
                    true
                }
            };

            let swept = if sample_sweep {
                Self::sweep_locked(&mut sessions, now, self.limits.session_timeout)
            } else {
                0
            };

            let evicted = if is_new {
                Self::evict_locked(
                    &mut sessions,
                    self.limits.max_sessions,
                    self.limits.eviction_buffer,
                )
            } else {
                0
            };

            TouchOutcome {
                is_new,
                live_viewers: sessions.len(),
                evicted,
                swept,
            }
        };

        if outcome.swept > 0 {
            debug!(
                "Write-path sweep removed {} expired sessions. Active: {}",
                outcome.swept, outcome.live_viewers
            );
        }
        if outcome.evicted > 0 {
            warn!(
                evicted = outcome.evicted,
                live_viewers = outcome.live_viewers,
                max_sessions = self.limits.max_sessions,
                "Session capacity exceeded, evicted oldest sessions"
            );
        }

        Ok(outcome)
    }

    /// Remove a session; absence is reported, not an error
    pub fn remove(&self, id: &str) -> ViewerResult<RemoveOutcome> {
        if id.is_empty() {
            return Err(ViewerError::invalid_input("session_id"));
        }

        let mut sessions = self.sessions.lock();
        let removed = sessions.remove(id).is_some();
        Ok(RemoveOutcome {
            removed,
            live_viewers: sessions.len(),
        })
    }

    /// Number of live sessions, after dropping stale ones
    pub fn count(&self) -> usize {
        let now = self.clock.now();
        let (swept, live) = {
            let mut sessions = self.sessions.lock();
            let swept = Self::sweep_locked(&mut sessions, now, self.limits.session_timeout);
            (swept, sessions.len())
        };

        if swept > 0 {
            debug!("Cleaned up {} expired sessions. Active: {}", swept, live);
        }
        live
    }

    /// Number of tracked sessions, stale ones included
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether no sessions are tracked
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Whether `id` is currently tracked
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.lock().contains_key(id)
    }

    /// Drop every session idle for longer than the timeout as of `now`
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let (swept, live) = {
            let mut sessions = self.sessions.lock();
            let swept = Self::sweep_locked(&mut sessions, now, self.limits.session_timeout);
            (swept, sessions.len())
        };

        if swept > 0 {
            debug!("Cleaned up {} expired sessions. Active: {}", swept, live);
        }
        swept
    }

    /// Copy of every record, oldest `first_seen` first
    pub fn snapshot(&self) -> Vec<SessionRecord> {
        let mut records: Vec<SessionRecord> = self.sessions.lock().values().cloned().collect();
        records.sort_by(|a, b| a.first_seen.cmp(&b.first_seen).then_with(|| a.id.cmp(&b.id)));
        records
    }

    /// Whether `record` is stale right now
    pub fn is_stale(&self, record: &SessionRecord) -> bool {
        expiry::is_stale(record, self.clock.now(), self.limits.session_timeout)
    }

    fn sample_sweep(&self) -> bool {
        let rate = self.limits.sweep_sample_rate;
        if rate.is_nan() || rate <= 0.0 {
            return false;
        }
        if rate >= 1.0 {
            return true;
        }
        rand::rng().random_bool(rate)
    }

    fn sweep_locked(
        sessions: &mut HashMap<String, SessionRecord>,
        now: DateTime<Utc>,
        timeout: TimeDelta,
    ) -> usize {
        let before = sessions.len();
        sessions.retain(|_, record| !expiry::is_stale(record, now, timeout));
        before - sessions.len()
    }

    fn evict_locked(
        sessions: &mut HashMap<String, SessionRecord>,
        max_sessions: usize,
        eviction_buffer: usize,
    ) -> usize {
        let count = expiry::eviction_count(sessions.len(), max_sessions, eviction_buffer);
        if count == 0 {
            return 0;
        }

        let victims = expiry::eviction_victims(sessions.values(), count);
        for id in &victims {
            sessions.remove(id);
        }
        victims.len()
    }
}
