//! Periodic sweep of stale sessions, independent of request traffic

use crate::session::registry::SessionRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Background task that expires sessions on a fixed interval
pub struct Janitor {
    registry: Arc<SessionRegistry>,
    interval: Duration,
}

impl Janitor {
    pub fn new(registry: Arc<SessionRegistry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Start the sweep loop
    ///
    /// Runs until the returned handle is aborted or the runtime shuts down.
    /// The first sweep happens one full interval after start.
    pub fn start(self) -> JoinHandle<()> {
        info!("Janitor started, sweeping every {:?}", self.interval);

        tokio::spawn(async move {
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let removed = self.registry.sweep_expired(self.registry.now());
                debug!(removed, remaining = self.registry.len(), "Janitor sweep finished");
            }
        })
    }
}
