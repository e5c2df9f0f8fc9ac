//! Remote-sync scheduler
//!
//! Runs `Registry::sync` on a fixed interval and accepts API triggers in
//! between. Scheduled and triggered runs serialize on the registry's sync
//! mutex; a separate cooldown gate spaces out API triggers so callers
//! cannot hammer the remote listing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use locus_core::config::SyncConfig;
use locus_core::{LocusError, Result};

use crate::registry::{Registry, SyncOutcome};

/// Exposed on the health/status surface.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SyncStatus {
    pub last_synced_at: Option<DateTime<Utc>>,
    pub next_scheduled_at: Option<DateTime<Utc>>,
    pub last_result: Option<SyncOutcome>,
}

#[derive(Default)]
struct SchedulerState {
    last_synced_at: Option<DateTime<Utc>>,
    next_scheduled_at: Option<DateTime<Utc>>,
    last_result: Option<SyncOutcome>,
}

pub struct SyncScheduler {
    registry: Arc<Registry>,
    interval: Duration,
    cooldown: Duration,
    enabled: bool,
    state: Mutex<SchedulerState>,
    /// Instant of the last accepted API trigger; `None` until the first
    /// one, so the first trigger always passes.
    api_gate: Mutex<Option<Instant>>,
}

impl SyncScheduler {
    pub fn new(registry: Arc<Registry>, config: &SyncConfig) -> Arc<Self> {
        Arc::new(Self {
            registry,
            interval: Duration::from_secs(config.interval_secs.max(1)),
            cooldown: Duration::from_secs(config.cooldown_secs),
            enabled: config.enabled,
            state: Mutex::new(SchedulerState::default()),
            api_gate: Mutex::new(None),
        })
    }

    pub fn cooldown_secs(&self) -> u64 {
        self.cooldown.as_secs()
    }

    /// Start the interval loop when sync is enabled; returns `None`
    /// otherwise (API triggers still work either way).
    pub fn spawn(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) -> Option<JoinHandle<()>> {
        if !self.enabled {
            return None;
        }

        let scheduler = self.clone();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(scheduler.interval);
            // the immediate first tick; initial loading is load_all's job
            ticker.tick().await;
            scheduler.note_next_run().await;

            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        tracing::debug!("sync scheduler shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = scheduler.run_once().await {
                            tracing::error!(error = %e, "scheduled sync failed");
                        }
                        scheduler.note_next_run().await;
                    }
                }
            }
        }))
    }

    /// API-triggered sync, gated by the cooldown.
    pub async fn trigger(&self) -> Result<SyncOutcome> {
        {
            let mut gate = self.api_gate.lock().await;
            let now = Instant::now();
            if let Some(last) = *gate {
                if now.duration_since(last) < self.cooldown {
                    return Err(LocusError::RateLimited {
                        retry_after_secs: self.cooldown.as_secs(),
                    });
                }
            }
            *gate = Some(now);
        }

        self.run_once().await
    }

    pub async fn status(&self) -> SyncStatus {
        let state = self.state.lock().await;
        SyncStatus {
            last_synced_at: state.last_synced_at,
            next_scheduled_at: state.next_scheduled_at,
            last_result: state.last_result,
        }
    }

    async fn run_once(&self) -> Result<SyncOutcome> {
        let outcome = self.registry.sync().await?;

        let mut state = self.state.lock().await;
        state.last_synced_at = Some(Utc::now());
        state.last_result = Some(outcome);

        Ok(outcome)
    }

    async fn note_next_run(&self) {
        let mut state = self.state.lock().await;
        state.next_scheduled_at = Some(
            Utc::now()
                + chrono::Duration::from_std(self.interval)
                    .unwrap_or_else(|_| chrono::Duration::zero()),
        );
    }
}
