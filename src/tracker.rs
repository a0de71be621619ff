use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::clock::Clock;
use crate::local_store::{timer_start_key, LocalStore};

/// Finalized timer result sent to the backend's add-seconds endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerRequest {
    #[serde(rename = "modulId")]
    pub module_id: String,
    #[serde(rename = "secondsToAdd")]
    pub elapsed_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Running {
        module_id: String,
        started_at: DateTime<Utc>,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("a timer is already running for module {0}")]
    AlreadyRunning(String),
}

/// Stopwatch for one study session at a time.
///
/// The start instant is persisted under [`timer_start_key`] so a restarted client
/// can pick the session up again. Elapsed time is always recomputed from that
/// single timestamp. When the store cannot be written the instant lives in memory
/// only and the session no longer survives a restart.
pub struct SessionTracker {
    store: Arc<dyn LocalStore>,
    clock: Arc<dyn Clock>,
    state: TrackerState,
}

impl SessionTracker {
    pub fn new(store: Arc<dyn LocalStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            state: TrackerState::Idle,
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TrackerState::Running { .. })
    }

    pub fn active_module(&self) -> Option<&str> {
        match &self.state {
            TrackerState::Running { module_id, .. } => Some(module_id),
            TrackerState::Idle => None,
        }
    }

    pub fn start(&mut self, module_id: &str) -> Result<(), TrackerError> {
        if let Some(running) = self.active_module() {
            return Err(TrackerError::AlreadyRunning(running.to_string()));
        }

        let now = self.clock.now();
        let key = timer_start_key(module_id);
        if let Err(e) = self
            .store
            .set(&key, &now.timestamp_millis().to_string())
        {
            log::warn!("timer for {module_id} is kept in memory only: {e}");
        }

        log::debug!("timer started for module {module_id}");
        self.state = TrackerState::Running {
            module_id: module_id.to_string(),
            started_at: now,
        };
        Ok(())
    }

    /// Re-enter the running state from a start instant persisted by an earlier run.
    /// Returns false when nothing is stored for `module_id` or a session is already active.
    pub fn resume(&mut self, module_id: &str) -> bool {
        if self.is_running() {
            return false;
        }

        match self.stored_start(module_id) {
            Some(started_at) => {
                log::info!("resuming timer for module {module_id} started at {started_at}");
                self.state = TrackerState::Running {
                    module_id: module_id.to_string(),
                    started_at,
                };
                true
            }
            None => false,
        }
    }

    /// Whole seconds since the session started, zero when idle.
    pub fn tick(&self) -> u64 {
        match &self.state {
            TrackerState::Idle => 0,
            TrackerState::Running {
                module_id,
                started_at,
            } => {
                let start = self.stored_start(module_id).unwrap_or(*started_at);
                (self.clock.now() - start).num_seconds().max(0) as u64
            }
        }
    }

    /// Finish the session and clear its persisted start instant.
    /// Does nothing when no session is running.
    pub fn stop(&mut self) -> Option<TimerRequest> {
        let elapsed_seconds = self.tick();
        let module_id = match std::mem::replace(&mut self.state, TrackerState::Idle) {
            TrackerState::Running { module_id, .. } => module_id,
            TrackerState::Idle => return None,
        };

        if let Err(e) = self.store.remove(&timer_start_key(&module_id)) {
            log::warn!("could not clear stored timer for {module_id}: {e}");
        }

        log::debug!("timer stopped for module {module_id} after {elapsed_seconds}s");
        Some(TimerRequest {
            module_id,
            elapsed_seconds,
        })
    }

    fn stored_start(&self, module_id: &str) -> Option<DateTime<Utc>> {
        self.store
            .get(&timer_start_key(module_id))
            .and_then(|raw| raw.parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis)
    }
}
