//! Adaptive poll coordinator
//!
//! Single source of truth for fleet state. One poll cycle runs at a time;
//! consumers read the latest [`FleetSnapshot`] through a watch channel and
//! never wait on network I/O. Command dispatch bypasses the poll lock and
//! may run alongside a cycle.

use crate::api::{CommandDescriptor, FleetClient};
use crate::config::PollingConfig;
use crate::error::{ElectroCarsError, Result};
use crate::logging::{LogContext, get_logger, get_logger_with_context};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{Notify, watch};

pub mod cadence;
pub mod snapshot;

pub use cadence::{Cadence, FleetActivity, PollState, select_cadence};
pub use snapshot::{FleetSnapshot, PollStats};

/// Result of one poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A new snapshot was published
    Updated { cars: usize, interval_changed: bool },
    /// Fetch failed or returned no cars; snapshot and interval kept
    Unchanged,
}

pub struct FleetCoordinator {
    fleet: Arc<FleetClient>,
    polling: PollingConfig,
    /// Held for the whole cycle so cycles never overlap
    poll_state: tokio::sync::Mutex<PollState>,
    snapshot_tx: watch::Sender<Arc<FleetSnapshot>>,
    stats: Mutex<PollStats>,
    refresh_now: Notify,
    logger: crate::logging::StructuredLogger,
}

impl FleetCoordinator {
    pub fn new(fleet: Arc<FleetClient>, polling: PollingConfig) -> Self {
        let state = PollState::new(Utc::now(), &polling);
        let initial = FleetSnapshot::empty(state.cadence, state.current_interval, state.last_active);
        let (snapshot_tx, _) = watch::channel(Arc::new(initial));
        Self {
            fleet,
            polling,
            poll_state: tokio::sync::Mutex::new(state),
            snapshot_tx,
            stats: Mutex::new(PollStats::default()),
            refresh_now: Notify::new(),
            logger: get_logger("coordinator"),
        }
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<FleetSnapshot> {
        self.snapshot_tx.borrow().clone()
    }

    /// Receiver that is notified after every successful poll
    pub fn subscribe(&self) -> watch::Receiver<Arc<FleetSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Wait period before the next scheduled poll
    pub fn current_interval(&self) -> Duration {
        self.snapshot().interval()
    }

    pub fn stats(&self) -> PollStats {
        self.stats_guard().clone()
    }

    fn stats_guard(&self) -> std::sync::MutexGuard<'_, PollStats> {
        self.stats
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Wake the scheduler for an immediate poll
    pub fn request_refresh(&self) {
        self.refresh_now.notify_one();
    }

    pub async fn poll_once(&self) -> PollOutcome {
        self.poll_once_at(Utc::now()).await
    }

    /// Run one cycle, treating `now` as the current time for the cadence
    pub async fn poll_once_at(&self, now: DateTime<Utc>) -> PollOutcome {
        let mut state = self.poll_state.lock().await;
        let started = Instant::now();
        {
            let mut stats = self.stats_guard();
            stats.total_polls += 1;
            stats.last_attempt = Some(now);
        }

        let fetched = self.fleet.list_cars().await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let cars = match fetched {
            Ok(Some(cars)) if !cars.is_empty() => cars,
            Ok(_) => {
                // An empty page counts as no data
                self.logger
                    .warn("Fleet update returned no cars, keeping previous snapshot");
                let err = ElectroCarsError::api("fleet returned no car data");
                self.record_failure(elapsed_ms, err.to_string());
                return PollOutcome::Unchanged;
            }
            Err(e) => {
                let message = format!("Fleet update failed: {}", e);
                if e.is_transient() {
                    self.logger.warn(&message);
                } else {
                    self.logger.error(&message);
                }
                self.record_failure(elapsed_ms, e.to_string());
                return PollOutcome::Unchanged;
            }
        };

        for car in cars.iter().filter(|c| c.is_moving() || c.is_charging()) {
            get_logger_with_context(LogContext::new("coordinator").with_car_id(&car.id)).debug(
                &format!("active (moving={}, charging={})", car.is_moving(), car.is_charging()),
            );
        }
        let activity = FleetActivity::from_cars(&cars);
        let previous = state.current_interval;
        let interval_changed = state.advance(activity, now, &self.polling);
        if interval_changed {
            self.logger.info(&format!(
                "Update interval {}s -> {}s ({}; moving={}, charging={})",
                previous.as_secs(),
                state.current_interval.as_secs(),
                state.cadence.as_str(),
                activity.any_moving,
                activity.any_charging
            ));
        }

        let count = cars.len();
        let snapshot = FleetSnapshot {
            cars,
            cadence: state.cadence,
            interval_secs: state.current_interval.as_secs(),
            last_active: state.last_active,
            updated_at: Some(now),
        };
        self.snapshot_tx.send_replace(Arc::new(snapshot));

        {
            let mut stats = self.stats_guard();
            stats.last_success = Some(now);
            stats.last_duration_ms = Some(elapsed_ms);
            stats.last_error = None;
        }
        self.logger.debug(&format!(
            "Poll cycle complete: {} car(s) in {} ms",
            count, elapsed_ms
        ));

        PollOutcome::Updated {
            cars: count,
            interval_changed,
        }
    }

    fn record_failure(&self, elapsed_ms: u64, error: String) {
        let mut stats = self.stats_guard();
        stats.failed_polls += 1;
        stats.last_duration_ms = Some(elapsed_ms);
        stats.last_error = Some(error);
    }

    /// Commands offered by a device; not serialized with polling
    pub async fn list_commands(&self, device_id: &str) -> Result<Option<Vec<CommandDescriptor>>> {
        self.fleet.list_commands(device_id).await
    }

    /// Dispatch a command; runs independently of any in-flight poll
    pub async fn send_command(&self, device_id: &str, command: i64) -> Result<bool> {
        let sent = self.fleet.send_command(device_id, command).await?;
        if !sent {
            self.logger.error(&format!(
                "Failed to send command {} to device {}",
                command, device_id
            ));
        }
        Ok(sent)
    }

    /// Poll immediately, then keep polling on the adaptive cadence until
    /// `shutdown` turns `true` or its sender is dropped
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        self.logger.info("Starting fleet polling loop");
        loop {
            if *shutdown.borrow() {
                break;
            }
            self.poll_once().await;

            // Read after the cycle so a changed interval applies to this wait
            let wait = self.current_interval();
            self.logger
                .debug(&format!("Next poll in {}s", wait.as_secs()));
            tokio::select! {
                () = tokio::time::sleep(wait) => {}
                () = self.refresh_now.notified() => {
                    self.logger.debug("Immediate refresh requested");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        self.logger.info("Fleet polling loop stopped");
    }
}
