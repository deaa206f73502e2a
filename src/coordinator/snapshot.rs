use super::cadence::Cadence;
use crate::api::Car;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Latest fleet state as seen by every consumer.
///
/// Replaced wholesale after each successful poll; a failed poll publishes
/// nothing.
#[derive(Debug, Clone, Serialize)]
pub struct FleetSnapshot {
    pub cars: Vec<Car>,
    pub cadence: Cadence,
    pub interval_secs: u64,
    pub last_active: DateTime<Utc>,
    /// When this snapshot was fetched; `None` before the first successful poll
    pub updated_at: Option<DateTime<Utc>>,
}

impl FleetSnapshot {
    pub(crate) fn empty(cadence: Cadence, interval: Duration, last_active: DateTime<Utc>) -> Self {
        Self {
            cars: Vec::new(),
            cadence,
            interval_secs: interval.as_secs(),
            last_active,
            updated_at: None,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn car(&self, car_id: &str) -> Option<&Car> {
        self.cars.iter().find(|c| c.id == car_id)
    }
}

/// Counters for the status endpoint; kept outside the snapshot so a failed
/// poll leaves the snapshot untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollStats {
    pub total_polls: u64,
    pub failed_polls: u64,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_duration_ms: Option<u64>,
    pub last_error: Option<String>,
}
