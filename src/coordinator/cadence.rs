//! Adaptive poll cadence
//!
//! `Active` while any car moves or charges, `Cooling` for a while after
//! that, `Idle` once the fleet has been quiet longer than `idle_after`.

use crate::api::Car;
use crate::config::PollingConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Active,
    Cooling,
    Idle,
}

impl Cadence {
    pub fn interval(self, polling: &PollingConfig) -> Duration {
        match self {
            Self::Active => polling.active_interval(),
            Self::Cooling => polling.cooling_interval(),
            Self::Idle => polling.idle_interval(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cooling => "cooling",
            Self::Idle => "idle",
        }
    }
}

/// Fleet-wide activity flags derived from the first telemetry element of each car
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetActivity {
    pub any_moving: bool,
    pub any_charging: bool,
}

impl FleetActivity {
    pub fn from_cars(cars: &[Car]) -> Self {
        Self {
            any_moving: cars.iter().any(Car::is_moving),
            any_charging: cars.iter().any(Car::is_charging),
        }
    }

    pub fn is_active(self) -> bool {
        self.any_moving || self.any_charging
    }
}

/// Pure cadence choice from activity and time since the fleet was last active
pub fn select_cadence(activity: FleetActivity, since_active: Duration, idle_after: Duration) -> Cadence {
    if activity.is_active() {
        Cadence::Active
    } else if since_active > idle_after {
        Cadence::Idle
    } else {
        Cadence::Cooling
    }
}

/// Owned by the coordinator; changed only at the end of a successful poll
#[derive(Debug, Clone)]
pub struct PollState {
    pub last_active: DateTime<Utc>,
    pub cadence: Cadence,
    pub current_interval: Duration,
}

impl PollState {
    pub fn new(now: DateTime<Utc>, polling: &PollingConfig) -> Self {
        Self {
            last_active: now,
            cadence: Cadence::Idle,
            current_interval: polling.initial_interval(),
        }
    }

    /// Apply one cycle's activity; returns whether the interval changed
    pub fn advance(
        &mut self,
        activity: FleetActivity,
        now: DateTime<Utc>,
        polling: &PollingConfig,
    ) -> bool {
        if activity.is_active() {
            self.last_active = now;
        }
        // A clock that went backwards counts as "just active"
        let since_active = (now - self.last_active).to_std().unwrap_or_default();
        let cadence = select_cadence(activity, since_active, polling.idle_after());
        let interval = cadence.interval(polling);

        self.cadence = cadence;
        if interval == self.current_interval {
            return false;
        }
        self.current_interval = interval;
        true
    }
}
