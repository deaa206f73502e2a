//! Host-facing entities derived from a fleet snapshot
//!
//! Everything here is a pure function of [`FleetSnapshot`] except button
//! discovery, which needs each device's command list.

use crate::coordinator::FleetSnapshot;
use serde::Serialize;

pub mod binary_sensor;
pub mod button;
pub mod device;
pub mod sensor;
pub mod tracker;

pub use binary_sensor::{BinarySensorState, binary_sensors_for};
pub use button::{ButtonSpec, derive_buttons, discover_buttons};
pub use device::{DeviceInfo, device_info};
pub use sensor::{SensorState, interval_label, sensors_for};
pub use tracker::{TrackerState, tracker_for};

/// All read-only entities of the fleet at one point in time
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntitySet {
    pub devices: Vec<DeviceInfo>,
    pub sensors: Vec<SensorState>,
    pub binary_sensors: Vec<BinarySensorState>,
    pub trackers: Vec<TrackerState>,
}

impl EntitySet {
    pub fn from_snapshot(snapshot: &FleetSnapshot) -> Self {
        let interval = snapshot.interval();
        let mut set = Self::default();
        for car in &snapshot.cars {
            set.devices.push(device_info(car));
            set.sensors.extend(sensors_for(car, interval));
            set.binary_sensors.extend(binary_sensors_for(car));
            set.trackers.extend(tracker_for(car));
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::Cadence;
    use chrono::Utc;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn entity_set_covers_every_car() {
        let mut snapshot =
            FleetSnapshot::empty(Cadence::Active, Duration::from_secs(300), Utc::now());
        snapshot.cars = serde_json::from_value(json!([
            {"id": 1, "telematics": [{"battery": 90, "locked": 0, "lat": 1.0, "lng": 2.0}]},
            {"id": 2}
        ]))
        .unwrap();

        let set = EntitySet::from_snapshot(&snapshot);
        assert_eq!(set.devices.len(), 2);
        assert_eq!(set.trackers.len(), 1);
        assert_eq!(set.binary_sensors.len(), 1);
        assert_eq!(set.binary_sensors[0].state, "locked");

        let intervals: Vec<_> = set
            .sensors
            .iter()
            .filter(|s| s.key == sensor::UPDATE_INTERVAL_KEY)
            .collect();
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].value, Some(json!("5 minutes")));
    }
}
