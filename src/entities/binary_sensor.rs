use crate::api::Car;
use crate::api::types::is_truthy;
use serde::Serialize;

#[derive(Debug, Clone, Copy)]
pub struct BinarySensorDescription {
    pub key: &'static str,
    pub name: &'static str,
    pub device_class: Option<&'static str>,
    pub icon: Option<&'static str>,
}

/// Raw `locked` is truthy when the car is *unlocked*; the entity reports
/// `on` for locked, so the value is inverted.
pub const LOCK_KEY: &str = "locked";

const fn binary(
    key: &'static str,
    name: &'static str,
    device_class: Option<&'static str>,
) -> BinarySensorDescription {
    BinarySensorDescription {
        key,
        name,
        device_class,
        icon: None,
    }
}

pub const BINARY_SENSOR_TYPES: &[BinarySensorDescription] = &[
    binary("charging", "Charging", Some("battery_charging")),
    binary(LOCK_KEY, "Lock", Some("lock")),
    binary("door_fl", "Front left door", Some("door")),
    binary("door_fr", "Front right door", Some("door")),
    binary("door_rl", "Rear left door", Some("door")),
    binary("door_rr", "Rear right door", Some("door")),
    binary("trunk", "Trunk", Some("door")),
    binary("moving", "Moving", Some("moving")),
    binary("eco", "Eco mode", None),
    binary("auto_main_battery_heating", "Battery auto-heating", None),
    binary("auto_board_battery_recharge", "Board battery auto-recharge", None),
    BinarySensorDescription {
        icon: Some("mdi:engine"),
        ..binary("ignition", "Ignition", Some("running"))
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinarySensorState {
    pub unique_id: String,
    pub car_id: String,
    pub key: &'static str,
    pub name: &'static str,
    pub device_class: Option<&'static str>,
    pub icon: Option<&'static str>,
    pub is_on: bool,
    pub state: &'static str,
}

/// Logical state of `desc` for `car`, `None` when there is no reading
pub fn is_on(desc: &BinarySensorDescription, car: &Car) -> Option<bool> {
    let raw = is_truthy(car.reading(desc.key)?);
    if desc.key == LOCK_KEY {
        Some(!raw)
    } else {
        Some(raw)
    }
}

/// Text shown for a logical state
pub fn display_state(desc: &BinarySensorDescription, on: bool) -> &'static str {
    match (desc.device_class, on) {
        (Some("lock"), true) => "locked",
        (Some("lock"), false) => "unlocked",
        (Some("door"), true) => "open",
        (Some("door"), false) => "closed",
        (_, true) => "on",
        (_, false) => "off",
    }
}

pub fn binary_sensors_for(car: &Car) -> Vec<BinarySensorState> {
    BINARY_SENSOR_TYPES
        .iter()
        .filter_map(|desc| {
            let on = is_on(desc, car)?;
            Some(BinarySensorState {
                unique_id: format!("{}_{}", car.id, desc.key),
                car_id: car.id.clone(),
                key: desc.key,
                name: desc.name,
                device_class: desc.device_class,
                icon: desc.icon,
                is_on: on,
                state: display_state(desc, on),
            })
        })
        .collect()
}
