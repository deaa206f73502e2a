use crate::api::Car;
use crate::api::types::as_number;
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
    TotalIncreasing,
}

#[derive(Debug, Clone, Copy)]
pub struct SensorDescription {
    pub key: &'static str,
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub device_class: Option<&'static str>,
    pub state_class: Option<StateClass>,
    pub icon: &'static str,
    pub diagnostic: bool,
}

/// Derived from the coordinator rather than from a car reading
pub const UPDATE_INTERVAL_KEY: &str = "update_interval";

const fn measurement(
    key: &'static str,
    name: &'static str,
    unit: &'static str,
    device_class: Option<&'static str>,
    icon: &'static str,
) -> SensorDescription {
    SensorDescription {
        key,
        name,
        unit: Some(unit),
        device_class,
        state_class: Some(StateClass::Measurement),
        icon,
        diagnostic: false,
    }
}

pub const SENSOR_TYPES: &[SensorDescription] = &[
    measurement("battery", "Battery level", "%", Some("battery"), "mdi:battery"),
    measurement("power_reserve", "Range", "km", None, "mdi:car-electric"),
    measurement(
        "temp_from_remote_control",
        "Cabin temperature",
        "°C",
        Some("temperature"),
        "mdi:thermometer",
    ),
    SensorDescription {
        key: "odometer",
        name: "Odometer",
        unit: Some("km"),
        device_class: Some("distance"),
        state_class: Some(StateClass::TotalIncreasing),
        icon: "mdi:counter",
        diagnostic: false,
    },
    SensorDescription {
        diagnostic: true,
        ..measurement("gsm_level", "GSM level", "%", None, "mdi:signal")
    },
    measurement(
        "board_network_voltage",
        "Board voltage",
        "V",
        Some("voltage"),
        "mdi:car-battery",
    ),
    measurement("lat", "Latitude", "°", None, "mdi:map-marker"),
    measurement("lng", "Longitude", "°", None, "mdi:map-marker"),
    measurement(
        "battery_capacity",
        "Battery capacity",
        "kWh",
        None,
        "mdi:battery-high",
    ),
    SensorDescription {
        key: "last_online",
        name: "Last online",
        unit: None,
        device_class: None,
        state_class: None,
        icon: "mdi:clock-time-four-outline",
        diagnostic: true,
    },
    measurement(
        "battery_temp",
        "Battery temperature",
        "°C",
        Some("temperature"),
        "mdi:thermometer",
    ),
    SensorDescription {
        key: UPDATE_INTERVAL_KEY,
        name: "Update interval",
        unit: None,
        device_class: None,
        state_class: None,
        icon: "mdi:timer-cog",
        diagnostic: true,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub unique_id: String,
    pub car_id: String,
    pub key: &'static str,
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub device_class: Option<&'static str>,
    pub state_class: Option<StateClass>,
    pub icon: &'static str,
    pub diagnostic: bool,
    pub value: Option<Value>,
}

/// Human label of the poll interval
pub fn interval_label(interval: Duration) -> &'static str {
    match interval.as_secs() {
        0..=300 => "5 minutes",
        301..=600 => "10 minutes",
        _ => "1 hour",
    }
}

/// Render a unix timestamp in `tz` as `YYYY-MM-DD HH:MM:SS`
pub fn format_timestamp<Tz: TimeZone>(secs: i64, tz: &Tz) -> Option<String>
where
    Tz::Offset: std::fmt::Display,
{
    DateTime::from_timestamp(secs, 0).map(|dt| {
        dt.with_timezone(tz)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    })
}

/// Display value of `desc` for `car`; `None` when the car has no reading
pub fn sensor_value(desc: &SensorDescription, car: &Car, interval: Duration) -> Option<Value> {
    if desc.key == UPDATE_INTERVAL_KEY {
        return Some(Value::from(interval_label(interval)));
    }

    let raw = car.reading(desc.key)?;
    match desc.key {
        "battery" => as_number(raw).map(|v| Value::from(v.trunc() as i64)),
        "last_online" => as_number(raw)
            .and_then(|secs| format_timestamp(secs as i64, &chrono::Local))
            .map(Value::from),
        _ => Some(raw.clone()),
    }
}

/// Sensors a car exposes: one per description with a reading, plus the interval
pub fn sensors_for(car: &Car, interval: Duration) -> Vec<SensorState> {
    SENSOR_TYPES
        .iter()
        .filter_map(|desc| {
            let value = sensor_value(desc, car, interval)?;
            Some(SensorState {
                unique_id: format!("{}_{}", car.id, desc.key),
                car_id: car.id.clone(),
                key: desc.key,
                name: desc.name,
                unit: desc.unit,
                device_class: desc.device_class,
                state_class: desc.state_class,
                icon: desc.icon,
                diagnostic: desc.diagnostic,
                value: Some(value),
            })
        })
        .collect()
}
