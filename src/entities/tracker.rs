use crate::api::Car;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerState {
    pub unique_id: String,
    pub car_id: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub source_type: &'static str,
    pub icon: &'static str,
}

/// GPS tracker for a car; cars without telemetry get none
pub fn tracker_for(car: &Car) -> Option<TrackerState> {
    let telemetry = car.telemetry()?;

    let brand = non_empty(&car.brand.name).unwrap_or("Unknown brand");
    let model = non_empty(&car.model.name).unwrap_or("Unknown model");
    let plate = car
        .numberplate
        .as_deref()
        .and_then(non_empty)
        .unwrap_or("No plate");

    Some(TrackerState {
        unique_id: format!("{}_tracker", car.id),
        car_id: car.id.clone(),
        name: format!("{brand} {model} ({plate})"),
        latitude: telemetry.number("lat"),
        longitude: telemetry.number("lng"),
        source_type: "gps",
        icon: "mdi:car",
    })
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() { None } else { Some(s) }
}
