use crate::api::Car;
use serde::Serialize;

/// Device registry entry for one car
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
}

pub fn device_info(car: &Car) -> DeviceInfo {
    DeviceInfo {
        identifier: car.id.clone(),
        name: format!(
            "{} {} ({})",
            car.brand.name,
            car.model.name,
            car.numberplate.as_deref().unwrap_or_default()
        ),
        manufacturer: car.brand.name.clone(),
        model: format!(
            "{} - {} (VIN {})",
            car.model.name,
            car.modification.name,
            car.vin.as_deref().unwrap_or_default()
        ),
    }
}
