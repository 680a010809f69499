//! API response types

use serde::{Deserialize, Serialize};

use crate::vehicle::{Vehicle, DATE_FORMAT};

/// Body of `GET /`
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    /// Whole seconds since start, rendered like `1h2m3s`
    pub uptime: String,
}

impl ServiceStatus {
    pub fn running(uptime: std::time::Duration) -> Self {
        Self {
            status: "running".to_string(),
            uptime: format_uptime(uptime.as_secs()),
        }
    }
}

fn format_uptime(secs: u64) -> String {
    let (hours, minutes, seconds) = (secs / 3600, (secs / 60) % 60, secs % 60);
    match (hours, minutes) {
        (0, 0) => format!("{}s", seconds),
        (0, _) => format!("{}m{}s", minutes, seconds),
        _ => format!("{}h{}m{}s", hours, minutes, seconds),
    }
}

/// Vehicle as returned by `GET /lookup`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVehicle {
    pub hash: String,
    pub country: String,
    pub reg_nr: String,
    pub vin: String,
    pub brand: String,
    pub model: String,
    pub fuel_type: String,
    pub first_reg_date: String,
}

impl From<&Vehicle> for ApiVehicle {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            hash: vehicle.hash().as_key(),
            country: vehicle.country().code().to_string(),
            reg_nr: vehicle.reg_nr.clone(),
            vin: vehicle.vin.clone(),
            brand: vehicle.brand.clone(),
            model: vehicle.model.clone(),
            fuel_type: vehicle.fuel_type.clone(),
            first_reg_date: vehicle.first_reg_date.format(DATE_FORMAT).to_string(),
        }
    }
}

/// Operation of `PATCH /vehicle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleOp {
    Enable,
    Disable,
}

/// Body of `PATCH /vehicle`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehiclePatch {
    pub hash: String,
    pub op: VehicleOp,
}

/// Reply to `PATCH /vehicle`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehiclePatched {
    pub hash: String,
    pub disabled: bool,
}
