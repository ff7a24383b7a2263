//! Fleet access categories and per-point feasibility.
//!
//! | Category | Rule                          | Min street width |
//! |----------|-------------------------------|------------------|
//! | CRANE    | type text contains `CRANE`    | 5.0 m            |
//! | SMALL    | otherwise, capacity < 6 t     | 2.5 m            |
//! | LARGE    | otherwise                     | 4.0 m            |
//!
//! Only CRANE vehicles may service underground containers; no vehicle may
//! service a point on a street narrower than its category minimum.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::point::CollectionPoint;

const CRANE_KEYWORD: &str = "CRANE";

/// Capacity (tons) below which a non-crane vehicle counts as SMALL.
pub const SMALL_CAPACITY_LIMIT_TON: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VehicleCategory {
    Crane,
    Large,
    Small,
}

impl VehicleCategory {
    pub const ALL: [VehicleCategory; 3] =
        [VehicleCategory::Crane, VehicleCategory::Large, VehicleCategory::Small];

    pub fn classify(vehicle_type: &str, capacity_ton: f64) -> Self {
        if vehicle_type.to_uppercase().contains(CRANE_KEYWORD) {
            VehicleCategory::Crane
        } else if capacity_ton < SMALL_CAPACITY_LIMIT_TON {
            VehicleCategory::Small
        } else {
            VehicleCategory::Large
        }
    }

    /// Narrowest street (meters) this category can enter.
    pub fn min_street_width(self) -> f64 {
        match self {
            VehicleCategory::Crane => 5.0,
            VehicleCategory::Large => 4.0,
            VehicleCategory::Small => 2.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleCategory::Crane => "CRANE",
            VehicleCategory::Large => "LARGE",
            VehicleCategory::Small => "SMALL",
        }
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vehicle from the fleet table, classified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetVehicle {
    pub id: u64,
    pub name: String,
    /// Upper-cased, trimmed type text.
    pub vehicle_type: String,
    pub capacity_ton: f64,
    pub category: VehicleCategory,
    pub min_street_width: f64,
}

impl FleetVehicle {
    pub fn new(id: u64, name: &str, vehicle_type: &str, capacity_ton: f64) -> Self {
        let vehicle_type = vehicle_type.trim().to_uppercase();
        let category = VehicleCategory::classify(&vehicle_type, capacity_ton);

        Self {
            id,
            name: name.trim().to_string(),
            vehicle_type,
            capacity_ton,
            category,
            min_street_width: category.min_street_width(),
        }
    }

    pub fn is_crane(&self) -> bool {
        self.category == VehicleCategory::Crane
    }
}

/// Why a vehicle cannot service a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AccessDenied {
    UndergroundRequiresCrane,
    StreetTooNarrow { width_m: f64, required_m: f64 },
}

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessDenied::UndergroundRequiresCrane => f.write_str("underground container needs a crane"),
            AccessDenied::StreetTooNarrow { width_m, required_m } => {
                write!(f, "street {width_m:.1}m narrower than {required_m}m")
            }
        }
    }
}

/// Pointwise access check.
pub fn check_access(vehicle: &FleetVehicle, point: &CollectionPoint) -> Result<(), AccessDenied> {
    if point.is_underground && !vehicle.is_crane() {
        return Err(AccessDenied::UndergroundRequiresCrane);
    }
    if point.street_width < vehicle.min_street_width {
        return Err(AccessDenied::StreetTooNarrow {
            width_m: point.street_width,
            required_m: vehicle.min_street_width,
        });
    }
    Ok(())
}

pub fn can_access(vehicle: &FleetVehicle, point: &CollectionPoint) -> bool {
    check_access(vehicle, point).is_ok()
}

/// Bulk form of [`can_access`] over a point array, evaluated rule by rule.
pub fn accessible_mask(vehicle: &FleetVehicle, points: &[CollectionPoint]) -> Vec<bool> {
    let mut mask = vec![true; points.len()];

    if !vehicle.is_crane() {
        for (allowed, point) in mask.iter_mut().zip(points) {
            *allowed &= !point.is_underground;
        }
    }

    for (allowed, point) in mask.iter_mut().zip(points) {
        *allowed &= point.street_width >= vehicle.min_street_width;
    }

    mask
}

/// Logs how many vehicles of each category the fleet holds.
pub fn log_fleet_summary(fleet: &[FleetVehicle]) {
    for category in VehicleCategory::ALL {
        let members: Vec<&FleetVehicle> = fleet.iter().filter(|v| v.category == category).collect();
        if members.is_empty() {
            continue;
        }
        let min_cap = members.iter().map(|v| v.capacity_ton).fold(f64::INFINITY, f64::min);
        let max_cap = members.iter().map(|v| v.capacity_ton).fold(f64::NEG_INFINITY, f64::max);
        info!(
            category = %category,
            vehicles = members.len(),
            min_capacity_ton = min_cap,
            max_capacity_ton = max_cap,
            min_street_width_m = category.min_street_width(),
            "fleet category"
        );
    }
}
