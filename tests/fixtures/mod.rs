//! Test fixtures for the route planner.
//!
//! Provides:
//! - Approximate Nilüfer neighborhood centers
//! - Builders for collection points, fleets and planning contexts
//! - A seeded synthetic city with mixed container types and street widths

#![allow(dead_code)]

pub mod nilufer_locations;

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use waste_route_planner::input::RotationSchedule;
use waste_route_planner::point::CollectionPoint;
use waste_route_planner::text::{WeekdaySet, parse_weekdays};
use waste_route_planner::vehicle::FleetVehicle;
use waste_route_planner::PlanningContext;

pub use nilufer_locations::*;

/// Population threshold used throughout the fixtures.
pub const HIGH_POP_THRESHOLD: u64 = 15;

/// Builder for test collection points with sensible defaults.
#[derive(Clone, Debug)]
pub struct TestPoint {
    id: usize,
    neighborhood: &'static str,
    lat: f64,
    lon: f64,
    kind: &'static str,
    width: f64,
}

impl TestPoint {
    pub fn new(id: usize, location: &Location) -> Self {
        Self {
            id,
            neighborhood: location.name,
            lat: location.lat,
            lon: location.lon,
            kind: "770 LT",
            width: 8.0,
        }
    }

    pub fn offset(mut self, dlat: f64, dlon: f64) -> Self {
        self.lat += dlat;
        self.lon += dlon;
        self
    }

    pub fn kind(mut self, kind: &'static str) -> Self {
        self.kind = kind;
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn build(self) -> CollectionPoint {
        CollectionPoint::new(self.id, self.lat, self.lon, self.neighborhood, self.kind).with_street_width(self.width)
    }
}

/// One vehicle of each shape the fleet table holds.
pub fn standard_fleet() -> Vec<FleetVehicle> {
    vec![
        FleetVehicle::new(101, "Crane 1", "CRANE VEHICLE", 3.0),
        FleetVehicle::new(102, "Large 1", "LARGE GARBAGE TRUCK", 8.0),
        FleetVehicle::new(103, "Large 2", "LARGE GARBAGE TRUCK", 12.0),
        FleetVehicle::new(104, "Small 1", "SMALL GARBAGE TRUCK", 4.0),
        FleetVehicle::new(105, "Small 2", "SMALL GARBAGE TRUCK", 5.0),
    ]
}

pub fn population() -> HashMap<String, u64> {
    [("ALAADDINBEY", 42), ("YENIKENT", 8), ("GORUKLE", 27), ("IHSANIYE", 5)]
        .into_iter()
        .map(|(name, pop)| (name.to_string(), pop))
        .collect()
}

/// Every neighborhood daily except KONAK, which is Monday-only.
pub fn rotation() -> RotationSchedule {
    let mut schedule = RotationSchedule::new();
    for location in NEIGHBORHOODS {
        let days = if location.name == "KONAK" { parse_weekdays("MONDAY") } else { WeekdaySet::ALL };
        schedule.add(location.name, days);
    }
    schedule
}

/// Seeded synthetic containers spread around every neighborhood center.
///
/// Roughly 10% underground, 5% unknown type, widths uniform in 2..12 m.
pub fn city_points(per_neighborhood: usize, seed: u64) -> Vec<CollectionPoint> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut points = Vec::new();

    for location in NEIGHBORHOODS {
        for _ in 0..per_neighborhood {
            let roll: f64 = rng.gen_range(0.0..1.0);
            let kind = match roll {
                r if r < 0.10 => "YERALTI",
                r if r < 0.15 => "BILINMIYOR",
                r if r < 0.60 => "770 LT",
                r if r < 0.95 => "400 LT",
                _ => "PLASTIK",
            };
            let point = TestPoint::new(points.len(), location)
                .offset(rng.gen_range(-0.01..0.01), rng.gen_range(-0.01..0.01))
                .kind(kind)
                .width(rng.gen_range(2.0..12.0))
                .build();
            points.push(point);
        }
    }

    points
}

pub fn city_context(per_neighborhood: usize, seed: u64) -> PlanningContext {
    PlanningContext::new(city_points(per_neighborhood, seed), standard_fleet())
        .with_population(population(), HIGH_POP_THRESHOLD)
        .with_rotation(rotation())
}
