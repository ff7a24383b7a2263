//! Route export: the JSON document consumed by the routes API and a flat
//! per-stop CSV table.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::PlannerError;
use crate::input::StartPosition;
use crate::planner::{PlanResult, PlanSummary, Stop, VehicleRoute};
use crate::vehicle::VehicleCategory;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `HH:MM` of a minutes-since-midnight clock value.
pub fn clock_label(time_min: f64) -> String {
    let minutes = time_min.max(0.0).floor() as u64;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[derive(Debug, Serialize)]
pub struct StopEntry<'a> {
    pub container_idx: i64,
    pub mahalle: &'a str,
    pub lat: f64,
    pub lon: f64,
    pub tip: &'a str,
    pub demand_ton: f64,
    pub hour: u32,
    pub arrival: String,
    pub load_ton: f64,
    pub street_width: Option<f64>,
}

impl<'a> From<&'a Stop> for StopEntry<'a> {
    fn from(stop: &'a Stop) -> Self {
        Self {
            container_idx: stop.point_id,
            mahalle: &stop.neighborhood,
            lat: stop.lat,
            lon: stop.lon,
            tip: &stop.container_type,
            demand_ton: stop.demand_ton,
            hour: stop.hour(),
            arrival: clock_label(stop.time_min),
            load_ton: stop.load_ton,
            street_width: stop.street_width,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VehicleEntry<'a> {
    pub vehicle_id: u64,
    pub vehicle_name: &'a str,
    pub vehicle_type: &'a str,
    pub vehicle_category: VehicleCategory,
    pub capacity_ton: f64,
    pub start_position: &'a StartPosition,
    pub total_stops: usize,
    pub collected_tonnage: f64,
    pub total_distance_km: f64,
    pub unloads: u32,
    pub route: Vec<StopEntry<'a>>,
}

impl<'a> From<&'a VehicleRoute> for VehicleEntry<'a> {
    fn from(route: &'a VehicleRoute) -> Self {
        Self {
            vehicle_id: route.vehicle.id,
            vehicle_name: &route.vehicle.name,
            vehicle_type: &route.vehicle.vehicle_type,
            vehicle_category: route.vehicle.category,
            capacity_ton: route.vehicle.capacity_ton,
            start_position: &route.start,
            total_stops: route.container_stops(),
            collected_tonnage: round2(route.collected_ton),
            total_distance_km: round2(route.distance_km),
            unloads: route.unloads,
            route: route.stops.iter().map(StopEntry::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoutesDocument<'a> {
    pub date: String,
    pub day: String,
    pub target_ton: f64,
    /// Vehicles with at least one stop beyond their start.
    pub total_vehicles: usize,
    pub total_stops: usize,
    pub summary: &'a PlanSummary,
    pub vehicles: Vec<VehicleEntry<'a>>,
}

impl<'a> From<&'a PlanResult> for RoutesDocument<'a> {
    fn from(result: &'a PlanResult) -> Self {
        let vehicles: Vec<VehicleEntry<'a>> = result.active_routes().map(VehicleEntry::from).collect();
        Self {
            date: result.date.format("%Y-%m-%d").to_string(),
            day: result.date.format("%A").to_string().to_uppercase(),
            target_ton: round2(result.target.adjusted_ton),
            total_vehicles: vehicles.len(),
            total_stops: result.total_container_stops(),
            summary: &result.summary,
            vehicles,
        }
    }
}

/// One CSV row per stop of every route, start-only routes included.
#[derive(Debug, Serialize)]
struct StopRow<'a> {
    vehicle_id: u64,
    vehicle_name: &'a str,
    vehicle_type: &'a str,
    vehicle_category: VehicleCategory,
    vehicle_capacity: f64,
    is_crane: bool,
    step: usize,
    container_idx: i64,
    mahalle: &'a str,
    lat: f64,
    lon: f64,
    tip: &'a str,
    demand_ton: f64,
    hour: u32,
    arrival: String,
    load_ton: f64,
    street_width: Option<f64>,
}

pub fn write_routes_json<W: Write>(writer: W, result: &PlanResult) -> Result<(), PlannerError> {
    serde_json::to_writer_pretty(writer, &RoutesDocument::from(result))?;
    Ok(())
}

pub fn write_stop_table<W: Write>(writer: W, result: &PlanResult) -> Result<(), PlannerError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for route in &result.routes {
        let vehicle = &route.vehicle;
        for (step, stop) in route.stops.iter().enumerate() {
            csv_writer.serialize(StopRow {
                vehicle_id: vehicle.id,
                vehicle_name: &vehicle.name,
                vehicle_type: &vehicle.vehicle_type,
                vehicle_category: vehicle.category,
                vehicle_capacity: vehicle.capacity_ton,
                is_crane: vehicle.is_crane(),
                step: step + 1,
                container_idx: stop.point_id,
                mahalle: &stop.neighborhood,
                lat: stop.lat,
                lon: stop.lon,
                tip: &stop.container_type,
                demand_ton: stop.demand_ton,
                hour: stop.hour(),
                arrival: clock_label(stop.time_min),
                load_ton: stop.load_ton,
                street_width: stop.street_width,
            })?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes `routes_api_<YYYYMMDD>.json` and `route_plan_<YYYYMMDD>.csv` into
/// `dir`, creating it if needed.
pub fn write_outputs(dir: &Path, result: &PlanResult) -> Result<(PathBuf, PathBuf), PlannerError> {
    fs::create_dir_all(dir)?;
    let stamp = result.date.format("%Y%m%d");

    let json_path = dir.join(format!("routes_api_{stamp}.json"));
    let mut json_writer = BufWriter::new(File::create(&json_path)?);
    write_routes_json(&mut json_writer, result)?;
    json_writer.flush()?;

    let csv_path = dir.join(format!("route_plan_{stamp}.csv"));
    write_stop_table(BufWriter::new(File::create(&csv_path)?), result)?;

    info!(json = %json_path.display(), csv = %csv_path.display(), "routes written");
    Ok((json_path, csv_path))
}
