//! Readers for the flat input tables.
//!
//! Columns are located by header name (exact match first, then substring,
//! case-insensitive) since the source exports are not consistent. Rows
//! missing an essential field are dropped with a warning, never fatal.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::demand::{DEFAULT_DAILY_TONNAGE, TonnageTable, parse_month};
use crate::error::PlannerError;
use crate::point::CollectionPoint;
use crate::text::{WeekdaySet, normalize_text, parse_weekdays};
use crate::traits::Located;
use crate::vehicle::FleetVehicle;

pub const COMMA: u8 = b',';
pub const SEMICOLON: u8 = b';';

/// Parses a number accepting a decimal comma.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

struct Table {
    headers: Vec<String>,
    rows: Vec<StringRecord>,
    skipped: usize,
}

impl Table {
    fn read<R: Read>(reader: R, delimiter: u8) -> Result<Self, PlannerError> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
            .collect();

        let mut rows = Vec::new();
        let mut skipped = 0;
        for record in csv_reader.records() {
            match record {
                Ok(record) => rows.push(record),
                Err(_) => skipped += 1,
            }
        }

        Ok(Self { headers, rows, skipped })
    }

    fn column(&self, needles: &[&str]) -> Option<usize> {
        needles
            .iter()
            .find_map(|needle| self.headers.iter().position(|h| h == needle))
            .or_else(|| {
                needles
                    .iter()
                    .find_map(|needle| self.headers.iter().position(|h| h.contains(needle)))
            })
    }

    fn require(&self, table: &'static str, column: &'static str, needles: &[&str]) -> Result<usize, PlannerError> {
        self.column(needles).ok_or(PlannerError::MissingColumn { table, column })
    }
}

fn field(record: &StringRecord, column: usize) -> &str {
    record.get(column).unwrap_or("")
}

fn report_dropped(table: &str, kept: usize, dropped: usize) {
    if dropped > 0 {
        warn!(table, kept, dropped, "dropped malformed rows");
    } else {
        info!(table, rows = kept, "loaded table");
    }
}

/// Reads the collection-point table.
///
/// Points are numbered in input order after dropping rows without usable
/// coordinates or neighborhood.
pub fn read_collection_points<R: Read>(reader: R) -> Result<Vec<CollectionPoint>, PlannerError> {
    let table = Table::read(reader, COMMA)?;
    let lat = table.require("collection points", "lat", &["lat", "enlem"])?;
    let lon = table.require("collection points", "lon", &["lon", "lng", "boylam"])?;
    let neighborhood = table.require("collection points", "mahalle", &["mahalle", "neighborhood"])?;
    let container_type = table.column(&["tip", "type"]);

    let mut points = Vec::with_capacity(table.rows.len());
    let mut dropped = table.skipped;
    for row in &table.rows {
        let coords = parse_decimal(field(row, lat)).zip(parse_decimal(field(row, lon)));
        let name = field(row, neighborhood);
        match coords {
            Some((lat, lon)) if !normalize_text(name).is_empty() => {
                let kind = container_type.map(|c| field(row, c)).unwrap_or("");
                points.push(CollectionPoint::new(points.len(), lat, lon, name, kind));
            }
            _ => dropped += 1,
        }
    }

    report_dropped("collection points", points.len(), dropped);
    Ok(points)
}

/// Reads the population table into normalized neighborhood -> population.
pub fn read_population<R: Read>(reader: R) -> Result<HashMap<String, u64>, PlannerError> {
    let table = Table::read(reader, SEMICOLON)?;
    let name = table.require("population", "mahalle", &["mahalle", "neighborhood"])?;
    let count = table.require("population", "nufus", &["nufus", "nüfus", "population"])?;

    let mut population = HashMap::new();
    let mut dropped = table.skipped;
    for row in &table.rows {
        let key = normalize_text(field(row, name));
        match parse_decimal(field(row, count)) {
            Some(value) if value >= 0.0 && !key.is_empty() => {
                population.insert(key, value.round() as u64);
            }
            _ => dropped += 1,
        }
    }

    report_dropped("population", population.len(), dropped);
    Ok(population)
}

/// Reads and classifies the fleet table.
pub fn read_fleet<R: Read>(reader: R) -> Result<Vec<FleetVehicle>, PlannerError> {
    let table = Table::read(reader, COMMA)?;
    let id = table.require("fleet", "vehicle_id", &["vehicle_id", "id"])?;
    let name = table.column(&["vehicle_name", "name"]);
    let kind = table.require("fleet", "vehicle_type", &["vehicle_type", "type"])?;
    let capacity = table.require("fleet", "capacity_ton", &["capacity_ton", "capacity"])?;

    let mut fleet = Vec::with_capacity(table.rows.len());
    let mut dropped = table.skipped;
    for row in &table.rows {
        let vehicle_id = field(row, id).parse::<u64>().ok();
        let capacity_ton = parse_decimal(field(row, capacity)).filter(|c| *c > 0.0);
        match (vehicle_id, capacity_ton) {
            (Some(vehicle_id), Some(capacity_ton)) => {
                let vehicle_name = name.map(|c| field(row, c)).unwrap_or("");
                fleet.push(FleetVehicle::new(vehicle_id, vehicle_name, field(row, kind), capacity_ton));
            }
            _ => dropped += 1,
        }
    }

    report_dropped("fleet", fleet.len(), dropped);
    Ok(fleet)
}

/// Neighborhood collection-day rotation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RotationSchedule {
    days: BTreeMap<String, WeekdaySet>,
}

impl RotationSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds days for a neighborhood, unioned with any already present.
    pub fn add(&mut self, neighborhood: &str, days: WeekdaySet) {
        let entry = self.days.entry(normalize_text(neighborhood)).or_default();
        *entry = entry.union(days);
    }

    pub fn days_for(&self, neighborhood: &str) -> WeekdaySet {
        self.days.get(neighborhood).copied().unwrap_or_default()
    }

    /// Neighborhoods collected on `day`, sorted by name.
    pub fn scheduled_on(&self, day: chrono::Weekday) -> Vec<String> {
        self.days
            .iter()
            .filter(|(_, days)| days.contains(day))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Reads the rotation table; a neighborhood on several rows gets the union.
pub fn read_rotation<R: Read>(reader: R) -> Result<RotationSchedule, PlannerError> {
    let table = Table::read(reader, SEMICOLON)?;
    let name = table.require("rotation", "mahalle adi", &["mahalle adi", "mahalle", "neighborhood"])?;
    let frequency = table.require("rotation", "frequency", &["frequency"])?;

    let mut schedule = RotationSchedule::new();
    let mut dropped = table.skipped;
    for row in &table.rows {
        if normalize_text(field(row, name)).is_empty() {
            dropped += 1;
            continue;
        }
        schedule.add(field(row, name), parse_weekdays(field(row, frequency)));
    }

    report_dropped("rotation", schedule.len(), dropped);
    Ok(schedule)
}

/// Reads monthly tonnage statistics.
///
/// Rows with an unrecognized month name are dropped rather than assigned a
/// guessed month. An unparseable daily average becomes the default tonnage.
pub fn read_tonnages<R: Read>(reader: R) -> Result<TonnageTable, PlannerError> {
    let table = Table::read(reader, COMMA)?;
    let month = table.require("tonnages", "ay", &["ay", "month"])?;
    let year = table.require("tonnages", "yil", &["yil", "yıl", "year"])?;
    let daily = table
        .headers
        .iter()
        .position(|h| h.contains("ortalama") && h.contains("günlük"))
        .or_else(|| table.column(&["daily"]));

    let mut tonnages = TonnageTable::new();
    let mut dropped = table.skipped;
    for row in &table.rows {
        let Some(month_index) = parse_month(field(row, month)) else {
            warn!(month = field(row, month), "unrecognized month name, row dropped");
            dropped += 1;
            continue;
        };
        let Ok(year_value) = field(row, year).parse::<i32>() else {
            dropped += 1;
            continue;
        };
        let daily_avg = daily
            .and_then(|c| parse_decimal(field(row, c)))
            .unwrap_or(DEFAULT_DAILY_TONNAGE);
        tonnages.insert(month_index, year_value, daily_avg);
    }

    report_dropped("tonnages", tonnages.len(), dropped);
    Ok(tonnages)
}

/// A configured vehicle start coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartPosition {
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "mahalle", alias = "neighborhood")]
    pub neighborhood: String,
}

impl Located for StartPosition {
    fn location(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

#[derive(Debug, Deserialize)]
struct StartPositionsFile {
    vehicles: Vec<StartPositionEntry>,
    #[serde(default)]
    reference_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StartPositionEntry {
    vehicle_id: u64,
    start_position: StartPosition,
}

/// Reads the per-vehicle start-position document keyed by vehicle id.
pub fn read_start_positions<R: Read>(reader: R) -> Result<BTreeMap<u64, StartPosition>, PlannerError> {
    let file: StartPositionsFile = serde_json::from_reader(reader)?;
    let positions: BTreeMap<u64, StartPosition> = file
        .vehicles
        .into_iter()
        .map(|entry| (entry.vehicle_id, entry.start_position))
        .collect();

    info!(
        vehicles = positions.len(),
        reference_date = file.reference_date.as_deref().unwrap_or("-"),
        "loaded start positions"
    );
    Ok(positions)
}
