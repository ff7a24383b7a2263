//! Daily demand allocation: monthly tonnage statistics down to per-point
//! tons for one planning day.
//!
//! 1. Daily target from the monthly table, with a soft fallback chain.
//! 2. Seasonal and weekday multipliers.
//! 3. Split across the day's scheduled neighborhoods by population.
//! 4. Split each neighborhood across its points by container capacity,
//!    clamped to a floor/ceiling fraction of that capacity.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::point::CollectionPoint;
use crate::text::normalize_text;

/// Daily tons used when no statistic covers the requested month.
pub const DEFAULT_DAILY_TONNAGE: f64 = 550.0;

/// Growth applied to last year's figure for the same month.
pub const YEAR_OVER_YEAR_GROWTH: f64 = 1.03;

/// Allocated demand never drops below this fraction of container capacity.
pub const DEMAND_FLOOR_FRACTION: f64 = 0.30;

/// Allocated demand never exceeds this fraction of container capacity.
pub const DEMAND_CEILING_FRACTION: f64 = 0.80;

const UNDERGROUND_CAPACITY_TON: f64 = 3.0;
/// Volume (m3) times assumed fill factor for wheeled bins.
const FILL_FACTOR: f64 = 0.25;
const BIN_770_CAPACITY_TON: f64 = 0.77 * FILL_FACTOR;
const BIN_400_CAPACITY_TON: f64 = 0.40 * FILL_FACTOR;
const DEFAULT_BIN_CAPACITY_TON: f64 = 0.5 * FILL_FACTOR;

const MONTH_NAMES: &[(&str, u32)] = &[
    ("OCAK", 1),
    ("SUBAT", 2),
    ("MART", 3),
    ("NISAN", 4),
    ("MAYIS", 5),
    ("HAZIRAN", 6),
    ("TEMMUZ", 7),
    ("AGUSTOS", 8),
    ("EYLUL", 9),
    ("EKIM", 10),
    ("KASIM", 11),
    ("ARALIK", 12),
    ("JANUARY", 1),
    ("FEBRUARY", 2),
    ("MARCH", 3),
    ("APRIL", 4),
    ("MAY", 5),
    ("JUNE", 6),
    ("JULY", 7),
    ("AUGUST", 8),
    ("SEPTEMBER", 9),
    ("OCTOBER", 10),
    ("NOVEMBER", 11),
    ("DECEMBER", 12),
];

/// Parses a localized month name (Turkish or English) or a month number.
///
/// Returns `None` for anything unrecognized rather than guessing a month.
pub fn parse_month(raw: &str) -> Option<u32> {
    let name = normalize_text(raw);
    if let Ok(number) = name.parse::<u32>() {
        return (1..=12).contains(&number).then_some(number);
    }
    MONTH_NAMES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, month)| *month)
}

/// Average daily tonnage per (month, year).
#[derive(Debug, Clone, Default)]
pub struct TonnageTable {
    monthly: HashMap<(u32, i32), f64>,
}

impl TonnageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, month: u32, year: i32, daily_avg_ton: f64) {
        self.monthly.insert((month, year), daily_avg_ton);
    }

    pub fn len(&self) -> usize {
        self.monthly.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monthly.is_empty()
    }

    /// Unadjusted daily tons for the month containing `date`.
    ///
    /// Falls back to the same month last year scaled by
    /// [`YEAR_OVER_YEAR_GROWTH`], then to [`DEFAULT_DAILY_TONNAGE`].
    pub fn daily_tonnage(&self, date: NaiveDate) -> f64 {
        let (month, year) = (date.month(), date.year());
        if let Some(tons) = self.monthly.get(&(month, year)) {
            return *tons;
        }
        if let Some(tons) = self.monthly.get(&(month, year - 1)) {
            return tons * YEAR_OVER_YEAR_GROWTH;
        }
        DEFAULT_DAILY_TONNAGE
    }
}

impl FromIterator<(u32, i32, f64)> for TonnageTable {
    fn from_iter<I: IntoIterator<Item = (u32, i32, f64)>>(iter: I) -> Self {
        let mut table = TonnageTable::new();
        for (month, year, tons) in iter {
            table.insert(month, year, tons);
        }
        table
    }
}

pub fn seasonal_factor(month: u32) -> f64 {
    match month {
        6..=8 => 1.15,
        12 | 1 | 2 => 0.90,
        _ => 1.0,
    }
}

/// Monday is the heaviest collection day (weekend backlog).
pub fn weekday_factor(day: Weekday) -> f64 {
    match day {
        Weekday::Mon => 1.20,
        Weekday::Sat | Weekday::Sun => 0.85,
        _ => 1.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyTarget {
    pub base_ton: f64,
    pub seasonal_factor: f64,
    pub weekday_factor: f64,
    pub adjusted_ton: f64,
}

pub fn daily_target(table: &TonnageTable, date: NaiveDate) -> DailyTarget {
    let base_ton = table.daily_tonnage(date);
    let seasonal = seasonal_factor(date.month());
    let weekday = weekday_factor(date.weekday());

    DailyTarget {
        base_ton,
        seasonal_factor: seasonal,
        weekday_factor: weekday,
        adjusted_ton: base_ton * seasonal * weekday,
    }
}

/// Splits the day's target across scheduled neighborhoods.
///
/// Proportional to population among scheduled neighborhoods present in the
/// population table. A scheduled neighborhood missing from that table gets
/// `target / (2 * scheduled)`. When population covers none of them (or sums
/// to zero) the target is split equally.
pub fn distribute_to_neighborhoods(
    target_ton: f64,
    population: &HashMap<String, u64>,
    scheduled: &[String],
) -> BTreeMap<String, f64> {
    if scheduled.is_empty() {
        return BTreeMap::new();
    }

    let covered: Vec<(&String, u64)> = scheduled
        .iter()
        .filter_map(|name| population.get(name).map(|pop| (name, *pop)))
        .collect();
    let total_pop: u64 = covered.iter().map(|(_, pop)| pop).sum();

    if covered.is_empty() || total_pop == 0 {
        let share = target_ton / scheduled.len() as f64;
        return scheduled.iter().map(|name| (name.clone(), share)).collect();
    }

    let mut allocation: BTreeMap<String, f64> = covered
        .into_iter()
        .map(|(name, pop)| (name.clone(), target_ton * pop as f64 / total_pop as f64))
        .collect();

    let floor_share = target_ton / (scheduled.len() as f64 * 2.0);
    for name in scheduled {
        allocation.entry(name.clone()).or_insert(floor_share);
    }

    allocation
}

/// Physical capacity estimate (tons) of a point's container.
pub fn container_capacity_ton(point: &CollectionPoint) -> f64 {
    if point.is_underground {
        UNDERGROUND_CAPACITY_TON
    } else if point.container_type.contains("770") {
        BIN_770_CAPACITY_TON
    } else if point.container_type.contains("400") {
        BIN_400_CAPACITY_TON
    } else {
        DEFAULT_BIN_CAPACITY_TON
    }
}

/// Allocates each neighborhood's tonnage to its points by capacity share.
///
/// The result is parallel to `points`. Each demand is clamped to
/// `[DEMAND_FLOOR_FRACTION, DEMAND_CEILING_FRACTION] * capacity`; points in
/// neighborhoods without an allocation therefore sit at the floor.
pub fn distribute_to_points(points: &[CollectionPoint], allocation: &BTreeMap<String, f64>) -> Vec<f64> {
    let capacities: Vec<f64> = points.iter().map(container_capacity_ton).collect();

    let mut total_capacity: HashMap<&str, f64> = HashMap::new();
    for (point, capacity) in points.iter().zip(&capacities) {
        *total_capacity.entry(point.neighborhood.as_str()).or_default() += capacity;
    }

    points
        .iter()
        .zip(&capacities)
        .map(|(point, &capacity)| {
            let neighborhood_ton = allocation.get(&point.neighborhood).copied().unwrap_or(0.0);
            let total = match total_capacity[point.neighborhood.as_str()] {
                t if t > 0.0 => t,
                _ => 1.0,
            };
            let raw = neighborhood_ton * capacity / total;
            raw.min(capacity * DEMAND_CEILING_FRACTION)
                .max(capacity * DEMAND_FLOOR_FRACTION)
        })
        .collect()
}
