//! Time-sliced greedy route construction for one planning day.
//!
//! The day is split into fixed slots that decide which neighborhoods may be
//! served. Within a slot vehicles take turns in descending-capacity order;
//! each vehicle repeatedly scores its eligible points, drives to the best
//! one, and detours to the unload site whenever the pick would overflow it.
//! Selection never backtracks.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::PlanningContext;
use crate::demand::{DailyTarget, daily_target, distribute_to_neighborhoods, distribute_to_points};
use crate::haversine::{DEFAULT_DETOUR_FACTOR, haversine_km, planar_km, travel_minutes};
use crate::input::StartPosition;
use crate::point::CollectionPoint;
use crate::scorer::{AssignmentScorer, DecisionState, FeatureRow, feature_row};
use crate::street_width::NARROW_STREET_M;
use crate::traits::Located;
use crate::vehicle::{AccessDenied, FleetVehicle, VehicleCategory, accessible_mask, check_access};

/// Stop id of a route's synthetic start stop.
pub const START_STOP_ID: i64 = -2;
/// Stop id of a depot unload stop.
pub const UNLOAD_STOP_ID: i64 = -1;

/// What happens to a high-population point whose arrival would land in a
/// peak hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakRecheckPolicy {
    /// Mark it collected without servicing; its demand is lost for the day.
    #[default]
    Forfeit,
    /// Skip it for the rest of the vehicle's slot; it stays open for later
    /// slots and other vehicles.
    Requeue,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlanOptions {
    /// Neighborhood whose first scheduled point is the default start.
    pub start_neighborhood: String,
    /// Neighborhood whose first point is the unload site.
    pub unload_neighborhood: String,
    pub unload_wait_min: f64,
    pub avg_speed_kmh: f64,
    /// Per-stop service time in seconds.
    pub service_sec: f64,
    pub day_start_hour: u32,
    pub day_end_hour: u32,
    /// Neighborhood population at or above which points count as high-pop.
    pub population_threshold: u64,
    pub detour_factor: f64,
    pub peak_recheck: PeakRecheckPolicy,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            start_neighborhood: "ALAADDINBEY".to_string(),
            unload_neighborhood: "YENIKENT".to_string(),
            unload_wait_min: 10.0,
            avg_speed_kmh: 25.0,
            service_sec: 30.0,
            day_start_hour: 6,
            day_end_hour: 23,
            population_threshold: 15,
            detour_factor: DEFAULT_DETOUR_FACTOR,
            peak_recheck: PeakRecheckPolicy::Forfeit,
        }
    }
}

/// Neighborhood tiers a slot admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAccess {
    All,
    LowPopulation,
    HighPopulation,
}

impl SlotAccess {
    pub fn admits(self, point: &CollectionPoint) -> bool {
        match self {
            SlotAccess::All => true,
            SlotAccess::LowPopulation => !point.is_high_pop,
            SlotAccess::HighPopulation => point.is_high_pop,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub name: &'static str,
    pub start_hour: u32,
    pub end_hour: u32,
    pub access: SlotAccess,
    pub peak: bool,
}

pub const TIME_SLOTS: [TimeSlot; 5] = [
    TimeSlot { name: "early", start_hour: 6, end_hour: 7, access: SlotAccess::All, peak: false },
    TimeSlot { name: "morning peak", start_hour: 7, end_hour: 10, access: SlotAccess::LowPopulation, peak: true },
    TimeSlot { name: "daytime", start_hour: 10, end_hour: 17, access: SlotAccess::All, peak: false },
    TimeSlot { name: "evening peak", start_hour: 17, end_hour: 20, access: SlotAccess::LowPopulation, peak: true },
    TimeSlot { name: "night", start_hour: 20, end_hour: 23, access: SlotAccess::HighPopulation, peak: false },
];

/// Whether a whole clock hour falls inside a peak slot.
pub fn is_peak_hour(hour: u32) -> bool {
    TIME_SLOTS
        .iter()
        .any(|slot| slot.peak && (slot.start_hour..slot.end_hour).contains(&hour))
}

fn hour_of(time_min: f64) -> u32 {
    (time_min / 60.0).floor().max(0.0) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StopKind {
    Start,
    Unload,
    Container,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    pub kind: StopKind,
    /// Collection point id, or [`START_STOP_ID`] / [`UNLOAD_STOP_ID`].
    pub point_id: i64,
    pub neighborhood: String,
    pub lat: f64,
    pub lon: f64,
    pub container_type: String,
    pub demand_ton: f64,
    /// Simulated arrival, minutes since midnight.
    pub time_min: f64,
    /// Load after the stop, rounded to 10 kg.
    pub load_ton: f64,
    /// `None` for synthetic stops.
    pub street_width: Option<f64>,
}

impl Stop {
    pub fn hour(&self) -> u32 {
        hour_of(self.time_min)
    }

    pub fn is_container(&self) -> bool {
        self.kind == StopKind::Container
    }
}

fn round_centi(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleRoute {
    pub vehicle: FleetVehicle,
    pub start: StartPosition,
    pub stops: Vec<Stop>,
    pub collected_ton: f64,
    pub distance_km: f64,
    pub unloads: u32,
    /// Distinct points this vehicle passed over as underground.
    pub skipped_underground: usize,
    /// Distinct points this vehicle passed over as too narrow.
    pub skipped_narrow: usize,
    pub forfeited: usize,
}

impl VehicleRoute {
    pub fn container_stops(&self) -> usize {
        self.stops.iter().filter(|s| s.is_container()).count()
    }

    /// A route holding more than its start stop.
    pub fn is_active(&self) -> bool {
        self.stops.len() > 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: VehicleCategory,
    pub active_vehicles: usize,
    pub collected_ton: f64,
    pub container_stops: usize,
    pub unloads: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanSummary {
    pub scheduled_neighborhoods: usize,
    pub day_points: usize,
    pub total_demand_ton: f64,
    pub collected_points: usize,
    pub collected_ton: f64,
    pub forfeited_points: usize,
    pub distance_km: f64,
    pub unloads: u32,
    pub uncollected_underground: usize,
    pub uncollected_narrow: usize,
    /// Centroid-to-centroid estimate over each route's neighborhood sequence.
    pub neighborhood_path_km: f64,
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanResult {
    pub date: NaiveDate,
    pub target: DailyTarget,
    pub routes: Vec<VehicleRoute>,
    pub summary: PlanSummary,
}

impl PlanResult {
    fn empty(date: NaiveDate, target: DailyTarget, scheduled_neighborhoods: usize) -> Self {
        Self {
            date,
            target,
            routes: Vec::new(),
            summary: PlanSummary { scheduled_neighborhoods, ..PlanSummary::default() },
        }
    }

    pub fn active_routes(&self) -> impl Iterator<Item = &VehicleRoute> {
        self.routes.iter().filter(|r| r.is_active())
    }

    pub fn total_container_stops(&self) -> usize {
        self.routes.iter().map(VehicleRoute::container_stops).sum()
    }
}

/// Demand and collection state shared by every vehicle for one day.
#[derive(Debug, Clone)]
pub struct DailyPlan {
    pub target: DailyTarget,
    pub allocation: BTreeMap<String, f64>,
    /// Collectible points in scheduled neighborhoods, in input order.
    pub points: Vec<CollectionPoint>,
    /// Parallel to `points`.
    pub demand_ton: Vec<f64>,
    collected: Vec<bool>,
}

impl DailyPlan {
    pub fn prepare(context: &PlanningContext, target: DailyTarget, scheduled: &[String]) -> Self {
        let allocation = distribute_to_neighborhoods(target.adjusted_ton, &context.population, scheduled);

        let scheduled_set: HashSet<&str> = scheduled.iter().map(String::as_str).collect();
        let points: Vec<CollectionPoint> = context
            .points
            .iter()
            .filter(|p| p.is_collectible && scheduled_set.contains(p.neighborhood.as_str()))
            .cloned()
            .collect();
        let demand_ton = distribute_to_points(&points, &allocation);

        Self { target, allocation, collected: vec![false; points.len()], points, demand_ton }
    }

    pub fn is_collected(&self, index: usize) -> bool {
        self.collected[index]
    }

    pub fn collected_count(&self) -> usize {
        self.collected.iter().filter(|c| **c).count()
    }

    pub fn total_demand_ton(&self) -> f64 {
        self.demand_ton.iter().sum()
    }
}

/// Per-vehicle simulation record; the planner holds these in a plain array.
struct VehicleState {
    route: VehicleRoute,
    access: Vec<bool>,
    position: (f64, f64),
    load_ton: f64,
    time_min: f64,
    skipped_underground: BTreeSet<usize>,
    skipped_narrow: BTreeSet<usize>,
}

impl VehicleState {
    fn new(vehicle: &FleetVehicle, start: StartPosition, points: &[CollectionPoint], options: &PlanOptions) -> Self {
        let time_min = f64::from(options.day_start_hour) * 60.0;
        let start_stop = Stop {
            kind: StopKind::Start,
            point_id: START_STOP_ID,
            neighborhood: start.neighborhood.clone(),
            lat: start.lat,
            lon: start.lon,
            container_type: "START".to_string(),
            demand_ton: 0.0,
            time_min,
            load_ton: 0.0,
            street_width: None,
        };

        Self {
            access: accessible_mask(vehicle, points),
            position: start.location(),
            load_ton: 0.0,
            time_min,
            route: VehicleRoute {
                vehicle: vehicle.clone(),
                start,
                stops: vec![start_stop],
                collected_ton: 0.0,
                distance_km: 0.0,
                unloads: 0,
                skipped_underground: 0,
                skipped_narrow: 0,
                forfeited: 0,
            },
            skipped_underground: BTreeSet::new(),
            skipped_narrow: BTreeSet::new(),
        }
    }

    fn capacity_ton(&self) -> f64 {
        self.route.vehicle.capacity_ton
    }

    fn unload(&mut self, site: &StartPosition, options: &PlanOptions) {
        let road_km = haversine_km(self.position, site.location()) * options.detour_factor;
        self.time_min += road_km / options.avg_speed_kmh * 60.0 + options.unload_wait_min;
        self.position = site.location();
        self.load_ton = 0.0;
        self.route.distance_km += road_km;
        self.route.unloads += 1;
        self.route.stops.push(Stop {
            kind: StopKind::Unload,
            point_id: UNLOAD_STOP_ID,
            neighborhood: site.neighborhood.clone(),
            lat: site.lat,
            lon: site.lon,
            container_type: "UNLOAD".to_string(),
            demand_ton: 0.0,
            time_min: self.time_min,
            load_ton: 0.0,
            street_width: None,
        });
    }

    fn visit(&mut self, point: &CollectionPoint, demand_ton: f64, road_km: f64, arrival_min: f64) {
        self.time_min = arrival_min;
        self.position = point.location();
        self.load_ton += demand_ton;
        self.route.distance_km += road_km;
        self.route.collected_ton += demand_ton;
        self.route.stops.push(Stop {
            kind: StopKind::Container,
            point_id: point.id as i64,
            neighborhood: point.neighborhood.clone(),
            lat: point.lat,
            lon: point.lon,
            container_type: point.container_type.clone(),
            demand_ton,
            time_min: arrival_min,
            load_ton: round_centi(self.load_ton),
            street_width: Some(point.street_width),
        });
    }

    fn finish(mut self) -> VehicleRoute {
        self.route.skipped_underground = self.skipped_underground.len();
        self.route.skipped_narrow = self.skipped_narrow.len();
        self.route
    }
}

/// Candidate indices for one decision, in point order.
fn eligible_points(
    plan: &DailyPlan,
    state: &mut VehicleState,
    slot: &TimeSlot,
    deferred: &BTreeSet<usize>,
) -> Vec<usize> {
    let capacity = state.capacity_ton();
    let mut candidates = Vec::new();

    for (index, point) in plan.points.iter().enumerate() {
        if plan.collected[index] || !slot.access.admits(point) || deferred.contains(&index) {
            continue;
        }
        if slot.peak && point.is_high_pop {
            continue;
        }
        if !state.access[index] {
            match check_access(&state.route.vehicle, point) {
                Err(AccessDenied::UndergroundRequiresCrane) => {
                    state.skipped_underground.insert(index);
                }
                Err(AccessDenied::StreetTooNarrow { .. }) => {
                    state.skipped_narrow.insert(index);
                }
                Ok(()) => {}
            }
            continue;
        }
        // Larger than the whole truck: no amount of unloading helps.
        if plan.demand_ton[index] > capacity {
            continue;
        }
        candidates.push(index);
    }

    candidates
}

fn run_slot(
    state: &mut VehicleState,
    plan: &mut DailyPlan,
    slot: &TimeSlot,
    unload_site: &StartPosition,
    scorer: &AssignmentScorer,
    options: &PlanOptions,
) {
    let end_hour = slot.end_hour.min(options.day_end_hour);
    if hour_of(state.time_min) >= end_hour {
        return;
    }
    let slot_start_min = f64::from(slot.start_hour) * 60.0;
    if state.time_min < slot_start_min {
        state.time_min = slot_start_min;
    }

    let mut deferred = BTreeSet::new();
    while hour_of(state.time_min) < end_hour {
        let candidates = eligible_points(plan, state, slot, &deferred);
        if candidates.is_empty() {
            break;
        }

        let decision = DecisionState {
            position: state.position,
            load_ton: state.load_ton,
            capacity_ton: state.capacity_ton(),
            min_street_width: state.route.vehicle.min_street_width,
            peak_hour: is_peak_hour(hour_of(state.time_min)),
            unload_position: unload_site.location(),
        };
        let rows: Vec<FeatureRow> = candidates
            .iter()
            .map(|&i| feature_row(&decision, &plan.points[i], plan.demand_ton[i]))
            .collect();
        let Some(best) = scorer.select(&rows) else {
            break;
        };
        let index = candidates[best];
        let demand = plan.demand_ton[index];

        if state.load_ton + demand > state.capacity_ton() {
            state.unload(unload_site, options);
            debug!(vehicle = state.route.vehicle.id, hour = hour_of(state.time_min), "unloaded");
            if hour_of(state.time_min) >= end_hour {
                break;
            }
            continue;
        }

        let point = &plan.points[index];
        let straight_km = planar_km(state.position, point.location());
        let road_km = straight_km * options.detour_factor;
        let arrival_min = state.time_min
            + travel_minutes(straight_km, options.detour_factor, options.avg_speed_kmh)
            + options.service_sec / 60.0;

        if point.is_high_pop && is_peak_hour(hour_of(arrival_min)) {
            match options.peak_recheck {
                PeakRecheckPolicy::Forfeit => {
                    plan.collected[index] = true;
                    state.route.forfeited += 1;
                }
                PeakRecheckPolicy::Requeue => {
                    deferred.insert(index);
                }
            }
            debug!(vehicle = state.route.vehicle.id, point = point.id, policy = ?options.peak_recheck, "peak arrival");
            continue;
        }

        state.visit(point, demand, road_km, arrival_min);
        plan.collected[index] = true;

        if hour_of(state.time_min) >= options.day_end_hour {
            break;
        }
    }
}

/// Default start: first scheduled point in the start neighborhood, else the
/// first scheduled point.
fn default_start(plan: &DailyPlan, options: &PlanOptions) -> Option<StartPosition> {
    let point = plan
        .points
        .iter()
        .find(|p| p.neighborhood == options.start_neighborhood)
        .or_else(|| plan.points.first())?;
    Some(StartPosition { lat: point.lat, lon: point.lon, neighborhood: options.start_neighborhood.clone() })
}

/// Unload site: first point of the unload neighborhood across all points,
/// scheduled or not, else the default start.
fn unload_site(context: &PlanningContext, default_start: &StartPosition, options: &PlanOptions) -> StartPosition {
    match context.points.iter().find(|p| p.neighborhood == options.unload_neighborhood) {
        Some(point) => StartPosition {
            lat: point.lat,
            lon: point.lon,
            neighborhood: options.unload_neighborhood.clone(),
        },
        None => StartPosition { neighborhood: options.unload_neighborhood.clone(), ..default_start.clone() },
    }
}

/// Plans every fleet vehicle's route for `date`.
pub fn plan_day(context: &PlanningContext, date: NaiveDate, options: &PlanOptions) -> PlanResult {
    let target = daily_target(&context.tonnages, date);
    let scheduled = context.rotation.scheduled_on(date.weekday());
    info!(
        %date,
        base_ton = target.base_ton,
        seasonal = target.seasonal_factor,
        weekday = target.weekday_factor,
        adjusted_ton = target.adjusted_ton,
        neighborhoods = scheduled.len(),
        "daily target"
    );

    if scheduled.is_empty() {
        info!(%date, "no neighborhoods scheduled, empty plan");
        return PlanResult::empty(date, target, 0);
    }

    let mut plan = DailyPlan::prepare(context, target, &scheduled);
    let Some(default_start) = default_start(&plan, options) else {
        warn!(%date, "scheduled neighborhoods have no collectible points");
        return PlanResult::empty(date, target, scheduled.len());
    };
    let unload_site = unload_site(context, &default_start, options);
    info!(
        points = plan.points.len(),
        underground = plan.points.iter().filter(|p| p.is_underground).count(),
        narrow = plan.points.iter().filter(|p| p.street_width < NARROW_STREET_M).count(),
        demand_ton = plan.total_demand_ton(),
        "day points"
    );

    let mut fleet: Vec<&FleetVehicle> = context.fleet.iter().collect();
    fleet.sort_by(|a, b| b.capacity_ton.total_cmp(&a.capacity_ton));

    let mut states: Vec<VehicleState> = fleet
        .into_iter()
        .map(|vehicle| {
            let start = context
                .start_positions
                .get(&vehicle.id)
                .cloned()
                .unwrap_or_else(|| default_start.clone());
            VehicleState::new(vehicle, start, &plan.points, options)
        })
        .collect();

    for slot in &TIME_SLOTS {
        let open = (0..plan.points.len())
            .filter(|&i| !plan.collected[i] && slot.access.admits(&plan.points[i]))
            .count();
        if open == 0 {
            continue;
        }
        debug!(slot = slot.name, start = slot.start_hour, end = slot.end_hour, open, "slot");

        for state in states.iter_mut() {
            run_slot(state, &mut plan, slot, &unload_site, &context.scorer, options);
        }
    }

    let routes: Vec<VehicleRoute> = states.into_iter().map(VehicleState::finish).collect();
    let summary = summarize(context, &plan, &routes, scheduled.len());
    info!(
        collected_ton = summary.collected_ton,
        target_ton = target.adjusted_ton,
        collected_points = summary.collected_points,
        day_points = summary.day_points,
        forfeited = summary.forfeited_points,
        distance_km = summary.distance_km,
        unloads = summary.unloads,
        "plan complete"
    );

    PlanResult { date, target, routes, summary }
}

fn summarize(
    context: &PlanningContext,
    plan: &DailyPlan,
    routes: &[VehicleRoute],
    scheduled_neighborhoods: usize,
) -> PlanSummary {
    let categories = VehicleCategory::ALL
        .into_iter()
        .filter_map(|category| {
            let active: Vec<&VehicleRoute> = routes
                .iter()
                .filter(|r| r.vehicle.category == category && r.is_active())
                .collect();
            if active.is_empty() {
                return None;
            }
            Some(CategorySummary {
                category,
                active_vehicles: active.len(),
                collected_ton: active.iter().map(|r| r.collected_ton).sum(),
                container_stops: active.iter().map(|r| r.container_stops()).sum(),
                unloads: active.iter().map(|r| r.unloads).sum(),
            })
        })
        .collect();

    let uncollected: Vec<&CollectionPoint> = plan
        .points
        .iter()
        .enumerate()
        .filter(|(i, _)| !plan.collected[*i])
        .map(|(_, p)| p)
        .collect();

    let neighborhood_path_km = routes
        .iter()
        .map(|route| {
            context.distances.path_estimate_km(
                route.stops.iter().filter(|s| s.is_container()).map(|s| s.neighborhood.as_str()),
            )
        })
        .sum();

    PlanSummary {
        scheduled_neighborhoods,
        day_points: plan.points.len(),
        total_demand_ton: plan.total_demand_ton(),
        collected_points: plan.collected_count(),
        collected_ton: routes.iter().map(|r| r.collected_ton).sum(),
        forfeited_points: routes.iter().map(|r| r.forfeited).sum(),
        distance_km: routes.iter().map(|r| r.distance_km).sum(),
        unloads: routes.iter().map(|r| r.unloads).sum(),
        uncollected_underground: uncollected.iter().filter(|p| p.is_underground).count(),
        uncollected_narrow: uncollected.iter().filter(|p| p.street_width < NARROW_STREET_M).count(),
        neighborhood_path_km,
        categories,
    }
}
