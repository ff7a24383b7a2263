//! Everything a planning run reads, loaded once and passed by reference.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::demand::TonnageTable;
use crate::distance::NeighborhoodDistanceIndex;
use crate::error::PlannerError;
use crate::input::{self, RotationSchedule, StartPosition};
use crate::point::CollectionPoint;
use crate::scorer::AssignmentScorer;
use crate::street_width::StreetWidthIndex;
use crate::traits::{Located, StreetWidthLookup};
use crate::vehicle::{FleetVehicle, log_fleet_summary};

#[derive(Debug, Clone)]
pub struct PlanningContext {
    /// Every loaded point, widths and population tiers assigned.
    pub points: Vec<CollectionPoint>,
    pub population: HashMap<String, u64>,
    pub rotation: RotationSchedule,
    pub fleet: Vec<FleetVehicle>,
    pub tonnages: TonnageTable,
    pub start_positions: BTreeMap<u64, StartPosition>,
    pub distances: NeighborhoodDistanceIndex,
    pub scorer: AssignmentScorer,
}

fn open(path: &Path) -> Result<BufReader<File>, PlannerError> {
    debug!(path = %path.display(), "opening input");
    Ok(BufReader::new(File::open(path)?))
}

impl PlanningContext {
    /// In-memory context with an empty schedule, default tonnage and base
    /// scorer weights. Points keep whatever width and tier they carry.
    pub fn new(points: Vec<CollectionPoint>, fleet: Vec<FleetVehicle>) -> Self {
        let distances = NeighborhoodDistanceIndex::build(&points);
        Self {
            points,
            population: HashMap::new(),
            rotation: RotationSchedule::new(),
            fleet,
            tonnages: TonnageTable::new(),
            start_positions: BTreeMap::new(),
            distances,
            scorer: AssignmentScorer::default(),
        }
    }

    /// Sets the population table and re-tags every point's tier.
    pub fn with_population(mut self, population: HashMap<String, u64>, threshold: u64) -> Self {
        self.points = self
            .points
            .into_iter()
            .map(|point| {
                let count = population.get(&point.neighborhood).copied().unwrap_or(0);
                point.with_population(count, threshold)
            })
            .collect();
        self.population = population;
        self
    }

    pub fn with_rotation(mut self, rotation: RotationSchedule) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_tonnages(mut self, tonnages: TonnageTable) -> Self {
        self.tonnages = tonnages;
        self
    }

    pub fn with_start_positions(mut self, start_positions: BTreeMap<u64, StartPosition>) -> Self {
        self.start_positions = start_positions;
        self
    }

    pub fn with_scorer(mut self, scorer: AssignmentScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Assigns every point's street width from `lookup` in one batch.
    ///
    /// An empty lookup leaves widths unassigned (0.0), which no vehicle
    /// accepts.
    pub fn assign_street_widths<L: StreetWidthLookup>(mut self, lookup: &L) -> Self {
        let locations: Vec<(f64, f64)> = self.points.iter().map(Located::location).collect();
        match lookup.widths_for(&locations) {
            Some(widths) => {
                for (point, width) in self.points.iter_mut().zip(widths) {
                    point.street_width = width;
                }
            }
            None => warn!(points = self.points.len(), "no street widths available, all points unassigned"),
        }
        self
    }

    /// Reads every input table and cache named by `config`.
    ///
    /// When a start-position file exists, the fleet is restricted to the
    /// vehicles it lists.
    pub fn load(config: &PlannerConfig) -> Result<Self, PlannerError> {
        let data = &config.data;
        let caches = &config.caches;

        let points = input::read_collection_points(open(&config.path(&data.collection_points))?)?;
        let population = input::read_population(open(&config.path(&data.population))?)?;
        let rotation = input::read_rotation(open(&config.path(&data.rotation))?)?;
        let tonnages = input::read_tonnages(open(&config.path(&data.tonnages))?)?;
        let mut fleet = input::read_fleet(open(&config.path(&data.fleet))?)?;

        let start_path = config.path(&data.start_positions);
        let start_positions = if start_path.exists() {
            let positions = input::read_start_positions(open(&start_path)?)?;
            fleet.retain(|vehicle| positions.contains_key(&vehicle.id));
            info!(active_vehicles = fleet.len(), "fleet restricted to vehicles with start positions");
            positions
        } else {
            warn!(path = %start_path.display(), "no start positions, every vehicle uses the default start");
            BTreeMap::new()
        };
        log_fleet_summary(&fleet);

        let widths = StreetWidthIndex::load_or_build(
            &config.path(&caches.street_width),
            &config.path(&data.road_geometry),
        )?;
        let distances =
            NeighborhoodDistanceIndex::load_or_build(&config.path(&caches.neighborhood_distances), &points)?;
        let scorer = AssignmentScorer::load_or_train(&config.path(&caches.scorer_weights), config.scorer_seed)?;

        let context = Self {
            points,
            population: HashMap::new(),
            rotation,
            fleet,
            tonnages,
            start_positions,
            distances,
            scorer,
        }
        .with_population(population, config.simulation.population_threshold)
        .assign_street_widths(&widths);

        info!(
            points = context.points.len(),
            collectible = context.points.iter().filter(|p| p.is_collectible).count(),
            underground = context.points.iter().filter(|p| p.is_underground).count(),
            high_pop = context.points.iter().filter(|p| p.is_high_pop).count(),
            neighborhoods = context.distances.len(),
            "planning context ready"
        );
        Ok(context)
    }
}
