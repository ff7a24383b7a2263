//! Planner configuration: where inputs and caches live and the simulation
//! constants.
//!
//! Every field has a default, so a JSON config only needs to name what
//! differs:
//!
//! ```json
//! { "data": { "data_dir": "full_dataset" }, "simulation": { "avg_speed_kmh": 22.0 } }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::PlannerError;
use crate::planner::PlanOptions;

/// Input table locations, relative to `data_dir` unless absolute.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    pub data_dir: PathBuf,
    pub collection_points: PathBuf,
    pub road_geometry: PathBuf,
    pub rotation: PathBuf,
    pub tonnages: PathBuf,
    pub population: PathBuf,
    pub fleet: PathBuf,
    /// Optional; when the file is absent every fleet vehicle starts at the
    /// default start position.
    pub start_positions: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("full_dataset"),
            collection_points: PathBuf::from("container/konteyner_tipli.csv"),
            road_geometry: PathBuf::from("roads.geojson"),
            rotation: PathBuf::from("neighbor_days_rotations.csv"),
            tonnages: PathBuf::from("tonnages.csv"),
            population: PathBuf::from("mahalle_nufus.csv"),
            fleet: PathBuf::from("fleet.csv"),
            start_positions: PathBuf::from("vehicle_start_positions.json"),
        }
    }
}

impl DataPaths {
    pub fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() { file.to_path_buf() } else { self.data_dir.join(file) }
    }
}

/// Cache file locations, resolved against `DataPaths::data_dir`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CachePaths {
    pub street_width: PathBuf,
    pub neighborhood_distances: PathBuf,
    pub scorer_weights: PathBuf,
}

impl Default for CachePaths {
    fn default() -> Self {
        Self {
            street_width: PathBuf::from("street_width_cache.bin"),
            neighborhood_distances: PathBuf::from("distance_matrix_cache.bin"),
            scorer_weights: PathBuf::from("route_scorer_weights.bin"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub data: DataPaths,
    pub caches: CachePaths,
    pub simulation: PlanOptions,
    /// Seed for the one-off scorer weight perturbation.
    pub scorer_seed: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            data: DataPaths::default(),
            caches: CachePaths::default(),
            simulation: PlanOptions::default(),
            scorer_seed: 42,
        }
    }
}

impl PlannerConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, PlannerError> {
        let reader = BufReader::new(File::open(path)?);
        let config: PlannerConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PlannerError> {
        let sim = &self.simulation;
        if sim.avg_speed_kmh.is_nan() || sim.avg_speed_kmh <= 0.0 {
            return Err(PlannerError::InvalidConfig("avg_speed_kmh must be positive".into()));
        }
        if sim.detour_factor.is_nan() || sim.detour_factor < 1.0 {
            return Err(PlannerError::InvalidConfig("detour_factor must be at least 1".into()));
        }
        if sim.day_start_hour >= sim.day_end_hour || sim.day_end_hour > 24 {
            return Err(PlannerError::InvalidConfig(format!(
                "day window {}..{} is empty or past midnight",
                sim.day_start_hour, sim.day_end_hour
            )));
        }
        if sim.unload_wait_min < 0.0 || sim.service_sec < 0.0 {
            return Err(PlannerError::InvalidConfig("durations must not be negative".into()));
        }
        Ok(())
    }

    pub fn path(&self, file: &Path) -> PathBuf {
        self.data.resolve(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::PeakRecheckPolicy;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();
        assert_eq!(config.simulation.start_neighborhood, "ALAADDINBEY");
        assert_eq!(config.simulation.unload_neighborhood, "YENIKENT");
        assert_eq!(config.simulation.avg_speed_kmh, 25.0);
        assert_eq!(config.simulation.day_start_hour, 6);
        assert_eq!(config.simulation.day_end_hour, 23);
        assert_eq!(config.scorer_seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planner.json");
        std::fs::write(
            &path,
            r#"{
                "data": { "data_dir": "/srv/waste" },
                "simulation": { "avg_speed_kmh": 20.0, "peak_recheck": "requeue" }
            }"#,
        )
        .unwrap();

        let config = PlannerConfig::from_json_file(&path).unwrap();
        assert_eq!(config.simulation.avg_speed_kmh, 20.0);
        assert_eq!(config.simulation.peak_recheck, PeakRecheckPolicy::Requeue);
        assert_eq!(config.simulation.unload_wait_min, 10.0);
        assert_eq!(config.path(&config.data.fleet), PathBuf::from("/srv/waste/fleet.csv"));
    }

    #[test]
    fn test_invalid_speed_rejected() {
        let mut config = PlannerConfig::default();
        config.simulation.avg_speed_kmh = 0.0;
        assert!(matches!(config.validate(), Err(PlannerError::InvalidConfig(_))));
    }

    #[test]
    fn test_inverted_day_rejected() {
        let mut config = PlannerConfig::default();
        config.simulation.day_start_hour = 23;
        config.simulation.day_end_hour = 6;
        assert!(config.validate().is_err());
    }
}
