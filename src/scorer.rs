//! Fixed-weight linear ranking of candidate next stops.
//!
//! Each candidate is described by an 8-feature row built relative to the
//! deciding vehicle; its score is the dot product with the weight vector.
//! Weights are the base vector plus one seeded perturbation, persisted so
//! every later run ranks identically.

use std::path::Path;

use bitcode::{Decode, Encode};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use tracing::info;

use crate::cache;
use crate::error::PlannerError;
use crate::haversine::planar_km;
use crate::point::CollectionPoint;

pub const FEATURE_COUNT: usize = 8;

pub type FeatureRow = [f64; FEATURE_COUNT];

/// Feature column order.
pub mod feature {
    pub const DISTANCE_KM: usize = 0;
    pub const DEMAND_TON: usize = 1;
    pub const LOAD_RATIO: usize = 2;
    pub const PEAK_PENALTY: usize = 3;
    pub const UNLOAD_DISTANCE_KM: usize = 4;
    pub const PROXIMITY_BONUS: usize = 5;
    pub const CAPACITY_MATCH_BONUS: usize = 6;
    pub const STREET_MARGIN_BONUS: usize = 7;
}

pub const BASE_WEIGHTS: FeatureRow = [-2.0, 2.5, -0.5, -100.0, -0.3, 3.0, 1.5, 2.0];

/// Weight given to features a persisted vector predates.
pub const PAD_WEIGHT: f64 = 2.0;

/// Peak-penalty feature value for a high-population point during a peak hour.
pub const PEAK_PENALTY_VALUE: f64 = 10.0;

const PERTURBATION_STD_DEV: f64 = 0.05;
const VERY_CLOSE_KM: f64 = 0.5;
const CAPACITY_MATCH_MIN: f64 = 0.05;
const CAPACITY_MATCH_MAX: f64 = 0.30;
const STREET_MARGIN_BONUS_M: f64 = 2.0;

/// Vehicle-side inputs shared by every candidate row in one decision.
#[derive(Debug, Clone, Copy)]
pub struct DecisionState {
    pub position: (f64, f64),
    pub load_ton: f64,
    pub capacity_ton: f64,
    pub min_street_width: f64,
    pub peak_hour: bool,
    pub unload_position: (f64, f64),
}

fn flag(condition: bool) -> f64 {
    if condition { 1.0 } else { 0.0 }
}

/// Builds the feature row for one candidate point with its allocated demand.
pub fn feature_row(state: &DecisionState, point: &CollectionPoint, demand_ton: f64) -> FeatureRow {
    let location = (point.lat, point.lon);
    let distance_km = planar_km(state.position, location);
    let capacity_share = demand_ton / state.capacity_ton;
    let street_margin = point.street_width - state.min_street_width;

    let mut row = [0.0; FEATURE_COUNT];
    row[feature::DISTANCE_KM] = distance_km;
    row[feature::DEMAND_TON] = demand_ton;
    row[feature::LOAD_RATIO] = state.load_ton / state.capacity_ton;
    row[feature::PEAK_PENALTY] = if state.peak_hour && point.is_high_pop { PEAK_PENALTY_VALUE } else { 0.0 };
    row[feature::UNLOAD_DISTANCE_KM] = planar_km(location, state.unload_position);
    row[feature::PROXIMITY_BONUS] = flag(distance_km < VERY_CLOSE_KM);
    row[feature::CAPACITY_MATCH_BONUS] =
        flag(capacity_share > CAPACITY_MATCH_MIN && capacity_share < CAPACITY_MATCH_MAX);
    row[feature::STREET_MARGIN_BONUS] = flag(street_margin > STREET_MARGIN_BONUS_M);
    row
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
struct StoredWeights {
    weights: Vec<f64>,
    trained: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentScorer {
    weights: FeatureRow,
}

impl Default for AssignmentScorer {
    fn default() -> Self {
        Self { weights: BASE_WEIGHTS }
    }
}

impl AssignmentScorer {
    /// Base weights plus one draw of N(0, 0.05) per weight from `seed`.
    pub fn perturbed(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut weights = BASE_WEIGHTS;
        for weight in weights.iter_mut() {
            let z: f64 = StandardNormal.sample(&mut rng);
            *weight += z * PERTURBATION_STD_DEV;
        }
        Self { weights }
    }

    /// Builds a scorer from a stored vector.
    ///
    /// A shorter vector (saved before newer features existed) is padded with
    /// [`PAD_WEIGHT`]; extra trailing weights are ignored.
    pub fn from_weights(stored: &[f64]) -> Self {
        let mut weights = [PAD_WEIGHT; FEATURE_COUNT];
        for (slot, value) in weights.iter_mut().zip(stored) {
            *slot = *value;
        }
        Self { weights }
    }

    /// Loads persisted weights, or perturbs the base vector and persists it.
    pub fn load_or_train(path: &Path, seed: u64) -> Result<Self, PlannerError> {
        let stored: StoredWeights = cache::load_or_build(path, || {
            let scorer = Self::perturbed(seed);
            Ok(StoredWeights { weights: scorer.weights.to_vec(), trained: true })
        })?;

        let scorer = Self::from_weights(&stored.weights);
        info!(weights = ?scorer.weights, "scorer weights ready");
        Ok(scorer)
    }

    pub fn weights(&self) -> &FeatureRow {
        &self.weights
    }

    pub fn score(&self, row: &FeatureRow) -> f64 {
        row.iter().zip(&self.weights).map(|(x, w)| x * w).sum()
    }

    pub fn score_batch(&self, rows: &[FeatureRow]) -> Vec<f64> {
        rows.iter().map(|row| self.score(row)).collect()
    }

    /// Index of the highest-scoring row; ties go to the lowest index.
    pub fn select(&self, rows: &[FeatureRow]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, score) in self.score_batch(rows).into_iter().enumerate() {
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((index, score)),
            }
        }
        best.map(|(index, _)| index)
    }
}
