//! Neighborhood-level road distance estimates.
//!
//! Each neighborhood is reduced to the mean coordinate of its collection
//! points; pairwise great-circle distances between centroids, scaled by the
//! detour factor, approximate road distance for macro-level estimates.

use std::collections::BTreeMap;
use std::path::Path;

use bitcode::{Decode, Encode};
use rayon::prelude::*;
use tracing::info;

use crate::cache;
use crate::error::PlannerError;
use crate::haversine::{DEFAULT_DETOUR_FACTOR, haversine_km};
use crate::point::CollectionPoint;
use crate::traits::Located;

/// Symmetric centroid distance table, names sorted ascending.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct NeighborhoodDistanceIndex {
    names: Vec<String>,
    centroids: Vec<(f64, f64)>,
    /// Row-major `names.len()` x `names.len()` matrix in kilometers.
    distances_km: Vec<f64>,
}

impl NeighborhoodDistanceIndex {
    pub fn build(points: &[CollectionPoint]) -> Self {
        let mut sums: BTreeMap<&str, (f64, f64, usize)> = BTreeMap::new();
        for point in points {
            let (lat, lon) = point.location();
            let entry = sums.entry(point.neighborhood.as_str()).or_insert((0.0, 0.0, 0));
            entry.0 += lat;
            entry.1 += lon;
            entry.2 += 1;
        }

        let names: Vec<String> = sums.keys().map(|name| name.to_string()).collect();
        let centroids: Vec<(f64, f64)> = sums
            .values()
            .map(|(lat, lon, count)| (lat / *count as f64, lon / *count as f64))
            .collect();

        let distances_km = centroids
            .par_iter()
            .flat_map_iter(|from| {
                centroids
                    .iter()
                    .map(move |to| haversine_km(*from, *to) * DEFAULT_DETOUR_FACTOR)
            })
            .collect();

        info!(neighborhoods = names.len(), "neighborhood distance table built");
        Self { names, centroids, distances_km }
    }

    pub fn load_or_build(cache_path: &Path, points: &[CollectionPoint]) -> Result<Self, PlannerError> {
        cache::load_or_build(cache_path, || Ok(Self::build(points)))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.binary_search_by(|probe| probe.as_str().cmp(name)).ok()
    }

    pub fn centroid(&self, name: &str) -> Option<(f64, f64)> {
        self.position(name).map(|i| self.centroids[i])
    }

    /// Estimated road distance between two neighborhood centroids.
    pub fn distance_km(&self, from: &str, to: &str) -> Option<f64> {
        let i = self.position(from)?;
        let j = self.position(to)?;
        Some(self.distances_km[i * self.names.len() + j])
    }

    /// Sums centroid distances over consecutive distinct neighborhoods.
    ///
    /// Unknown names are skipped.
    pub fn path_estimate_km<'a>(&self, neighborhoods: impl IntoIterator<Item = &'a str>) -> f64 {
        let mut total = 0.0;
        let mut previous: Option<&str> = None;
        for name in neighborhoods {
            if self.position(name).is_none() {
                continue;
            }
            if let Some(prev) = previous {
                if prev != name {
                    total += self.distance_km(prev, name).unwrap_or(0.0);
                }
            }
            previous = Some(name);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(neighborhood: &str, lat: f64, lon: f64) -> CollectionPoint {
        CollectionPoint::new(0, lat, lon, neighborhood, "770")
    }

    fn sample() -> Vec<CollectionPoint> {
        vec![
            point("A", 37.0, 30.0),
            point("A", 37.2, 30.2),
            point("B", 37.5, 30.5),
            point("C", 37.0, 31.0),
        ]
    }

    #[test]
    fn test_centroid_is_mean() {
        let index = NeighborhoodDistanceIndex::build(&sample());
        let (lat, lon) = index.centroid("A").unwrap();
        assert!((lat - 37.1).abs() < 1e-9);
        assert!((lon - 30.1).abs() < 1e-9);
        assert!(index.centroid("Z").is_none());
    }

    #[test]
    fn test_symmetric_with_zero_diagonal() {
        let index = NeighborhoodDistanceIndex::build(&sample());
        for a in ["A", "B", "C"] {
            assert_eq!(index.distance_km(a, a), Some(0.0));
            for b in ["A", "B", "C"] {
                assert_eq!(index.distance_km(a, b), index.distance_km(b, a));
            }
        }
    }

    #[test]
    fn test_detour_scaled() {
        let index = NeighborhoodDistanceIndex::build(&sample());
        let expected = haversine_km((37.5, 30.5), (37.0, 31.0)) * 1.3;
        assert!((index.distance_km("B", "C").unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_path_estimate_skips_repeats() {
        let index = NeighborhoodDistanceIndex::build(&sample());
        let ab = index.distance_km("A", "B").unwrap();
        let bc = index.distance_km("B", "C").unwrap();
        let estimate = index.path_estimate_km(["A", "A", "B", "UNKNOWN", "B", "C"]);
        assert!((estimate - (ab + bc)).abs() < 1e-9);
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("distances.bin");
        let built = NeighborhoodDistanceIndex::load_or_build(&path, &sample()).unwrap();
        // Different points: the cached table wins until the file is deleted.
        let cached = NeighborhoodDistanceIndex::load_or_build(&path, &[]).unwrap();
        assert_eq!(built, cached);
        assert_eq!(cached.len(), 3);
    }
}
