//! Road line geometry as a decoded vertex sequence.
//!
//! GeoJSON stores positions as `[lon, lat]`; a [`Polyline`] always holds
//! `(lat, lon)` so it lines up with every other coordinate in the planner.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Creates a new Polyline from (lat, lon) points.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Builds a polyline from GeoJSON `[lon, lat, ..]` positions.
    ///
    /// Positions with fewer than two ordinates are ignored.
    pub fn from_lon_lat(positions: &[Vec<f64>]) -> Self {
        let points = positions
            .iter()
            .filter(|p| p.len() >= 2)
            .map(|p| (p[1], p[0]))
            .collect();
        Self { points }
    }

    /// Concatenates several line parts into one vertex sequence.
    pub fn flatten(parts: impl IntoIterator<Item = Polyline>) -> Self {
        let points = parts.into_iter().flat_map(Polyline::into_points).collect();
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    /// Representative coordinate of the line: the vertex at `len / 2`.
    ///
    /// Lines with fewer than two vertices have no segment and return `None`.
    pub fn midpoint(&self) -> Option<(f64, f64)> {
        if self.points.len() < 2 {
            return None;
        }
        Some(self.points[self.points.len() / 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lon_lat_swaps_order() {
        let polyline = Polyline::from_lon_lat(&[vec![30.55, 37.76], vec![30.56, 37.77]]);
        assert_eq!(polyline.points(), &[(37.76, 30.55), (37.77, 30.56)]);
    }

    #[test]
    fn test_midpoint_odd_and_even() {
        let three = Polyline::new(vec![(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        assert_eq!(three.midpoint(), Some((2.0, 2.0)));

        let four = Polyline::new(vec![(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]);
        assert_eq!(four.midpoint(), Some((3.0, 3.0)));
    }

    #[test]
    fn test_single_vertex_has_no_midpoint() {
        assert_eq!(Polyline::new(vec![(1.0, 2.0)]).midpoint(), None);
        assert_eq!(Polyline::new(vec![]).midpoint(), None);
    }

    #[test]
    fn test_flatten_multi_line() {
        let merged = Polyline::flatten(vec![
            Polyline::new(vec![(1.0, 1.0), (2.0, 2.0)]),
            Polyline::new(vec![(3.0, 3.0)]),
        ]);
        assert_eq!(merged.points().len(), 3);
        assert_eq!(merged.midpoint(), Some((2.0, 2.0)));
    }

    #[test]
    fn test_short_positions_skipped() {
        let polyline = Polyline::from_lon_lat(&[vec![30.0], vec![30.5, 37.5, 1100.0]]);
        assert_eq!(polyline.points(), &[(37.5, 30.5)]);
    }
}
