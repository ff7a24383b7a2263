//! Seam traits shared by the planning components.
//!
//! Kept minimal so tests can substitute hand-built lookups for the
//! geometry-backed implementations.

/// Anything with a (lat, lon) coordinate.
pub trait Located {
    /// Location coordinates (lat, lon).
    fn location(&self) -> (f64, f64);
}

impl Located for (f64, f64) {
    fn location(&self) -> (f64, f64) {
        *self
    }
}

/// Resolves the street width (meters) at a coordinate.
pub trait StreetWidthLookup {
    /// Width of the nearest known street, or `None` when the lookup holds
    /// no geometry at all.
    fn width_at(&self, lat: f64, lon: f64) -> Option<f64>;

    /// Batched variant; the result is parallel to `locations`.
    fn widths_for(&self, locations: &[(f64, f64)]) -> Option<Vec<f64>> {
        locations
            .iter()
            .map(|(lat, lon)| self.width_at(*lat, *lon))
            .collect()
    }
}
