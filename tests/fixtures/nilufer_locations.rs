//! Approximate neighborhood centers in Nilüfer, Bursa.
//!
//! Only used to keep generated containers at city-scale distances; the
//! planner never geocodes anything.

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lon: f64) -> Self {
        Self { name, lat, lon }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

pub const ALAADDINBEY: Location = Location::new("ALAADDINBEY", 40.2148, 28.9596);
pub const YENIKENT: Location = Location::new("YENIKENT", 40.1987, 28.8764);
pub const GORUKLE: Location = Location::new("GORUKLE", 40.2296, 28.8561);
pub const IHSANIYE: Location = Location::new("IHSANIYE", 40.2179, 28.9903);
pub const KONAK: Location = Location::new("KONAK", 40.2226, 28.9787);

pub const NEIGHBORHOODS: &[Location] = &[ALAADDINBEY, YENIKENT, GORUKLE, IHSANIYE, KONAK];
