//! Distance helpers used throughout planning.
//!
//! Two metrics coexist on purpose: great-circle distance for depot trips
//! and the neighborhood table, and a planar degree-scaled approximation for
//! candidate ranking and container-to-container travel. Both operate on
//! raw (lat, lon) degrees.

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Kilometers per degree used by the planar approximation.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Straight-line to road distance multiplier.
pub const DEFAULT_DETOUR_FACTOR: f64 = 1.3;

/// Great-circle distance between two (lat, lon) points in kilometers.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Euclidean distance on raw degrees scaled to kilometers.
///
/// Ignores longitude convergence; acceptable at city scale.
pub fn planar_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let d_lat = to.0 - from.0;
    let d_lon = to.1 - from.1;
    (d_lat * d_lat + d_lon * d_lon).sqrt() * KM_PER_DEGREE
}

/// Travel minutes for a straight-line distance after road detour scaling.
pub fn travel_minutes(straight_km: f64, detour_factor: f64, speed_kmh: f64) -> f64 {
    straight_km * detour_factor / speed_kmh * 60.0
}
