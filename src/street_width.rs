//! Street-width resolution for collection points.
//!
//! Each road feature contributes one representative coordinate (its
//! midpoint vertex) and a width. Queries return the width of the nearest
//! representative by planar distance on raw (lat, lon) degrees, which is
//! the behavior the access rules were calibrated against.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use bitcode::{Decode, Encode};
use rayon::prelude::*;
use rstar::RTree;
use rstar::primitives::GeomWithData;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::cache;
use crate::error::PlannerError;
use crate::polyline::Polyline;
use crate::text::normalize_text;
use crate::traits::StreetWidthLookup;

/// Width used when a feature's width is missing, malformed or implausible.
pub const DEFAULT_STREET_WIDTH_M: f64 = 6.0;

/// Widths above this are treated as data errors.
pub const MAX_PLAUSIBLE_WIDTH_M: f64 = 50.0;

/// Streets narrower than this are reported as narrow in statistics.
pub const NARROW_STREET_M: f64 = 5.0;

const WIDTH_KEYS: &[&str] = &["Genişlik(m)", "width"];
const NEIGHBORHOOD_KEYS: &[&str] = &["İdari Mahalle Adı", "neighborhood"];

/// A road feature reduced to its representative coordinate.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct RoadSegment {
    pub lat: f64,
    pub lon: f64,
    pub width_m: f64,
    pub neighborhood: String,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

impl Geometry {
    fn polyline(&self) -> Option<Polyline> {
        match self.kind.as_str() {
            "LineString" => {
                let positions: Vec<Vec<f64>> = serde_json::from_value(self.coordinates.clone()).ok()?;
                Some(Polyline::from_lon_lat(&positions))
            }
            "MultiLineString" => {
                let lines: Vec<Vec<Vec<f64>>> = serde_json::from_value(self.coordinates.clone()).ok()?;
                Some(Polyline::flatten(lines.iter().map(|line| Polyline::from_lon_lat(line))))
            }
            _ => None,
        }
    }
}

/// Parses a width property, substituting the default for bad values.
///
/// Accepts numbers and strings with either decimal separator. Zero,
/// negative, non-finite and values above [`MAX_PLAUSIBLE_WIDTH_M`] are
/// replaced.
pub fn parse_width(raw: Option<&Value>) -> f64 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(width) if width.is_finite() && width > 0.0 && width <= MAX_PLAUSIBLE_WIDTH_M => width,
        _ => DEFAULT_STREET_WIDTH_M,
    }
}

fn first_property<'a>(properties: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| properties.get(*key))
}

/// Extracts road segments from a GeoJSON feature collection.
///
/// Only `LineString` and `MultiLineString` geometries with at least two
/// vertices yield a segment.
pub fn read_road_geometry<R: Read>(reader: R) -> Result<Vec<RoadSegment>, PlannerError> {
    let collection: FeatureCollection = serde_json::from_reader(reader)?;
    let empty = Map::new();

    let segments = collection
        .features
        .iter()
        .filter_map(|feature| {
            let (lat, lon) = feature.geometry.as_ref()?.polyline()?.midpoint()?;
            let properties = feature.properties.as_ref().unwrap_or(&empty);
            let neighborhood = first_property(properties, NEIGHBORHOOD_KEYS)
                .and_then(Value::as_str)
                .map(normalize_text)
                .unwrap_or_default();

            Some(RoadSegment {
                lat,
                lon,
                width_m: parse_width(first_property(properties, WIDTH_KEYS)),
                neighborhood,
            })
        })
        .collect();

    Ok(segments)
}

/// Nearest-segment width index.
#[derive(Debug)]
pub struct StreetWidthIndex {
    tree: RTree<GeomWithData<[f64; 2], f64>>,
}

impl StreetWidthIndex {
    /// Builds the index; an empty segment list is an error since no width
    /// could ever be resolved.
    pub fn from_segments(segments: &[RoadSegment]) -> Result<Self, PlannerError> {
        if segments.is_empty() {
            return Err(PlannerError::EmptyRoadGeometry);
        }

        let entries = segments
            .iter()
            .map(|segment| GeomWithData::new([segment.lat, segment.lon], segment.width_m))
            .collect();
        log_width_stats(segments);

        Ok(Self { tree: RTree::bulk_load(entries) })
    }

    /// Loads segments from the cache at `cache_path`, or parses the GeoJSON
    /// at `geometry_path` and persists them.
    pub fn load_or_build(cache_path: &Path, geometry_path: &Path) -> Result<Self, PlannerError> {
        let segments: Vec<RoadSegment> = cache::load_or_build(cache_path, || {
            let reader = BufReader::new(File::open(geometry_path)?);
            let segments = read_road_geometry(reader)?;
            info!(segments = segments.len(), path = %geometry_path.display(), "parsed road geometry");
            Ok(segments)
        })?;
        Self::from_segments(&segments)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl StreetWidthLookup for StreetWidthIndex {
    fn width_at(&self, lat: f64, lon: f64) -> Option<f64> {
        self.tree.nearest_neighbor(&[lat, lon]).map(|nearest| nearest.data)
    }

    fn widths_for(&self, locations: &[(f64, f64)]) -> Option<Vec<f64>> {
        locations
            .par_iter()
            .map(|(lat, lon)| self.width_at(*lat, *lon))
            .collect()
    }
}

fn log_width_stats(segments: &[RoadSegment]) {
    let count = segments.len() as f64;
    let min = segments.iter().map(|s| s.width_m).fold(f64::INFINITY, f64::min);
    let max = segments.iter().map(|s| s.width_m).fold(f64::NEG_INFINITY, f64::max);
    let mean = segments.iter().map(|s| s.width_m).sum::<f64>() / count;
    let narrow = segments.iter().filter(|s| s.width_m < NARROW_STREET_M).count();

    info!(
        segments = segments.len(),
        min_width_m = min,
        max_width_m = max,
        mean_width_m = mean,
        narrow,
        "street width index built"
    );
}
