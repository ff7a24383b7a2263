//! Collection points and the flags derived from their container type.

use serde::Serialize;

use crate::text::normalize_text;
use crate::traits::Located;

/// Container-type keywords marking an underground (crane-only) container.
const UNDERGROUND_KEYWORDS: &[&str] = &["YERALTI", "UNDERGROUND"];

/// Container-type keywords marking a point that is not collected.
const UNCOLLECTIBLE_KEYWORDS: &[&str] = &["BILINMIYOR", "UNKNOWN"];

/// Container type recorded when the input has none.
pub const UNKNOWN_CONTAINER_TYPE: &str = "UNKNOWN";

pub fn is_underground_type(container_type: &str) -> bool {
    let folded = normalize_text(container_type);
    UNDERGROUND_KEYWORDS.iter().any(|k| folded.contains(k))
}

pub fn is_collectible_type(container_type: &str) -> bool {
    let folded = normalize_text(container_type);
    !UNCOLLECTIBLE_KEYWORDS.iter().any(|k| folded.contains(k))
}

/// A waste container at a fixed location.
///
/// `street_width` starts at `0.0` (unassigned), which no vehicle category
/// accepts; the planning context assigns it once from the width index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionPoint {
    /// Position in the loaded collection-point table.
    pub id: usize,
    pub lat: f64,
    pub lon: f64,
    /// Normalized neighborhood name.
    pub neighborhood: String,
    /// Upper-cased container type tag.
    pub container_type: String,
    pub is_underground: bool,
    pub is_collectible: bool,
    pub population: u64,
    pub is_high_pop: bool,
    pub street_width: f64,
}

impl CollectionPoint {
    pub fn new(id: usize, lat: f64, lon: f64, neighborhood: &str, container_type: &str) -> Self {
        let container_type = match container_type.trim() {
            "" => UNKNOWN_CONTAINER_TYPE.to_string(),
            tag => tag.to_uppercase(),
        };

        Self {
            id,
            lat,
            lon,
            neighborhood: normalize_text(neighborhood),
            is_underground: is_underground_type(&container_type),
            is_collectible: is_collectible_type(&container_type),
            container_type,
            population: 0,
            is_high_pop: false,
            street_width: 0.0,
        }
    }

    pub fn with_street_width(mut self, width_m: f64) -> Self {
        self.street_width = width_m;
        self
    }

    /// Sets population and the high-population tier (`population >= threshold`).
    pub fn with_population(mut self, population: u64, threshold: u64) -> Self {
        self.population = population;
        self.is_high_pop = population >= threshold;
        self
    }
}

impl Located for CollectionPoint {
    fn location(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}
