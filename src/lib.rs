//! Daily waste-collection route planning.
//!
//! Loads containers, fleet, schedules and tonnage statistics into a
//! [`context::PlanningContext`], then simulates one day of greedy,
//! capacity- and access-aware collection with [`planner::plan_day`].

pub mod cache;
pub mod config;
pub mod context;
pub mod demand;
pub mod distance;
pub mod error;
pub mod haversine;
pub mod input;
pub mod output;
pub mod planner;
pub mod point;
pub mod polyline;
pub mod scorer;
pub mod street_width;
pub mod text;
pub mod traits;
pub mod vehicle;

pub use context::PlanningContext;
pub use error::PlannerError;
pub use planner::{PlanOptions, PlanResult, plan_day};
