//! Error type for loading inputs and persisting planner artifacts.
//!
//! Soft failures (malformed rows, unknown widths, missing tonnage months,
//! unreadable caches) never surface here; they degrade to documented
//! defaults and are logged instead.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum PlannerError {
    Io(io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    /// A required column could not be located in a table header.
    MissingColumn { table: &'static str, column: &'static str },
    /// Road geometry produced no usable segment, so no width index exists.
    EmptyRoadGeometry,
    InvalidConfig(String),
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::Io(err) => write!(f, "I/O error: {err}"),
            PlannerError::Csv(err) => write!(f, "CSV error: {err}"),
            PlannerError::Json(err) => write!(f, "JSON error: {err}"),
            PlannerError::MissingColumn { table, column } => {
                write!(f, "table '{table}' has no '{column}' column")
            }
            PlannerError::EmptyRoadGeometry => {
                write!(f, "road geometry contains no usable line segments")
            }
            PlannerError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlannerError::Io(err) => Some(err),
            PlannerError::Csv(err) => Some(err),
            PlannerError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PlannerError {
    fn from(err: io::Error) -> Self {
        PlannerError::Io(err)
    }
}

impl From<csv::Error> for PlannerError {
    fn from(err: csv::Error) -> Self {
        PlannerError::Csv(err)
    }
}

impl From<serde_json::Error> for PlannerError {
    fn from(err: serde_json::Error) -> Self {
        PlannerError::Json(err)
    }
}
