//! Prediction aggregation.
//!
//! Raw prediction records are fetched per parent station, reduced to
//! (minutes, headsign) arrivals, collapsed into display groups and trimmed to
//! the nearest few per group.

pub mod aggregate;
pub mod board;
pub mod family;
pub mod types;
pub mod utility;

pub use aggregate::Aggregation;
pub use board::{Aggregator, BoardSettings};
pub use family::RouteFamilies;
pub use types::{Arrival, DisplayBucket, PredictionRecord, StationBoard};
