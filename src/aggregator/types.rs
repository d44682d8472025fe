//! Data types used by the aggregation pipeline.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::utility::parse_instant;
use crate::parser::Resource;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PredictionAttributes {
    #[serde(default)]
    pub(crate) arrival_time: Option<String>,
    #[serde(default)]
    pub(crate) departure_time: Option<String>,
    #[serde(default)]
    pub(crate) direction_id: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TripAttributes {
    #[serde(default)]
    pub(crate) headsign: Option<String>,
}

/// One upstream prediction, reduced to what the display needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRecord {
    pub route_id: String,
    pub trip_id: Option<String>,
    /// Arrival time, or departure time when the stop is a terminus.
    pub time: DateTime<Utc>,
    pub direction_id: Option<u8>,
}

impl PredictionRecord {
    /// Extracts a record from a raw `prediction` resource.
    ///
    /// Returns `None` when the route, the timestamp, or the resource shape
    /// itself is missing or invalid.
    pub fn from_value(value: &Value) -> Option<Self> {
        let resource = Resource::<PredictionAttributes>::from_value(value)?;
        let route_id = resource.related_id("route")?.to_string();
        let trip_id = resource.related_id("trip").map(str::to_string);

        let attrs = &resource.attributes;
        let raw_time = [&attrs.arrival_time, &attrs.departure_time]
            .into_iter()
            .flatten()
            .find(|t| !t.trim().is_empty())?;
        let time = parse_instant(raw_time)?;

        let direction_id = attrs
            .direction_id
            .as_ref()
            .and_then(Value::as_u64)
            .and_then(|d| u8::try_from(d).ok());

        Some(Self {
            route_id,
            trip_id,
            time,
            direction_id,
        })
    }
}

/// A single displayed arrival.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Arrival {
    pub minutes: i64,
    pub headsign: String,
}

/// Nearest arrivals for one display group, soonest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBucket {
    pub group: String,
    pub arrivals: Vec<Arrival>,
}

/// Everything shown for one configured station in one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationBoard {
    pub station: String,
    pub buckets: Vec<DisplayBucket>,
}

impl StationBoard {
    pub fn empty(station: &str) -> Self {
        Self {
            station: station.to_string(),
            buckets: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
