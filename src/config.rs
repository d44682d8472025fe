//! Tracker configuration.
//!
//! Stored as a JSON object on disk; every field has a default, so an empty
//! object (or no file at all) reproduces the built-in station set:
//! ```json
//! {
//!   "stations": [
//!     { "name": "Park Street", "routes": ["Red"], "directions": ["inbound", "outbound"] }
//!   ],
//!   "poll_interval_secs": 30,
//!   "max_predictions_per_bucket": 5,
//!   "route_families": [
//!     { "label": "Green", "routes": ["Green-B", "Green-C", "Green-D", "Green-E"] }
//!   ]
//! }
//! ```

use anyhow::{Context, Result, bail, ensure};
use chrono_tz::Tz;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::fetch::DEFAULT_BASE_URL;

/// Semantic travel direction as riders name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => write!(f, "inbound"),
            Direction::Outbound => write!(f, "outbound"),
        }
    }
}

/// One configured station board.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StationTarget {
    pub name: String,
    pub routes: Vec<String>,
    #[serde(default = "StationTarget::default_directions")]
    pub directions: Vec<Direction>,
}

impl StationTarget {
    pub fn new(name: &str, routes: &[&str], directions: &[Direction]) -> Self {
        Self {
            name: name.to_string(),
            routes: routes.iter().map(|r| r.to_string()).collect(),
            directions: directions.to_vec(),
        }
    }

    fn default_directions() -> Vec<Direction> {
        vec![Direction::Inbound, Direction::Outbound]
    }

    /// Routes with duplicates removed, first occurrence kept.
    pub fn unique_routes(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for route in &self.routes {
            if !seen.contains(&route.as_str()) {
                seen.push(route.as_str());
            }
        }
        seen
    }
}

/// Route ids shown together under one label (e.g. the Green Line branches).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteFamily {
    pub label: String,
    pub routes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "Config::default_stations")]
    pub stations: Vec<StationTarget>,
    #[serde(default = "Config::default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Top-N arrivals kept per display group.
    #[serde(default = "Config::default_max_predictions_per_bucket")]
    pub max_predictions_per_bucket: usize,
    #[serde(default = "Config::default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// `page[limit]` sent with each prediction request.
    #[serde(default = "Config::default_prediction_page_limit")]
    pub prediction_page_limit: u32,
    /// Deadline for one station's fetches within a tick.
    #[serde(default = "Config::default_station_timeout_secs")]
    pub station_timeout_secs: u64,
    #[serde(default = "Config::default_route_families")]
    pub route_families: Vec<RouteFamily>,
    /// Display groups in the order they are printed.
    #[serde(default = "Config::default_group_order")]
    pub group_order: Vec<String>,
    /// IANA zone used for the tick header.
    #[serde(default = "Config::default_timezone")]
    pub timezone: String,
    #[serde(default = "Config::default_base_url")]
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stations: Self::default_stations(),
            poll_interval_secs: Self::default_poll_interval_secs(),
            max_predictions_per_bucket: Self::default_max_predictions_per_bucket(),
            http_timeout_secs: Self::default_http_timeout_secs(),
            prediction_page_limit: Self::default_prediction_page_limit(),
            station_timeout_secs: Self::default_station_timeout_secs(),
            route_families: Self::default_route_families(),
            group_order: Self::default_group_order(),
            timezone: Self::default_timezone(),
            base_url: Self::default_base_url(),
        }
    }
}

const GREEN_BRANCHES: [&str; 4] = ["Green-B", "Green-C", "Green-D", "Green-E"];

impl Config {
    fn default_stations() -> Vec<StationTarget> {
        use Direction::*;
        vec![
            StationTarget::new("Bowdoin", &["Blue"], &[Outbound]),
            StationTarget::new("Haymarket", &["Orange"], &[Inbound, Outbound]),
            StationTarget::new("Park Street", &["Red"], &[Inbound, Outbound]),
            StationTarget::new("Park Street", &GREEN_BRANCHES, &[Inbound, Outbound]),
            StationTarget::new("Government Center", &GREEN_BRANCHES, &[Inbound, Outbound]),
        ]
    }
    fn default_poll_interval_secs() -> u64 {
        30
    }
    fn default_max_predictions_per_bucket() -> usize {
        5
    }
    fn default_http_timeout_secs() -> u64 {
        15
    }
    fn default_prediction_page_limit() -> u32 {
        25
    }
    fn default_station_timeout_secs() -> u64 {
        45
    }
    fn default_route_families() -> Vec<RouteFamily> {
        vec![RouteFamily {
            label: "Green".to_string(),
            routes: GREEN_BRANCHES.iter().map(|r| r.to_string()).collect(),
        }]
    }
    fn default_group_order() -> Vec<String> {
        ["Red", "Orange", "Blue", "Green"]
            .iter()
            .map(|g| g.to_string())
            .collect()
    }
    fn default_timezone() -> String {
        "America/New_York".to_string()
    }
    fn default_base_url() -> String {
        DEFAULT_BASE_URL.to_string()
    }

    /// Loads and validates the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.stations.is_empty(), "at least one station must be configured");
        for station in &self.stations {
            ensure!(
                !station.name.trim().is_empty(),
                "station names must not be empty"
            );
            ensure!(
                !station.routes.is_empty(),
                "station '{}' has no routes",
                station.name
            );
        }
        ensure!(
            self.max_predictions_per_bucket >= 1,
            "max_predictions_per_bucket must be at least 1"
        );
        ensure!(self.poll_interval_secs >= 1, "poll_interval_secs must be at least 1");
        ensure!(self.http_timeout_secs >= 1, "http_timeout_secs must be at least 1");
        ensure!(
            self.station_timeout_secs >= 1,
            "station_timeout_secs must be at least 1"
        );
        ensure!(self.prediction_page_limit >= 1, "prediction_page_limit must be at least 1");
        for family in &self.route_families {
            if family.routes.is_empty() {
                bail!("route family '{}' has no routes", family.label);
            }
        }
        self.tz()?;
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("unknown timezone '{}': {}", self.timezone, e))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn station_timeout(&self) -> Duration {
        Duration::from_secs(self.station_timeout_secs)
    }
}
