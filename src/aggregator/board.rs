use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use super::aggregate::Aggregation;
use super::family::RouteFamilies;
use super::types::StationBoard;
use crate::config::Config;
use crate::fetch::Transport;
use crate::parser::Document;
use crate::stations::ResolvedStation;

/// Display rules shared by every station board.
#[derive(Debug, Clone)]
pub struct BoardSettings {
    pub max_per_bucket: usize,
    pub page_limit: u32,
    pub group_order: Vec<String>,
    pub families: RouteFamilies,
}

impl BoardSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_per_bucket: config.max_predictions_per_bucket,
            page_limit: config.prediction_page_limit,
            group_order: config.group_order.clone(),
            families: RouteFamilies::new(&config.route_families),
        }
    }
}

/// Builds station boards from live predictions.
pub struct Aggregator {
    transport: Arc<Transport>,
    settings: BoardSettings,
}

impl Aggregator {
    pub fn new(transport: Arc<Transport>, settings: BoardSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// One board for `station` as of `now`.
    ///
    /// Each parent id costs exactly one request covering all of the
    /// station's routes.
    #[tracing::instrument(skip(self, station, now), fields(station = %station.name()))]
    pub async fn aggregate(&self, station: &ResolvedStation, now: DateTime<Utc>) -> StationBoard {
        let routes = station.target.unique_routes().join(",");
        let mut aggregation = Aggregation::new();

        for parent_id in &station.parent_ids {
            let doc = self.fetch_predictions(parent_id, &routes).await;
            let accepted = aggregation.add_document(&doc, now, &self.settings.families);
            debug!(parent_id = %parent_id, accepted, "Predictions collected");
        }

        StationBoard {
            station: station.name().to_string(),
            buckets: aggregation
                .into_buckets(self.settings.max_per_bucket, &self.settings.group_order),
        }
    }

    async fn fetch_predictions(&self, parent_id: &str, routes: &str) -> Document {
        self.transport
            .request(
                "/predictions",
                &[
                    ("filter[stop]", parent_id.to_string()),
                    ("filter[route]", routes.to_string()),
                    ("sort", "arrival_time,departure_time".to_string()),
                    ("page[limit]", self.settings.page_limit.to_string()),
                    ("include", "trip".to_string()),
                    (
                        "fields[prediction]",
                        "arrival_time,departure_time,direction_id,route,trip".to_string(),
                    ),
                    ("fields[trip]", "headsign".to_string()),
                ],
            )
            .await
    }
}
