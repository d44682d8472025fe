//! Station name → parent station id resolution.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::StationTarget;
use crate::fetch::Transport;
use crate::parser::{Document, Resource};

/// Page size for stop lookups; large enough for any single route.
const STOP_PAGE_LIMIT: u32 = 200;

/// A configured station together with the parent ids it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStation {
    pub target: StationTarget,
    pub parent_ids: BTreeSet<String>,
}

impl ResolvedStation {
    pub fn name(&self) -> &str {
        &self.target.name
    }

    pub fn is_resolved(&self) -> bool {
        !self.parent_ids.is_empty()
    }
}

/// Raised when not a single configured station matched any stop.
#[derive(Debug, Error)]
#[error("no stations resolved; check station names or network connectivity")]
pub struct NoStationsResolved;

#[derive(Debug, Default, Deserialize)]
struct StopAttributes {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    parent_station: Option<String>,
}

/// Parent ids of the stops in `doc` whose name matches `station_name`.
///
/// A stop without a parent is itself the station and contributes its own id.
fn matching_parents(doc: &Document, station_name: &str) -> BTreeSet<String> {
    let wanted = station_name.trim().to_lowercase();

    doc.resources()
        .filter_map(Resource::<StopAttributes>::from_value)
        .filter(|stop| {
            stop.attributes
                .name
                .as_deref()
                .is_some_and(|name| name.trim().to_lowercase() == wanted)
        })
        .filter_map(|stop| {
            let parent = stop
                .attributes
                .parent_station
                .as_deref()
                .or_else(|| stop.related_id("parent_station"))
                .filter(|p| !p.is_empty())
                .map(str::to_string);
            parent.or(stop.id)
        })
        .collect()
}

pub struct StationResolver {
    transport: Arc<Transport>,
}

impl StationResolver {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Sorted union of parent ids matching `station_name` across `routes`.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, station_name: &str, routes: &[&str]) -> BTreeSet<String> {
        let mut parents = BTreeSet::new();
        for route in routes {
            let doc = self
                .transport
                .request(
                    "/stops",
                    &[
                        ("filter[route]", route.to_string()),
                        ("page[limit]", STOP_PAGE_LIMIT.to_string()),
                        ("fields[stop]", "name,parent_station".to_string()),
                    ],
                )
                .await;
            parents.extend(matching_parents(&doc, station_name));
        }
        parents
    }

    /// Resolves every target in order.
    ///
    /// Unresolvable stations are kept (with no parents) and logged; only the
    /// case where nothing resolved at all is an error.
    pub async fn resolve_all(
        &self,
        targets: &[StationTarget],
    ) -> Result<Vec<ResolvedStation>, NoStationsResolved> {
        let mut resolved = Vec::with_capacity(targets.len());
        for target in targets {
            let routes = target.unique_routes();
            let parent_ids = self.resolve(&target.name, &routes).await;
            if parent_ids.is_empty() {
                warn!(station = %target.name, routes = ?routes, "Could not find any parent stop ids");
            } else {
                info!(station = %target.name, parents = ?parent_ids, "Station resolved");
            }
            resolved.push(ResolvedStation {
                target: target.clone(),
                parent_ids,
            });
        }

        if resolved.iter().all(|s| !s.is_resolved()) {
            return Err(NoStationsResolved);
        }
        Ok(resolved)
    }
}
