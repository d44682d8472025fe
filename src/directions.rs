//! Route direction codes.
//!
//! The MBTA identifies travel direction with an integer (`direction_id`)
//! whose meaning comes from each route's `direction_names`. Riders think in
//! inbound/outbound, so this module maps one onto the other.
//!
//! When a route does not literally use "Inbound"/"Outbound" the mapping is
//! positional: index 0 is treated as outbound and index 1 as inbound. That
//! matches most MBTA rapid transit routes but is an approximation, not a
//! guarantee, for routes labelled e.g. "East"/"West".

use moka::future::Cache as MokaCache;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::Direction;
use crate::fetch::Transport;
use crate::parser::{Document, Resource};

/// Labels assumed when the upstream gives none.
pub const DEFAULT_DIRECTION_NAMES: [&str; 2] = ["Outbound", "Inbound"];

/// Upstream direction codes for one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionMap {
    pub inbound: u8,
    pub outbound: u8,
}

impl DirectionMap {
    pub fn code(&self, direction: Direction) -> u8 {
        match direction {
            Direction::Inbound => self.inbound,
            Direction::Outbound => self.outbound,
        }
    }

    /// Maps a route's ordered direction labels onto inbound/outbound codes.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let position = |label: &str| {
            names
                .iter()
                .position(|n| n.as_ref().trim().eq_ignore_ascii_case(label))
                .and_then(|i| u8::try_from(i).ok())
        };

        match (position("inbound"), position("outbound")) {
            (Some(inbound), Some(outbound)) => Self { inbound, outbound },
            _ => Self {
                inbound: 1,
                outbound: 0,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RouteAttributes {
    #[serde(default)]
    direction_names: Option<Vec<Option<String>>>,
}

/// Extracts a usable two-label list from a `/routes/{id}` document.
fn direction_names(doc: &Document) -> Option<Vec<String>> {
    let route = Resource::<RouteAttributes>::from_value(doc.single()?)?;
    let names: Vec<String> = route
        .attributes
        .direction_names?
        .into_iter()
        .collect::<Option<_>>()?;
    (names.len() == 2).then_some(names)
}

/// Resolves and caches direction maps per route.
///
/// The cache has no TTL or capacity bound, so an entry lives for the whole
/// process. Concurrent first lookups of a route share a single request.
pub struct DirectionResolver {
    transport: Arc<Transport>,
    cache: MokaCache<String, DirectionMap>,
}

impl DirectionResolver {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self {
            transport,
            cache: MokaCache::builder().build(),
        }
    }

    pub async fn resolve(&self, route: &str) -> DirectionMap {
        self.cache
            .get_with(route.to_string(), self.fetch(route))
            .await
    }

    /// The cached map for `route`, if it has been resolved.
    pub async fn cached(&self, route: &str) -> Option<DirectionMap> {
        self.cache.get(route).await
    }

    #[tracing::instrument(skip(self))]
    async fn fetch(&self, route: &str) -> DirectionMap {
        let doc = self
            .transport
            .request(
                &format!("/routes/{route}"),
                &[("fields[route]", "direction_names".to_string())],
            )
            .await;

        let map = match direction_names(&doc) {
            Some(names) => DirectionMap::from_names(&names),
            None => {
                warn!(route, "No usable direction names, assuming Outbound/Inbound");
                DirectionMap::from_names(&DEFAULT_DIRECTION_NAMES)
            }
        };
        debug!(route, inbound = map.inbound, outbound = map.outbound, "Direction map resolved");
        map
    }
}
