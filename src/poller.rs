//! The poll loop: one board per resolved station every tick.

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use tracing::{debug, error, info, warn};

use crate::aggregator::{Aggregator, StationBoard};
use crate::config::StationTarget;
use crate::directions::{DirectionMap, DirectionResolver};
use crate::output::{emit, render_tick};
use crate::stations::ResolvedStation;

/// Resolves the direction map of every configured route, in config order.
///
/// Requested directions are only checked and logged here; predictions are
/// grouped by route, not filtered by direction.
pub async fn resolve_directions(
    resolver: &DirectionResolver,
    targets: &[StationTarget],
) -> Vec<(String, DirectionMap)> {
    let mut maps: Vec<(String, DirectionMap)> = Vec::new();
    for target in targets {
        for route in target.unique_routes() {
            let map = resolver.resolve(route).await;
            for direction in &target.directions {
                debug!(
                    station = %target.name,
                    route,
                    direction = %direction,
                    code = map.code(*direction),
                    "Requested direction"
                );
            }
            if !maps.iter().any(|(r, _)| r == route) {
                maps.push((route.to_string(), map));
            }
        }
    }
    maps
}

/// Drives `work` to completion unless `interrupt` fires first, in which case
/// the work is dropped and `None` is returned.
pub async fn until_interrupted<F, I>(work: F, interrupt: I) -> Option<F::Output>
where
    F: Future,
    I: Future,
{
    tokio::select! {
        output = work => Some(output),
        _ = interrupt => {
            info!("Interrupted, stopping");
            None
        }
    }
}

pub struct Tracker {
    stations: Vec<ResolvedStation>,
    aggregator: Arc<Aggregator>,
    station_timeout: Duration,
}

impl Tracker {
    pub fn new(
        stations: Vec<ResolvedStation>,
        aggregator: Arc<Aggregator>,
        station_timeout: Duration,
    ) -> Self {
        Self {
            stations,
            aggregator,
            station_timeout,
        }
    }

    pub fn stations(&self) -> &[ResolvedStation] {
        &self.stations
    }

    /// Builds the boards for one tick.
    ///
    /// Stations are fetched concurrently but returned in configured order.
    /// Unresolved stations are left out; a station that errors or misses its
    /// deadline shows up empty.
    pub async fn tick(&self, now: DateTime<Utc>) -> Vec<StationBoard> {
        let mut tasks = Vec::new();

        for station in self.stations.iter().filter(|s| s.is_resolved()) {
            let aggregator = self.aggregator.clone();
            let name = station.name().to_string();
            let station = station.clone();
            let deadline = self.station_timeout;
            let span = tracing::info_span!("station", station = %station.name());

            let task = tokio::spawn(
                async move {
                    match tokio::time::timeout(deadline, aggregator.aggregate(&station, now)).await
                    {
                        Ok(board) => board,
                        Err(_) => {
                            warn!(
                                deadline_secs = deadline.as_secs(),
                                "Station missed its deadline, showing no predictions"
                            );
                            StationBoard::empty(station.name())
                        }
                    }
                }
                .instrument(span),
            );
            tasks.push((name, task));
        }

        let mut boards = Vec::with_capacity(tasks.len());
        for (name, task) in tasks {
            match task.await {
                Ok(board) => boards.push(board),
                Err(e) => {
                    error!(station = %name, error = %e, "Station task failed");
                    boards.push(StationBoard::empty(&name));
                }
            }
        }
        boards
    }

    /// Polls until interrupted (or once, when `once` is set).
    ///
    /// Ctrl-C during a tick drops that tick before anything is written;
    /// during the sleep it simply ends the loop.
    pub async fn run<W: Write>(
        &self,
        out: &mut W,
        interval: Duration,
        tz: Tz,
        once: bool,
    ) -> Result<()> {
        info!(
            stations = self.stations.len(),
            interval_secs = interval.as_secs(),
            "Starting live polling"
        );

        loop {
            let now = Utc::now();
            let boards = tokio::select! {
                boards = self.tick(now) => boards,
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping");
                    return Ok(());
                }
            };
            emit(out, &render_tick(&boards, now, tz))?;

            if once {
                return Ok(());
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping");
                    return Ok(());
                }
            }
        }
    }
}
