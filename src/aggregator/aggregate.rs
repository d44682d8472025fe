use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use super::family::RouteFamilies;
use super::types::{Arrival, DisplayBucket, PredictionRecord, TripAttributes};
use super::utility::minutes_until;
use crate::parser::{Document, Resource};

/// Trip id → headsign from the `trip` resources included in a batch.
pub fn trip_headsigns(doc: &Document) -> HashMap<String, String> {
    doc.included_of("trip")
        .filter_map(Resource::<TripAttributes>::from_value)
        .filter_map(|trip| Some((trip.id?, trip.attributes.headsign?)))
        .collect()
}

/// Arrivals accumulated for one station within one tick.
#[derive(Debug, Default)]
pub struct Aggregation {
    groups: HashMap<String, Vec<Arrival>>,
}

impl Aggregation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every usable prediction of a batch response; returns how many
    /// records were accepted.
    pub fn add_document(
        &mut self,
        doc: &Document,
        now: DateTime<Utc>,
        families: &RouteFamilies,
    ) -> usize {
        let headsigns = trip_headsigns(doc);
        let mut accepted = 0;
        let mut skipped = 0;

        for value in doc.resources() {
            let Some(record) = PredictionRecord::from_value(value) else {
                skipped += 1;
                continue;
            };
            let headsign = record
                .trip_id
                .as_deref()
                .and_then(|trip| headsigns.get(trip))
                .map(String::as_str)
                .unwrap_or("");
            self.push(&record, headsign, now, families);
            accepted += 1;
        }

        if skipped > 0 {
            debug!(accepted, skipped, "Skipped malformed predictions");
        }
        accepted
    }

    pub fn push(
        &mut self,
        record: &PredictionRecord,
        headsign: &str,
        now: DateTime<Utc>,
        families: &RouteFamilies,
    ) {
        let group = families.display_group(&record.route_id).to_string();
        let arrival = Arrival {
            minutes: minutes_until(record.time, now),
            headsign: families.headsign(&record.route_id, headsign),
        };
        self.groups.entry(group).or_default().push(arrival);
    }

    /// Deduplicates, sorts and truncates each group, then orders the groups.
    ///
    /// Groups named in `group_order` come first in that order; the rest
    /// follow alphabetically. Groups without arrivals never appear.
    pub fn into_buckets(self, max_per_bucket: usize, group_order: &[String]) -> Vec<DisplayBucket> {
        let mut buckets: Vec<DisplayBucket> = self
            .groups
            .into_iter()
            .filter(|(_, arrivals)| !arrivals.is_empty())
            .map(|(group, arrivals)| {
                // (minutes, headsign) ordering: dedup and sort in one pass
                let unique: BTreeSet<Arrival> = arrivals.into_iter().collect();
                DisplayBucket {
                    group,
                    arrivals: unique.into_iter().take(max_per_bucket).collect(),
                }
            })
            .collect();

        buckets.sort_by(|a, b| {
            let rank = |group: &str| {
                group_order
                    .iter()
                    .position(|g| g == group)
                    .unwrap_or(usize::MAX)
            };
            rank(&a.group)
                .cmp(&rank(&b.group))
                .then_with(|| a.group.cmp(&b.group))
        });
        buckets
    }
}
