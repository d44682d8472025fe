//! Console rendering of station boards.
//!
//! Everything is rendered to a `String` first and written in one call, so an
//! interrupted tick never leaves half a board on screen.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt::Write as _;
use std::io::{self, Write};

use crate::aggregator::{Arrival, StationBoard};
use crate::directions::DirectionMap;
use crate::stations::ResolvedStation;

const RULE_WIDTH: usize = 80;

/// Banner printed at the top of every tick, in local time.
pub fn render_header(now: DateTime<Utc>, tz: Tz) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let local = now.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S %Z");
    format!("\n{rule}\nMBTA Live Predictions @ {local}\n{rule}\n")
}

fn render_arrival(out: &mut String, arrival: &Arrival) {
    if arrival.headsign.is_empty() {
        let _ = writeln!(out, "    {} min", arrival.minutes);
    } else {
        let _ = writeln!(out, "    {} min — {}", arrival.minutes, arrival.headsign);
    }
}

pub fn render_board(board: &StationBoard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", board.station);
    if board.is_empty() {
        out.push_str("  (no upcoming predictions)\n");
        return out;
    }
    for bucket in &board.buckets {
        let _ = writeln!(out, "  {}", bucket.group);
        for arrival in &bucket.arrivals {
            render_arrival(&mut out, arrival);
        }
    }
    out
}

/// Header plus every board of one tick.
pub fn render_tick(boards: &[StationBoard], now: DateTime<Utc>, tz: Tz) -> String {
    let mut out = render_header(now, tz);
    for board in boards {
        out.push_str(&render_board(board));
    }
    out
}

/// Startup summary of station and direction resolution.
pub fn render_resolved(stations: &[ResolvedStation], directions: &[(String, DirectionMap)]) -> String {
    let mut out = String::from("Resolved stations:\n");
    for station in stations {
        let parents: Vec<&str> = station.parent_ids.iter().map(String::as_str).collect();
        let _ = writeln!(
            out,
            "  - {}: parents [{}] (routes: {})",
            station.name(),
            parents.join(", "),
            station.target.routes.join(", ")
        );
    }
    if !directions.is_empty() {
        out.push_str("Direction codes:\n");
        for (route, map) in directions {
            let _ = writeln!(
                out,
                "  - {route}: outbound={} inbound={}",
                map.outbound, map.inbound
            );
        }
    }
    out
}

/// Writes `text` in one call and flushes.
pub fn emit(out: &mut impl Write, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()
}
