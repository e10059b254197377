//! Conversion of external mobility datasets into the simulator's trace
//! bundle: an uncompressed tar holding `nodes.csv.gz` and `traces.csv.gz`.

use crate::math::decimal;
use crate::prelude::{AnalysisError, AnalysisResult};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use flate2::write::GzEncoder;
use flate2::Compression;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::LazyLock;

static WKT_POINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"POINT\((-?[\d\.]+) (-?[\d\.]+)\)").expect("valid regex")
});

const WKT_ALTITUDE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceDialect {
    /// `node;ISO-8601 timestamp;POINT(lat lon)`
    Wkt,
    /// `node;relative_ms;lat;lon;alt`
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeTrace {
    pub node: u64,
    pub relative_ms: i64,
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

impl NodeTrace {
    fn to_row(&self) -> String {
        format!(
            "{};{};{};{};{}",
            self.node,
            self.relative_ms,
            decimal(self.lat),
            decimal(self.lon),
            decimal(self.alt)
        )
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc().fixed_offset())
        })
}

fn parse_wkt(text: &str) -> Vec<NodeTrace> {
    let rows: Vec<(u64, DateTime<FixedOffset>, f64, f64)> = text
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.trim().split(';').collect();
            if parts.len() != 3 {
                return None;
            }
            let node = parts[0].trim().parse().ok()?;
            let when = parse_timestamp(parts[1])?;
            let caps = WKT_POINT.captures(parts[2])?;
            Some((node, when, caps[1].parse().ok()?, caps[2].parse().ok()?))
        })
        .collect();

    let start = match rows.iter().map(|(_, when, _, _)| *when).min() {
        Some(start) => start,
        None => return Vec::new(),
    };

    rows.into_iter()
        .map(|(node, when, lat, lon)| NodeTrace {
            node,
            relative_ms: (when - start).num_milliseconds(),
            lat,
            lon,
            alt: WKT_ALTITUDE,
        })
        .collect()
}

fn parse_custom(text: &str) -> Vec<NodeTrace> {
    text.lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.trim().split(';').collect();
            if parts.len() != 5 {
                return None;
            }
            Some(NodeTrace {
                node: parts[0].trim().parse().ok()?,
                relative_ms: parts[1].trim().parse().ok()?,
                lat: parts[2].trim().parse().ok()?,
                lon: parts[3].trim().parse().ok()?,
                alt: parts[4].trim().parse().ok()?,
            })
        })
        .collect()
}

/// Samples ordered by time plus the first sample of every node.
#[derive(Debug, Clone)]
pub struct MobilityTraces {
    pub nodes: Vec<NodeTrace>,
    pub traces: Vec<NodeTrace>,
}

impl MobilityTraces {
    pub fn from_text(text: &str, dialect: TraceDialect) -> AnalysisResult<Self> {
        let mut traces = match dialect {
            TraceDialect::Wkt => parse_wkt(text),
            TraceDialect::Custom => parse_custom(text),
        };
        if traces.is_empty() {
            return Err(AnalysisError::InvalidInput("no valid data found".into()));
        }
        traces.sort_by_key(|t| t.relative_ms);

        let mut first: BTreeMap<u64, NodeTrace> = BTreeMap::new();
        for trace in &traces {
            first.entry(trace.node).or_insert_with(|| trace.clone());
        }

        Ok(Self {
            nodes: first.into_values().collect(),
            traces,
        })
    }

    pub fn nodes_csv(&self) -> String {
        join_rows(&self.nodes)
    }

    pub fn traces_csv(&self) -> String {
        join_rows(&self.traces)
    }

    /// Writes the tar bundle to `writer`.
    pub fn write_bundle<W: Write>(&self, writer: W) -> AnalysisResult<()> {
        let mut builder = tar::Builder::new(writer);
        append_gzip(&mut builder, "nodes.csv.gz", &self.nodes_csv())?;
        append_gzip(&mut builder, "traces.csv.gz", &self.traces_csv())?;
        builder
            .into_inner()
            .and_then(|mut w| w.flush())
            .map_err(|err| AnalysisError::io("<bundle>", err))
    }
}

fn join_rows(rows: &[NodeTrace]) -> String {
    rows.iter()
        .map(NodeTrace::to_row)
        .collect::<Vec<_>>()
        .join("\n")
}

fn append_gzip<W: Write>(
    builder: &mut tar::Builder<W>,
    name: &str,
    content: &str,
) -> AnalysisResult<()> {
    let io_err = |err: std::io::Error| AnalysisError::io(name, err);

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content.as_bytes()).map_err(io_err)?;
    let compressed = encoder.finish().map_err(io_err)?;

    let mut header = tar::Header::new_ustar();
    header.set_size(compressed.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    builder
        .append_data(&mut header, name, compressed.as_slice())
        .map_err(io_err)
}
