//! Geographic traces of LEO satellites and vehicles (ECEF plus geodetic
//! coordinates per sample).

use crate::math::StatsHelper;
use crate::prelude::{AnalysisError, AnalysisResult, Point3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Altitudes below this many metres count as underground. The margin
/// absorbs ECEF to geodetic rounding.
pub const UNDERGROUND_THRESHOLD: f64 = -0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeoKind {
    #[serde(rename = "leo-sat")]
    LeoSat,
    #[serde(rename = "vehicle")]
    Vehicle,
}

impl GeoKind {
    pub fn label(self) -> &'static str {
        match self {
            GeoKind::LeoSat => "leo-sat",
            GeoKind::Vehicle => "vehicle",
        }
    }

    pub fn trace_file(self) -> &'static str {
        match self {
            GeoKind::LeoSat => "leo-sat-trace.csv",
            GeoKind::Vehicle => "vehicle-trace.csv",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "Node")]
    pub node: u64,
    #[serde(rename = "Time")]
    pub time: f64,
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "Z")]
    pub z: f64,
    #[serde(rename = "Latitude")]
    pub lat: f64,
    #[serde(rename = "Longitude")]
    pub lon: f64,
    #[serde(rename = "Altitude")]
    pub alt: f64,
    #[serde(skip)]
    pub kind: Option<GeoKind>,
}

impl GeoPoint {
    pub fn ecef(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }
}

pub fn read_points<R: Read>(reader: R, kind: Option<GeoKind>) -> AnalysisResult<Vec<GeoPoint>> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv.deserialize::<GeoPoint>()
        .map(|row| {
            row.map(|mut point| {
                point.kind = kind;
                point
            })
            .map_err(|err| AnalysisError::Parse(err.to_string()))
        })
        .collect()
}

pub fn load_points(path: &Path, kind: Option<GeoKind>) -> AnalysisResult<Vec<GeoPoint>> {
    let file = File::open(path).map_err(|err| AnalysisError::io(path, err))?;
    read_points(file, kind)
}

/// Trace files of every known kind present in a results directory.
pub fn trace_files_in(dir: &Path) -> Vec<(GeoKind, PathBuf)> {
    [GeoKind::LeoSat, GeoKind::Vehicle]
        .into_iter()
        .map(|kind| (kind, dir.join(kind.trace_file())))
        .filter(|(_, path)| path.is_file())
        .collect()
}

pub fn format_altitude(metres: f64) -> String {
    if metres.abs() >= 1000.0 {
        format!("{:.1} km", metres / 1000.0)
    } else {
        format!("{:.0} m", metres)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeoSummary {
    pub total: usize,
    pub per_kind: BTreeMap<GeoKind, usize>,
    pub nodes: usize,
    pub latitude: Option<(f64, f64)>,
    pub longitude: Option<(f64, f64)>,
    pub altitude: Option<(f64, f64)>,
    pub mean_altitude: Option<f64>,
    pub underground: Vec<GeoPoint>,
    pub underground_nodes: Vec<u64>,
}

impl GeoSummary {
    pub fn compute(points: &[GeoPoint]) -> Self {
        let column = |f: fn(&GeoPoint) -> f64| points.iter().map(f).collect::<Vec<f64>>();
        let latitudes = column(|p| p.lat);
        let longitudes = column(|p| p.lon);
        let altitudes = column(|p| p.alt);

        let mut per_kind = BTreeMap::new();
        for kind in points.iter().filter_map(|p| p.kind) {
            *per_kind.entry(kind).or_insert(0) += 1;
        }

        let mut nodes: Vec<u64> = points.iter().map(|p| p.node).collect();
        nodes.sort_unstable();
        nodes.dedup();

        let underground: Vec<GeoPoint> = points
            .iter()
            .filter(|p| p.alt < UNDERGROUND_THRESHOLD)
            .cloned()
            .collect();
        let mut underground_nodes: Vec<u64> = underground.iter().map(|p| p.node).collect();
        underground_nodes.sort_unstable();
        underground_nodes.dedup();

        Self {
            total: points.len(),
            per_kind,
            nodes: nodes.len(),
            latitude: StatsHelper::min_max(&latitudes),
            longitude: StatsHelper::min_max(&longitudes),
            altitude: StatsHelper::min_max(&altitudes),
            mean_altitude: StatsHelper::mean_ignoring_nan(&altitudes),
            underground,
            underground_nodes,
        }
    }

    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{} points from {} nodes",
            self.total, self.nodes
        )];
        for (kind, count) in &self.per_kind {
            lines.push(format!("  {}: {} points", kind.label(), count));
        }

        if self.underground.is_empty() {
            lines.push("All points are above Earth surface".into());
        } else {
            lines.push(format!(
                "WARNING: {} points are below Earth surface (nodes {:?})",
                self.underground.len(),
                self.underground_nodes
            ));
            if let Some((lowest, _)) = self.altitude {
                lines.push(format!(
                    "Most underground point: {} below surface",
                    format_altitude(lowest)
                ));
            }
        }

        if let Some((lo, hi)) = self.latitude {
            lines.push(format!("Latitude range: {:.2}° to {:.2}°", lo, hi));
        }
        if let Some((lo, hi)) = self.longitude {
            lines.push(format!("Longitude range: {:.2}° to {:.2}°", lo, hi));
        }
        if let Some((lo, hi)) = self.altitude {
            lines.push(format!(
                "Altitude range: {} to {}",
                format_altitude(lo),
                format_altitude(hi)
            ));
        }
        if let Some(mean) = self.mean_altitude {
            lines.push(format!("Average altitude: {}", format_altitude(mean)));
        }
        lines
    }
}
