use crate::plot::Chart;
use anyhow::{bail, Context};
use iodcore::geometry::coverage::START_TIME;
use iodcore::geometry::CoveragePath;
use iodcore::math::{lin_to_db, round3, watt_to_dbm};
use iodcore::scenario::config::PARAMETRIC_SPEED_MODEL;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

pub const WAYPOINT_MODEL: &str = "ns3::WaypointMobilityModel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TrajectoryKind {
    /// Timed waypoints, each duplicated to hold the rest time.
    #[default]
    Waypoints,
    /// A parametric-speed flight plan.
    Flightplan,
}

fn trajectory(path: &CoveragePath, kind: TrajectoryKind) -> Vec<Value> {
    match kind {
        TrajectoryKind::Flightplan => path
            .points
            .iter()
            .map(|p| {
                json!({
                    "position": p.as_array(),
                    "interest": 0,
                    "restTime": path.rest_time,
                })
            })
            .collect(),
        TrajectoryKind::Waypoints => {
            let mut points = Vec::new();
            let mut time = START_TIME;
            for p in &path.points {
                points.push(json!({ "position": p.as_array(), "time": round3(time) }));
                if path.rest_time > 0.0 {
                    time += path.rest_time;
                    points.push(json!({ "position": p.as_array(), "time": round3(time) }));
                }
                time += path.time_step;
            }
            points
        }
    }
}

/// Scenario fragment flying a single drone along `path`.
pub fn coverage_config(path: &CoveragePath, duration: f64, kind: TrajectoryKind) -> Value {
    let mut drone = json!({
        "name": "drone_coverage",
        "interfaces": [0],
    });
    match kind {
        TrajectoryKind::Waypoints => {
            drone["mobilityModel"] = json!(WAYPOINT_MODEL);
        }
        TrajectoryKind::Flightplan => {
            drone["mobilityModel"] = json!(PARAMETRIC_SPEED_MODEL);
            drone["speedCoefficients"] = json!([path.speed]);
        }
    }
    drone["trajectory"] = Value::Array(trajectory(path, kind));

    json!({
        "duration": duration,
        "dronesMobilityModel": "mixed",
        "drones": [drone],
    })
}

/// One row of a PHY trace: `time _ _ _ rsrp sinr _`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhySample {
    pub time: f64,
    pub rsrp_w: f64,
    pub sinr: f64,
}

pub fn parse_phy_trace(text: &str) -> anyhow::Result<Vec<PhySample>> {
    let mut samples = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 7 {
            bail!("line {}: expected 7 columns, got {}", index + 1, cols.len());
        }
        let value = |i: usize| -> anyhow::Result<f64> {
            cols[i]
                .parse()
                .with_context(|| format!("line {}: column {}", index + 1, i + 1))
        };
        samples.push(PhySample {
            time: value(0)?,
            rsrp_w: value(4)?,
            sinr: value(5)?,
        });
    }
    Ok(samples)
}

/// Charts written by [`render_signal_maps`], named after the trace.
pub fn signal_map_paths(trace: &Path) -> (PathBuf, PathBuf) {
    let stem = trace.with_extension("");
    let name = stem.display().to_string();
    (
        PathBuf::from(format!("{}-RSRPplot.svg", name)),
        PathBuf::from(format!("{}-SINRplot.svg", name)),
    )
}

/// Places every trace sample on the coverage path and draws RSRP (dBm) and
/// SINR (dB) along it.
pub fn render_signal_maps(path: &CoveragePath, samples: &[PhySample], trace: &Path) -> anyhow::Result<(PathBuf, PathBuf)> {
    let positions: Vec<(f64, f64)> = samples.iter().map(|s| path.position_at(s.time)).collect();
    let rsrp: Vec<f64> = samples.iter().map(|s| watt_to_dbm(s.rsrp_w)).collect();
    let sinr: Vec<f64> = samples.iter().map(|s| lin_to_db(s.sinr)).collect();

    let (rsrp_path, sinr_path) = signal_map_paths(trace);
    Chart {
        path: &rsrp_path,
        title: "RSRP [dBm]",
        x_desc: "x [m]",
        y_desc: "y [m]",
    }
    .gradient_path(&positions, &rsrp)?;
    Chart {
        path: &sinr_path,
        title: "SINR [dB]",
        x_desc: "x [m]",
        y_desc: "y [m]",
    }
    .gradient_path(&positions, &sinr)?;
    Ok((rsrp_path, sinr_path))
}
