use super::{output_path, stem, write_rows};
use crate::generator::write_json;
use crate::plot::{Chart, Series};
use anyhow::{bail, Context};
use clap::{Args, ValueEnum};
use iodcore::geometry::bezier::DEFAULT_CURVE_STEP;
use iodcore::geometry::{build_trajectory, interest_curve, split_at_interest};
use iodcore::scenario::{flight_plan_model, ScenarioConfig};
use iodcore::{Point3, Waypoint};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Serialize)]
struct CurveRow<'a> {
    drone: &'a str,
    x: f64,
    y: f64,
    z: f64,
}

fn curve_rows<'a>(name: &'a str, curve: &'a [Point3]) -> impl Iterator<Item = CurveRow<'a>> + 'a {
    curve.iter().map(move |p| CurveRow {
        drone: name,
        x: p.x,
        y: p.y,
        z: p.z,
    })
}

fn xy(points: &[Point3]) -> Vec<(f64, f64)> {
    points.iter().map(|p| (p.x, p.y)).collect()
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Scenario configuration (JSON, comments allowed)
    pub scenario: PathBuf,
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

/// Samples the Bézier trajectory of every drone in a scenario and plots
/// them over the ZSPs.
pub fn preview(args: &PreviewArgs) -> anyhow::Result<()> {
    let config = ScenarioConfig::load(&args.scenario)
        .with_context(|| format!("loading scenario {}", args.scenario.display()))?;
    let plans = config
        .drone_flight_plans()
        .with_context(|| format!("reading flight plans of {}", args.scenario.display()))?;
    let zsps = config
        .zsp_positions()
        .with_context(|| format!("reading ZSPs of {}", args.scenario.display()))?;

    let mut names = Vec::with_capacity(plans.len());
    let mut curves = Vec::with_capacity(plans.len());
    for (index, plan) in plans.iter().enumerate() {
        let curve = build_trajectory(&plan.points, plan.curve_step)
            .with_context(|| format!("drone {}", index))?;
        println!(
            "drone {}: {} waypoints, {} curve samples (step {})",
            index,
            plan.points.len(),
            curve.len(),
            plan.curve_step
        );
        names.push(format!("drone {}", index));
        curves.push(curve);
    }

    let rows = names
        .iter()
        .zip(&curves)
        .flat_map(|(name, curve)| curve_rows(name, curve));
    write_rows(&output_path(&args.out_dir, "preview.csv")?, rows)?;

    let mut series = vec![Series::new("ZSPs", xy(&zsps))];
    series.extend(
        names
            .iter()
            .zip(&curves)
            .map(|(name, curve)| Series::new(name.clone(), xy(curve))),
    );
    let title = config.name().unwrap_or("preview").to_string();
    Chart {
        path: &output_path(&args.out_dir, "preview.svg")?,
        title: &title,
        x_desc: "x [m]",
        y_desc: "y [m]",
    }
    .scatter(&series)?;
    Ok(())
}

/// How the flight-plan curve is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CurveMode {
    /// One Bézier curve per segment between interest-0 points.
    Plan,
    /// Segments weighted by repeating each control point `interest` times.
    Interest,
}

/// A flight-plan point as written by hand: `{"position": [x, y, z], "interest": n}`.
#[derive(Debug, Deserialize)]
struct PlanPoint {
    position: [f64; 3],
    #[serde(default)]
    interest: u32,
}

#[derive(Args, Debug)]
pub struct FlightPlanArgs {
    /// JSON array of waypoints
    pub waypoints: PathBuf,
    /// Speed coefficients, comma separated
    #[arg(long, value_delimiter = ',', default_value = "1.0")]
    pub speed: Vec<f64>,
    #[arg(long, default_value_t = 0.0)]
    pub rest_time: f64,
    #[arg(long, value_enum, default_value_t = CurveMode::Plan)]
    pub curve: CurveMode,
    #[arg(long, default_value_t = DEFAULT_CURVE_STEP)]
    pub curve_step: f64,
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

pub fn load_waypoints(text: &str) -> anyhow::Result<Vec<Waypoint>> {
    let points: Vec<PlanPoint> = serde_json::from_str(text).context("parsing waypoints")?;
    if points.len() < 2 {
        bail!("a flight plan needs at least two waypoints, got {}", points.len());
    }
    Ok(points
        .into_iter()
        .map(|p| Waypoint::new(p.position.into(), p.interest))
        .collect())
}

pub fn sample_curve(points: &[Waypoint], mode: CurveMode, step: f64) -> anyhow::Result<Vec<Point3>> {
    Ok(match mode {
        CurveMode::Plan => build_trajectory(points, step)?,
        CurveMode::Interest => split_at_interest(points)
            .iter()
            .filter(|segment| segment.len() > 1)
            .flat_map(|segment| interest_curve(segment))
            .collect(),
    })
}

/// Mobility model JSON, sampled curve CSV and a top view of the curve.
pub fn flight_plan(args: &FlightPlanArgs) -> anyhow::Result<()> {
    let text = fs::read_to_string(&args.waypoints)
        .with_context(|| format!("reading {}", args.waypoints.display()))?;
    let points = load_waypoints(&text)
        .with_context(|| format!("loading waypoints from {}", args.waypoints.display()))?;
    let curve = sample_curve(&points, args.curve, args.curve_step)?;
    let name = stem(&args.waypoints);

    let model = flight_plan_model(&points, &args.speed, args.rest_time);
    write_json(
        &output_path(&args.out_dir, &format!("{}-model.json", name))?,
        &model,
        b"  ",
    )?;
    write_rows(
        &output_path(&args.out_dir, &format!("{}-curve.csv", name))?,
        curve_rows(&name, &curve),
    )?;

    let controls: Vec<Point3> = points.iter().map(|w| w.point).collect();
    Chart {
        path: &output_path(&args.out_dir, &format!("{}-curve.svg", name))?,
        title: &name,
        x_desc: "x [m]",
        y_desc: "y [m]",
    }
    .scatter(&[
        Series::new("waypoints", xy(&controls)),
        Series::new("curve", xy(&curve)),
    ])?;

    println!(
        "{}: {} waypoints, {} curve samples",
        name,
        points.len(),
        curve.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::tempdir;

    const WAYPOINTS: &str = r#"[
        { "position": [0, 0, 0], "interest": 0 },
        { "position": [10, 10, 10], "interest": 2 },
        { "position": [20, 0, 0], "interest": 0 },
        { "position": [30, 0, 0], "interest": 0 }
    ]"#;

    #[test]
    fn interest_mode_samples_each_segment() {
        let points = load_waypoints(WAYPOINTS).unwrap();
        let curve = sample_curve(&points, CurveMode::Interest, DEFAULT_CURVE_STEP).unwrap();
        assert_eq!(curve.len(), 2 * 101);
        assert_eq!(curve[0], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(curve[100], Point3::new(20.0, 0.0, 0.0));
    }

    #[test]
    fn plan_mode_uses_the_step() {
        let points = load_waypoints(WAYPOINTS).unwrap();
        let curve = sample_curve(&points, CurveMode::Plan, 0.1).unwrap();
        assert_eq!(curve.len(), 20);
        assert!(sample_curve(&points, CurveMode::Plan, 0.0).is_err());
    }

    #[test]
    fn single_waypoint_is_rejected() {
        assert!(load_waypoints(r#"[{ "position": [0, 0, 0] }]"#).is_err());
    }

    #[test]
    fn flight_plan_writes_model_and_curve() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("paper_s1.json");
        fs::write(&input, WAYPOINTS).unwrap();

        flight_plan(&FlightPlanArgs {
            waypoints: input,
            speed: vec![1.0, 2.0],
            rest_time: 3.0,
            curve: CurveMode::Plan,
            curve_step: 0.5,
            out_dir: dir.path().to_path_buf(),
        })
        .unwrap();

        let model: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("paper_s1-model.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(model["attributes"][0]["value"][1], 2.0);
        assert_eq!(model["attributes"][1]["value"][1]["restTime"], 3.0);
        let csv = fs::read_to_string(dir.path().join("paper_s1-curve.csv")).unwrap();
        assert_eq!(csv.lines().next(), Some("drone,x,y,z"));
        assert_eq!(csv.lines().count(), 1 + 4);
        assert!(dir.path().join("paper_s1-curve.svg").exists());
    }
}
