use super::{output_path, write_rows};
use crate::plot::{Chart, Series};
use anyhow::Context;
use clap::Args;
use iodcore::report::{EntityKind, ScenarioReport};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

const NS_PER_S: f64 = 1e9;

#[derive(Args, Debug)]
pub struct ReportViewArgs {
    /// XML report written at the end of a run
    pub report: PathBuf,
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

#[derive(Serialize)]
struct PositionRow<'a> {
    kind: EntityKind,
    address: &'a str,
    t_ns: i64,
    x: f64,
    y: f64,
    z: f64,
}

/// Positions of every entity, drone trajectories over the ZSPs and the RSSI
/// each drone measured over time.
pub fn run(args: &ReportViewArgs) -> anyhow::Result<()> {
    let report = ScenarioReport::load(&args.report)
        .with_context(|| format!("loading report {}", args.report.display()))?;
    println!("{}", report.banner());

    let rows = report.entities().flat_map(|entity| {
        entity.positions.iter().map(move |p| PositionRow {
            kind: entity.kind,
            address: &entity.address,
            t_ns: p.t_ns,
            x: p.point.x,
            y: p.point.y,
            z: p.point.z,
        })
    });
    write_rows(&output_path(&args.out_dir, "report-positions.csv")?, rows)?;

    let mut trajectories = vec![Series::new(
        "ZSPs",
        report
            .zsps
            .iter()
            .flat_map(|z| z.positions.iter().map(|p| (p.point.x, p.point.y)))
            .collect(),
    )];
    for drone in &report.drones {
        println!(
            "drone {}: {} positions, {} RSSI samples",
            drone.address,
            drone.positions.len(),
            drone.rssi.len()
        );
        trajectories.push(Series::new(
            format!("drone {}", drone.address),
            drone
                .positions
                .iter()
                .map(|p| (p.point.x, p.point.y))
                .collect(),
        ));
    }
    Chart {
        path: &output_path(&args.out_dir, "report-trajectories.svg")?,
        title: &report.scenario,
        x_desc: "x [m]",
        y_desc: "y [m]",
    }
    .scatter(&trajectories)?;

    let mut rssi: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
    for drone in &report.drones {
        for sample in &drone.rssi {
            rssi.entry(format!("{} from {}", drone.address, sample.from))
                .or_default()
                .push((sample.time_ns as f64 / NS_PER_S, sample.value_dbm));
        }
    }
    let rssi: Vec<Series> = rssi
        .into_iter()
        .map(|(name, points)| Series::new(name, points))
        .collect();
    Chart {
        path: &output_path(&args.out_dir, "report-rssi.svg")?,
        title: "RSSI",
        x_desc: "time [s]",
        y_desc: "RSSI [dBm]",
    }
    .lines(&rssi)?;
    Ok(())
}
