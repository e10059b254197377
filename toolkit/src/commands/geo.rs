use super::output_path;
use crate::plot::{Chart, Series};
use anyhow::{bail, Context};
use clap::Args;
use iodcore::export::ply::points_to_ply;
use iodcore::geo::{load_points, trace_files_in, GeoPoint, GeoSummary};
use iodcore::Point3;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct GeoInspectArgs {
    /// Results directory holding `leo-sat-trace.csv` and/or `vehicle-trace.csv`
    pub results: PathBuf,
    /// Also write the ECEF positions as a point cloud
    #[arg(long)]
    pub ply: Option<PathBuf>,
    /// Also draw every sample on a longitude/latitude chart
    #[arg(long)]
    pub map: Option<PathBuf>,
}

/// Summary of the geographic traces of a run.
pub fn run(args: &GeoInspectArgs) -> anyhow::Result<GeoSummary> {
    let files = trace_files_in(&args.results);
    if files.is_empty() {
        bail!("no geographic traces in {}", args.results.display());
    }

    let mut points: Vec<GeoPoint> = Vec::new();
    let mut series = Vec::new();
    for (kind, path) in files {
        let loaded = load_points(&path, Some(kind))
            .with_context(|| format!("reading {}", path.display()))?;
        series.push(Series::new(
            kind.label(),
            loaded.iter().map(|p| (p.lon, p.lat)).collect(),
        ));
        points.extend(loaded);
    }

    let summary = GeoSummary::compute(&points);
    for line in summary.report_lines() {
        println!("{}", line);
    }

    if let Some(ply) = &args.ply {
        let cloud: Vec<Point3> = points.iter().map(GeoPoint::ecef).collect();
        fs::write(ply, points_to_ply(&cloud))
            .with_context(|| format!("writing {}", ply.display()))?;
    }
    if let Some(map) = &args.map {
        let dir = map.parent().unwrap_or(&args.results);
        let name = map
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "geo.svg".to_string());
        Chart {
            path: &output_path(dir, &name)?,
            title: "Geographic positions",
            x_desc: "longitude [deg]",
            y_desc: "latitude [deg]",
        }
        .scatter(&series)?;
    }
    Ok(summary)
}
