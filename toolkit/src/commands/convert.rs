use crate::workflow::WorkflowConfig;
use anyhow::Context;
use clap::{Args, ValueEnum};
use iodcore::export::{kml, ply};
use iodcore::traces::geolog::{load_fixes, PLACEMARK_MARKER, TRACK_MARKER};
use iodcore::traces::{GeoLogParser, MobilityTraces, TraceDialect};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

fn with_extension(input: &Path, output: &Option<PathBuf>, extension: &str) -> PathBuf {
    output
        .clone()
        .unwrap_or_else(|| input.with_extension(extension))
}

#[derive(Args, Debug)]
pub struct KmlArgs {
    /// Scenario log holding geographic positions
    pub log: PathBuf,
    /// Draw one path through the fixes instead of a placemark per fix
    #[arg(long)]
    pub track: bool,
    /// Marker identifying position lines (case insensitive)
    #[arg(long)]
    pub marker: Option<String>,
    /// 1-based field holding the timestamp
    #[arg(long)]
    pub time_field: Option<usize>,
    /// 1-based field holding `lat:lon[:alt]`
    #[arg(long)]
    pub position_field: Option<usize>,
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl KmlArgs {
    fn parser(&self) -> GeoLogParser {
        let defaults = if self.track {
            (TRACK_MARKER, 1, 7)
        } else {
            (PLACEMARK_MARKER, 1, 8)
        };
        GeoLogParser::new(
            self.marker.as_deref().unwrap_or(defaults.0),
            self.time_field.unwrap_or(defaults.1),
            self.position_field.unwrap_or(defaults.2),
        )
    }
}

/// Google Earth view of the positions logged during a run.
pub fn kml(args: &KmlArgs, config: &WorkflowConfig) -> anyhow::Result<PathBuf> {
    let fixes = load_fixes(&args.parser(), &args.log)
        .with_context(|| format!("reading positions from {}", args.log.display()))?;
    let document = if args.track {
        kml::track(&fixes, &config.kml.landmarks)
    } else {
        kml::placemarks(&fixes, &config.kml.landmarks)
    };

    let output = with_extension(&args.log, &args.output, "kml");
    fs::write(&output, document).with_context(|| format!("writing {}", output.display()))?;
    println!("{} positions -> {}", fixes.len(), output.display());
    Ok(output)
}

#[derive(Args, Debug)]
pub struct RemPlyArgs {
    /// Radio environment map dump: `x y z value` rows
    pub input: PathBuf,
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

pub fn rem_ply(args: &RemPlyArgs) -> anyhow::Result<PathBuf> {
    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let samples =
        ply::parse_rem(&text).with_context(|| format!("parsing {}", args.input.display()))?;

    let output = with_extension(&args.input, &args.output, "ply");
    fs::write(&output, ply::rem_to_ply(&samples))
        .with_context(|| format!("writing {}", output.display()))?;
    println!("{} REM samples -> {}", samples.len(), output.display());
    Ok(output)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dialect {
    /// `node;timestamp;POINT(lat lon)`
    Wkt,
    /// `node;relative_ms;lat;lon;alt`
    Custom,
}

impl From<Dialect> for TraceDialect {
    fn from(value: Dialect) -> Self {
        match value {
            Dialect::Wkt => TraceDialect::Wkt,
            Dialect::Custom => TraceDialect::Custom,
        }
    }
}

#[derive(Args, Debug)]
pub struct MobilityBundleArgs {
    /// Raw mobility trace export
    pub input: PathBuf,
    #[arg(long, value_enum, default_value_t = Dialect::Wkt)]
    pub dialect: Dialect,
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Packs the node and trace tables of a mobility export into a tar of
/// gzip CSVs.
pub fn mobility_bundle(args: &MobilityBundleArgs) -> anyhow::Result<PathBuf> {
    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let traces = MobilityTraces::from_text(&text, args.dialect.into())
        .with_context(|| format!("parsing {}", args.input.display()))?;

    let output = with_extension(&args.input, &args.output, "tar");
    let file = File::create(&output).with_context(|| format!("creating {}", output.display()))?;
    traces
        .write_bundle(BufWriter::new(file))
        .with_context(|| format!("writing {}", output.display()))?;
    println!(
        "{} nodes, {} samples -> {}",
        traces.nodes.len(),
        traces.traces.len(),
        output.display()
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn kml_defaults_to_placemarks_next_to_the_log() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("paper.log");
        fs::write(
            &log,
            "+1.0s 3 DroneMobility: Position after update: 45.1:7.6:100\n\
             +1.0s 3 DroneMobility: Position after update: 45.1:7.6:100\n\
             +3.0s 3 DroneMobility: Position after update: 45.2:7.7:120\n",
        )
        .unwrap();

        let output = kml(
            &KmlArgs {
                log,
                track: false,
                marker: None,
                time_field: None,
                position_field: Some(7),
                output: None,
            },
            &WorkflowConfig::default(),
        )
        .unwrap();
        assert_eq!(output, dir.path().join("paper.kml"));
        let doc = fs::read_to_string(output).unwrap();
        assert_eq!(doc.matches("<Placemark>").count(), 2);
    }

    #[test]
    fn rem_becomes_ply() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("rem.txt");
        fs::write(&input, "0 0 1 0.5\n1 0 1 2.0\n").unwrap();
        let output = rem_ply(&RemPlyArgs {
            input,
            output: None,
        })
        .unwrap();
        let ply = fs::read_to_string(output).unwrap();
        assert!(ply.starts_with("ply\n"));
        assert!(ply.contains("element vertex 2"));
    }

    #[test]
    fn bundle_holds_two_gzip_tables() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("custom.txt");
        fs::write(&input, "1;0;45.0;7.0;10.0\n1;1000;45.1;7.1;10.0\n2;500;44.0;8.0;0.0\n").unwrap();
        let output = mobility_bundle(&MobilityBundleArgs {
            input,
            dialect: Dialect::Custom,
            output: Some(dir.path().join("bundle.tar")),
        })
        .unwrap();

        let mut archive = tar::Archive::new(File::open(output).unwrap());
        let mut names = Vec::new();
        for entry in archive.entries().unwrap() {
            let entry = entry.unwrap();
            names.push(entry.path().unwrap().display().to_string());
            let mut text = String::new();
            GzDecoder::new(entry).read_to_string(&mut text).unwrap();
            assert!(!text.is_empty());
        }
        assert_eq!(names, vec!["nodes.csv.gz", "traces.csv.gz"]);
    }
}
