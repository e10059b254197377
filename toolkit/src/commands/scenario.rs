use crate::capture::WorkerPool;
use crate::generator::campaign::{run_simulations, write_configs};
use crate::generator::coverage::{coverage_config, parse_phy_trace, render_signal_maps, TrajectoryKind};
use crate::generator::leo::{build_leo_scenario, LeoConfig, Orbit};
use crate::generator::vehicles::{build_vehicle_scenario, model_names};
use crate::generator::write_json;
use crate::workflow::WorkflowConfig;
use anyhow::{bail, Context};
use clap::{Args, ValueEnum};
use iodcore::geometry::{CoveragePath, CoverageSpec, SweepAxis};
use iodcore::scenario::{migrate_battery, migrate_remote, ScenarioConfig};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OriginType {
    Center,
    Topleft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    X,
    Y,
}

impl From<Direction> for SweepAxis {
    fn from(value: Direction) -> Self {
        match value {
            Direction::X => SweepAxis::X,
            Direction::Y => SweepAxis::Y,
        }
    }
}

#[derive(Args, Debug)]
pub struct CoverageArgs {
    /// Draw RSRP/SINR along the path from the PHY trace in --file-name
    #[arg(long, short)]
    pub plot: bool,
    /// Config to write, or PHY trace to read with --plot
    #[arg(long, short = 'f', default_value = "coverage.json")]
    pub file_name: PathBuf,
    #[arg(long, short = 'z', default_value_t = 10.0)]
    pub height: f64,
    #[arg(long, short, num_args = 2, value_names = ["X", "Y"], default_values_t = [0.0, 0.0], allow_negative_numbers = true)]
    pub origin: Vec<f64>,
    #[arg(long, value_enum, default_value_t = OriginType::Center)]
    pub origin_type: OriginType,
    /// Side of the covered square [m]
    #[arg(long, short = 'w', default_value_t = 200.0)]
    pub size: f64,
    #[arg(long, short, default_value_t = 10)]
    pub steps: usize,
    #[arg(long, value_enum, default_value_t = Direction::X)]
    pub direction: Direction,
    #[arg(long, short, default_value_t = 100.0)]
    pub duration: f64,
    #[arg(long, short, default_value_t = 0.1)]
    pub rest_time: f64,
    #[arg(long, value_enum, default_value_t = TrajectoryKind::Waypoints)]
    pub trajectory_type: TrajectoryKind,
}

impl CoverageArgs {
    fn spec(&self) -> CoverageSpec {
        CoverageSpec {
            origin: (
                self.origin.first().copied().unwrap_or(0.0),
                self.origin.get(1).copied().unwrap_or(0.0),
            ),
            origin_is_center: self.origin_type == OriginType::Center,
            height: self.height,
            size: self.size,
            steps: self.steps,
            direction: self.direction.into(),
            duration: self.duration,
            rest_time: self.rest_time,
        }
    }
}

/// Serpentine path over a square area: either its scenario config or, with
/// `--plot`, the signal measured along it.
pub fn coverage_path(args: &CoverageArgs) -> anyhow::Result<Vec<PathBuf>> {
    let path = CoveragePath::plan(&args.spec()).context("planning the coverage path")?;
    if path.is_too_fast() {
        warn!(
            "the drone is traveling too fast ({:.1} km/h), results might be unrealistic",
            path.speed * 3.6
        );
    }

    if args.plot {
        let text = fs::read_to_string(&args.file_name)
            .with_context(|| format!("reading PHY trace {}", args.file_name.display()))?;
        let samples = parse_phy_trace(&text)
            .with_context(|| format!("parsing PHY trace {}", args.file_name.display()))?;
        let (rsrp, sinr) = render_signal_maps(&path, &samples, &args.file_name)?;
        println!("{} samples -> {}, {}", samples.len(), rsrp.display(), sinr.display());
        return Ok(vec![rsrp, sinr]);
    }

    let config = coverage_config(&path, args.duration, args.trajectory_type);
    write_json(&args.file_name, &config, b"\t")?;
    println!(
        "{} points at {} m/s -> {}",
        path.points.len(),
        path.speed,
        args.file_name.display()
    );
    Ok(vec![args.file_name.clone()])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioKind {
    /// LEO constellation tracing
    Leo,
    /// Five cars with different mobility models
    Vehicles,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[arg(value_enum)]
    pub kind: ScenarioKind,
    /// `altitude:inclination:planes:sats`, repeatable (leo only)
    #[arg(long = "orbit")]
    pub orbits: Vec<Orbit>,
    /// Scenario name (leo only)
    #[arg(long)]
    pub name: Option<String>,
    /// Simulated seconds (leo only)
    #[arg(long)]
    pub duration: Option<f64>,
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Writes a generated scenario document.
pub fn generate(args: &GenerateArgs) -> anyhow::Result<PathBuf> {
    let (scenario, default_output) = match args.kind {
        ScenarioKind::Leo => {
            let mut config = LeoConfig::default();
            if !args.orbits.is_empty() {
                config.orbits = args.orbits.clone();
            }
            if let Some(name) = &args.name {
                config.name = name.clone();
            }
            if let Some(duration) = args.duration {
                config.duration = duration;
            }
            let scenario = build_leo_scenario(&config);
            let total = scenario["leo-sats"].as_array().map_or(0, Vec::len);
            for orbit in &config.orbits {
                println!(
                    "- orbit {} km, {} deg: {} planes x {} satellites",
                    orbit.altitude_km, orbit.inclination_deg, orbit.planes, orbit.sats_per_plane
                );
            }
            println!("{} satellites", total);
            (scenario, format!("{}.json", config.name))
        }
        ScenarioKind::Vehicles => {
            let scenario = build_vehicle_scenario();
            for (i, model) in model_names(&scenario).iter().enumerate() {
                println!("- vehicle {}: {}", i + 1, model);
            }
            (scenario, "vehicle-tracing-example.json".to_string())
        }
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_output));
    write_json(&output, &scenario, b"  ")?;
    println!("configuration saved to {}", output.display());
    Ok(output)
}

#[derive(Args, Debug)]
pub struct CampaignArgs {
    #[arg(long)]
    pub template: Option<PathBuf>,
    #[arg(long)]
    pub prefix: Option<String>,
    /// Simulator binary, run once per configuration with `--config=`
    #[arg(long)]
    pub executable: Option<PathBuf>,
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,
    #[arg(long)]
    pub workers: Option<usize>,
    /// Only write the configurations
    #[arg(long)]
    pub dry_run: bool,
}

/// Frequency sweep: one configuration per frequency, then one simulator run
/// per configuration.
pub fn campaign(args: &CampaignArgs, config: &WorkflowConfig) -> anyhow::Result<Vec<PathBuf>> {
    let mut settings = config.campaign.clone();
    if let Some(template) = &args.template {
        settings.template = template.clone();
    }
    if let Some(prefix) = &args.prefix {
        settings.prefix = prefix.clone();
    }
    if let Some(executable) = &args.executable {
        settings.executable = executable.clone();
    }
    if let Some(dir) = &args.scratch_dir {
        settings.scratch_dir = dir.clone();
    }

    let template = ScenarioConfig::load(&settings.template)
        .with_context(|| format!("loading template {}", settings.template.display()))?;
    let configs = write_configs(template.document(), &settings)?;
    if configs.is_empty() {
        bail!(
            "empty frequency sweep {} - {} step {}",
            settings.start_hz,
            settings.stop_hz,
            settings.step_hz
        );
    }
    println!("{} configurations in {}", configs.len(), settings.scratch_dir.display());
    if args.dry_run {
        return Ok(configs);
    }

    let pool = WorkerPool::new(args.workers.unwrap_or(config.capture.workers));
    run_simulations(&pool, &settings.executable, &configs)?;
    Ok(configs)
}

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Scenario files or directories searched recursively for `*.json`
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// Report what would change without writing
    #[arg(long)]
    pub dry_run: bool,
}

fn collect_json(path: &Path, found: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    if path.is_file() {
        found.push(path.to_path_buf());
        return Ok(());
    }
    if !path.is_dir() {
        bail!("{} is neither a file nor a directory", path.display());
    }
    let mut entries = fs::read_dir(path)
        .with_context(|| format!("listing {}", path.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("listing {}", path.display()))?;
    entries.sort();
    for entry in entries {
        if entry.is_dir() {
            collect_json(&entry, found)?;
        } else if entry.extension().is_some_and(|ext| ext == "json") {
            found.push(entry);
        }
    }
    Ok(())
}

fn migrate_files(
    args: &MigrateArgs,
    rewrite: fn(&str) -> Option<String>,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in &args.paths {
        collect_json(path, &mut files)?;
    }
    info!("{} scenario files to check", files.len());

    let mut updated = Vec::new();
    for file in files {
        let content =
            fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
        match rewrite(&content) {
            Some(text) if text != content => {
                if !args.dry_run {
                    fs::write(&file, text).with_context(|| format!("writing {}", file.display()))?;
                }
                println!("Updated {}", file.display());
                updated.push(file);
            }
            _ => println!("No changes {}", file.display()),
        }
    }
    Ok(updated)
}

/// Moves Li-Ion energy sources to the generic battery model.
pub fn migrate_battery_files(args: &MigrateArgs) -> anyhow::Result<Vec<PathBuf>> {
    migrate_files(args, migrate_battery)
}

/// Folds `RemoteAddress`/`RemotePort` pairs into a single `Remote`.
pub fn migrate_remote_files(args: &MigrateArgs) -> anyhow::Result<Vec<PathBuf>> {
    migrate_files(args, migrate_remote)
}
