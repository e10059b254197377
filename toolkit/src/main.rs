use clap::{Parser, Subcommand};
use commands::capture as pcap;
use commands::{
    convert, delivery, geo, latency, loss, report, scenario, snr, throughput, trajectory,
};
use log::debug;
use std::path::PathBuf;
use workflow::WorkflowConfig;

mod capture;
mod commands;
mod generator;
mod plot;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Post-processing and scenario tools for IoD Sim runs")]
struct Cli {
    /// Load trace, capture and campaign settings from YAML
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// PDR/PLR of every flow in a simulation report
    Delivery(delivery::DeliveryArgs),
    /// PDR of every drone against its distance from the ZSP
    DeliveryDistance(delivery::DeliveryArgs),
    /// Trajectories and RSSI recorded in a simulation report
    ReportView(report::ReportViewArgs),
    /// Bézier trajectories of the drones in a scenario
    Preview(trajectory::PreviewArgs),
    /// Parametric-speed mobility model from a waypoint list
    FlightPlan(trajectory::FlightPlanArgs),
    /// One-way LTE latency per node
    Latency(latency::LatencyArgs),
    /// One-way latency through the WiFi/LTE NAT per cluster
    LatencyNat(latency::LatencyNatArgs),
    /// Packet loss ratio per host
    Loss(loss::LossArgs),
    /// PDR per ground unit from pcap captures
    PcapPdr(pcap::PcapPdrArgs),
    /// Mean WiFi SINR per host from radiotap captures
    WifiSinr(pcap::WifiSinrArgs),
    /// Per-second LTE uplink throughput of every drone
    Throughput(throughput::ThroughputArgs),
    /// SNR and propagation loss averaged over seed runs
    SnrAverage(snr::SnrAverageArgs),
    /// KML view of logged geographic positions
    Kml(convert::KmlArgs),
    /// Radio environment map to PLY point cloud
    RemPly(convert::RemPlyArgs),
    /// Mobility trace export to a tar of gzip CSVs
    MobilityBundle(convert::MobilityBundleArgs),
    /// Summary of LEO and vehicle geographic traces
    GeoInspect(geo::GeoInspectArgs),
    /// Serpentine coverage path config, or the signal measured along it
    CoveragePath(scenario::CoverageArgs),
    /// LEO constellation or vehicle tracing scenario
    Generate(scenario::GenerateArgs),
    /// Frequency sweep: generate configurations and run the simulator
    Campaign(scenario::CampaignArgs),
    /// Move Li-Ion energy sources to the generic battery model
    MigrateBattery(scenario::MigrateArgs),
    /// Fold RemoteAddress/RemotePort pairs into Remote
    MigrateRemote(scenario::MigrateArgs),
}

fn dispatch(command: &Command, config: &WorkflowConfig) -> anyhow::Result<()> {
    match command {
        Command::Delivery(args) => delivery::run(args).map(drop),
        Command::DeliveryDistance(args) => delivery::run_distance(args),
        Command::ReportView(args) => report::run(args),
        Command::Preview(args) => trajectory::preview(args),
        Command::FlightPlan(args) => trajectory::flight_plan(args),
        Command::Latency(args) => latency::run(args, config),
        Command::LatencyNat(args) => latency::run_nat(args, config),
        Command::Loss(args) => loss::run(args, config).map(drop),
        Command::PcapPdr(args) => pcap::pcap_pdr(args, config).map(drop),
        Command::WifiSinr(args) => pcap::wifi_sinr(args, config).map(drop),
        Command::Throughput(args) => throughput::run(args).map(drop),
        Command::SnrAverage(args) => snr::run(args).map(drop),
        Command::Kml(args) => convert::kml(args, config).map(drop),
        Command::RemPly(args) => convert::rem_ply(args).map(drop),
        Command::MobilityBundle(args) => convert::mobility_bundle(args).map(drop),
        Command::GeoInspect(args) => geo::run(args).map(drop),
        Command::CoveragePath(args) => scenario::coverage_path(args).map(drop),
        Command::Generate(args) => scenario::generate(args).map(drop),
        Command::Campaign(args) => scenario::campaign(args, config).map(drop),
        Command::MigrateBattery(args) => scenario::migrate_battery_files(args).map(drop),
        Command::MigrateRemote(args) => scenario::migrate_remote_files(args).map(drop),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = WorkflowConfig::load_or_default(cli.config.as_deref())?;
    debug!("workflow config: {:?}", config);
    dispatch(&cli.command, &config)
}
