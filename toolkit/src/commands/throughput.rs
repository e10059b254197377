use anyhow::Context;
use clap::Args;
use iodcore::metrics::throughput::load_ul_mac_stats;
use iodcore::metrics::{bucket_throughput, ThroughputBucket, ThroughputUnit};
use std::path::{Path, PathBuf};

const INPUT_PREFIX: &str = "lte-UlMacStats-drone";
const OUTPUT_PREFIX: &str = "lte-throughput-drone";

#[derive(Args, Debug)]
pub struct ThroughputArgs {
    /// Number of simulated drones
    pub drones: usize,
    /// Results directory of the run
    pub results: PathBuf,
    /// Report throughput in Mbps instead of kbps
    #[arg(long)]
    pub mbps: bool,
}

fn write_buckets(path: &Path, buckets: &[ThroughputBucket], unit: ThroughputUnit) -> anyhow::Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["time", "cellid", unit.label()])?;
    for bucket in buckets {
        writer.write_record([
            bucket.time.to_string(),
            bucket.cell_id.to_string(),
            bucket.value.to_string(),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("writing {}", path.display()))
}

/// Per-second uplink throughput of every drone, one CSV next to each
/// MAC stats trace.
pub fn run(args: &ThroughputArgs) -> anyhow::Result<Vec<PathBuf>> {
    let unit = if args.mbps {
        ThroughputUnit::Mbps
    } else {
        ThroughputUnit::Kbps
    };

    let mut written = Vec::with_capacity(args.drones);
    for drone in 0..args.drones {
        let input = args.results.join(format!("{}_{}.csv", INPUT_PREFIX, drone));
        let samples = load_ul_mac_stats(&input)
            .with_context(|| format!("reading MAC stats of drone {}", drone))?;
        let buckets = bucket_throughput(&samples, unit);

        let output = args.results.join(format!("{}_{}.csv", OUTPUT_PREFIX, drone));
        write_buckets(&output, &buckets, unit)?;
        println!("drone {}: {} seconds -> {}", drone, buckets.len(), output.display());
        written.push(output);
    }
    Ok(written)
}
