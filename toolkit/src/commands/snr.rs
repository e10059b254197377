use super::{output_path, write_rows};
use crate::plot::{Chart, Series};
use anyhow::{bail, Context};
use clap::Args;
use iodcore::metrics::snr::{average_traces, load_trace, seed_runs, SnrSample, DEFAULT_RUN_PREFIX, TRACE_FILE};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct SnrAverageArgs {
    /// Directory holding one results directory per seed
    pub root: PathBuf,
    #[arg(long, default_value = DEFAULT_RUN_PREFIX)]
    pub prefix: String,
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

/// Averages the SNR trace of every seed run, row by row.
pub fn run(args: &SnrAverageArgs) -> anyhow::Result<Vec<SnrSample>> {
    let runs = seed_runs(&args.root, &args.prefix)
        .with_context(|| format!("listing seed runs under {}", args.root.display()))?;
    if runs.is_empty() {
        bail!(
            "no {}* results directory under {}",
            args.prefix,
            args.root.display()
        );
    }

    let mut traces = Vec::with_capacity(runs.len());
    for (seed, dir) in &runs {
        let trace = load_trace(&dir.join(TRACE_FILE))
            .with_context(|| format!("reading the trace of seed {}", seed))?;
        println!("seed {}: {} samples", seed, trace.len());
        traces.push(trace);
    }
    let average = average_traces(&traces);

    write_rows(&output_path(&args.out_dir, "snr-average.csv")?, &average)?;
    let series = |name: &str, value: fn(&SnrSample) -> f64| {
        Series::new(name, average.iter().map(|s| (s.time, value(s))).collect())
    };
    Chart {
        path: &output_path(&args.out_dir, "snr-average.svg")?,
        title: &format!("SNR averaged over {} seeds", runs.len()),
        x_desc: "time [s]",
        y_desc: "SNR [dB]",
    }
    .lines(&[series("SNR", |s| s.snr)])?;
    Chart {
        path: &output_path(&args.out_dir, "propagation-loss-average.svg")?,
        title: &format!("Propagation loss averaged over {} seeds", runs.len()),
        x_desc: "time [s]",
        y_desc: "loss [dB]",
    }
    .lines(&[series("propagation loss", |s| s.propagation_loss)])?;
    Ok(average)
}
