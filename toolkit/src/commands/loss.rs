use super::latency::{lte_sources, nat_sources};
use super::output_path;
use crate::generator::write_json;
use crate::plot::Chart;
use crate::workflow::WorkflowConfig;
use anyhow::bail;
use clap::Args;
use iodcore::metrics::host_losses;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct LossArgs {
    /// Application log of the LTE clients
    #[arg(long, conflicts_with = "wifi_tx")]
    pub tx_log: Option<PathBuf>,
    /// Wi-Fi PHY traces of ground units behind the port NAT
    #[arg(long, num_args = 1.., requires = "scenario_log")]
    pub wifi_tx: Vec<PathBuf>,
    /// Scenario log holding the port NAT mappings
    #[arg(long)]
    pub scenario_log: Option<PathBuf>,
    #[arg(long)]
    pub rx_trace: PathBuf,
    /// Ignore packets still in flight when the simulation ended
    #[arg(long)]
    pub trim: bool,
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

/// Packet loss ratio of every transmitting host, keyed by address.
pub fn run(args: &LossArgs, config: &WorkflowConfig) -> anyhow::Result<BTreeMap<String, f64>> {
    let (tx, rx) = match (&args.tx_log, &args.scenario_log) {
        (Some(tx_log), _) => lte_sources(&config.traces, tx_log, &args.rx_trace)?,
        (None, Some(log)) if !args.wifi_tx.is_empty() => {
            nat_sources(&config.traces, &args.wifi_tx, &args.rx_trace, log)?
        }
        _ => bail!("either --tx-log or --wifi-tx with --scenario-log is required"),
    };

    let plr: BTreeMap<String, f64> = host_losses(&tx, &rx, args.trim)
        .into_iter()
        .map(|(host, loss)| (host.to_string(), loss))
        .collect();
    println!("{}", serde_json::to_string(&plr)?);

    write_json(&output_path(&args.out_dir, "loss.json")?, &plr, b"  ")?;
    let hosts: Vec<String> = plr.keys().cloned().collect();
    Chart {
        path: &output_path(&args.out_dir, "loss.svg")?,
        title: "Packet loss ratio",
        x_desc: "host",
        y_desc: "PLR",
    }
    .bars(&hosts, &[("PLR".to_string(), plr.values().copied().collect())])?;
    Ok(plr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::latency::tests::{RX_TRACE, SCENARIO_LOG, TX_LOG, WIFI_TX};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn args(dir: &Path) -> LossArgs {
        LossArgs {
            tx_log: None,
            wifi_tx: Vec::new(),
            scenario_log: None,
            rx_trace: write(dir, "rx.tr", RX_TRACE),
            trim: false,
            out_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn lte_loss_with_and_without_trimming() {
        let dir = tempdir().unwrap();
        let mut args = args(dir.path());
        args.tx_log = Some(write(dir.path(), "tx.log", TX_LOG));

        let plr = run(&args, &WorkflowConfig::default()).unwrap();
        assert!((plr["7.0.0.2"] - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(plr["7.0.0.3"], 0.0);

        args.trim = true;
        let plr = run(&args, &WorkflowConfig::default()).unwrap();
        assert_eq!(plr["7.0.0.2"], 0.0);

        let saved: BTreeMap<String, f64> =
            serde_json::from_str(&fs::read_to_string(dir.path().join("loss.json")).unwrap()).unwrap();
        assert_eq!(saved, plr);
    }

    #[test]
    fn nat_loss_is_keyed_by_ground_unit() {
        let dir = tempdir().unwrap();
        let mut args = args(dir.path());
        args.wifi_tx = vec![write(dir.path(), "wifi.log", WIFI_TX)];
        args.scenario_log = Some(write(dir.path(), "scenario.log", SCENARIO_LOG));

        let plr = run(&args, &WorkflowConfig::default()).unwrap();
        assert_eq!(plr.keys().collect::<Vec<_>>(), vec!["10.1.0.7"]);
        assert!((plr["10.1.0.7"] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn a_transmission_source_is_required() {
        let dir = tempdir().unwrap();
        assert!(run(&args(dir.path()), &WorkflowConfig::default()).is_err());
    }
}
