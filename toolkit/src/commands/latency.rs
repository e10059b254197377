use super::{output_path, write_rows};
use crate::plot::Chart;
use crate::workflow::config::TraceSettings;
use crate::workflow::WorkflowConfig;
use anyhow::Context;
use clap::Args;
use iodcore::metrics::host_latencies;
use iodcore::prelude::parse_file;
use iodcore::traces::seqts::{first_per_sn, group_by_host};
use iodcore::traces::{PnatTable, RxSeqTsParser, SeqTsRecord, TxSeqTsParser, WifiTxParser};
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

pub type HostRecords = BTreeMap<Ipv4Addr, Vec<SeqTsRecord>>;

const MS_PER_S: f64 = 1e3;

fn receptions(settings: &TraceSettings, rx_trace: &Path) -> anyhow::Result<Vec<SeqTsRecord>> {
    let parser = RxSeqTsParser::new(&settings.lte_prefix, settings.sink_port)?;
    let parsed = parse_file(&parser, rx_trace)
        .with_context(|| format!("reading rx trace {}", rx_trace.display()))?;
    info!(
        "{}: {} receptions, {} other lines",
        rx_trace.display(),
        parsed.matched,
        parsed.skipped
    );
    Ok(parsed.records)
}

/// Transmissions from the application log and receptions at the remote
/// server, both keyed by the LTE address of the sender.
pub fn lte_sources(
    settings: &TraceSettings,
    tx_log: &Path,
    rx_trace: &Path,
) -> anyhow::Result<(HostRecords, HostRecords)> {
    let parser = TxSeqTsParser::new(&settings.server, &settings.lte_prefix, settings.id_offset)?;
    let tx = parse_file(&parser, tx_log)
        .with_context(|| format!("reading tx log {}", tx_log.display()))?
        .records;
    let rx = receptions(settings, rx_trace)?;
    Ok((group_by_host(tx), group_by_host(rx)))
}

/// Transmissions of ground units behind the port NAT, from their Wi-Fi PHY
/// traces, and receptions at the remote server mapped back to the ground
/// unit through the NAT table of the scenario log.
pub fn nat_sources(
    settings: &TraceSettings,
    wifi_tx: &[PathBuf],
    rx_trace: &Path,
    scenario_log: &Path,
) -> anyhow::Result<(HostRecords, HostRecords)> {
    let parser = WifiTxParser::new(&settings.server)?;
    let mut tx = Vec::new();
    for path in wifi_tx {
        let records = parse_file(&parser, path)
            .with_context(|| format!("reading wifi trace {}", path.display()))?
            .records;
        tx.extend(first_per_sn(records));
    }

    let pnat = PnatTable::load(scenario_log)
        .with_context(|| format!("reading NAT table from {}", scenario_log.display()))?;
    info!("{} NAT mappings", pnat.len());

    let mut rx = Vec::new();
    for mut record in receptions(settings, rx_trace)? {
        let internal = record.port.and_then(|port| pnat.resolve(record.host, port));
        match internal {
            Some(host) => {
                record.host = host;
                rx.push(record);
            }
            None => warn!(
                "no NAT mapping for {}:{:?} (seq {}), skipping",
                record.host, record.port, record.sn
            ),
        }
    }
    Ok((group_by_host(tx), group_by_host(rx)))
}

fn box_plot(path: &Path, latencies: &BTreeMap<Ipv4Addr, Vec<f64>>, unit: &str) -> anyhow::Result<()> {
    let samples: Vec<(String, Vec<f64>)> = latencies
        .iter()
        .map(|(host, values)| (host.to_string(), values.clone()))
        .collect();
    Chart {
        path,
        title: "End-to-end latency",
        x_desc: "GU IP Address",
        y_desc: &format!("Latency [{}]", unit),
    }
    .boxes(&samples)
}

#[derive(Args, Debug)]
pub struct LatencyArgs {
    /// Application log of the LTE clients
    #[arg(long)]
    pub tx_log: PathBuf,
    /// Ascii trace of the remote server link
    #[arg(long)]
    pub rx_trace: PathBuf,
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct NodeLatency {
    #[serde(rename = "NodeID")]
    pub node_id: usize,
    pub latency: f64,
}

/// One row per received packet, nodes numbered from 1 in address order.
pub fn node_rows(latencies: &BTreeMap<Ipv4Addr, Vec<f64>>) -> Vec<NodeLatency> {
    latencies
        .values()
        .enumerate()
        .flat_map(|(index, values)| {
            values.iter().map(move |&latency| NodeLatency {
                node_id: index + 1,
                latency,
            })
        })
        .collect()
}

pub fn run(args: &LatencyArgs, config: &WorkflowConfig) -> anyhow::Result<()> {
    let (tx, rx) = lte_sources(&config.traces, &args.tx_log, &args.rx_trace)?;
    let latencies = host_latencies(&tx, &rx);
    for (host, values) in &latencies {
        println!("{}: {} packets", host, values.len());
    }

    write_rows(
        &output_path(&args.out_dir, "latency_lte.csv")?,
        node_rows(&latencies),
    )?;
    box_plot(&output_path(&args.out_dir, "latency_lte.svg")?, &latencies, "s")
}

#[derive(Args, Debug)]
pub struct LatencyNatArgs {
    /// Wi-Fi PHY traces of the ground units, one per host
    #[arg(long, num_args = 1.., required = true)]
    pub wifi_tx: Vec<PathBuf>,
    #[arg(long)]
    pub rx_trace: PathBuf,
    /// Scenario log holding the port NAT mappings
    #[arg(long)]
    pub scenario_log: PathBuf,
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ClusterLatency {
    #[serde(rename = "ClusterID")]
    pub cluster_id: u8,
    #[serde(rename = "IPAddr")]
    pub ip_addr: usize,
    pub latency: f64,
}

/// Rows grouped by ground unit; the cluster is the second address byte and
/// ground units are numbered from 1 across clusters.
pub fn cluster_rows(latencies: &BTreeMap<Ipv4Addr, Vec<f64>>) -> Vec<ClusterLatency> {
    latencies
        .iter()
        .enumerate()
        .flat_map(|(index, (host, values))| {
            let cluster_id = host.octets()[1];
            values.iter().map(move |&latency| ClusterLatency {
                cluster_id,
                ip_addr: index + 1,
                latency,
            })
        })
        .collect()
}

pub fn run_nat(args: &LatencyNatArgs, config: &WorkflowConfig) -> anyhow::Result<()> {
    let (tx, rx) = nat_sources(&config.traces, &args.wifi_tx, &args.rx_trace, &args.scenario_log)?;
    let latencies: BTreeMap<Ipv4Addr, Vec<f64>> = host_latencies(&tx, &rx)
        .into_iter()
        .map(|(host, values)| (host, values.into_iter().map(|v| v * MS_PER_S).collect()))
        .collect();
    for (host, values) in &latencies {
        println!("{}: {} packets", host, values.len());
    }

    write_rows(
        &output_path(&args.out_dir, "latency_wifi+lte.csv")?,
        cluster_rows(&latencies),
    )?;
    box_plot(&output_path(&args.out_dir, "latency_wifi+lte.svg")?, &latencies, "ms")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    pub(crate) const TX_LOG: &str = "\
+1.000000000s 0 UdpEchoClient:Send(): Sent 12 bytes to 200.0.0.1 port 1337 ns3::SeqTsHeader ((seq=0 time=+1s))
+1.500000000s 1 UdpEchoClient:Send(): Sent 12 bytes to 200.0.0.1 port 1337 ns3::SeqTsHeader ((seq=0 time=+1.5s))
+2.000000000s 0 UdpEchoClient:Send(): Sent 12 bytes to 200.0.0.1 port 1337 ns3::SeqTsHeader ((seq=1 time=+2s))
+3.000000000s 0 UdpEchoClient:Send(): Sent 12 bytes to 200.0.0.1 port 1337 ns3::SeqTsHeader ((seq=2 time=+3s))
";

    pub(crate) const RX_TRACE: &str = "\
r 1.25 /NodeList/35/DeviceList/1/$ns3::PointToPointNetDevice/MacRx ns3::Ipv4Header (length: 40 7.0.0.2 > 200.0.0.1) ns3::UdpHeader (length: 20 1 > 1337) ns3::SeqTsHeader ((seq=0 time=+1s))
r 1.75 /NodeList/35/DeviceList/1/$ns3::PointToPointNetDevice/MacRx ns3::Ipv4Header (length: 40 7.0.0.3 > 200.0.0.1) ns3::UdpHeader (length: 20 1 > 1337) ns3::SeqTsHeader ((seq=0 time=+1.5s))
r 2.5 /NodeList/35/DeviceList/1/$ns3::PointToPointNetDevice/MacRx ns3::Ipv4Header (length: 40 7.0.0.2 > 200.0.0.1) ns3::UdpHeader (length: 20 1 > 1337) ns3::SeqTsHeader ((seq=1 time=+2s))
r 2.6 /NodeList/35/DeviceList/1/$ns3::PointToPointNetDevice/MacRx ns3::Ipv4Header (length: 40 7.0.0.9 > 200.0.0.1) ns3::UdpHeader (length: 20 4 > 1337) ns3::SeqTsHeader ((seq=7 time=+2s))
";

    pub(crate) const WIFI_TX: &str = "\
t 1.0 /NodeList/4/DeviceList/0/$ns3::WifiNetDevice/Phy/State/Tx HeMcs5 ns3::Ipv4Header (length: 40 10.1.0.7 > 200.0.0.1) ns3::UdpHeader (length: 20 49153 > 1337) ns3::SeqTsHeader ((seq=0 time=+1s))
t 1.1 /NodeList/4/DeviceList/0/$ns3::WifiNetDevice/Phy/State/Tx HeMcs5 ns3::Ipv4Header (length: 40 10.1.0.7 > 200.0.0.1) ns3::UdpHeader (length: 20 49153 > 1337) ns3::SeqTsHeader ((seq=0 time=+1s))
t 2.0 /NodeList/4/DeviceList/0/$ns3::WifiNetDevice/Phy/State/Tx HeMcs5 ns3::Ipv4Header (length: 40 10.1.0.7 > 200.0.0.1) ns3::UdpHeader (length: 20 49153 > 1337) ns3::SeqTsHeader ((seq=1 time=+2s))
t 3.0 /NodeList/4/DeviceList/0/$ns3::WifiNetDevice/Phy/State/Tx HeMcs5 ns3::Ipv4Header (length: 40 10.1.0.7 > 200.0.0.1) ns3::UdpHeader (length: 20 49153 > 1337) ns3::SeqTsHeader ((seq=2 time=+3s))
";

    pub(crate) const SCENARIO_LOG: &str = "\
+0.5s 12 Ipv4PnatL3Protocol: mapping 10.1.0.7:49153 -> 7.0.0.2:1
+0.5s 12 Ipv4PnatL3Protocol: mapping 10.2.0.3:49153 -> 7.0.0.3:1
";

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn lte_latency_per_node() {
        let dir = tempdir().unwrap();
        let args = LatencyArgs {
            tx_log: write(dir.path(), "tx.log", TX_LOG),
            rx_trace: write(dir.path(), "rx.tr", RX_TRACE),
            out_dir: dir.path().to_path_buf(),
        };
        run(&args, &WorkflowConfig::default()).unwrap();

        let csv = fs::read_to_string(dir.path().join("latency_lte.csv")).unwrap();
        assert_eq!(csv, "NodeID,latency\n1,0.25\n1,0.5\n2,0.25\n");
        assert!(dir.path().join("latency_lte.svg").exists());
    }

    #[test]
    fn nat_receptions_map_back_to_ground_units() {
        let dir = tempdir().unwrap();
        let (tx, rx) = nat_sources(
            &TraceSettings::default(),
            &[write(dir.path(), "wifi-phy-0-drones-host-4-0.log", WIFI_TX)],
            &write(dir.path(), "internet-41-1.tr", RX_TRACE),
            &write(dir.path(), "scenario.log", SCENARIO_LOG),
        )
        .unwrap();

        let gu = Ipv4Addr::new(10, 1, 0, 7);
        assert_eq!(tx[&gu].len(), 3);
        assert_eq!(tx[&gu][0].time_s, 1.0);
        assert_eq!(rx[&gu].len(), 2);
        assert_eq!(rx[&Ipv4Addr::new(10, 2, 0, 3)].len(), 1);
        assert_eq!(rx.len(), 2);
    }

    #[test]
    fn cluster_rows_number_hosts_across_clusters() {
        let mut latencies = BTreeMap::new();
        latencies.insert(Ipv4Addr::new(10, 2, 0, 3), vec![4.0]);
        latencies.insert(Ipv4Addr::new(10, 1, 0, 7), vec![1.0, 2.0]);
        let rows = cluster_rows(&latencies);
        assert_eq!(
            rows,
            vec![
                ClusterLatency { cluster_id: 1, ip_addr: 1, latency: 1.0 },
                ClusterLatency { cluster_id: 1, ip_addr: 1, latency: 2.0 },
                ClusterLatency { cluster_id: 2, ip_addr: 2, latency: 4.0 },
            ]
        );
    }

    #[test]
    fn nat_latency_is_in_milliseconds() {
        let dir = tempdir().unwrap();
        let args = LatencyNatArgs {
            wifi_tx: vec![write(dir.path(), "wifi.log", WIFI_TX)],
            rx_trace: write(dir.path(), "rx.tr", RX_TRACE),
            scenario_log: write(dir.path(), "scenario.log", SCENARIO_LOG),
            out_dir: dir.path().to_path_buf(),
        };
        run_nat(&args, &WorkflowConfig::default()).unwrap();

        let csv = fs::read_to_string(dir.path().join("latency_wifi+lte.csv")).unwrap();
        assert_eq!(csv, "ClusterID,IPAddr,latency\n1,1,250.0\n1,1,500.0\n");
    }
}
