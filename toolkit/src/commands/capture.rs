use super::{output_path, write_rows};
use crate::capture::tshark::{count_values, field_job, float_values, source_filter};
use crate::capture::{Job, JobOutput, WorkerPool};
use crate::plot::Chart;
use crate::workflow::config::SinrSettings;
use crate::workflow::WorkflowConfig;
use anyhow::Context;
use clap::Args;
use iodcore::math::StatsHelper;
use iodcore::traces::PnatTable;
use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

fn run_all(pool: &WorkerPool, jobs: Vec<Job>) -> anyhow::Result<Vec<JobOutput>> {
    let outputs = pool.run(jobs)?;
    for output in &outputs {
        output.ensure_success()?;
    }
    Ok(outputs)
}

#[derive(Args, Debug)]
pub struct PcapPdrArgs {
    /// Results directory of the run
    pub results: PathBuf,
    /// Scenario log holding the port NAT mappings
    #[arg(long)]
    pub scenario_log: PathBuf,
    /// Capture of the internet link; derived from the stack sizes if omitted
    #[arg(long)]
    pub internet_pcap: Option<PathBuf>,
    #[arg(long)]
    pub workers: Option<usize>,
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct UnitDelivery {
    #[serde(rename = "GU IP Addr")]
    pub unit: String,
    #[serde(rename = "PDR [%]")]
    pub pdr: f64,
}

/// Packets sent by every ground unit against the packets of its NAT
/// endpoints seen on the internet link. Endpoints that share a ground unit
/// are summed; units never seen on the internet link get a PDR of 0.
pub fn pdr_per_unit(
    sent: &BTreeMap<String, u64>,
    internet: &BTreeMap<String, u64>,
    pnat: &PnatTable,
) -> Vec<UnitDelivery> {
    let mut received: BTreeMap<String, u64> = BTreeMap::new();
    for (endpoint, count) in internet {
        let resolved = endpoint.split_once(':').and_then(|(ip, port)| {
            let ip: Ipv4Addr = ip.parse().ok()?;
            pnat.resolve(ip, port.parse().ok()?)
        });
        match resolved {
            Some(unit) => *received.entry(unit.to_string()).or_insert(0) += count,
            None => debug!("{} is not behind the NAT", endpoint),
        }
    }

    sent.iter()
        .filter(|(unit, count)| !unit.is_empty() && **count > 0)
        .map(|(unit, count)| UnitDelivery {
            unit: unit.clone(),
            pdr: received.get(unit).copied().unwrap_or(0) as f64 * 100.0 / *count as f64,
        })
        .collect()
}

/// UDP traffic from the ground units of a stack. A stack with a single
/// unit has no sources to restrict to.
pub fn sent_filter(prefix: &str, units: u32) -> String {
    let sources = source_filter(prefix, units);
    if sources.is_empty() {
        "udp and not icmp".to_string()
    } else {
        format!("udp and not icmp and ({})", sources)
    }
}

/// Index of the internet node in a Wi-Fi + LTE scenario: every drone and
/// every stack gateway come first.
pub fn internet_node(units: &[u32]) -> u32 {
    units.iter().sum::<u32>() + units.len() as u32 + 1
}

pub fn pcap_pdr(args: &PcapPdrArgs, config: &WorkflowConfig) -> anyhow::Result<Vec<UnitDelivery>> {
    let capture = &config.capture;
    let pool = WorkerPool::new(args.workers.unwrap_or(capture.workers));

    let mut jobs: Vec<Job> = capture
        .stacks
        .iter()
        .enumerate()
        .map(|(i, stack)| {
            let pcap = args
                .results
                .join(format!("wifi-phy-{}-drones-host-{}-2.pcap", i, i));
            let filter = sent_filter(&stack.prefix, stack.units);
            field_job(&capture.tshark, &pcap, &["ip.src"], &filter)
        })
        .collect();

    let units: Vec<u32> = capture.stacks.iter().map(|s| s.units).collect();
    let internet_pcap = args.internet_pcap.clone().unwrap_or_else(|| {
        args.results
            .join(format!("internet-{}-1.pcap", internet_node(&units)))
    });
    jobs.push(field_job(
        &capture.tshark,
        &internet_pcap,
        &["ip.src", "udp.srcport"],
        "udp",
    ));

    let mut outputs = run_all(&pool, jobs)?;
    let internet = outputs
        .pop()
        .map(|o| count_values(&o.stdout))
        .unwrap_or_default();
    let mut sent = BTreeMap::new();
    for output in &outputs {
        sent.extend(count_values(&output.stdout));
    }

    let pnat = PnatTable::load(&args.scenario_log)
        .with_context(|| format!("reading NAT table from {}", args.scenario_log.display()))?;
    let pdr = pdr_per_unit(&sent, &internet, &pnat);
    for row in &pdr {
        println!("{}: {:.2}%", row.unit, row.pdr);
    }

    write_rows(&output_path(&args.out_dir, "pcap-pdr.csv")?, &pdr)?;
    let labels: Vec<String> = pdr.iter().map(|r| r.unit.clone()).collect();
    Chart {
        path: &output_path(&args.out_dir, "pcap-pdr.svg")?,
        title: "PDR per ground unit",
        x_desc: "GU IP Addr",
        y_desc: "PDR [%]",
    }
    .bars(&labels, &[("PDR".to_string(), pdr.iter().map(|r| r.pdr).collect())])?;
    Ok(pdr)
}

#[derive(Args, Debug)]
pub struct WifiSinrArgs {
    /// Results directory of the run
    pub results: PathBuf,
    #[arg(long)]
    pub workers: Option<usize>,
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

/// Host id encoded in `wifi-phy-<phy>-<role>-host-<id>-0.pcap`.
pub fn pcap_host_id(name: &str) -> Option<u32> {
    name.split('-').nth(5)?.parse().ok()
}

/// Station captures of `phy`, by file name order.
fn station_pcaps(results: &Path, phy: usize) -> anyhow::Result<Vec<PathBuf>> {
    let prefix = format!("wifi-phy-{}-", phy);
    let mut pcaps = Vec::new();
    for entry in fs::read_dir(results).with_context(|| format!("listing {}", results.display()))? {
        let path = entry?.path();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.starts_with(&prefix) && name.ends_with("-0.pcap") {
            pcaps.push(path);
        }
    }
    pcaps.sort();
    Ok(pcaps)
}

/// One tshark run per station capture, paired with the station index.
pub fn sinr_jobs(
    results: &Path,
    tshark: &Path,
    settings: &SinrSettings,
) -> anyhow::Result<Vec<(usize, Job)>> {
    let macs = settings.station_macs();
    let mut jobs = Vec::new();
    for phy in 0..settings.relays {
        let offset = settings.wlan_id_offsets.get(phy).copied().unwrap_or_default();
        for pcap in station_pcaps(results, phy)? {
            let name = pcap
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let station = pcap_host_id(&name)
                .and_then(|id| id.checked_sub(offset))
                .map(|id| id as usize)
                .filter(|id| *id < macs.len());
            let Some(station) = station else {
                warn!("{}: no station MAC for this capture, skipping", name);
                continue;
            };
            let filter = format!("wlan.addr == {} and wlan_radio.snr", macs[station]);
            jobs.push((station, field_job(tshark, &pcap, &["wlan_radio.snr"], &filter)));
        }
    }
    Ok(jobs)
}

#[derive(Serialize)]
struct SinrRow {
    host: usize,
    mean_sinr: f64,
}

pub fn wifi_sinr(args: &WifiSinrArgs, config: &WorkflowConfig) -> anyhow::Result<BTreeMap<usize, Vec<f64>>> {
    let pool = WorkerPool::new(args.workers.unwrap_or(config.capture.workers));
    let (stations, jobs): (Vec<usize>, Vec<Job>) =
        sinr_jobs(&args.results, &config.capture.tshark, &config.sinr)?
            .into_iter()
            .unzip();

    let mut samples: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for (station, output) in stations.into_iter().zip(run_all(&pool, jobs)?) {
        samples
            .entry(station)
            .or_default()
            .extend(float_values(&output.stdout));
    }

    let rows: Vec<SinrRow> = samples
        .iter()
        .filter_map(|(host, values)| {
            let mean = StatsHelper::mean(values)?;
            println!("host {}: mean SINR {:.2} dB over {} frames", host, mean, values.len());
            Some(SinrRow {
                host: *host,
                mean_sinr: mean,
            })
        })
        .collect();
    write_rows(&output_path(&args.out_dir, "wifi-sinr.csv")?, rows)?;

    let boxes: Vec<(String, Vec<f64>)> = samples
        .iter()
        .map(|(host, values)| (host.to_string(), values.clone()))
        .collect();
    Chart {
        path: &output_path(&args.out_dir, "wifi-sinr.svg")?,
        title: "Wi-Fi SINR",
        x_desc: "host",
        y_desc: "SINR [dB]",
    }
    .boxes(&boxes)?;
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    const NAT_LOG: &str = "\
+0.5s 12 Ipv4PnatL3Protocol: mapping 10.1.0.2:49153 -> 7.0.0.2:1
+0.5s 12 Ipv4PnatL3Protocol: mapping 10.1.0.2:49154 -> 7.0.0.2:2
+0.5s 12 Ipv4PnatL3Protocol: mapping 10.1.0.3:49153 -> 7.0.0.2:3
";

    fn counts(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn pdr_sums_remapped_endpoints() {
        let pnat = PnatTable::from_reader(Cursor::new(NAT_LOG)).unwrap();
        let sent = counts(&[("10.1.0.2", 10), ("10.1.0.3", 4), ("10.1.0.4", 5), ("", 3)]);
        let internet = counts(&[("7.0.0.2:1", 3), ("7.0.0.2:2", 5), ("7.0.0.2:3", 1), ("8.8.8.8:53", 9)]);

        let pdr = pdr_per_unit(&sent, &internet, &pnat);
        assert_eq!(
            pdr,
            vec![
                UnitDelivery { unit: "10.1.0.2".into(), pdr: 80.0 },
                UnitDelivery { unit: "10.1.0.3".into(), pdr: 25.0 },
                UnitDelivery { unit: "10.1.0.4".into(), pdr: 0.0 },
            ]
        );
    }

    #[test]
    fn sent_filter_drops_empty_source_list() {
        assert_eq!(sent_filter("10.1.1", 1), "udp and not icmp");
        assert_eq!(
            sent_filter("10.1.1", 3),
            "udp and not icmp and (ip.src == 10.1.1.2 or ip.src == 10.1.1.3)"
        );
    }

    #[test]
    fn internet_node_follows_the_stacks() {
        assert_eq!(internet_node(&[6, 9, 9, 8]), 37);
    }

    #[test]
    fn host_id_is_the_sixth_field() {
        assert_eq!(pcap_host_id("wifi-phy-0-drones-host-5-0.pcap"), Some(5));
        assert_eq!(pcap_host_id("wifi-phy-0.pcap"), None);
    }

    #[test]
    fn sinr_jobs_pick_station_macs() {
        let dir = tempdir().unwrap();
        for name in [
            "wifi-phy-0-drones-host-5-0.pcap",
            "wifi-phy-0-drones-host-4-0.pcap",
            "wifi-phy-0-drones-host-4-1.pcap",
            "wifi-phy-1-drones-host-12-0.pcap",
            "wifi-phy-0-drones-host-99-0.pcap",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let settings = SinrSettings {
            relays: 2,
            ..Default::default()
        };
        let jobs = sinr_jobs(dir.path(), Path::new("tshark"), &settings).unwrap();
        let stations: Vec<usize> = jobs.iter().map(|(s, _)| *s).collect();
        assert_eq!(stations, vec![0, 1, 8]);
        let filter = jobs[1].1.args.last().unwrap().to_string_lossy().into_owned();
        assert_eq!(filter, "wlan.addr == 00:00:00:00:00:0b and wlan_radio.snr");
    }

    #[cfg(unix)]
    fn fake_tshark(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let script = dir.join("fake-tshark");
        fs::write(&script, "#!/bin/sh\ncat \"$2.out\"\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[test]
    fn pcap_pdr_end_to_end() {
        let dir = tempdir().unwrap();
        let results = dir.path();
        fs::write(results.join("wifi-phy-0-drones-host-0-2.pcap.out"), "10.1.0.2\n10.1.0.2\n10.1.0.3\n").unwrap();
        fs::write(results.join("internet-3-1.pcap.out"), "7.0.0.2\t1\n7.0.0.2\t3\n").unwrap();
        let log = results.join("scenario.log");
        fs::write(&log, NAT_LOG).unwrap();

        let mut config = WorkflowConfig::default();
        config.capture.tshark = fake_tshark(results);
        config.capture.stacks.truncate(1);
        config.capture.stacks[0].units = 1;

        let pdr = pcap_pdr(
            &PcapPdrArgs {
                results: results.to_path_buf(),
                scenario_log: log,
                internet_pcap: None,
                workers: Some(2),
                out_dir: results.join("out"),
            },
            &config,
        )
        .unwrap();
        assert_eq!(pdr[0].pdr, 50.0);
        assert_eq!(pdr[1].pdr, 100.0);
        let csv = fs::read_to_string(results.join("out/pcap-pdr.csv")).unwrap();
        assert!(csv.starts_with("GU IP Addr,PDR [%]\n10.1.0.2,50.0\n"));
    }

    #[cfg(unix)]
    #[test]
    fn wifi_sinr_merges_captures_of_a_station() {
        let dir = tempdir().unwrap();
        let results = dir.path();
        fs::write(results.join("wifi-phy-0-drones-host-4-0.pcap"), "").unwrap();
        fs::write(results.join("wifi-phy-0-drones-host-4-0.pcap.out"), "20\n\n30\n").unwrap();
        fs::write(results.join("wifi-phy-1-relay-host-4-0.pcap"), "").unwrap();
        fs::write(results.join("wifi-phy-1-relay-host-4-0.pcap.out"), "40\n").unwrap();

        let mut config = WorkflowConfig::default();
        config.capture.tshark = fake_tshark(results);
        config.sinr.relays = 2;

        let samples = wifi_sinr(
            &WifiSinrArgs {
                results: results.to_path_buf(),
                workers: Some(1),
                out_dir: results.join("out"),
            },
            &config,
        )
        .unwrap();
        assert_eq!(samples[&0], vec![20.0, 30.0, 40.0]);
        let csv = fs::read_to_string(results.join("out/wifi-sinr.csv")).unwrap();
        assert_eq!(csv, "host,mean_sinr\n0,30.0\n");
    }
}
