use anyhow::Context;
use iodcore::export::Landmark;
use iodcore::traces::seqts::{DEFAULT_ID_OFFSET, DEFAULT_LTE_PREFIX, DEFAULT_SERVER, DEFAULT_SINK_PORT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings shared by the analysis commands. Every field has a default so
/// a YAML file only needs to list what differs from the stock scenarios.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub traces: TraceSettings,
    pub capture: CaptureSettings,
    pub kml: KmlSettings,
    pub sinr: SinrSettings,
    pub campaign: CampaignSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceSettings {
    /// Address of the remote UDP sink.
    pub server: String,
    pub lte_prefix: String,
    /// Added to a node id to get the host part of its LTE address.
    pub id_offset: u32,
    pub sink_port: u16,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            lte_prefix: DEFAULT_LTE_PREFIX.to_string(),
            id_offset: DEFAULT_ID_OFFSET,
            sink_port: DEFAULT_SINK_PORT,
        }
    }
}

/// A Wi-Fi stack whose drones forward ground unit traffic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptureStack {
    /// Network prefix of the ground units, e.g. `10.1.0`.
    pub prefix: String,
    /// Ground units are numbered `2..=units` inside the prefix.
    pub units: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub tshark: PathBuf,
    pub workers: usize,
    pub stacks: Vec<CaptureStack>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        let stack = |prefix: &str, units| CaptureStack {
            prefix: prefix.to_string(),
            units,
        };
        Self {
            tshark: PathBuf::from("tshark"),
            workers: default_workers(),
            stacks: vec![
                stack("10.1.0", 6),
                stack("10.2.0", 9),
                stack("10.3.0", 9),
                stack("10.4.0", 8),
            ],
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KmlSettings {
    pub landmarks: Vec<Landmark>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SinrSettings {
    pub relays: usize,
    /// Per relay, subtracted from the pcap host id to index the station list.
    pub wlan_id_offsets: Vec<u32>,
    /// Last byte range `[first, last)` of the station MAC addresses.
    pub station_mac_range: (u8, u8),
}

impl Default for SinrSettings {
    fn default() -> Self {
        Self {
            relays: 4,
            wlan_id_offsets: vec![4, 4, 4, 4],
            station_mac_range: (10, 46),
        }
    }
}

impl SinrSettings {
    pub fn station_macs(&self) -> Vec<String> {
        let (first, last) = self.station_mac_range;
        (first..last)
            .map(|b| format!("00:00:00:00:00:{:02x}", b))
            .collect()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignSettings {
    pub template: PathBuf,
    pub prefix: String,
    pub executable: PathBuf,
    pub scratch_dir: PathBuf,
    pub start_hz: f64,
    pub stop_hz: f64,
    pub step_hz: f64,
}

impl Default for CampaignSettings {
    fn default() -> Self {
        Self {
            template: PathBuf::from("scenario/ntn-hap-static.json"),
            prefix: "auto-ntn_hap_static".to_string(),
            executable: PathBuf::from("ns3/build/examples/ns3-dev-iodsim-debug"),
            scratch_dir: PathBuf::from("tmp"),
            start_hz: 20e9,
            stop_hz: 100e9,
            step_hz: 400e6,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    /// The file at `path` when given, the defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
