use crate::prelude::{AnalysisError, AnalysisResult, LineParser};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::net::Ipv4Addr;

pub const DEFAULT_SERVER: &str = "200.0.0.1";
pub const DEFAULT_LTE_PREFIX: &str = "7.0.0";
pub const DEFAULT_ID_OFFSET: u32 = 2;
pub const DEFAULT_SINK_PORT: u16 = 1337;

/// A packet carrying an ns-3 `SeqTsHeader`, seen at one end of the path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeqTsRecord {
    pub time_s: f64,
    pub host: Ipv4Addr,
    pub sn: u64,
    /// Source port, when the trace line carries one.
    pub port: Option<u16>,
    /// HE MCS index of Wi-Fi transmissions.
    pub mcs: Option<u8>,
}

fn compile(pattern: &str) -> AnalysisResult<Regex> {
    Regex::new(pattern).map_err(|err| AnalysisError::InvalidInput(err.to_string()))
}

fn parse_time(raw: &str) -> Option<f64> {
    raw.trim_start_matches('+').parse().ok()
}

/// Application log lines of UDP clients sending to the remote server.
///
/// The node id is turned into the LTE address of the sender by appending
/// `node_id + id_offset` to `lte_prefix`.
pub struct TxSeqTsParser {
    rex: Regex,
    lte_prefix: String,
    id_offset: u32,
}

impl TxSeqTsParser {
    pub fn new(server: &str, lte_prefix: &str, id_offset: u32) -> AnalysisResult<Self> {
        let rex = compile(&format!(
            r"^(?P<time>[0-9\.+]+)s (?P<nodeid>[0-9]+) .+ {} .+ ns3::SeqTsHeader \(\(seq=(?P<sn>[0-9]+).+",
            regex::escape(server)
        ))?;
        Ok(Self {
            rex,
            lte_prefix: lte_prefix.trim_end_matches('.').to_string(),
            id_offset,
        })
    }
}

impl LineParser for TxSeqTsParser {
    type Record = SeqTsRecord;

    fn parse_line(&self, line: &str) -> Option<SeqTsRecord> {
        let caps = self.rex.captures(line)?;
        let node_id: u32 = caps["nodeid"].parse().ok()?;
        let host = format!("{}.{}", self.lte_prefix, node_id + self.id_offset)
            .parse()
            .ok()?;
        Some(SeqTsRecord {
            time_s: parse_time(&caps["time"])?,
            host,
            sn: caps["sn"].parse().ok()?,
            port: None,
            mcs: None,
        })
    }
}

/// Receive events of the remote server in an ascii trace.
pub struct RxSeqTsParser {
    rex: Regex,
    prefix: String,
}

impl RxSeqTsParser {
    pub fn new(prefix: &str, port: u16) -> AnalysisResult<Self> {
        let prefix = prefix.trim_end_matches('.').to_string();
        let rex = compile(&format!(
            r"^r (?P<time>[0-9\.+]+).+{}\.(?P<host>[0-9]+).+? (?:(?P<port>[0-9]+) )?> {}.+ns3::SeqTsHeader \(\(seq=(?P<sn>[0-9]+).+",
            regex::escape(&prefix),
            port
        ))?;
        Ok(Self { rex, prefix })
    }
}

impl LineParser for RxSeqTsParser {
    type Record = SeqTsRecord;

    fn parse_line(&self, line: &str) -> Option<SeqTsRecord> {
        let caps = self.rex.captures(line)?;
        let host = format!("{}.{}", self.prefix, &caps["host"]).parse().ok()?;
        Some(SeqTsRecord {
            time_s: parse_time(&caps["time"])?,
            host,
            sn: caps["sn"].parse().ok()?,
            port: caps.name("port").and_then(|p| p.as_str().parse().ok()),
            mcs: None,
        })
    }
}

/// Transmissions in a Wi-Fi PHY ascii trace towards the remote server.
pub struct WifiTxParser {
    rex: Regex,
}

impl WifiTxParser {
    pub fn new(server: &str) -> AnalysisResult<Self> {
        let rex = compile(&format!(
            r"^t (?P<time>[0-9\.+]+).+HeMcs(?P<mcs>[0-9]+).+ (?P<ipaddr>[0-9\.]+) > {}.+ns3::SeqTsHeader \(\(seq=(?P<sn>[0-9]+).+",
            regex::escape(server)
        ))?;
        Ok(Self { rex })
    }
}

impl LineParser for WifiTxParser {
    type Record = SeqTsRecord;

    fn parse_line(&self, line: &str) -> Option<SeqTsRecord> {
        let caps = self.rex.captures(line)?;
        Some(SeqTsRecord {
            time_s: parse_time(&caps["time"])?,
            host: caps["ipaddr"].parse().ok()?,
            sn: caps["sn"].parse().ok()?,
            port: None,
            mcs: caps["mcs"].parse().ok(),
        })
    }
}

/// Keeps the first record of every sequence number.
pub fn first_per_sn(records: Vec<SeqTsRecord>) -> Vec<SeqTsRecord> {
    let mut seen = HashSet::new();
    records.into_iter().filter(|r| seen.insert(r.sn)).collect()
}

pub fn group_by_host(records: Vec<SeqTsRecord>) -> BTreeMap<Ipv4Addr, Vec<SeqTsRecord>> {
    let mut grouped: BTreeMap<Ipv4Addr, Vec<SeqTsRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.host).or_default().push(record);
    }
    grouped
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const TX_LOG: &str = "\
+1.000000000s 0 UdpEchoClient:Send(): Sent 12 bytes to 200.0.0.1 port 1337 ns3::SeqTsHeader ((seq=0 time=+1s))
+1.500000000s 1 UdpEchoClient:Send(): Sent 12 bytes to 200.0.0.1 port 1337 ns3::SeqTsHeader ((seq=0 time=+1.5s))
+2.000000000s 0 UdpEchoClient:Send(): Sent 12 bytes to 200.0.0.1 port 1337 ns3::SeqTsHeader ((seq=1 time=+2s))
+2.000000000s 0 LteUeRrc:SwitchToState(): IMSI 1 RNTI 1 UeState CONNECTED_NORMALLY
+3.000000000s 0 UdpEchoClient:Send(): Sent 12 bytes to 200.0.0.1 port 1337 ns3::SeqTsHeader ((seq=2 time=+3s))
";

    pub const RX_TRACE: &str = "\
r 1.0205 /NodeList/35/DeviceList/1/$ns3::PointToPointNetDevice/MacRx ns3::PppHeader (Point-to-Point Protocol: IP (0x0021)) ns3::Ipv4Header (tos 0x0 ttl 63 id 0 protocol 17 offset (bytes) 0 flags [none] length: 40 7.0.0.2 > 200.0.0.1) ns3::UdpHeader (length: 20 49153 > 1337) Payload Fragment [0:8] ns3::SeqTsHeader ((seq=0 time=+1s)) Payload (size=4)
r 1.5305 /NodeList/35/DeviceList/1/$ns3::PointToPointNetDevice/MacRx ns3::PppHeader (Point-to-Point Protocol: IP (0x0021)) ns3::Ipv4Header (tos 0x0 ttl 63 id 0 protocol 17 offset (bytes) 0 flags [none] length: 40 7.0.0.3 > 200.0.0.1) ns3::UdpHeader (length: 20 1 > 1337) Payload Fragment [0:8] ns3::SeqTsHeader ((seq=0 time=+1.5s)) Payload (size=4)
d 1.9 /NodeList/35/DeviceList/1/$ns3::PointToPointNetDevice/TxQueue/Drop ns3::Ipv4Header (length: 40 7.0.0.2 > 200.0.0.1) ns3::UdpHeader (length: 20 49153 > 1337) ns3::SeqTsHeader ((seq=9 time=+1.9s))
r 2.0310 /NodeList/35/DeviceList/1/$ns3::PointToPointNetDevice/MacRx ns3::PppHeader (Point-to-Point Protocol: IP (0x0021)) ns3::Ipv4Header (tos 0x0 ttl 63 id 0 protocol 17 offset (bytes) 0 flags [none] length: 40 7.0.0.2 > 200.0.0.1) ns3::UdpHeader (length: 20 49153 > 1337) Payload Fragment [0:8] ns3::SeqTsHeader ((seq=1 time=+2s)) Payload (size=4)
";
}
