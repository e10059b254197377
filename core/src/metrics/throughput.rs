use crate::prelude::{AnalysisError, AnalysisResult};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThroughputUnit {
    #[default]
    Kbps,
    Mbps,
}

impl ThroughputUnit {
    pub fn label(self) -> &'static str {
        match self {
            ThroughputUnit::Kbps => "kbps",
            ThroughputUnit::Mbps => "Mbps",
        }
    }

    fn divisor(self) -> f64 {
        match self {
            ThroughputUnit::Kbps => 1024.0,
            ThroughputUnit::Mbps => 1024.0 * 1024.0,
        }
    }
}

/// One row of an uplink MAC stats trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UlMacSample {
    pub time_s: f64,
    pub cell_id: u32,
    pub size_tb: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThroughputBucket {
    pub time: i64,
    pub cell_id: u32,
    pub value: f64,
}

/// Reads `time, cellId, sizeTb, ...` rows, skipping the heading row.
pub fn read_ul_mac_stats<R: Read>(reader: R) -> AnalysisResult<Vec<UlMacSample>> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut samples = Vec::new();
    for (index, row) in csv.records().enumerate() {
        let row = row.map_err(|err| AnalysisError::Parse(err.to_string()))?;
        let field = |i: usize| {
            row.get(i).ok_or_else(|| {
                AnalysisError::MissingField(format!("row {}: column {}", index + 2, i + 1))
            })
        };
        let bad = |what: &str| AnalysisError::Parse(format!("row {}: bad {}", index + 2, what));

        samples.push(UlMacSample {
            time_s: field(0)?.parse().map_err(|_| bad("time"))?,
            cell_id: field(1)?.parse().map_err(|_| bad("cellId"))?,
            size_tb: field(2)?.parse().map_err(|_| bad("sizeTb"))?,
        });
    }
    Ok(samples)
}

pub fn load_ul_mac_stats(path: &Path) -> AnalysisResult<Vec<UlMacSample>> {
    let file = File::open(path).map_err(|err| AnalysisError::io(path, err))?;
    read_ul_mac_stats(file)
}

/// Aggregates transport block sizes into per-second throughput.
///
/// A bucket is closed by the first sample whose integral second lies past
/// the previous reference time, and is tagged with that sample's cell. The
/// last bucket is still open when the trace ends and is not emitted.
pub fn bucket_throughput(samples: &[UlMacSample], unit: ThroughputUnit) -> Vec<ThroughputBucket> {
    let mut buckets = Vec::new();
    let mut time_ref = 0.0_f64;
    let mut tx_bytes = 0.0_f64;

    for sample in samples {
        if sample.time_s.trunc() > time_ref {
            buckets.push(ThroughputBucket {
                time: time_ref.trunc() as i64,
                cell_id: sample.cell_id,
                value: tx_bytes * 8.0 / unit.divisor(),
            });
            time_ref = sample.time_s;
            tx_bytes = 0.0;
        }
        tx_bytes += sample.size_tb as f64;
    }

    buckets
}
