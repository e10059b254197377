//! Seed-averaged SNR traces of the NTN HAP campaign.

use crate::prelude::{AnalysisError, AnalysisResult};
use crate::telemetry::LogManager;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const TRACE_FILE: &str = "ntn-snr-trace.txt";
pub const DEFAULT_RUN_PREFIX: &str = "ntn_hap-seed";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SnrSample {
    pub time: f64,
    pub snr: f64,
    pub propagation_loss: f64,
}

/// Seed of a results directory named `<prefix>-seed_<seed>-<date>.<time>`.
pub fn seed_of(dir_name: &str) -> Option<u64> {
    dir_name.split('-').nth(1)?.split('_').nth(1)?.parse().ok()
}

/// Result directories under `root` whose name starts with `prefix`,
/// ordered by seed.
pub fn seed_runs(root: &Path, prefix: &str) -> AnalysisResult<Vec<(u64, PathBuf)>> {
    let logger = LogManager::new("snr");
    let mut runs = Vec::new();
    for entry in fs::read_dir(root).map_err(|err| AnalysisError::io(root, err))? {
        let entry = entry.map_err(|err| AnalysisError::io(root, err))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(prefix) {
            continue;
        }
        match seed_of(&name) {
            Some(seed) => runs.push((seed, path)),
            None => logger.caution(&format!("cannot read a seed from {}, skipping", name)),
        }
    }
    runs.sort_by_key(|(seed, _)| *seed);
    logger.record(&format!("{} seed runs under {}", runs.len(), root.display()));
    Ok(runs)
}

/// Parses `time snr propagationLoss` rows separated by spaces.
pub fn parse_trace(text: &str) -> AnalysisResult<Vec<SnrSample>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let values: Vec<f64> = line
                .split_whitespace()
                .take(3)
                .map(str::parse)
                .collect::<Result<_, _>>()
                .map_err(|err| AnalysisError::Parse(format!("line {}: {}", index + 1, err)))?;
            match values.as_slice() {
                [time, snr, loss] => Ok(SnrSample {
                    time: *time,
                    snr: *snr,
                    propagation_loss: *loss,
                }),
                _ => Err(AnalysisError::MissingField(format!(
                    "line {}: expected 3 columns",
                    index + 1
                ))),
            }
        })
        .collect()
}

pub fn load_trace(path: &Path) -> AnalysisResult<Vec<SnrSample>> {
    let text = fs::read_to_string(path).map_err(|err| AnalysisError::io(path, err))?;
    parse_trace(&text)
}

/// Row-wise mean across traces. Rows missing from shorter traces are left
/// out of that row's mean.
pub fn average_traces(traces: &[Vec<SnrSample>]) -> Vec<SnrSample> {
    let rows = traces.iter().map(Vec::len).max().unwrap_or(0);

    (0..rows)
        .filter_map(|row| {
            let present: Vec<&SnrSample> = traces.iter().filter_map(|t| t.get(row)).collect();
            let first = present.first()?;
            let n = present.len() as f64;
            Some(SnrSample {
                time: first.time,
                snr: present.iter().map(|s| s.snr).sum::<f64>() / n,
                propagation_loss: present.iter().map(|s| s.propagation_loss).sum::<f64>() / n,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_from_directory_name() {
        assert_eq!(seed_of("ntn_hap-seed_7-2023-01-02.10-11-12"), Some(7));
        assert_eq!(seed_of("ntn_hap-seed_x-2023"), None);
        assert_eq!(seed_of("ntn_hap"), None);
    }

    #[test]
    fn averages_tolerate_uneven_lengths() {
        let a = parse_trace("0 10 100\n1 20 110\n2 30 120\n").unwrap();
        let b = parse_trace("0 20 200\n1 40 210\n").unwrap();
        let mean = average_traces(&[a, b]);
        assert_eq!(mean.len(), 3);
        assert_eq!(mean[0].snr, 15.0);
        assert_eq!(mean[1].propagation_loss, 160.0);
        assert_eq!(mean[2].snr, 30.0);
        assert_eq!(mean[2].time, 2.0);
    }

    #[test]
    fn short_rows_are_rejected() {
        assert!(parse_trace("0 10\n").is_err());
    }

    #[test]
    fn runs_are_sorted_by_seed() {
        let root = tempfile::tempdir().unwrap();
        for name in [
            "ntn_hap-seed_10-2023-01-01.00-00-00",
            "ntn_hap-seed_2-2023-01-01.00-00-00",
            "other-seed_1-2023",
        ] {
            fs::create_dir(root.path().join(name)).unwrap();
        }
        fs::write(root.path().join("ntn_hap-seed_3.txt"), "").unwrap();

        let runs = seed_runs(root.path(), DEFAULT_RUN_PREFIX).unwrap();
        let seeds: Vec<u64> = runs.iter().map(|(s, _)| *s).collect();
        assert_eq!(seeds, vec![2, 10]);
    }
}
