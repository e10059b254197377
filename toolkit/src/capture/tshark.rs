use crate::capture::pool::Job;
use std::collections::BTreeMap;
use std::path::Path;

/// A `tshark -T fields` run printing `fields` of the packets matching
/// `filter`, one tab-separated line per packet.
pub fn field_job(tshark: &Path, pcap: &Path, fields: &[&str], filter: &str) -> Job {
    let mut args = vec![
        "-r".to_string(),
        pcap.display().to_string(),
        "-T".to_string(),
        "fields".to_string(),
    ];
    for field in fields {
        args.push("-e".to_string());
        args.push(field.to_string());
    }
    args.push(filter.to_string());

    let label = pcap
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| pcap.display().to_string());
    Job::new(label, tshark.as_os_str(), args)
}

/// Occurrences of every output line, multiple fields joined with `:`.
pub fn count_values(stdout: &str) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        *counts.entry(line.replace('\t', ":")).or_insert(0) += 1;
    }
    counts
}

/// Numeric values of a single-field run; empty or non-numeric lines are
/// dropped.
pub fn float_values(stdout: &str) -> Vec<f64> {
    stdout
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect()
}

/// `ip.src == a or ip.src == b ...` over the hosts `2..=units` of a prefix.
pub fn source_filter(prefix: &str, units: u32) -> String {
    (2..=units)
        .map(|i| format!("ip.src == {}.{}", prefix, i))
        .collect::<Vec<_>>()
        .join(" or ")
}
