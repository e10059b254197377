use crate::prelude::{parse_file, parse_lines, AnalysisResult, LineParser, Parsed};
use regex::Regex;
use std::collections::HashMap;
use std::io::BufRead;
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::LazyLock;

static PNAT_MAPPING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9\.]+):([0-9]+) -> ([0-9\.]+):([0-9]+)").expect("valid regex")
});

/// A single `int_ip:int_port -> ext_ip:ext_port` mapping found in a log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PnatEntry {
    pub internal: Ipv4Addr,
    pub internal_port: u16,
    pub external: Ipv4Addr,
    pub external_port: u16,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PnatParser;

impl LineParser for PnatParser {
    type Record = PnatEntry;

    fn parse_line(&self, line: &str) -> Option<PnatEntry> {
        let caps = PNAT_MAPPING.captures(line)?;
        Some(PnatEntry {
            internal: caps[1].parse().ok()?,
            internal_port: caps[2].parse().ok()?,
            external: caps[3].parse().ok()?,
            external_port: caps[4].parse().ok()?,
        })
    }
}

/// Port-NAT lookup table: external endpoint to internal host.
#[derive(Debug, Clone, Default)]
pub struct PnatTable {
    entries: HashMap<(Ipv4Addr, u16), Ipv4Addr>,
}

impl PnatTable {
    pub fn from_reader<B: BufRead>(reader: B) -> AnalysisResult<Self> {
        Ok(Self::from_parsed(parse_lines(&PnatParser, reader)?))
    }

    pub fn load(path: &Path) -> AnalysisResult<Self> {
        Ok(Self::from_parsed(parse_file(&PnatParser, path)?))
    }

    fn from_parsed(parsed: Parsed<PnatEntry>) -> Self {
        let mut entries = HashMap::new();
        for entry in parsed.records {
            // later lines overwrite earlier ones
            entries.insert((entry.external, entry.external_port), entry.internal);
        }
        Self { entries }
    }

    pub fn resolve(&self, external: Ipv4Addr, port: u16) -> Option<Ipv4Addr> {
        self.entries.get(&(external, port)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Internal hosts, ascending and deduplicated.
    pub fn hosts(&self) -> Vec<Ipv4Addr> {
        let mut hosts: Vec<Ipv4Addr> = self.entries.values().copied().collect();
        hosts.sort();
        hosts.dedup();
        hosts
    }
}
