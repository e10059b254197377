//! Scenario documents built from parameters rather than parsed from runs.

pub mod campaign;
pub mod coverage;
pub mod leo;
pub mod vehicles;

use anyhow::Context;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::Path;

/// Writes `value` as JSON indented with `indent`.
pub fn write_json<T: Serialize>(path: &Path, value: &T, indent: &[u8]) -> anyhow::Result<()> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent));
    value
        .serialize(&mut ser)
        .with_context(|| format!("serializing {}", path.display()))?;
    buf.push(b'\n');
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    fs::write(path, buf).with_context(|| format!("writing {}", path.display()))
}
