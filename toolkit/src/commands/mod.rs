//! One module per group of related subcommands. Every command reads its
//! inputs, prints a short summary and writes CSV/JSON/SVG files.

pub mod capture;
pub mod convert;
pub mod delivery;
pub mod geo;
pub mod latency;
pub mod loss;
pub mod report;
pub mod scenario;
pub mod snr;
pub mod throughput;
pub mod trajectory;

use anyhow::Context;
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// `dir/name`, creating `dir` when missing.
pub fn output_path(dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating output directory {}", dir.display()))?;
    Ok(dir.join(name))
}

/// Writes `rows` as a CSV file with a header taken from the row type.
pub fn write_rows<S, I>(path: &Path, rows: I) -> anyhow::Result<()>
where
    S: Serialize,
    I: IntoIterator<Item = S>,
{
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    let mut count = 0;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("writing {}", path.display()))?;
        count += 1;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    info!("wrote {} rows to {}", count, path.display());
    Ok(())
}

/// Stem of `path` for naming derived outputs.
pub fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Serialize)]
    struct Row {
        host: String,
        value: f64,
    }

    #[test]
    fn rows_get_a_header() {
        let dir = tempdir().unwrap();
        let path = output_path(&dir.path().join("nested"), "rows.csv").unwrap();
        write_rows(
            &path,
            vec![Row {
                host: "7.0.0.2".into(),
                value: 0.5,
            }],
        )
        .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "host,value\n7.0.0.2,0.5\n");
    }

    #[test]
    fn stem_drops_extension() {
        assert_eq!(stem(Path::new("/a/b/report.xml")), "report");
    }
}
