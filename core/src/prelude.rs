use crate::telemetry::metrics::MetricsRecorder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Plain 3D coordinate, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Point3) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2))
            .sqrt()
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Point3 {
    fn from(value: [f64; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

/// A flight-plan point. Interest 0 marks the start or stop of a curve segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub point: Point3,
    #[serde(default)]
    pub interest: u32,
}

impl Waypoint {
    pub fn new(point: Point3, interest: u32) -> Self {
        Self { point, interest }
    }
}

/// A position sampled at a given simulation time (nanoseconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub t_ns: i64,
    pub point: Point3,
}

/// Common error type for parsing and analysis.
#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("xml error: {0}")]
    Xml(String),
    #[error("missing field: {0}")]
    MissingField(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl AnalysisError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Line-oriented trace parser. Lines that do not match yield `None`.
pub trait LineParser {
    type Record;

    fn parse_line(&self, line: &str) -> Option<Self::Record>;
}

/// Records extracted from a text source plus the match statistics.
#[derive(Debug, Clone)]
pub struct Parsed<R> {
    pub records: Vec<R>,
    pub matched: usize,
    pub skipped: usize,
}

pub fn parse_lines<P, B>(parser: &P, reader: B) -> AnalysisResult<Parsed<P::Record>>
where
    P: LineParser,
    B: BufRead,
{
    let recorder = MetricsRecorder::new();
    let mut records = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(|err| AnalysisError::Parse(err.to_string()))?;
        match parser.parse_line(&line) {
            Some(record) => {
                records.push(record);
                recorder.record_processed();
            }
            None => recorder.record_error(),
        }
    }

    let (matched, skipped) = recorder.snapshot();
    Ok(Parsed {
        records,
        matched,
        skipped,
    })
}

pub fn parse_file<P: LineParser>(parser: &P, path: &Path) -> AnalysisResult<Parsed<P::Record>> {
    let file = File::open(path).map_err(|err| AnalysisError::io(path, err))?;
    let parsed = parse_lines(parser, BufReader::new(file))?;
    log::debug!(
        "{}: {} lines matched, {} skipped",
        path.display(),
        parsed.matched,
        parsed.skipped
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct Numbers;

    impl LineParser for Numbers {
        type Record = i64;

        fn parse_line(&self, line: &str) -> Option<i64> {
            line.trim().parse().ok()
        }
    }

    #[test]
    fn parse_lines_counts_matches_and_skips() {
        let parsed = parse_lines(&Numbers, Cursor::new("1\nfoo\n3\n\n")).unwrap();
        assert_eq!(parsed.records, vec![1, 3]);
        assert_eq!(parsed.matched, 2);
        assert_eq!(parsed.skipped, 2);
    }

    #[test]
    fn distance_is_euclidean() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 4.0, 12.0);
        assert_eq!(a.distance(&b), 13.0);
    }
}
