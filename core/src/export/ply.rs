use crate::math::{lin_to_db, StatsHelper};
use crate::prelude::{AnalysisError, AnalysisResult, Point3};
use serde::Serialize;
use std::fmt::Write;

/// One Radio Environment Map cell, SINR in linear scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RemSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub sinr: f64,
}

/// Parses whitespace separated `x y z sinr` rows; `#` comments and blank
/// lines are skipped, extra columns ignored.
pub fn parse_rem(text: &str) -> AnalysisResult<Vec<RemSample>> {
    let mut samples = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let values = line
            .split_whitespace()
            .take(4)
            .map(str::parse::<f64>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| AnalysisError::Parse(format!("line {}: {}", index + 1, err)))?;
        match values.as_slice() {
            [x, y, z, sinr] => samples.push(RemSample {
                x: *x,
                y: *y,
                z: *z,
                sinr: *sinr,
            }),
            _ => {
                return Err(AnalysisError::MissingField(format!(
                    "line {}: expected x y z sinr",
                    index + 1
                )))
            }
        }
    }
    Ok(samples)
}

/// Jet colour ramp, `t` in `[0, 1]`.
pub fn jet(t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let channel = |offset: f64| {
        let v = (1.5 - (4.0 * t - offset).abs()).clamp(0.0, 1.0);
        (v * 255.0).round() as u8
    };
    [channel(3.0), channel(2.0), channel(1.0)]
}

fn header(out: &mut String, vertices: usize, coloured: bool) {
    out.push_str("ply\nformat ascii 1.0\ncomment IoD Sim analysis export\n");
    let _ = writeln!(out, "element vertex {}", vertices);
    out.push_str("property float x\nproperty float y\nproperty float z\n");
    if coloured {
        out.push_str("property uchar red\nproperty uchar green\nproperty uchar blue\n");
    }
    out.push_str("end_header\n");
}

/// Coloured point cloud of a REM. SINR is shown in dB between the lowest
/// and highest finite values.
pub fn rem_to_ply(samples: &[RemSample]) -> String {
    let db: Vec<f64> = samples.iter().map(|s| lin_to_db(s.sinr)).collect();
    let finite: Vec<f64> = db.iter().copied().filter(|v| v.is_finite()).collect();
    let (lo, hi) = StatsHelper::min_max(&finite).unwrap_or((0.0, 0.0));

    let mut out = String::new();
    header(&mut out, samples.len(), true);
    for (sample, value) in samples.iter().zip(&db) {
        let t = if !value.is_finite() {
            0.0
        } else if hi > lo {
            (value - lo) / (hi - lo)
        } else {
            0.5
        };
        let [r, g, b] = jet(t);
        let _ = writeln!(
            out,
            "{} {} {} {} {} {}",
            sample.x, sample.y, sample.z, r, g, b
        );
    }
    out
}

pub fn points_to_ply(points: &[Point3]) -> String {
    let mut out = String::new();
    header(&mut out, points.len(), false);
    for p in points {
        let _ = writeln!(out, "{} {} {}", p.x, p.y, p.z);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rem_rows_are_parsed() {
        let samples = parse_rem("# x y z sinr\n0 0 10 1.0\n\n1 0 10 100 extra\n").unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].sinr, 100.0);
        assert!(parse_rem("0 0 10\n").is_err());
        assert!(parse_rem("0 0 ten 1\n").is_err());
    }

    #[test]
    fn colours_span_the_ramp() {
        assert_eq!(jet(0.0), [0, 0, 128]);
        assert_eq!(jet(1.0), [128, 0, 0]);
        assert_eq!(jet(0.5), [128, 255, 128]);
    }

    #[test]
    fn rem_ply_has_coloured_vertices() {
        let samples = parse_rem("0 0 10 1\n1 0 10 10\n2 0 10 100\n").unwrap();
        let ply = rem_to_ply(&samples);
        let lines: Vec<&str> = ply.lines().collect();
        assert!(lines.contains(&"element vertex 3"));
        assert!(lines.contains(&"property uchar red"));
        let body_start = lines.iter().position(|l| *l == "end_header").unwrap() + 1;
        assert_eq!(lines[body_start], "0 0 10 0 0 128");
        assert_eq!(lines[body_start + 1], "1 0 10 128 255 128");
        assert_eq!(lines[body_start + 2], "2 0 10 128 0 0");
    }

    #[test]
    fn constant_rem_maps_to_the_middle() {
        let samples = parse_rem("0 0 0 5\n1 1 1 5\n").unwrap();
        assert!(rem_to_ply(&samples).contains("0 0 0 128 255 128"));
    }

    #[test]
    fn point_cloud_without_colour() {
        let ply = points_to_ply(&[Point3::new(1.5, 2.0, -3.0)]);
        assert!(ply.ends_with("end_header\n1.5 2 -3\n"));
        assert!(!ply.contains("uchar"));
    }
}
