use crate::prelude::{parse_file, parse_lines, AnalysisResult, LineParser};
use serde::Serialize;
use std::io::BufRead;
use std::path::Path;

pub const PLACEMARK_MARKER: &str = "Position after update";
pub const TRACK_MARKER: &str = "Geographic position";

/// A geographic fix read from a scenario log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoFix {
    pub time: String,
    pub lat: String,
    pub lon: String,
    pub alt: Option<String>,
}

/// Picks `lat:lon[:alt]` positions out of log lines holding `marker`.
///
/// Fields are 1-based indexes into the whitespace split of the line.
#[derive(Debug, Clone)]
pub struct GeoLogParser {
    marker: String,
    time_field: usize,
    position_field: usize,
}

impl GeoLogParser {
    pub fn new(marker: &str, time_field: usize, position_field: usize) -> Self {
        Self {
            marker: marker.to_lowercase(),
            time_field: time_field.max(1),
            position_field: position_field.max(1),
        }
    }

    /// `Position after update` lines, position in field 8.
    pub fn placemarks() -> Self {
        Self::new(PLACEMARK_MARKER, 1, 8)
    }

    /// `Geographic position` lines, position in field 7.
    pub fn track() -> Self {
        Self::new(TRACK_MARKER, 1, 7)
    }
}

impl LineParser for GeoLogParser {
    type Record = GeoFix;

    fn parse_line(&self, line: &str) -> Option<GeoFix> {
        if !line.to_lowercase().contains(&self.marker) {
            return None;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let time = fields.get(self.time_field - 1)?;
        let position = fields.get(self.position_field - 1)?;
        let mut coords = position.split(':');
        let lat = coords.next()?;
        let lon = coords.next()?;
        Some(GeoFix {
            time: time.to_string(),
            lat: lat.to_string(),
            lon: lon.to_string(),
            alt: coords.next().map(str::to_string),
        })
    }
}

/// Collapses runs of identical consecutive fixes.
pub fn uniq(fixes: Vec<GeoFix>) -> Vec<GeoFix> {
    let mut out: Vec<GeoFix> = Vec::with_capacity(fixes.len());
    for fix in fixes {
        if out.last() != Some(&fix) {
            out.push(fix);
        }
    }
    out
}

pub fn read_fixes<B: BufRead>(parser: &GeoLogParser, reader: B) -> AnalysisResult<Vec<GeoFix>> {
    Ok(uniq(parse_lines(parser, reader)?.records))
}

pub fn load_fixes(parser: &GeoLogParser, path: &Path) -> AnalysisResult<Vec<GeoFix>> {
    Ok(uniq(parse_file(parser, path)?.records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LOG: &str = "\
+1.0s 3 DroneControl Node: position after update: 41.88:12.48:100
+1.0s 3 DroneControl Node: position after update: 41.88:12.48:100
+2.0s 3 DroneControl Node: Position after update: 41.89:12.49:100
+2.0s 3 Something else entirely
+3.0s 3 Geo: Geographic position is 41.90:12.50:120
";

    #[test]
    fn placemark_fixes_are_deduplicated() {
        let fixes = read_fixes(&GeoLogParser::placemarks(), Cursor::new(LOG)).unwrap();
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].time, "+1.0s");
        assert_eq!(fixes[0].lat, "41.88");
        assert_eq!(fixes[1].lon, "12.49");
    }

    #[test]
    fn track_fixes_use_their_own_column() {
        let fixes = read_fixes(&GeoLogParser::track(), Cursor::new(LOG)).unwrap();
        assert_eq!(
            fixes,
            vec![GeoFix {
                time: "+3.0s".into(),
                lat: "41.90".into(),
                lon: "12.50".into(),
                alt: Some("120".into()),
            }]
        );
    }
}
