use crate::traces::geolog::GeoFix;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

const FIX_STYLE: &str = "fix";
const LANDMARK_STYLE: &str = "landmark";
const TRACK_STYLE: &str = "track";

/// A named point drawn next to the extracted positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn icon_style(out: &mut String, id: &str, colour: &str) {
    let _ = write!(
        out,
        "    <Style id=\"{id}\">\n      <IconStyle>\n        <color>{colour}</color>\n        <scale>1</scale>\n        <Icon><href>https://www.gstatic.com/mapspro/images/stock/503-wht-blank_maps.png</href></Icon>\n      </IconStyle>\n      <BalloonStyle><text><![CDATA[<h3>$[name]</h3>]]></text></BalloonStyle>\n    </Style>\n"
    );
}

fn header(out: &mut String) {
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n  <Document>\n");
    out.push_str("    <name>Untitled layer</name>\n");
    icon_style(out, FIX_STYLE, "ffd18802");
    icon_style(out, LANDMARK_STYLE, "ff0051e6");
    out.push_str(
        "    <Style id=\"track\">\n      <LineStyle>\n        <color>ff0051e6</color>\n        <width>6.401</width>\n      </LineStyle>\n      <PolyStyle>\n        <color>000051e6</color>\n        <fill>1</fill>\n        <outline>1</outline>\n      </PolyStyle>\n    </Style>\n",
    );
}

fn footer(out: &mut String) {
    out.push_str("  </Document>\n</kml>\n");
}

fn point(out: &mut String, name: &str, style: &str, lon: &str, lat: &str) {
    let _ = write!(
        out,
        "    <Placemark>\n      <name>{}</name>\n      <styleUrl>#{}</styleUrl>\n      <Point>\n        <coordinates>{},{},0</coordinates>\n      </Point>\n    </Placemark>\n",
        escape(name),
        style,
        escape(lon),
        escape(lat)
    );
}

fn landmarks_into(out: &mut String, landmarks: &[Landmark]) {
    for landmark in landmarks {
        point(
            out,
            &landmark.name,
            LANDMARK_STYLE,
            &landmark.lon.to_string(),
            &landmark.lat.to_string(),
        );
    }
}

/// One point placemark per fix, named after its time.
pub fn placemarks(fixes: &[GeoFix], landmarks: &[Landmark]) -> String {
    let mut out = String::new();
    header(&mut out);
    landmarks_into(&mut out, landmarks);
    for fix in fixes {
        point(&mut out, &fix.time, FIX_STYLE, &fix.lon, &fix.lat);
    }
    footer(&mut out);
    out
}

/// A single polygon placemark whose ring follows the fixes in order.
pub fn track(fixes: &[GeoFix], landmarks: &[Landmark]) -> String {
    let mut out = String::new();
    header(&mut out);
    landmarks_into(&mut out, landmarks);
    let _ = write!(
        out,
        "    <Placemark>\n      <name>Trajectory</name>\n      <styleUrl>#{}</styleUrl>\n      <Polygon>\n        <outerBoundaryIs>\n          <LinearRing>\n            <tessellate>1</tessellate>\n            <coordinates>\n",
        TRACK_STYLE
    );
    for fix in fixes {
        let _ = writeln!(out, "              {},{},0", escape(&fix.lon), escape(&fix.lat));
    }
    out.push_str(
        "            </coordinates>\n          </LinearRing>\n        </outerBoundaryIs>\n      </Polygon>\n    </Placemark>\n",
    );
    footer(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(time: &str, lat: &str, lon: &str) -> GeoFix {
        GeoFix {
            time: time.into(),
            lat: lat.into(),
            lon: lon.into(),
            alt: None,
        }
    }

    #[test]
    fn placemarks_swap_to_lon_lat_and_parse_as_xml() {
        let landmarks = vec![Landmark {
            name: "Takeoff & Landing".into(),
            lat: 40.5157964,
            lon: 17.4031484,
        }];
        let kml = placemarks(&[fix("+1.0s", "41.88", "12.48")], &landmarks);
        assert!(kml.contains("<coordinates>12.48,41.88,0</coordinates>"));
        assert!(kml.contains("<name>Takeoff &amp; Landing</name>"));

        let doc = roxmltree::Document::parse(&kml).unwrap();
        let count = doc
            .descendants()
            .filter(|n| n.has_tag_name("Placemark"))
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn track_lists_every_fix_in_order() {
        let kml = track(
            &[fix("1", "1.0", "2.0"), fix("2", "1.5", "2.5")],
            &[],
        );
        let doc = roxmltree::Document::parse(&kml).unwrap();
        let coords = doc
            .descendants()
            .find(|n| n.has_tag_name("coordinates"))
            .and_then(|n| n.text())
            .unwrap();
        let rows: Vec<&str> = coords.split_whitespace().collect();
        assert_eq!(rows, vec!["2.0,1.0,0", "2.5,1.5,0"]);
    }
}
