//! SVG charts written next to the CSV outputs.

use iodcore::math::StatsHelper;
use log::info;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

const SIZE: (u32, u32) = (1024, 768);

/// A named sequence of `(x, y)` points.
#[derive(Clone, Debug)]
pub struct Series {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    pub fn new(name: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }
}

/// Output file plus the caption and axis descriptions of a chart.
pub struct Chart<'a> {
    pub path: &'a Path,
    pub title: &'a str,
    pub x_desc: &'a str,
    pub y_desc: &'a str,
}

fn extent<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    let finite: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    StatsHelper::min_max(&finite)
}

fn padded(bounds: Option<(f64, f64)>) -> Range<f64> {
    match bounds {
        Some((lo, hi)) if hi > lo => {
            let pad = (hi - lo) * 0.05;
            (lo - pad)..(hi + pad)
        }
        Some((v, _)) => (v - 1.0)..(v + 1.0),
        None => 0.0..1.0,
    }
}

fn color(index: usize) -> RGBAColor {
    Palette99::pick(index).to_rgba()
}

/// Hue from blue (0) to red (1).
fn ramp(t: f64) -> HSLColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    HSLColor((240.0 - 240.0 * t) / 360.0, 0.85, 0.45)
}

fn category_label(categories: &[String], x: f64) -> String {
    let index = x.round();
    if (x - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    categories.get(index as usize).cloned().unwrap_or_default()
}

impl Chart<'_> {
    fn announce(&self) {
        info!("writing chart {}", self.path.display());
    }

    /// One group of bars per category, one bar per series inside a group.
    /// `groups[s][c]` is the value of series `s` for category `c`.
    pub fn bars(
        &self,
        categories: &[String],
        groups: &[(String, Vec<f64>)],
    ) -> anyhow::Result<()> {
        self.announce();
        let top = extent(groups.iter().flat_map(|(_, v)| v.iter().copied()))
            .map(|(_, hi)| hi.max(0.0))
            .unwrap_or(1.0);
        let top = if top > 0.0 { top * 1.1 } else { 1.0 };

        let root = SVGBackend::new(self.path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(self.title, ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(60)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..(categories.len() as f64 - 0.5), 0.0..top)?;

        let formatter = |x: &f64| category_label(categories, *x);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(categories.len().max(1))
            .x_label_formatter(&formatter)
            .x_desc(self.x_desc)
            .y_desc(self.y_desc)
            .draw()?;

        let width = 0.8 / groups.len().max(1) as f64;
        for (s, (name, values)) in groups.iter().enumerate() {
            let fill = color(s);
            chart
                .draw_series(values.iter().enumerate().map(|(c, v)| {
                    let x0 = c as f64 - 0.4 + s as f64 * width;
                    Rectangle::new([(x0, 0.0), (x0 + width, *v)], fill.filled())
                }))?
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], fill.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        root.present()?;
        Ok(())
    }

    /// Box and whiskers (min, q1, median, q3, max) per named sample set.
    pub fn boxes(&self, samples: &[(String, Vec<f64>)]) -> anyhow::Result<()> {
        self.announce();
        let categories: Vec<String> = samples.iter().map(|(name, _)| name.clone()).collect();
        let y_range = padded(extent(samples.iter().flat_map(|(_, v)| v.iter().copied())));

        let root = SVGBackend::new(self.path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(self.title, ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(60)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..(categories.len() as f64 - 0.5), y_range)?;

        let formatter = |x: &f64| category_label(&categories, *x);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(categories.len().max(1))
            .x_label_formatter(&formatter)
            .x_desc(self.x_desc)
            .y_desc(self.y_desc)
            .draw()?;

        for (i, (_, values)) in samples.iter().enumerate() {
            let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
            let (Some((q1, median, q3)), Some((lo, hi))) =
                (StatsHelper::quartiles(&finite), StatsHelper::min_max(&finite))
            else {
                continue;
            };
            let x = i as f64;
            let stroke = color(i).stroke_width(2);
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - 0.3, q1), (x + 0.3, q3)],
                stroke,
            )))?;
            chart.draw_series(
                [
                    vec![(x - 0.3, median), (x + 0.3, median)],
                    vec![(x, q3), (x, hi)],
                    vec![(x, q1), (x, lo)],
                    vec![(x - 0.15, hi), (x + 0.15, hi)],
                    vec![(x - 0.15, lo), (x + 0.15, lo)],
                ]
                .into_iter()
                .map(|points| PathElement::new(points, stroke)),
            )?;
        }

        root.present()?;
        Ok(())
    }

    fn xy(&self, series: &[Series], markers: bool) -> anyhow::Result<()> {
        self.announce();
        let all = || series.iter().flat_map(|s| s.points.iter().copied());
        let x_range = padded(extent(all().map(|(x, _)| x)));
        let y_range = padded(extent(all().map(|(_, y)| y)));

        let root = SVGBackend::new(self.path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(self.title, ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc(self.x_desc)
            .y_desc(self.y_desc)
            .draw()?;

        for (i, s) in series.iter().enumerate() {
            let line = color(i);
            let points = s.points.iter().copied().filter(|(x, y)| x.is_finite() && y.is_finite());
            if markers {
                chart
                    .draw_series(points.map(|p| Circle::new(p, 3, line.filled())))?
                    .label(s.name.as_str())
                    .legend(move |(x, y)| Circle::new((x + 10, y), 3, line.filled()));
            } else {
                chart
                    .draw_series(LineSeries::new(points, line.stroke_width(2)))?
                    .label(s.name.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line));
            }
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        root.present()?;
        Ok(())
    }

    pub fn lines(&self, series: &[Series]) -> anyhow::Result<()> {
        self.xy(series, false)
    }

    pub fn scatter(&self, series: &[Series]) -> anyhow::Result<()> {
        self.xy(series, true)
    }

    /// A path whose segments are coloured by `values`, scaled between their
    /// minimum and maximum.
    pub fn gradient_path(&self, points: &[(f64, f64)], values: &[f64]) -> anyhow::Result<()> {
        self.announce();
        let x_range = padded(extent(points.iter().map(|(x, _)| *x)));
        let y_range = padded(extent(points.iter().map(|(_, y)| *y)));
        let (lo, hi) = extent(values.iter().copied()).unwrap_or((0.0, 0.0));
        let span = hi - lo;

        let root = SVGBackend::new(self.path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("{} ({:.1} .. {:.1})", self.title, lo, hi),
                ("sans-serif", 20),
            )
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc(self.x_desc)
            .y_desc(self.y_desc)
            .draw()?;

        chart.draw_series(points.windows(2).zip(values.iter()).map(|(pair, value)| {
            let t = if span > 0.0 { (value - lo) / span } else { 0.5 };
            PathElement::new(vec![pair[0], pair[1]], ramp(t).stroke_width(2))
        }))?;

        root.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn chart(path: &Path) -> Chart<'_> {
        Chart {
            path,
            title: "Test",
            x_desc: "x",
            y_desc: "y",
        }
    }

    #[test]
    fn category_labels_only_on_integers() {
        let categories = vec!["a".to_string(), "b".to_string()];
        assert_eq!(category_label(&categories, 1.0), "b");
        assert_eq!(category_label(&categories, 0.5), "");
        assert_eq!(category_label(&categories, 5.0), "");
    }

    #[test]
    fn padded_range_handles_flat_data() {
        assert_eq!(padded(Some((2.0, 2.0))), 1.0..3.0);
        assert_eq!(padded(None), 0.0..1.0);
    }

    #[test]
    fn charts_are_written_as_svg() {
        let dir = tempdir().unwrap();
        let bars = dir.path().join("bars.svg");
        chart(&bars)
            .bars(
                &["10.1.1.1".to_string(), "10.1.1.2".to_string()],
                &[("PDR".to_string(), vec![90.0, 50.0]), ("PLR".to_string(), vec![10.0, 50.0])],
            )
            .unwrap();

        let boxes = dir.path().join("boxes.svg");
        chart(&boxes)
            .boxes(&[
                ("a".to_string(), vec![1.0, 2.0, 3.0, 4.0]),
                ("empty".to_string(), vec![]),
            ])
            .unwrap();

        let lines = dir.path().join("lines.svg");
        chart(&lines)
            .lines(&[Series::new("snr", vec![(0.0, 1.0), (1.0, 3.0), (2.0, f64::NAN)])])
            .unwrap();

        let path = dir.path().join("path.svg");
        chart(&path)
            .gradient_path(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)], &[-80.0, -60.0])
            .unwrap();

        for file in [bars, boxes, lines, path] {
            let svg = fs::read_to_string(&file).unwrap();
            assert!(svg.contains("<svg"), "{} is not an svg", file.display());
        }
    }
}
