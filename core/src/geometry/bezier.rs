use crate::prelude::{AnalysisError, AnalysisResult, Point3, Waypoint};

/// Default sampling stride of a flight-plan curve.
pub const DEFAULT_CURVE_STEP: f64 = 0.01;

const INTEREST_CURVE_SAMPLES: usize = 101;

/// Cuts a flight plan into curve segments at every interest-0 point.
///
/// The point that closes a segment also opens the next one, so consecutive
/// segments share their junction. A trailing segment is kept even when the
/// plan does not end on an interest-0 point.
pub fn split_segments(points: &[Waypoint]) -> Vec<Vec<Waypoint>> {
    let mut segments = Vec::new();
    let mut current: Vec<Waypoint> = Vec::new();

    for point in points {
        current.push(*point);

        if point.interest == 0 && current.len() > 1 {
            segments.push(std::mem::replace(&mut current, vec![*point]));
        }
    }

    if current.len() > 1 {
        segments.push(current);
    }

    segments
}

/// Models a drone trajectory as a chain of Bézier curves, one per segment.
///
/// Each segment is sampled over `t ∈ [0, 1)` with the given stride.
pub fn build_trajectory(points: &[Waypoint], step: f64) -> AnalysisResult<Vec<Point3>> {
    if !(step > 0.0 && step <= 1.0) {
        return Err(AnalysisError::InvalidInput(format!(
            "curve step must be in (0, 1], got {}",
            step
        )));
    }

    let mut curve = Vec::new();
    for segment in split_segments(points) {
        let controls: Vec<Point3> = segment.iter().map(|w| w.point).collect();
        let samples = (1.0 / step).ceil() as usize;
        for k in 0..samples {
            let t = k as f64 * step;
            if t >= 1.0 {
                break;
            }
            curve.push(evaluate(&controls, t));
        }
    }

    Ok(curve)
}

/// Splits a plan the way the design notebooks do: every interest-0 point
/// after the first one closes the running segment and opens a new one.
pub fn split_at_interest(points: &[Waypoint]) -> Vec<Vec<Waypoint>> {
    let mut segments: Vec<Vec<Waypoint>> = Vec::new();

    for (index, point) in points.iter().enumerate() {
        if index == 0 {
            segments.push(vec![*point]);
            continue;
        }

        if let Some(last) = segments.last_mut() {
            last.push(*point);
        }
        if point.interest == 0 {
            segments.push(vec![*point]);
        }
    }

    segments
}

/// A single curve where each control point is weighted by repeating it
/// `interest` times, sampled at t = 0, 0.01, ..., 1.0.
pub fn interest_curve(points: &[Waypoint]) -> Vec<Point3> {
    let mut controls = Vec::new();
    for point in points {
        let weight = point.interest.max(1);
        for _ in 0..weight {
            controls.push(point.point);
        }
    }

    if controls.is_empty() {
        return Vec::new();
    }

    (0..INTEREST_CURVE_SAMPLES)
        .map(|k| {
            let t = k as f64 / (INTEREST_CURVE_SAMPLES - 1) as f64;
            evaluate(&controls, t)
        })
        .collect()
}

/// Evaluates the Bézier curve defined by `controls` at `t` (de Casteljau).
pub fn evaluate(controls: &[Point3], t: f64) -> Point3 {
    let mut work: Vec<Point3> = controls.to_vec();
    let u = 1.0 - t;

    for level in 1..work.len() {
        for i in 0..work.len() - level {
            let a = work[i];
            let b = work[i + 1];
            work[i] = Point3::new(u * a.x + t * b.x, u * a.y + t * b.y, u * a.z + t * b.z);
        }
    }

    work.first().copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp(x: f64, y: f64, z: f64, interest: u32) -> Waypoint {
        Waypoint::new(Point3::new(x, y, z), interest)
    }

    fn close(a: Point3, b: Point3) -> bool {
        a.distance(&b) < 1e-9
    }

    #[test]
    fn segments_share_interest_zero_junctions() {
        let plan = vec![
            wp(0.0, 0.0, 0.0, 0),
            wp(1.0, 0.0, 0.0, 2),
            wp(2.0, 0.0, 0.0, 0),
            wp(3.0, 0.0, 0.0, 1),
            wp(4.0, 0.0, 0.0, 0),
        ];
        let segments = split_segments(&plan);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 3);
        assert_eq!(segments[1][0], plan[2]);
        assert_eq!(segments[1].len(), 3);
    }

    #[test]
    fn trailing_segment_is_kept() {
        let plan = vec![wp(0.0, 0.0, 0.0, 0), wp(1.0, 1.0, 1.0, 3)];
        assert_eq!(split_segments(&plan).len(), 1);
        assert!(split_segments(&plan[..1]).is_empty());
    }

    #[test]
    fn trajectory_starts_on_first_point_and_samples_each_segment() {
        let plan = vec![
            wp(0.0, 0.0, 0.0, 0),
            wp(10.0, 10.0, 0.0, 1),
            wp(20.0, 0.0, 0.0, 0),
            wp(30.0, 0.0, 5.0, 0),
        ];
        let curve = build_trajectory(&plan, 0.1).unwrap();
        assert_eq!(curve.len(), 20);
        assert!(close(curve[0], Point3::new(0.0, 0.0, 0.0)));
        assert!(close(curve[10], Point3::new(20.0, 0.0, 0.0)));
    }

    #[test]
    fn trajectory_rejects_bad_step() {
        let plan = vec![wp(0.0, 0.0, 0.0, 0), wp(1.0, 0.0, 0.0, 0)];
        assert!(build_trajectory(&plan, 0.0).is_err());
        assert!(build_trajectory(&plan, 1.5).is_err());
    }

    #[test]
    fn quadratic_midpoint_matches_bernstein_form() {
        let controls = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        // 0.25 * P0 + 0.5 * P1 + 0.25 * P2
        assert!(close(evaluate(&controls, 0.5), Point3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn interest_curve_hits_both_ends() {
        let plan = vec![
            wp(0.0, 0.0, 0.0, 0),
            wp(5.0, 5.0, 5.0, 4),
            wp(10.0, 0.0, 0.0, 0),
        ];
        let curve = interest_curve(&plan);
        assert_eq!(curve.len(), 101);
        assert!(close(curve[0], plan[0].point));
        assert!(close(curve[100], plan[2].point));
        assert!(interest_curve(&[]).is_empty());
    }

    #[test]
    fn notebook_split_duplicates_interest_zero_points() {
        let plan = vec![
            wp(0.0, 0.0, 0.0, 0),
            wp(1.0, 0.0, 0.0, 1),
            wp(2.0, 0.0, 0.0, 0),
        ];
        let segments = split_at_interest(&plan);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 3);
        assert_eq!(segments[1], vec![plan[2]]);
    }
}
