use crate::math::round3;
use crate::prelude::{AnalysisError, AnalysisResult, Point3};
use serde::{Deserialize, Serialize};

/// Time at which the drone reaches the first point of the path.
pub const START_TIME: f64 = 0.2;

/// Above this speed (m/s, 129.6 km/h) results are likely unrealistic.
pub const MAX_REALISTIC_SPEED: f64 = 36.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepAxis {
    X,
    Y,
}

/// Parameters of a serpentine path covering a square area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageSpec {
    pub origin: (f64, f64),
    pub origin_is_center: bool,
    pub height: f64,
    pub size: f64,
    pub steps: usize,
    pub direction: SweepAxis,
    pub duration: f64,
    pub rest_time: f64,
}

impl Default for CoverageSpec {
    fn default() -> Self {
        Self {
            origin: (0.0, 0.0),
            origin_is_center: true,
            height: 10.0,
            size: 200.0,
            steps: 10,
            direction: SweepAxis::X,
            duration: 100.0,
            rest_time: 0.1,
        }
    }
}

/// A planned serpentine path and its timing.
#[derive(Debug, Clone)]
pub struct CoveragePath {
    pub points: Vec<Point3>,
    pub time_step: f64,
    pub rest_time: f64,
    pub speed: f64,
}

impl CoveragePath {
    pub fn plan(spec: &CoverageSpec) -> AnalysisResult<Self> {
        if spec.steps == 0 {
            return Err(AnalysisError::InvalidInput(
                "coverage path needs at least one step".into(),
            ));
        }

        let (mut x, mut y) = spec.origin;
        if spec.origin_is_center {
            x -= spec.size / 2.0;
            y -= spec.size / 2.0;
        }
        let z = spec.height;

        let step_size = spec.size / spec.steps as f64;
        let points_n = spec.steps * (spec.steps + 2) + 1;
        let flight_time = spec.duration - points_n as f64 * spec.rest_time - START_TIME;

        if flight_time <= 0.0 {
            return Err(AnalysisError::InvalidInput(
                "not enough time to complete the travel, reduce the rest time or increase the duration"
                    .into(),
            ));
        }

        let time_step = flight_time / (points_n - 1) as f64;
        let speed = ((step_size / time_step) * 1000.0).ceil() / 1000.0;

        let mut points = Vec::with_capacity(points_n);
        let mut heading = 1.0;
        for _ in 0..=spec.steps {
            points.push(Point3::new(round3(x), round3(y), round3(z)));
            for _ in 0..spec.steps {
                match spec.direction {
                    SweepAxis::X => x += step_size * heading,
                    SweepAxis::Y => y += step_size * heading,
                }
                points.push(Point3::new(round3(x), round3(y), round3(z)));
            }
            heading *= -1.0;
            match spec.direction {
                SweepAxis::X => y += step_size,
                SweepAxis::Y => x += step_size,
            }
        }

        Ok(Self {
            points,
            time_step,
            rest_time: spec.rest_time,
            speed,
        })
    }

    pub fn is_too_fast(&self) -> bool {
        self.speed > MAX_REALISTIC_SPEED
    }

    /// Time at which the drone reaches point `index`.
    pub fn arrival(&self, index: usize) -> f64 {
        START_TIME + index as f64 * (self.rest_time + self.time_step)
    }

    /// Ground position of the drone at time `t`.
    pub fn position_at(&self, t: f64) -> (f64, f64) {
        let first = match self.points.first() {
            Some(p) => p,
            None => return (0.0, 0.0),
        };
        if t < START_TIME {
            return (first.x, first.y);
        }

        let period = self.rest_time + self.time_step;
        let index = ((t - START_TIME) / period).floor() as usize;
        let last = self.points.len() - 1;
        if index >= last {
            let p = self.points[last];
            return (p.x, p.y);
        }

        let offset = t - self.arrival(index);
        let from = self.points[index];
        if offset < self.rest_time {
            return (from.x, from.y);
        }

        let to = self.points[index + 1];
        let perc = (offset - self.rest_time) / self.time_step;
        (
            round3(from.x * (1.0 - perc) + to.x * perc),
            round3(from.y * (1.0 - perc) + to.y * perc),
        )
    }
}
