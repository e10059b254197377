use crate::geometry::bezier::DEFAULT_CURVE_STEP;
use crate::prelude::{AnalysisError, AnalysisResult, Point3, Waypoint};
use json_comments::StripComments;
use serde_json::{json, Value};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const PARAMETRIC_SPEED_MODEL: &str = "ns3::ParametricSpeedDroneMobilityModel";

/// A drone flight plan together with the sampling step of its curve.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightPlan {
    pub points: Vec<Waypoint>,
    pub curve_step: f64,
}

/// Scenario configuration as read by the simulator. `//` and `/* */`
/// comments are allowed.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    doc: Value,
}

impl ScenarioConfig {
    pub fn from_reader<R: Read>(reader: R) -> AnalysisResult<Self> {
        let doc = serde_json::from_reader(StripComments::new(reader))
            .map_err(|err| AnalysisError::Parse(format!("scenario json: {}", err)))?;
        Ok(Self { doc })
    }

    pub fn parse(text: &str) -> AnalysisResult<Self> {
        Self::from_reader(text.as_bytes())
    }

    pub fn load(path: &Path) -> AnalysisResult<Self> {
        let file = File::open(path).map_err(|err| AnalysisError::io(path, err))?;
        Self::from_reader(file)
    }

    pub fn document(&self) -> &Value {
        &self.doc
    }

    pub fn name(&self) -> Option<&str> {
        self.doc.get("name").and_then(Value::as_str)
    }

    fn entities(&self, key: &str) -> &[Value] {
        self.doc
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Position of every ZSP, the origin when its mobility model has no
    /// attributes.
    pub fn zsp_positions(&self) -> AnalysisResult<Vec<Point3>> {
        let mut positions = Vec::new();
        for (index, zsp) in self.entities("ZSPs").iter().enumerate() {
            let attributes = mobility_attributes(zsp);
            if attributes.is_empty() {
                positions.push(Point3::default());
                continue;
            }
            for attribute in attributes.iter().filter(|a| attribute_named(a, "Position")) {
                let value = attribute.get("value").cloned().unwrap_or(Value::Null);
                let point: [f64; 3] = serde_json::from_value(value).map_err(|err| {
                    AnalysisError::Parse(format!("ZSP {} position: {}", index, err))
                })?;
                positions.push(point.into());
            }
        }
        Ok(positions)
    }

    /// Flight plan of every drone that declares one.
    pub fn drone_flight_plans(&self) -> AnalysisResult<Vec<FlightPlan>> {
        let mut plans = Vec::new();
        for (index, drone) in self.entities("drones").iter().enumerate() {
            let attributes = mobility_attributes(drone);
            let curve_step = attributes
                .iter()
                .find(|a| attribute_named(a, "CurveStep"))
                .and_then(|a| a.get("value"))
                .and_then(Value::as_f64)
                .unwrap_or(DEFAULT_CURVE_STEP);

            if let Some(plan) = attributes.iter().find(|a| attribute_named(a, "FlightPlan")) {
                let points = parse_flight_plan(plan.get("value").unwrap_or(&Value::Null))
                    .map_err(|err| {
                        AnalysisError::Parse(format!("drone {} flight plan: {}", index, err))
                    })?;
                plans.push(FlightPlan { points, curve_step });
            }
        }
        Ok(plans)
    }
}

fn mobility_attributes(entity: &Value) -> &[Value] {
    entity
        .pointer("/mobilityModel/attributes")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn attribute_named(attribute: &Value, name: &str) -> bool {
    attribute.get("name").and_then(Value::as_str) == Some(name)
}

fn parse_flight_plan(value: &Value) -> Result<Vec<Waypoint>, String> {
    let points = value.as_array().ok_or("not an array")?;
    points
        .iter()
        .map(|p| {
            let position: [f64; 3] = p
                .get("position")
                .cloned()
                .ok_or("missing position")
                .and_then(|v| serde_json::from_value(v).map_err(|_| "bad position"))?;
            let interest = p.get("interest").and_then(Value::as_u64).unwrap_or(0);
            Ok(Waypoint::new(position.into(), interest as u32))
        })
        .collect::<Result<_, &str>>()
        .map_err(str::to_string)
}

/// Mobility model block that flies `points` with a parametric speed.
pub fn flight_plan_model(points: &[Waypoint], speed: &[f64], rest_time: f64) -> Value {
    let plan: Vec<Value> = points
        .iter()
        .map(|p| {
            json!({
                "position": p.point.as_array(),
                "interest": p.interest,
                "restTime": rest_time,
            })
        })
        .collect();

    json!({
        "name": PARAMETRIC_SPEED_MODEL,
        "attributes": [
            { "name": "SpeedCoefficients", "value": speed },
            { "name": "FlightPlan", "value": plan },
        ]
    })
}
