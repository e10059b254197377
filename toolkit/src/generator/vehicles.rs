use serde_json::{json, Value};

fn car(model: &str, attributes: Value) -> Value {
    json!({
        "type": "Car",
        "netDevices": [],
        "mobilityModel": {
            "name": model,
            "attributes": attributes,
        }
    })
}

/// Five cars, one per mobility model worth tracing.
pub fn vehicles() -> Vec<Value> {
    vec![
        car(
            "ns3::ConstantVelocityMobilityModel",
            json!([
                { "name": "Position", "value": "0.0:0.0:1.5" },
                { "name": "Velocity", "value": "20.0:0.0:0.0" },
            ]),
        ),
        car(
            "ns3::RandomWalk2dMobilityModel",
            json!([
                { "name": "Position", "value": "100.0:100.0:1.5" },
                { "name": "Speed", "value": "ns3::UniformRandomVariable[Min=5.0|Max=15.0]" },
                { "name": "Direction", "value": "ns3::UniformRandomVariable[Min=0.0|Max=6.283185307]" },
                { "name": "Bounds", "value": "0|200|0|200" },
            ]),
        ),
        car(
            "ns3::WaypointMobilityModel",
            json!([
                { "name": "Position", "value": "50.0:50.0:1.5" },
                { "name": "LazyNotify", "value": true },
            ]),
        ),
        car(
            "ns3::ConstantPositionMobilityModel",
            json!([{ "name": "Position", "value": "150.0:75.0:1.5" }]),
        ),
        car(
            "ns3::ConstantVelocityMobilityModel",
            json!([
                { "name": "Position", "value": "200.0:200.0:1.5" },
                { "name": "Velocity", "value": "-10.0:-10.0:0.0" },
            ]),
        ),
    ]
}

pub fn build_vehicle_scenario() -> Value {
    json!({
        "name": "vehicle-tracing-example",
        "resultsPath": "../results/",
        "logOnFile": true,
        "duration": 300,
        "staticNs3Config": [],
        "world": {
            "size": { "X": "500", "Y": "500", "Z": "50" },
            "buildings": []
        },
        "phyLayer": [ { "type": "none" } ],
        "macLayer": [],
        "cars": vehicles(),
    })
}

/// Mobility model of every car without the `ns3::` namespace.
pub fn model_names(scenario: &Value) -> Vec<String> {
    scenario["cars"]
        .as_array()
        .map(|cars| {
            cars.iter()
                .filter_map(|car| car.pointer("/mobilityModel/name").and_then(Value::as_str))
                .map(|name| name.trim_start_matches("ns3::").to_string())
                .collect()
        })
        .unwrap_or_default()
}
