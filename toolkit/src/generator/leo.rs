use anyhow::{anyhow, Context};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

pub const LEO_MOBILITY_MODEL: &str = "ns3::GeoLeoOrbitMobility";

/// A Walker-like shell of circular orbits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    pub altitude_km: f64,
    pub inclination_deg: f64,
    pub planes: u32,
    pub sats_per_plane: u32,
}

impl Orbit {
    pub const fn new(altitude_km: f64, inclination_deg: f64, planes: u32, sats_per_plane: u32) -> Self {
        Self {
            altitude_km,
            inclination_deg,
            planes,
            sats_per_plane,
        }
    }

    /// Longitude of the ascending node of `plane`, in `(-180, 180]`.
    pub fn plane_longitude(&self, plane: u32) -> f64 {
        let longitude = (plane as f64 * 360.0 / self.planes as f64) % 360.0;
        if longitude > 180.0 {
            longitude - 360.0
        } else {
            longitude
        }
    }

    /// Position of `sat` inside its plane, in `[0, 360)`.
    pub fn sat_offset(&self, sat: u32) -> f64 {
        sat as f64 * 360.0 / self.sats_per_plane as f64
    }
}

/// `altitude:inclination:planes:sats`, e.g. `1200:20:32:16`.
impl FromStr for Orbit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 4 {
            return Err(anyhow!("orbit `{}` is not altitude:inclination:planes:sats", s));
        }
        Ok(Self {
            altitude_km: parts[0].parse().context("orbit altitude")?,
            inclination_deg: parts[1].parse().context("orbit inclination")?,
            planes: parts[2].parse().context("orbit planes")?,
            sats_per_plane: parts[3].parse().context("orbit satellites per plane")?,
        })
    }
}

pub const DEFAULT_ORBITS: [Orbit; 2] = [Orbit::new(1200.0, 20.0, 32, 16), Orbit::new(1180.0, 30.0, 12, 10)];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeoConfig {
    pub name: String,
    pub duration: f64,
    pub orbits: Vec<Orbit>,
}

impl Default for LeoConfig {
    fn default() -> Self {
        Self {
            name: "leo-circular-orbit-tracing".to_string(),
            duration: 500.0,
            orbits: DEFAULT_ORBITS.to_vec(),
        }
    }
}

fn satellite(orbit: &Orbit, longitude: f64, offset: f64) -> Value {
    json!({
        "type": "LeoSat",
        "netDevices": [],
        "mobilityModel": {
            "name": LEO_MOBILITY_MODEL,
            "attributes": [
                { "name": "EarthSpheroidType", "value": "SPHERE" },
                { "name": "Altitude", "value": orbit.altitude_km },
                { "name": "Inclination", "value": orbit.inclination_deg },
                { "name": "Longitude", "value": longitude },
                { "name": "Offset", "value": offset },
                { "name": "RetrogradeOrbit", "value": false },
            ]
        }
    })
}

/// Every satellite of every orbit, plane by plane.
pub fn satellites(orbits: &[Orbit]) -> Vec<Value> {
    let mut sats = Vec::new();
    for (index, orbit) in orbits.iter().enumerate() {
        for plane in 0..orbit.planes {
            let longitude = orbit.plane_longitude(plane);
            for sat in 0..orbit.sats_per_plane {
                let offset = orbit.sat_offset(sat);
                debug!(
                    "orbit {} plane {}/{} sat {}/{}: alt={}km inc={} long={:.1} off={:.1}",
                    index + 1,
                    plane + 1,
                    orbit.planes,
                    sat + 1,
                    orbit.sats_per_plane,
                    orbit.altitude_km,
                    orbit.inclination_deg,
                    longitude,
                    offset
                );
                sats.push(satellite(orbit, longitude, offset));
            }
        }
    }
    sats
}

pub fn build_leo_scenario(config: &LeoConfig) -> Value {
    json!({
        "name": config.name,
        "resultsPath": "../results/",
        "logOnFile": true,
        "duration": config.duration,
        "staticNs3Config": [
            { "name": "ns3::GeoLeoOrbitMobility::Precision", "value": "1s" }
        ],
        "world": {
            "size": { "X": "40000000", "Y": "40000000", "Z": "40000000" },
            "buildings": []
        },
        "phyLayer": [ { "type": "none" } ],
        "macLayer": [],
        "leo-sats": satellites(&config.orbits),
    })
}
