//! Text-level rewrites of scenario files written for older simulator
//! releases. Formatting and comments outside the rewritten blocks are kept.

use crate::math::decimal;
use regex::{Captures, Regex};
use std::sync::LazyLock;

pub const OLD_BATTERY_CLASS: &str = "ns3::energy::LiIonEnergySource";
pub const NEW_BATTERY_CLASS: &str = "ns3::energy::GenericBatteryModel";
pub const DEFAULT_CELL_VOLTAGE: f64 = 4.18;

static INITIAL_CELL_VOLTAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\{\s*"name"\s*:\s*"InitialCellVoltage"\s*,\s*"value"\s*:\s*"?([0-9eE\.-]+)"?\s*\}"#,
    )
    .expect("valid regex")
});

static INITIAL_ENERGY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\{\s*"name"\s*:\s*"LiIonEnergySourceInitialEnergyJ"\s*,\s*"value"\s*:\s*"?([0-9eE\.-]+)"?\s*\}"#,
    )
    .expect("valid regex")
});

static REMOTE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?ms)^([ \t]*)\{\s*"name"\s*:\s*"RemoteAddress",\s*"value"\s*:\s*"([^"]+)"\s*\}\s*,"#,
        r#".*?^\s*\{\s*"name"\s*:\s*"RemotePort",\s*"value"\s*:\s*"([^"]+)"\s*\}"#,
    ))
    .expect("valid regex")
});

const BATTERY_RENAMES: [(&str, &str); 6] = [
    ("\"LiIonEnergyLowBatteryThreshold\"", "\"LowBatteryThreshold\""),
    ("\"InitialCellVoltage\"", "\"FullVoltage\""),
    ("\"NominalCellVoltage\"", "\"NominalVoltage\""),
    ("\"ExpCellVoltage\"", "\"ExponentialVoltage\""),
    ("\"RatedCapacity\"", "\"MaxCapacity\""),
    ("\"ExpCapacity\"", "\"ExponentialCapacity\""),
];

/// Battery capacity (Ah) holding `energy_j` joules at `voltage` volts.
pub fn capacity_ah(energy_j: f64, voltage: f64) -> f64 {
    energy_j / (voltage * 3600.0)
}

fn full_voltage(content: &str) -> f64 {
    INITIAL_CELL_VOLTAGE
        .captures(content)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(DEFAULT_CELL_VOLTAGE)
}

/// Moves a Li-Ion energy source definition to the generic battery model.
///
/// Returns `None` when the text has no Li-Ion source or nothing changed.
pub fn migrate_battery(content: &str) -> Option<String> {
    if !content.contains(OLD_BATTERY_CLASS) {
        return None;
    }

    let mut text = content.replace(OLD_BATTERY_CLASS, NEW_BATTERY_CLASS);
    let voltage = full_voltage(&text);

    text = INITIAL_ENERGY
        .replace_all(&text, |caps: &Captures| match caps[1].parse::<f64>() {
            Ok(energy) => format!(
                "{{\n                        \"name\": \"MaxCapacity\",\n                        \"value\": {}\n                    }},\n                    {{\n                        \"name\": \"BatteryType\",\n                        \"value\": \"LION_LIPO\"\n                    }}",
                decimal(capacity_ah(energy, voltage))
            ),
            Err(_) => caps[0].to_string(),
        })
        .into_owned();

    for (old, new) in BATTERY_RENAMES {
        text = text.replace(old, new);
    }

    (text != content).then_some(text)
}

/// Folds every `RemoteAddress` / `RemotePort` attribute pair into a single
/// `Remote` attribute holding `[address, port]`.
///
/// Returns `None` when no pair was found.
pub fn migrate_remote(content: &str) -> Option<String> {
    if !REMOTE_PAIR.is_match(content) {
        return None;
    }

    let text = REMOTE_PAIR.replace_all(content, |caps: &Captures| {
        let indent = &caps[1];
        let address = &caps[2];
        let port = match caps[3].parse::<i64>() {
            Ok(port) => port.to_string(),
            Err(_) => format!("\"{}\"", &caps[3]),
        };
        format!(
            "{i}{{\n{i}    \"name\": \"Remote\",\n{i}    \"value\": [\n{i}        \"{address}\",\n{i}        {port}\n{i}    ]\n{i}}}",
            i = indent,
            address = address,
            port = port
        )
    });
    Some(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATTERY: &str = r#"{
    "energyModel": {
        "source": {
            "name": "ns3::energy::LiIonEnergySource",
            "attributes": [
                    {
                        "name": "LiIonEnergySourceInitialEnergyJ",
                        "value": 72000
                    },
                    {
                        "name": "InitialCellVoltage",
                        "value": 4.0
                    },
                    {
                        "name": "LiIonEnergyLowBatteryThreshold",
                        "value": 0.2
                    }
            ]
        }
    }
}"#;

    #[test]
    fn battery_energy_becomes_capacity() {
        let migrated = migrate_battery(BATTERY).unwrap();
        assert!(migrated.contains(NEW_BATTERY_CLASS));
        assert!(!migrated.contains(OLD_BATTERY_CLASS));
        assert!(migrated.contains("\"name\": \"MaxCapacity\",\n                        \"value\": 5.0"));
        assert!(migrated.contains("\"LION_LIPO\""));
        assert!(migrated.contains("\"FullVoltage\""));
        assert!(migrated.contains("\"LowBatteryThreshold\""));
        assert!(!migrated.contains("LiIonEnergySourceInitialEnergyJ"));

        let doc: serde_json::Value = serde_json::from_str(&migrated).unwrap();
        let attributes = doc["energyModel"]["source"]["attributes"].as_array().unwrap();
        assert_eq!(attributes.len(), 4);
    }

    #[test]
    fn default_voltage_without_cell_voltage() {
        let text = r#"{"name": "ns3::energy::LiIonEnergySource", "attributes": [{ "name": "LiIonEnergySourceInitialEnergyJ", "value": "15048" }]}"#;
        let migrated = migrate_battery(text).unwrap();
        assert!(migrated.contains(&format!("\"value\": {}", decimal(15048.0 / (4.18 * 3600.0)))));
    }

    #[test]
    fn unrelated_files_are_untouched() {
        assert_eq!(migrate_battery(r#"{"name": "ns3::BasicEnergySource"}"#), None);
        assert_eq!(migrate_remote(r#"{"name": "Remote"}"#), None);
    }

    #[test]
    fn remote_pairs_are_merged() {
        let text = "            \"attributes\": [\n                {\n                    \"name\": \"RemoteAddress\",\n                    \"value\": \"200.0.0.1\"\n                },\n                // server port\n                {\n                    \"name\": \"RemotePort\",\n                    \"value\": \"1337\"\n                }\n            ]";
        let migrated = migrate_remote(text).unwrap();
        let expected = "            \"attributes\": [\n                {\n                    \"name\": \"Remote\",\n                    \"value\": [\n                        \"200.0.0.1\",\n                        1337\n                    ]\n                }\n            ]";
        assert_eq!(migrated, expected);
    }

    #[test]
    fn symbolic_ports_stay_quoted() {
        let text = "{\n  { \"name\": \"RemoteAddress\", \"value\": \"10.0.0.1\" },\n  { \"name\": \"RemotePort\", \"value\": \"echo\" }\n}";
        let migrated = migrate_remote(text).unwrap();
        assert!(migrated.contains("  \"echo\"\n"));
        assert!(migrated.contains("\"10.0.0.1\","));
    }
}
